//! Turning a flat block list into headings and sections

use crate::types::{BlockKind, DocumentStructure, Heading, MarkupBlock, Section, StructuralBlock};

/// Build the document outline.
///
/// Every heading opens a section that runs until the next heading. A
/// heading closes all open headings of the same or deeper level, so its
/// hierarchy is the remaining stack plus itself. Blocks before the first
/// heading go to a leading section without a heading. Blank blocks are
/// dropped; block indices are positions in `markup`.
pub fn build_structure(markup: &[MarkupBlock]) -> DocumentStructure {
    let mut structure = DocumentStructure::default();
    let mut stack: Vec<(u8, String)> = Vec::new();
    let mut current: Option<Section> = None;

    for (index, block) in markup.iter().enumerate() {
        let (kind, content, language) = match block {
            MarkupBlock::Heading { level, text } => {
                stack.retain(|(open, _)| open < level);
                stack.push((*level, text.clone()));
                let hierarchy: Vec<String> = stack.iter().map(|(_, t)| t.clone()).collect();

                structure.headings.push(Heading {
                    index,
                    level: *level,
                    text: text.clone(),
                    hierarchy: hierarchy.clone(),
                });
                if let Some(section) = current.take() {
                    structure.sections.push(section);
                }
                current = Some(Section {
                    heading: Some(text.clone()),
                    level: Some(*level),
                    hierarchy,
                    start_index: index,
                    blocks: Vec::new(),
                });
                continue;
            }
            MarkupBlock::Paragraph { text } => (BlockKind::Paragraph, text.clone(), None),
            MarkupBlock::Code { language, text } => (BlockKind::Code, text.clone(), language.clone()),
            MarkupBlock::List { items, .. } => (BlockKind::List, list_content(items), None),
            MarkupBlock::Table { content } => (BlockKind::Table, content.clone(), None),
        };

        if content.trim().is_empty() {
            continue;
        }

        let block = StructuralBlock {
            index,
            kind,
            content,
            language,
        };
        current
            .get_or_insert_with(|| Section {
                heading: None,
                level: None,
                hierarchy: Vec::new(),
                start_index: index,
                blocks: Vec::new(),
            })
            .blocks
            .push(block.clone());
        structure.blocks.push(block);
    }

    if let Some(section) = current {
        structure.sections.push(section);
    }
    structure
}

/// One `- item` line per list item
fn list_content(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, text: &str) -> MarkupBlock {
        MarkupBlock::Heading { level, text: text.into() }
    }

    fn para(text: &str) -> MarkupBlock {
        MarkupBlock::Paragraph { text: text.into() }
    }

    #[test]
    fn test_hierarchy_pops_same_and_deeper_levels() {
        let structure = build_structure(&[
            heading(1, "Guide"),
            heading(2, "Install"),
            heading(3, "Linux"),
            heading(2, "Usage"),
            heading(1, "Appendix"),
        ]);
        let hierarchies: Vec<Vec<String>> =
            structure.headings.iter().map(|h| h.hierarchy.clone()).collect();
        assert_eq!(
            hierarchies,
            vec![
                vec!["Guide".to_string()],
                vec!["Guide".into(), "Install".into()],
                vec!["Guide".into(), "Install".into(), "Linux".into()],
                vec!["Guide".into(), "Usage".into()],
                vec!["Appendix".to_string()],
            ]
        );
    }

    #[test]
    fn test_preamble_section_and_indices() {
        let structure = build_structure(&[
            para("before any heading"),
            heading(1, "Title"),
            para("body"),
            MarkupBlock::List { ordered: false, items: vec!["a".into(), "b".into()] },
            para("   "),
        ]);

        assert_eq!(structure.sections.len(), 2);
        let preamble = &structure.sections[0];
        assert_eq!(preamble.heading, None);
        assert_eq!(preamble.level, None);
        assert!(preamble.hierarchy.is_empty());
        assert_eq!(preamble.start_index, 0);

        let titled = &structure.sections[1];
        assert_eq!(titled.heading.as_deref(), Some("Title"));
        assert_eq!(titled.start_index, 1);
        let indices: Vec<usize> = titled.blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![2, 3]);
        assert_eq!(titled.blocks[1].content, "- a\n- b");
        assert_eq!(titled.blocks[1].kind, BlockKind::List);
        assert_eq!(structure.blocks.len(), 3);
    }

    #[test]
    fn test_heading_only_sections_are_kept_empty() {
        let structure = build_structure(&[heading(1, "A"), heading(1, "B"), para("x")]);
        assert_eq!(structure.sections.len(), 2);
        assert!(structure.sections[0].is_empty());
        assert_eq!(structure.sections[1].blocks.len(), 1);
    }

    #[test]
    fn test_code_language_carried() {
        let structure = build_structure(&[MarkupBlock::Code {
            language: Some("rust".into()),
            text: "fn f() {}".into(),
        }]);
        assert_eq!(structure.blocks[0].kind, BlockKind::Code);
        assert_eq!(structure.blocks[0].language.as_deref(), Some("rust"));
    }
}
