//! Merging of same-index elements into one unit per page (or slide, or
//! time bucket)

use std::collections::BTreeMap;

use crate::types::{ChunkMetadata, Element, ElementKind, Source, TextMetadata};

/// One Text element per distinct index, in ascending index order.
///
/// Content is the optional `"{LABEL} {index}:\n\n"` prefix followed by the
/// members' content in encounter order, with nothing inserted between them.
pub fn group_elements(elements: &[Element], index_label: Option<&str>) -> Vec<Element> {
    by_index(elements)
        .into_iter()
        .filter_map(|(index, members)| {
            let mut content = match index_label {
                Some(label) => format!("{} {}:\n\n", label, index),
                None => String::new(),
            };
            members.iter().for_each(|e| content.push_str(e.content()));

            Element::assemble(
                content,
                Source::Aggregated,
                index,
                members[0].file().clone(),
                ElementKind::Text(TextMetadata {
                    ocr_lang: first_ocr_lang(&members),
                    ..Default::default()
                }),
            )
        })
        .collect()
}

/// Like [`group_elements`] without a label, producing Chunk elements
pub fn chunk_elements(elements: &[Element]) -> Vec<Element> {
    by_index(elements)
        .into_iter()
        .filter_map(|(index, members)| {
            let content: String = members.iter().map(|e| e.content()).collect();
            Element::assemble(
                content,
                Source::Aggregated,
                index,
                members[0].file().clone(),
                ElementKind::Chunk(ChunkMetadata {
                    ocr_lang: first_ocr_lang(&members),
                }),
            )
        })
        .collect()
}

fn by_index(elements: &[Element]) -> BTreeMap<u32, Vec<&Element>> {
    let mut groups: BTreeMap<u32, Vec<&Element>> = BTreeMap::new();
    for element in elements {
        groups.entry(element.index()).or_default().push(element);
    }
    groups
}

fn first_ocr_lang(members: &[&Element]) -> Option<String> {
    members
        .iter()
        .find_map(|e| e.kind().ocr_lang())
        .map(str::to_string)
}
