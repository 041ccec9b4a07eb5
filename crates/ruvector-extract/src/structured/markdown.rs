//! In-process markdown parsing with pulldown-cmark

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::path::Path;

use super::MarkupParser;
use crate::error::Result;
use crate::text::decode_bytes;
use crate::types::MarkupBlock;

/// CommonMark (plus tables) parser; needs no external tools
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkParser;

impl CommonMarkParser {
    pub fn new() -> Self {
        Self
    }
}

impl MarkupParser for CommonMarkParser {
    fn name(&self) -> &'static str {
        "commonmark"
    }

    fn parse(&self, markdown: &Path) -> Result<Vec<MarkupBlock>> {
        let bytes = std::fs::read(markdown)?;
        Ok(parse_markdown(&decode_bytes(&bytes)))
    }
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<MarkupBlock>,
    buf: String,
    heading: Option<u8>,
    code: Option<Option<String>>,
    list_depth: usize,
    list_ordered: bool,
    items: Vec<String>,
    table: Option<Vec<Vec<String>>>,
    row: Vec<String>,
}

impl BlockBuilder {
    fn in_list(&self) -> bool {
        self.list_depth > 0
    }

    fn take_buf(&mut self) -> String {
        let text = self.buf.split_whitespace().collect::<Vec<_>>().join(" ");
        self.buf.clear();
        text
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } if !self.in_list() => {
                self.buf.clear();
                self.heading = Some(level as u8);
            }
            Tag::Paragraph if !self.in_list() && self.table.is_none() => self.buf.clear(),
            Tag::CodeBlock(kind) if !self.in_list() => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.buf.clear();
                self.code = Some(language);
            }
            Tag::List(start) => {
                self.list_depth += 1;
                if self.list_depth == 1 {
                    self.list_ordered = start.is_some();
                    self.items.clear();
                } else {
                    self.buf.push(' ');
                }
            }
            Tag::Item if self.list_depth == 1 => self.buf.clear(),
            Tag::Table(_) => self.table = Some(Vec::new()),
            Tag::TableHead | Tag::TableRow => self.row.clear(),
            Tag::TableCell => self.buf.clear(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                if let Some(level) = self.heading.take() {
                    let text = self.take_buf();
                    self.blocks.push(MarkupBlock::Heading { level, text });
                }
            }
            TagEnd::Paragraph if self.in_list() => self.buf.push(' '),
            TagEnd::Paragraph if self.table.is_none() => {
                let text = self.take_buf();
                if !text.is_empty() {
                    self.blocks.push(MarkupBlock::Paragraph { text });
                }
            }
            TagEnd::CodeBlock => {
                if let Some(language) = self.code.take() {
                    let text = self.buf.trim_end_matches('\n').to_string();
                    self.buf.clear();
                    self.blocks.push(MarkupBlock::Code { language, text });
                }
            }
            TagEnd::Item if self.list_depth == 1 => {
                let item = self.take_buf();
                self.items.push(item);
            }
            TagEnd::List(_) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.blocks.push(MarkupBlock::List {
                        ordered: self.list_ordered,
                        items: std::mem::take(&mut self.items),
                    });
                }
            }
            TagEnd::TableCell => {
                let cell = self.take_buf();
                self.row.push(cell);
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                let row = std::mem::take(&mut self.row);
                if let Some(table) = self.table.as_mut() {
                    table.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(rows) = self.table.take() {
                    let content = rows
                        .iter()
                        .map(|row| format!("| {} |", row.join(" | ")))
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.blocks.push(MarkupBlock::Table { content });
                }
            }
            _ => {}
        }
    }
}

/// Parse markdown text into top-level blocks
pub fn parse_markdown(markdown: &str) -> Vec<MarkupBlock> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(tag) => builder.start(tag),
            Event::End(tag) => builder.end(tag),
            Event::Text(text) => builder.buf.push_str(&text),
            Event::Code(code) => {
                builder.buf.push('`');
                builder.buf.push_str(&code);
                builder.buf.push('`');
            }
            Event::SoftBreak | Event::HardBreak => builder.buf.push(' '),
            _ => {}
        }
    }

    builder.blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = parse_markdown("# Title\n\nFirst *para*\nwraps here.\n\n## Sub `x`\n\nSecond.");
        assert_eq!(
            blocks,
            vec![
                MarkupBlock::Heading { level: 1, text: "Title".into() },
                MarkupBlock::Paragraph { text: "First para wraps here.".into() },
                MarkupBlock::Heading { level: 2, text: "Sub `x`".into() },
                MarkupBlock::Paragraph { text: "Second.".into() },
            ]
        );
    }

    #[test]
    fn test_code_block_language() {
        let blocks = parse_markdown("```rust ignore\nfn main() {}\n```\n");
        assert_eq!(
            blocks,
            vec![MarkupBlock::Code {
                language: Some("rust".into()),
                text: "fn main() {}".into()
            }]
        );
    }

    #[test]
    fn test_lists_flatten_nested_items() {
        let blocks = parse_markdown("1. one\n2. two\n   - inner\n\n- loose\n\n  para\n");
        assert_eq!(
            blocks,
            vec![
                MarkupBlock::List {
                    ordered: true,
                    items: vec!["one".into(), "two inner".into()]
                },
                MarkupBlock::List {
                    ordered: false,
                    items: vec!["loose para".into()]
                },
            ]
        );
    }

    #[test]
    fn test_table_rows() {
        let blocks = parse_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(
            blocks,
            vec![MarkupBlock::Table {
                content: "| a | b |\n| 1 | 2 |".into()
            }]
        );
    }
}
