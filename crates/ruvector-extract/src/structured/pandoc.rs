//! Block extraction from pandoc's JSON AST (`pandoc -t json`)

use serde_json::Value;
use std::ffi::OsString;
use std::path::Path;

use super::MarkupParser;
use crate::backend::ToolRunner;
use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use crate::types::MarkupBlock;

/// Placeholder content for tables, whose cell layout is not flattened
pub const TABLE_PLACEHOLDER: &str = "[Table content]";

/// Runs pandoc on the markdown and walks the resulting AST
#[derive(Debug, Clone)]
pub struct PandocAstParser {
    binary: String,
    runner: ToolRunner,
}

impl PandocAstParser {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            binary: tools.pandoc.clone(),
            runner: ToolRunner::from_config(tools),
        }
    }
}

impl MarkupParser for PandocAstParser {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    fn parse(&self, markdown: &Path) -> Result<Vec<MarkupBlock>> {
        let args: Vec<OsString> = vec![
            markdown.as_os_str().to_os_string(),
            "-t".into(),
            "json".into(),
        ];
        let json = self.runner.run_text(&self.binary, args)?;
        parse_pandoc_json(&json)
    }
}

/// Parse a pandoc JSON document into blocks.
///
/// Block quotes and divs are flattened into their children.
pub fn parse_pandoc_json(json: &str) -> Result<Vec<MarkupBlock>> {
    let ast: Value = serde_json::from_str(json)?;
    let blocks = ast
        .get("blocks")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::file_parse("pandoc AST", "missing top-level blocks"))?;

    let mut out = Vec::new();
    for block in blocks {
        convert_block(block, &mut out);
    }
    Ok(out)
}

fn tag(node: &Value) -> &str {
    node.get("t").and_then(Value::as_str).unwrap_or("")
}

fn contents(node: &Value) -> &Value {
    node.get("c").unwrap_or(&Value::Null)
}

fn as_slice(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn convert_block(block: &Value, out: &mut Vec<MarkupBlock>) {
    let c = contents(block);
    match tag(block) {
        "Header" => {
            let level = c.get(0).and_then(Value::as_u64).unwrap_or(1).min(6) as u8;
            let text = inline_text(as_slice(c.get(2).unwrap_or(&Value::Null)));
            out.push(MarkupBlock::Heading { level, text });
        }
        "Para" | "Plain" => {
            out.push(MarkupBlock::Paragraph {
                text: inline_text(as_slice(c)),
            });
        }
        "CodeBlock" => {
            let language = c
                .get(0)
                .and_then(|attr| attr.get(1))
                .and_then(|classes| classes.get(0))
                .and_then(Value::as_str)
                .map(str::to_string);
            let text = c.get(1).and_then(Value::as_str).unwrap_or("").to_string();
            out.push(MarkupBlock::Code { language, text });
        }
        "BulletList" => out.push(MarkupBlock::List {
            ordered: false,
            items: list_items(as_slice(c)),
        }),
        "OrderedList" => out.push(MarkupBlock::List {
            ordered: true,
            items: list_items(as_slice(c.get(1).unwrap_or(&Value::Null))),
        }),
        "Table" => out.push(MarkupBlock::Table {
            content: TABLE_PLACEHOLDER.to_string(),
        }),
        "BlockQuote" => {
            for child in as_slice(c) {
                convert_block(child, out);
            }
        }
        "Div" => {
            for child in as_slice(c.get(1).unwrap_or(&Value::Null)) {
                convert_block(child, out);
            }
        }
        _ => {}
    }
}

/// Each item is the text of its paragraphs joined by spaces
fn list_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            as_slice(item)
                .iter()
                .filter(|block| matches!(tag(block), "Para" | "Plain"))
                .map(|block| inline_text(as_slice(contents(block))))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Flatten inline elements to plain text
pub fn inline_text(inlines: &[Value]) -> String {
    let mut out = String::new();
    push_inlines(inlines, &mut out);
    out
}

fn push_inlines(inlines: &[Value], out: &mut String) {
    for inline in inlines {
        let c = contents(inline);
        match tag(inline) {
            "Str" => out.push_str(c.as_str().unwrap_or("")),
            "Space" | "SoftBreak" | "LineBreak" => out.push(' '),
            "Code" => {
                out.push('`');
                out.push_str(c.get(1).and_then(Value::as_str).unwrap_or(""));
                out.push('`');
            }
            "Math" => out.push_str(c.get(1).and_then(Value::as_str).unwrap_or("")),
            "Emph" | "Strong" | "Strikeout" | "Underline" | "SmallCaps" | "Superscript"
            | "Subscript" => push_inlines(as_slice(c), out),
            "Quoted" => {
                out.push('"');
                push_inlines(as_slice(c.get(1).unwrap_or(&Value::Null)), out);
                out.push('"');
            }
            // [attr or citations, inlines, ...]
            "Link" | "Image" | "Span" | "Cite" => {
                push_inlines(as_slice(c.get(1).unwrap_or(&Value::Null)), out)
            }
            _ => {}
        }
    }
}
