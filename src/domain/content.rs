//! Markdown analysis for post bodies: plain text, reading time, and the table
//! of contents.

use comrak::{Arena, Options, nodes::AstNode, nodes::NodeValue, parse_document};

use crate::domain::entities::TocEntry;
use crate::domain::slug::AnchorSlugger;

pub const WORDS_PER_MINUTE: usize = 200;
/// Deepest heading level that appears in the table of contents.
pub const TOC_MAX_LEVEL: u8 = 3;

/// Estimated reading time in whole minutes, never less than one.
pub fn reading_time_minutes(markdown: &str) -> u32 {
    let words = plain_text(markdown).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Flatten markdown into whitespace-separated text with markup removed.
pub fn plain_text(markdown: &str) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &Options::default());
    let mut text = String::new();
    collect_text(root, &mut text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Headings of level 1 to [`TOC_MAX_LEVEL`], in document order, with anchors
/// unique within the document.
pub fn table_of_contents(markdown: &str) -> Vec<TocEntry> {
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &Options::default());
    let mut slugger = AnchorSlugger::new();
    let mut entries = Vec::new();

    for node in root.descendants() {
        let Some(level) = heading_level(node) else {
            continue;
        };
        if level > TOC_MAX_LEVEL {
            continue;
        }

        let mut text = String::new();
        collect_text(node, &mut text);
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }

        let anchor = slugger.anchor_for(&text);
        entries.push(TocEntry {
            level,
            text,
            anchor,
        });
    }

    entries
}

fn heading_level(node: &AstNode<'_>) -> Option<u8> {
    let data = node.data.borrow();
    if let NodeValue::Heading(heading) = &data.value {
        Some(heading.level)
    } else {
        None
    }
}

fn collect_text(node: &AstNode<'_>, buffer: &mut String) {
    {
        let data = node.data.borrow();
        match &data.value {
            NodeValue::Text(text) => buffer.push_str(text),
            NodeValue::Code(code) => buffer.push_str(&code.literal),
            NodeValue::CodeBlock(block) => {
                buffer.push(' ');
                buffer.push_str(&block.literal);
            }
            NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
            NodeValue::Paragraph | NodeValue::Heading(_) | NodeValue::Item(_) => buffer.push(' '),
            _ => {}
        }
    }
    let mut child = node.first_child();
    while let Some(next) = child {
        collect_text(next, buffer);
        child = next.next_sibling();
    }
}
