// ABOUTME: Renders the restricted markdown subset used in agent explanations into block elements.
// ABOUTME: Line-oriented; headings, flat lists, blank spacers, paragraphs, and paired **bold** spans only.

use serde::Serialize;

/// An inline span within a paragraph or list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text")]
pub enum Inline {
    Text(String),
    Strong(String),
}

/// One rendered block. Heading text is kept verbatim; only non-heading lines
/// get inline emphasis resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Block {
    Heading { level: u8, text: String },
    Bullet { spans: Vec<Inline> },
    Numbered { spans: Vec<Inline> },
    Blank,
    Paragraph { spans: Vec<Inline> },
}

/// Render explanation text into an ordered block sequence. Deterministic and
/// line-by-line over `\n`-split input; empty input renders to nothing.
pub fn render(text: &str) -> Vec<Block> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(render_line).collect()
}

fn render_line(line: &str) -> Block {
    if let Some(rest) = line.strip_prefix("### ") {
        return Block::Heading { level: 3, text: rest.to_string() };
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return Block::Heading { level: 2, text: rest.to_string() };
    }
    if let Some(rest) = line.strip_prefix("# ") {
        return Block::Heading { level: 1, text: rest.to_string() };
    }
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Block::Bullet { spans: inline_spans(rest) };
    }
    if let Some(rest) = numbered_rest(line) {
        return Block::Numbered { spans: inline_spans(rest) };
    }
    if line.trim().is_empty() {
        return Block::Blank;
    }
    Block::Paragraph { spans: inline_spans(line) }
}

/// An ordered list line is digits, a dot, and one whitespace character; the
/// remainder after that prefix is the item text.
fn numbered_rest(line: &str) -> Option<&str> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => Some(chars.as_str()),
        _ => None,
    }
}

/// Split a line on paired `**...**` delimiters into literal and strong spans.
/// With no complete pair the original text passes through as one literal
/// span; a trailing unpaired `**` stays literal.
pub fn inline_spans(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut matched = false;
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let Some(close) = rest[open + 2..].find("**") else {
            break;
        };
        matched = true;
        if open > 0 {
            spans.push(Inline::Text(rest[..open].to_string()));
        }
        let inner = &rest[open + 2..open + 2 + close];
        if !inner.is_empty() {
            spans.push(Inline::Strong(inner.to_string()));
        }
        rest = &rest[open + 2 + close + 2..];
    }

    if !matched {
        if text.is_empty() {
            return Vec::new();
        }
        return vec![Inline::Text(text.to_string())];
    }
    if !rest.is_empty() {
        spans.push(Inline::Text(rest.to_string()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn strong(s: &str) -> Inline {
        Inline::Strong(s.to_string())
    }

    #[test]
    fn plain_text_is_a_single_verbatim_paragraph() {
        let blocks = render("The mitochondria is the powerhouse of the cell.");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                spans: vec![text("The mitochondria is the powerhouse of the cell.")]
            }]
        );
    }

    #[test]
    fn emphasis_splits_into_three_spans() {
        assert_eq!(
            inline_spans("Score **10** points"),
            vec![text("Score "), strong("10"), text(" points")]
        );
    }

    #[test]
    fn unpaired_delimiter_passes_through() {
        assert_eq!(inline_spans("tricky ** case"), vec![text("tricky ** case")]);
        assert_eq!(
            inline_spans("one **two** and **three"),
            vec![text("one "), strong("two"), text(" and **three")]
        );
    }

    #[test]
    fn heading_levels_take_the_remainder_verbatim() {
        let blocks = render("# Title\n## Section\n### Detail **not bold**");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, text: "Title".to_string() },
                Block::Heading { level: 2, text: "Section".to_string() },
                Block::Heading { level: 3, text: "Detail **not bold**".to_string() },
            ]
        );
    }

    #[test]
    fn both_bullet_markers_are_recognized() {
        let blocks = render("- dash item\n* star item");
        assert_eq!(
            blocks,
            vec![
                Block::Bullet { spans: vec![text("dash item")] },
                Block::Bullet { spans: vec![text("star item")] },
            ]
        );
    }

    #[test]
    fn numbered_items_strip_the_numeral_prefix() {
        let blocks = render("1. first\n12. twelfth **bold**");
        assert_eq!(
            blocks,
            vec![
                Block::Numbered { spans: vec![text("first")] },
                Block::Numbered { spans: vec![text("twelfth "), strong("bold")] },
            ]
        );
    }

    #[test]
    fn numeral_without_separator_is_a_paragraph() {
        let blocks = render("1792 was a year\n3.because");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph { spans: vec![text("1792 was a year")] },
                Block::Paragraph { spans: vec![text("3.because")] },
            ]
        );
    }

    #[test]
    fn blank_and_whitespace_lines_become_spacers() {
        let blocks = render("above\n\n   \nbelow");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph { spans: vec![text("above")] },
                Block::Blank,
                Block::Blank,
                Block::Paragraph { spans: vec![text("below")] },
            ]
        );
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(render("").is_empty());
    }

    #[test]
    fn fully_bold_line_has_no_empty_literals() {
        assert_eq!(inline_spans("**everything**"), vec![strong("everything")]);
    }

    #[test]
    fn typical_explanation_document() {
        let blocks = render(
            "### Why B is correct\nWater boils at **100** degrees Celsius at sea level.\n\n- Pressure lowers the boiling point\n1. Altitude matters",
        );
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 3, text: "Why B is correct".to_string() },
                Block::Paragraph {
                    spans: vec![
                        text("Water boils at "),
                        strong("100"),
                        text(" degrees Celsius at sea level."),
                    ]
                },
                Block::Blank,
                Block::Bullet { spans: vec![text("Pressure lowers the boiling point")] },
                Block::Numbered { spans: vec![text("Altitude matters")] },
            ]
        );
    }
}
