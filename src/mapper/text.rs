use pulldown_cmark::{Event, Parser, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

/// Longest description data.world accepts.
pub const DESCRIPTION_LIMIT: usize = 120;
pub const ELLIPSIS: &str = "...";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid html tag pattern"));

/// Truncate to `length` characters, cutting back to the end of the previous
/// whole word and appending `...`. Text that already fits is returned as is.
/// A single over-long word is cut hard.
pub fn truncate(text: &str, length: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= length {
        return text.to_string();
    }
    let short = length.saturating_sub(ELLIPSIS.len());

    // `i` starts on the first dropped char: if that is whitespace the kept
    // prefix already ends on a word boundary.
    let mut i = short as isize;
    while i >= 0 && !chars[i as usize].is_whitespace() {
        i -= 1;
    }
    while i >= 0 && chars[i as usize].is_whitespace() {
        i -= 1;
    }
    let end = if i <= 0 { short } else { (i + 1) as usize };

    let mut out: String = chars[..end].iter().collect();
    out.push_str(ELLIPSIS);
    out
}

/// Render markdown notes as plain text: formatting markers and HTML tags are
/// dropped, their text content kept, whitespace collapsed.
pub fn strip_markup(notes: &str) -> String {
    let mut out = String::with_capacity(notes.len());
    for event in Parser::new(notes) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::Html(h) | Event::InlineHtml(h) => {
                out.push_str(&HTML_TAG.replace_all(&h, ""));
            }
            Event::SoftBreak | Event::HardBreak | Event::Rule => out.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::TableCell
                | TagEnd::HtmlBlock,
            ) => out.push(' '),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Dataset/file description as sent to data.world.
pub fn short_description(text: &str) -> String {
    truncate(text, DESCRIPTION_LIMIT)
}
