//! HTML to plain-text extraction.

use crate::models::MAX_SCRAPED_CHARS;
use regex::Regex;
use std::sync::OnceLock;

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap())
}

fn style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Reduce an HTML document to bounded, single-spaced plain text.
///
/// Script and style blocks are dropped with their contents, every other tag
/// is dropped leaving its text, whitespace runs collapse to one space, and
/// the result is cut to [`MAX_SCRAPED_CHARS`] characters. Any input is
/// accepted; non-HTML bodies go through the same steps.
pub fn extract_text(html: &str) -> String {
    let text = script_re().replace_all(html, "");
    let text = style_re().replace_all(&text, "");
    let text = tag_re().replace_all(&text, "");
    let text = whitespace_re().replace_all(&text, " ");

    truncate_chars(text.trim(), MAX_SCRAPED_CHARS)
        .trim_end()
        .to_string()
}

/// Longest prefix of `text` holding at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
