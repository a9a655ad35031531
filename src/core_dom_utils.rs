use super::*;
use unicode_normalization::UnicodeNormalization;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub(crate) fn class_list(element: &Element) -> impl Iterator<Item = &str> {
    element.attr("class").unwrap_or_default().split_whitespace()
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    class_list(element).any(|token| token == class_name)
}

/// Class membership for relational keys. Hand-edited reports mix composed and
/// decomposed forms, so both sides are compared in NFC.
pub(crate) fn has_class_normalized(element: &Element, class_name: &str) -> bool {
    class_list(element).any(|token| token.nfc().eq(class_name.nfc()))
}

pub(crate) fn normalize_ident(value: &str) -> String {
    value.nfc().collect()
}

/// Escapes `&`, `<` and `>`, plus `"` when the value lands in an attribute.
pub(crate) fn escape_markup(value: &str, in_attr: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// At most `max_chars` characters, with `...` appended when cut.
pub(crate) fn snippet(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}
