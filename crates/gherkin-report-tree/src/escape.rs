//! Markup escaping shared by the XML writer and HTML fragments.
//!
//! Characters XML 1.0 cannot carry are replaced with U+FFFD, so escaped text
//! stays valid whether it lands in a `JUnit` document or an HTML
//! description.

use std::fmt::{self, Write};

const INVALID_REPLACEMENT: &str = "&#xFFFD;";

fn replacement(character: char) -> Option<&'static str> {
    if !is_valid_xml_character(character) {
        return Some(INVALID_REPLACEMENT);
    }
    match character {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&apos;"),
        _ => None,
    }
}

fn is_valid_xml_character(character: char) -> bool {
    matches!(
        u32::from(character),
        0x09 | 0x0A | 0x0D
            | 0x20..=0xD7FF
            | 0xE000..=0xFFFD
            | 0x1_0000..=0x10_FFFF
    )
}

/// Write `value` escaped for element content or attribute values.
///
/// # Errors
/// Returns an error if writing to the provided formatter fails.
pub fn write_escaped<W: Write>(writer: &mut W, value: &str) -> fmt::Result {
    for character in value.chars() {
        match replacement(character) {
            Some(entity) => writer.write_str(entity)?,
            None => writer.write_char(character)?,
        }
    }
    Ok(())
}

/// Return `value` escaped for element content or attribute values.
///
/// ```
/// use gherkin_report_tree::escape::escape;
///
/// assert_eq!(escape("a < b & 'c'"), "a &lt; b &amp; &apos;c&apos;");
/// ```
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for character in value.chars() {
        match replacement(character) {
            Some(entity) => out.push_str(entity),
            None => out.push(character),
        }
    }
    out
}
