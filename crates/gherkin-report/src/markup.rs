//! HTML fragments embedded in report descriptions and step logs.

use gherkin_report_tree::escape::escape;

/// Escape text for inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    escape(text)
}

/// Escape only angle brackets, keeping outline placeholders such as
/// `<item>` readable when shown unexpanded.
#[must_use]
pub fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Render a doc string as a preformatted block.
#[must_use]
pub fn code_block(content: &str) -> String {
    let mut out = String::from("<pre class=\"markup-code\">");
    out.push_str(&escape_html(content));
    out.push_str("</pre>");
    out
}

/// Render an Examples heading followed by its table markup.
#[must_use]
pub fn examples_block(name: &str, table: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        table.to_owned()
    } else {
        format!("<p class=\"examples-name\">{}</p>{table}", escape_html(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("a < b", "a &lt; b")]
    #[case("\"quoted\" & 'single'", "&quot;quoted&quot; &amp; &apos;single&apos;")]
    #[case("bell\u{7}", "bell&#xFFFD;")]
    fn escape_html_replaces_special_characters(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_html(input), expected);
    }

    #[test]
    fn angle_bracket_escaping_leaves_ampersands() {
        assert_eq!(
            escape_angle_brackets("I add <count> & pay"),
            "I add &lt;count&gt; & pay"
        );
    }

    #[test]
    fn code_block_escapes_content() {
        assert_eq!(
            code_block("{\"a\": <1>}"),
            "<pre class=\"markup-code\">{&quot;a&quot;: &lt;1&gt;}</pre>"
        );
    }

    #[test]
    fn examples_block_omits_empty_heading() {
        assert_eq!(examples_block("  ", "<table></table>"), "<table></table>");
        assert_eq!(
            examples_block("Prices", "<table></table>"),
            "<p class=\"examples-name\">Prices</p><table></table>"
        );
    }
}
