// src/utils/text.rs

//! Conversion of post markup to plain text.

use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*?>").expect("valid tag pattern"))
}

/// Remove every `<...>` tag, keeping the text between them.
pub fn strip_tags(html: &str) -> String {
    tag_pattern().replace_all(html, "").into_owned()
}

/// Decode HTML entities such as `&amp;` and `&#39;`.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Strip tags, then decode entities.
///
/// Decoding runs last so escaped angle brackets in the body survive as text.
pub fn to_plain_text(html: &str) -> String {
    decode_entities(&strip_tags(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags(r#"<p>hello <a href="https://x.example">world</a></p>"#),
            "hello world"
        );
        assert_eq!(strip_tags("no markup"), "no markup");
    }

    #[test]
    fn test_to_plain_text_decodes_after_strip() {
        assert_eq!(to_plain_text("<p>a &lt;b&gt; &amp; c</p>"), "a <b> & c");
        assert_eq!(to_plain_text("<p>it&#39;s</p>"), "it's");
    }
}
