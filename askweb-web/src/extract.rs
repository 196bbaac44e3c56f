//! Paragraph text extraction.
//!
//! Only `<p>` elements are considered; headings, navigation and scripts never
//! reach the summarizer. The result is cut to a character budget so prompts
//! stay inside the model's context window.

use scraper::{Html, Selector};

pub const DEFAULT_MAX_ARTICLE_CHARS: usize = 3000;

/// Collect paragraph text in document order, newline-joined, truncated to
/// `max_chars` characters. Pages without paragraphs yield an empty string.
pub fn extract(raw: &[u8], max_chars: usize) -> String {
    let html = String::from_utf8_lossy(raw);
    let document = Html::parse_document(&html);
    let Ok(paragraphs) = Selector::parse("p") else {
        return String::new();
    };

    let text = document
        .select(&paragraphs)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(text, max_chars)
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paragraphs_in_document_order() {
        let html = br#"
            <html><head><title>T</title><script>var x = "<p>no</p>";</script></head>
            <body>
              <nav>Home | About</nav>
              <h1>Heading</h1>
              <p>First <b>bold</b> paragraph.</p>
              <div><p>Second paragraph.</p></div>
              <p></p>
            </body></html>
        "#;
        assert_eq!(
            extract(html, DEFAULT_MAX_ARTICLE_CHARS),
            "First bold paragraph.\nSecond paragraph.\n"
        );
    }

    #[test]
    fn no_paragraphs_is_empty() {
        assert_eq!(extract(b"<html><body><div>x</div></body></html>", 3000), "");
        assert_eq!(extract(b"", 3000), "");
    }

    #[test]
    fn truncates_to_exact_char_budget() {
        let long = format!("<p>{}</p>", "a".repeat(5000));
        let out = extract(long.as_bytes(), DEFAULT_MAX_ARTICLE_CHARS);
        assert_eq!(out.chars().count(), 3000);
    }

    #[test]
    fn truncation_never_splits_multibyte_chars() {
        let long = format!("<p>{}</p>", "é".repeat(10));
        let out = extract(long.as_bytes(), 4);
        assert_eq!(out, "éééé");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let mut raw = b"<p>ok ".to_vec();
        raw.push(0xFF);
        raw.extend_from_slice(b"</p>");
        assert!(extract(&raw, 100).starts_with("ok "));
    }
}
