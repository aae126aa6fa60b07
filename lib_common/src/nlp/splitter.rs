//! # HTML Content Splitter
//!
//! Breaks an HTML body into paragraph-level plain-text blocks using the
//! `scraper` (html5ever) tolerant parser. Malformed markup never errors; it
//! just yields fewer (or zero) paragraphs.

use scraper::{ElementRef, Html, Selector};

use crate::nlp::document::ParagraphBlock;

/// Returns the text of every `<p>` element of `content`, in document order.
/// Empty paragraphs are kept with empty text so they still count toward the
/// average. Invalid UTF-8 is replaced rather than rejected.
pub fn split_paragraphs(content: &[u8]) -> Vec<ParagraphBlock> {
    let html = String::from_utf8_lossy(content);
    let document = Html::parse_document(&html);
    let selector = Selector::parse("p").expect("paragraph selector");

    document
        .select(&selector)
        .map(|element| paragraph_text(&element))
        .enumerate()
        .map(|(index, text)| ParagraphBlock { index, text })
        .collect()
}

/// Concatenates all descendant text nodes and collapses runs of whitespace.
fn paragraph_text(element: &ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(html: &str) -> Vec<String> {
        split_paragraphs(html.as_bytes())
            .into_iter()
            .map(|p| p.text)
            .collect()
    }

    #[test]
    fn test_paragraphs_in_document_order() {
        let html = r#"
            <html><body>
              <h1>Heading</h1>
              <p>First one.</p>
              <div><p>Second <b>bold</b> one.</p></div>
              <p>Third
                 spread   over lines.</p>
            </body></html>"#;
        assert_eq!(
            texts(html),
            vec!["First one.", "Second bold one.", "Third spread over lines."]
        );
    }

    #[test]
    fn test_indexes_are_sequential() {
        let blocks = split_paragraphs(b"<p>a</p><p>b</p><p>c</p>");
        let indexes: Vec<usize> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn test_no_paragraphs_is_empty_not_error() {
        assert!(texts("<div>just a div</div>").is_empty());
        assert!(texts("").is_empty());
    }

    #[test]
    fn test_blank_paragraphs_are_kept_empty() {
        assert_eq!(texts("<p>  </p><p>kept</p><p></p>"), vec!["", "kept", ""]);
        assert_eq!(texts("<p>&nbsp;</p>"), vec![""]);
    }

    #[test]
    fn test_malformed_markup_degrades_gracefully() {
        assert_eq!(texts("<p>unclosed <p>next"), vec!["unclosed", "next"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let blocks = split_paragraphs(b"<p>caf\xff</p>");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text.starts_with("caf"));
    }
}
