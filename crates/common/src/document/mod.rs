//! Extracted documents and their page-indexed passages

pub mod pdf;
mod store;

pub use store::{sanitize_filename, UploadStore};

use serde::Serialize;
use std::collections::BTreeMap;

/// A paragraph of document text and the page it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub page: u32,
    pub text: String,
}

/// Page-indexed text of one uploaded PDF. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    pages: BTreeMap<u32, String>,
    extractable: bool,
}

impl Document {
    pub fn new(name: impl Into<String>, pages: BTreeMap<u32, String>) -> Self {
        Self {
            name: name.into(),
            pages,
            extractable: true,
        }
    }

    /// A document that carries only a notice about why no text is available
    pub fn placeholder(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(1, message.into());
        Self {
            name: name.into(),
            pages,
            extractable: false,
        }
    }

    /// Build a single-page document from raw text
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(1, text.into());
        Self::new(name, pages)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pages(&self) -> &BTreeMap<u32, String> {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// False when the text is an extraction notice rather than content
    pub fn is_extractable(&self) -> bool {
        self.extractable
    }

    /// Text with `[Page N]` markers, as sent to external models
    pub fn full_text(&self) -> String {
        if !self.extractable {
            return self.plain_text();
        }

        self.pages
            .iter()
            .map(|(page, text)| format!("[Page {}] {}", page, text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Page texts joined without markers
    pub fn plain_text(&self) -> String {
        self.pages
            .values()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Blank-line separated paragraphs, each tagged with its page
    pub fn passages(&self) -> Vec<Passage> {
        self.pages
            .iter()
            .flat_map(|(&page, text)| {
                text.split("\n\n")
                    .map(str::trim)
                    .filter(|p| !p.is_empty() && !pdf::is_extraction_notice(p))
                    .map(move |p| Passage {
                        page,
                        text: p.to_string(),
                    })
            })
            .collect()
    }
}

/// Longest prefix of `text` with at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut pages = BTreeMap::new();
        pages.insert(1, "Intro paragraph.\n\nSecond paragraph.".to_string());
        pages.insert(2, "Page two text.".to_string());
        Document::new("sample.pdf", pages)
    }

    #[test]
    fn test_full_text_has_page_markers() {
        let doc = sample();
        assert_eq!(
            doc.full_text(),
            "[Page 1] Intro paragraph.\n\nSecond paragraph.\n\n[Page 2] Page two text."
        );
    }

    #[test]
    fn test_passages_carry_pages() {
        let passages = sample().passages();
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].page, 1);
        assert_eq!(passages[1].text, "Second paragraph.");
        assert_eq!(passages[2].page, 2);
    }

    #[test]
    fn test_passages_skip_extraction_notices() {
        let mut pages = BTreeMap::new();
        pages.insert(
            1,
            format!("{}\n\nShort caption.\n\n[OCR would process page 1]", pdf::SCANNED_NOTICE),
        );
        pages.insert(2, "[OCR would process page 2]".to_string());
        let doc = Document::new("scan.pdf", pages);

        let passages = doc.passages();
        assert_eq!(
            passages,
            vec![Passage {
                page: 1,
                text: "Short caption.".to_string(),
            }]
        );
        assert!(doc.full_text().contains(pdf::SCANNED_NOTICE));
    }

    #[test]
    fn test_placeholder_has_no_markers() {
        let doc = Document::placeholder("scan.pdf", "No text here.");
        assert!(!doc.is_extractable());
        assert_eq!(doc.full_text(), "No text here.");
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
