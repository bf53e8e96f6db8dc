//! PDF text extraction
//!
//! Extracts page text with lopdf. Failures never surface as errors: the
//! returned document carries a notice instead, so every downstream
//! capability still has text to work with.

use super::Document;
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pages shorter than this are flagged as probably scanned
pub const MIN_PAGE_CHARS: usize = 100;

/// Documents shorter than this with flagged pages get a scanned notice
pub const MIN_DOCUMENT_CHARS: usize = 1000;

pub const EMPTY_DOCUMENT_NOTICE: &str = "The PDF document appears to be empty (0 pages).";

pub const NO_TEXT_NOTICE: &str =
    "The PDF file appears to contain no extractable text. It might be scanned or image-based.";

pub const SCANNED_NOTICE: &str = "This PDF appears to contain mostly scanned content or images. \
Limited text could be extracted without OCR. \
The extracted content may not represent the full document.";

/// Start of the note appended to near-empty pages
pub const OCR_NOTE_PREFIX: &str = "[OCR would process page";

/// True for paragraphs the extractor adds rather than reads from the PDF
pub fn is_extraction_notice(paragraph: &str) -> bool {
    let paragraph = paragraph.trim();
    paragraph == SCANNED_NOTICE || paragraph.starts_with(OCR_NOTE_PREFIX)
}

fn page_number_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:\d+|Page \d+ of \d+)$").expect("valid pattern"))
}

/// Extract a document from a PDF on disk
pub fn extract_document(path: &Path) -> Document {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let start = Instant::now();

    let doc = match lopdf::Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to open PDF");
            return Document::placeholder(name, format!("Could not open the PDF file. Error: {}", e));
        }
    };

    let document = extract_from_lopdf(&name, &doc);

    crate::metrics::record_extraction(
        start.elapsed().as_secs_f64(),
        document.page_count(),
        document.is_extractable(),
    );
    info!(
        file = %name,
        pages = document.page_count(),
        extractable = document.is_extractable(),
        latency_ms = start.elapsed().as_millis() as u64,
        "PDF extracted"
    );

    document
}

/// Extract from an already parsed PDF
pub fn extract_from_lopdf(name: &str, doc: &lopdf::Document) -> Document {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Document::placeholder(name, EMPTY_DOCUMENT_NOTICE);
    }

    debug!(page_count = pages.len(), "Extracting text from PDF");

    let cleaned: BTreeMap<u32, String> = pages
        .iter()
        .map(|(&page_num, &page_id)| {
            let raw = match doc.extract_text(&[page_num]) {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => scan_page_content(doc, page_id),
                Err(e) => {
                    debug!(page = page_num, error = %e, "Falling back to content stream scan");
                    scan_page_content(doc, page_id)
                }
            };
            (page_num, clean_page(&raw))
        })
        .collect();

    if cleaned.values().all(|text| text.is_empty()) {
        return Document::placeholder(name, NO_TEXT_NOTICE);
    }

    Document::new(name, annotate_sparse_pages(cleaned))
}

/// Flag near-empty pages and prepend the scanned notice when most pages are sparse
fn annotate_sparse_pages(mut pages: BTreeMap<u32, String>) -> BTreeMap<u32, String> {
    let mut needs_ocr = false;
    let mut total_chars = 0;

    for (page_num, text) in pages.iter_mut() {
        let chars = text.chars().count();
        total_chars += chars;
        if chars < MIN_PAGE_CHARS {
            needs_ocr = true;
            let note = format!("{} {}]", OCR_NOTE_PREFIX, page_num);
            *text = if text.is_empty() {
                note
            } else {
                format!("{}\n\n{}", text, note)
            };
        }
    }

    if needs_ocr && total_chars < MIN_DOCUMENT_CHARS {
        if let Some(first) = pages.values_mut().next() {
            *first = format!("{}\n\n{}", SCANNED_NOTICE, first);
        }
    }

    pages
}

/// Normalize whitespace, drop page-number lines, keep paragraph breaks
pub fn clean_page(text: &str) -> String {
    let text = text.replace('\u{FEFF}', "");
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
            continue;
        }
        if page_number_line().is_match(&line) {
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs.join("\n\n")
}

/// Scan a page content stream for text-showing operators
fn scan_page_content(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> String {
    match doc.get_page_content(page_id) {
        Ok(content) => extract_text_from_content(&content),
        Err(e) => {
            warn!(error = %e, "Failed to read page content stream");
            String::new()
        }
    }
}

/// Collect text shown between BT and ET operators
fn extract_text_from_content(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content_str.lines() {
        let trimmed = line.trim();
        match trimmed {
            "BT" => in_text_block = true,
            "ET" => {
                in_text_block = false;
                text.push('\n');
            }
            _ if in_text_block => {
                if let Some(shown) = extract_text_from_operator(trimmed) {
                    text.push_str(&shown);
                }
            }
            _ => {}
        }
    }

    text
}

/// Text from a `Tj`, `'`, `"` or `TJ` operator line
fn extract_text_from_operator(line: &str) -> Option<String> {
    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut escaped = false;

        for ch in line.chars() {
            if depth > 0 && escaped {
                current.push('\\');
                current.push(ch);
                escaped = false;
                continue;
            }
            match ch {
                '\\' if depth > 0 => escaped = true,
                '(' => {
                    if depth > 0 {
                        current.push(ch);
                    }
                    depth += 1;
                }
                ')' if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        result.push_str(&decode_pdf_string(&current));
                        current.clear();
                    } else {
                        current.push(ch);
                    }
                }
                _ if depth > 0 => current.push(ch),
                _ => {}
            }
        }

        return (!result.is_empty()).then_some(result);
    }

    if line.ends_with("Tj") || line.ends_with('\'') || line.ends_with('"') {
        let start = line.find('(')?;
        let end = line.rfind(')')?;
        if end > start {
            return Some(decode_pdf_string(&line[start + 1..end]));
        }
    }

    None
}

/// Decode PDF string escapes
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some(c) => result.push(c),
            None => {}
        }
    }

    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a PDF with one page per entry, each page showing its lines
    pub(crate) fn build_pdf(pages: &[&[&str]]) -> lopdf::Document {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
            ];
            for line in lines.iter() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_clean_page() {
        let input = "  Hello   World  \nsecond line\n\n12\nPage 3 of 9\nNext   paragraph";
        assert_eq!(
            clean_page(input),
            "Hello World second line\n\nNext paragraph"
        );
        assert_eq!(clean_page("  \n 42 \n"), "");
    }

    #[test]
    fn test_extract_text_from_operator() {
        assert_eq!(
            extract_text_from_operator("(Hello World) Tj"),
            Some("Hello World".to_string())
        );
        assert_eq!(
            extract_text_from_operator("[(Hel) -20 (lo)] TJ"),
            Some("Hello".to_string())
        );
        assert_eq!(
            extract_text_from_operator(r"[(a\)b)] TJ"),
            Some("a)b".to_string())
        );
        assert_eq!(extract_text_from_operator("100 600 Td"), None);
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(r"line\nnext"), "line\nnext");
        assert_eq!(decode_pdf_string(r"\(paren\)"), "(paren)");
    }

    #[test]
    fn test_content_stream_scan() {
        let content = b"BT\n/F1 12 Tf\n(First) Tj\nET\nq\nBT\n[(Sec) 10 (ond)] TJ\nET\n";
        let text = extract_text_from_content(content);
        assert_eq!(text, "First\nSecond\n");
    }

    #[test]
    fn test_short_document_gets_scanned_notice() {
        let pdf = build_pdf(&[&["Hello World"]]);
        let document = extract_from_lopdf("hello.pdf", &pdf);

        assert!(document.is_extractable());
        let first = &document.pages()[&1];
        assert!(first.starts_with(SCANNED_NOTICE));
        assert!(first.contains("Hello"));
        assert!(first.ends_with("[OCR would process page 1]"));
    }

    #[test]
    fn test_long_pages_are_not_flagged() {
        let long_line = "Transformers replaced recurrent networks for most sequence tasks because attention parallelizes well.";
        let pdf = build_pdf(&[&[long_line, long_line], &[long_line, long_line]]);
        let document = extract_from_lopdf("long.pdf", &pdf);

        assert_eq!(document.page_count(), 2);
        for text in document.pages().values() {
            assert!(text.contains("attention parallelizes"));
            assert!(!text.contains("OCR"));
        }
    }

    #[test]
    fn test_empty_pages_yield_no_text_notice() {
        let pdf = build_pdf(&[&[]]);
        let document = extract_from_lopdf("blank.pdf", &pdf);
        assert!(!document.is_extractable());
        assert_eq!(document.full_text(), NO_TEXT_NOTICE);
    }

    #[test]
    fn test_unreadable_file_yields_placeholder() {
        let dir = std::env::temp_dir().join("pdfintellect-missing-dir");
        let document = extract_document(&dir.join("nope.pdf"));
        assert!(!document.is_extractable());
        assert!(document.full_text().starts_with("Could not open the PDF file. Error:"));
    }
}
