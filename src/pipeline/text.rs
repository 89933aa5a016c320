//! Structured full-text rendering.
//!
//! Downstream correction passes work on the whole document at once; explicit
//! page banners with confidence figures let them keep page boundaries intact
//! and prioritize low-confidence pages.

use crate::models::page::PageResult;

/// Separator inserted between columns within a page.
const COLUMN_SEPARATOR: &str = "\n\n";

/// Renders the document text with page banners.
///
/// Output shape:
///
/// ```text
/// === OCR RESULTS - N PAGES ===
///
/// === PAGE 1 | Confidence: 92.3% ===
/// [page text]
///
/// === END OF DOCUMENT ===
/// ```
pub fn build_document_text(pages: &[PageResult]) -> String {
    let mut parts = Vec::with_capacity(pages.len() * 2 + 2);
    parts.push(format!("=== OCR RESULTS - {} PAGES ===", pages.len()));

    for page in pages {
        parts.push(format!(
            "\n\n=== PAGE {} | Confidence: {:.1}% ===\n",
            page.page_number, page.mean_confidence
        ));
        parts.push(page.text(COLUMN_SEPARATOR));
    }

    parts.push("\n=== END OF DOCUMENT ===".to_string());
    parts.join("\n")
}
