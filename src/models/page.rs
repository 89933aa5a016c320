//! Per-page recognition results.

use crate::models::layout::LayoutType;
use crate::models::quality::PageQuality;
use crate::models::recognition::ColumnResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Warning tag attached to sentinel fallback pages.
pub const WARNING_PROCESSING_FAILED: &str = "processing_failed";

/// Consolidated recognition result for one document page.
///
/// Columns preserve spatial reading order; `mean_confidence` is the
/// arithmetic mean of column confidences. A page result is always produced,
/// even on total page failure: the sentinel [`PageResult::fallback`] stands
/// in, never a missing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number.
    pub page_number: u32,
    pub layout_type: LayoutType,
    pub quality: PageQuality,
    /// Ordered ascending by `col_index`.
    pub columns: Vec<ColumnResult>,
    /// Arithmetic mean of column confidences; 0.0 when there are no columns.
    pub mean_confidence: f64,
    pub processing_time: Duration,
    /// Dominant engine parameter string across the page's columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_used: Option<String>,
    /// Non-blocking warnings accumulated while processing the page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Blake3 hash of the page text, when any text was extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_hash: Option<String>,
}

impl PageResult {
    /// Sentinel result substituted when page processing fails outside the
    /// per-region boundary: a single empty column, zero confidence, and a
    /// warning tag.
    pub fn fallback(page_number: u32, processing_time: Duration) -> Self {
        PageResult {
            page_number,
            layout_type: LayoutType::Unknown,
            quality: PageQuality::Unknown,
            columns: vec![ColumnResult::empty(1, None, None)],
            mean_confidence: 0.0,
            processing_time,
            config_used: None,
            warnings: vec![WARNING_PROCESSING_FAILED.to_string()],
            text_hash: None,
        }
    }

    /// Concatenates column texts in reading order, skipping blank columns.
    pub fn text(&self, separator: &str) -> String {
        self.columns
            .iter()
            .map(|c| c.text())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Total words across all columns.
    pub fn total_words(&self) -> u32 {
        self.columns.iter().map(|c| c.recognition.word_count).sum()
    }

    /// Total characters across all columns.
    pub fn total_chars(&self) -> u32 {
        self.columns.iter().map(|c| c.recognition.char_count).sum()
    }

    /// True when this is the sentinel produced by [`PageResult::fallback`].
    pub fn is_fallback(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w == WARNING_PROCESSING_FAILED)
    }
}
