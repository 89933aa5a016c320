//! Fast projection-based column detection.
//!
//! Production default for standard documents (books, articles) with single
//! or double columns. Binarizes once per distinct page content, locates the
//! deepest valley of the column projection in the central band, and
//! validates the candidate split with connected-component counts on both
//! sides so noise-induced valleys are rejected. Anything that does not
//! validate falls back to a single full-page region.

use crate::core::errors::OcrResult;
use crate::core::traits::LayoutAnalyzer;
use crate::models::image::PageImage;
use crate::models::layout::{LayoutResult, LayoutType, Region};
use crate::processors::{binarize, projection};
use image::GrayImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Pages narrower/shorter than this are trivially single-column.
const MIN_WIDTH: u32 = 400;
const MIN_HEIGHT: u32 = 200;

/// Valleys are searched inside the central 30%-70% width band.
const SEARCH_BAND: (f64, f64) = (0.3, 0.7);
/// An accepted valley must lie inside the 35%-65% width band.
const ACCEPT_BAND: (f64, f64) = (0.35, 0.65);
/// Maximum valley depth relative to the local projection mean.
const MAX_VALLEY_RATIO: f64 = 0.3;

/// Distinct page contents whose binarization is memoized per detector.
const BINARY_MEMO_CAPACITY: usize = 32;

/// Projection-based column layout detector.
///
/// Thread-safe; the binarization memo is shared across calls so duplicate
/// pages within one run skip recomputation.
pub struct ProjectionLayoutDetector {
    /// Minimum connected components required on each side of a split.
    min_text_components: usize,
    /// Accept a double-column split only at or above this confidence.
    confidence_threshold: f64,
    binary_memo: Mutex<HashMap<String, Arc<GrayImage>>>,
}

impl ProjectionLayoutDetector {
    pub fn new() -> Self {
        Self {
            min_text_components: 10,
            confidence_threshold: 0.7,
            binary_memo: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the per-side component minimum.
    pub fn with_min_text_components(mut self, min: usize) -> Self {
        self.min_text_components = min;
        self
    }

    fn binarized(&self, image: &PageImage) -> Arc<GrayImage> {
        let key = image.content_hash();
        let mut memo = self.binary_memo.lock().unwrap();
        if let Some(hit) = memo.get(&key) {
            return Arc::clone(hit);
        }
        let binary = Arc::new(binarize::otsu_binarize_inv(&image.to_gray()));
        if memo.len() < BINARY_MEMO_CAPACITY {
            memo.insert(key, Arc::clone(&binary));
        }
        binary
    }

    /// Locates and validates a column split, returning the split x-position
    /// and its confidence.
    fn find_split(&self, binary: &GrayImage) -> Option<(u32, f64)> {
        let w = binary.width() as usize;
        let band = (w as f64 * SEARCH_BAND.0) as usize..(w as f64 * SEARCH_BAND.1) as usize;

        let profile = projection::column_projection(binary);
        let (valley_idx, valley_depth) = projection::deepest_valley(&profile, band.clone())?;
        let local_mean = projection::profile_mean(&profile, band);
        let valley_ratio = valley_depth as f64 / (local_mean + 1e-6);

        let position_ok = (valley_idx as f64) > w as f64 * ACCEPT_BAND.0
            && (valley_idx as f64) < w as f64 * ACCEPT_BAND.1;
        if valley_ratio >= MAX_VALLEY_RATIO || !position_ok {
            return None;
        }

        let split = valley_idx as u32;
        let left = projection::component_count_in_span(binary, 0, split);
        let right =
            projection::component_count_in_span(binary, split, binary.width() - split);
        if left <= self.min_text_components || right <= self.min_text_components {
            debug!(left, right, "column split rejected by component validation");
            return None;
        }

        Some((split, (1.0 - valley_ratio).min(1.0)))
    }
}

impl Default for ProjectionLayoutDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutAnalyzer for ProjectionLayoutDetector {
    fn detect(&self, image: &PageImage) -> OcrResult<LayoutResult> {
        let (w, h) = (image.width(), image.height());
        if w < MIN_WIDTH || h < MIN_HEIGHT {
            return Ok(LayoutResult::single(w, h, 1.0, "trivial"));
        }

        let binary = self.binarized(image);
        if let Some((split, confidence)) = self.find_split(&binary) {
            if confidence >= self.confidence_threshold {
                debug!(split, confidence, "double-column layout detected");
                return Ok(LayoutResult {
                    layout_type: LayoutType::Double,
                    regions: vec![
                        Region {
                            x: 0,
                            y: 0,
                            w: split,
                            h,
                            col_index: 1,
                            id: None,
                        },
                        Region {
                            x: split,
                            y: 0,
                            w: w - split,
                            h,
                            col_index: 2,
                            id: None,
                        },
                    ],
                    confidence,
                    method: "projection".to_string(),
                });
            }
        }

        Ok(LayoutResult::single(w, h, 1.0, "fallback"))
    }
}
