//! Recognition results: words, regions, and their aggregates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBox {
    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        BBox {
            x,
            y,
            w: right - x,
            h: bottom - y,
        }
    }

    /// The box translated by the given offset.
    pub fn offset(&self, dx: u32, dy: u32) -> BBox {
        BBox {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// One recognized word with its confidence and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    /// Word confidence in `[0, 100]`; engines may report -1 for glyphs
    /// without a usable estimate.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

/// Post-processed output of one engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Line-reconstructed text.
    pub text: String,
    /// Mean confidence of kept words, in `[0, 100]`.
    pub confidence: f64,
    pub words: Vec<Word>,
    pub word_count: u32,
    pub char_count: u32,
    /// Lowest kept word confidence (0.0 when no words survived filtering).
    pub min_word_confidence: f64,
    /// Highest kept word confidence.
    pub max_word_confidence: f64,
    /// The engine parameter string this result was produced with, or the
    /// fallback variant tag.
    pub config_used: String,
    pub processing_time: Duration,
    /// The originating engine error when this result came out of the
    /// fallback ladder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecognitionResult {
    /// An empty zero-confidence result carrying only a config tag.
    pub fn empty(config_used: impl Into<String>) -> Self {
        RecognitionResult {
            text: String::new(),
            confidence: 0.0,
            words: Vec::new(),
            word_count: 0,
            char_count: 0,
            min_word_confidence: 0.0,
            max_word_confidence: 0.0,
            config_used: config_used.into(),
            processing_time: Duration::ZERO,
            error: None,
        }
    }
}

/// Atomic OCR unit for one detected region: a recognition result plus its
/// position in the page's reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnResult {
    /// 1-based reading-order index, copied from the region.
    pub col_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    /// Union of absolute-coordinate word boxes when any words were kept,
    /// otherwise the raw region rectangle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    pub recognition: RecognitionResult,
}

impl ColumnResult {
    /// A zero-confidence empty column, used when a region fails or has
    /// degenerate bounds.
    pub fn empty(col_index: u32, region_id: Option<String>, bbox: Option<BBox>) -> Self {
        ColumnResult {
            col_index,
            region_id,
            bbox,
            recognition: RecognitionResult::empty("unavailable"),
        }
    }

    /// The recognized text for this column.
    pub fn text(&self) -> &str {
        &self.recognition.text
    }

    /// The mean word confidence for this column.
    pub fn confidence(&self) -> f64 {
        self.recognition.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_spans_both_boxes() {
        let a = BBox { x: 10, y: 10, w: 20, h: 5 };
        let b = BBox { x: 25, y: 2, w: 10, h: 30 };
        let u = a.union(&b);
        assert_eq!(u, BBox { x: 10, y: 2, w: 25, h: 30 });
    }

    #[test]
    fn empty_column_has_zero_confidence() {
        let col = ColumnResult::empty(2, None, None);
        assert_eq!(col.confidence(), 0.0);
        assert!(col.text().is_empty());
        assert_eq!(col.col_index, 2);
    }
}
