//! Layout classification and page regions.

use crate::models::recognition::BBox;
use serde::{Deserialize, Serialize};

/// Coarse column/structure classification of a page.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    /// One region covering the whole page.
    Single,
    /// Two columns split at a projection valley.
    Double,
    /// Three or more columns.
    Multi,
    /// Mixed content (tables, forms, irregular structure).
    Complex,
    /// Unassessed layout (fallback results).
    #[default]
    Unknown,
}

impl LayoutType {
    /// String tag used in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Single => "single",
            LayoutType::Double => "double",
            LayoutType::Multi => "multi",
            LayoutType::Complex => "complex",
            LayoutType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LayoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rectangular sub-area of a page submitted independently to the engine.
///
/// Regions are ordered left-to-right / top-to-bottom by their 1-based
/// `col_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// 1-based reading-order index.
    pub col_index: u32,
    /// Optional identifier for debugging/audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Region {
    /// A region covering an entire page of the given dimensions.
    pub fn full_page(w: u32, h: u32) -> Self {
        Region {
            x: 0,
            y: 0,
            w,
            h,
            col_index: 1,
            id: None,
        }
    }

    /// The region rectangle as a bounding box.
    pub fn bbox(&self) -> BBox {
        BBox {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

/// Result of layout detection on one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResult {
    pub layout_type: LayoutType,
    /// Non-empty, ordered by `col_index`.
    pub regions: Vec<Region>,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
    /// Tag naming the detection path taken ("trivial", "projection",
    /// "fallback", "feature").
    pub method: String,
}

impl LayoutResult {
    /// A single full-page region with the given method tag and confidence.
    pub fn single(width: u32, height: u32, confidence: f64, method: &str) -> Self {
        LayoutResult {
            layout_type: LayoutType::Single,
            regions: vec![Region::full_page(width, height)],
            confidence,
            method: method.to_string(),
        }
    }
}
