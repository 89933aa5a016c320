//! Feature-based layout detection for complex structures.
//!
//! Escalation path for documents the projection detector misclassifies:
//! 3+ column journals, forms, pages with embedded tables. Classifies from a
//! small feature vector (projection valley counts, mirror symmetry, text
//! density) and emits equal-split regions for the classified structure.
//! Slower and noisier than the projection detector; callers choose it by
//! policy, not by default.

use crate::core::errors::OcrResult;
use crate::core::traits::LayoutAnalyzer;
use crate::models::image::PageImage;
use crate::models::layout::{LayoutResult, LayoutType, Region};
use crate::processors::projection;
use image::GrayImage;
use tracing::debug;

/// Valley depth cutoff relative to the projection mean.
const VALLEY_DEPTH_RATIO: f64 = 0.3;
/// Symmetry required to call a one-valley page double-column.
const DOUBLE_SYMMETRY: f64 = 0.6;
/// Base confidence for any feature-based classification.
const BASE_CONFIDENCE: f64 = 0.7;

struct LayoutFeatures {
    vert_valleys: usize,
    horz_valleys: usize,
    symmetry: f64,
    text_density: f64,
}

/// Feature-based detector for complex layout structures.
#[derive(Debug, Default)]
pub struct FeatureLayoutDetector;

impl FeatureLayoutDetector {
    pub fn new() -> Self {
        Self
    }

    fn extract(gray: &GrayImage) -> LayoutFeatures {
        let vert = projection::column_projection(gray);
        let horz = projection::row_projection(gray);
        LayoutFeatures {
            vert_valleys: projection::local_minima_valleys(&vert, VALLEY_DEPTH_RATIO).len(),
            horz_valleys: projection::local_minima_valleys(&horz, VALLEY_DEPTH_RATIO).len(),
            symmetry: projection::mirror_symmetry(gray),
            text_density: projection::text_density(gray),
        }
    }

    fn classify(features: &LayoutFeatures) -> LayoutType {
        if features.vert_valleys >= 1 && features.symmetry > DOUBLE_SYMMETRY {
            LayoutType::Double
        } else if features.vert_valleys >= 2 {
            LayoutType::Multi
        } else if features.horz_valleys >= 1 {
            LayoutType::Complex
        } else {
            LayoutType::Single
        }
    }

    fn regions_for(layout_type: LayoutType, w: u32, h: u32) -> Vec<Region> {
        let region = |x, y, rw, rh, col_index| Region {
            x,
            y,
            w: rw,
            h: rh,
            col_index,
            id: None,
        };
        match layout_type {
            LayoutType::Double => {
                let split = w / 2;
                vec![region(0, 0, split, h, 1), region(split, 0, w - split, h, 2)]
            }
            LayoutType::Multi => {
                let col_w = w / 3;
                vec![
                    region(0, 0, col_w, h, 1),
                    region(col_w, 0, col_w, h, 2),
                    region(col_w * 2, 0, w - col_w * 2, h, 3),
                ]
            }
            LayoutType::Complex => {
                // 2x2 grid keeps headers/footers separate from body text.
                let (hw, hh) = (w / 2, h / 2);
                vec![
                    region(0, 0, hw, hh, 1),
                    region(hw, 0, w - hw, hh, 2),
                    region(0, hh, hw, h - hh, 3),
                    region(hw, hh, w - hw, h - hh, 4),
                ]
            }
            _ => vec![Region::full_page(w, h)],
        }
    }

    fn confidence(features: &LayoutFeatures, layout_type: LayoutType) -> f64 {
        let mut confidence = BASE_CONFIDENCE;
        if layout_type == LayoutType::Double && features.symmetry > 0.7 {
            confidence += 0.2;
        }
        if matches!(layout_type, LayoutType::Double | LayoutType::Multi)
            && features.vert_valleys >= 1
        {
            confidence += 0.1;
        }
        confidence.min(1.0)
    }
}

impl LayoutAnalyzer for FeatureLayoutDetector {
    fn detect(&self, image: &PageImage) -> OcrResult<LayoutResult> {
        let gray = image.to_gray();
        let features = Self::extract(&gray);
        let layout_type = Self::classify(&features);
        debug!(
            ?layout_type,
            vert_valleys = features.vert_valleys,
            horz_valleys = features.horz_valleys,
            symmetry = features.symmetry,
            text_density = features.text_density,
            "feature-based layout classification"
        );

        Ok(LayoutResult {
            layout_type,
            regions: Self::regions_for(layout_type, image.width(), image.height()),
            confidence: Self::confidence(&features, layout_type),
            method: "feature".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Bright page with single-pixel dark vertical gutters.
    fn gutter_page(gutters: &[u32]) -> PageImage {
        let img = GrayImage::from_fn(900, 600, |x, _| {
            if gutters.contains(&x) {
                Luma([0])
            } else {
                Luma([200])
            }
        });
        PageImage::Gray(img)
    }

    #[test]
    fn symmetric_gutter_classifies_double() {
        let detector = FeatureLayoutDetector::new();
        let layout = detector.detect(&gutter_page(&[450])).unwrap();
        assert_eq!(layout.layout_type, LayoutType::Double);
        assert_eq!(layout.method, "feature");
        assert!(layout.confidence >= 0.9);
        assert_eq!(layout.regions.len(), 2);
    }

    #[test]
    fn featureless_page_classifies_single() {
        let detector = FeatureLayoutDetector::new();
        let page = PageImage::Gray(GrayImage::from_pixel(900, 600, Luma([200])));
        let layout = detector.detect(&page).unwrap();
        assert_eq!(layout.layout_type, LayoutType::Single);
        assert_eq!(layout.confidence, BASE_CONFIDENCE);
        assert_eq!(layout.regions.len(), 1);
    }

    #[test]
    fn horizontal_band_classifies_complex() {
        // A dark horizontal rule (no vertical valleys anywhere).
        let img = GrayImage::from_fn(900, 600, |_, y| {
            if y == 300 {
                Luma([0])
            } else {
                Luma([220])
            }
        });
        let detector = FeatureLayoutDetector::new();
        let layout = detector.detect(&PageImage::Gray(img)).unwrap();
        assert_eq!(layout.layout_type, LayoutType::Complex);
        assert_eq!(layout.regions.len(), 4);
        assert_eq!(
            layout.regions.iter().map(|r| r.col_index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn multi_requires_low_symmetry() {
        // Two valleys on a page whose halves differ strongly, so the
        // double-column symmetry gate cannot fire.
        let img = GrayImage::from_fn(900, 600, |x, _| {
            if x == 200 || x == 500 {
                Luma([0])
            } else if x < 450 {
                Luma([30])
            } else {
                Luma([220])
            }
        });
        let layout = FeatureLayoutDetector::new()
            .detect(&PageImage::Gray(img))
            .unwrap();
        assert_eq!(layout.layout_type, LayoutType::Multi);
        assert_eq!(layout.regions.len(), 3);
    }
}
