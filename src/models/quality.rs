//! Quality metrics and page-quality classification.

use serde::{Deserialize, Serialize};

/// Quantitative quality metrics for one page image.
///
/// Derived once per page by the quality assessor; immutable; consumed by the
/// configuration policy and by the coarse quality classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Laplacian-variance edge energy. Higher implies crisper strokes.
    pub sharpness: f64,
    /// Michelson contrast ratio in `[0, 1]`.
    pub contrast: f64,
    /// True when the page qualifies for the minimal-preprocessing path.
    pub is_clean_digital: bool,
    /// Composite difficulty metric: `sharpness * contrast`.
    pub quality_score: f64,
}

/// Coarse page-quality tier derived from the raw metrics.
///
/// Thresholds:
/// - Excellent: sharpness > 250 and contrast > 0.6
/// - Good: sharpness > 150 and contrast > 0.4
/// - Fair: sharpness > 80 and contrast > 0.25
/// - Poor: below the Fair band
/// - Unknown: unassessed pages (fallback results)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PageQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    #[default]
    Unknown,
}

impl PageQuality {
    /// Classifies raw metrics into a quality tier.
    pub fn classify(metrics: &QualityMetrics) -> Self {
        if metrics.sharpness > 250.0 && metrics.contrast > 0.6 {
            PageQuality::Excellent
        } else if metrics.sharpness > 150.0 && metrics.contrast > 0.4 {
            PageQuality::Good
        } else if metrics.sharpness > 80.0 && metrics.contrast > 0.25 {
            PageQuality::Fair
        } else {
            PageQuality::Poor
        }
    }

    /// String tag used in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageQuality::Excellent => "excellent",
            PageQuality::Good => "good",
            PageQuality::Fair => "fair",
            PageQuality::Poor => "poor",
            PageQuality::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PageQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(sharpness: f64, contrast: f64) -> QualityMetrics {
        QualityMetrics {
            sharpness,
            contrast,
            is_clean_digital: false,
            quality_score: sharpness * contrast,
        }
    }

    #[test]
    fn classification_bands() {
        assert_eq!(
            PageQuality::classify(&metrics(300.0, 0.7)),
            PageQuality::Excellent
        );
        assert_eq!(
            PageQuality::classify(&metrics(200.0, 0.5)),
            PageQuality::Good
        );
        assert_eq!(
            PageQuality::classify(&metrics(100.0, 0.3)),
            PageQuality::Fair
        );
        assert_eq!(
            PageQuality::classify(&metrics(40.0, 0.1)),
            PageQuality::Poor
        );
    }

    #[test]
    fn both_axes_must_clear_the_band() {
        // High sharpness alone does not reach Excellent.
        assert_eq!(
            PageQuality::classify(&metrics(400.0, 0.3)),
            PageQuality::Fair
        );
    }

    #[test]
    fn serializes_as_lowercase_string() {
        let json = serde_json::to_string(&PageQuality::Excellent).unwrap();
        assert_eq!(json, r#""excellent""#);
    }
}
