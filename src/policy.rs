//! Engine configuration policy.
//!
//! A pure, deterministic decision function mapping layout and quality to
//! recognition parameters. Threshold-banded: blur and contrast degradation
//! compete instead of following a strict hierarchy, and the clean-digital
//! fast path requires strong evidence on both axes. The bias is
//! conservative: grayscale unless degradation is measurable.

use crate::models::layout::LayoutType;
use crate::models::quality::QualityMetrics;
use serde::{Deserialize, Serialize};

/// Preprocessing strategy applied to a region before the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preprocessing {
    /// Plain grayscale, no thresholding.
    Gray,
    /// Global Otsu binarization.
    Otsu,
    /// Locally adaptive thresholding.
    Adaptive,
}

impl Preprocessing {
    /// String tag used in cache keys and serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Preprocessing::Gray => "gray",
            Preprocessing::Otsu => "otsu",
            Preprocessing::Adaptive => "adaptive",
        }
    }
}

/// Engine accuracy/speed mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Fastest inference; clean digital pages only.
    Fast,
    /// Balanced default.
    Balanced,
    /// Highest accuracy; degraded pages.
    Best,
}

impl EngineMode {
    /// The numeric engine-mode parameter this mode maps to.
    pub fn oem(&self) -> u8 {
        match self {
            EngineMode::Fast => 1,
            EngineMode::Balanced => 2,
            EngineMode::Best => 3,
        }
    }

    /// String tag used in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineMode::Fast => "fast",
            EngineMode::Balanced => "balanced",
            EngineMode::Best => "best",
        }
    }
}

/// Immutable engine configuration selected for one region.
///
/// Value object with structural equality; identical policy inputs always
/// yield a structurally equal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub preprocessing: Preprocessing,
    pub page_segmentation_mode: u8,
    /// Upscaling factor, at least 1.0. Kept at or below 1.5 to bound memory.
    pub scale: f64,
    pub engine_mode: EngineMode,
}

// Sharpness thresholds (Laplacian variance).
const SHARPNESS_LOW: f64 = 50.0;
const SHARPNESS_MEDIUM: f64 = 90.0;
const SHARPNESS_HIGH: f64 = 150.0;

// Contrast thresholds (Michelson ratio).
const CONTRAST_LOW: f64 = 0.30;
const CONTRAST_MEDIUM: f64 = 0.45;
const CONTRAST_HIGH: f64 = 0.55;

/// Selects the engine configuration for a region.
///
/// Decision order:
/// 1. Strong clean-digital override (high sharpness and high contrast).
/// 2. Blur dominance: adaptive thresholding with progressive upscaling.
/// 3. Low contrast: Otsu.
/// 4. Conservative grayscale default.
///
/// Non-finite metric values are coerced to 0 rather than propagated, so the
/// function never fails.
pub fn decide(layout_type: LayoutType, quality: &QualityMetrics) -> EngineConfig {
    let sharpness = finite_or_zero(quality.sharpness);
    let contrast = finite_or_zero(quality.contrast);

    if quality.is_clean_digital && sharpness >= SHARPNESS_HIGH && contrast >= CONTRAST_HIGH {
        return EngineConfig {
            preprocessing: Preprocessing::Gray,
            page_segmentation_mode: column_psm(layout_type),
            scale: 1.0,
            engine_mode: EngineMode::Fast,
        };
    }

    let blur_score = (SHARPNESS_LOW - sharpness).max(0.0);
    let contrast_score = (CONTRAST_LOW - contrast).max(0.0);

    if blur_score > contrast_score && sharpness < SHARPNESS_MEDIUM {
        let scale = if sharpness < 35.0 {
            1.5
        } else if sharpness < 50.0 {
            1.3
        } else {
            1.2
        };
        return EngineConfig {
            preprocessing: Preprocessing::Adaptive,
            page_segmentation_mode: 6,
            scale,
            engine_mode: EngineMode::Best,
        };
    }

    if contrast < CONTRAST_MEDIUM {
        return EngineConfig {
            preprocessing: Preprocessing::Otsu,
            page_segmentation_mode: if layout_type != LayoutType::Single { 11 } else { 3 },
            scale: 1.2,
            engine_mode: EngineMode::Balanced,
        };
    }

    EngineConfig {
        preprocessing: Preprocessing::Gray,
        page_segmentation_mode: column_psm(layout_type),
        scale: 1.0,
        engine_mode: EngineMode::Balanced,
    }
}

/// Segmentation mode for non-degraded pages: full auto for single-column,
/// column-aware for everything else.
fn column_psm(layout_type: LayoutType) -> u8 {
    if layout_type == LayoutType::Single {
        3
    } else {
        4
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
