//! Binarization and engine-facing image preparation.
//!
//! Layout analysis wants text-as-foreground (inverse polarity) binary masks;
//! the recognition engine wants dark text on a light background. Both are
//! produced here from the same Otsu level. All transforms allocate new
//! buffers; page images are never mutated in place.

use crate::models::image::PageImage;
use crate::policy::{EngineConfig, Preprocessing};
use image::{GrayImage, Luma};
use imageproc::contrast::{adaptive_threshold, otsu_level};

/// Neighbourhood radius for adaptive thresholding of degraded pages.
const ADAPTIVE_BLOCK_RADIUS: u32 = 15;

/// Inverse-Otsu binarization: text (dark strokes) becomes white foreground.
///
/// This is the mask consumed by projection analysis, where foreground sums
/// per column expose inter-column valleys.
pub fn otsu_binarize_inv(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    map_threshold(gray, |v| v <= level)
}

/// Otsu binarization in engine polarity: dark text on white background.
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    map_threshold(gray, |v| v > level)
}

fn map_threshold(gray: &GrayImage, keep_white: impl Fn(u8) -> bool) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if keep_white(gray.get_pixel(x, y).0[0]) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Prepares a region image for the engine according to the selected
/// configuration: preprocessing first, then upscaling.
pub fn prepare(image: &PageImage, config: &EngineConfig) -> PageImage {
    let prepared = match config.preprocessing {
        Preprocessing::Gray => PageImage::Gray(image.to_gray()),
        Preprocessing::Otsu => PageImage::Gray(otsu_binarize(&image.to_gray())),
        Preprocessing::Adaptive => {
            PageImage::Gray(adaptive_threshold(&image.to_gray(), ADAPTIVE_BLOCK_RADIUS))
        }
    };
    prepared.upscale(config.scale)
}

/// Fraction of foreground (white) pixels in a binary mask.
pub fn foreground_ratio(binary: &GrayImage) -> f64 {
    let total = binary.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    let foreground = binary.as_raw().iter().filter(|&&v| v > 0).count();
    foreground as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::EngineMode;

    fn two_tone(dark: u8, light: u8) -> GrayImage {
        GrayImage::from_fn(32, 32, |x, _| {
            if x < 8 {
                Luma([dark])
            } else {
                Luma([light])
            }
        })
    }

    #[test]
    fn inverse_polarity_marks_dark_strokes_as_foreground() {
        let binary = otsu_binarize_inv(&two_tone(10, 240));
        assert_eq!(binary.get_pixel(0, 0), &Luma([255]));
        assert_eq!(binary.get_pixel(20, 0), &Luma([0]));
    }

    #[test]
    fn engine_polarity_keeps_background_white() {
        let binary = otsu_binarize(&two_tone(10, 240));
        assert_eq!(binary.get_pixel(0, 0), &Luma([0]));
        assert_eq!(binary.get_pixel(20, 0), &Luma([255]));
    }

    #[test]
    fn prepare_applies_scale() {
        let page = PageImage::Gray(two_tone(10, 240));
        let config = EngineConfig {
            preprocessing: Preprocessing::Gray,
            page_segmentation_mode: 3,
            scale: 1.5,
            engine_mode: EngineMode::Balanced,
        };
        let prepared = prepare(&page, &config);
        assert_eq!(prepared.width(), 48);
        assert_eq!(prepared.height(), 48);
    }

    #[test]
    fn foreground_ratio_of_quarter_mask() {
        let binary = otsu_binarize_inv(&two_tone(0, 255));
        assert!((foreground_ratio(&binary) - 0.25).abs() < 1e-9);
    }
}
