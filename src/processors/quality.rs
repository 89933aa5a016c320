//! Fast per-page quality assessment.
//!
//! Provides the quantitative metrics the configuration policy keys on:
//! sharpness (Laplacian variance) and contrast (Michelson ratio). Clean
//! digital pages (high on both axes) take the minimal-preprocessing path;
//! heavy preprocessing on such pages degrades recognition accuracy.

use crate::models::image::PageImage;
use crate::models::quality::QualityMetrics;
use image::GrayImage;
use itertools::{Itertools, MinMaxResult};

const SHARPNESS_CLEAN: f64 = 150.0;
const CONTRAST_CLEAN: f64 = 0.4;

/// Epsilon guarding the Michelson ratio against uniform images.
const CONTRAST_EPSILON: f64 = 1e-6;

/// Assesses page quality from the grayscale rendition of the image.
///
/// Pure and stateless; a uniform image yields sharpness 0, contrast 0, and
/// `is_clean_digital = false`.
pub fn assess(image: &PageImage) -> QualityMetrics {
    let gray = image.to_gray();

    let sharpness = laplacian_variance(&gray);
    let contrast = michelson_contrast(&gray);
    let is_clean_digital = sharpness > SHARPNESS_CLEAN && contrast > CONTRAST_CLEAN;

    QualityMetrics {
        sharpness,
        contrast,
        is_clean_digital,
        quality_score: sharpness * contrast,
    }
}

/// Variance of the 4-neighbour discrete Laplacian response.
///
/// Sensitive to text stroke edges; higher values indicate crisper glyphs.
fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }

    let raw = gray.as_raw();
    let stride = w as usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let count = ((w - 2) as u64 * (h - 2) as u64) as f64;

    for y in 1..(h as usize - 1) {
        let row = y * stride;
        for x in 1..(w as usize - 1) {
            let center = raw[row + x] as f64;
            let response = raw[row + x - 1] as f64
                + raw[row + x + 1] as f64
                + raw[row - stride + x] as f64
                + raw[row + stride + x] as f64
                - 4.0 * center;
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

/// Michelson contrast: `(max - min) / (max + min + eps)` over the intensity
/// range. Robust to absolute intensity shifts.
fn michelson_contrast(gray: &GrayImage) -> f64 {
    let (min, max) = match gray.as_raw().iter().minmax() {
        MinMaxResult::NoElements => return 0.0,
        MinMaxResult::OneElement(&v) => (v as f64, v as f64),
        MinMaxResult::MinMax(&min, &max) => (min as f64, max as f64),
    };
    (max - min) / (max + min + CONTRAST_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gray_page(img: GrayImage) -> PageImage {
        PageImage::Gray(img)
    }

    #[test]
    fn uniform_image_scores_zero() {
        let page = gray_page(GrayImage::from_pixel(256, 256, Luma([128])));
        let metrics = assess(&page);
        assert_eq!(metrics.sharpness, 0.0);
        assert_eq!(metrics.contrast, 0.0);
        assert!(!metrics.is_clean_digital);
        assert_eq!(metrics.quality_score, 0.0);
    }

    #[test]
    fn contrast_stays_in_unit_interval() {
        let mut img = GrayImage::from_pixel(64, 64, Luma([255]));
        for x in 0..32 {
            img.put_pixel(x, 10, Luma([0]));
        }
        let metrics = assess(&gray_page(img));
        assert!(metrics.contrast >= 0.0 && metrics.contrast <= 1.0);
    }

    #[test]
    fn quality_score_is_product_of_axes() {
        let mut img = GrayImage::from_pixel(128, 128, Luma([230]));
        for y in (8..120).step_by(12) {
            for x in 8..120 {
                img.put_pixel(x, y, Luma([10]));
            }
        }
        let metrics = assess(&gray_page(img));
        let expected = metrics.sharpness * metrics.contrast;
        assert!((metrics.quality_score - expected).abs() < 1e-9);
    }

    #[test]
    fn checkerboard_is_sharper_than_flat_gradient() {
        let checker = GrayImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let gradient = GrayImage::from_fn(64, 64, |x, _| Luma([(x * 4) as u8]));
        let sharp = assess(&gray_page(checker)).sharpness;
        let smooth = assess(&gray_page(gradient)).sharpness;
        assert!(sharp > smooth);
    }
}
