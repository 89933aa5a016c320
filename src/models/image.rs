//! Page image buffers.
//!
//! A [`PageImage`] is an immutable grid of 8-bit samples, either grayscale or
//! 3-channel RGB. It is produced by a reader, owned by the executor for the
//! duration of one page's processing, and never mutated in place: every
//! transform returns a new buffer.

use crate::core::{OcrError, OcrResult};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Serialized form of a page image: raw samples plus shape.
///
/// This is the envelope form used across the process-isolation boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPageImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

/// An immutable page image (grayscale or RGB, 8 bits per sample).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawPageImage", into = "RawPageImage")]
pub enum PageImage {
    /// Single-channel grayscale page.
    Gray(GrayImage),
    /// 3-channel RGB page.
    Rgb(RgbImage),
}

impl PageImage {
    /// Builds a page image from raw samples.
    ///
    /// Rejects empty buffers, channel counts other than 1 or 3, and data
    /// lengths that do not match `width * height * channels`.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> OcrResult<Self> {
        if width == 0 || height == 0 {
            return Err(OcrError::invalid_image("empty image buffer"));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(OcrError::invalid_image(format!(
                "sample count mismatch: expected {expected}, got {}",
                data.len()
            )));
        }
        match channels {
            1 => GrayImage::from_raw(width, height, data)
                .map(PageImage::Gray)
                .ok_or_else(|| OcrError::invalid_image("grayscale buffer construction failed")),
            3 => RgbImage::from_raw(width, height, data)
                .map(PageImage::Rgb)
                .ok_or_else(|| OcrError::invalid_image("rgb buffer construction failed")),
            other => Err(OcrError::invalid_image(format!(
                "unsupported channel count {other}, expected 1 or 3"
            ))),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            PageImage::Gray(img) => img.width(),
            PageImage::Rgb(img) => img.width(),
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            PageImage::Gray(img) => img.height(),
            PageImage::Rgb(img) => img.height(),
        }
    }

    /// Number of channels (1 or 3).
    pub fn channels(&self) -> u8 {
        match self {
            PageImage::Gray(_) => 1,
            PageImage::Rgb(_) => 3,
        }
    }

    /// The raw sample bytes in row-major order.
    pub fn raw_samples(&self) -> &[u8] {
        match self {
            PageImage::Gray(img) => img.as_raw(),
            PageImage::Rgb(img) => img.as_raw(),
        }
    }

    /// Grayscale rendition of the page. Allocates for RGB pages.
    pub fn to_gray(&self) -> GrayImage {
        match self {
            PageImage::Gray(img) => img.clone(),
            PageImage::Rgb(img) => image::DynamicImage::ImageRgb8(img.clone()).to_luma8(),
        }
    }

    /// Extracts a rectangular sub-image as a new buffer.
    ///
    /// Fails when the rectangle is empty or exceeds the page bounds.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> OcrResult<PageImage> {
        if w == 0 || h == 0 {
            return Err(OcrError::invalid_image("empty crop rectangle"));
        }
        if x.saturating_add(w) > self.width() || y.saturating_add(h) > self.height() {
            return Err(OcrError::invalid_image(format!(
                "crop rectangle {x},{y} {w}x{h} exceeds page bounds {}x{}",
                self.width(),
                self.height()
            )));
        }
        Ok(match self {
            PageImage::Gray(img) => PageImage::Gray(imageops::crop_imm(img, x, y, w, h).to_image()),
            PageImage::Rgb(img) => PageImage::Rgb(imageops::crop_imm(img, x, y, w, h).to_image()),
        })
    }

    /// Upscales the page by `factor`, returning a new buffer.
    ///
    /// Factors at or below 1.0 return an unscaled clone.
    pub fn upscale(&self, factor: f64) -> PageImage {
        if factor <= 1.0 {
            return self.clone();
        }
        let w = ((self.width() as f64 * factor).round() as u32).max(1);
        let h = ((self.height() as f64 * factor).round() as u32).max(1);
        match self {
            PageImage::Gray(img) => PageImage::Gray(imageops::resize(img, w, h, FilterType::Triangle)),
            PageImage::Rgb(img) => PageImage::Rgb(imageops::resize(img, w, h, FilterType::Triangle)),
        }
    }

    /// Blake3 hash of the raw samples, as a hex string.
    ///
    /// Used as the content component of cache and memo keys; duplicate pages
    /// within one run hash identically.
    pub fn content_hash(&self) -> String {
        blake3::hash(self.raw_samples()).to_hex().to_string()
    }

    /// Writes the page to disk, with the format inferred from the extension.
    pub fn save(&self, path: &std::path::Path) -> OcrResult<()> {
        match self {
            PageImage::Gray(img) => img.save(path).map_err(OcrError::ImageLoad),
            PageImage::Rgb(img) => img.save(path).map_err(OcrError::ImageLoad),
        }
    }
}

impl From<GrayImage> for PageImage {
    fn from(img: GrayImage) -> Self {
        PageImage::Gray(img)
    }
}

impl From<RgbImage> for PageImage {
    fn from(img: RgbImage) -> Self {
        PageImage::Rgb(img)
    }
}

impl From<PageImage> for RawPageImage {
    fn from(image: PageImage) -> Self {
        RawPageImage {
            width: image.width(),
            height: image.height(),
            channels: image.channels(),
            data: match image {
                PageImage::Gray(img) => img.into_raw(),
                PageImage::Rgb(img) => img.into_raw(),
            },
        }
    }
}

impl TryFrom<RawPageImage> for PageImage {
    type Error = OcrError;

    fn try_from(raw: RawPageImage) -> OcrResult<Self> {
        PageImage::from_raw(raw.width, raw.height, raw.channels, raw.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_gray(width: u32, height: u32, value: u8) -> PageImage {
        PageImage::Gray(GrayImage::from_pixel(width, height, image::Luma([value])))
    }

    #[test]
    fn from_raw_rejects_bad_channel_counts() {
        let err = PageImage::from_raw(2, 2, 2, vec![0; 8]).unwrap_err();
        assert!(matches!(err, OcrError::InvalidImage { .. }));
    }

    #[test]
    fn from_raw_rejects_length_mismatch() {
        assert!(PageImage::from_raw(2, 2, 1, vec![0; 3]).is_err());
        assert!(PageImage::from_raw(0, 2, 1, vec![]).is_err());
    }

    #[test]
    fn crop_is_bounds_checked() {
        let page = uniform_gray(10, 10, 128);
        assert!(page.crop(8, 8, 4, 4).is_err());
        assert!(page.crop(0, 0, 0, 5).is_err());
        let sub = page.crop(2, 3, 4, 5).unwrap();
        assert_eq!((sub.width(), sub.height()), (4, 5));
    }

    #[test]
    fn content_hash_is_stable_for_identical_buffers() {
        let a = uniform_gray(16, 16, 7);
        let b = uniform_gray(16, 16, 7);
        assert_eq!(a.content_hash(), b.content_hash());
        let c = uniform_gray(16, 16, 8);
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn serde_roundtrip_preserves_samples() {
        let page = PageImage::from_raw(3, 2, 3, (0u8..18).collect()).unwrap();
        let json = serde_json::to_string(&page).unwrap();
        let back: PageImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.raw_samples(), page.raw_samples());
        assert_eq!(back.channels(), 3);
    }

    #[test]
    fn upscale_below_one_is_identity() {
        let page = uniform_gray(10, 10, 50);
        let same = page.upscale(1.0);
        assert_eq!((same.width(), same.height()), (10, 10));
        let bigger = page.upscale(1.5);
        assert_eq!((bigger.width(), bigger.height()), (15, 15));
    }
}
