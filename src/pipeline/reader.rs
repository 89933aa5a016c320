//! Page readers.
//!
//! The pipeline consumes page buffers through the [`PageReader`] seam;
//! multi-page formats (PDF rasterization) live with the caller. The reader
//! shipped here decodes single raster images, which covers scanned-page
//! workflows where each page is already a file.
//!
//! [`PageReader`]: crate::core::traits::PageReader

use crate::core::errors::{OcrError, OcrResult};
use crate::core::traits::PageReader;
use crate::models::image::PageImage;
use std::path::Path;
use tracing::debug;

/// Reads one raster image file as a one-page document.
///
/// Grayscale sources stay single-channel; everything else is normalized to
/// RGB.
#[derive(Debug, Default)]
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl PageReader for ImageFileReader {
    fn read(&self, path: &Path) -> OcrResult<Vec<PageImage>> {
        if !path.exists() {
            return Err(OcrError::document_read(format!(
                "no such file: {}",
                path.display()
            )));
        }
        let decoded = image::open(path).map_err(OcrError::ImageLoad)?;
        debug!(path = %path.display(), "decoded source image");
        let page = match decoded {
            image::DynamicImage::ImageLuma8(gray) => PageImage::Gray(gray),
            other => PageImage::Rgb(other.to_rgb8()),
        };
        Ok(vec![page])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_document_error() {
        let err = ImageFileReader::new()
            .read(Path::new("/nonexistent/scan.png"))
            .unwrap_err();
        assert!(matches!(err, OcrError::DocumentRead { .. }));
    }

    #[test]
    fn decodes_a_png_into_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        image::GrayImage::from_pixel(12, 8, image::Luma([77]))
            .save(&path)
            .unwrap();

        let pages = ImageFileReader::new().read(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].channels(), 1);
        assert_eq!((pages[0].width(), pages[0].height()), (12, 8));
    }
}
