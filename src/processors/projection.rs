//! Projection profiles and structural features for layout analysis.

use image::imageops::crop_imm;
use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::ops::Range;

/// Column-wise sum of sample values. On an inverse-polarity binary mask the
/// profile dips wherever a page has an inter-column gutter.
pub fn column_projection(image: &GrayImage) -> Vec<u64> {
    let (w, h) = image.dimensions();
    let raw = image.as_raw();
    let stride = w as usize;
    let mut profile = vec![0u64; w as usize];
    for y in 0..h as usize {
        let row = y * stride;
        for (x, slot) in profile.iter_mut().enumerate() {
            *slot += raw[row + x] as u64;
        }
    }
    profile
}

/// Row-wise sum of sample values.
pub fn row_projection(image: &GrayImage) -> Vec<u64> {
    let (w, h) = image.dimensions();
    let raw = image.as_raw();
    let stride = w as usize;
    (0..h as usize)
        .map(|y| raw[y * stride..y * stride + w as usize].iter().map(|&v| v as u64).sum())
        .collect()
}

/// Index and depth of the deepest valley within `range`, or `None` when the
/// range is empty or out of bounds.
pub fn deepest_valley(profile: &[u64], range: Range<usize>) -> Option<(usize, u64)> {
    let end = range.end.min(profile.len());
    if range.start >= end {
        return None;
    }
    profile[range.start..end]
        .iter()
        .enumerate()
        .min_by_key(|(_, &depth)| depth)
        .map(|(offset, &depth)| (range.start + offset, depth))
}

/// Mean of the profile over `range` (0.0 for an empty range).
pub fn profile_mean(profile: &[u64], range: Range<usize>) -> f64 {
    let end = range.end.min(profile.len());
    if range.start >= end {
        return 0.0;
    }
    let slice = &profile[range.start..end];
    slice.iter().sum::<u64>() as f64 / slice.len() as f64
}

/// Local minima lying below `min_depth_ratio` times the profile mean.
///
/// This is the valley census used by the feature-based detector; plateaus do
/// not count, only strict dips.
pub fn local_minima_valleys(profile: &[u64], min_depth_ratio: f64) -> Vec<usize> {
    if profile.len() < 3 {
        return Vec::new();
    }
    let mean = profile.iter().sum::<u64>() as f64 / profile.len() as f64;
    let cutoff = mean * min_depth_ratio;
    (1..profile.len() - 1)
        .filter(|&i| {
            profile[i] < profile[i - 1]
                && profile[i] < profile[i + 1]
                && (profile[i] as f64) < cutoff
        })
        .collect()
}

/// Number of 8-connected foreground components in a binary mask.
pub fn component_count(binary: &GrayImage) -> usize {
    if binary.width() == 0 || binary.height() == 0 {
        return 0;
    }
    let labelled = connected_components(binary, Connectivity::Eight, Luma([0u8]));
    labelled.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize
}

/// Component count restricted to a horizontal span of the mask.
pub fn component_count_in_span(binary: &GrayImage, x: u32, w: u32) -> usize {
    if w == 0 || x >= binary.width() {
        return 0;
    }
    let w = w.min(binary.width() - x);
    let view = crop_imm(binary, x, 0, w, binary.height()).to_image();
    component_count(&view)
}

/// Left/right mirror-symmetry score in `[0, 1]`.
///
/// Double-column pages mirror well around the gutter; 0.5 is returned when
/// the halves cannot be compared.
pub fn mirror_symmetry(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    let split = w / 2;
    if split == 0 {
        return 0.5;
    }
    let right_start = if w % 2 == 0 { split } else { split + 1 };
    let left = crop_imm(gray, 0, 0, split, h).to_image();
    let right = crop_imm(gray, right_start, 0, w - right_start, h).to_image();
    if left.dimensions() != right.dimensions() {
        return 0.5;
    }

    let (lw, lh) = left.dimensions();
    let mut diff_sum = 0.0;
    for y in 0..lh {
        for x in 0..lw {
            let l = left.get_pixel(x, y).0[0] as f64;
            let r = right.get_pixel(lw - 1 - x, y).0[0] as f64;
            diff_sum += (l - r).abs();
        }
    }
    1.0 - diff_sum / (lw * lh) as f64 / 255.0
}

/// Fraction of dark pixels (below 128), a rough text-density estimate.
pub fn text_density(gray: &GrayImage) -> f64 {
    let total = gray.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    gray.as_raw().iter().filter(|&&v| v < 128).count() as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped_mask() -> GrayImage {
        // Foreground on both flanks, empty gutter in the middle third.
        GrayImage::from_fn(90, 30, |x, _| {
            if x < 30 || x >= 60 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn projection_exposes_the_gutter() {
        let profile = column_projection(&striped_mask());
        assert_eq!(profile[10], 255 * 30);
        assert_eq!(profile[45], 0);
        let (idx, depth) = deepest_valley(&profile, 20..70).unwrap();
        assert!(idx >= 30 && idx < 60);
        assert_eq!(depth, 0);
    }

    #[test]
    fn deepest_valley_rejects_empty_range() {
        let profile = vec![5u64; 10];
        assert!(deepest_valley(&profile, 7..7).is_none());
        assert!(deepest_valley(&profile, 12..20).is_none());
    }

    #[test]
    fn local_minima_require_strict_dips() {
        let profile = vec![100, 100, 100, 100, 100];
        assert!(local_minima_valleys(&profile, 0.3).is_empty());
        let dipped = vec![100, 100, 2, 100, 100];
        assert_eq!(local_minima_valleys(&dipped, 0.3), vec![2]);
    }

    #[test]
    fn component_count_separates_blobs() {
        let mut mask = GrayImage::from_pixel(40, 40, Luma([0]));
        for (cx, cy) in [(5u32, 5u32), (20, 20), (32, 8)] {
            for dx in 0..3 {
                for dy in 0..3 {
                    mask.put_pixel(cx + dx, cy + dy, Luma([255]));
                }
            }
        }
        assert_eq!(component_count(&mask), 3);
        assert_eq!(component_count_in_span(&mask, 0, 15), 1);
    }

    #[test]
    fn symmetric_page_scores_high() {
        let symmetric = striped_mask();
        assert!(mirror_symmetry(&symmetric) > 0.9);
        let lopsided = GrayImage::from_fn(90, 30, |x, _| {
            if x < 45 {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        assert!(mirror_symmetry(&lopsided) < 0.2);
    }
}
