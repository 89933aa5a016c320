//! Per-page orchestration.
//!
//! Drives one page through quality assessment, layout detection, and
//! per-region recognition, isolating region failures so a bad region never
//! aborts its siblings. `process` is total: a failure outside the
//! per-region boundary yields the sentinel fallback page, never an error.

use crate::core::traits::LayoutAnalyzer;
use crate::engine::EngineInvoker;
use crate::models::image::PageImage;
use crate::models::layout::Region;
use crate::models::page::PageResult;
use crate::models::quality::{PageQuality, QualityMetrics};
use crate::models::recognition::{BBox, ColumnResult};
use crate::models::LayoutType;
use crate::policy;
use crate::processors::quality;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Orchestrates complete recognition of a single page.
///
/// Stateless between pages apart from the shared invoker cache, so one
/// executor instance serves concurrent page tasks.
pub struct PageExecutor {
    layout: Box<dyn LayoutAnalyzer>,
    invoker: Arc<EngineInvoker>,
    min_confidence: f64,
}

impl PageExecutor {
    pub fn new(
        layout: Box<dyn LayoutAnalyzer>,
        invoker: Arc<EngineInvoker>,
        min_confidence: f64,
    ) -> Self {
        PageExecutor {
            layout,
            invoker,
            min_confidence,
        }
    }

    /// Access to the shared invoker (statistics, cache introspection).
    pub fn invoker(&self) -> &Arc<EngineInvoker> {
        &self.invoker
    }

    /// Processes one page into a [`PageResult`].
    ///
    /// Region failures are substituted with empty zero-confidence columns
    /// and noted in the page warnings; a layout-detection failure replaces
    /// the whole page with the fallback sentinel.
    pub fn process(&self, image: &PageImage, page_number: u32) -> PageResult {
        let started = Instant::now();

        let metrics = quality::assess(image);
        let tier = PageQuality::classify(&metrics);
        debug!(
            page_number,
            sharpness = metrics.sharpness,
            contrast = metrics.contrast,
            %tier,
            "page quality assessed"
        );

        let layout = match self.layout.detect(image) {
            Ok(layout) => layout,
            Err(error) => {
                warn!(page_number, %error, "layout detection failed, substituting fallback page");
                return PageResult::fallback(page_number, started.elapsed());
            }
        };

        let mut columns = Vec::with_capacity(layout.regions.len());
        let mut warnings = Vec::new();
        for region in &layout.regions {
            match self.process_region(image, region, layout.layout_type, &metrics) {
                Ok(column) => columns.push(column),
                Err(error) => {
                    warn!(page_number, col_index = region.col_index, %error,
                        "region failed, substituting empty column");
                    warnings.push(format!("region_{}_failed", region.col_index));
                    columns.push(ColumnResult::empty(
                        region.col_index,
                        region.id.clone(),
                        safe_region_bbox(region),
                    ));
                }
            }
        }
        columns.sort_by_key(|c| c.col_index);

        let mean_confidence = if columns.is_empty() {
            0.0
        } else {
            columns.iter().map(|c| c.confidence()).sum::<f64>() / columns.len() as f64
        };

        let text = columns
            .iter()
            .map(|c| c.text())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let text_hash = if text.is_empty() {
            None
        } else {
            Some(blake3::hash(text.as_bytes()).to_hex().to_string())
        };

        PageResult {
            page_number,
            layout_type: layout.layout_type,
            quality: tier,
            config_used: dominant_config(&columns),
            columns,
            mean_confidence,
            processing_time: started.elapsed(),
            warnings,
            text_hash,
        }
    }

    fn process_region(
        &self,
        image: &PageImage,
        region: &Region,
        layout_type: LayoutType,
        metrics: &QualityMetrics,
    ) -> crate::core::OcrResult<ColumnResult> {
        let crop = image.crop(region.x, region.y, region.w, region.h)?;
        let config = policy::decide(layout_type, metrics);
        let mut recognition = self.invoker.invoke(&crop, &config, self.min_confidence);

        // Word boxes come back in region coordinates; lift them to page
        // coordinates before publishing.
        for word in &mut recognition.words {
            if let Some(bbox) = &mut word.bbox {
                *bbox = bbox.offset(region.x, region.y);
            }
        }
        let bbox = recognition
            .words
            .iter()
            .filter_map(|w| w.bbox)
            .reduce(|a, b| a.union(&b))
            .or_else(|| safe_region_bbox(region));

        Ok(ColumnResult {
            col_index: region.col_index,
            region_id: region.id.clone(),
            bbox,
            recognition,
        })
    }
}

/// The region rectangle, or None when its dimensions are degenerate.
fn safe_region_bbox(region: &Region) -> Option<BBox> {
    if region.w > 0 && region.h > 0 {
        Some(region.bbox())
    } else {
        None
    }
}

/// Most frequent column config string, for page-level traceability.
fn dominant_config(columns: &[ColumnResult]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for column in columns {
        let config = column.recognition.config_used.as_str();
        if config != "unavailable" {
            *counts.entry(config).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(config, _)| config.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelProfile;
    use crate::core::errors::{OcrError, OcrResult};
    use crate::core::traits::{EngineOutput, EngineParams, RawWord, RecognitionBackend};
    use crate::models::layout::LayoutResult;
    use image::GrayImage;

    struct StaticBackend;

    impl RecognitionBackend for StaticBackend {
        fn recognize(
            &self,
            _image: &PageImage,
            _params: &EngineParams,
        ) -> OcrResult<EngineOutput> {
            Ok(EngineOutput {
                words: vec![RawWord {
                    text: "texto".to_string(),
                    confidence: 85.0,
                    bbox: Some(BBox { x: 5, y: 5, w: 30, h: 10 }),
                }],
            })
        }
    }

    /// Layout stub emitting a fixed region list.
    struct FixedLayout(Vec<Region>);

    impl LayoutAnalyzer for FixedLayout {
        fn detect(&self, image: &PageImage) -> OcrResult<LayoutResult> {
            if self.0.is_empty() {
                return Err(OcrError::processing(
                    crate::core::ProcessingStage::LayoutAnalysis,
                    "synthetic failure",
                    std::io::Error::new(std::io::ErrorKind::Other, "boom"),
                ));
            }
            Ok(LayoutResult {
                layout_type: LayoutType::Double,
                regions: self.0.clone(),
                confidence: 0.9,
                method: "stub".to_string(),
            })
        }
    }

    /// Sharp high-contrast page so the policy selects scale 1.0 and word
    /// boxes pass through undistorted.
    fn page() -> PageImage {
        PageImage::Gray(GrayImage::from_fn(200, 100, |x, y| {
            if (x + y) % 2 == 0 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        }))
    }

    fn executor(layout: FixedLayout) -> PageExecutor {
        let invoker =
            EngineInvoker::new(Box::new(StaticBackend), ModelProfile::Standard, "eng").unwrap();
        PageExecutor::new(Box::new(layout), Arc::new(invoker), 30.0)
    }

    fn region(x: u32, w: u32, col_index: u32) -> Region {
        Region {
            x,
            y: 0,
            w,
            h: 100,
            col_index,
            id: None,
        }
    }

    #[test]
    fn zero_width_region_is_isolated() {
        let executor = executor(FixedLayout(vec![
            region(0, 100, 1),
            region(100, 0, 2),
        ]));
        let result = executor.process(&page(), 1);

        assert_eq!(result.columns.len(), 2);
        let good = &result.columns[0];
        assert_eq!(good.text(), "texto");
        assert_eq!(good.confidence(), 85.0);
        let empty = &result.columns[1];
        assert_eq!(empty.confidence(), 0.0);
        assert!(empty.text().is_empty());
        assert_eq!(result.warnings, vec!["region_2_failed"]);
        assert_eq!(result.mean_confidence, 42.5);
    }

    #[test]
    fn word_boxes_are_lifted_to_page_coordinates() {
        let executor = executor(FixedLayout(vec![region(100, 100, 1)]));
        let result = executor.process(&page(), 1);
        let bbox = result.columns[0].bbox.unwrap();
        assert_eq!((bbox.x, bbox.y), (105, 5));
    }

    #[test]
    fn layout_failure_substitutes_fallback_page() {
        let executor = executor(FixedLayout(Vec::new()));
        let result = executor.process(&page(), 7);
        assert!(result.is_fallback());
        assert_eq!(result.page_number, 7);
        assert_eq!(result.mean_confidence, 0.0);
        assert_eq!(result.columns.len(), 1);
    }

    #[test]
    fn page_text_hash_present_only_with_text() {
        let with_text = executor(FixedLayout(vec![region(0, 200, 1)])).process(&page(), 1);
        assert!(with_text.text_hash.is_some());

        let without = executor(FixedLayout(vec![region(0, 0, 1)])).process(&page(), 1);
        assert!(without.text_hash.is_none());
    }
}
