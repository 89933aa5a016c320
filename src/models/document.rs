//! Document-level results and aggregate statistics.

use crate::core::config::DocumentConfig;
use crate::models::page::PageResult;
use crate::models::quality::PageQuality;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Pages below this mean confidence are listed in
/// [`DocumentStatistics::low_confidence_pages`].
const LOW_CONFIDENCE_THRESHOLD: f64 = 60.0;

/// Aggregate metrics for one processed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatistics {
    /// Number of page images the document contained.
    pub total_pages: u32,
    /// Pages whose mean confidence cleared the configured minimum.
    pub successful_pages: u32,
    /// Pages at or below the minimum, plus pages excluded by the
    /// process-isolated strategy.
    pub failed_pages: u32,
    pub total_words: u32,
    pub total_characters: u32,
    /// Mean of page confidences, in `[0, 100]`.
    pub average_confidence: f64,
    pub total_processing_time: Duration,
    pub pages_per_second: f64,
    /// Histogram of quality tiers across pages.
    pub quality_distribution: BTreeMap<PageQuality, u32>,
    /// Page numbers whose mean confidence fell below 60.0.
    pub low_confidence_pages: Vec<u32>,
}

impl DocumentStatistics {
    /// Aggregates page-level metrics into document-level statistics.
    ///
    /// `excluded_pages` counts input pages for which no result exists (the
    /// process-isolated strategy drops timed-out/failed pages rather than
    /// fabricating them); they count toward `total_pages` and `failed_pages`.
    pub fn from_pages(
        pages: &[PageResult],
        elapsed: Duration,
        min_confidence: f64,
        excluded_pages: u32,
    ) -> Self {
        let total_pages = pages.len() as u32 + excluded_pages;
        let successful = pages
            .iter()
            .filter(|p| p.mean_confidence > min_confidence)
            .count() as u32;
        let average_confidence = if pages.is_empty() {
            0.0
        } else {
            pages.iter().map(|p| p.mean_confidence).sum::<f64>() / pages.len() as f64
        };

        let mut quality_distribution = BTreeMap::new();
        for page in pages {
            *quality_distribution.entry(page.quality).or_insert(0) += 1;
        }

        let elapsed_secs = elapsed.as_secs_f64();
        let pages_per_second = if elapsed_secs > 0.0 {
            total_pages as f64 / elapsed_secs
        } else {
            0.0
        };

        DocumentStatistics {
            total_pages,
            successful_pages: successful,
            failed_pages: total_pages - successful,
            total_words: pages.iter().map(|p| p.total_words()).sum(),
            total_characters: pages.iter().map(|p| p.total_chars()).sum(),
            average_confidence,
            total_processing_time: elapsed,
            pages_per_second,
            quality_distribution,
            low_confidence_pages: pages
                .iter()
                .filter(|p| p.mean_confidence < LOW_CONFIDENCE_THRESHOLD)
                .map(|p| p.page_number)
                .collect(),
        }
    }

    /// Percentage of successfully processed pages (0.0 to 100.0).
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            self.successful_pages as f64 / self.total_pages as f64 * 100.0
        }
    }
}

impl fmt::Display for DocumentStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Document statistics:")?;
        writeln!(f, "  Total pages: {}", self.total_pages)?;
        writeln!(
            f,
            "  Successful: {} ({:.1}%)",
            self.successful_pages,
            self.success_rate()
        )?;
        writeln!(f, "  Failed: {}", self.failed_pages)?;
        writeln!(f, "  Average confidence: {:.1}%", self.average_confidence)?;
        writeln!(
            f,
            "  Throughput: {:.2} pages/sec",
            self.pages_per_second
        )?;
        Ok(())
    }
}

/// Final output of processing one document: the sole observable boundary for
/// downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Name of the source document.
    pub source: String,
    /// Sorted strictly ascending by `page_number`; no duplicates.
    pub pages: Vec<PageResult>,
    /// Structured full text with page banners.
    pub full_text: String,
    pub statistics: DocumentStatistics,
    /// The configuration this document was processed with.
    pub config: DocumentConfig,
}

impl DocumentResult {
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn average_confidence(&self) -> f64 {
        self.statistics.average_confidence
    }

    /// Pages with confidence at or above 90%.
    pub fn high_confidence_pages(&self) -> impl Iterator<Item = &PageResult> {
        self.pages.iter().filter(|p| p.mean_confidence >= 90.0)
    }
}
