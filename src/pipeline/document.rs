//! Document-level orchestration.
//!
//! Dispatches a document's pages to the configured execution strategy,
//! reorders results, computes aggregate statistics, and assembles the final
//! [`DocumentResult`]. Per-page problems are contained by the strategies;
//! the only hard failure paths here are reader errors and unusable
//! configuration.

use crate::core::config::{DocumentConfig, ExecutionStrategy};
use crate::core::errors::OcrResult;
use crate::core::traits::{PageReader, RecognitionBackend};
use crate::engine::EngineInvoker;
use crate::layout;
use crate::models::document::{DocumentResult, DocumentStatistics};
use crate::models::image::PageImage;
use crate::models::page::PageResult;
use crate::pipeline::isolated::{ProcessIsolatedCoordinator, WorkerInit};
use crate::pipeline::page::PageExecutor;
use crate::pipeline::{strategy, text};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Orchestrates complete recognition of multi-page documents.
pub struct DocumentExecutor {
    config: DocumentConfig,
    executor: PageExecutor,
}

impl DocumentExecutor {
    /// Builds an executor from a configuration and a recognition backend.
    pub fn new(config: DocumentConfig, backend: Box<dyn RecognitionBackend>) -> OcrResult<Self> {
        let invoker = EngineInvoker::new(backend, config.profile, config.languages.clone())?;
        let executor = PageExecutor::new(
            layout::analyzer_for(config.layout),
            Arc::new(invoker),
            config.min_confidence,
        );
        Ok(DocumentExecutor { config, executor })
    }

    /// Builds an executor around an already-constructed page executor.
    pub fn from_parts(config: DocumentConfig, executor: PageExecutor) -> Self {
        DocumentExecutor { config, executor }
    }

    /// The active configuration.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The page executor (engine statistics, cache state).
    pub fn page_executor(&self) -> &PageExecutor {
        &self.executor
    }

    /// Reads a document through the given reader and processes it.
    ///
    /// Reader failures propagate as document-level errors; they are the one
    /// hard failure the pipeline does not absorb.
    pub fn process_path(
        &self,
        reader: &dyn PageReader,
        path: &std::path::Path,
    ) -> OcrResult<DocumentResult> {
        let pages = reader.read(path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.process(&source, pages)
    }

    /// Processes in-memory pages under the configured strategy.
    ///
    /// The returned result's pages are sorted strictly ascending by page
    /// number. Sequential and thread-batched runs yield one result per
    /// input page; the process-isolated strategy excludes failed pages and
    /// counts them in the statistics instead.
    pub fn process(&self, source: &str, pages: Vec<PageImage>) -> OcrResult<DocumentResult> {
        let total_input = pages.len();
        info!(source, pages = total_input, strategy = ?self.config.strategy, "processing document");
        let started = Instant::now();

        let (mut page_results, excluded) = match &self.config.strategy {
            ExecutionStrategy::Sequential => {
                (strategy::run_sequential(&pages, &self.executor), 0)
            }
            ExecutionStrategy::ThreadBatched {
                workers,
                batch_size,
            } => (
                strategy::run_thread_batched(&pages, &self.executor, *workers, *batch_size)?,
                0,
            ),
            ExecutionStrategy::ProcessIsolated {
                workers,
                timeout_secs,
            } => {
                let coordinator = ProcessIsolatedCoordinator::new(
                    self.worker_init(),
                    *workers,
                    Duration::from_secs(*timeout_secs),
                    self.config.worker_command.clone(),
                );
                let report = coordinator.run(pages)?;
                (report.pages, report.failed_pages)
            }
        };
        page_results.sort_by_key(|p| p.page_number);
        debug_assert_sorted(&page_results);

        let elapsed = started.elapsed();
        let statistics = DocumentStatistics::from_pages(
            &page_results,
            elapsed,
            self.config.min_confidence,
            excluded,
        );
        info!(
            source,
            successful = statistics.successful_pages,
            failed = statistics.failed_pages,
            avg_confidence = statistics.average_confidence,
            "document complete"
        );

        Ok(DocumentResult {
            source: source.to_string(),
            full_text: text::build_document_text(&page_results),
            pages: page_results,
            statistics,
            config: self.config.clone(),
        })
    }

    fn worker_init(&self) -> WorkerInit {
        WorkerInit {
            languages: self.config.languages.clone(),
            profile: self.config.profile,
            layout: self.config.layout,
            min_confidence: self.config.min_confidence,
            engine_threads: self.config.engine_threads,
        }
    }
}

fn debug_assert_sorted(pages: &[PageResult]) {
    debug_assert!(
        pages.windows(2).all(|w| w[0].page_number < w[1].page_number),
        "page results must be strictly ordered with no duplicates"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelProfile;
    use crate::core::errors::OcrResult as CrateResult;
    use crate::core::traits::{EngineOutput, EngineParams, RawWord};
    use image::GrayImage;

    struct StubBackend;

    impl RecognitionBackend for StubBackend {
        fn recognize(
            &self,
            _image: &PageImage,
            _params: &EngineParams,
        ) -> CrateResult<EngineOutput> {
            Ok(EngineOutput {
                words: vec![RawWord {
                    text: "ok".to_string(),
                    confidence: 90.0,
                    bbox: None,
                }],
            })
        }
    }

    fn pages(n: u32) -> Vec<PageImage> {
        (0..n)
            .map(|i| PageImage::Gray(GrayImage::from_pixel(30 + i, 20, image::Luma([230]))))
            .collect()
    }

    #[test]
    fn sequential_document_has_one_result_per_page() {
        let executor =
            DocumentExecutor::new(DocumentConfig::default(), Box::new(StubBackend)).unwrap();
        let result = executor.process("doc.pdf", pages(3)).unwrap();
        assert_eq!(result.pages.len(), 3);
        assert_eq!(
            result.pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(result.statistics.total_pages, 3);
        assert_eq!(result.statistics.successful_pages, 3);
        assert!(result.full_text.contains("=== PAGE 2 |"));
        assert_eq!(result.source, "doc.pdf");
    }

    #[test]
    fn thread_batched_document_is_ordered() {
        let config = DocumentConfig::default()
            .with_strategy(ExecutionStrategy::ThreadBatched {
                workers: 2,
                batch_size: 2,
            });
        let executor = DocumentExecutor::new(config, Box::new(StubBackend)).unwrap();
        let result = executor.process("doc.pdf", pages(5)).unwrap();
        assert_eq!(result.pages.len(), 5);
        assert_eq!(
            result.pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn reader_failure_propagates() {
        let executor =
            DocumentExecutor::new(DocumentConfig::default(), Box::new(StubBackend)).unwrap();
        let reader = crate::pipeline::reader::ImageFileReader::new();
        let err = executor
            .process_path(&reader, std::path::Path::new("/missing/doc.png"))
            .unwrap_err();
        assert!(matches!(err, crate::core::OcrError::DocumentRead { .. }));
    }

    #[test]
    fn engine_statistics_are_reachable_after_processing() {
        let executor =
            DocumentExecutor::new(DocumentConfig::default(), Box::new(StubBackend)).unwrap();
        executor.process("doc.pdf", pages(2)).unwrap();
        let stats = executor.page_executor().invoker().stats();
        assert_eq!(stats.cache_misses, 2);
    }
}
