//! Configuration surface consumed by the document executor.
//!
//! `DocumentConfig` consolidates the knobs that callers control (languages,
//! DPI, confidence threshold, execution strategy, engine profile) into one
//! serializable value, providing a unified way to tune pipeline behavior.
//! The pipeline does not parse or validate the source format these values
//! come from; it only consumes the deserialized struct.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Recognition-engine model profile.
///
/// Profiles trade accuracy for speed. The profile contributes the per-call
/// engine timeout and selects which auxiliary lexicon files are handed to the
/// engine; the per-region engine mode itself is decided by the configuration
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProfile {
    /// Fastest inference, shortest timeout.
    Fast,
    /// Balanced configuration.
    #[default]
    Standard,
    /// Highest accuracy, longest timeout.
    Best,
}

impl ModelProfile {
    /// Base timeout applied to a single engine call under this profile.
    pub fn engine_timeout(&self) -> Duration {
        match self {
            ModelProfile::Fast => Duration::from_secs(15),
            ModelProfile::Standard => Duration::from_secs(30),
            ModelProfile::Best => Duration::from_secs(45),
        }
    }

    /// String tag used in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProfile::Fast => "fast",
            ModelProfile::Standard => "standard",
            ModelProfile::Best => "best",
        }
    }
}

/// Which layout-detection variant the page executor runs.
///
/// Projection is the production default; the feature-based variant is the
/// escalation path for documents the projection variant misclassifies
/// (3+ columns, tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVariant {
    /// Fast projection-based column detection.
    #[default]
    Projection,
    /// Feature-based detection for complex layouts.
    Feature,
}

/// Execution strategy for driving pages through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Single-threaded, strictly page-by-page in input order.
    Sequential,
    /// Pages split into fixed-size batches executed on a bounded thread pool.
    ThreadBatched {
        /// Worker threads per batch.
        #[serde(default = "ExecutionStrategy::default_workers")]
        workers: usize,
        /// Pages per batch (controls peak memory).
        #[serde(default = "ExecutionStrategy::default_batch_size")]
        batch_size: usize,
    },
    /// One worker process per concurrent page, with a per-page timeout.
    ProcessIsolated {
        /// Number of worker processes.
        #[serde(default = "ExecutionStrategy::default_workers")]
        workers: usize,
        /// Per-page timeout in seconds.
        #[serde(default = "ExecutionStrategy::default_page_timeout_secs")]
        timeout_secs: u64,
    },
}

impl ExecutionStrategy {
    fn default_workers() -> usize {
        4
    }

    fn default_batch_size() -> usize {
        10
    }

    fn default_page_timeout_secs() -> u64 {
        120
    }

    /// Thread-batched strategy with default worker and batch sizes.
    pub fn thread_batched() -> Self {
        ExecutionStrategy::ThreadBatched {
            workers: Self::default_workers(),
            batch_size: Self::default_batch_size(),
        }
    }

    /// Process-isolated strategy with default worker count and timeout.
    pub fn process_isolated() -> Self {
        ExecutionStrategy::ProcessIsolated {
            workers: Self::default_workers(),
            timeout_secs: Self::default_page_timeout_secs(),
        }
    }
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        ExecutionStrategy::Sequential
    }
}

/// Complete configuration for processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Language codes passed to the recognition engine (e.g. "por+eng").
    #[serde(default = "DocumentConfig::default_languages")]
    pub languages: String,

    /// Rendering DPI the reader used for the page images. Recorded for
    /// traceability; the pipeline itself operates on whatever buffers the
    /// reader produced.
    #[serde(default = "DocumentConfig::default_dpi")]
    pub dpi: u32,

    /// Minimum acceptable word confidence (0.0-100.0). Words below this are
    /// dropped during post-processing; pages at or below it count as failed
    /// in document statistics.
    #[serde(default = "DocumentConfig::default_min_confidence")]
    pub min_confidence: f64,

    /// Engine model profile.
    #[serde(default)]
    pub profile: ModelProfile,

    /// Layout-detection variant.
    #[serde(default)]
    pub layout: LayoutVariant,

    /// Execution strategy.
    #[serde(default)]
    pub strategy: ExecutionStrategy,

    /// Thread cap forwarded to worker processes for the engine's internal
    /// thread pool. Passed as explicit worker-init configuration; never set
    /// on the coordinator's own environment.
    #[serde(default)]
    pub engine_threads: Option<usize>,

    /// Override for the worker executable used by the process-isolated
    /// strategy. Defaults to the `folio-worker` binary next to the current
    /// executable.
    #[serde(default)]
    pub worker_command: Option<PathBuf>,
}

impl DocumentConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the engine language codes.
    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }

    /// Sets the minimum word confidence threshold.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Sets the engine model profile.
    pub fn with_profile(mut self, profile: ModelProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the layout-detection variant.
    pub fn with_layout(mut self, layout: LayoutVariant) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn default_languages() -> String {
        "por+eng".to_string()
    }

    fn default_dpi() -> u32 {
        300
    }

    fn default_min_confidence() -> f64 {
        30.0
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            languages: Self::default_languages(),
            dpi: Self::default_dpi(),
            min_confidence: Self::default_min_confidence(),
            profile: ModelProfile::default(),
            layout: LayoutVariant::default(),
            strategy: ExecutionStrategy::default(),
            engine_threads: None,
            worker_command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_defaults_fill_in() {
        let strategy: ExecutionStrategy =
            serde_json::from_str(r#"{"mode": "thread_batched"}"#).unwrap();
        assert_eq!(
            strategy,
            ExecutionStrategy::ThreadBatched {
                workers: 4,
                batch_size: 10
            }
        );
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = DocumentConfig::new()
            .with_languages("eng")
            .with_strategy(ExecutionStrategy::process_isolated());
        let json = serde_json::to_string(&config).unwrap();
        let back: DocumentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.languages, "eng");
        assert_eq!(back.strategy, ExecutionStrategy::process_isolated());
    }

    #[test]
    fn profile_timeouts_are_banded() {
        assert!(ModelProfile::Fast.engine_timeout() < ModelProfile::Standard.engine_timeout());
        assert!(ModelProfile::Standard.engine_timeout() < ModelProfile::Best.engine_timeout());
    }
}
