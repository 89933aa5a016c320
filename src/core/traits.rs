//! Trait seams for the pipeline's external and swappable collaborators.
//!
//! Three seams exist: layout analysis (two in-crate variants), the
//! recognition backend (the external engine), and the document reader.
//! Each trait carries exactly the operations the pipeline consumes.

use crate::core::errors::OcrResult;
use crate::models::image::PageImage;
use crate::models::layout::LayoutResult;
use crate::models::recognition::BBox;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Segments a page into ordered regions.
///
/// Implementations must be safe to call concurrently from multiple threads;
/// any internal memoization is synchronized by the implementation.
pub trait LayoutAnalyzer: Send + Sync {
    /// Detects the column layout of a page.
    ///
    /// The returned result always carries at least one region.
    fn detect(&self, image: &PageImage) -> OcrResult<LayoutResult>;
}

/// Engine-facing parameters for one recognition call.
///
/// Built by the invoker's parameter builder from the selected
/// [`EngineConfig`](crate::policy::EngineConfig) and the model profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineParams {
    /// Page segmentation mode.
    pub psm: u8,
    /// Engine mode (numeric).
    pub oem: u8,
    /// Language codes (e.g. "por+eng").
    pub languages: String,
    /// Per-call timeout, from the model profile.
    pub timeout: Option<Duration>,
    /// Additional engine flags (lexicon files, stability tuning).
    pub extra: String,
}

/// A raw word candidate as reported by the engine, before filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWord {
    pub text: String,
    /// Engine confidence in `[-1, 100]`; -1 marks entries without a usable
    /// estimate.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

/// Unprocessed output of one engine call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    pub words: Vec<RawWord>,
}

/// The external recognition engine, treated as a black box mapping an image
/// plus parameters to word-level candidates.
///
/// The invoker owns all pre- and post-processing and maps backend errors
/// into its fallback ladder; implementations only report what the engine
/// said or that it failed.
pub trait RecognitionBackend: Send + Sync {
    fn recognize(&self, image: &PageImage, params: &EngineParams) -> OcrResult<EngineOutput>;
}

/// Decodes a source document into page images.
///
/// Failures (missing file, corrupt or unsupported document) are document-
/// level errors and are not retried.
pub trait PageReader {
    fn read(&self, path: &Path) -> OcrResult<Vec<PageImage>>;
}
