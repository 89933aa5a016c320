//! # folio-ocr
//!
//! An adaptive OCR pipeline that converts multi-page scanned or digital
//! documents into structured, confidence-annotated text. Recognition
//! parameters are selected per page from fast quality assessment and column
//! layout detection, and pages run through the engine concurrently with
//! per-page and per-region failure isolation.
//!
//! ## Pipeline
//!
//! 1. **Quality assessment** - Laplacian-variance sharpness and Michelson
//!    contrast per page.
//! 2. **Layout detection** - projection-based column splitting by default,
//!    with a feature-based escalation variant for complex layouts.
//! 3. **Configuration policy** - a deterministic mapping from layout and
//!    quality to preprocessing, segmentation mode, scaling, and engine mode.
//! 4. **Engine invocation** - result caching and a cascading fallback
//!    ladder around the external recognition engine.
//! 5. **Execution strategies** - sequential, thread-batched, and
//!    process-isolated, all yielding page results in page-number order.
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, and trait seams
//! * [`models`] - Data model (images, layout, results, statistics)
//! * [`processors`] - Pixel-level operations
//! * [`layout`] - Layout detectors
//! * [`policy`] - Engine configuration policy
//! * [`engine`] - Engine invocation, caching, and fallback
//! * [`pipeline`] - Page/document orchestration and strategies
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use folio_ocr::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DocumentConfig::new()
//!     .with_languages("por+eng")
//!     .with_strategy(ExecutionStrategy::thread_batched());
//!
//! let executor = DocumentExecutor::new(config, Box::new(TesseractBackend::new()))?;
//! let result = executor.process_path(&ImageFileReader::new(), Path::new("scan.png"))?;
//!
//! for page in &result.pages {
//!     println!("page {}: {:.1}%", page.page_number, page.mean_confidence);
//! }
//! println!("{}", result.statistics);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod engine;
pub mod layout;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod processors;

/// Prelude module for convenient imports.
///
/// Brings the essentials into scope with a single use statement:
///
/// ```rust
/// use folio_ocr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        DocumentConfig, ExecutionStrategy, LayoutVariant, ModelProfile, OcrError, OcrResult,
    };
    pub use crate::engine::{EngineInvoker, TesseractBackend};
    pub use crate::models::{
        DocumentResult, LayoutType, PageImage, PageQuality, PageResult, QualityMetrics,
    };
    pub use crate::pipeline::{DocumentExecutor, ImageFileReader, PageExecutor};
}
