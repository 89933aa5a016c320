//! Engine invocation layer: parameter building, caching, fallback recovery,
//! and post-processing around the external recognition engine.

pub mod cache;
pub mod fallback;
pub mod invoker;
pub mod lexicon;
pub mod params;
pub mod postprocess;
pub mod stats;
pub mod tesseract;

pub use cache::{RecognitionCache, DEFAULT_CACHE_CAPACITY};
pub use invoker::EngineInvoker;
pub use params::ParamBuilder;
pub use stats::{EngineStats, EngineStatsSnapshot};
pub use tesseract::TesseractBackend;
