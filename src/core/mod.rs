//! Core error handling, configuration, and trait seams.

pub mod config;
pub mod errors;
pub mod traits;

pub use config::{DocumentConfig, ExecutionStrategy, LayoutVariant, ModelProfile};
pub use errors::{OcrError, OcrResult, ProcessingStage};
pub use traits::{EngineOutput, EngineParams, LayoutAnalyzer, PageReader, RawWord, RecognitionBackend};
