//! Error types for the recognition pipeline.
//!
//! This module defines the error types that can occur while processing a
//! document, including image validation errors, processing errors, engine
//! invocation errors, and configuration errors. It also provides helper
//! constructors for creating these errors with appropriate context.

use thiserror::Error;

/// Enum representing different stages of processing in the recognition pipeline.
///
/// This enum is used to identify which stage of the pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred during quality assessment.
    QualityAssessment,
    /// Error occurred during binarization or other pixel-level preprocessing.
    Preprocessing,
    /// Error occurred during layout analysis.
    LayoutAnalysis,
    /// Error occurred while extracting a region from a page.
    RegionExtraction,
    /// Error occurred during recognition post-processing.
    PostProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::QualityAssessment => write!(f, "quality assessment"),
            ProcessingStage::Preprocessing => write!(f, "preprocessing"),
            ProcessingStage::LayoutAnalysis => write!(f, "layout analysis"),
            ProcessingStage::RegionExtraction => write!(f, "region extraction"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing the errors that can occur in the recognition pipeline.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Error occurred while decoding an image file.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error indicating a malformed page image buffer.
    #[error("invalid image: {message}")]
    InvalidImage {
        /// A message describing why the buffer was rejected.
        message: String,
    },

    /// Error occurred during a pipeline processing stage.
    #[error("{stage} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        stage: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error raised by the external recognition engine.
    #[error("engine: {message}")]
    Engine {
        /// A message describing the engine failure.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error occurred while reading a source document.
    #[error("document read: {message}")]
    DocumentRead {
        /// A message describing the read failure.
        message: String,
    },

    /// Error in the worker-process protocol of the process-isolated strategy.
    #[error("worker: {message}")]
    Worker {
        /// A message describing the protocol failure.
        message: String,
    },

    /// I/O error (temp files, subprocess pipes).
    #[error("io")]
    Io(#[from] std::io::Error),

    /// Serialization error (worker envelopes, document records).
    #[error("serialization")]
    Serialization(#[from] serde_json::Error),
}

impl OcrError {
    /// Creates an error for a malformed page image buffer.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        OcrError::InvalidImage {
            message: message.into(),
        }
    }

    /// Creates a processing error with stage and context.
    pub fn processing(
        stage: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        OcrError::Processing {
            stage,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an engine invocation error.
    pub fn engine(message: impl Into<String>) -> Self {
        OcrError::Engine {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        OcrError::Config {
            message: message.into(),
        }
    }

    /// Creates a document-level read error.
    pub fn document_read(message: impl Into<String>) -> Self {
        OcrError::DocumentRead {
            message: message.into(),
        }
    }

    /// Creates a worker-protocol error.
    pub fn worker(message: impl Into<String>) -> Self {
        OcrError::Worker {
            message: message.into(),
        }
    }
}

/// Convenient result alias for pipeline operations.
pub type OcrResult<T> = Result<T, OcrError>;
