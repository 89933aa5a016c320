//! Page- and document-level orchestration, execution strategies, and the
//! process-isolation protocol.

pub mod document;
pub mod isolated;
pub mod page;
pub mod reader;
pub mod strategy;
pub mod text;

pub use document::DocumentExecutor;
pub use isolated::{
    run_worker, IsolatedRunReport, PageTask, ProcessIsolatedCoordinator, WorkerInit,
    WorkerOutcome, WorkerReply,
};
pub use page::PageExecutor;
pub use reader::ImageFileReader;
