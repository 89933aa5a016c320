//! Process-isolated execution.
//!
//! For large documents where recognition must run in true parallel across
//! independent engine invocations. The coordinator reads all pages up front
//! in its own address space, then feeds one page per task to a pool of
//! worker processes over a JSON-line protocol. Workers receive an explicit
//! init envelope (no ambient environment mutation), own a private
//! [`PageExecutor`] with a cold cache, and reply one line per task.
//!
//! A per-page timeout bounds every task; a timed-out or failed page is
//! recorded and excluded from the successful set, never fabricated.

use crate::core::config::{LayoutVariant, ModelProfile};
use crate::core::errors::{OcrError, OcrResult};
use crate::engine::{EngineInvoker, TesseractBackend};
use crate::layout;
use crate::models::image::PageImage;
use crate::models::page::PageResult;
use crate::pipeline::page::PageExecutor;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// First envelope on a worker's stdin: everything the worker needs to build
/// its executor, passed explicitly instead of through process environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInit {
    pub languages: String,
    pub profile: ModelProfile,
    pub layout: LayoutVariant,
    pub min_confidence: f64,
    /// Cap for the engine's internal thread pool inside the worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_threads: Option<usize>,
}

/// One page of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageTask {
    pub page_number: u32,
    pub image: PageImage,
}

/// Worker-side outcome of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerOutcome {
    Success { result: PageResult },
    Failure { reason: String },
}

/// One reply line from a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReply {
    pub page_number: u32,
    #[serde(flatten)]
    pub outcome: WorkerOutcome,
}

/// Outcome of a process-isolated run.
#[derive(Debug)]
pub struct IsolatedRunReport {
    /// Successful pages, sorted by the caller.
    pub pages: Vec<PageResult>,
    /// Pages excluded by failure or timeout.
    pub failed_pages: u32,
    /// Human-readable failure log, one entry per excluded page.
    pub failures: Vec<String>,
}

/// Coordinator driving a pool of worker processes.
pub struct ProcessIsolatedCoordinator {
    init: WorkerInit,
    workers: usize,
    timeout: Duration,
    command: PathBuf,
}

enum WorkerEvent {
    Page(Box<PageResult>),
    Failed { page_number: u32, reason: String },
}

impl ProcessIsolatedCoordinator {
    pub fn new(
        init: WorkerInit,
        workers: usize,
        timeout: Duration,
        command: Option<PathBuf>,
    ) -> Self {
        ProcessIsolatedCoordinator {
            init,
            workers: workers.max(1),
            timeout,
            command: command.unwrap_or_else(default_worker_command),
        }
    }

    /// Dispatches all pages to the worker pool and collects the results.
    ///
    /// Returns an error only when the coordinator itself cannot operate
    /// (init serialization failure); per-page problems land in the report.
    pub fn run(&self, pages: Vec<PageImage>) -> OcrResult<IsolatedRunReport> {
        let total = pages.len();
        let init_line = serde_json::to_string(&self.init)?;

        let (task_tx, task_rx) = crossbeam_channel::unbounded::<PageTask>();
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent>();

        for (index, image) in pages.into_iter().enumerate() {
            task_tx
                .send(PageTask {
                    page_number: index as u32 + 1,
                    image,
                })
                .expect("task channel cannot disconnect while the sender lives");
        }
        drop(task_tx);

        info!(total, workers = self.workers, "dispatching pages to worker pool");
        std::thread::scope(|scope| {
            for worker_index in 0..self.workers {
                let task_rx = task_rx.clone();
                let event_tx = event_tx.clone();
                let init_line = init_line.as_str();
                let command = self.command.as_path();
                let timeout = self.timeout;
                scope.spawn(move || {
                    worker_loop(worker_index, command, init_line, task_rx, event_tx, timeout)
                });
            }
            drop(event_tx);
            drop(task_rx);

            let mut report = IsolatedRunReport {
                pages: Vec::with_capacity(total),
                failed_pages: 0,
                failures: Vec::new(),
            };
            for event in event_rx.iter() {
                match event {
                    WorkerEvent::Page(page) => report.pages.push(*page),
                    WorkerEvent::Failed { page_number, reason } => {
                        warn!(page_number, %reason, "page excluded");
                        report.failed_pages += 1;
                        report.failures.push(format!("page {page_number}: {reason}"));
                    }
                }
            }

            // Tasks abandoned by dying workers never produce an event.
            let seen = report.pages.len() + report.failed_pages as usize;
            if seen < total {
                let missing = (total - seen) as u32;
                report.failed_pages += missing;
                report
                    .failures
                    .push(format!("{missing} page(s) never reached a worker"));
            }
            Ok(report)
        })
    }
}

/// One coordinator thread owning one worker process at a time.
fn worker_loop(
    worker_index: usize,
    command: &Path,
    init_line: &str,
    tasks: Receiver<PageTask>,
    events: Sender<WorkerEvent>,
    timeout: Duration,
) {
    let mut session: Option<WorkerSession> = None;

    while let Ok(task) = tasks.recv() {
        let page_number = task.page_number;
        let exchange = exchange_task(&mut session, command, init_line, &task, timeout);
        let event = match exchange {
            Ok(WorkerOutcome::Success { result }) => {
                debug!(worker_index, page_number, "worker completed page");
                WorkerEvent::Page(Box::new(result))
            }
            Ok(WorkerOutcome::Failure { reason }) => {
                // The worker stays healthy; only the page failed.
                WorkerEvent::Failed { page_number, reason }
            }
            Err(reason) => {
                // Protocol-level breakage: replace the process before the
                // next task.
                if let Some(broken) = session.take() {
                    broken.shutdown();
                }
                WorkerEvent::Failed { page_number, reason }
            }
        };
        if events.send(event).is_err() {
            break;
        }
    }

    if let Some(session) = session.take() {
        session.shutdown();
    }
}

/// Sends one task to the (lazily spawned) worker and awaits its reply.
fn exchange_task(
    session: &mut Option<WorkerSession>,
    command: &Path,
    init_line: &str,
    task: &PageTask,
    timeout: Duration,
) -> Result<WorkerOutcome, String> {
    if session.is_none() {
        *session = Some(
            WorkerSession::spawn(command, init_line)
                .map_err(|e| format!("worker spawn failed: {e}"))?,
        );
    }
    let live = session.as_mut().expect("session was just ensured");

    live.submit(task)
        .map_err(|e| format!("task submission failed: {e}"))?;

    match live.lines.recv_timeout(timeout) {
        Ok(line) => {
            let reply: WorkerReply = serde_json::from_str(&line)
                .map_err(|e| format!("malformed worker reply: {e}"))?;
            if reply.page_number != task.page_number {
                return Err(format!(
                    "reply for page {} while awaiting page {}",
                    reply.page_number, task.page_number
                ));
            }
            Ok(reply.outcome)
        }
        Err(RecvTimeoutError::Timeout) => {
            Err(format!("timed out after {}s", timeout.as_secs()))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err("worker process terminated unexpectedly".to_string())
        }
    }
}

/// A live worker process plus the reader thread draining its stdout.
struct WorkerSession {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
}

impl WorkerSession {
    fn spawn(command: &Path, init_line: &str) -> std::io::Result<Self> {
        let mut child = Command::new(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let mut stdin = child.stdin.take().expect("stdin was requested piped");
        let stdout = child.stdout.take().expect("stdout was requested piped");

        let (line_tx, line_rx) = crossbeam_channel::unbounded::<String>();
        std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        stdin.write_all(init_line.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;

        Ok(WorkerSession {
            child,
            stdin,
            lines: line_rx,
        })
    }

    fn submit(&mut self, task: &PageTask) -> std::io::Result<()> {
        let line = serde_json::to_string(task)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()
    }

    fn shutdown(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// The `folio-worker` binary next to the current executable, falling back
/// to PATH lookup.
pub fn default_worker_command() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("folio-worker");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("folio-worker")
}

/// Builds the executor a worker process runs, per its init envelope.
pub fn default_worker_executor(init: &WorkerInit) -> OcrResult<PageExecutor> {
    let backend = TesseractBackend::new().with_engine_threads(init.engine_threads);
    let invoker = EngineInvoker::new(Box::new(backend), init.profile, init.languages.clone())?;
    Ok(PageExecutor::new(
        layout::analyzer_for(init.layout),
        Arc::new(invoker),
        init.min_confidence,
    ))
}

/// Worker process main loop: init envelope, then one task per line, one
/// reply per task. Returns on stdin EOF (coordinator closed the pipe).
pub fn run_worker<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    build_executor: impl FnOnce(&WorkerInit) -> OcrResult<PageExecutor>,
) -> OcrResult<()> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(());
    }
    let init: WorkerInit = serde_json::from_str(line.trim())?;
    let executor = build_executor(&init)?;

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<PageTask>(trimmed) {
            Ok(task) => WorkerReply {
                page_number: task.page_number,
                outcome: WorkerOutcome::Success {
                    result: executor.process(&task.image, task.page_number),
                },
            },
            Err(e) => WorkerReply {
                page_number: 0,
                outcome: WorkerOutcome::Failure {
                    reason: format!("malformed task envelope: {e}"),
                },
            },
        };
        serde_json::to_writer(&mut output, &reply)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }
}
