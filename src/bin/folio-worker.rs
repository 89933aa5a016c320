//! Worker process for the process-isolated execution strategy.
//!
//! Speaks the JSON-line protocol on stdin/stdout: one init envelope, then
//! one page task per line, one reply per task. Exits cleanly when the
//! coordinator closes the pipe.

use folio_ocr::pipeline::isolated::{default_worker_executor, run_worker};
use std::io::{self, BufReader};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = BufReader::new(io::stdin().lock());
    let stdout = io::stdout().lock();
    match run_worker(stdin, stdout, default_worker_executor) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("folio-worker: {error}");
            ExitCode::FAILURE
        }
    }
}
