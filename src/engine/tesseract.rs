//! Tesseract CLI recognition backend.
//!
//! Invokes the `tesseract` executable in TSV mode over a temp-file image
//! handoff and parses word-level candidates out of the tabular output. One
//! subprocess per call; the backend holds no mutable state, so a single
//! instance is freely shared across threads.

use crate::core::errors::{OcrError, OcrResult};
use crate::core::traits::{EngineOutput, EngineParams, RawWord, RecognitionBackend};
use crate::models::image::PageImage;
use crate::models::recognition::BBox;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// TSV row tag for word-level entries.
const WORD_LEVEL: &str = "5";
/// Poll interval while waiting on the subprocess.
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Recognition backend shelling out to the Tesseract CLI.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    binary: PathBuf,
    /// Cap for the engine's internal thread pool, passed per-invocation as
    /// an explicit child-process variable.
    engine_threads: Option<usize>,
}

impl TesseractBackend {
    pub fn new() -> Self {
        TesseractBackend {
            binary: PathBuf::from("tesseract"),
            engine_threads: None,
        }
    }

    /// Overrides the executable path.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Caps the engine's internal thread pool.
    pub fn with_engine_threads(mut self, threads: Option<usize>) -> Self {
        self.engine_threads = threads;
        self
    }

    fn command(&self, image_path: &std::path::Path, params: &EngineParams) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", &params.languages])
            .args(["--psm", &params.psm.to_string()])
            .args(["--oem", &params.oem.to_string()]);
        if !params.extra.is_empty() {
            cmd.args(params.extra.split_whitespace());
        }
        cmd.arg("tsv");
        if let Some(threads) = self.engine_threads {
            cmd.env("OMP_THREAD_LIMIT", threads.to_string());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecognitionBackend for TesseractBackend {
    fn recognize(&self, image: &PageImage, params: &EngineParams) -> OcrResult<EngineOutput> {
        let handoff = tempfile::Builder::new().suffix(".png").tempfile()?;
        image.save(handoff.path())?;

        let mut cmd = self.command(handoff.path(), params);
        debug!(psm = params.psm, oem = params.oem, "invoking tesseract");
        let child = cmd.spawn().map_err(|e| {
            OcrError::engine(format!("failed to spawn {}: {e}", self.binary.display()))
        })?;
        let (status, stdout, stderr) = wait_with_timeout(child, params.timeout)?;

        if !status.success() {
            return Err(OcrError::engine(format!(
                "tesseract exited with {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&stdout)))
    }
}

/// Waits for the child while draining its pipes, killing it when the
/// deadline passes.
fn wait_with_timeout(
    mut child: Child,
    timeout: Option<Duration>,
) -> OcrResult<(std::process::ExitStatus, Vec<u8>, Vec<u8>)> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_reader = std::thread::spawn(move || drain(stdout));
    let err_reader = std::thread::spawn(move || drain(stderr));

    let deadline = timeout.map(|t| Instant::now() + t);
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = out_reader.join();
                        let _ = err_reader.join();
                        return Err(OcrError::engine("tesseract timed out"));
                    }
                }
                std::thread::sleep(WAIT_POLL);
            }
        }
    };

    let stdout = out_reader.join().unwrap_or_default();
    let stderr = err_reader.join().unwrap_or_default();
    Ok((status, stdout, stderr))
}

fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

/// Parses Tesseract TSV output into word candidates.
///
/// Rows: level page block par line word left top width height conf text.
/// Only word-level rows (level 5) with non-blank text are kept.
fn parse_tsv(tsv: &str) -> EngineOutput {
    let mut words = Vec::new();
    for line in tsv.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 || fields[0] != WORD_LEVEL {
            continue;
        }
        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }
        let confidence = fields[10].parse::<f64>().unwrap_or(-1.0);
        let bbox = parse_bbox(&fields[6..10]);
        words.push(RawWord {
            text: text.to_string(),
            confidence,
            bbox,
        });
    }
    EngineOutput { words }
}

fn parse_bbox(fields: &[&str]) -> Option<BBox> {
    let parse = |s: &str| s.parse::<i64>().ok().map(|v| v.max(0) as u32);
    Some(BBox {
        x: parse(fields[0])?,
        y: parse(fields[1])?,
        w: parse(fields[2])?,
        h: parse(fields[3])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t\n\
5\t1\t1\t1\t1\t1\t60\t40\t120\t24\t91.5\tHello\n\
5\t1\t1\t1\t1\t2\t190\t40\t140\t24\t88.0\tworld\n\
5\t1\t1\t1\t2\t1\t60\t80\t90\t24\t-1\t\n";

    #[test]
    fn tsv_parsing_keeps_word_rows_only() {
        let output = parse_tsv(SAMPLE_TSV);
        assert_eq!(output.words.len(), 2);
        assert_eq!(output.words[0].text, "Hello");
        assert_eq!(output.words[0].confidence, 91.5);
        assert_eq!(
            output.words[0].bbox,
            Some(BBox { x: 60, y: 40, w: 120, h: 24 })
        );
        assert_eq!(output.words[1].text, "world");
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let output = parse_tsv("header\n5\t1\t1\n\ngarbage line\n");
        assert!(output.words.is_empty());
    }

    #[test]
    fn negative_coordinates_clamp_to_zero() {
        let tsv = "h\n5\t1\t1\t1\t1\t1\t-3\t4\t10\t10\t50\tedge\n";
        let output = parse_tsv(tsv);
        assert_eq!(output.words[0].bbox.unwrap().x, 0);
    }
}
