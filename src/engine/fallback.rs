//! Fallback ladder for engine-level failures.
//!
//! When the primary engine call fails, progressively more permissive
//! parameter sets are tried, each with a fixed substitute confidence. The
//! first attempt that yields non-empty text wins; exhausting the ladder
//! produces a terminal zero-confidence result carrying a failure marker.
//! The ladder never returns an error.

use crate::core::traits::RecognitionBackend;
use crate::engine::params::ParamBuilder;
use crate::models::image::PageImage;
use crate::models::recognition::RecognitionResult;
use tracing::warn;

/// (psm, oem, substitute confidence, variant) in attempt order: dense-block
/// recovery, sparse-text handling, legacy-engine fallback.
const LADDER: [(u8, u8, f64, &str); 3] = [
    (6, 1, 30.0, "dense"),
    (11, 1, 20.0, "sparse"),
    (3, 0, 10.0, "legacy"),
];

/// Runs the fallback ladder against an already-prepared region image.
pub fn apply(
    backend: &dyn RecognitionBackend,
    image: &PageImage,
    builder: &ParamBuilder,
    error: &str,
) -> RecognitionResult {
    let mut last_attempt_error: Option<String> = None;

    for (psm, oem, confidence, variant) in LADDER {
        let params = builder.params_for(psm, oem);
        match backend.recognize(image, &params) {
            Ok(output) => {
                let text = output
                    .words
                    .iter()
                    .map(|w| w.text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if text.is_empty() {
                    continue;
                }
                warn!(variant, confidence, "fallback attempt recovered text");
                return RecognitionResult {
                    word_count: text.split_whitespace().count() as u32,
                    char_count: text.chars().count() as u32,
                    text,
                    confidence,
                    words: Vec::new(),
                    min_word_confidence: confidence,
                    max_word_confidence: confidence,
                    config_used: format!("fallback_psm{psm}_oem{oem}"),
                    processing_time: std::time::Duration::ZERO,
                    error: Some(truncate(error, 100)),
                };
            }
            Err(attempt_error) => {
                last_attempt_error = Some(attempt_error.to_string());
                continue;
            }
        }
    }

    warn!(error, "all fallback attempts exhausted");
    let mut recorded = truncate(error, 200);
    if let Some(last) = last_attempt_error {
        recorded.push_str("; last fallback: ");
        recorded.push_str(&truncate(&last, 120));
    }
    RecognitionResult {
        text: format!("[OCR FAILED: {}]", truncate(error, 50)),
        confidence: 0.0,
        words: Vec::new(),
        word_count: 0,
        char_count: 0,
        min_word_confidence: 0.0,
        max_word_confidence: 0.0,
        config_used: "failed_all_fallbacks".to_string(),
        processing_time: std::time::Duration::ZERO,
        error: Some(recorded),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelProfile;
    use crate::core::errors::{OcrError, OcrResult};
    use crate::core::traits::{EngineOutput, EngineParams, RawWord};
    use image::GrayImage;
    use std::sync::Mutex;

    /// Backend scripted with one response per call.
    struct Scripted {
        responses: Mutex<Vec<OcrResult<EngineOutput>>>,
        seen_psms: Mutex<Vec<u8>>,
    }

    impl Scripted {
        fn new(responses: Vec<OcrResult<EngineOutput>>) -> Self {
            Scripted {
                responses: Mutex::new(responses),
                seen_psms: Mutex::new(Vec::new()),
            }
        }
    }

    impl RecognitionBackend for Scripted {
        fn recognize(
            &self,
            _image: &PageImage,
            params: &EngineParams,
        ) -> OcrResult<EngineOutput> {
            self.seen_psms.lock().unwrap().push(params.psm);
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn words(texts: &[&str]) -> EngineOutput {
        EngineOutput {
            words: texts
                .iter()
                .map(|t| RawWord {
                    text: t.to_string(),
                    confidence: 50.0,
                    bbox: None,
                })
                .collect(),
        }
    }

    fn page() -> PageImage {
        PageImage::Gray(GrayImage::from_pixel(10, 10, image::Luma([255])))
    }

    fn builder() -> ParamBuilder {
        ParamBuilder::new(ModelProfile::Fast, "eng").unwrap()
    }

    #[test]
    fn first_non_empty_attempt_wins_with_its_confidence() {
        let backend = Scripted::new(vec![Ok(words(&["recovered", "text"]))]);
        let result = apply(&backend, &page(), &builder(), "engine exploded");
        assert_eq!(result.confidence, 30.0);
        assert_eq!(result.text, "recovered text");
        assert_eq!(result.word_count, 2);
        assert_eq!(result.config_used, "fallback_psm6_oem1");
        assert_eq!(result.error.as_deref(), Some("engine exploded"));
    }

    #[test]
    fn empty_attempts_step_down_the_ladder() {
        let backend = Scripted::new(vec![
            Ok(words(&[])),
            Err(OcrError::engine("still broken")),
            Ok(words(&["legacy"])),
        ]);
        let result = apply(&backend, &page(), &builder(), "boom");
        assert_eq!(result.confidence, 10.0);
        assert_eq!(result.config_used, "fallback_psm3_oem0");
        assert_eq!(*backend.seen_psms.lock().unwrap(), vec![6, 11, 3]);
    }

    #[test]
    fn exhausted_ladder_yields_terminal_marker() {
        let backend = Scripted::new(vec![
            Err(OcrError::engine("a")),
            Err(OcrError::engine("b")),
            Err(OcrError::engine("c")),
        ]);
        let result = apply(&backend, &page(), &builder(), "primary failure");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.config_used, "failed_all_fallbacks");
        assert!(result.text.starts_with("[OCR FAILED: primary failure"));
        let recorded = result.error.unwrap();
        assert!(recorded.contains("primary failure"));
        assert!(recorded.contains("last fallback"));
    }
}
