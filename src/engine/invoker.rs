//! Engine invocation with caching and failure recovery.
//!
//! The invoker wraps every call to the external recognition engine with a
//! result cache and the fallback ladder, and owns all pre- and
//! post-processing around the call. `invoke` is total: whatever the engine
//! does, the caller receives a well-formed [`RecognitionResult`].

use crate::core::config::ModelProfile;
use crate::core::errors::OcrResult;
use crate::core::traits::RecognitionBackend;
use crate::engine::cache::{cache_key, RecognitionCache, DEFAULT_CACHE_CAPACITY};
use crate::engine::fallback;
use crate::engine::params::ParamBuilder;
use crate::engine::postprocess;
use crate::engine::stats::{EngineStats, EngineStatsSnapshot};
use crate::models::image::PageImage;
use crate::models::recognition::RecognitionResult;
use crate::policy::EngineConfig;
use crate::processors::binarize;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, warn};

/// Cached, fallback-guarded gateway to the recognition engine.
///
/// One invoker owns one cache and one set of counters; in thread-batched
/// execution a single instance is shared (`Arc`) and called concurrently.
/// Process-isolated workers each build their own, so their caches start
/// cold and stay local to the worker's lifetime.
pub struct EngineInvoker {
    backend: Box<dyn RecognitionBackend>,
    builder: ParamBuilder,
    cache: Mutex<RecognitionCache>,
    stats: EngineStats,
}

impl EngineInvoker {
    /// Creates an invoker with the default cache capacity.
    pub fn new(
        backend: Box<dyn RecognitionBackend>,
        profile: ModelProfile,
        languages: impl Into<String>,
    ) -> OcrResult<Self> {
        Self::with_cache_capacity(backend, profile, languages, DEFAULT_CACHE_CAPACITY)
    }

    /// Creates an invoker with an explicit cache capacity.
    pub fn with_cache_capacity(
        backend: Box<dyn RecognitionBackend>,
        profile: ModelProfile,
        languages: impl Into<String>,
        capacity: usize,
    ) -> OcrResult<Self> {
        Ok(EngineInvoker {
            backend,
            builder: ParamBuilder::new(profile, languages)?,
            cache: Mutex::new(RecognitionCache::new(capacity)),
            stats: EngineStats::new(),
        })
    }

    /// Recognizes one region image under the selected configuration.
    ///
    /// Cache first; on a miss the region is preprocessed per the
    /// configuration, the engine is called, and the output is filtered and
    /// line-reconstructed. Engine failures run the fallback ladder. The
    /// result is cached whether it came from the engine or the ladder (up to capacity)
    /// and returned; errors never propagate to the caller.
    pub fn invoke(
        &self,
        image: &PageImage,
        config: &EngineConfig,
        min_confidence: f64,
    ) -> RecognitionResult {
        let started = Instant::now();
        let key = cache_key(&image.content_hash(), config, min_confidence);

        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            self.stats.record_cache_hit();
            debug!("recognition served from cache");
            return hit;
        }
        self.stats.record_cache_miss();

        let params = self.builder.params(config);
        let config_used = self.builder.render(params.psm, params.oem, "");
        let prepared = binarize::prepare(image, config);

        let mut result = match self.backend.recognize(&prepared, &params) {
            Ok(output) => {
                let refined = postprocess::refine(&output, min_confidence, config.scale);
                RecognitionResult {
                    text: refined.text,
                    confidence: refined.confidence,
                    word_count: refined.words.len() as u32,
                    char_count: refined.words.iter().map(|w| w.text.chars().count() as u32).sum(),
                    words: refined.words,
                    min_word_confidence: refined.min_word_confidence,
                    max_word_confidence: refined.max_word_confidence,
                    config_used: config_used.clone(),
                    processing_time: std::time::Duration::ZERO,
                    error: None,
                }
            }
            Err(error) => {
                warn!(%error, "engine call failed, entering fallback ladder");
                fallback::apply(
                    self.backend.as_ref(),
                    &prepared,
                    &self.builder,
                    &error.to_string(),
                )
            }
        };

        result.processing_time = started.elapsed();
        self.stats.record(result.confidence, result.processing_time);
        self.cache.lock().unwrap().insert(key, result.clone());
        result
    }

    /// Snapshot of the invoker's running statistics.
    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of cached results.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{OcrError, OcrResult};
    use crate::core::traits::{EngineOutput, EngineParams, RawWord};
    use crate::models::recognition::BBox;
    use crate::policy::{EngineMode, Preprocessing};
    use image::GrayImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl CountingBackend {
        fn new(fail_first: bool) -> Self {
            CountingBackend {
                calls: AtomicUsize::new(0),
                fail_first,
            }
        }
    }

    impl RecognitionBackend for CountingBackend {
        fn recognize(
            &self,
            _image: &PageImage,
            _params: &EngineParams,
        ) -> OcrResult<EngineOutput> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(OcrError::engine("simulated failure"));
            }
            Ok(EngineOutput {
                words: vec![RawWord {
                    text: "alpha".to_string(),
                    confidence: 77.0,
                    bbox: Some(BBox { x: 0, y: 0, w: 40, h: 12 }),
                }],
            })
        }
    }

    fn page() -> PageImage {
        PageImage::Gray(GrayImage::from_pixel(20, 20, image::Luma([200])))
    }

    fn config() -> EngineConfig {
        EngineConfig {
            preprocessing: Preprocessing::Gray,
            page_segmentation_mode: 3,
            scale: 1.0,
            engine_mode: EngineMode::Balanced,
        }
    }

    fn invoker(backend: CountingBackend) -> EngineInvoker {
        EngineInvoker::new(Box::new(backend), ModelProfile::Standard, "eng").unwrap()
    }

    #[test]
    fn second_identical_call_hits_the_cache() {
        let invoker = invoker(CountingBackend::new(false));
        let first = invoker.invoke(&page(), &config(), 30.0);
        let second = invoker.invoke(&page(), &config(), 30.0);

        assert_eq!(first.text, second.text);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.config_used, second.config_used);

        let stats = invoker.stats();
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
        // One engine call total: the second invocation never reached it.
        assert_eq!(stats.total_invocations, 1);
        assert_eq!(invoker.cache_len(), 1);
    }

    #[test]
    fn different_threshold_misses_the_cache() {
        let invoker = invoker(CountingBackend::new(false));
        invoker.invoke(&page(), &config(), 30.0);
        invoker.invoke(&page(), &config(), 40.0);
        assert_eq!(invoker.stats().cache_misses, 2);
        assert_eq!(invoker.cache_len(), 2);
    }

    #[test]
    fn engine_failure_recovers_through_fallback() {
        let invoker = invoker(CountingBackend::new(true));
        let result = invoker.invoke(&page(), &config(), 30.0);
        assert_eq!(result.confidence, 30.0);
        assert_eq!(result.config_used, "fallback_psm6_oem1");
        assert_eq!(result.text, "alpha");
        assert!(result.error.is_some());
        // Fallback results are cached like successes.
        assert_eq!(invoker.cache_len(), 1);
    }

    #[test]
    fn successful_call_reports_refined_words() {
        let invoker = invoker(CountingBackend::new(false));
        let result = invoker.invoke(&page(), &config(), 30.0);
        assert_eq!(result.word_count, 1);
        assert_eq!(result.char_count, 5);
        assert_eq!(result.confidence, 77.0);
        assert!(result.config_used.contains("--psm 3"));
        assert!(result.error.is_none());
    }
}
