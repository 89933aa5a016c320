//! Recognition result cache.
//!
//! Keyed by image content, engine configuration, and the confidence
//! threshold the result was filtered with. Capacity-bounded with a hard
//! stop: once full, new misses are simply never cached. There is no
//! eviction.

use crate::models::recognition::RecognitionResult;
use crate::policy::EngineConfig;
use std::collections::HashMap;

/// Default maximum number of cached results.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Builds the cache key for one invocation.
///
/// The scale and threshold are rendered with fixed precision so
/// structurally equal configurations always produce identical keys.
pub fn cache_key(image_hash: &str, config: &EngineConfig, min_confidence: f64) -> String {
    format!(
        "{image_hash}|pre={}|psm={}|oem={}|scale={:.2}|mc={min_confidence:.2}",
        config.preprocessing.as_str(),
        config.page_segmentation_mode,
        config.engine_mode.oem(),
        config.scale,
    )
}

/// Capacity-bounded store of recognition results.
#[derive(Debug)]
pub struct RecognitionCache {
    entries: HashMap<String, RecognitionResult>,
    capacity: usize,
}

impl RecognitionCache {
    pub fn new(capacity: usize) -> Self {
        RecognitionCache {
            entries: HashMap::new(),
            capacity,
        }
    }

    /// Returns a clone of the cached result, if present.
    pub fn get(&self, key: &str) -> Option<RecognitionResult> {
        self.entries.get(key).cloned()
    }

    /// Inserts a result unless the cache is already at capacity.
    pub fn insert(&mut self, key: String, result: RecognitionResult) {
        if self.entries.len() < self.capacity {
            self.entries.insert(key, result);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RecognitionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{EngineMode, Preprocessing};

    fn config() -> EngineConfig {
        EngineConfig {
            preprocessing: Preprocessing::Otsu,
            page_segmentation_mode: 11,
            scale: 1.2,
            engine_mode: EngineMode::Balanced,
        }
    }

    #[test]
    fn key_reflects_all_components() {
        let key = cache_key("abc", &config(), 30.0);
        assert_eq!(key, "abc|pre=otsu|psm=11|oem=2|scale=1.20|mc=30.00");
        assert_ne!(key, cache_key("abc", &config(), 40.0));
        assert_ne!(key, cache_key("abd", &config(), 30.0));
    }

    #[test]
    fn insert_stops_hard_at_capacity() {
        let mut cache = RecognitionCache::new(2);
        cache.insert("a".into(), RecognitionResult::empty("cfg"));
        cache.insert("b".into(), RecognitionResult::empty("cfg"));
        cache.insert("c".into(), RecognitionResult::empty("cfg"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_some());
        // No eviction: the newcomer is dropped, not an old entry.
        assert!(cache.get("c").is_none());
    }

    #[test]
    fn reinsert_at_capacity_is_skipped() {
        let mut cache = RecognitionCache::new(1);
        cache.insert("a".into(), RecognitionResult::empty("first"));
        cache.insert("a".into(), RecognitionResult::empty("second"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().config_used, "first");
    }
}
