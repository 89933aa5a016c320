//! Engine invocation statistics.
//!
//! Lightweight O(1) running counters for monitoring recognition quality and
//! cache effectiveness. No history is stored; updates are constant-time and
//! safe under concurrent invocation.

use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Results below this confidence count as low-confidence.
const LOW_CONFIDENCE: f64 = 50.0;

/// Snapshot of accumulated engine metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStatsSnapshot {
    pub total_invocations: usize,
    pub total_time_ms: f64,
    pub avg_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub low_confidence_results: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl EngineStatsSnapshot {
    /// Mean invocation time in milliseconds.
    pub fn avg_time_ms(&self) -> f64 {
        if self.total_invocations == 0 {
            0.0
        } else {
            self.total_time_ms / self.total_invocations as f64
        }
    }

    /// Fraction of lookups served from the cache (0.0 to 1.0).
    pub fn cache_hit_ratio(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}

/// Thread-safe running statistics owned by one invoker.
#[derive(Debug, Default)]
pub struct EngineStats {
    inner: Mutex<EngineStatsSnapshot>,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed invocation (engine call or fallback).
    pub fn record(&self, confidence: f64, elapsed: Duration) {
        let mut stats = self.inner.lock().unwrap();
        let previous_total = stats.total_invocations;
        let new_total = previous_total + 1;

        stats.avg_confidence =
            (stats.avg_confidence * previous_total as f64 + confidence) / new_total as f64;
        stats.total_invocations = new_total;
        stats.total_time_ms += elapsed.as_secs_f64() * 1000.0;

        if previous_total == 0 {
            stats.min_confidence = confidence;
        } else {
            stats.min_confidence = stats.min_confidence.min(confidence);
        }
        stats.max_confidence = stats.max_confidence.max(confidence);

        if confidence < LOW_CONFIDENCE {
            stats.low_confidence_results += 1;
        }
    }

    pub fn record_cache_hit(&self) {
        self.inner.lock().unwrap().cache_hits += 1;
    }

    pub fn record_cache_miss(&self) {
        self.inner.lock().unwrap().cache_misses += 1;
    }

    /// Returns a copy of the current counters.
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        self.inner.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_average_and_extrema() {
        let stats = EngineStats::new();
        stats.record(80.0, Duration::from_millis(100));
        stats.record(40.0, Duration::from_millis(300));
        let snap = stats.snapshot();
        assert_eq!(snap.total_invocations, 2);
        assert!((snap.avg_confidence - 60.0).abs() < 1e-9);
        assert_eq!(snap.min_confidence, 40.0);
        assert_eq!(snap.max_confidence, 80.0);
        assert_eq!(snap.low_confidence_results, 1);
        assert!((snap.avg_time_ms() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn hit_ratio_counts_both_sides() {
        let stats = EngineStats::new();
        stats.record_cache_miss();
        stats.record_cache_hit();
        stats.record_cache_hit();
        let snap = stats.snapshot();
        assert!((snap.cache_hit_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        let snap = EngineStats::new().snapshot();
        assert_eq!(snap.avg_time_ms(), 0.0);
        assert_eq!(snap.cache_hit_ratio(), 0.0);
    }
}
