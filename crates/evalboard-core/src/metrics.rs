//! Process-wide request counters.
//!
//! The service layer bumps these as it loads runs and answers aggregation
//! requests; the engine never touches them. [`Metrics::flush`] logs a
//! [`MetricsSnapshot`] as one `info!` event, typically when a CLI command ends.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

pub static METRICS: Metrics = Metrics::new();

#[derive(Default)]
pub struct Metrics {
    runs_loaded: AtomicU64,
    aggregations_computed: AtomicU64,
    cache_hits: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub runs_loaded: u64,
    pub aggregations_computed: u64,
    pub cache_hits: u64,
}

impl MetricsSnapshot {
    /// Share of aggregation requests answered from the memo cache.
    pub fn cache_hit_ratio(&self) -> f64 {
        let requests = self.aggregations_computed + self.cache_hits;
        if requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / requests as f64
        }
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            runs_loaded: AtomicU64::new(0),
            aggregations_computed: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    pub fn add_runs_loaded(&self, n: u64) {
        self.runs_loaded.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(counter = "runs_loaded", by = n);
    }

    pub fn inc_aggregations(&self) {
        self.aggregations_computed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "aggregations_computed", by = 1);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "cache_hits", by = 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_loaded: self.runs_loaded.load(Ordering::Relaxed),
            aggregations_computed: self.aggregations_computed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }

    /// Log the current snapshot.
    pub fn flush(&self) {
        let snap = self.snapshot();
        tracing::info!(
            event = "metrics.flush",
            runs_loaded = snap.runs_loaded,
            aggregations_computed = snap.aggregations_computed,
            cache_hits = snap.cache_hits,
            cache_hit_ratio = snap.cache_hit_ratio(),
        );
    }

    /// Zero every counter. Tests only; the process-wide instance is shared.
    pub fn reset(&self) {
        for counter in [
            &self.runs_loaded,
            &self.aggregations_computed,
            &self.cache_hits,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let m = Metrics::new();
        m.add_runs_loaded(3);
        m.add_runs_loaded(2);
        m.inc_aggregations();
        m.inc_cache_hits();
        m.inc_cache_hits();

        assert_eq!(
            m.snapshot(),
            MetricsSnapshot {
                runs_loaded: 5,
                aggregations_computed: 1,
                cache_hits: 2,
            }
        );
    }

    #[test]
    fn hit_ratio_handles_no_requests() {
        assert_eq!(MetricsSnapshot::default().cache_hit_ratio(), 0.0);
        let snap = MetricsSnapshot {
            runs_loaded: 0,
            aggregations_computed: 3,
            cache_hits: 1,
        };
        assert_eq!(snap.cache_hit_ratio(), 0.25);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.add_runs_loaded(1);
        m.inc_aggregations();
        m.inc_cache_hits();
        m.reset();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());
    }
}
