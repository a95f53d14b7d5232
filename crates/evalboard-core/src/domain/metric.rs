//! Metric selection and the K-run aggregation bundle.

use serde::{Deserialize, Serialize};

/// A metric name plus the caller's pass/fail threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSelection {
    pub metric_name: String,

    /// Pass threshold in 0.0–1.0. May be overridden for boolean metrics.
    pub threshold: f64,
}

impl MetricSelection {
    /// Create a selection. The threshold is clamped into 0.0–1.0; NaN becomes 0.
    pub fn new(metric_name: impl Into<String>, threshold: f64) -> Self {
        let threshold = if threshold.is_nan() {
            0.0
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self {
            metric_name: metric_name.into(),
            threshold,
        }
    }
}

/// Robustness statistics over K repeated runs of one model.
///
/// # Invariants
///
/// - every ratio field lies in 0.0–1.0; zero denominators yield 0
/// - `pass_hat_k <= pass_at_k`
/// - when present, `distribution` has `k + 1` slots summing to `total_items`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregationResult {
    /// Fraction of items where at least one run passed.
    pub pass_at_k: f64,

    /// Fraction of items where every available run passed.
    pub pass_hat_k: f64,

    /// Mean over items of the best score across runs.
    pub max_at_k: f64,

    /// Mean per-item pass/fail agreement across runs.
    pub consistency: f64,

    /// Mean per-item pass rate across runs.
    pub reliability: f64,

    /// Mean of every individual score value.
    pub avg_score: f64,

    /// Mean of every individual latency value, in milliseconds.
    pub avg_latency: f64,

    /// Items that contributed at least one score.
    pub total_items: usize,

    /// Items with two or more scores (denominator of consistency/reliability).
    pub items_with_multiple_runs: usize,

    /// Size of the run set.
    pub k: usize,

    /// Threshold actually applied after boolean-metric forcing.
    pub effective_threshold: f64,

    /// Whether the metric was classified as boolean.
    pub boolean_metric: bool,

    /// Slot `i` counts items for which exactly `i` runs passed.
    pub distribution: Option<Vec<usize>>,
}
