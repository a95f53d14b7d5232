//! Structured observability hooks for aggregation requests.
//!
//! Emitters for the lifecycle of one dashboard request: runs loaded from the
//! store, a run group selected, an aggregation computed or served from cache.
//! The engine in [`crate::robustness`] never logs; these are called from the
//! service layer.

use tracing::info;

use crate::domain::{AggregationResult, RunGroupKey};

/// RAII guard that enters a span tagged with the run group and metric.
pub struct AggregationSpan {
    _span: tracing::span::EnteredSpan,
}

impl AggregationSpan {
    pub fn enter(key: &RunGroupKey, metric: &str) -> Self {
        let span = tracing::info_span!("evalboard.aggregate", group = %key, metric = %metric);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: runs loaded from the Run Store.
pub fn emit_runs_loaded(count: usize, groups: usize) {
    info!(event = "store.runs_loaded", runs = count, groups = groups);
}

/// Emit event: runs chosen for an aggregation.
pub fn emit_group_selected(key: &RunGroupKey, run_ids: &[String], explicit: bool) {
    info!(
        event = "group.selected",
        group = %key,
        k = run_ids.len(),
        explicit = explicit,
        run_ids = %run_ids.join(","),
    );
}

/// Emit event: explicitly requested runs missing from the group (warning level).
pub fn emit_selection_missing_runs(key: &RunGroupKey, missing: &[String]) {
    tracing::warn!(
        event = "group.missing_runs",
        group = %key,
        missing = %missing.join(","),
    );
}

/// Emit event: a group left out of a multi-group request (warning level).
pub fn emit_group_skipped(key: &RunGroupKey, reason: &dyn std::fmt::Display) {
    tracing::warn!(event = "group.skipped", group = %key, reason = %reason);
}

/// Emit event: aggregation finished.
pub fn emit_aggregation_computed(
    key: &RunGroupKey,
    metric: &str,
    result: &AggregationResult,
    cached: bool,
) {
    info!(
        event = "aggregation.computed",
        group = %key,
        metric = %metric,
        k = result.k,
        total_items = result.total_items,
        pass_at_k = result.pass_at_k,
        pass_hat_k = result.pass_hat_k,
        boolean_metric = result.boolean_metric,
        cached = cached,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_span_create() {
        let _span = AggregationSpan::enter(&RunGroupKey::new("t", "d", "m"), "acc");
    }
}
