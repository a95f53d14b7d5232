//! evalboard Core Library
//!
//! Multi-run robustness statistics for LLM evaluation dashboards: given K
//! repeated runs of one model on one task and dataset, compute Pass@K,
//! Pass^K, Max@K, consistency, reliability and the per-item correct-count
//! distribution from item-level scores.

pub mod config;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod reporting;
pub mod robustness;
pub mod selection;
pub mod service;
pub mod store;
pub mod telemetry;

pub use config::EvalboardConfig;

pub use domain::{
    AggregationResult, EvalboardError, IdentityScheme, ItemIdentity, ItemRow, MetricSelection,
    RecordError, Result, Run, RunGroupKey,
};

pub use robustness::{
    aggregate, aggregate_selection, effective_threshold, extract, is_boolean_metric,
    item_identities, BOOLEAN_EPSILON, BOOLEAN_PASS_THRESHOLD,
};

pub use selection::{ensure_consistent_scheme, group_runs, select_runs, RunSelection, Selected};

pub use service::{cache_key, GroupAggregation, RobustnessService, RunGroupSummary};

pub use store::{FsRunStore, MemoryRunStore, RawItemRow, RawRun, RunStore};

pub use reporting::{
    read_report_json, render_comparison_md, write_report_json, AggregationReport,
    REPORT_SCHEMA_VERSION,
};

pub use metrics::{MetricsSnapshot, METRICS};
pub use obs::{
    emit_aggregation_computed, emit_group_selected, emit_group_skipped, emit_runs_loaded,
    emit_selection_missing_runs, AggregationSpan,
};
pub use telemetry::init_tracing;

/// evalboard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
