//! Domain models for evalboard.
//!
//! Canonical definitions for the core entities:
//! - `Run` / `ItemRow`: one evaluation execution and its per-item scores
//! - `RunGroupKey`: the (task, dataset, model) triple runs are grouped by
//! - `MetricSelection` / `AggregationResult`: aggregation input and output

pub mod error;
pub mod metric;
pub mod run;

pub use error::{EvalboardError, RecordError, Result};
pub use metric::{AggregationResult, MetricSelection};
pub use run::{IdentityScheme, ItemIdentity, ItemRow, Run, RunGroupKey};
