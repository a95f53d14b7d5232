//! Multi-run robustness engine.
//!
//! Given K repeated runs of one model on one task and dataset, computes
//! Pass@K, Pass^K, Max@K, consistency, reliability, mean score, mean latency
//! and the per-item correct-count distribution.
//!
//! The engine is a pure function of its inputs: no I/O, no shared state, no
//! error path. Items are matched by identity ([`matcher`]), scored per run
//! ([`extractor`]) against a threshold that may be forced for boolean metrics
//! ([`boolean`]), summarised per item and folded into running totals
//! ([`accumulator`]), then reduced ([`aggregate`]).

pub mod accumulator;
pub mod aggregate;
pub mod boolean;
pub mod extractor;
pub mod matcher;

pub use accumulator::{Accumulator, ItemOutcome};
pub use aggregate::{aggregate, aggregate_selection};
pub use boolean::{
    effective_threshold, is_boolean_metric, BOOLEAN_EPSILON, BOOLEAN_PASS_THRESHOLD,
};
pub use extractor::{extract, RunView};
pub use matcher::item_identities;
