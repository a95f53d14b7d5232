//! Run Store boundary.
//!
//! The Run Store supplies runs as loosely-typed records. This module is the
//! one place they are parsed: metric values become `Option<f64>`, item
//! identities become [`ItemIdentity`], and structurally broken runs are
//! rejected here instead of being tolerated deep inside the engine.
//!
//! - `RunStore`: async, backend-agnostic access to runs
//! - `FsRunStore`: one JSON file per run under `<root>/runs/`
//! - `MemoryRunStore`: in-memory fake for tests

pub mod fs;
pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{IdentityScheme, ItemIdentity, ItemRow, RecordError, Result, Run};

pub use fs::FsRunStore;
pub use memory::MemoryRunStore;

/// Source of evaluation runs.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Every run known to the store.
    async fn list_runs(&self) -> Result<Vec<Run>>;

    /// A single run. Returns `EvalboardError::RunNotFound` if absent.
    async fn get_run(&self, run_id: &str) -> Result<Run>;
}

/// One item row as delivered by the Run Store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawItemRow {
    /// Declared item id: a string or a number. Null or empty means "none".
    #[serde(default)]
    pub id: Option<Value>,

    /// Values aligned with the run's `metric_names`, in any JSON shape.
    #[serde(default)]
    pub metric_values: Vec<Value>,

    #[serde(default)]
    pub latency_ms: Option<Value>,
}

/// One run as delivered by the Run Store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRun {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub task_name: String,
    pub dataset_name: String,
    pub model_name: String,

    #[serde(default)]
    pub metric_names: Vec<String>,

    #[serde(default)]
    pub metric_averages: Vec<Value>,

    #[serde(default)]
    pub items: Vec<RawItemRow>,
}

/// Parse a JSON value as a number: numbers as-is, numeric strings parsed,
/// anything else (and non-finite results) absent.
pub fn parse_numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn declared_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RawRun {
    /// Validate and convert into a typed [`Run`].
    ///
    /// Rejects runs that mix declared ids with positional fallback, runs with
    /// duplicate identities, and rows carrying more values than metric names.
    /// Shorter value arrays are padded with absent values.
    pub fn into_run(self) -> std::result::Result<Run, RecordError> {
        if self.run_id.is_empty() {
            return Err(RecordError::MissingField { field: "run_id" });
        }

        let names = self.metric_names.len();
        let mut scheme: Option<IdentityScheme> = None;
        let mut seen = HashSet::with_capacity(self.items.len());
        let mut items = Vec::with_capacity(self.items.len());

        for (position, raw) in self.items.into_iter().enumerate() {
            let identity = match declared_id(raw.id.as_ref()) {
                Some(id) => ItemIdentity::ById(id),
                None => ItemIdentity::ByIndex(position),
            };

            match scheme {
                None => scheme = Some(identity.scheme()),
                Some(s) if s != identity.scheme() => {
                    return Err(RecordError::MixedIdentityScheme {
                        run_id: self.run_id,
                    });
                }
                Some(_) => {}
            }

            if raw.metric_values.len() > names {
                return Err(RecordError::MetricValuesLength {
                    run_id: self.run_id,
                    identity: identity.to_string(),
                    values: raw.metric_values.len(),
                    names,
                });
            }

            if !seen.insert(identity.clone()) {
                return Err(RecordError::DuplicateItem {
                    run_id: self.run_id,
                    identity: identity.to_string(),
                });
            }

            let mut metric_values: Vec<Option<f64>> =
                raw.metric_values.iter().map(parse_numeric).collect();
            metric_values.resize(names, None);

            items.push(ItemRow {
                identity,
                metric_values,
                latency_ms: raw.latency_ms.as_ref().and_then(parse_numeric),
            });
        }

        let mut metric_averages: Vec<Option<f64>> =
            self.metric_averages.iter().map(parse_numeric).collect();
        metric_averages.resize(names, None);

        Ok(Run {
            run_id: self.run_id,
            timestamp: self.timestamp,
            task_name: self.task_name,
            dataset_name: self.dataset_name,
            model_name: self.model_name,
            metric_names: self.metric_names,
            metric_averages,
            items,
        })
    }
}

impl From<&Run> for RawRun {
    fn from(run: &Run) -> Self {
        let number = |v: Option<f64>| v.map_or(Value::Null, Value::from);
        Self {
            run_id: run.run_id.clone(),
            timestamp: run.timestamp,
            task_name: run.task_name.clone(),
            dataset_name: run.dataset_name.clone(),
            model_name: run.model_name.clone(),
            metric_names: run.metric_names.clone(),
            metric_averages: run.metric_averages.iter().copied().map(number).collect(),
            items: run
                .items
                .iter()
                .map(|row| RawItemRow {
                    id: match &row.identity {
                        ItemIdentity::ById(id) => Some(Value::from(id.as_str())),
                        ItemIdentity::ByIndex(_) => None,
                    },
                    metric_values: row.metric_values.iter().copied().map(number).collect(),
                    latency_ms: row.latency_ms.map(Value::from),
                })
                .collect(),
        }
    }
}
