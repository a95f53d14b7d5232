//! Evaluation runs and their item rows.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identity of one evaluated example.
///
/// The two variants never compare equal, so a run keyed by declared ids and a
/// run keyed by row position cannot silently align with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "value", rename_all = "snake_case")]
pub enum ItemIdentity {
    /// Declared, non-empty item id.
    ById(String),

    /// Row position within the run, used when no id was declared.
    ByIndex(usize),
}

impl ItemIdentity {
    pub fn scheme(&self) -> IdentityScheme {
        match self {
            Self::ById(_) => IdentityScheme::ById,
            Self::ByIndex(_) => IdentityScheme::ByIndex,
        }
    }
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => f.write_str(id),
            Self::ByIndex(idx) => write!(f, "{}", idx),
        }
    }
}

/// Which identity space a run's rows live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScheme {
    ById,
    ByIndex,
}

/// One evaluated example within a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRow {
    /// Identity used to align this row across runs.
    pub identity: ItemIdentity,

    /// Metric values, positionally aligned with the run's `metric_names`.
    pub metric_values: Vec<Option<f64>>,

    /// End-to-end latency for this item, if measured.
    pub latency_ms: Option<f64>,
}

impl ItemRow {
    /// Row keyed by a declared id.
    pub fn by_id(id: impl Into<String>, metric_values: Vec<Option<f64>>) -> Self {
        Self {
            identity: ItemIdentity::ById(id.into()),
            metric_values,
            latency_ms: None,
        }
    }

    /// Row keyed by its position in the run.
    pub fn by_index(index: usize, metric_values: Vec<Option<f64>>) -> Self {
        Self {
            identity: ItemIdentity::ByIndex(index),
            metric_values,
            latency_ms: None,
        }
    }

    /// Attach a latency measurement.
    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    /// Raw value at `position`, if present.
    pub fn value_at(&self, position: usize) -> Option<f64> {
        self.metric_values.get(position).copied().flatten()
    }
}

/// The (task, dataset, model) triple that defines a run group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunGroupKey {
    pub task_name: String,
    pub dataset_name: String,
    pub model_name: String,
}

impl RunGroupKey {
    pub fn new(
        task_name: impl Into<String>,
        dataset_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            dataset_name: dataset_name.into(),
            model_name: model_name.into(),
        }
    }
}

impl fmt::Display for RunGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.task_name, self.dataset_name, self.model_name
        )
    }
}

/// One evaluation execution of a model against a task and dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    /// Identifier assigned by the Run Store.
    pub run_id: String,

    /// When the run was recorded; drives most-recent-K selection.
    pub timestamp: DateTime<Utc>,

    pub task_name: String,
    pub dataset_name: String,
    pub model_name: String,

    /// Ordered metric names; item values are aligned with this list.
    pub metric_names: Vec<String>,

    /// Run-level averages, aligned with `metric_names`.
    pub metric_averages: Vec<Option<f64>>,

    /// Item-level rows.
    pub items: Vec<ItemRow>,
}

impl Run {
    /// Create a run with no items.
    pub fn new(
        run_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        key: &RunGroupKey,
        metric_names: Vec<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp,
            task_name: key.task_name.clone(),
            dataset_name: key.dataset_name.clone(),
            model_name: key.model_name.clone(),
            metric_averages: vec![None; metric_names.len()],
            metric_names,
            items: Vec::new(),
        }
    }

    /// Append an item row.
    pub fn with_item(mut self, item: ItemRow) -> Self {
        self.items.push(item);
        self
    }

    /// Record the run-level average for `metric`. Unknown metrics are ignored.
    pub fn with_metric_average(mut self, metric: &str, average: f64) -> Self {
        if let Some(pos) = self.metric_position(metric) {
            if self.metric_averages.len() <= pos {
                self.metric_averages.resize(pos + 1, None);
            }
            self.metric_averages[pos] = Some(average);
        }
        self
    }

    /// Group key of this run.
    pub fn group_key(&self) -> RunGroupKey {
        RunGroupKey::new(&self.task_name, &self.dataset_name, &self.model_name)
    }

    /// Position of `metric` in this run's metric list.
    pub fn metric_position(&self, metric: &str) -> Option<usize> {
        self.metric_names.iter().position(|m| m == metric)
    }

    /// Run-level average recorded for `metric`.
    pub fn metric_average(&self, metric: &str) -> Option<f64> {
        self.metric_position(metric)
            .and_then(|pos| self.metric_averages.get(pos).copied().flatten())
    }

    /// Row with the given identity.
    pub fn find_item(&self, identity: &ItemIdentity) -> Option<&ItemRow> {
        self.items.iter().find(|row| &row.identity == identity)
    }

    /// Identity scheme of this run's rows, `None` for a run without items.
    ///
    /// Runs built through the store boundary never mix schemes, so the first
    /// row is representative.
    pub fn identity_scheme(&self) -> Option<IdentityScheme> {
        self.items.first().map(|row| row.identity.scheme())
    }
}
