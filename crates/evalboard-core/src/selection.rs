//! Run-group selection.
//!
//! Groups runs by (task, dataset, model) and chooses which K of them feed an
//! aggregation: the most recent K by default, or an explicit set of run ids.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{EvalboardError, IdentityScheme, Result, Run, RunGroupKey};

/// How runs are chosen from a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case", content = "value")]
pub enum RunSelection {
    /// The `k` most recently timestamped runs.
    MostRecent(usize),

    /// Exactly these run ids, in caller order, not limited to K.
    Explicit(Vec<String>),
}

/// Runs chosen for one aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Selected<'a> {
    pub runs: Vec<&'a Run>,

    /// Explicitly requested ids that are not part of the group.
    pub missing_ids: Vec<String>,
}

impl Selected<'_> {
    /// Owned copies of the selected runs, ready for the engine.
    pub fn to_runs(&self) -> Vec<Run> {
        self.runs.iter().map(|run| (*run).clone()).collect()
    }

    pub fn run_ids(&self) -> Vec<String> {
        self.runs.iter().map(|run| run.run_id.clone()).collect()
    }
}

/// Group `runs` by (task, dataset, model), each group most recent first.
///
/// Runs with identical timestamps are ordered by run id, descending.
pub fn group_runs(runs: &[Run]) -> BTreeMap<RunGroupKey, Vec<&Run>> {
    let mut groups: BTreeMap<RunGroupKey, Vec<&Run>> = BTreeMap::new();
    for run in runs {
        groups.entry(run.group_key()).or_default().push(run);
    }
    for members in groups.values_mut() {
        members.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.run_id.cmp(&a.run_id))
        });
    }
    groups
}

/// Choose runs from a group produced by [`group_runs`].
pub fn select_runs<'a>(group: &[&'a Run], selection: &RunSelection) -> Selected<'a> {
    match selection {
        RunSelection::MostRecent(k) => Selected {
            runs: group.iter().take(*k).copied().collect(),
            missing_ids: Vec::new(),
        },
        RunSelection::Explicit(ids) => {
            let mut seen = HashSet::new();
            let mut runs = Vec::new();
            let mut missing_ids = Vec::new();
            for id in ids {
                if !seen.insert(id.as_str()) {
                    continue;
                }
                match group.iter().find(|run| &run.run_id == id) {
                    Some(run) => runs.push(*run),
                    None => missing_ids.push(id.clone()),
                }
            }
            Selected { runs, missing_ids }
        }
    }
}

/// Reject a run set that mixes id-based and index-based item identities.
///
/// Runs without items carry no scheme and never conflict.
pub fn ensure_consistent_scheme(key: &RunGroupKey, runs: &[&Run]) -> Result<()> {
    let schemes: Vec<(&str, IdentityScheme)> = runs
        .iter()
        .filter_map(|run| run.identity_scheme().map(|s| (run.run_id.as_str(), s)))
        .collect();

    let Some((_, first)) = schemes.first() else {
        return Ok(());
    };
    if schemes.iter().all(|(_, s)| s == first) {
        return Ok(());
    }

    let runs = schemes
        .iter()
        .map(|(id, s)| format!("{}={:?}", id, s))
        .collect::<Vec<_>>()
        .join(", ");
    Err(EvalboardError::IdentitySchemeMismatch {
        group: key.to_string(),
        runs,
    })
}
