//! In-memory Run Store (testing and embedding).

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::RunStore;
use crate::domain::{EvalboardError, Result, Run};

/// In-memory run store backed by a `BTreeMap<run_id, Run>`.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: Mutex<BTreeMap<String, Run>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `runs`. Later runs replace earlier ones with the same id.
    pub fn with_runs(runs: impl IntoIterator<Item = Run>) -> Self {
        let store = Self::new();
        for run in runs {
            store.insert(run);
        }
        store
    }

    /// Insert or replace a run.
    pub fn insert(&self, run: Run) {
        self.lock().insert(run.run_id.clone(), run);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Run>> {
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn list_runs(&self) -> Result<Vec<Run>> {
        Ok(self.lock().values().cloned().collect())
    }

    async fn get_run(&self, run_id: &str) -> Result<Run> {
        self.lock()
            .get(run_id)
            .cloned()
            .ok_or_else(|| EvalboardError::RunNotFound(run_id.to_string()))
    }
}
