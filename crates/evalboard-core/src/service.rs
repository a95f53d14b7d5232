//! Aggregation service: Run Store → run-group selection → robustness engine.
//!
//! This is the layer the dashboard's controller code talks to. It owns the
//! side effects the engine avoids: loading runs, logging, counters and the
//! memo cache.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::EvalboardConfig;
use crate::domain::{
    AggregationResult, EvalboardError, MetricSelection, Result, Run, RunGroupKey,
};
use crate::metrics::METRICS;
use crate::obs::{
    emit_aggregation_computed, emit_group_selected, emit_group_skipped, emit_runs_loaded,
    emit_selection_missing_runs, AggregationSpan,
};
use crate::robustness::aggregate_selection;
use crate::selection::{ensure_consistent_scheme, group_runs, select_runs, RunSelection};
use crate::store::RunStore;

/// One row of the run-group listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunGroupSummary {
    pub key: RunGroupKey,
    pub run_count: usize,
    pub latest_timestamp: DateTime<Utc>,

    /// Union of metric names across the group's runs, in first-seen order.
    pub metric_names: Vec<String>,
}

/// Aggregation of one metric over the runs selected from one group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupAggregation {
    pub key: RunGroupKey,
    pub metric: String,

    /// Threshold requested by the caller, before boolean forcing.
    pub requested_threshold: f64,

    /// Runs that participated, most recent first for default selection.
    pub run_ids: Vec<String>,

    pub result: AggregationResult,
}

/// Deterministic cache key over the aggregation inputs.
pub fn cache_key(runs: &[Run], selection: &MetricSelection, track: bool) -> Result<String> {
    let mut hasher = Sha256::new();
    for run in runs {
        serde_json::to_writer(&mut hasher, run)?;
        hasher.update(b"\0");
    }
    hasher.update(selection.metric_name.as_bytes());
    hasher.update(b"\0");
    hasher.update(selection.threshold.to_bits().to_le_bytes());
    hasher.update([u8::from(track)]);
    Ok(hex::encode(hasher.finalize()))
}

/// Bounded memo of aggregation results, evicting the oldest insert first.
#[derive(Debug, Default)]
struct ResultCache {
    capacity: usize,
    entries: HashMap<String, AggregationResult>,
    order: VecDeque<String>,
}

impl ResultCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    fn get(&self, key: &str) -> Option<AggregationResult> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: String, result: AggregationResult) {
        if self.capacity == 0 || self.entries.contains_key(&key) {
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, result);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Service over a [`RunStore`].
pub struct RobustnessService<S> {
    store: S,
    config: EvalboardConfig,
    cache: Mutex<ResultCache>,
}

impl<S: RunStore> RobustnessService<S> {
    pub fn new(store: S, config: EvalboardConfig) -> Self {
        Self {
            store,
            cache: Mutex::new(ResultCache::new(config.cache_capacity)),
            config,
        }
    }

    pub fn config(&self) -> &EvalboardConfig {
        &self.config
    }

    /// Number of memoized aggregation results currently held.
    pub fn cached_results(&self) -> usize {
        self.cache().len()
    }

    async fn load_runs(&self) -> Result<Vec<Run>> {
        let runs = self.store.list_runs().await?;
        METRICS.add_runs_loaded(runs.len() as u64);
        Ok(runs)
    }

    /// Every run group in the store, ordered by key.
    pub async fn groups(&self) -> Result<Vec<RunGroupSummary>> {
        let runs = self.load_runs().await?;
        let groups = group_runs(&runs);
        emit_runs_loaded(runs.len(), groups.len());

        Ok(groups
            .into_iter()
            .filter_map(|(key, members)| {
                let latest_timestamp = members.first()?.timestamp;
                let mut metric_names: Vec<String> = Vec::new();
                for name in members.iter().flat_map(|run| run.metric_names.iter()) {
                    if !metric_names.contains(name) {
                        metric_names.push(name.clone());
                    }
                }
                Some(RunGroupSummary {
                    key,
                    run_count: members.len(),
                    latest_timestamp,
                    metric_names,
                })
            })
            .collect())
    }

    /// Aggregate `metric` over the runs of one group.
    ///
    /// `threshold` falls back to the configured default.
    pub async fn aggregate_group(
        &self,
        key: &RunGroupKey,
        metric: &str,
        threshold: Option<f64>,
        selection: &RunSelection,
    ) -> Result<GroupAggregation> {
        if let RunSelection::Explicit(ids) = selection {
            let requested = ids.iter().map(String::as_str).collect::<HashSet<_>>().len();
            if requested > self.config.max_explicit_runs {
                return Err(EvalboardError::SelectionTooLarge {
                    requested,
                    cap: self.config.max_explicit_runs,
                });
            }
        }

        let runs = self.load_runs().await?;
        let groups = group_runs(&runs);
        emit_runs_loaded(runs.len(), groups.len());

        let members = groups
            .get(key)
            .ok_or_else(|| EvalboardError::EmptyGroup(key.to_string()))?;
        let metric = self.metric_selection(metric, threshold);
        self.evaluate(key, members, selection, &metric)
    }

    /// Compare every model evaluated on `task`/`dataset` using the most recent
    /// `k` runs of each. Sorted by pass@k descending, then model name.
    pub async fn compare_models(
        &self,
        task: &str,
        dataset: &str,
        metric: &str,
        threshold: Option<f64>,
        k: Option<usize>,
    ) -> Result<Vec<GroupAggregation>> {
        let runs = self.load_runs().await?;
        let groups = group_runs(&runs);
        emit_runs_loaded(runs.len(), groups.len());

        let selection = RunSelection::MostRecent(k.unwrap_or(self.config.default_k));
        let metric = self.metric_selection(metric, threshold);

        let mut rows = Vec::new();
        for (key, members) in groups
            .iter()
            .filter(|(key, _)| key.task_name == task && key.dataset_name == dataset)
        {
            match self.evaluate(key, members, &selection, &metric) {
                Ok(row) => rows.push(row),
                // one unusable model must not hide the others
                Err(e @ EvalboardError::IdentitySchemeMismatch { .. }) => {
                    emit_group_skipped(key, &e);
                }
                Err(e) => return Err(e),
            }
        }

        rows.sort_by(|a, b| {
            b.result
                .pass_at_k
                .total_cmp(&a.result.pass_at_k)
                .then_with(|| a.key.model_name.cmp(&b.key.model_name))
        });
        Ok(rows)
    }

    fn metric_selection(&self, metric: &str, threshold: Option<f64>) -> MetricSelection {
        MetricSelection::new(metric, threshold.unwrap_or(self.config.default_threshold))
    }

    fn evaluate(
        &self,
        key: &RunGroupKey,
        members: &[&Run],
        selection: &RunSelection,
        metric: &MetricSelection,
    ) -> Result<GroupAggregation> {
        let _span = AggregationSpan::enter(key, &metric.metric_name);

        let selected = select_runs(members, selection);
        if !selected.missing_ids.is_empty() {
            emit_selection_missing_runs(key, &selected.missing_ids);
        }
        ensure_consistent_scheme(key, &selected.runs)?;

        let run_ids = selected.run_ids();
        emit_group_selected(
            key,
            &run_ids,
            matches!(selection, RunSelection::Explicit(_)),
        );

        let runs = selected.to_runs();
        let track = self.config.track_distribution;
        let digest = cache_key(&runs, metric, track)?;

        let cached = self.cache().get(&digest);
        let (result, hit) = match cached {
            Some(result) => {
                METRICS.inc_cache_hits();
                (result, true)
            }
            None => {
                let result = aggregate_selection(&runs, metric, track);
                METRICS.inc_aggregations();
                self.cache().put(digest, result.clone());
                (result, false)
            }
        };
        emit_aggregation_computed(key, &metric.metric_name, &result, hit);

        Ok(GroupAggregation {
            key: key.clone(),
            metric: metric.metric_name.clone(),
            requested_threshold: metric.threshold,
            run_ids,
            result,
        })
    }

    fn cache(&self) -> MutexGuard<'_, ResultCache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemRow;
    use chrono::{Duration, TimeZone};

    fn run(id: &str, minutes: i64, score: f64) -> Run {
        Run::new(
            id,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
            &RunGroupKey::new("qa", "squad", "m"),
            vec!["acc".to_string()],
        )
        .with_metric_average("acc", 0.5)
        .with_item(ItemRow::by_id("q1", vec![Some(score)]))
    }

    #[test]
    fn cache_key_is_deterministic_and_input_sensitive() {
        let runs = vec![run("r1", 1, 1.0)];
        let sel = MetricSelection::new("acc", 0.5);

        let a = cache_key(&runs, &sel, true).unwrap();
        assert_eq!(a, cache_key(&runs, &sel, true).unwrap());
        assert_eq!(a.len(), 64);

        assert_ne!(a, cache_key(&runs, &sel, false).unwrap());
        assert_ne!(a, cache_key(&runs, &MetricSelection::new("acc", 0.6), true).unwrap());
        assert_ne!(a, cache_key(&[run("r1", 1, 0.0)], &sel, true).unwrap());
    }

    #[test]
    fn result_cache_evicts_oldest_first() {
        let mut cache = ResultCache::new(2);
        for key in ["a", "b", "c"] {
            cache.put(key.to_string(), AggregationResult::default());
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());

        // re-inserting a held key does not evict anything
        cache.put("c".to_string(), AggregationResult::default());
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn zero_capacity_disables_the_cache() {
        let mut cache = ResultCache::new(0);
        cache.put("a".to_string(), AggregationResult::default());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn service_cache_stays_within_capacity() {
        let store = crate::store::MemoryRunStore::with_runs([run("r1", 1, 0.7), run("r2", 2, 0.2)]);
        let config = EvalboardConfig {
            cache_capacity: 4,
            ..EvalboardConfig::default()
        };
        let svc = RobustnessService::new(store, config);
        let key = RunGroupKey::new("qa", "squad", "m");

        for step in 0..50u32 {
            let threshold = f64::from(step) / 50.0;
            svc.aggregate_group(&key, "acc", Some(threshold), &RunSelection::MostRecent(2))
                .await
                .unwrap();
        }
        assert_eq!(svc.cached_results(), 4);
    }
}
