//! Score extraction: locate one metric's value for one item in one run.
//!
//! A missing row, a metric unknown to the run, or a non-numeric value are all
//! "absent". Absent scores are excluded from every sum; they never count as
//! failures.

use std::collections::HashMap;

use crate::domain::{ItemIdentity, ItemRow, Run};

/// Normalise a raw score: non-finite values are absent, finite ones are
/// clamped into 0.0–1.0.
pub fn normalize_score(raw: f64) -> Option<f64> {
    raw.is_finite().then(|| raw.clamp(0.0, 1.0))
}

fn normalize_latency(raw: f64) -> Option<f64> {
    (raw.is_finite() && raw >= 0.0).then_some(raw)
}

/// Score of `metric` for the item `identity` in `run`.
pub fn extract(run: &Run, identity: &ItemIdentity, metric: &str) -> Option<f64> {
    let position = run.metric_position(metric)?;
    run.find_item(identity)
        .and_then(|row| row.value_at(position))
        .and_then(normalize_score)
}

/// Every present score of `metric` across the rows of `run`.
pub fn row_scores<'a>(run: &'a Run, metric: &str) -> impl Iterator<Item = f64> + 'a {
    let position = run.metric_position(metric);
    run.items.iter().filter_map(move |row| {
        position
            .and_then(|pos| row.value_at(pos))
            .and_then(normalize_score)
    })
}

/// Every present latency across the rows of `run`, regardless of metric.
pub fn row_latencies(run: &Run) -> impl Iterator<Item = f64> + '_ {
    run.items
        .iter()
        .filter_map(|row| row.latency_ms.and_then(normalize_latency))
}

/// Indexed view of one run for repeated lookups of a single metric.
///
/// Equivalent to calling [`extract`] per item, without the linear row scan.
pub struct RunView<'a> {
    rows: HashMap<&'a ItemIdentity, &'a ItemRow>,
    position: Option<usize>,
}

impl<'a> RunView<'a> {
    pub fn new(run: &'a Run, metric: &str) -> Self {
        let mut rows = HashMap::with_capacity(run.items.len());
        for row in &run.items {
            // First occurrence wins, matching `Run::find_item`.
            rows.entry(&row.identity).or_insert(row);
        }
        Self {
            rows,
            position: run.metric_position(metric),
        }
    }

    /// Score for `identity`, if this run reports one.
    pub fn score(&self, identity: &ItemIdentity) -> Option<f64> {
        let position = self.position?;
        self.rows
            .get(identity)
            .and_then(|row| row.value_at(position))
            .and_then(normalize_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunGroupKey;
    use chrono::Utc;

    fn sample_run() -> Run {
        let key = RunGroupKey::new("t", "d", "m");
        Run::new(
            "r1",
            Utc::now(),
            &key,
            vec!["exact".to_string(), "f1".to_string()],
        )
        .with_item(ItemRow::by_id("q1", vec![Some(1.0), Some(0.4)]).with_latency(100.0))
        .with_item(ItemRow::by_id("q2", vec![None, Some(f64::NAN)]).with_latency(f64::NAN))
        .with_item(ItemRow::by_id("q3", vec![Some(1.5)]))
    }

    fn id(s: &str) -> ItemIdentity {
        ItemIdentity::ById(s.to_string())
    }

    #[test]
    fn extract_reads_parallel_value() {
        let run = sample_run();
        assert_eq!(extract(&run, &id("q1"), "f1"), Some(0.4));
        assert_eq!(extract(&run, &id("q1"), "exact"), Some(1.0));
    }

    #[test]
    fn extract_absent_cases() {
        let run = sample_run();
        assert_eq!(extract(&run, &id("missing"), "exact"), None);
        assert_eq!(extract(&run, &id("q1"), "bleu"), None);
        assert_eq!(extract(&run, &id("q2"), "exact"), None);
        assert_eq!(extract(&run, &id("q2"), "f1"), None);
        // short value array
        assert_eq!(extract(&run, &id("q3"), "f1"), None);
    }

    #[test]
    fn extract_clamps_out_of_range_scores() {
        let run = sample_run();
        assert_eq!(extract(&run, &id("q3"), "exact"), Some(1.0));
    }

    #[test]
    fn run_view_matches_extract() {
        let run = sample_run();
        for metric in ["exact", "f1", "bleu"] {
            let view = RunView::new(&run, metric);
            for item in ["q1", "q2", "q3", "missing"] {
                assert_eq!(view.score(&id(item)), extract(&run, &id(item), metric));
            }
        }
    }

    #[test]
    fn row_level_iterators_skip_absent_values() {
        let run = sample_run();
        let scores: Vec<f64> = row_scores(&run, "exact").collect();
        assert_eq!(scores, vec![1.0, 1.0]);
        assert_eq!(row_scores(&run, "bleu").count(), 0);

        let latencies: Vec<f64> = row_latencies(&run).collect();
        assert_eq!(latencies, vec![100.0]);
    }
}
