//! Reduction of per-item outcomes into the K-run [`AggregationResult`].

use crate::domain::{AggregationResult, MetricSelection, Run};

use super::accumulator::{Accumulator, ItemOutcome};
use super::boolean::effective_threshold;
use super::extractor::{row_latencies, row_scores, RunView};
use super::matcher::item_identities;

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Compute robustness statistics for `metric` over the run set `runs`.
///
/// Pure and total: degenerate input (no runs, no items, unknown metric)
/// yields a zero-valued result rather than an error.
pub fn aggregate(
    runs: &[Run],
    metric: &str,
    threshold: f64,
    track_distribution: bool,
) -> AggregationResult {
    let k = runs.len();
    let (threshold, boolean_metric) = effective_threshold(runs, metric, threshold);

    let views: Vec<RunView<'_>> = runs.iter().map(|run| RunView::new(run, metric)).collect();

    let acc = item_identities(runs)
        .into_iter()
        .filter_map(|identity| {
            let scores: Vec<f64> = views.iter().filter_map(|v| v.score(identity)).collect();
            ItemOutcome::from_scores(&scores, threshold)
        })
        .fold(Accumulator::new(k, track_distribution), Accumulator::absorb_item);

    let acc = runs
        .iter()
        .flat_map(|run| row_scores(run, metric))
        .fold(acc, Accumulator::absorb_score);

    let acc = runs
        .iter()
        .flat_map(|run| row_latencies(run))
        .fold(acc, Accumulator::absorb_latency);

    finish(acc, k, threshold, boolean_metric)
}

/// [`aggregate`] driven by a [`MetricSelection`].
pub fn aggregate_selection(
    runs: &[Run],
    selection: &MetricSelection,
    track_distribution: bool,
) -> AggregationResult {
    aggregate(
        runs,
        &selection.metric_name,
        selection.threshold,
        track_distribution,
    )
}

fn finish(
    acc: Accumulator,
    k: usize,
    effective_threshold: f64,
    boolean_metric: bool,
) -> AggregationResult {
    let items = acc.items_with_data;
    let multi = acc.items_with_multiple_runs;
    AggregationResult {
        pass_at_k: ratio(acc.pass_at_k_count as f64, items),
        pass_hat_k: ratio(acc.pass_hat_k_count as f64, items),
        max_at_k: ratio(acc.max_score_sum, items),
        consistency: ratio(acc.consistency_sum, multi),
        reliability: ratio(acc.reliability_sum, multi),
        avg_score: ratio(acc.score_sum, acc.score_count),
        avg_latency: ratio(acc.latency_sum, acc.latency_count),
        total_items: items,
        items_with_multiple_runs: multi,
        k,
        effective_threshold,
        boolean_metric,
        distribution: acc.distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemRow, RunGroupKey};
    use chrono::Utc;

    fn run(id: &str, scores: &[(&str, Option<f64>)], average: f64) -> Run {
        let key = RunGroupKey::new("t", "d", "m");
        scores.iter().fold(
            Run::new(id, Utc::now(), &key, vec!["score".to_string()])
                .with_metric_average("score", average),
            |run, (item, score)| run.with_item(ItemRow::by_id(*item, vec![*score])),
        )
    }

    #[test]
    fn ratio_with_zero_denominator_is_zero() {
        assert_eq!(ratio(3.0, 0), 0.0);
        assert_eq!(ratio(1.0, 4), 0.25);
    }

    #[test]
    fn absent_scores_are_not_failures() {
        let runs = vec![
            run("r1", &[("a", Some(0.9))], 0.5),
            run("r2", &[("a", None)], 0.5),
        ];
        let result = aggregate(&runs, "score", 0.8, true);
        assert_eq!(result.total_items, 1);
        assert_eq!(result.pass_hat_k, 1.0);
        assert_eq!(result.items_with_multiple_runs, 0);
        assert_eq!(result.distribution, Some(vec![0, 1, 0]));
        assert_eq!(result.avg_score, 0.9);
    }

    #[test]
    fn item_without_any_score_is_not_counted() {
        let runs = vec![
            run("r1", &[("a", Some(0.9)), ("b", None)], 0.5),
            run("r2", &[("a", Some(0.1)), ("b", None)], 0.5),
        ];
        let result = aggregate(&runs, "score", 0.8, true);
        assert_eq!(result.total_items, 1);
        assert_eq!(result.distribution.map(|d| d.iter().sum::<usize>()), Some(1));
    }

    #[test]
    fn selection_wrapper_matches_direct_call() {
        let runs = vec![run("r1", &[("a", Some(0.9))], 0.5)];
        let selection = MetricSelection::new("score", 0.8);
        assert_eq!(
            aggregate_selection(&runs, &selection, false),
            aggregate(&runs, "score", 0.8, false)
        );
    }
}
