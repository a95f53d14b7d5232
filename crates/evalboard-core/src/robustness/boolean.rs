//! Boolean-metric detection and the effective pass threshold.

use crate::domain::Run;

/// Distance from 0 or 1 within which a run-level average counts as boolean.
pub const BOOLEAN_EPSILON: f64 = 1e-4;

/// Threshold forced for boolean metrics: only a perfect score passes.
pub const BOOLEAN_PASS_THRESHOLD: f64 = 0.9999;

fn is_boolean_value(value: f64) -> bool {
    value.abs() < BOOLEAN_EPSILON || (value - 1.0).abs() < BOOLEAN_EPSILON
}

/// Whether every recorded run-level average of `metric` sits on 0 or 1.
///
/// A metric with no recorded averages at all is treated as boolean.
pub fn is_boolean_metric(runs: &[Run], metric: &str) -> bool {
    runs.iter()
        .filter_map(|run| run.metric_average(metric))
        .filter(|avg| avg.is_finite())
        .all(is_boolean_value)
}

/// Threshold to apply for `metric`: [`BOOLEAN_PASS_THRESHOLD`] for boolean
/// metrics, otherwise the caller's `threshold`.
pub fn effective_threshold(runs: &[Run], metric: &str, threshold: f64) -> (f64, bool) {
    if is_boolean_metric(runs, metric) {
        (BOOLEAN_PASS_THRESHOLD, true)
    } else {
        (threshold, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunGroupKey;
    use chrono::Utc;

    fn run_with_average(id: &str, average: Option<f64>) -> Run {
        let key = RunGroupKey::new("t", "d", "m");
        let run = Run::new(id, Utc::now(), &key, vec!["acc".to_string()]);
        match average {
            Some(avg) => run.with_metric_average("acc", avg),
            None => run,
        }
    }

    #[test]
    fn zero_and_one_averages_are_boolean() {
        let runs = vec![
            run_with_average("r1", Some(0.0)),
            run_with_average("r2", Some(1.0)),
            run_with_average("r3", Some(0.99995)),
        ];
        assert!(is_boolean_metric(&runs, "acc"));
        assert_eq!(effective_threshold(&runs, "acc", 0.5), (0.9999, true));
    }

    #[test]
    fn fractional_average_is_continuous() {
        let runs = vec![
            run_with_average("r1", Some(1.0)),
            run_with_average("r2", Some(0.73)),
        ];
        assert!(!is_boolean_metric(&runs, "acc"));
        assert_eq!(effective_threshold(&runs, "acc", 0.5), (0.5, false));
    }

    #[test]
    fn no_recorded_averages_defaults_to_boolean() {
        let runs = vec![run_with_average("r1", None)];
        assert!(is_boolean_metric(&runs, "acc"));
        assert!(is_boolean_metric(&[], "acc"));
        assert!(is_boolean_metric(&runs, "unknown_metric"));
    }
}
