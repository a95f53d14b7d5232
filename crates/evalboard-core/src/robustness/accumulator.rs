//! Per-item statistics and the running totals folded over them.

/// Pass/fail summary of one item across the runs that reported it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemOutcome {
    /// Number of runs that produced a score for this item.
    pub samples: usize,

    /// Number of those scores at or above the threshold.
    pub num_correct: usize,

    /// Best score across runs.
    pub max_score: f64,
}

impl ItemOutcome {
    /// Summarise `scores` against `threshold`. `None` when there are no scores.
    pub fn from_scores(scores: &[f64], threshold: f64) -> Option<Self> {
        let max_score = scores.iter().copied().reduce(f64::max)?;
        Some(Self {
            samples: scores.len(),
            num_correct: scores.iter().filter(|&&s| s >= threshold).count(),
            max_score,
        })
    }

    pub fn passed_any(&self) -> bool {
        self.num_correct > 0
    }

    pub fn passed_all(&self) -> bool {
        self.num_correct == self.samples
    }

    /// Agreement between runs: 1 when unanimous, 0 when evenly split.
    ///
    /// Agreement needs at least two observations.
    pub fn consistency(&self) -> Option<f64> {
        if self.samples < 2 {
            return None;
        }
        let fails = self.samples - self.num_correct;
        let majority = self.num_correct.max(fails) as f64;
        Some(2.0 * majority / self.samples as f64 - 1.0)
    }

    /// Fraction of this item's runs that passed. Needs at least two observations.
    pub fn reliability(&self) -> Option<f64> {
        (self.samples >= 2).then(|| self.num_correct as f64 / self.samples as f64)
    }
}

/// Running sums threaded through the item and row folds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    pub items_with_data: usize,
    pub pass_at_k_count: usize,
    pub pass_hat_k_count: usize,
    pub max_score_sum: f64,

    pub items_with_multiple_runs: usize,
    pub consistency_sum: f64,
    pub reliability_sum: f64,

    pub distribution: Option<Vec<usize>>,

    pub score_sum: f64,
    pub score_count: usize,
    pub latency_sum: f64,
    pub latency_count: usize,
}

impl Accumulator {
    /// Empty accumulator for a run set of size `k`.
    pub fn new(k: usize, track_distribution: bool) -> Self {
        Self {
            distribution: track_distribution.then(|| vec![0; k + 1]),
            ..Self::default()
        }
    }

    /// Fold one item's outcome into the item-level sums.
    pub fn absorb_item(mut self, outcome: ItemOutcome) -> Self {
        self.items_with_data += 1;
        if outcome.passed_any() {
            self.pass_at_k_count += 1;
        }
        if outcome.passed_all() {
            self.pass_hat_k_count += 1;
        }
        self.max_score_sum += outcome.max_score;

        if let (Some(consistency), Some(reliability)) =
            (outcome.consistency(), outcome.reliability())
        {
            self.items_with_multiple_runs += 1;
            self.consistency_sum += consistency;
            self.reliability_sum += reliability;
        }

        // Bucketed by observed pass count, even when fewer than K runs reported.
        if let Some(slot) = self
            .distribution
            .as_mut()
            .and_then(|d| d.get_mut(outcome.num_correct))
        {
            *slot += 1;
        }
        self
    }

    /// Fold one row-level score into the `avg_score` totals.
    pub fn absorb_score(mut self, score: f64) -> Self {
        self.score_sum += score;
        self.score_count += 1;
        self
    }

    /// Fold one row-level latency into the `avg_latency` totals.
    pub fn absorb_latency(mut self, latency_ms: f64) -> Self {
        self.latency_sum += latency_ms;
        self.latency_count += 1;
        self
    }
}
