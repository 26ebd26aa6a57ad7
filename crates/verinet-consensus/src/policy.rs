// crates/verinet-consensus/src/policy.rs
//
// Aggregation policies: how a set of admitted accuracies becomes one score.
//
// Every policy rounds half-up to an integer; the threshold comparison stays
// in the aggregator so all policies share the same decision rule.

/// Combines admitted claim accuracies (each 0..=100) into one score.
pub trait AggregationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `None` only for an empty input.
    fn score(&self, accuracies: &[u8]) -> Option<u8>;
}

/// Arithmetic mean rounded half-up, in integer arithmetic.
pub fn round_half_up_mean(values: &[u8]) -> Option<u8> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as u64;
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    // floor(sum / n + 1/2)
    let mean = (2 * sum + n) / (2 * n);
    u8::try_from(mean).ok()
}

/// Unweighted mean of every claim. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanPolicy;

impl AggregationPolicy for MeanPolicy {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn score(&self, accuracies: &[u8]) -> Option<u8> {
        round_half_up_mean(accuracies)
    }
}

/// Mean after discarding the `trim` lowest and `trim` highest accuracies.
///
/// Falls back to the plain mean when fewer than `2 * trim + 1` claims remain.
#[derive(Debug, Clone, Copy)]
pub struct TrimmedMeanPolicy {
    pub trim: usize,
}

impl TrimmedMeanPolicy {
    pub fn new(trim: usize) -> Self {
        Self { trim }
    }
}

impl AggregationPolicy for TrimmedMeanPolicy {
    fn name(&self) -> &'static str {
        "trimmed-mean"
    }

    fn score(&self, accuracies: &[u8]) -> Option<u8> {
        if accuracies.len() <= 2 * self.trim {
            return round_half_up_mean(accuracies);
        }
        let mut sorted = accuracies.to_vec();
        sorted.sort_unstable();
        round_half_up_mean(&sorted[self.trim..sorted.len() - self.trim])
    }
}
