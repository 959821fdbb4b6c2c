//! Review quality with Bayesian shrinkage toward the global mean.

use crate::models::ReviewAggregate;

/// Review scores are on a 1..=10 scale
const SCORE_SCALE: f64 = 10.0;

/// Normalised global mean, or `fallback` when nothing has been reviewed yet
pub fn baseline(global_mean_score: Option<f64>, fallback: f64) -> f64 {
    global_mean_score
        .map(|mean| mean / SCORE_SCALE)
        .unwrap_or(fallback)
}

/// `(m * baseline + n * raw) / (m + n)` where `raw` is the course mean over 10
///
/// An unreviewed course scores exactly `baseline`.
pub fn smoothed(review: Option<&ReviewAggregate>, baseline: f64, prior_strength: f64) -> f64 {
    let Some(review) = review.filter(|r| r.count > 0) else {
        return baseline;
    };

    let n = review.count as f64;
    let raw = review.mean_score / SCORE_SCALE;
    let denominator = prior_strength + n;

    (prior_strength * baseline + n * raw) / denominator
}
