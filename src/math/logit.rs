//! Logistic link helpers shared by the likelihoods.

/// Utilities are clipped at this magnitude before exponentiation.
pub const UTILITY_CLIP: f64 = 700.0;

pub fn clip_utility(v: f64) -> f64 {
    v.clamp(-UTILITY_CLIP, UTILITY_CLIP)
}

/// Logistic function `1 / (1 + e^-v)` on a clipped argument.
pub fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-clip_utility(v)).exp())
}

/// `ln σ(v)`, accurate for large negative `v`.
pub fn ln_sigmoid(v: f64) -> f64 {
    if v >= 0.0 { -(-v).exp().ln_1p() } else { v - v.exp().ln_1p() }
}

pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// `ln Σ exp(a_i)` without overflow. Empty input gives `-inf`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Softmax of `weights`.
pub fn softmax(weights: &[f64]) -> Vec<f64> {
    let lse = log_sum_exp(weights);
    weights.iter().map(|w| (w - lse).exp()).collect()
}

/// Log-likelihood of a binary outcome with `P(outcome) = σ(v)`.
///
/// Evaluated in log space, so a badly wrong index costs about `-|v|` instead
/// of underflowing to `ln 0`.
pub fn logit_ll(v: f64, outcome: bool) -> f64 {
    if outcome { ln_sigmoid(v) } else { ln_sigmoid(-v) }
}

/// Log-likelihood of a binary outcome with success probability `p`.
pub fn bernoulli_ll(p: f64, outcome: bool) -> f64 {
    if outcome { p.ln() } else { (1.0 - p).ln() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_clipped_and_symmetric() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
        assert!(sigmoid(1e6).is_finite());
        assert!(sigmoid(-1e6) >= 0.0);
        assert!((logit(sigmoid(1.3)) - 1.3).abs() < 1e-12);
        assert!((ln_sigmoid(0.7) - sigmoid(0.7).ln()).abs() < 1e-14);
        assert!((ln_sigmoid(-800.0) + 800.0).abs() < 1e-9);
    }

    #[test]
    fn softmax_sums_to_one_for_large_weights() {
        let p = softmax(&[1000.0, 1000.0, 999.0]);
        let total: f64 = p.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((p[0] - p[1]).abs() < 1e-15);
    }

    #[test]
    fn impossible_outcomes_are_not_free() {
        assert_eq!(bernoulli_ll(0.0, true), f64::NEG_INFINITY);
        assert_eq!(bernoulli_ll(1.0, false), f64::NEG_INFINITY);
        assert!((bernoulli_ll(0.5, true) - 0.5f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn logit_ll_stays_finite_far_from_the_data() {
        assert!((logit_ll(800.0, false) + 800.0).abs() < 1e-9);
        assert!((logit_ll(-800.0, true) + 800.0).abs() < 1e-9);
        assert!(logit_ll(800.0, true) <= 0.0);
        assert!((logit_ll(0.3, true) - sigmoid(0.3).ln()).abs() < 1e-14);
        assert!((logit_ll(0.3, false) - (1.0 - sigmoid(0.3)).ln()).abs() < 1e-14);
    }
}
