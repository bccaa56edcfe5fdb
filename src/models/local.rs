//! Objectives of the kernel estimators.

use nalgebra::DVector;

use crate::math::{bernoulli_ll, logit_ll, nadaraya_watson_loo};

/// Observations inside one local-logit window.
#[derive(Debug, Clone, Default)]
pub struct LocalWindow {
    /// `BVTT − x0`.
    pub dx: Vec<f64>,
    pub fbe: Vec<bool>,
    pub weight: Vec<f64>,
}

impl LocalWindow {
    pub fn is_empty(&self) -> bool {
        self.dx.is_empty()
    }
}

/// Kernel-weighted negative log-likelihood, `P(FBE) = σ(c0 + c1·dx)`.
pub fn local_logit_neg_ll(params: &DVector<f64>, window: &LocalWindow) -> f64 {
    let (c0, c1) = (params[0], params[1]);
    let mut ll = 0.0;
    for ((&dx, &y), &w) in window.dx.iter().zip(&window.fbe).zip(&window.weight) {
        ll += w * logit_ll(c0 + c1 * dx, y);
    }
    -ll
}

/// Klein–Spady leave-one-out quasi-likelihood for `params = [ln γ]`.
///
/// `cheap[i]` is the cheap-slow indicator; each observation is predicted from
/// all others with bandwidth `h / γ`. Predictions are trimmed away from 0 and
/// 1, and observations without neighbours fall back to the sample share.
pub fn klein_spady_neg_ll(params: &DVector<f64>, bvtt: &[f64], cheap: &[f64], h: f64) -> f64 {
    let gamma = params[0].clamp(-30.0, 30.0).exp();
    let share = cheap.iter().sum::<f64>() / cheap.len().max(1) as f64;
    let fit = nadaraya_watson_loo(bvtt, cheap, h / gamma);
    -fit.iter()
        .zip(cheap)
        .map(|(&p, &y)| {
            let p = if p.is_finite() { p } else { share };
            bernoulli_ll(p.clamp(KS_TRIM, 1.0 - KS_TRIM), y > 0.5)
        })
        .sum::<f64>()
}

const KS_TRIM: f64 = 1e-6;
