use nalgebra::DVector;

use crate::math::logit_ll;

/// Pooled random-valuation negative log-likelihood, `params = [scale, vtt]`.
///
/// `P(FBE) = σ(scale·(VTT − BVTT))` on every occasion.
pub fn rv_neg_ll(params: &DVector<f64>, bvtt: &[f64], fbe: &[bool]) -> f64 {
    let (scale, vtt) = (params[0], params[1]);
    -bvtt
        .iter()
        .zip(fbe)
        .map(|(&b, &y)| logit_ll(scale * (vtt - b), y))
        .sum::<f64>()
}
