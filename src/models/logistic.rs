//! Binary logit on one held-out occasion per respondent.
//!
//! ```text
//! dV = scale·BVTT_held − scale·(intercept + parameter·cov)
//! P(cheap) = σ(dV)
//! ```
//!
//! where `cov` is the mean of `choice·BVTT` over the occasions that were not
//! held out.

use nalgebra::DVector;
use rand::Rng;

use crate::domain::ModelArrays;
use crate::math::logit_ll;

/// Per-respondent inputs of the logistic likelihood.
#[derive(Debug, Clone)]
pub struct HeldOutSample {
    pub bvtt_held: Vec<f64>,
    pub fbe_held: Vec<bool>,
    pub covariate: Vec<f64>,
}

/// Draw one held-out occasion per respondent, uniformly over all `T`.
///
/// Requires `T >= 2` so at least one occasion remains for the covariate.
pub fn draw_held_out<R: Rng + ?Sized>(arrays: &ModelArrays, rng: &mut R) -> HeldOutSample {
    let (np, t) = (arrays.np(), arrays.t());
    let bvtt = arrays.bvtt();
    let choice = arrays.choice();
    let mut sample = HeldOutSample {
        bvtt_held: Vec::with_capacity(np),
        fbe_held: Vec::with_capacity(np),
        covariate: Vec::with_capacity(np),
    };

    for i in 0..np {
        let held = rng.gen_range(0..t);
        let mut sum = 0.0;
        for j in (0..t).filter(|&j| j != held) {
            if choice[(i, j)] {
                sum += bvtt[(i, j)];
            }
        }
        sample.bvtt_held.push(bvtt[(i, held)]);
        sample.fbe_held.push(choice[(i, held)]);
        sample.covariate.push(sum / (t - 1) as f64);
    }
    sample
}

/// Negative log-likelihood for `params = [scale, intercept, parameter]`.
pub fn logistic_neg_ll(params: &DVector<f64>, data: &HeldOutSample) -> f64 {
    let (scale, intercept, parameter) = (params[0], params[1], params[2]);
    let mut ll = 0.0;
    for ((&b, &fbe), &cov) in data.bvtt_held.iter().zip(&data.fbe_held).zip(&data.covariate) {
        let dv = scale * b - scale * (intercept + parameter * cov);
        ll += logit_ll(dv, !fbe);
    }
    -ll
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn covariate_excludes_held_out_occasion() {
        let bvtt = DMatrix::from_row_slice(1, 3, &[2.0, 4.0, 6.0]);
        let choice = DMatrix::from_row_slice(1, 3, &[true, true, true]);
        let arrays = ModelArrays::new(bvtt, choice, vec![1.0]);
        let mut rng = StdRng::seed_from_u64(3);
        let sample = draw_held_out(&arrays, &mut rng);

        let held = sample.bvtt_held[0];
        let expected = (12.0 - held) / 2.0;
        assert!((sample.covariate[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn neg_ll_is_ln2_per_obs_at_zero_scale() {
        let data = HeldOutSample {
            bvtt_held: vec![1.0, 5.0],
            fbe_held: vec![true, false],
            covariate: vec![0.5, 0.5],
        };
        let v = logistic_neg_ll(&DVector::from_vec(vec![0.0, 1.0, 1.0]), &data);
        assert!((v - 2.0 * std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn saturated_wrong_predictions_cost_their_full_utility() {
        let data = HeldOutSample {
            bvtt_held: vec![2.0, 9.0],
            fbe_held: vec![false, true],
            covariate: vec![1.0, 1.0],
        };
        // dV = 100·(b − 10): the first respondent chose cheap at dV = −800.
        let v = logistic_neg_ll(&DVector::from_vec(vec![100.0, 10.0, 0.0]), &data);
        assert!((v - 800.0).abs() < 1e-6, "neg ll {v}");
    }
}
