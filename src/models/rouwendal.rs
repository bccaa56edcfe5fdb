//! Latent-class likelihood over a fixed VTT grid.
//!
//! A respondent of class `g` (VTT equal to grid point `g`) answers each
//! occasion consistently with probability `q`. Consistent means choosing FBE
//! exactly when `grid[g] > BVTT`.

use nalgebra::{DMatrix, DVector};

use crate::domain::ModelArrays;
use crate::math::{ln_sigmoid, log_sum_exp};

/// Number of consistent answers per respondent (rows) and grid point (columns).
pub fn match_counts(arrays: &ModelArrays, grid: &[f64]) -> DMatrix<f64> {
    let bvtt = arrays.bvtt();
    let choice = arrays.choice();
    DMatrix::from_fn(arrays.np(), grid.len(), |i, g| {
        (0..arrays.t())
            .filter(|&j| (grid[g] > bvtt[(i, j)]) == choice[(i, j)])
            .count() as f64
    })
}

/// Negative log-likelihood for `params = [logit(q), w_1, ..., w_G]`.
pub fn rouwendal_neg_ll(params: &DVector<f64>, matches: &DMatrix<f64>, t: usize) -> f64 {
    let ln_q = ln_sigmoid(params[0]);
    let ln_1mq = ln_sigmoid(-params[0]);
    let weights: Vec<f64> = params.iter().skip(1).copied().collect();
    let lse_w = log_sum_exp(&weights);
    let ln_f: Vec<f64> = weights.iter().map(|w| w - lse_w).collect();

    let t = t as f64;
    let mut terms = vec![0.0; ln_f.len()];
    let mut ll = 0.0;
    for i in 0..matches.nrows() {
        for (g, term) in terms.iter_mut().enumerate() {
            let m = matches[(i, g)];
            *term = ln_f[g] + m * ln_q + (t - m) * ln_1mq;
        }
        ll += log_sum_exp(&terms);
    }
    -ll
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrays() -> ModelArrays {
        let bvtt = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 1.0, 3.0]);
        let choice = DMatrix::from_row_slice(2, 2, &[true, false, true, true]);
        ModelArrays::new(bvtt, choice, vec![1.0, 2.0])
    }

    #[test]
    fn matches_count_consistent_answers() {
        let m = match_counts(&arrays(), &[0.0, 2.0, 4.0]);
        assert_eq!(m.row(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 1.0]);
        assert_eq!(m.row(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn perfect_consistency_matches_direct_computation() {
        let m = match_counts(&arrays(), &[0.0, 2.0, 4.0]);
        let params = DVector::from_vec(vec![0.0, 0.0, 0.0, 0.0]);
        // q = 0.5: every class gives 0.25 per respondent.
        let expected = -2.0 * 0.25f64.ln();
        assert!((rouwendal_neg_ll(&params, &m, 2) - expected).abs() < 1e-12);
    }

    #[test]
    fn long_panels_do_not_underflow() {
        let m = DMatrix::from_element(3, 4, 0.0);
        let params = DVector::from_vec(vec![8.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(rouwendal_neg_ll(&params, &m, 500).is_finite());
    }
}
