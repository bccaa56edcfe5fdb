use nalgebra::DVector;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{ConfigRouwendal, ModelArrays};
use crate::error::VttError;
use crate::fit::{
    CancelFlag, Estimate, Estimator, FitSummary, StepCdf, ensure_valid, linspace, midpoints, predicted_vtt, run_rng,
};
use crate::math::{MinimizeOptions, hessian, logit, minimize, sigmoid, softmax, standard_errors};
use crate::models::{match_counts, rouwendal_neg_ll};

const MAX_ITERATIONS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouwendalEstimate {
    /// Probability of consistent choice on the logit scale.
    pub q_est: f64,
    pub q_se: f64,
    pub q_prob: f64,
    /// Delta-method standard error of `q_prob`.
    pub q_prob_se: f64,
    pub weights: Vec<f64>,
    pub weights_se: Vec<f64>,
    /// Probability mass at each grid point.
    pub fvtt: Vec<f64>,
    pub grid: Vec<f64>,
    /// `cumsum(fvtt)`, ending at exactly 1.
    pub cdf: Vec<f64>,
    /// Bin edges around the grid points.
    pub midpoints: Vec<f64>,
    pub step_cdf: StepCdf,
    pub vtt: Vec<f64>,
    pub summary: FitSummary,
}

pub fn run_rouwendal(
    arrays: &ModelArrays,
    config: &ConfigRouwendal,
    cancel: &CancelFlag,
) -> Result<RouwendalEstimate, VttError> {
    ensure_valid(config.validate())?;
    cancel.check()?;

    let grid = linspace(config.minimum, config.maximum, config.support_points as usize);
    debug!(points = grid.len(), min = config.minimum, max = config.maximum, "support grid created");

    let matches = match_counts(arrays, &grid);
    let t = arrays.t();
    let objective = |p: &DVector<f64>| rouwendal_neg_ll(p, &matches, t);

    let mut x0 = DVector::zeros(grid.len() + 1);
    x0[0] = logit(config.start_q);
    let min = minimize(&objective, &x0, &MinimizeOptions::with_max_iter(MAX_ITERATIONS));
    cancel.check()?;

    let se = standard_errors(&hessian(&objective, &min.x));
    let summary = FitSummary::from_minimum(&min);
    if !summary.status.is_converged() {
        warn!(status = summary.status.description(), "Rouwendal model did not converge");
    }

    let q_est = min.x[0];
    let q_prob = sigmoid(q_est);
    let weights: Vec<f64> = min.x.iter().skip(1).copied().collect();
    let fvtt = softmax(&weights);
    let cdf = normalized_cumsum(&fvtt);

    let edges = midpoints(&grid);
    let mut bins = Vec::with_capacity(cdf.len() + 1);
    bins.push(0.0);
    bins.extend_from_slice(&cdf);
    let mut rng = run_rng(config.seed);
    let vtt = predicted_vtt(&bins, &edges, arrays.np(), &mut rng);

    info!(q = q_prob, ll = summary.final_ll, "Rouwendal model estimated");

    Ok(RouwendalEstimate {
        q_est,
        q_se: se[0],
        q_prob,
        q_prob_se: q_prob * (1.0 - q_prob) * se[0],
        weights,
        weights_se: se[1..].to_vec(),
        fvtt,
        step_cdf: StepCdf {
            x: edges.clone(),
            y: bins,
        },
        grid,
        cdf,
        midpoints: edges,
        vtt,
        summary,
    })
}

/// Cumulative sum rescaled so the last entry is exactly 1.
fn normalized_cumsum(mass: &[f64]) -> Vec<f64> {
    let total: f64 = mass.iter().sum();
    let mut acc = 0.0;
    let mut out: Vec<f64> = mass
        .iter()
        .map(|m| {
            acc += m / total;
            acc
        })
        .collect();
    if let Some(last) = out.last_mut() {
        *last = 1.0;
    }
    out
}

impl Estimator for ConfigRouwendal {
    fn estimate(&self, arrays: &ModelArrays, cancel: &CancelFlag) -> Result<Estimate, VttError> {
        run_rouwendal(arrays, self, cancel).map(Estimate::Rouwendal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumsum_ends_at_one() {
        let cdf = normalized_cumsum(&[0.1, 0.2, 0.3, 0.4000000001]);
        assert_eq!(*cdf.last().unwrap(), 1.0);
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn zero_support_points_are_refused() {
        let arrays = ModelArrays::new(
            nalgebra::DMatrix::from_element(1, 2, 1.0),
            nalgebra::DMatrix::from_element(1, 2, true),
            vec![1.0],
        );
        let cfg = ConfigRouwendal {
            minimum: 0.0,
            maximum: 1.0,
            support_points: 0,
            start_q: 0.9,
            seed: None,
        };
        let err = run_rouwendal(&arrays, &cfg, &CancelFlag::new()).unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["No. of support points must be greater than zero.".to_string()]
        );
    }

    #[test]
    fn seeded_runs_draw_the_same_vtt_sample() {
        let bvtt = nalgebra::DMatrix::from_row_slice(3, 2, &[1.0, 4.0, 2.0, 6.0, 3.0, 8.0]);
        let choice = nalgebra::DMatrix::from_row_slice(3, 2, &[true, false, true, true, true, false]);
        let arrays = ModelArrays::new(bvtt, choice, vec![1.0, 2.0, 3.0]);
        let cfg = ConfigRouwendal {
            minimum: 0.0,
            maximum: 9.0,
            support_points: 4,
            start_q: 0.9,
            seed: Some(8),
        };
        let a = run_rouwendal(&arrays, &cfg, &CancelFlag::new()).unwrap();
        let b = run_rouwendal(&arrays, &cfg, &CancelFlag::new()).unwrap();
        assert!(!a.vtt.is_empty());
        assert_eq!(a.vtt, b.vtt);
    }
}
