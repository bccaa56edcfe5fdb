//! Local logit estimator.
//!
//! At each grid point `x0` (except the last) a logit of the FBE indicator on
//! `BVTT − x0` is fitted with triangular weights of width one grid step. The
//! fitted probability at `x0` is `1 − F(x0)`.

use nalgebra::DVector;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{ConfigLocLogit, ModelArrays};
use crate::error::VttError;
use crate::fit::{
    CancelFlag, Estimate, Estimator, StepCdf, ensure_valid, linspace, predicted_vtt, run_rng,
};
use crate::math::{MinimizeOptions, MinimizeStatus, minimize, sigmoid, triangular};
use crate::models::{LocalWindow, local_logit_neg_ll};

const MAX_ITERATIONS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocLogitEstimate {
    /// Evaluated grid points (all but the last support point).
    pub grid: Vec<f64>,
    pub cdf: Vec<f64>,
    pub intercepts: Vec<f64>,
    pub slopes: Vec<f64>,
    pub statuses: Vec<MinimizeStatus>,
    pub kernel_width: f64,
    /// Sum of the local log-likelihoods.
    pub ll: f64,
    pub step_cdf: StepCdf,
    pub vtt: Vec<f64>,
}

#[derive(Debug, Clone)]
struct LocalFit {
    intercept: f64,
    slope: f64,
    fval: f64,
    status: MinimizeStatus,
}

pub fn run_loclogit(
    arrays: &ModelArrays,
    config: &ConfigLocLogit,
    cancel: &CancelFlag,
) -> Result<LocLogitEstimate, VttError> {
    ensure_valid(config.validate())?;
    cancel.check()?;

    let support = linspace(config.minimum, config.maximum, config.support_points as usize);
    let k = support[1] - support[0];
    let points = &support[..support.len() - 1];
    debug!(points = points.len(), kernel_width = k, "local logit grid created");

    let bvtt = arrays.bvtt_flat();
    let fbe = arrays.choice_flat();

    // Grid points are independent; evaluate them in parallel.
    let fits = points
        .par_iter()
        .map(|&x0| {
            cancel.check()?;
            Ok(fit_point(&bvtt, &fbe, x0, k))
        })
        .collect::<Result<Vec<LocalFit>, VttError>>()?;

    let cdf: Vec<f64> = fits.iter().map(|f| 1.0 - sigmoid(f.intercept)).collect();
    let ll = -fits.iter().map(|f| f.fval).filter(|v| v.is_finite()).sum::<f64>();
    let unconverged = fits.iter().filter(|f| !f.status.is_converged()).count();
    if unconverged > 0 {
        warn!(unconverged, "local logit did not converge at every grid point");
    }

    let mut rng = run_rng(config.seed);
    let vtt = predicted_vtt(&cdf, points, arrays.np(), &mut rng);
    info!(ll, draws = vtt.len(), "local logit estimated");

    Ok(LocLogitEstimate {
        step_cdf: StepCdf::padded(points, &cdf, config.maximum),
        grid: points.to_vec(),
        intercepts: fits.iter().map(|f| f.intercept).collect(),
        slopes: fits.iter().map(|f| f.slope).collect(),
        statuses: fits.iter().map(|f| f.status).collect(),
        cdf,
        kernel_width: k,
        ll,
        vtt,
    })
}

fn fit_point(bvtt: &[f64], fbe: &[bool], x0: f64, k: f64) -> LocalFit {
    let mut window = LocalWindow::default();
    for (&b, &y) in bvtt.iter().zip(fbe) {
        let w = triangular(b - x0, k);
        if w > 0.0 {
            window.dx.push(b - x0);
            window.fbe.push(y);
            window.weight.push(w);
        }
    }

    if window.is_empty() {
        warn!(x0, "no observations within one kernel width of grid point");
        return LocalFit {
            intercept: f64::NAN,
            slope: f64::NAN,
            fval: f64::NAN,
            status: MinimizeStatus::StepSizeExhausted,
        };
    }

    let objective = |p: &DVector<f64>| local_logit_neg_ll(p, &window);
    let min = minimize(objective, &DVector::zeros(2), &MinimizeOptions::with_max_iter(MAX_ITERATIONS));
    LocalFit {
        intercept: min.x[0],
        slope: min.x[1],
        fval: min.fx,
        status: min.status,
    }
}

impl Estimator for ConfigLocLogit {
    fn estimate(&self, arrays: &ModelArrays, cancel: &CancelFlag) -> Result<Estimate, VttError> {
        run_loclogit(arrays, self, cancel).map(Estimate::LocLogit)
    }
}
