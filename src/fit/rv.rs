use nalgebra::DVector;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{ConfigRv, ModelArrays};
use crate::error::VttError;
use crate::fit::{CancelFlag, Coefficient, Estimate, Estimator, FitSummary, ensure_valid};
use crate::math::{MinimizeOptions, hessian, minimize, standard_errors};
use crate::models::rv_neg_ll;

/// Random valuation: one population VTT with logistic noise on `VTT − BVTT`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RvEstimate {
    /// `scale`, `vtt`.
    pub coefficients: Vec<Coefficient>,
    pub summary: FitSummary,
}

impl RvEstimate {
    pub fn vtt(&self) -> f64 {
        self.coefficients[1].estimate
    }
}

pub fn run_rv(arrays: &ModelArrays, config: &ConfigRv, cancel: &CancelFlag) -> Result<RvEstimate, VttError> {
    ensure_valid(config.validate())?;
    cancel.check()?;

    let bvtt = arrays.bvtt_flat();
    let fbe = arrays.choice_flat();
    let objective = |p: &DVector<f64>| rv_neg_ll(p, &bvtt, &fbe);

    let x0 = DVector::from_vec(vec![config.start_scale, config.start_vtt]);
    let min = minimize(&objective, &x0, &MinimizeOptions::with_max_iter(config.max_iterations as usize));
    cancel.check()?;

    let se = standard_errors(&hessian(&objective, &min.x));
    let summary = FitSummary::from_minimum(&min);
    if !summary.status.is_converged() {
        warn!(status = summary.status.description(), "random valuation model did not converge");
    }
    info!(vtt = min.x[1], ll = summary.final_ll, "random valuation model estimated");

    Ok(RvEstimate {
        coefficients: vec![
            Coefficient::new("scale", min.x[0], se[0]),
            Coefficient::new("vtt", min.x[1], se[1]),
        ],
        summary,
    })
}

impl Estimator for ConfigRv {
    fn estimate(&self, arrays: &ModelArrays, cancel: &CancelFlag) -> Result<Estimate, VttError> {
        run_rv(arrays, self, cancel).map(Estimate::Rv)
    }
}
