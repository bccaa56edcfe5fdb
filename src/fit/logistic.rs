use nalgebra::DVector;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{ConfigLogistic, ModelArrays};
use crate::error::VttError;
use crate::fit::{
    CancelFlag, Coefficient, Estimate, Estimator, FitSummary, ensure_valid, require_occasions, run_rng,
};
use crate::math::{MinimizeOptions, hessian, minimize, standard_errors};
use crate::models::{draw_held_out, logistic_neg_ll};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticEstimate {
    /// `scale`, `intercept`, `parameter`.
    pub coefficients: Vec<Coefficient>,
    pub summary: FitSummary,
    /// Predicted VTT per respondent, `intercept + parameter·mean(choice·BVTT)`.
    pub vtt: Vec<f64>,
}

impl LogisticEstimate {
    pub fn intercept(&self) -> f64 {
        self.coefficients[1].estimate
    }

    pub fn parameter(&self) -> f64 {
        self.coefficients[2].estimate
    }
}

pub fn run_logistic(
    arrays: &ModelArrays,
    config: &ConfigLogistic,
    cancel: &CancelFlag,
) -> Result<LogisticEstimate, VttError> {
    ensure_valid(config.validate())?;
    require_occasions(arrays, 2, "Logistic regression")?;
    cancel.check()?;

    let mut rng = run_rng(config.seed);
    let sample = draw_held_out(arrays, &mut rng);
    let objective = |p: &DVector<f64>| logistic_neg_ll(p, &sample);

    let x0 = DVector::from_vec(vec![config.start_scale, config.start_intercept, config.start_parameter]);
    let opts = MinimizeOptions::with_max_iter(config.max_iterations as usize);
    let min = minimize(&objective, &x0, &opts);
    cancel.check()?;

    let se = standard_errors(&hessian(&objective, &min.x));
    let summary = FitSummary::from_minimum(&min);
    if !summary.status.is_converged() {
        warn!(status = summary.status.description(), "logistic regression did not converge");
    }
    info!(ll = summary.final_ll, iterations = summary.iterations, "logistic regression estimated");

    let coefficients = ["scale", "intercept", "parameter"]
        .into_iter()
        .enumerate()
        .map(|(i, name)| Coefficient::new(name, min.x[i], se[i]))
        .collect();

    let (intercept, parameter) = (min.x[1], min.x[2]);
    let vtt = arrays
        .mean_accepted_bvtt()
        .iter()
        .map(|&m| intercept + parameter * m)
        .collect();

    Ok(LogisticEstimate {
        coefficients,
        summary,
        vtt,
    })
}

impl Estimator for ConfigLogistic {
    fn estimate(&self, arrays: &ModelArrays, cancel: &CancelFlag) -> Result<Estimate, VttError> {
        run_logistic(arrays, self, cancel).map(Estimate::Logistic)
    }
}
