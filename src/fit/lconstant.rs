//! Local constant (Nadaraya–Watson) estimator of the VTT CDF.
//!
//! `F(x0)` is the kernel-weighted share of cheap-slow choices among
//! occasions with BVTT near `x0`. With `leave_one_out`, the bandwidth is first
//! rescaled by the Klein–Spady index scale `γ`.

use nalgebra::DVector;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{ConfigLConstant, ModelArrays};
use crate::error::VttError;
use crate::fit::{
    CancelFlag, Coefficient, Estimate, Estimator, FitSummary, StepCdf, ensure_valid, linspace, predicted_vtt,
    run_rng,
};
use crate::math::{MinimizeOptions, hessian, minimize, nadaraya_watson, standard_errors};
use crate::models::klein_spady_neg_ll;

const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LConstantEstimate {
    pub grid: Vec<f64>,
    pub cdf: Vec<f64>,
    /// Bandwidth used for the final fit.
    pub bandwidth: f64,
    /// `ln γ` and its standard error when the leave-one-out step ran.
    pub index_scale: Option<Coefficient>,
    pub summary: Option<FitSummary>,
    pub step_cdf: StepCdf,
    pub vtt: Vec<f64>,
}

pub fn run_lconstant(
    arrays: &ModelArrays,
    config: &ConfigLConstant,
    cancel: &CancelFlag,
) -> Result<LConstantEstimate, VttError> {
    ensure_valid(config.validate())?;
    cancel.check()?;

    let support = linspace(config.minimum, config.maximum, config.support_points as usize);
    let points = &support[..support.len() - 1];
    debug!(points = points.len(), kernel_width = config.kernel_width, "local constant grid created");

    let bvtt = arrays.bvtt_flat();
    let cheap: Vec<f64> = arrays
        .choice_flat()
        .iter()
        .map(|&fbe| if fbe { 0.0 } else { 1.0 })
        .collect();

    let (bandwidth, index_scale, summary) = if config.leave_one_out {
        let objective = |p: &DVector<f64>| klein_spady_neg_ll(p, &bvtt, &cheap, config.kernel_width);
        let min = minimize(&objective, &DVector::zeros(1), &MinimizeOptions::with_max_iter(MAX_ITERATIONS));
        cancel.check()?;

        let se = standard_errors(&hessian(&objective, &min.x));
        let summary = FitSummary::from_minimum(&min);
        if !summary.status.is_converged() {
            warn!(status = summary.status.description(), "Klein-Spady index scale did not converge");
        }
        let gamma = min.x[0].clamp(-30.0, 30.0).exp();
        info!(gamma, "Klein-Spady index scale estimated");
        (
            config.kernel_width / gamma,
            Some(Coefficient::new("ln_gamma", min.x[0], se[0])),
            Some(summary),
        )
    } else {
        (config.kernel_width, None, None)
    };

    let cdf = points
        .par_iter()
        .map(|&x0| {
            cancel.check()?;
            Ok(nadaraya_watson(&bvtt, &cheap, x0, bandwidth))
        })
        .collect::<Result<Vec<f64>, VttError>>()?;

    let mut rng = run_rng(config.seed);
    let vtt = predicted_vtt(&cdf, points, arrays.np(), &mut rng);
    info!(bandwidth, draws = vtt.len(), "local constant estimated");

    Ok(LConstantEstimate {
        step_cdf: StepCdf::padded(points, &cdf, config.maximum),
        grid: points.to_vec(),
        cdf,
        bandwidth,
        index_scale,
        summary,
        vtt,
    })
}

impl Estimator for ConfigLConstant {
    fn estimate(&self, arrays: &ModelArrays, cancel: &CancelFlag) -> Result<Estimate, VttError> {
        run_lconstant(arrays, self, cancel).map(Estimate::LConstant)
    }
}
