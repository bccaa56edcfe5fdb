//! Estimation of the VTT distribution.
//!
//! Responsibilities:
//!
//! - run one estimator family on validated arrays (`run_*` per family)
//! - dispatch over the closed set of configurations (`estimate`)
//! - turn estimated CDFs into synthetic VTT samples (`sampler`)

pub mod ann;
pub mod grid;
pub mod lconstant;
pub mod loclogit;
pub mod logistic;
pub mod rouwendal;
pub mod rv;
pub mod sampler;

pub use ann::*;
pub use grid::*;
pub use lconstant::*;
pub use loclogit::*;
pub use logistic::*;
pub use rouwendal::*;
pub use rv::*;
pub use sampler::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::domain::{ModelArrays, ModelConfig};
use crate::error::VttError;
use crate::math::{MinimizeStatus, Minimum};

/// Shared cancellation request, checked between independent work units.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<(), VttError> {
        if self.is_cancelled() { Err(VttError::Cancelled) } else { Ok(()) }
    }
}

/// A named point estimate with its standard error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_err: f64,
}

impl Coefficient {
    pub fn new(name: impl Into<String>, estimate: f64, std_err: f64) -> Self {
        Self {
            name: name.into(),
            estimate,
            std_err,
        }
    }
}

/// Log-likelihood at start and optimum plus how the optimizer stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSummary {
    pub initial_ll: f64,
    pub final_ll: f64,
    pub status: MinimizeStatus,
    pub status_code: u8,
    pub iterations: usize,
}

impl FitSummary {
    /// From a minimum of a negative log-likelihood.
    pub fn from_minimum(min: &Minimum) -> Self {
        Self {
            initial_ll: -min.f0,
            final_ll: -min.fx,
            status: min.status,
            status_code: min.status.code(),
            iterations: min.iterations,
        }
    }
}

/// Result of one estimator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum Estimate {
    Logistic(LogisticEstimate),
    Rv(RvEstimate),
    Rouwendal(RouwendalEstimate),
    LocLogit(LocLogitEstimate),
    LConstant(LConstantEstimate),
    Ann(AnnEstimate),
}

impl Estimate {
    /// Estimated CDF and the points it is defined on, for grid families.
    pub fn cdf(&self) -> Option<(&[f64], &[f64])> {
        match self {
            Estimate::Rouwendal(e) => Some((&e.grid, &e.cdf)),
            Estimate::LocLogit(e) => Some((&e.grid, &e.cdf)),
            Estimate::LConstant(e) => Some((&e.grid, &e.cdf)),
            Estimate::Logistic(_) | Estimate::Rv(_) | Estimate::Ann(_) => None,
        }
    }

    pub fn step_cdf(&self) -> Option<&StepCdf> {
        match self {
            Estimate::Rouwendal(e) => Some(&e.step_cdf),
            Estimate::LocLogit(e) => Some(&e.step_cdf),
            Estimate::LConstant(e) => Some(&e.step_cdf),
            Estimate::Logistic(_) | Estimate::Rv(_) | Estimate::Ann(_) => None,
        }
    }
}

/// Capability shared by every estimator configuration.
pub trait Estimator {
    fn estimate(&self, arrays: &ModelArrays, cancel: &CancelFlag) -> Result<Estimate, VttError>;
}

impl Estimator for ModelConfig {
    fn estimate(&self, arrays: &ModelArrays, cancel: &CancelFlag) -> Result<Estimate, VttError> {
        match self {
            ModelConfig::Logistic(c) => c.estimate(arrays, cancel),
            ModelConfig::Rv(c) => c.estimate(arrays, cancel),
            ModelConfig::Rouwendal(c) => c.estimate(arrays, cancel),
            ModelConfig::LocLogit(c) => c.estimate(arrays, cancel),
            ModelConfig::LConstant(c) => c.estimate(arrays, cancel),
            ModelConfig::Ann(c) => c.estimate(arrays, cancel),
        }
    }
}

/// Run the estimator selected by `config`.
pub fn estimate(arrays: &ModelArrays, config: &ModelConfig, cancel: &CancelFlag) -> Result<Estimate, VttError> {
    config.estimate(arrays, cancel)
}

fn ensure_valid(errors: Vec<String>) -> Result<(), VttError> {
    if errors.is_empty() { Ok(()) } else { Err(VttError::Config(errors)) }
}

fn require_occasions(arrays: &ModelArrays, min: usize, model: &str) -> Result<(), VttError> {
    if arrays.t() < min {
        return Err(VttError::InsufficientData(format!(
            "{model} needs at least {min} choice occasions per respondent, found {}.",
            arrays.t()
        )));
    }
    Ok(())
}

/// Per-run RNG: seeded when a seed is given, from entropy otherwise.
fn run_rng(seed: Option<i64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s.unsigned_abs()),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(flag.check().is_ok());
        other.cancel();
        assert_eq!(flag.check(), Err(VttError::Cancelled));
    }

    #[test]
    fn short_panels_are_insufficient() {
        let arrays = ModelArrays::new(
            nalgebra::DMatrix::from_element(2, 1, 1.0),
            nalgebra::DMatrix::from_element(2, 1, true),
            vec![1.0, 2.0],
        );
        assert!(matches!(
            require_occasions(&arrays, 2, "Logistic regression"),
            Err(VttError::InsufficientData(_))
        ));
    }
}
