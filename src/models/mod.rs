//! Likelihoods of the estimator families.
//!
//! Objectives are small, pure functions of a parameter vector and explicitly
//! passed data so that the minimizer and the numeric Hessian can share them.

pub mod local;
pub mod logistic;
pub mod rouwendal;
pub mod rv;

pub use local::*;
pub use logistic::*;
pub use rouwendal::*;
pub use rv::*;
