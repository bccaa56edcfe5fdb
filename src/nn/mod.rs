//! Neural-network classifier used by the simulation-based estimator.

pub mod mlp;

pub use mlp::*;
