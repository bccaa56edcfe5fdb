//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - logical survey variables and their column mapping (`Var`, `VarsMapping`)
//! - validated choice arrays (`ModelArrays`) and their summary (`DescriptiveStats`)
//! - per-family estimator configurations (`ModelConfig` and friends)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
