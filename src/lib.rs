//! `vtt-np` library crate.
//!
//! Estimates the distribution of the value of travel time (VTT) from panels of
//! binary stated-choice data. The binary (`vtt`) is a thin wrapper around this
//! library so that:
//!
//! - estimators are testable without spawning processes
//! - data preparation and estimation can be driven from other front-ends

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod nn;
pub mod report;
