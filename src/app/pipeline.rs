//! Shared estimation pipeline used by every subcommand.
//!
//! load -> map/build arrays -> descriptives -> estimate
//!
//! Subcommands only differ in the configuration they pass in and in how they
//! present the result.

use tracing::info;

use crate::cli::DataArgs;
use crate::data::{build_model_arrays, compute_descriptives};
use crate::domain::{DescriptiveStats, ModelArrays, ModelConfig, VarsMapping};
use crate::error::AppError;
use crate::fit::{CancelFlag, Estimate};
use crate::io::load_dataset;

/// Validated arrays and their descriptive statistics.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub arrays: ModelArrays,
    pub descriptives: DescriptiveStats,
}

/// All computed outputs of a single estimation run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: PreparedData,
    pub estimate: Estimate,
}

pub fn mapping_from_args(args: &DataArgs) -> VarsMapping {
    VarsMapping::new(&args.id, &args.chosen, &args.cost1, &args.time1, &args.cost2, &args.time2)
}

/// Load the data file and build validated model arrays.
pub fn prepare_data(args: &DataArgs) -> Result<PreparedData, AppError> {
    let delimiter = match args.delimiter {
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => return Err(AppError::new(2, format!("Delimiter '{c}' is not a single-byte character."))),
        None => None,
    };
    let dataset = load_dataset(&args.data, delimiter)?;
    let arrays = build_model_arrays(&dataset, &mapping_from_args(args))?;
    let descriptives = compute_descriptives(&arrays);
    info!(np = arrays.np(), t = arrays.t(), "choice data validated");

    Ok(PreparedData { arrays, descriptives })
}

/// Execute the full pipeline for one estimator configuration.
pub fn run_estimate(args: &DataArgs, config: &ModelConfig, cancel: &CancelFlag) -> Result<RunOutput, AppError> {
    let data = prepare_data(args)?;
    info!(model = config.display_name(), "estimation started");
    let estimate = crate::fit::estimate(&data.arrays, config, cancel)?;

    Ok(RunOutput { data, estimate })
}
