//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - maps flags into an estimator configuration
//! - runs the shared pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::warn;

use crate::cli::{
    AnnArgs, Command, DataArgs, DescribeArgs, ExportArgs, LConstantArgs, LocLogitArgs, LogisticArgs, RouwendalArgs,
    RvArgs,
};
use crate::domain::{ConfigAnn, ConfigLConstant, ConfigLocLogit, ConfigLogistic, ConfigRouwendal, ConfigRv, ModelConfig};
use crate::error::{AppError, VttError};
use crate::fit::CancelFlag;

pub mod pipeline;

/// Entry point for the `vtt` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse_from(std::env::args());

    match cli.command {
        Command::Describe(args) => handle_describe(&args),
        Command::Logistic(args) => handle_estimate(&args.data, &args.export, logistic_config_from_args(&args)),
        Command::Rv(args) => handle_estimate(&args.data, &args.export, rv_config_from_args(&args)),
        Command::Rouwendal(args) => handle_estimate(&args.data, &args.export, rouwendal_config_from_args(&args)),
        Command::Loclogit(args) => handle_estimate(&args.data, &args.export, loclogit_config_from_args(&args)),
        Command::Lconstant(args) => handle_estimate(&args.data, &args.export, lconstant_config_from_args(&args)),
        Command::Ann(args) => handle_estimate(&args.data, &args.export, ann_config_from_args(&args)),
    }
}

fn handle_describe(args: &DescribeArgs) -> Result<(), AppError> {
    let data = pipeline::prepare_data(&args.data)?;
    println!("{}", crate::report::format_descriptives(&data.descriptives));
    Ok(())
}

fn handle_estimate(data: &DataArgs, export: &ExportArgs, config: ModelConfig) -> Result<(), AppError> {
    // Reject bad flags before touching the data file.
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(VttError::Config(errors).into());
    }

    let run = pipeline::run_estimate(data, &config, &CancelFlag::new())?;

    println!("{}", crate::report::format_descriptives(&run.data.descriptives));
    println!("{}", crate::report::format_estimate(&run.estimate));

    if let Some(path) = &export.export_vtt {
        crate::io::export::write_vtt_csv(path, &run.estimate, run.data.arrays.id())?;
    }
    if let Some(path) = &export.export_cdf {
        match run.estimate.cdf() {
            Some((grid, cdf)) => crate::io::export::write_cdf_csv(path, grid, cdf)?,
            None => warn!(model = config.display_name(), "model has no CDF; --export-cdf ignored"),
        }
    }
    if let Some(path) = &export.export_json {
        crate::io::export::write_estimate_json(path, &run.estimate, run.data.arrays.np())?;
    }

    Ok(())
}

pub fn logistic_config_from_args(args: &LogisticArgs) -> ModelConfig {
    ModelConfig::Logistic(ConfigLogistic {
        start_scale: args.start_scale,
        start_intercept: args.start_intercept,
        start_parameter: args.start_parameter,
        max_iterations: args.max_iterations,
        seed: args.seed,
    })
}

pub fn rv_config_from_args(args: &RvArgs) -> ModelConfig {
    ModelConfig::Rv(ConfigRv {
        start_scale: args.start_scale,
        start_vtt: args.start_vtt,
        max_iterations: args.max_iterations,
    })
}

pub fn rouwendal_config_from_args(args: &RouwendalArgs) -> ModelConfig {
    ModelConfig::Rouwendal(ConfigRouwendal {
        minimum: args.grid.minimum,
        maximum: args.grid.maximum,
        support_points: args.grid.support_points,
        start_q: args.start_q,
        seed: args.grid.seed,
    })
}

pub fn loclogit_config_from_args(args: &LocLogitArgs) -> ModelConfig {
    ModelConfig::LocLogit(ConfigLocLogit {
        minimum: args.grid.minimum,
        maximum: args.grid.maximum,
        support_points: args.grid.support_points,
        seed: args.grid.seed,
    })
}

pub fn lconstant_config_from_args(args: &LConstantArgs) -> ModelConfig {
    ModelConfig::LConstant(ConfigLConstant {
        minimum: args.grid.minimum,
        maximum: args.grid.maximum,
        support_points: args.grid.support_points,
        kernel_width: args.kernel_width,
        leave_one_out: args.leave_one_out,
        seed: args.grid.seed,
    })
}

pub fn ann_config_from_args(args: &AnnArgs) -> ModelConfig {
    ModelConfig::Ann(ConfigAnn {
        hidden_layers: args.hidden_layers.clone(),
        training_repeats: args.training_repeats,
        shuffles_per_repeat: args.shuffles_per_repeat,
        simulation_draws: args.simulation_draws,
        max_epochs: args.max_epochs,
        seed: args.seed,
    })
}
