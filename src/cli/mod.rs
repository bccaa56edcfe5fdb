//! Command-line parsing for the VTT distribution estimator.
//!
//! Argument parsing and command dispatch stay separate from the estimation
//! code: every subcommand only maps its flags into a configuration record.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vtt", version, about = "Value-of-travel-time distribution estimation from binary choice data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the data and print descriptive statistics.
    Describe(DescribeArgs),
    /// Logistic regression with a held-out occasion as covariate.
    Logistic(LogisticArgs),
    /// Random valuation model with a single VTT.
    Rv(RvArgs),
    /// Latent-class (Rouwendal) model on a fixed support.
    Rouwendal(RouwendalArgs),
    /// Local logit CDF on a grid.
    Loclogit(LocLogitArgs),
    /// Local constant (Nadaraya-Watson) CDF on a grid.
    Lconstant(LConstantArgs),
    /// Simulation-based estimation with a neural classifier.
    Ann(AnnArgs),
}

/// Input file and column mapping shared by all commands.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Delimited choice data file.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Field delimiter; sniffed from the header when omitted.
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Respondent id column.
    #[arg(long, default_value = "RespID")]
    pub id: String,

    /// Chosen alternative column (1 or 2).
    #[arg(long, default_value = "Chosen")]
    pub chosen: String,

    /// Cost of alternative 1.
    #[arg(long, default_value = "CostL")]
    pub cost1: String,

    /// Travel time of alternative 1.
    #[arg(long, default_value = "TimeL")]
    pub time1: String,

    /// Cost of alternative 2.
    #[arg(long, default_value = "CostR")]
    pub cost2: String,

    /// Travel time of alternative 2.
    #[arg(long, default_value = "TimeR")]
    pub time2: String,
}

/// Optional result exports.
#[derive(Debug, Args, Clone, Default)]
pub struct ExportArgs {
    /// Export respondent-level VTT (or simulated draws) to CSV.
    #[arg(long = "export-vtt")]
    pub export_vtt: Option<PathBuf>,

    /// Export the estimated CDF to CSV (grid families only).
    #[arg(long = "export-cdf")]
    pub export_cdf: Option<PathBuf>,

    /// Export the full estimate to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

/// VTT support for the grid-based families.
#[derive(Debug, Args, Clone)]
pub struct GridArgs {
    /// Lower end of the VTT support.
    #[arg(long, default_value_t = 0.0)]
    pub minimum: f64,

    /// Upper end of the VTT support.
    #[arg(long, default_value_t = 20.0)]
    pub maximum: f64,

    /// Number of support points.
    #[arg(long, default_value_t = 21)]
    pub support_points: i64,

    /// Seed for the simulated VTT sample; random when omitted.
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,
}

#[derive(Debug, Args, Clone)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

#[derive(Debug, Args, Clone)]
pub struct LogisticArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[command(flatten)]
    pub export: ExportArgs,

    #[arg(long, default_value_t = 1.0)]
    pub start_scale: f64,

    #[arg(long, default_value_t = 0.1)]
    pub start_intercept: f64,

    #[arg(long, default_value_t = 1.0)]
    pub start_parameter: f64,

    #[arg(long, default_value_t = 100)]
    pub max_iterations: i64,

    /// Seed for drawing the held-out occasion; random when omitted.
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,
}

#[derive(Debug, Args, Clone)]
pub struct RvArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[command(flatten)]
    pub export: ExportArgs,

    #[arg(long, default_value_t = 1.0)]
    pub start_scale: f64,

    #[arg(long, default_value_t = 1.0)]
    pub start_vtt: f64,

    #[arg(long, default_value_t = 100)]
    pub max_iterations: i64,
}

#[derive(Debug, Args, Clone)]
pub struct RouwendalArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[command(flatten)]
    pub export: ExportArgs,
    #[command(flatten)]
    pub grid: GridArgs,

    /// Starting probability of a consistent choice.
    #[arg(long, default_value_t = 0.9)]
    pub start_q: f64,
}

#[derive(Debug, Args, Clone)]
pub struct LocLogitArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[command(flatten)]
    pub export: ExportArgs,
    #[command(flatten)]
    pub grid: GridArgs,
}

#[derive(Debug, Args, Clone)]
pub struct LConstantArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[command(flatten)]
    pub export: ExportArgs,
    #[command(flatten)]
    pub grid: GridArgs,

    /// Gaussian kernel bandwidth.
    #[arg(long, default_value_t = 1.0)]
    pub kernel_width: f64,

    /// Refine the bandwidth by leave-one-out likelihood (Klein-Spady).
    #[arg(long)]
    pub leave_one_out: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AnnArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[command(flatten)]
    pub export: ExportArgs,

    /// Hidden layer sizes, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "10")]
    pub hidden_layers: Vec<usize>,

    #[arg(long, default_value_t = 5)]
    pub training_repeats: i64,

    #[arg(long, default_value_t = 10)]
    pub shuffles_per_repeat: i64,

    #[arg(long, default_value_t = 20)]
    pub simulation_draws: i64,

    #[arg(long, default_value_t = 200)]
    pub max_epochs: i64,

    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_flags_have_defaults() {
        let cli = Cli::parse_from(["vtt", "describe", "data.csv"]);
        let Command::Describe(args) = cli.command else {
            panic!("expected describe");
        };
        assert_eq!(args.data.id, "RespID");
        assert_eq!(args.data.time2, "TimeR");
        assert!(args.data.delimiter.is_none());
    }

    #[test]
    fn ann_hidden_layers_are_comma_separated() {
        let cli = Cli::parse_from(["vtt", "ann", "d.csv", "--hidden-layers", "8,4", "--seed", "3"]);
        let Command::Ann(args) = cli.command else {
            panic!("expected ann");
        };
        assert_eq!(args.hidden_layers, vec![8, 4]);
        assert_eq!(args.seed, Some(3));
    }

    #[test]
    fn klein_spady_is_a_flag() {
        let cli = Cli::parse_from(["vtt", "lconstant", "d.csv", "--leave-one-out", "--support-points", "5"]);
        let Command::Lconstant(args) = cli.command else {
            panic!("expected lconstant");
        };
        assert!(args.leave_one_out);
        assert_eq!(args.grid.support_points, 5);
        assert_eq!(args.grid.seed, None);
    }
}
