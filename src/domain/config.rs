//! Per-family estimator configuration.
//!
//! Each record is plain data; `validate()` returns every violated rule as a
//! human-readable message (empty means valid). Estimators refuse to run until
//! the list is empty.

use serde::{Deserialize, Serialize};

const MSG_MAX_GT_MIN: &str = "Max must be greater than minimum.";
const MSG_SUPPORT_POSITIVE: &str = "No. of support points must be greater than zero.";
const MSG_SUPPORT_TWO: &str = "No. of support points must be at least two.";
const MSG_SCALE_POSITIVE: &str = "Scale starting value must be positive.";
const MSG_MAX_ITER: &str = "Max iterations must be greater than zero.";
const MSG_SEED: &str = "Seed must be non-negative.";
const MSG_FINITE_RANGE: &str = "Minimum and maximum must be finite.";

/// Binary logit on a held-out occasion per respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigLogistic {
    pub start_scale: f64,
    pub start_intercept: f64,
    pub start_parameter: f64,
    pub max_iterations: i64,
    pub seed: Option<i64>,
}

impl ConfigLogistic {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.start_scale > 0.0) {
            errors.push(MSG_SCALE_POSITIVE.to_string());
        }
        if self.max_iterations <= 0 {
            errors.push(MSG_MAX_ITER.to_string());
        }
        check_seed(self.seed, &mut errors);
        errors
    }
}

/// Random valuation model: a single population VTT with logistic noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRv {
    pub start_scale: f64,
    pub start_vtt: f64,
    pub max_iterations: i64,
}

impl ConfigRv {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.start_scale > 0.0) {
            errors.push(MSG_SCALE_POSITIVE.to_string());
        }
        if self.max_iterations <= 0 {
            errors.push(MSG_MAX_ITER.to_string());
        }
        errors
    }
}

/// Latent-class model over a fixed VTT grid (Rouwendal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRouwendal {
    pub minimum: f64,
    pub maximum: f64,
    pub support_points: i64,
    /// Starting probability of consistent choice, strictly inside (0, 1).
    pub start_q: f64,
    /// Seed for the simulated VTT sample; random when absent.
    pub seed: Option<i64>,
}

impl ConfigRouwendal {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_range(self.minimum, self.maximum, &mut errors);
        if self.support_points <= 0 {
            errors.push(MSG_SUPPORT_POSITIVE.to_string());
        }
        if !(self.start_q > 0.0 && self.start_q < 1.0) {
            errors.push("Probability of consistent choice must be in the interval (0,1).".to_string());
        }
        check_seed(self.seed, &mut errors);
        errors
    }
}

/// Local logit at each grid point, triangular kernel of one grid step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigLocLogit {
    pub minimum: f64,
    pub maximum: f64,
    pub support_points: i64,
    pub seed: Option<i64>,
}

impl ConfigLocLogit {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_range(self.minimum, self.maximum, &mut errors);
        check_kernel_grid(self.support_points, &mut errors);
        check_seed(self.seed, &mut errors);
        errors
    }
}

/// Nadaraya–Watson local constant estimator, optionally with the
/// Klein–Spady leave-one-out bandwidth scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigLConstant {
    pub minimum: f64,
    pub maximum: f64,
    pub support_points: i64,
    pub kernel_width: f64,
    pub leave_one_out: bool,
    pub seed: Option<i64>,
}

impl ConfigLConstant {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_range(self.minimum, self.maximum, &mut errors);
        check_kernel_grid(self.support_points, &mut errors);
        if !(self.kernel_width > 0.0) {
            errors.push("Kernel width must be greater than zero.".to_string());
        }
        check_seed(self.seed, &mut errors);
        errors
    }
}

/// Simulation-based estimator built on a feed-forward classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigAnn {
    /// Nodes per hidden layer.
    pub hidden_layers: Vec<usize>,
    pub training_repeats: i64,
    pub shuffles_per_repeat: i64,
    /// Random occasion orderings simulated per respondent.
    pub simulation_draws: i64,
    pub max_epochs: i64,
    pub seed: Option<i64>,
}

impl ConfigAnn {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.hidden_layers.iter().any(|&n| n == 0) {
            errors.push("Hidden layers must all have at least one node.".to_string());
        }
        if self.training_repeats <= 0 {
            errors.push("Number of repeats must be positive.".to_string());
        }
        if self.shuffles_per_repeat <= 0 {
            errors.push("Number of shuffles per repeats must be positive.".to_string());
        }
        if self.simulation_draws <= 0 {
            errors.push("Number of simulation draws must be positive.".to_string());
        }
        if self.max_epochs <= 0 {
            errors.push("Max epochs must be greater than zero.".to_string());
        }
        check_seed(self.seed, &mut errors);
        errors
    }
}

/// Closed set of estimator configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum ModelConfig {
    Logistic(ConfigLogistic),
    Rv(ConfigRv),
    Rouwendal(ConfigRouwendal),
    LocLogit(ConfigLocLogit),
    LConstant(ConfigLConstant),
    Ann(ConfigAnn),
}

impl ModelConfig {
    pub fn validate(&self) -> Vec<String> {
        match self {
            ModelConfig::Logistic(c) => c.validate(),
            ModelConfig::Rv(c) => c.validate(),
            ModelConfig::Rouwendal(c) => c.validate(),
            ModelConfig::LocLogit(c) => c.validate(),
            ModelConfig::LConstant(c) => c.validate(),
            ModelConfig::Ann(c) => c.validate(),
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelConfig::Logistic(_) => "Logistic regression",
            ModelConfig::Rv(_) => "Random valuation",
            ModelConfig::Rouwendal(_) => "Rouwendal",
            ModelConfig::LocLogit(_) => "Local logit",
            ModelConfig::LConstant(c) if c.leave_one_out => "Klein-Spady",
            ModelConfig::LConstant(_) => "Local constant",
            ModelConfig::Ann(_) => "ANN",
        }
    }
}

fn check_range(minimum: f64, maximum: f64, errors: &mut Vec<String>) {
    if !(minimum.is_finite() && maximum.is_finite()) {
        errors.push(MSG_FINITE_RANGE.to_string());
    } else if !(maximum > minimum) {
        errors.push(MSG_MAX_GT_MIN.to_string());
    }
}

fn check_kernel_grid(support_points: i64, errors: &mut Vec<String>) {
    if support_points <= 0 {
        errors.push(MSG_SUPPORT_POSITIVE.to_string());
    } else if support_points < 2 {
        errors.push(MSG_SUPPORT_TWO.to_string());
    }
}

fn check_seed(seed: Option<i64>, errors: &mut Vec<String>) {
    if matches!(seed, Some(s) if s < 0) {
        errors.push(MSG_SEED.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rouwendal_zero_support_points_is_rejected() {
        let cfg = ConfigRouwendal {
            minimum: 0.0,
            maximum: 1.0,
            support_points: 0,
            start_q: 0.9,
            seed: None,
        };
        assert_eq!(
            cfg.validate(),
            vec!["No. of support points must be greater than zero.".to_string()]
        );
    }

    #[test]
    fn logistic_negative_seed_is_rejected() {
        let cfg = ConfigLogistic {
            start_scale: 1.0,
            start_intercept: 0.1,
            start_parameter: 1.0,
            max_iterations: 100,
            seed: Some(-1),
        };
        assert_eq!(cfg.validate(), vec!["Seed must be non-negative.".to_string()]);
    }

    #[test]
    fn violations_are_collected_not_short_circuited() {
        let cfg = ConfigLConstant {
            minimum: 5.0,
            maximum: 1.0,
            support_points: 0,
            kernel_width: -1.0,
            leave_one_out: false,
            seed: None,
        };
        let errors = ModelConfig::LConstant(cfg).validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"Kernel width must be greater than zero.".to_string()));
    }

    #[test]
    fn rouwendal_start_q_must_be_strictly_inside_unit_interval() {
        for q in [0.0, 1.0, -0.5, f64::NAN] {
            let cfg = ConfigRouwendal {
                minimum: 0.0,
                maximum: 10.0,
                support_points: 11,
                start_q: q,
                seed: None,
            };
            assert_eq!(cfg.validate().len(), 1, "start_q={q}");
        }
    }

    #[test]
    fn kernel_grids_need_two_points() {
        let cfg = ConfigLocLogit {
            minimum: 0.0,
            maximum: 1.0,
            support_points: 1,
            seed: None,
        };
        assert_eq!(cfg.validate(), vec!["No. of support points must be at least two.".to_string()]);
    }

    #[test]
    fn ann_and_rv_report_their_own_rules() {
        let ann = ConfigAnn {
            hidden_layers: vec![10, 0],
            training_repeats: 0,
            shuffles_per_repeat: 0,
            simulation_draws: 20,
            max_epochs: 100,
            seed: None,
        };
        assert_eq!(ann.validate().len(), 3);

        let rv = ConfigRv {
            start_scale: 0.0,
            start_vtt: 1.0,
            max_iterations: 0,
        };
        assert_eq!(rv.validate().len(), 2);
    }

    #[test]
    fn non_finite_support_bounds_are_rejected() {
        for (minimum, maximum) in [(0.0, f64::INFINITY), (f64::NEG_INFINITY, 5.0), (f64::NAN, 5.0)] {
            let cfg = ConfigRouwendal {
                minimum,
                maximum,
                support_points: 3,
                start_q: 0.9,
                seed: None,
            };
            assert_eq!(
                cfg.validate(),
                vec!["Minimum and maximum must be finite.".to_string()],
                "[{minimum}, {maximum}]"
            );
        }
    }

    #[test]
    fn grid_family_seeds_must_be_non_negative() {
        let loclogit = ConfigLocLogit {
            minimum: 0.0,
            maximum: 10.0,
            support_points: 5,
            seed: Some(-3),
        };
        assert_eq!(loclogit.validate(), vec!["Seed must be non-negative.".to_string()]);

        let lconstant = ConfigLConstant {
            minimum: 0.0,
            maximum: 10.0,
            support_points: 5,
            kernel_width: 1.0,
            leave_one_out: true,
            seed: Some(-1),
        };
        assert_eq!(lconstant.validate(), vec!["Seed must be non-negative.".to_string()]);
    }
}
