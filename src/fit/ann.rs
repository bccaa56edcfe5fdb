//! Simulation-based VTT estimation with a neural classifier.
//!
//! The classifier learns `P(FBE)` on one occasion from its BVTT and the
//! respondent's other answers. A respondent's VTT is then the BVTT at which
//! the median simulated probability crosses one half.

use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{ConfigAnn, ModelArrays};
use crate::error::VttError;
use crate::fit::{CancelFlag, Estimate, Estimator, ensure_valid, linspace, require_occasions};
use crate::nn::{Mlp, MlpConfig, cross_entropy};

const TEST_SHARE: f64 = 0.15;
const SIM_POINTS: usize = 101;
const SIM_RANGE_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnEstimate {
    /// Log-likelihood of each training repeat.
    pub ll: Vec<f64>,
    pub rho_sq: Vec<f64>,
    /// Repeat × respondent VTT.
    pub vtt: Vec<Vec<f64>>,
    /// BVTT grid used for the simulated choice probabilities.
    pub simulation_grid: Vec<f64>,
}

impl AnnEstimate {
    /// Mean VTT per respondent across repeats.
    pub fn mean_vtt(&self) -> Vec<f64> {
        let Some(first) = self.vtt.first() else {
            return Vec::new();
        };
        let r = self.vtt.len() as f64;
        (0..first.len())
            .map(|i| self.vtt.iter().map(|row| row[i]).sum::<f64>() / r)
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Repeat {
    ll: f64,
    rho_sq: f64,
    vtt: Vec<f64>,
}

pub fn run_ann(arrays: &ModelArrays, config: &ConfigAnn, cancel: &CancelFlag) -> Result<AnnEstimate, VttError> {
    ensure_valid(config.validate())?;
    require_occasions(arrays, 2, "ANN")?;
    cancel.check()?;

    let base_seed = match config.seed {
        Some(s) => s.unsigned_abs(),
        None => StdRng::from_entropy().r#gen(),
    };
    let mlp = MlpConfig {
        hidden_layers: config.hidden_layers.clone(),
        max_epochs: config.max_epochs as usize,
        ..MlpConfig::default()
    };
    let grid = linspace(0.0, SIM_RANGE_FACTOR * arrays.bvtt_max(), SIM_POINTS);

    // Each repeat owns its RNG stream, so results do not depend on scheduling.
    let repeats = (0..config.training_repeats as u64)
        .into_par_iter()
        .map(|r| {
            cancel.check()?;
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(r));
            run_repeat(arrays, config, &mlp, &grid, &mut rng, cancel)
        })
        .collect::<Result<Vec<Repeat>, VttError>>()?;

    for (r, rep) in repeats.iter().enumerate() {
        info!(repeat = r + 1, ll = rep.ll, rho_sq = rep.rho_sq, "ANN repeat finished");
    }

    Ok(AnnEstimate {
        ll: repeats.iter().map(|r| r.ll).collect(),
        rho_sq: repeats.iter().map(|r| r.rho_sq).collect(),
        vtt: repeats.into_iter().map(|r| r.vtt).collect(),
        simulation_grid: grid,
    })
}

fn run_repeat(
    arrays: &ModelArrays,
    config: &ConfigAnn,
    mlp: &MlpConfig,
    grid: &[f64],
    rng: &mut StdRng,
    cancel: &CancelFlag,
) -> Result<Repeat, VttError> {
    let (x, y) = training_set(arrays, config.shuffles_per_repeat as usize, rng);
    let n_full = y.len();

    let mut order: Vec<usize> = (0..n_full).collect();
    order.shuffle(rng);
    let n_test = (TEST_SHARE * n_full as f64).round() as usize;
    let (test_idx, train_idx) = order.split_at(n_test);
    let (x_train, y_train) = select_rows(&x, &y, train_idx);
    let (x_test, y_test) = select_rows(&x, &y, test_idx);

    let net = Mlp::fit(&x_train, &y_train, mlp, rng);
    debug!(epochs = net.epochs(), rows = n_full, "classifier trained");
    cancel.check()?;

    let ce_train = cross_entropy(&net.predict_proba(&x_train), &y_train);
    let ce_test = cross_entropy(&net.predict_proba(&x_test), &y_test);
    let ll = -(train_idx.len() as f64) * ce_train - (test_idx.len() as f64) * ce_test;
    let rho_sq = 1.0 - ll / (0.5f64.ln() * n_full as f64);

    let draws = config.simulation_draws as usize;
    let mut vtt = Vec::with_capacity(arrays.np());
    for i in 0..arrays.np() {
        cancel.check()?;
        let rows = simulation_rows(arrays, i, grid, draws, rng);
        let p = net.predict_proba(&rows);
        let median = median_curve(&p, grid.len(), draws);
        vtt.push(first_crossing(grid, &median));
    }

    Ok(Repeat { ll, rho_sq, vtt })
}

/// Features `[BVTT_label, choices of the other T−1, BVTTs of the other T−1]`.
fn training_set(arrays: &ModelArrays, shuffles: usize, rng: &mut StdRng) -> (DMatrix<f64>, Vec<bool>) {
    let (np, t) = (arrays.np(), arrays.t());
    let width = 2 * t - 1;
    let mut data = Vec::with_capacity(np * shuffles * width);
    let mut labels = Vec::with_capacity(np * shuffles);
    let mut perm: Vec<usize> = (0..t).collect();

    for i in 0..np {
        for _ in 0..shuffles {
            perm.shuffle(rng);
            let (context, label) = perm.split_at(t - 1);
            let target = label[0];
            push_features(arrays, i, arrays.bvtt()[(i, target)], context, &mut data);
            labels.push(arrays.choice()[(i, target)]);
        }
    }

    let x = DMatrix::from_row_slice(labels.len(), width, &data);
    (x, labels)
}

/// `draws` random contexts × every grid value; row `d·G + g`.
fn simulation_rows(arrays: &ModelArrays, i: usize, grid: &[f64], draws: usize, rng: &mut StdRng) -> DMatrix<f64> {
    let t = arrays.t();
    let width = 2 * t - 1;
    let mut data = Vec::with_capacity(draws * grid.len() * width);
    let mut perm: Vec<usize> = (0..t).collect();
    for _ in 0..draws {
        perm.shuffle(rng);
        let context = &perm[..t - 1];
        for &g in grid {
            push_features(arrays, i, g, context, &mut data);
        }
    }
    DMatrix::from_row_slice(draws * grid.len(), width, &data)
}

fn push_features(arrays: &ModelArrays, i: usize, bvtt_label: f64, context: &[usize], out: &mut Vec<f64>) {
    out.push(bvtt_label);
    out.extend(context.iter().map(|&j| if arrays.choice()[(i, j)] { 1.0 } else { 0.0 }));
    out.extend(context.iter().map(|&j| arrays.bvtt()[(i, j)]));
}

fn select_rows(x: &DMatrix<f64>, y: &[bool], rows: &[usize]) -> (DMatrix<f64>, Vec<bool>) {
    (x.select_rows(rows), rows.iter().map(|&r| y[r]).collect())
}

/// Per-grid-point median over draws of predictions laid out as `d·G + g`.
fn median_curve(p: &[f64], points: usize, draws: usize) -> Vec<f64> {
    (0..points)
        .map(|g| {
            let mut column: Vec<f64> = (0..draws).map(|d| p[d * points + g]).collect();
            median(&mut column)
        })
        .collect()
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        0.5 * (values[mid - 1] + values[mid])
    }
}

/// First grid value where the curve crosses 0.5, linearly interpolated.
///
/// The curve must move from one side of 0.5 to the other; touching 0.5 and
/// turning back is not a crossing. Runs of points exactly at 0.5 resolve to
/// the first of them. Returns 0 when the curve never crosses.
pub fn first_crossing(grid: &[f64], p: &[f64]) -> f64 {
    let n = grid.len().min(p.len());
    let mut last_off: Option<usize> = None;
    for j in 0..n {
        if p[j] == 0.5 || p[j].is_nan() {
            continue;
        }
        if let Some(i) = last_off {
            if (p[i] > 0.5) != (p[j] > 0.5) {
                return if j == i + 1 {
                    grid[i] + (0.5 - p[i]) * (grid[j] - grid[i]) / (p[j] - p[i])
                } else {
                    grid[i + 1]
                };
            }
        }
        last_off = Some(j);
    }
    0.0
}

impl Estimator for ConfigAnn {
    fn estimate(&self, arrays: &ModelArrays, cancel: &CancelFlag) -> Result<Estimate, VttError> {
        run_ann(arrays, self, cancel).map(Estimate::Ann)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticConfig, VttDistribution, build_model_arrays, generate_panel};
    use crate::domain::VarsMapping;

    #[test]
    fn crossing_is_interpolated() {
        let grid = [0.0, 1.0, 2.0, 3.0];
        assert!((first_crossing(&grid, &[0.9, 0.7, 0.3, 0.1]) - 1.5).abs() < 1e-12);
        assert_eq!(first_crossing(&grid, &[0.9, 0.8, 0.7, 0.6]), 0.0);
        assert!((first_crossing(&grid, &[0.9, 0.5, 0.5, 0.1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn touching_one_half_is_not_a_crossing() {
        let grid = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(first_crossing(&grid[..3], &[0.6, 0.5, 0.6]), 0.0);
        assert_eq!(first_crossing(&grid, &[0.5, 0.5, 0.5, 0.5]), 0.0);
        assert!((first_crossing(&grid, &[0.6, 0.5, 0.7, 0.3]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn median_curve_takes_median_per_point() {
        // Two grid points, three draws.
        let p = [0.1, 0.9, 0.5, 0.4, 0.3, 0.8];
        assert_eq!(median_curve(&p, 2, 3), vec![0.3, 0.8]);
    }

    #[test]
    fn training_rows_have_expected_layout() {
        let bvtt = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let choice = DMatrix::from_row_slice(1, 3, &[true, false, true]);
        let arrays = ModelArrays::new(bvtt, choice, vec![1.0]);
        let mut rng = StdRng::seed_from_u64(8);
        let (x, y) = training_set(&arrays, 4, &mut rng);

        assert_eq!(x.shape(), (4, 5));
        for (r, &label) in y.iter().enumerate() {
            let target = x[(r, 0)];
            // Label matches the choice at the target BVTT.
            assert_eq!(label, target != 2.0);
            // Context BVTTs are the other two occasions.
            let ctx_sum = x[(r, 3)] + x[(r, 4)];
            assert!((ctx_sum + target - 6.0).abs() < 1e-12);
        }
    }

    #[test]
    fn seeded_runs_are_reproducible_and_sensible() {
        let data = generate_panel(&SyntheticConfig {
            respondents: 60,
            occasions: 6,
            vtt: VttDistribution::Fixed(5.0),
            noise_scale: 0.3,
            seed: 13,
            ..SyntheticConfig::default()
        });
        let mapping = VarsMapping::new("RespID", "Chosen", "CostL", "TimeL", "CostR", "TimeR");
        let arrays = build_model_arrays(&data.dataset, &mapping).unwrap();
        let cfg = ConfigAnn {
            hidden_layers: vec![6],
            training_repeats: 2,
            shuffles_per_repeat: 3,
            simulation_draws: 5,
            max_epochs: 30,
            seed: Some(1),
        };

        let a = run_ann(&arrays, &cfg, &CancelFlag::new()).unwrap();
        let b = run_ann(&arrays, &cfg, &CancelFlag::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.vtt.len(), 2);
        assert_eq!(a.vtt[0].len(), 60);
        assert_eq!(a.simulation_grid.len(), 101);
        assert!(a.rho_sq.iter().all(|r| r.is_finite() && *r < 1.0));
        assert!(a.vtt.iter().flatten().all(|&v| v >= 0.0 && v <= *a.simulation_grid.last().unwrap()));
    }
}
