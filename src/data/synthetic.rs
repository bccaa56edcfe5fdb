//! Seeded synthetic stated-choice panels.
//!
//! Respondents draw a VTT from a known distribution and answer each occasion
//! with logistic noise, so estimators can be checked against the truth.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};

use crate::io::RawDataset;

/// Population VTT distribution used by the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VttDistribution {
    Fixed(f64),
    Normal { mean: f64, sd: f64 },
    LogNormal { mu: f64, sigma: f64 },
}

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub respondents: usize,
    pub occasions: usize,
    pub vtt: VttDistribution,
    /// BVTTs are drawn uniformly from this range.
    pub bvtt_min: f64,
    pub bvtt_max: f64,
    /// Scale of the logistic error on `VTT - BVTT`; zero means deterministic answers.
    pub noise_scale: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            respondents: 200,
            occasions: 8,
            vtt: VttDistribution::Fixed(5.0),
            bvtt_min: 0.5,
            bvtt_max: 12.0,
            noise_scale: 1.0,
            seed: 7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticData {
    /// Columns `RespID, Chosen, CostL, TimeL, CostR, TimeR`.
    pub dataset: RawDataset,
    /// True VTT of each respondent.
    pub vtt: Vec<f64>,
}

pub fn generate_panel(config: &SyntheticConfig) -> SyntheticData {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let rows = config.respondents * config.occasions;

    let mut id = Vec::with_capacity(rows);
    let mut chosen = Vec::with_capacity(rows);
    let mut cost_l = Vec::with_capacity(rows);
    let mut time_l = Vec::with_capacity(rows);
    let mut cost_r = Vec::with_capacity(rows);
    let mut time_r = Vec::with_capacity(rows);
    let mut vtts = Vec::with_capacity(config.respondents);

    for n in 0..config.respondents {
        let vtt = draw_vtt(&mut rng, config.vtt);
        vtts.push(vtt);

        for _ in 0..config.occasions {
            let bvtt = rng.gen_range(config.bvtt_min..=config.bvtt_max);
            let dt = rng.gen_range(5.0..30.0_f64).round();
            let cheap_cost = rng.gen_range(10.0..50.0_f64).round();
            let slow_time = rng.gen_range(40.0..90.0_f64).round();
            let pricey_cost = cheap_cost + bvtt * dt;
            let fast_time = slow_time - dt;

            let noise = if config.noise_scale > 0.0 {
                let u: f64 = rng.gen_range(1e-12..1.0 - 1e-12);
                config.noise_scale * (u / (1.0 - u)).ln()
            } else {
                0.0
            };
            let fbe = vtt - bvtt + noise > 0.0;

            // Randomize which side shows the cheap alternative.
            let cheap_left: bool = rng.r#gen();
            let (cl, tl, cr, tr) = if cheap_left {
                (cheap_cost, slow_time, pricey_cost, fast_time)
            } else {
                (pricey_cost, fast_time, cheap_cost, slow_time)
            };
            let choice = match (cheap_left, fbe) {
                (true, false) | (false, true) => 1.0,
                _ => 2.0,
            };

            id.push((n + 1) as f64);
            chosen.push(choice);
            cost_l.push(cl);
            time_l.push(tl);
            cost_r.push(cr);
            time_r.push(tr);
        }
    }

    let dataset = RawDataset::from_columns([
        ("RespID", id),
        ("Chosen", chosen),
        ("CostL", cost_l),
        ("TimeL", time_l),
        ("CostR", cost_r),
        ("TimeR", time_r),
    ]);

    SyntheticData { dataset, vtt: vtts }
}

fn draw_vtt(rng: &mut StdRng, dist: VttDistribution) -> f64 {
    match dist {
        VttDistribution::Fixed(v) => v,
        VttDistribution::Normal { mean, sd } => match Normal::new(mean, sd) {
            Ok(d) => d.sample(rng),
            Err(_) => mean,
        },
        VttDistribution::LogNormal { mu, sigma } => match LogNormal::new(mu, sigma) {
            Ok(d) => d.sample(rng),
            Err(_) => mu.exp(),
        },
    }
}
