//! Feed-forward binary classifier.
//!
//! `tanh` hidden layers, logistic output, cross-entropy loss, Adam updates on
//! shuffled mini-batches, early stopping on a held-back validation share, and
//! per-feature standardization learned from the training data.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::trace;

use crate::math::sigmoid;

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPS: f64 = 1e-8;
const PROB_CLIP: f64 = 1e-15;

#[derive(Debug, Clone, PartialEq)]
pub struct MlpConfig {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub max_epochs: usize,
    /// Share of the training rows held back for early stopping.
    pub validation_fraction: f64,
    /// Epochs without an improvement of at least `tol` before stopping.
    pub n_iter_no_change: usize,
    pub tol: f64,
    /// L2 penalty on weights.
    pub alpha: f64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![10],
            learning_rate: 1e-3,
            batch_size: 200,
            max_epochs: 200,
            validation_fraction: 0.1275,
            n_iter_no_change: 6,
            tol: 1e-4,
            alpha: 1e-4,
        }
    }
}

/// Trained network.
#[derive(Debug, Clone)]
pub struct Mlp {
    weights: Vec<DMatrix<f64>>,
    biases: Vec<DVector<f64>>,
    mean: DVector<f64>,
    scale: DVector<f64>,
    epochs: usize,
}

/// Adam moment estimates for one parameter block.
#[derive(Debug, Clone)]
struct Moments {
    m_w: Vec<DMatrix<f64>>,
    v_w: Vec<DMatrix<f64>>,
    m_b: Vec<DVector<f64>>,
    v_b: Vec<DVector<f64>>,
    step: i32,
}

impl Mlp {
    /// Train on `x` (one row per sample) and binary labels `y`.
    pub fn fit<R: Rng + ?Sized>(x: &DMatrix<f64>, y: &[bool], config: &MlpConfig, rng: &mut R) -> Mlp {
        let n = x.nrows();
        let (mean, scale) = standardization(x);

        let mut sizes = vec![x.ncols()];
        sizes.extend(config.hidden_layers.iter().copied());
        sizes.push(1);

        let mut net = Mlp {
            weights: Vec::with_capacity(sizes.len() - 1),
            biases: Vec::with_capacity(sizes.len() - 1),
            mean,
            scale,
            epochs: 0,
        };
        for pair in sizes.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
            net.weights
                .push(DMatrix::from_fn(fan_out, fan_in, |_, _| rng.gen_range(-limit..=limit)));
            net.biases
                .push(DVector::from_fn(fan_out, |_, _| rng.gen_range(-limit..=limit)));
        }

        let xs = net.standardize(x);
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let n_val = if n >= 10 {
            ((config.validation_fraction * n as f64).round() as usize).min(n - 1)
        } else {
            0
        };
        let (val_idx, train_idx) = order.split_at(n_val);
        let mut train_idx = train_idx.to_vec();

        let mut moments = Moments::zeros(&net);
        let batch = config.batch_size.clamp(1, train_idx.len().max(1));
        let mut best_loss = f64::INFINITY;
        let mut best = (net.weights.clone(), net.biases.clone());
        let mut stall = 0;

        for epoch in 0..config.max_epochs {
            train_idx.shuffle(rng);
            for chunk in train_idx.chunks(batch) {
                let (xb, yb) = gather(&xs, y, chunk);
                let (gw, gb) = net.gradients(&xb, &yb, config.alpha);
                net.adam_step(&mut moments, &gw, &gb, config.learning_rate);
            }
            net.epochs = epoch + 1;

            let monitor = if val_idx.is_empty() { &train_idx[..] } else { val_idx };
            let (xv, yv) = gather(&xs, y, monitor);
            let loss = cross_entropy(&net.forward_standardized(&xv), &yv);
            trace!(epoch, loss, "mlp epoch");

            if loss < best_loss - config.tol {
                best_loss = loss;
                best = (net.weights.clone(), net.biases.clone());
                stall = 0;
            } else {
                stall += 1;
                if stall >= config.n_iter_no_change {
                    break;
                }
            }
        }

        net.weights = best.0;
        net.biases = best.1;
        net
    }

    /// Probability of the positive class for each row of `x`.
    pub fn predict_proba(&self, x: &DMatrix<f64>) -> Vec<f64> {
        self.forward_standardized(&self.standardize(x))
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    fn standardize(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| (x[(i, j)] - self.mean[j]) / self.scale[j])
    }

    /// Activations of every layer, samples as columns; `acts[0]` is the input.
    fn activations(&self, xs: &DMatrix<f64>) -> Vec<DMatrix<f64>> {
        let mut acts = vec![xs.transpose()];
        let last = self.weights.len() - 1;
        for (l, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let mut z = w * &acts[l];
            for mut col in z.column_iter_mut() {
                col += b;
            }
            if l == last {
                z.apply(|v| *v = sigmoid(*v));
            } else {
                z.apply(|v| *v = v.tanh());
            }
            acts.push(z);
        }
        acts
    }

    fn forward_standardized(&self, xs: &DMatrix<f64>) -> Vec<f64> {
        let acts = self.activations(xs);
        acts.last().map(|a| a.iter().copied().collect()).unwrap_or_default()
    }

    fn gradients(&self, xs: &DMatrix<f64>, y: &[bool], alpha: f64) -> (Vec<DMatrix<f64>>, Vec<DVector<f64>>) {
        let n = xs.nrows().max(1) as f64;
        let acts = self.activations(xs);
        let layers = self.weights.len();
        let mut gw = vec![DMatrix::zeros(0, 0); layers];
        let mut gb = vec![DVector::zeros(0); layers];

        // Sigmoid output with cross-entropy: dL/dz = p - y.
        let out = &acts[layers];
        let mut delta = DMatrix::from_fn(1, out.ncols(), |_, j| out[(0, j)] - if y[j] { 1.0 } else { 0.0 });

        for l in (0..layers).rev() {
            gw[l] = (&delta * acts[l].transpose()) / n + &self.weights[l] * (alpha / n);
            gb[l] = delta.column_sum() / n;
            if l > 0 {
                let mut prev = self.weights[l].transpose() * &delta;
                prev.zip_apply(&acts[l], |d, a| *d *= 1.0 - a * a);
                delta = prev;
            }
        }
        (gw, gb)
    }

    fn adam_step(&mut self, mo: &mut Moments, gw: &[DMatrix<f64>], gb: &[DVector<f64>], lr: f64) {
        mo.step += 1;
        let c1 = 1.0 - ADAM_BETA1.powi(mo.step);
        let c2 = 1.0 - ADAM_BETA2.powi(mo.step);
        let step = lr * c2.sqrt() / c1;

        for l in 0..self.weights.len() {
            mo.m_w[l] = &mo.m_w[l] * ADAM_BETA1 + &gw[l] * (1.0 - ADAM_BETA1);
            mo.v_w[l] = &mo.v_w[l] * ADAM_BETA2 + gw[l].component_mul(&gw[l]) * (1.0 - ADAM_BETA2);
            mo.m_b[l] = &mo.m_b[l] * ADAM_BETA1 + &gb[l] * (1.0 - ADAM_BETA1);
            mo.v_b[l] = &mo.v_b[l] * ADAM_BETA2 + gb[l].component_mul(&gb[l]) * (1.0 - ADAM_BETA2);

            let upd_w = mo.m_w[l].zip_map(&mo.v_w[l], |m, v| step * m / (v.sqrt() + ADAM_EPS));
            let upd_b = mo.m_b[l].zip_map(&mo.v_b[l], |m, v| step * m / (v.sqrt() + ADAM_EPS));
            self.weights[l] -= upd_w;
            self.biases[l] -= upd_b;
        }
    }
}

impl Moments {
    fn zeros(net: &Mlp) -> Self {
        let zw: Vec<DMatrix<f64>> = net.weights.iter().map(|w| DMatrix::zeros(w.nrows(), w.ncols())).collect();
        let zb: Vec<DVector<f64>> = net.biases.iter().map(|b| DVector::zeros(b.len())).collect();
        Self {
            m_w: zw.clone(),
            v_w: zw,
            m_b: zb.clone(),
            v_b: zb,
            step: 0,
        }
    }
}

/// Mean binary cross-entropy with probabilities clipped away from 0 and 1.
pub fn cross_entropy(p: &[f64], y: &[bool]) -> f64 {
    let n = p.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let total: f64 = p
        .iter()
        .zip(y)
        .map(|(&p, &y)| {
            let p = p.clamp(PROB_CLIP, 1.0 - PROB_CLIP);
            if y { -p.ln() } else { -(1.0 - p).ln() }
        })
        .sum();
    total / n as f64
}

fn standardization(x: &DMatrix<f64>) -> (DVector<f64>, DVector<f64>) {
    let n = x.nrows().max(1) as f64;
    let mean = DVector::from_fn(x.ncols(), |j, _| x.column(j).sum() / n);
    let scale = DVector::from_fn(x.ncols(), |j, _| {
        let var = x.column(j).iter().map(|v| (v - mean[j]).powi(2)).sum::<f64>() / n;
        // Constant features are left unscaled.
        if var > 0.0 { var.sqrt() } else { 1.0 }
    });
    (mean, scale)
}

fn gather(x: &DMatrix<f64>, y: &[bool], rows: &[usize]) -> (DMatrix<f64>, Vec<bool>) {
    let xb = DMatrix::from_fn(rows.len(), x.ncols(), |i, j| x[(rows[i], j)]);
    let yb = rows.iter().map(|&r| y[r]).collect();
    (xb, yb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn learns_a_threshold_rule() {
        let mut rng = StdRng::seed_from_u64(2);
        let n = 600;
        let x = DMatrix::from_fn(n, 2, |_, _| rng.gen_range(-3.0..3.0));
        let y: Vec<bool> = (0..n).map(|i| x[(i, 0)] + 0.5 * x[(i, 1)] > 0.0).collect();

        let cfg = MlpConfig {
            hidden_layers: vec![8],
            learning_rate: 1e-2,
            max_epochs: 300,
            ..MlpConfig::default()
        };
        let net = Mlp::fit(&x, &y, &cfg, &mut rng);
        let p = net.predict_proba(&x);
        let accuracy = p.iter().zip(&y).filter(|&(&p, &y)| (p > 0.5) == y).count() as f64 / n as f64;
        assert!(accuracy > 0.9, "accuracy {accuracy}");
        assert!(cross_entropy(&p, &y) < 0.4);
        assert!(net.epochs() >= 1);
    }

    #[test]
    fn cross_entropy_of_coin_flip() {
        let ce = cross_entropy(&[0.5, 0.5], &[true, false]);
        assert!((ce - std::f64::consts::LN_2).abs() < 1e-12);
        assert!(cross_entropy(&[0.0], &[true]).is_finite());
    }
}
