//! Finite-difference derivatives and Hessian-based standard errors.
//!
//! All objectives in this crate are negative log-likelihoods without analytic
//! derivatives, so gradients for the minimizer and the post-fit Hessian are
//! both approximated numerically here.

use nalgebra::{DMatrix, DVector};

/// Difference scheme used for gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffScheme {
    Forward,
    Central,
}

impl DiffScheme {
    /// Default relative step: `√ε` forward, `ε^(1/3)` central.
    pub fn default_step(self) -> f64 {
        match self {
            DiffScheme::Forward => f64::EPSILON.sqrt(),
            DiffScheme::Central => f64::EPSILON.cbrt(),
        }
    }
}

fn step_for(x: f64, rel: f64) -> f64 {
    rel * x.abs().max(1.0)
}

/// Numeric gradient of `f` at `x`.
///
/// `fx` is `f(x)`, reused by the forward scheme. `rel_step` of `None` picks
/// the scheme's default.
pub fn gradient<F>(f: &F, x: &DVector<f64>, fx: f64, scheme: DiffScheme, rel_step: Option<f64>) -> DVector<f64>
where
    F: Fn(&DVector<f64>) -> f64,
{
    let rel = rel_step.unwrap_or_else(|| scheme.default_step());
    let mut g = DVector::zeros(x.len());
    let mut xp = x.clone();

    for i in 0..x.len() {
        let h = step_for(x[i], rel);
        match scheme {
            DiffScheme::Forward => {
                xp[i] = x[i] + h;
                g[i] = (f(&xp) - fx) / h;
            }
            DiffScheme::Central => {
                xp[i] = x[i] + h;
                let up = f(&xp);
                xp[i] = x[i] - h;
                let down = f(&xp);
                g[i] = (up - down) / (2.0 * h);
            }
        }
        xp[i] = x[i];
    }
    g
}

/// Symmetric finite-difference Hessian of `f` at `x`.
///
/// Off-diagonal entries use four evaluations each; diagonal entries use the
/// three-point second difference.
pub fn hessian<F>(f: &F, x: &DVector<f64>) -> DMatrix<f64>
where
    F: Fn(&DVector<f64>) -> f64,
{
    let n = x.len();
    let rel = f64::EPSILON.powf(0.25);
    let fx = f(x);
    let h: Vec<f64> = x.iter().map(|&xi| step_for(xi, rel)).collect();
    let mut out = DMatrix::zeros(n, n);
    let mut xp = x.clone();

    for i in 0..n {
        xp[i] = x[i] + h[i];
        let up = f(&xp);
        xp[i] = x[i] - h[i];
        let down = f(&xp);
        xp[i] = x[i];
        out[(i, i)] = (up - 2.0 * fx + down) / (h[i] * h[i]);

        for j in 0..i {
            let mut eval = |si: f64, sj: f64| {
                xp[i] = x[i] + si * h[i];
                xp[j] = x[j] + sj * h[j];
                let v = f(&xp);
                xp[i] = x[i];
                xp[j] = x[j];
                v
            };
            let fpp = eval(1.0, 1.0);
            let fpm = eval(1.0, -1.0);
            let fmp = eval(-1.0, 1.0);
            let fmm = eval(-1.0, -1.0);
            let v = (fpp - fpm - fmp + fmm) / (4.0 * h[i] * h[j]);
            out[(i, j)] = v;
            out[(j, i)] = v;
        }
    }
    out
}

/// Standard errors from the Hessian of a negative log-likelihood.
///
/// The Hessian is inverted directly when possible and through an SVD
/// pseudo-inverse otherwise. Variances that are non-finite or not positive
/// are reported as `NaN`.
pub fn standard_errors(hessian: &DMatrix<f64>) -> Vec<f64> {
    let n = hessian.nrows();
    if n == 0 || hessian.iter().any(|v| !v.is_finite()) {
        return vec![f64::NAN; n];
    }

    let cov = match hessian.clone().try_inverse() {
        Some(inv) if inv.iter().all(|v| v.is_finite()) => Some(inv),
        _ => {
            // Near-singular information matrix (e.g. unidentified grid weights).
            let svd = hessian.clone().svd(true, true);
            [1e-10, 1e-8, 1e-6]
                .into_iter()
                .find_map(|tol| svd.clone().pseudo_inverse(tol).ok())
        }
    };

    match cov {
        Some(cov) => (0..n)
            .map(|i| {
                let v = cov[(i, i)];
                if v.is_finite() && v > 0.0 { v.sqrt() } else { f64::NAN }
            })
            .collect(),
        None => vec![f64::NAN; n],
    }
}
