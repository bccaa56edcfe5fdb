//! BFGS quasi-Newton minimizer with Armijo backtracking.
//!
//! The objective is any `Fn(&DVector<f64>) -> f64`; extra data is captured by
//! the closure. Gradients come from [`crate::math::numdiff::gradient`].
//!
//! ```text
//! d = -H g
//! λ = 1, 1/2, 1/4, ...   until f(x + λd) <= f(x) + c1 λ dᵀg
//! s = λd, y = g⁺ - g
//! H ← (I - ρ s yᵀ) H (I - ρ y sᵀ) + ρ s sᵀ,  ρ = 1 / sᵀy
//! ```

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::math::numdiff::{DiffScheme, gradient};

const ARMIJO_C1: f64 = 1e-4;
const CURVATURE_EPS: f64 = 1e-10;

/// Why the minimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MinimizeStatus {
    Converged,
    MaxIterations,
    StepSizeExhausted,
}

impl MinimizeStatus {
    /// Numeric code: 0 converged, 1 max iterations, 2 step size exhausted.
    pub fn code(self) -> u8 {
        match self {
            MinimizeStatus::Converged => 0,
            MinimizeStatus::MaxIterations => 1,
            MinimizeStatus::StepSizeExhausted => 2,
        }
    }

    pub fn is_converged(self) -> bool {
        self == MinimizeStatus::Converged
    }

    pub fn description(self) -> &'static str {
        match self {
            MinimizeStatus::Converged => "converged",
            MinimizeStatus::MaxIterations => "maximum iterations reached",
            MinimizeStatus::StepSizeExhausted => "step size exhausted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MinimizeOptions {
    pub max_iter: usize,
    /// Convergence tolerance on `|dᵀg|`.
    pub tol: f64,
    /// Smallest line-search step before giving up.
    pub step_tol: f64,
    pub scheme: DiffScheme,
    /// Relative finite-difference step; `None` uses the scheme default.
    pub rel_step: Option<f64>,
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol: 1e-6,
            step_tol: 1e-10,
            // Log-likelihood sums are large; forward differences are too noisy for `tol`.
            scheme: DiffScheme::Central,
            rel_step: None,
        }
    }
}

impl MinimizeOptions {
    pub fn with_max_iter(max_iter: usize) -> Self {
        Self {
            max_iter,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: DVector<f64>,
    pub fx: f64,
    /// Objective at the starting point.
    pub f0: f64,
    pub status: MinimizeStatus,
    pub iterations: usize,
    pub gradient: DVector<f64>,
    /// Final inverse-Hessian approximation.
    pub inv_hessian: DMatrix<f64>,
}

/// Minimize `f` starting from `x0`.
pub fn minimize<F>(f: F, x0: &DVector<f64>, opts: &MinimizeOptions) -> Minimum
where
    F: Fn(&DVector<f64>) -> f64,
{
    let n = x0.len();
    let mut x = x0.clone();
    let mut fx = f(&x);
    let f0 = fx;
    let mut g = gradient(&f, &x, fx, opts.scheme, opts.rel_step);
    let mut h = DMatrix::<f64>::identity(n, n);

    let mut status = MinimizeStatus::MaxIterations;
    let mut iterations = 0;

    while iterations < opts.max_iter {
        iterations += 1;

        let mut d = -(&h * &g);
        let mut slope = d.dot(&g);
        if !(slope < 0.0) {
            h = DMatrix::identity(n, n);
            d = -g.clone();
            slope = d.dot(&g);
        }

        if slope.abs() < opts.tol {
            status = MinimizeStatus::Converged;
            break;
        }

        let Some((lambda, x_new, f_new)) = line_search(&f, &x, fx, &d, slope, opts.step_tol) else {
            status = MinimizeStatus::StepSizeExhausted;
            break;
        };

        let g_new = gradient(&f, &x_new, f_new, opts.scheme, opts.rel_step);
        let s = &d * lambda;
        let y = &g_new - &g;
        let sy = s.dot(&y);
        if sy > CURVATURE_EPS {
            let rho = 1.0 / sy;
            let eye = DMatrix::<f64>::identity(n, n);
            let left = &eye - (&s * y.transpose()) * rho;
            let right = &eye - (&y * s.transpose()) * rho;
            h = left * &h * right + (&s * s.transpose()) * rho;
        }

        x = x_new;
        fx = f_new;
        g = g_new;
    }

    Minimum {
        x,
        fx,
        f0,
        status,
        iterations,
        gradient: g,
        inv_hessian: h,
    }
}

/// Armijo backtracking; `None` once the step falls below `step_tol`.
fn line_search<F>(
    f: &F,
    x: &DVector<f64>,
    fx: f64,
    d: &DVector<f64>,
    slope: f64,
    step_tol: f64,
) -> Option<(f64, DVector<f64>, f64)>
where
    F: Fn(&DVector<f64>) -> f64,
{
    let mut lambda = 1.0;
    while lambda >= step_tol {
        let trial = x + d * lambda;
        let ft = f(&trial);
        // NaN fails the comparison as well.
        if ft <= fx + ARMIJO_C1 * lambda * slope {
            return Some((lambda, trial, ft));
        }
        lambda *= 0.5;
    }
    None
}
