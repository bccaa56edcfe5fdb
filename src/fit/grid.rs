//! Support grids and plot-ready step CDFs.

use serde::Serialize;

/// `n` evenly spaced points between `min` and `max` (inclusive).
///
/// A single point yields `[min]`.
pub fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n as f64 - 1.0);
            let mut out: Vec<f64> = (0..n).map(|i| min + step * i as f64).collect();
            // Pin the right endpoint against rounding.
            out[n - 1] = max;
            out
        }
    }
}

/// Bin edges around each grid point: the outer points plus all midpoints.
///
/// `[g0, (g0+g1)/2, ..., (g_{n-2}+g_{n-1})/2, g_{n-1}]`, length `n + 1`.
pub fn midpoints(grid: &[f64]) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (grid.first(), grid.last()) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(grid.len() + 1);
    out.push(first);
    out.extend(grid.windows(2).map(|w| 0.5 * (w[0] + w[1])));
    out.push(last);
    out
}

/// Right-continuous step function ready for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepCdf {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl StepCdf {
    /// Step CDF `[0, cdf..., last]` over `[x0, points..., x_end]`.
    pub fn padded(points: &[f64], cdf: &[f64], x_end: f64) -> Self {
        let x0 = points.first().copied().unwrap_or(x_end);
        let last = cdf.last().copied().unwrap_or(0.0);
        let mut x = Vec::with_capacity(points.len() + 2);
        let mut y = Vec::with_capacity(cdf.len() + 2);
        x.push(x0);
        y.push(0.0);
        x.extend_from_slice(points);
        y.extend_from_slice(cdf);
        x.push(x_end);
        y.push(last);
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_endpoints() {
        let v = linspace(0.0, 1.0, 11);
        assert_eq!(v.len(), 11);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[10], 1.0);
        assert!((v[3] - 0.3).abs() < 1e-12);
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
    }

    #[test]
    fn midpoints_bracket_each_grid_point() {
        let m = midpoints(&[0.0, 1.0, 3.0]);
        assert_eq!(m, vec![0.0, 0.5, 2.0, 3.0]);
        assert!(midpoints(&[]).is_empty());
    }

    #[test]
    fn padded_step_cdf_starts_at_zero() {
        let s = StepCdf::padded(&[1.0, 2.0], &[0.3, 0.8], 3.0);
        assert_eq!(s.x, vec![1.0, 1.0, 2.0, 3.0]);
        assert_eq!(s.y, vec![0.0, 0.3, 0.8, 0.8]);
    }
}
