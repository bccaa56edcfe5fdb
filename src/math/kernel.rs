//! Kernel regression primitives.

use std::f64::consts::PI;

/// Standard normal density.
pub fn gaussian(u: f64) -> f64 {
    (-0.5 * u * u).exp() / (2.0 * PI).sqrt()
}

/// Triangular weight `(k - |d|) / k` for `|d| < k`, zero otherwise.
pub fn triangular(d: f64, k: f64) -> f64 {
    let ad = d.abs();
    if ad < k { (k - ad) / k } else { 0.0 }
}

/// Nadaraya–Watson estimate of `E[y | x = x0]` with a Gaussian kernel.
///
/// Returns `NaN` when every kernel weight underflows to zero.
pub fn nadaraya_watson(x: &[f64], y: &[f64], x0: f64, bandwidth: f64) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let w = gaussian((xi - x0) / bandwidth);
        num += w * yi;
        den += w;
    }
    if den > 0.0 { num / den } else { f64::NAN }
}

/// Leave-one-out Nadaraya–Watson fits at every observation.
///
/// Observations whose neighbours all carry zero weight get `NaN`.
pub fn nadaraya_watson_loo(x: &[f64], y: &[f64], bandwidth: f64) -> Vec<f64> {
    let n = x.len().min(y.len());
    let mut num = vec![0.0; n];
    let mut den = vec![0.0; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let w = gaussian((x[i] - x[j]) / bandwidth);
            num[i] += w * y[j];
            den[i] += w;
            num[j] += w * y[i];
            den[j] += w;
        }
    }
    num.iter()
        .zip(&den)
        .map(|(&a, &b)| if b > 0.0 { a / b } else { f64::NAN })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_vanishes_at_bandwidth() {
        assert_eq!(triangular(1.0, 1.0), 0.0);
        assert!((triangular(-0.25, 1.0) - 0.75).abs() < 1e-15);
        assert_eq!(triangular(0.0, 2.0), 1.0);
    }

    #[test]
    fn nw_of_constant_is_constant() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.4; 4];
        assert!((nadaraya_watson(&x, &y, 1.5, 0.7) - 0.4).abs() < 1e-12);
        for v in nadaraya_watson_loo(&x, &y, 0.7) {
            assert!((v - 0.4).abs() < 1e-12);
        }
    }

    #[test]
    fn loo_excludes_own_observation() {
        let x = [0.0, 100.0];
        let y = [1.0, 0.0];
        // Each point only sees the other one.
        let fit = nadaraya_watson_loo(&x, &y, 1000.0);
        assert!((fit[0] - 0.0).abs() < 1e-12);
        assert!((fit[1] - 1.0).abs() < 1e-12);
    }
}
