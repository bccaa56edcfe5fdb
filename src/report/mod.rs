//! Reporting utilities: VTT sample summaries and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

/// Location and spread of a VTT sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VttSummary {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarize the finite values of `values`; `None` when there are none.
pub fn summarize_vtt(values: &[f64]) -> Option<VttSummary> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.total_cmp(b));
    let n = finite.len();
    let mid = n / 2;
    let median = if n % 2 == 1 { finite[mid] } else { 0.5 * (finite[mid - 1] + finite[mid]) };

    Some(VttSummary {
        n,
        mean: finite.iter().sum::<f64>() / n as f64,
        median,
        min: finite[0],
        max: finite[n - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_ignores_non_finite_values() {
        let s = summarize_vtt(&[3.0, f64::NAN, 1.0, 2.0, 10.0]).unwrap();
        assert_eq!(s.n, 4);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 10.0);
        assert!((s.mean - 4.0).abs() < 1e-12);
        assert!(summarize_vtt(&[f64::NAN]).is_none());
    }
}
