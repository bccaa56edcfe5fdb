//! Formatted terminal output.
//!
//! Formatting lives here so estimator code stays free of presentation and
//! output changes stay localized.

use crate::domain::DescriptiveStats;
use crate::fit::{
    AnnEstimate, Coefficient, Estimate, FitSummary, LConstantEstimate, LocLogitEstimate, LogisticEstimate,
    RouwendalEstimate, RvEstimate,
};
use crate::report::summarize_vtt;

pub fn format_descriptives(stats: &DescriptiveStats) -> String {
    format!("=== vtt - Descriptive statistics ===\n{stats}\n")
}

/// Format any estimate with its family-specific layout.
pub fn format_estimate(estimate: &Estimate) -> String {
    match estimate {
        Estimate::Logistic(e) => format_logistic(e),
        Estimate::Rv(e) => format_rv(e),
        Estimate::Rouwendal(e) => format_rouwendal(e),
        Estimate::LocLogit(e) => format_loclogit(e),
        Estimate::LConstant(e) => format_lconstant(e),
        Estimate::Ann(e) => format_ann(e),
    }
}

pub fn format_logistic(e: &LogisticEstimate) -> String {
    let mut out = String::from("=== vtt - Logistic regression ===\n");
    out.push_str(&format_fit_summary(&e.summary));
    out.push('\n');
    out.push_str(&format_coefficients(&e.coefficients));
    out.push('\n');
    out.push_str(&format_vtt_sample("Predicted VTT", &e.vtt));
    out
}

pub fn format_rv(e: &RvEstimate) -> String {
    let mut out = String::from("=== vtt - Random valuation ===\n");
    out.push_str(&format_fit_summary(&e.summary));
    out.push('\n');
    out.push_str(&format_coefficients(&e.coefficients));
    out
}

pub fn format_rouwendal(e: &RouwendalEstimate) -> String {
    let mut out = String::from("=== vtt - Rouwendal ===\n");
    out.push_str(&format_fit_summary(&e.summary));
    out.push_str(&format!(
        "Prob. of consistent choice: {:.4} (s.e. {})\n\n",
        e.q_prob,
        fmt_num(e.q_prob_se)
    ));

    out.push_str(&format!("{:>10} {:>10} {:>10} {:>10}\n", "vtt", "weight", "f(vtt)", "F(vtt)"));
    out.push_str(&format!("{:-<10} {:-<10} {:-<10} {:-<10}\n", "", "", "", ""));
    for i in 0..e.grid.len() {
        out.push_str(&format!(
            "{:>10.3} {:>10.4} {:>10.4} {:>10.4}\n",
            e.grid[i], e.weights[i], e.fvtt[i], e.cdf[i]
        ));
    }
    out.push('\n');
    out.push_str(&format_vtt_sample("Simulated VTT", &e.vtt));
    out
}

pub fn format_loclogit(e: &LocLogitEstimate) -> String {
    let mut out = String::from("=== vtt - Local logit ===\n");
    out.push_str(&format!("Kernel width: {:.4}\n", e.kernel_width));
    out.push_str(&format!("Log-likelihood: {:.4}\n", e.ll));
    let converged = e.statuses.iter().filter(|s| s.is_converged()).count();
    out.push_str(&format!("Converged grid points: {converged}/{}\n\n", e.statuses.len()));
    out.push_str(&format_cdf_table(&e.grid, &e.cdf));
    out.push('\n');
    out.push_str(&format_vtt_sample("Simulated VTT", &e.vtt));
    out
}

pub fn format_lconstant(e: &LConstantEstimate) -> String {
    let title = if e.index_scale.is_some() { "Klein-Spady" } else { "Local constant" };
    let mut out = format!("=== vtt - {title} ===\n");
    if let Some(summary) = &e.summary {
        out.push_str(&format_fit_summary(summary));
    }
    if let Some(scale) = &e.index_scale {
        out.push_str(&format!(
            "Index scale ln(gamma): {:.4} (s.e. {})\n",
            scale.estimate,
            fmt_num(scale.std_err)
        ));
    }
    out.push_str(&format!("Bandwidth: {:.4}\n\n", e.bandwidth));
    out.push_str(&format_cdf_table(&e.grid, &e.cdf));
    out.push('\n');
    out.push_str(&format_vtt_sample("Simulated VTT", &e.vtt));
    out
}

pub fn format_ann(e: &AnnEstimate) -> String {
    let mut out = String::from("=== vtt - ANN ===\n");
    out.push_str(&format!("{:>6} {:>14} {:>8}\n", "repeat", "log-lik", "rho^2"));
    out.push_str(&format!("{:-<6} {:-<14} {:-<8}\n", "", "", ""));
    for (r, (ll, rho)) in e.ll.iter().zip(&e.rho_sq).enumerate() {
        out.push_str(&format!("{:>6} {:>14.4} {:>8.4}\n", r + 1, ll, rho));
    }
    out.push('\n');
    out.push_str(&format_vtt_sample("Mean VTT over repeats", &e.mean_vtt()));
    out
}

pub fn format_fit_summary(summary: &FitSummary) -> String {
    format!(
        "Initial log-likelihood: {:.4}\nFinal log-likelihood: {:.4}\nOptimizer: {} (code {}, {} iterations)\n",
        summary.initial_ll,
        summary.final_ll,
        summary.status.description(),
        summary.status_code,
        summary.iterations
    )
}

pub fn format_coefficients(coefficients: &[Coefficient]) -> String {
    let mut out = format!("{:<12} {:>12} {:>12}\n", "parameter", "estimate", "std. err.");
    out.push_str(&format!("{:-<12} {:-<12} {:-<12}\n", "", "", ""));
    for c in coefficients {
        out.push_str(&format!("{:<12} {:>12.4} {:>12}\n", c.name, c.estimate, fmt_num(c.std_err)));
    }
    out
}

fn format_cdf_table(grid: &[f64], cdf: &[f64]) -> String {
    let mut out = format!("{:>10} {:>10}\n", "vtt", "F(vtt)");
    out.push_str(&format!("{:-<10} {:-<10}\n", "", ""));
    for (x, f) in grid.iter().zip(cdf) {
        out.push_str(&format!("{x:>10.3} {:>10}\n", fmt_num(*f)));
    }
    out
}

fn format_vtt_sample(label: &str, values: &[f64]) -> String {
    match summarize_vtt(values) {
        Some(s) => format!(
            "{label}: n={} mean={:.4} median={:.4} min={:.4} max={:.4}\n",
            s.n, s.mean, s.median, s.min, s.max
        ),
        None => format!("{label}: no finite values\n"),
    }
}

fn fmt_num(v: f64) -> String {
    if v.is_finite() { format!("{v:.4}") } else { "n/a".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::MinimizeStatus;

    fn summary() -> FitSummary {
        FitSummary {
            initial_ll: -120.0,
            final_ll: -80.5,
            status: MinimizeStatus::Converged,
            status_code: 0,
            iterations: 12,
        }
    }

    #[test]
    fn rv_report_lists_coefficients() {
        let e = RvEstimate {
            coefficients: vec![Coefficient::new("scale", 1.2, 0.1), Coefficient::new("vtt", 5.5, f64::NAN)],
            summary: summary(),
        };
        let text = format_estimate(&Estimate::Rv(e));
        assert!(text.contains("Random valuation"));
        assert!(text.contains("Final log-likelihood: -80.5000"));
        assert!(text.contains("vtt"));
        assert!(text.contains("n/a"));
    }

    #[test]
    fn ann_report_has_one_row_per_repeat() {
        let e = AnnEstimate {
            ll: vec![-10.0, -11.0],
            rho_sq: vec![0.2, 0.1],
            vtt: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            simulation_grid: vec![0.0, 1.0],
        };
        let text = format_ann(&e);
        assert!(text.contains("-10.0000"));
        assert!(text.contains("-11.0000"));
        assert!(text.contains("mean=2.5000"));
    }
}
