//! Export estimation results to CSV and JSON.
//!
//! CSV exports are plain tables meant for spreadsheets or downstream scripts;
//! the JSON export is the full serialized estimate plus run metadata.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::fit::Estimate;

const EXPORT_EXIT_CODE: u8 = 4;

/// Write respondent-level VTT (or simulated draws for grid families) to CSV.
///
/// - logistic: `id,vtt`
/// - random valuation: `id,vtt` with the single estimated VTT on every row
/// - ANN: `id,vtt_r1,..,vtt_rR`
/// - grid families: `draw,vtt` for the simulated sample
pub fn write_vtt_csv(path: &Path, estimate: &Estimate, ids: &[f64]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| export_error(format!("Failed to create VTT CSV '{}': {e}", path.display())))?;

    match estimate {
        Estimate::Logistic(e) => {
            write_row(&mut wtr, ["id", "vtt"])?;
            for (id, v) in ids.iter().zip(&e.vtt) {
                write_row(&mut wtr, [fmt_id(*id), v.to_string()])?;
            }
        }
        Estimate::Rv(e) => {
            write_row(&mut wtr, ["id", "vtt"])?;
            let vtt = e.vtt().to_string();
            for id in ids {
                write_row(&mut wtr, [fmt_id(*id), vtt.clone()])?;
            }
        }
        Estimate::Ann(e) => {
            let mut header = vec!["id".to_string()];
            header.extend((1..=e.vtt.len()).map(|r| format!("vtt_r{r}")));
            write_row(&mut wtr, &header)?;
            for (i, id) in ids.iter().enumerate() {
                let mut row = vec![fmt_id(*id)];
                row.extend(e.vtt.iter().map(|rep| rep.get(i).map(f64::to_string).unwrap_or_default()));
                write_row(&mut wtr, &row)?;
            }
        }
        Estimate::Rouwendal(e) => write_draws(&mut wtr, &e.vtt)?,
        Estimate::LocLogit(e) => write_draws(&mut wtr, &e.vtt)?,
        Estimate::LConstant(e) => write_draws(&mut wtr, &e.vtt)?,
    }

    wtr.flush()
        .map_err(|e| export_error(format!("Failed to write VTT CSV: {e}")))
}

/// Write an estimated CDF as `vtt,cdf` rows.
pub fn write_cdf_csv(path: &Path, grid: &[f64], cdf: &[f64]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| export_error(format!("Failed to create CDF CSV '{}': {e}", path.display())))?;

    writeln!(file, "vtt,cdf").map_err(|e| export_error(format!("Failed to write CDF CSV header: {e}")))?;
    for (x, f) in grid.iter().zip(cdf) {
        writeln!(file, "{x:.10},{f:.10}").map_err(|e| export_error(format!("Failed to write CDF CSV row: {e}")))?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct EstimateFile<'a> {
    tool: &'static str,
    created_at: DateTime<Utc>,
    respondents: usize,
    estimate: &'a Estimate,
}

/// Write the full estimate as pretty-printed JSON.
pub fn write_estimate_json(path: &Path, estimate: &Estimate, respondents: usize) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| export_error(format!("Failed to create estimate JSON '{}': {e}", path.display())))?;

    let doc = EstimateFile {
        tool: "vtt",
        created_at: Utc::now(),
        respondents,
        estimate,
    };
    serde_json::to_writer_pretty(file, &doc).map_err(|e| export_error(format!("Failed to write estimate JSON: {e}")))
}

fn write_draws(wtr: &mut csv::Writer<File>, draws: &[f64]) -> Result<(), AppError> {
    write_row(wtr, ["draw", "vtt"])?;
    for (i, v) in draws.iter().enumerate() {
        write_row(wtr, [(i + 1).to_string(), v.to_string()])?;
    }
    Ok(())
}

fn write_row<I, T>(wtr: &mut csv::Writer<File>, row: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    wtr.write_record(row)
        .map_err(|e| export_error(format!("Failed to write VTT CSV row: {e}")))
}

/// Integral ids print without a fractional part.
fn fmt_id(id: f64) -> String {
    if id.fract() == 0.0 && id.abs() < 1e15 { format!("{}", id as i64) } else { id.to_string() }
}

fn export_error(message: String) -> AppError {
    AppError::new(EXPORT_EXIT_CODE, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{AnnEstimate, Coefficient, FitSummary, RvEstimate};
    use crate::math::MinimizeStatus;

    #[test]
    fn ann_csv_has_one_column_per_repeat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vtt.csv");
        let e = Estimate::Ann(AnnEstimate {
            ll: vec![-1.0, -2.0],
            rho_sq: vec![0.1, 0.2],
            vtt: vec![vec![1.5, 2.5], vec![3.5, 4.5]],
            simulation_grid: vec![0.0, 1.0],
        });
        write_vtt_csv(&path, &e, &[10.0, 11.0]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["id,vtt_r1,vtt_r2", "10,1.5,3.5", "11,2.5,4.5"]);
    }

    #[test]
    fn rv_csv_repeats_the_point_estimate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vtt.csv");
        let e = Estimate::Rv(RvEstimate {
            coefficients: vec![Coefficient::new("scale", 1.0, 0.1), Coefficient::new("vtt", 4.0, 0.2)],
            summary: FitSummary {
                initial_ll: -2.0,
                final_ll: -1.0,
                status: MinimizeStatus::Converged,
                status_code: 0,
                iterations: 3,
            },
        });
        write_vtt_csv(&path, &e, &[1.0, 2.0]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["id,vtt", "1,4", "2,4"]);
    }

    #[test]
    fn cdf_csv_writes_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdf.csv");
        write_cdf_csv(&path, &[1.0, 2.0], &[0.25, 1.0]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("vtt,cdf\n1.0000000000,0.2500000000\n"));
    }

    #[test]
    fn missing_directory_is_an_export_error() {
        let err = write_cdf_csv(Path::new("/nonexistent-dir/cdf.csv"), &[], &[]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
