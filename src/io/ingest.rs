//! Delimited-text ingest.
//!
//! Turns a survey export (tab, comma or semicolon separated, header row
//! required) into a [`RawDataset`] of named numeric columns. Cells that are
//! empty, `NA` or otherwise non-numeric become `NaN`; the array builder
//! reports them later together with every other data problem.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::error::AppError;

/// Named numeric columns, rows ordered by respondent then occasion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
}

impl RawDataset {
    /// Build a dataset from `(name, values)` pairs.
    ///
    /// Columns shorter than the longest one are padded with `NaN`.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut ds = RawDataset::default();
        for (name, values) in columns {
            ds.push_column(name.into(), values);
        }
        let n = ds.nrows();
        for col in &mut ds.columns {
            col.resize(n, f64::NAN);
        }
        ds
    }

    fn push_column(&mut self, name: String, values: Vec<f64>) {
        let key = normalize_header_name(&name);
        self.index.insert(key, self.columns.len());
        self.names.push(name);
        self.columns.push(values);
    }

    /// Column values by name (case-insensitive, surrounding whitespace ignored).
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.index.get(&normalize_header_name(name))?;
        self.columns.get(*idx).map(Vec::as_slice)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn nrows(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Parse a delimited file into a [`RawDataset`].
///
/// `delimiter` of `None` sniffs the header line for tab, semicolon or comma
/// (in that order of preference).
pub fn load_dataset(path: &Path, delimiter: Option<u8>) -> Result<RawDataset, AppError> {
    let delimiter = match delimiter {
        Some(d) => d,
        None => sniff_delimiter(path)?,
    };

    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open data file '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read header row: {e}")))?
        .clone();

    if headers.is_empty() {
        return Err(AppError::new(2, format!("'{}' has no header row.", path.display())));
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    let mut non_numeric = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("Parse error on line {line}: {e}")))?;
        non_numeric += push_record(&record, &mut columns);
    }

    if non_numeric > 0 {
        warn!(cells = non_numeric, "non-numeric cells read as missing");
    }

    let ds = RawDataset::from_columns(
        headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .zip(columns),
    );
    debug!(rows = ds.nrows(), columns = ds.names().len(), "dataset loaded");
    Ok(ds)
}

/// Append one record; returns the number of non-empty cells that failed to parse.
fn push_record(record: &StringRecord, columns: &mut [Vec<f64>]) -> usize {
    let mut bad = 0;
    for (j, col) in columns.iter_mut().enumerate() {
        let cell = record.get(j).unwrap_or("");
        let (value, ok) = parse_cell(cell);
        if !ok {
            bad += 1;
        }
        col.push(value);
    }
    bad
}

/// Parse a single cell. Missing markers yield `(NaN, true)`; junk yields `(NaN, false)`.
fn parse_cell(cell: &str) -> (f64, bool) {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return (f64::NAN, true);
    }
    match cell.parse::<f64>() {
        Ok(v) => (v, true),
        // Decimal comma, as exported by some spreadsheet locales.
        Err(_) => match cell.replace(',', ".").parse::<f64>() {
            Ok(v) => (v, true),
            Err(_) => (f64::NAN, false),
        },
    }
}

fn sniff_delimiter(path: &Path) -> Result<u8, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to open data file '{}': {e}", path.display())))?;
    let header = text.lines().next().unwrap_or("");
    let delimiter = [b'\t', b';', b','].into_iter().find(|&d| header.contains(d as char));
    Ok(delimiter.unwrap_or(b','))
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes put a BOM in front of the first header.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_parse_missing_markers_as_nan() {
        assert!(parse_cell("NA").0.is_nan());
        assert!(parse_cell("").0.is_nan());
        assert!(parse_cell("NA").1);
        assert_eq!(parse_cell("2,5"), (2.5, true));
        let (v, ok) = parse_cell("abc");
        assert!(v.is_nan() && !ok);
    }

    #[test]
    fn column_lookup_ignores_case_and_bom() {
        let ds = RawDataset::from_columns([("\u{feff}RespID", vec![1.0, 1.0]), ("CostL", vec![2.0])]);
        assert_eq!(ds.column("respid"), Some(&[1.0, 1.0][..]));
        let cost = ds.column("COSTL").unwrap();
        assert_eq!(cost.len(), 2);
        assert!(cost[1].is_nan());
        assert!(ds.column("TimeL").is_none());
    }
}
