//! Raw dataset → validated choice arrays.
//!
//! Rows are choice occasions, grouped by respondent. Every violated rule is
//! collected before returning so that a user can fix a dataset in one pass.

use std::collections::HashMap;

use nalgebra::DMatrix;
use tracing::debug;

use crate::domain::{ModelArrays, Var, VarsMapping};
use crate::error::VttError;
use crate::io::RawDataset;

const MSG_ID: &str = "There are either NAs or (minus) infinite values in ID Variable";
const MSG_PANEL: &str = "Number of choice situations must be equal for all individuals.";
const MSG_DOMINANT: &str = "At least one choice situation have either a cheap-fast or expensive-slow alternative.";
const MSG_CHOICE: &str = "Chosen alternative variable must be either 1 or 2.";
const MSG_EMPTY: &str = "Dataset contains no choice situations.";

/// Column slices resolved for each logical variable.
#[derive(Debug, Clone, Copy)]
pub struct MappedColumns<'a> {
    pub id: &'a [f64],
    pub chosen_alt: &'a [f64],
    pub cost1: &'a [f64],
    pub time1: &'a [f64],
    pub cost2: &'a [f64],
    pub time2: &'a [f64],
}

/// Resolve every logical variable to a dataset column.
pub fn map_columns<'a>(dataset: &'a RawDataset, mapping: &VarsMapping) -> Result<MappedColumns<'a>, VttError> {
    let get = |var: Var| {
        let column = mapping.column(var);
        dataset.column(column).ok_or_else(|| VttError::Mapping {
            var,
            column: column.to_string(),
        })
    };

    Ok(MappedColumns {
        id: get(Var::Id)?,
        chosen_alt: get(Var::ChosenAlt)?,
        cost1: get(Var::Cost1)?,
        time1: get(Var::Time1)?,
        cost2: get(Var::Cost2)?,
        time2: get(Var::Time2)?,
    })
}

/// Build validated [`ModelArrays`] from a dataset and a variable mapping.
pub fn build_model_arrays(dataset: &RawDataset, mapping: &VarsMapping) -> Result<ModelArrays, VttError> {
    let cols = map_columns(dataset, mapping)?;
    let n = cols.id.len();
    if n == 0 {
        return Err(VttError::Validation(vec![MSG_EMPTY.to_string()]));
    }

    let mut errors = Vec::new();

    let ids_finite = cols.id.iter().all(|v| v.is_finite());
    if !ids_finite {
        errors.push(MSG_ID.to_string());
    }

    let panel = if ids_finite { group_respondents(cols.id) } else { None };
    if ids_finite && panel.is_none() {
        errors.push(MSG_PANEL.to_string());
    }

    for (column, label) in [
        (cols.cost1, "Cost of alternative 1"),
        (cols.cost2, "Cost of alternative 2"),
        (cols.time1, "Time of alternative 1"),
        (cols.time2, "Time of alternative 2"),
    ] {
        if !column.iter().all(|v| v.is_finite()) {
            errors.push(format!("There are either NAs or (minus) infinite values in {label}."));
        }
    }

    let occasions: Vec<Occasion> = (0..n)
        .map(|i| Occasion::new(cols.cost1[i], cols.cost2[i], cols.time1[i], cols.time2[i]))
        .collect();

    let all_finite = occasions.iter().all(Occasion::is_finite);
    if all_finite && !occasions.iter().all(Occasion::is_trade_off) {
        errors.push(MSG_DOMINANT.to_string());
    }

    if !cols.chosen_alt.iter().all(|&c| c == 1.0 || c == 2.0) {
        errors.push(MSG_CHOICE.to_string());
    }

    let Some(panel) = panel.filter(|_| errors.is_empty()) else {
        return Err(VttError::Validation(errors));
    };

    let bvtt: Vec<f64> = occasions.iter().map(Occasion::bvtt).collect();
    let choice: Vec<bool> = occasions
        .iter()
        .zip(cols.chosen_alt)
        .map(|(occ, &chosen)| occ.fbe_chosen(chosen))
        .collect();

    let arrays = ModelArrays::new(
        DMatrix::from_row_slice(panel.np, panel.t, &bvtt),
        DMatrix::from_row_slice(panel.np, panel.t, &choice),
        panel.ids,
    );
    debug!(np = arrays.np(), t = arrays.t(), "model arrays built");
    Ok(arrays)
}

#[derive(Debug)]
struct Panel {
    ids: Vec<f64>,
    np: usize,
    t: usize,
}

/// Unique ids in first-appearance order, if every respondent owns one
/// contiguous block of the same length.
fn group_respondents(ids: &[f64]) -> Option<Panel> {
    let mut unique: Vec<f64> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut seen: HashMap<u64, usize> = HashMap::new();

    for &id in ids {
        // -0.0 and 0.0 are the same respondent.
        let key = (id + 0.0).to_bits();
        match seen.get(&key) {
            Some(&idx) if idx + 1 == unique.len() => counts[idx] += 1,
            // Respondent reappears after another one started.
            Some(_) => return None,
            None => {
                seen.insert(key, unique.len());
                unique.push(id);
                counts.push(1);
            }
        }
    }

    let np = unique.len();
    let t = ids.len() / np;
    if ids.len() % np != 0 || counts.iter().any(|&c| c != t) {
        return None;
    }
    Some(Panel { ids: unique, np, t })
}

/// One choice occasion with both alternatives.
#[derive(Debug, Clone, Copy)]
struct Occasion {
    cost: [f64; 2],
    time: [f64; 2],
}

impl Occasion {
    fn new(cost1: f64, cost2: f64, time1: f64, time2: f64) -> Self {
        Self {
            cost: [cost1, cost2],
            time: [time1, time2],
        }
    }

    fn is_finite(&self) -> bool {
        self.cost.iter().chain(&self.time).all(|v| v.is_finite())
    }

    /// Alternative label (1 or 2) with the lower cost; ties go to 1.
    fn cheap_alt(&self) -> u8 {
        if self.cost[0] <= self.cost[1] { 1 } else { 2 }
    }

    /// Alternative label (1 or 2) with the higher time; ties go to 1.
    fn slow_alt(&self) -> u8 {
        if self.time[0] >= self.time[1] { 1 } else { 2 }
    }

    /// Cheaper alternative is the slower one and the times differ.
    fn is_trade_off(&self) -> bool {
        self.cheap_alt() == self.slow_alt() && self.time[0] != self.time[1]
    }

    fn bvtt(&self) -> f64 {
        let cost_lo = self.cost[0].min(self.cost[1]);
        let cost_hi = self.cost[0].max(self.cost[1]);
        let time_lo = self.time[0].min(self.time[1]);
        let time_hi = self.time[0].max(self.time[1]);
        -(cost_lo - cost_hi) / (time_hi - time_lo)
    }

    fn fbe_chosen(&self, chosen: f64) -> bool {
        chosen != f64::from(self.cheap_alt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> VarsMapping {
        VarsMapping::new("RespID", "Chosen", "CostL", "TimeL", "CostR", "TimeR")
    }

    fn dataset(id: &[f64], chosen: &[f64], c1: &[f64], t1: &[f64], c2: &[f64], t2: &[f64]) -> RawDataset {
        RawDataset::from_columns([
            ("RespID", id.to_vec()),
            ("Chosen", chosen.to_vec()),
            ("CostL", c1.to_vec()),
            ("TimeL", t1.to_vec()),
            ("CostR", c2.to_vec()),
            ("TimeR", t2.to_vec()),
        ])
    }

    fn two_by_three() -> RawDataset {
        dataset(
            &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0],
            &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0],
            &[10.0; 6],
            &[5.0; 6],
            &[20.0; 6],
            &[2.0; 6],
        )
    }

    fn messages(err: VttError) -> Vec<String> {
        match err {
            VttError::Validation(list) => list,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn two_respondents_three_occasions() {
        let arrays = build_model_arrays(&two_by_three(), &mapping()).unwrap();
        assert_eq!(arrays.np(), 2);
        assert_eq!(arrays.t(), 3);
        assert_eq!(arrays.bvtt().shape(), (2, 3));
        for &v in arrays.bvtt().iter() {
            assert!((v - 10.0 / 3.0).abs() < 1e-12);
        }
        assert_eq!(arrays.accepts(), &[1, 2]);
        assert_eq!(arrays.id(), &[1.0, 2.0]);
        assert!(!arrays.choice()[(0, 0)]);
        assert!(arrays.choice()[(0, 1)]);
    }

    #[test]
    fn relabeling_alternatives_gives_identical_arrays() {
        let base = build_model_arrays(&two_by_three(), &mapping()).unwrap();
        let swapped = dataset(
            &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0],
            &[2.0, 1.0, 2.0, 1.0, 2.0, 1.0],
            &[20.0; 6],
            &[2.0; 6],
            &[10.0; 6],
            &[5.0; 6],
        );
        let other = build_model_arrays(&swapped, &mapping()).unwrap();
        assert_eq!(base, other);
    }

    #[test]
    fn missing_column_is_a_mapping_error() {
        let mapping = VarsMapping::new("RespID", "Chosen", "CostL", "TimeL", "CostR", "Missing");
        let err = build_model_arrays(&two_by_three(), &mapping).unwrap_err();
        assert_eq!(
            err,
            VttError::Mapping {
                var: Var::Time2,
                column: "Missing".to_string()
            }
        );
    }

    #[test]
    fn unequal_panels_are_rejected() {
        let ds = dataset(
            &[1.0, 1.0, 2.0],
            &[1.0, 1.0, 1.0],
            &[10.0; 3],
            &[5.0; 3],
            &[20.0; 3],
            &[2.0; 3],
        );
        assert_eq!(messages(build_model_arrays(&ds, &mapping()).unwrap_err()), vec![MSG_PANEL]);
    }

    #[test]
    fn divisible_but_uneven_panels_are_rejected() {
        // 4 rows / 2 respondents divides evenly, yet one respondent has 3 rows.
        let ds = dataset(
            &[1.0, 1.0, 1.0, 2.0],
            &[1.0; 4],
            &[10.0; 4],
            &[5.0; 4],
            &[20.0; 4],
            &[2.0; 4],
        );
        assert_eq!(messages(build_model_arrays(&ds, &mapping()).unwrap_err()), vec![MSG_PANEL]);
    }

    #[test]
    fn interleaved_respondents_are_rejected() {
        let ds = dataset(
            &[1.0, 2.0, 1.0, 2.0],
            &[1.0; 4],
            &[10.0; 4],
            &[5.0; 4],
            &[20.0; 4],
            &[2.0; 4],
        );
        assert_eq!(messages(build_model_arrays(&ds, &mapping()).unwrap_err()), vec![MSG_PANEL]);
    }

    #[test]
    fn every_violation_is_reported() {
        let ds = dataset(
            &[1.0, f64::NAN],
            &[1.0, 3.0],
            &[10.0, f64::NAN],
            &[5.0, f64::INFINITY],
            &[20.0, 20.0],
            &[2.0, 2.0],
        );
        let list = messages(build_model_arrays(&ds, &mapping()).unwrap_err());
        assert_eq!(
            list,
            vec![
                MSG_ID.to_string(),
                "There are either NAs or (minus) infinite values in Cost of alternative 1.".to_string(),
                "There are either NAs or (minus) infinite values in Time of alternative 1.".to_string(),
                MSG_CHOICE.to_string(),
            ]
        );
    }

    #[test]
    fn dominated_alternative_is_rejected() {
        // Second occasion: alternative 1 is both cheaper and faster.
        let ds = dataset(
            &[1.0, 1.0],
            &[1.0, 1.0],
            &[10.0, 10.0],
            &[5.0, 1.0],
            &[20.0, 20.0],
            &[2.0, 2.0],
        );
        assert_eq!(messages(build_model_arrays(&ds, &mapping()).unwrap_err()), vec![MSG_DOMINANT]);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let ds = dataset(&[], &[], &[], &[], &[], &[]);
        assert_eq!(messages(build_model_arrays(&ds, &mapping()).unwrap_err()), vec![MSG_EMPTY]);
    }
}
