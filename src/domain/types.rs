//! Shared domain types.
//!
//! These types are intentionally kept small and immutable so they can be:
//!
//! - built once per import and shared read-only by every estimator
//! - passed explicitly into each run (no ambient "current dataset")
//! - exported to JSON/CSV by the front-end

use std::collections::HashMap;
use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Logical variables a survey dataset must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Var {
    Id,
    ChosenAlt,
    Cost1,
    Time1,
    Cost2,
    Time2,
}

impl Var {
    pub const ALL: [Var; 6] = [
        Var::Id,
        Var::ChosenAlt,
        Var::Cost1,
        Var::Time1,
        Var::Cost2,
        Var::Time2,
    ];
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Var::Id => "Id",
            Var::ChosenAlt => "ChosenAlt",
            Var::Cost1 => "Cost1",
            Var::Time1 => "Time1",
            Var::Cost2 => "Cost2",
            Var::Time2 => "Time2",
        };
        f.write_str(name)
    }
}

/// Immutable association between logical variables and dataset column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarsMapping {
    columns: HashMap<Var, String>,
}

impl VarsMapping {
    pub fn new(
        id: impl Into<String>,
        chosen_alt: impl Into<String>,
        cost1: impl Into<String>,
        time1: impl Into<String>,
        cost2: impl Into<String>,
        time2: impl Into<String>,
    ) -> Self {
        let columns = HashMap::from([
            (Var::Id, id.into()),
            (Var::ChosenAlt, chosen_alt.into()),
            (Var::Cost1, cost1.into()),
            (Var::Time1, time1.into()),
            (Var::Cost2, cost2.into()),
            (Var::Time2, time2.into()),
        ]);
        Self { columns }
    }

    /// Column name mapped to `var`.
    pub fn column(&self, var: Var) -> &str {
        // Every key is inserted by `new`.
        self.columns.get(&var).map(String::as_str).unwrap_or_default()
    }
}

/// Per-respondent choice matrices consumed by every estimator.
///
/// Rows are respondents (in order of first appearance in the dataset),
/// columns are choice occasions.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArrays {
    bvtt: DMatrix<f64>,
    choice: DMatrix<bool>,
    accepts: Vec<usize>,
    id: Vec<f64>,
}

impl ModelArrays {
    /// Assemble arrays from already-validated parts.
    ///
    /// `accepts` is derived from `choice`, so the row-sum invariant holds by
    /// construction.
    ///
    /// # Panics
    /// Panics if `bvtt` and `choice` have different shapes or if `id` does not
    /// have one entry per row. The builder in `data::arrays` guarantees both.
    pub fn new(bvtt: DMatrix<f64>, choice: DMatrix<bool>, id: Vec<f64>) -> Self {
        assert_eq!(bvtt.shape(), choice.shape(), "BVTT/choice shape mismatch");
        assert_eq!(bvtt.nrows(), id.len(), "one id per respondent");

        let accepts = (0..choice.nrows())
            .map(|i| choice.row(i).iter().filter(|&&c| c).count())
            .collect();

        Self {
            bvtt,
            choice,
            accepts,
            id,
        }
    }

    /// Break-even VTT, NP×T.
    pub fn bvtt(&self) -> &DMatrix<f64> {
        &self.bvtt
    }

    /// `true` where the fast-but-expensive alternative was chosen, NP×T.
    pub fn choice(&self) -> &DMatrix<bool> {
        &self.choice
    }

    /// Number of FBE choices per respondent.
    pub fn accepts(&self) -> &[usize] {
        &self.accepts
    }

    /// Unique respondent identifiers.
    pub fn id(&self) -> &[f64] {
        &self.id
    }

    /// Number of respondents.
    pub fn np(&self) -> usize {
        self.bvtt.nrows()
    }

    /// Choice occasions per respondent.
    pub fn t(&self) -> usize {
        self.bvtt.ncols()
    }

    /// BVTT values flattened respondent-major.
    pub fn bvtt_flat(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.np() * self.t());
        for i in 0..self.np() {
            out.extend(self.bvtt.row(i).iter().copied());
        }
        out
    }

    /// Choice indicators flattened in the same order as [`Self::bvtt_flat`].
    pub fn choice_flat(&self) -> Vec<bool> {
        let mut out = Vec::with_capacity(self.np() * self.t());
        for i in 0..self.np() {
            out.extend(self.choice.row(i).iter().copied());
        }
        out
    }

    /// Largest BVTT in the sample (`NaN` for empty arrays).
    pub fn bvtt_max(&self) -> f64 {
        self.bvtt.iter().copied().fold(f64::NAN, f64::max)
    }

    /// Per-respondent mean of `choice · BVTT` over all occasions.
    ///
    /// Validated panels have at least one occasion per respondent.
    pub fn mean_accepted_bvtt(&self) -> DVector<f64> {
        let t = self.t() as f64;
        DVector::from_fn(self.np(), |i, _| {
            let mut sum = 0.0;
            for j in 0..self.t() {
                if self.choice[(i, j)] {
                    sum += self.bvtt[(i, j)];
                }
            }
            sum / t
        })
    }
}

/// Summary statistics of a set of model arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub np: usize,
    pub t: usize,
    /// Respondents who always chose the fast-expensive alternative.
    pub nt_fast_exp: usize,
    /// Respondents who always chose the cheap-slow alternative.
    pub nt_cheap_slow: usize,
    /// Mean BVTT over occasions where the FBE alternative was chosen.
    pub chosen_bvtt_mean: f64,
    pub bvtt_min: f64,
    pub bvtt_max: f64,
}

impl fmt::Display for DescriptiveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "No. individuals: {}", self.np)?;
        writeln!(f, "Sets per indiv.: {}", self.t)?;
        writeln!(f)?;
        writeln!(f, "Number of non-traders:")?;
        writeln!(f, "Fast-exp. alt.: {}", self.nt_fast_exp)?;
        writeln!(f, "Slow-cheap alt.: {}", self.nt_cheap_slow)?;
        writeln!(f)?;
        writeln!(f, "BVTT statistics:")?;
        writeln!(f, "Mean chosen BVTT: {:.4}", self.chosen_bvtt_mean)?;
        writeln!(f, "Minimum of BVTT: {:.4}", self.bvtt_min)?;
        write!(f, "Maximum of BVTT: {:.4}", self.bvtt_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_are_row_sums_of_choice() {
        let bvtt = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let choice = DMatrix::from_row_slice(2, 3, &[true, false, true, false, false, false]);
        let arrays = ModelArrays::new(bvtt, choice, vec![10.0, 20.0]);

        assert_eq!(arrays.accepts(), &[2, 0]);
        assert_eq!(arrays.np(), 2);
        assert_eq!(arrays.t(), 3);
        assert_eq!(arrays.bvtt_flat(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!((arrays.mean_accepted_bvtt()[0] - 4.0 / 3.0).abs() < 1e-12);
        assert!((arrays.bvtt_max() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn mapping_resolves_every_var() {
        let mapping = VarsMapping::new("RespID", "Chosen", "CostL", "TimeL", "CostR", "TimeR");
        for var in Var::ALL {
            assert!(!mapping.column(var).is_empty());
        }
        assert_eq!(mapping.column(Var::Time2), "TimeR");
    }
}
