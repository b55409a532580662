//! Case-indexed reference table of expected parameter values.
//!
//! One row per case, one column per [`Parameter`] plus a `case` column.
//! Loaded once and shared read-only (typically behind an `Arc`) by every
//! evaluation.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::{
    DeliveryMode, ExtractedParameterSet, Parameter, ParameterValue, PlanCheckError, Result,
};
use crate::grammar::{is_open_position, split_list, ANY_VALUE};

/// Header of the case-number column.
pub const CASE_COLUMN: &str = "case";

/// Expected cells per parameter, indexed by 1-based case number.
#[derive(Debug, Clone, PartialEq)]
pub struct TruthTable {
    cases: Vec<String>,
    columns: BTreeMap<Parameter, Vec<String>>,
}

impl TruthTable {
    /// Build a table from parsed columns.
    ///
    /// Every parameter column must be present and as long as the case column.
    pub fn new(cases: Vec<String>, columns: BTreeMap<Parameter, Vec<String>>) -> Result<Self> {
        if cases.is_empty() {
            return Err(PlanCheckError::EmptyTruthTable);
        }
        for parameter in Parameter::ALL {
            let column = columns
                .get(&parameter)
                .ok_or_else(|| PlanCheckError::MissingColumn(parameter.column_name().to_string()))?;
            if column.len() != cases.len() {
                return Err(PlanCheckError::ColumnLength {
                    column: parameter.column_name().to_string(),
                    expected: cases.len(),
                    actual: column.len(),
                });
            }
        }
        Ok(Self { cases, columns })
    }

    /// Build a table from `(header, cells)` pairs. Unknown headers are ignored.
    pub fn from_named_columns<I, K, V>(named: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut cases = None;
        let mut columns = BTreeMap::new();
        for (name, cells) in named {
            let name = name.as_ref().trim();
            let cells: Vec<String> = cells.into_iter().map(Into::into).collect();
            if name.eq_ignore_ascii_case(CASE_COLUMN) {
                cases = Some(cells);
                continue;
            }
            match name.parse::<Parameter>() {
                Ok(parameter) => {
                    columns.insert(parameter, cells);
                }
                Err(_) => debug!(column = %name, "ignoring unknown truth table column"),
            }
        }
        let cases = cases.ok_or_else(|| PlanCheckError::MissingColumn(CASE_COLUMN.to_string()))?;
        Self::new(cases, columns)
    }

    /// Parse CSV with a header row. Cells are trimmed; quoted cells may contain commas.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (column, cell) in cells.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }

        let table = Self::from_named_columns(headers.into_iter().zip(cells))?;
        debug!(cases = table.case_count(), "truth table loaded");
        Ok(table)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Number of cases (rows).
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// The `case` column as loaded.
    pub fn case_labels(&self) -> &[String] {
        &self.cases
    }

    /// Fails unless `case` lies in `[1, case_count()]`.
    pub fn check_case(&self, case: usize) -> Result<()> {
        if case == 0 || case > self.case_count() {
            return Err(PlanCheckError::InvalidCaseNumber {
                case,
                cases: self.case_count(),
            });
        }
        Ok(())
    }

    /// Expected cell for `parameter` in 1-based `case`.
    pub fn cell(&self, parameter: Parameter, case: usize) -> Result<&str> {
        self.check_case(case)?;
        self.columns
            .get(&parameter)
            .and_then(|column| column.get(case - 1))
            .map(String::as_str)
            .ok_or_else(|| PlanCheckError::MissingColumn(parameter.column_name().to_string()))
    }

    /// A row as if it had been extracted from a conforming plan.
    ///
    /// The SSD cell becomes samples: open positions turn into `0.0`
    /// placeholders and a whole-cell `-` into an empty list. Mode is IMRT.
    pub fn row_as_values(&self, case: usize) -> Result<ExtractedParameterSet> {
        let mut known = Vec::with_capacity(Parameter::ALL.len());
        for parameter in Parameter::ALL {
            let cell = self.cell(parameter, case)?;
            let value = match parameter {
                Parameter::Ssd => ParameterValue::Samples(ssd_cell_samples(cell)),
                _ => ParameterValue::text(cell),
            };
            known.push((parameter, value));
        }
        Ok(ExtractedParameterSet::from_values(DeliveryMode::Imrt, known))
    }

    /// SHA-256 hex digest of the table content, for report provenance.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(CASE_COLUMN.as_bytes());
        for parameter in Parameter::ALL {
            hasher.update(b"\x1f");
            hasher.update(parameter.column_name().as_bytes());
        }
        for (index, case) in self.cases.iter().enumerate() {
            hasher.update(b"\x1e");
            hasher.update(case.as_bytes());
            for column in self.columns.values() {
                hasher.update(b"\x1f");
                hasher.update(column[index].as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

fn ssd_cell_samples(cell: &str) -> Vec<f64> {
    if cell == ANY_VALUE {
        return Vec::new();
    }
    split_list(cell)
        .map(|entry| {
            if is_open_position(entry) {
                0.0
            } else {
                entry.parse().unwrap_or(0.0)
            }
        })
        .collect()
}
