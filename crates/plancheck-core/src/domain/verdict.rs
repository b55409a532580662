//! Per-parameter verdicts and the evaluation result map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::parameter::Parameter;
use super::value::DeliveryMode;

/// Outcome of comparing one extracted value against its truth cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// Informational parameter; never gates the audit.
    NotApplicable,
    /// No extraction rule for this parameter.
    NotImplemented,
    /// The truth cell violates its grammar. A reference-data defect, not a plan defect.
    TruthTableError,
    /// Field size defined by MLC leaves only; not extracted.
    UnsupportedDevice,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::NotApplicable => "N/A",
            Verdict::NotImplemented => "NOT IMPLEMENTED",
            Verdict::TruthTableError => "TRUTH TABLE ERROR",
            Verdict::UnsupportedDevice => "NOT IMPLEMENTED FOR MLCX/MLCY",
        }
    }

    pub fn from_match(matched: bool) -> Self {
        if matched {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// Whether this verdict makes the whole audit fail.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Verdict::Fail | Verdict::TruthTableError)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict per parameter for one plan against one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 1-based case number evaluated against.
    pub case: usize,
    pub mode: DeliveryMode,
    pub verdicts: BTreeMap<Parameter, Verdict>,
}

impl EvaluationResult {
    pub fn get(&self, parameter: Parameter) -> Option<Verdict> {
        self.verdicts.get(&parameter).copied()
    }

    /// Whether no verdict is blocking.
    pub fn passed(&self) -> bool {
        !self.verdicts.values().any(Verdict::is_blocking)
    }

    /// Number of parameters with the given verdict.
    pub fn count(&self, verdict: Verdict) -> usize {
        self.verdicts.values().filter(|v| **v == verdict).count()
    }

    /// Parameters whose verdict is blocking, in reporting order.
    pub fn blocking(&self) -> Vec<Parameter> {
        self.verdicts
            .iter()
            .filter(|(_, v)| v.is_blocking())
            .map(|(p, _)| *p)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(verdicts: &[(Parameter, Verdict)]) -> EvaluationResult {
        EvaluationResult {
            case: 1,
            mode: DeliveryMode::Imrt,
            verdicts: verdicts.iter().copied().collect(),
        }
    }

    #[test]
    fn passed_ignores_informational_verdicts() {
        let r = result(&[
            (Parameter::Gantry, Verdict::Pass),
            (Parameter::Energy, Verdict::NotApplicable),
            (Parameter::Couch, Verdict::NotImplemented),
            (Parameter::FieldSize, Verdict::UnsupportedDevice),
        ]);
        assert!(r.passed());
        assert!(r.blocking().is_empty());
    }

    #[test]
    fn truth_table_error_blocks() {
        let r = result(&[
            (Parameter::Gantry, Verdict::TruthTableError),
            (Parameter::Wedge, Verdict::Fail),
            (Parameter::Ssd, Verdict::Pass),
        ]);
        assert!(!r.passed());
        assert_eq!(r.blocking(), vec![Parameter::Gantry, Parameter::Wedge]);
        assert_eq!(r.count(Verdict::Pass), 1);
    }

    #[test]
    fn display_strings() {
        assert_eq!(Verdict::NotApplicable.to_string(), "N/A");
        assert_eq!(Verdict::TruthTableError.to_string(), "TRUTH TABLE ERROR");
    }
}
