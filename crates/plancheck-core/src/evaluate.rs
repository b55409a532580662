//! Truth-table evaluation.
//!
//! Compares an [`ExtractedParameterSet`] against one case of a
//! [`TruthTable`], producing a [`Verdict`] per parameter. Each parameter has
//! a dedicated rule; rules that need sibling values (SSD reads the gantry
//! samples and the gantry truth cell) get them from the shared
//! [`EvaluationContext`].

use std::collections::BTreeMap;

use crate::config::AuditConfig;
use crate::domain::{
    DeliveryMode, EvaluationResult, ExtractedParameterSet, Parameter, ParameterValue, Result,
    Verdict,
};
use crate::grammar::{
    is_open_position, split_list, CellGrammar, ANY_VALUE, NEGATION_PREFIX, NOT_EXTRACTED,
    NO_WEDGE,
};
use crate::obs;
use crate::truth_table::TruthTable;

/// Read-only context shared by every rule within one evaluation.
///
/// # Cross-parameter contract
///
/// The SSD rule for arc deliveries pairs the truth table's gantry list with
/// its SSD list for `case`, and the extracted gantry samples with the
/// extracted SSD samples. No other rule reads sibling parameters.
pub struct EvaluationContext<'a> {
    pub values: &'a ExtractedParameterSet,
    pub truth_table: &'a TruthTable,
    /// 1-based, already range-checked.
    pub case: usize,
    pub mode: DeliveryMode,
    pub config: &'a AuditConfig,
}

impl<'a> EvaluationContext<'a> {
    /// Truth cell of another parameter for the current case.
    pub fn expected(&self, parameter: Parameter) -> Option<&'a str> {
        self.truth_table.cell(parameter, self.case).ok()
    }
}

/// A per-parameter evaluation rule: `(extracted, truth cell, context) -> verdict`.
pub type EvaluatorFn = fn(&ParameterValue, &str, &EvaluationContext<'_>) -> Verdict;

/// Rule registry.
pub fn evaluator_for(parameter: Parameter) -> EvaluatorFn {
    match parameter {
        Parameter::Mode | Parameter::Energy => evaluate_informational,
        Parameter::PrescriptionDose => evaluate_prescription_dose,
        Parameter::Collimator => evaluate_collimator,
        Parameter::Gantry => evaluate_gantry,
        Parameter::Ssd => evaluate_ssd,
        Parameter::FieldSize => evaluate_field_size,
        Parameter::Wedge => evaluate_wedge,
        Parameter::PrescriptionPoint
        | Parameter::IsocenterPoint
        | Parameter::Override
        | Parameter::Couch
        | Parameter::Meas => evaluate_default,
    }
}

/// Grades extracted values against truth-table cases.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: AuditConfig,
}

impl Evaluator {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Evaluate every parameter against `case` (1-based).
    ///
    /// Fails with `InvalidCaseNumber` before any rule runs when `case` is
    /// outside `[1, truth_table.case_count()]`. Values that could not be
    /// extracted grade `NotImplemented` without consulting their rule.
    pub fn evaluate(
        &self,
        values: &ExtractedParameterSet,
        truth_table: &TruthTable,
        case: usize,
    ) -> Result<EvaluationResult> {
        truth_table.check_case(case)?;

        let ctx = EvaluationContext {
            values,
            truth_table,
            case,
            mode: values.mode,
            config: &self.config,
        };

        let mut verdicts = BTreeMap::new();
        for (parameter, value) in values.iter() {
            // An extraction gap is not a plan defect.
            let verdict = match value {
                ParameterValue::NotImplemented | ParameterValue::Error(_) => {
                    Verdict::NotImplemented
                }
                _ => {
                    let cell = truth_table.cell(parameter, case)?;
                    let verdict = evaluator_for(parameter)(value, cell, &ctx);
                    if verdict == Verdict::TruthTableError {
                        obs::emit_truth_table_error(parameter, case, cell);
                    }
                    verdict
                }
            };
            verdicts.insert(parameter, verdict);
        }

        let result = EvaluationResult {
            case,
            mode: values.mode,
            verdicts,
        };
        obs::emit_evaluation_finished(
            case,
            result.count(Verdict::Pass),
            result.blocking().len(),
            result.passed(),
        );
        Ok(result)
    }
}

/// Evaluate with the default configuration.
pub fn evaluate(
    values: &ExtractedParameterSet,
    truth_table: &TruthTable,
    case: usize,
) -> Result<EvaluationResult> {
    Evaluator::default().evaluate(values, truth_table, case)
}

fn evaluate_default(value: &ParameterValue, cell: &str, _ctx: &EvaluationContext<'_>) -> Verdict {
    if cell == ANY_VALUE {
        return Verdict::Pass;
    }
    Verdict::from_match(value.as_text() == Some(cell))
}

fn evaluate_informational(
    _value: &ParameterValue,
    _cell: &str,
    _ctx: &EvaluationContext<'_>,
) -> Verdict {
    Verdict::NotApplicable
}

/// Arcs always pass: a rotating beam has no single angle per position.
/// Grammar errors still take precedence.
fn evaluate_gantry(value: &ParameterValue, cell: &str, ctx: &EvaluationContext<'_>) -> Verdict {
    if !CellGrammar::Angles.accepts(cell) {
        return Verdict::TruthTableError;
    }
    if ctx.mode.is_vmat() || cell == ANY_VALUE {
        return Verdict::Pass;
    }
    Verdict::from_match(value.as_text() == Some(cell))
}

fn evaluate_ssd(value: &ParameterValue, cell: &str, ctx: &EvaluationContext<'_>) -> Verdict {
    if cell == ANY_VALUE {
        return Verdict::Pass;
    }
    if !CellGrammar::Distances.accepts(cell) {
        return Verdict::TruthTableError;
    }
    if ctx.mode.is_vmat() {
        evaluate_arc_ssd(value, cell, ctx)
    } else {
        evaluate_beam_ssd(value, cell, ctx.config.ssd_tolerance_cm)
    }
}

/// Positional comparison, one expected SSD per beam.
fn evaluate_beam_ssd(value: &ParameterValue, cell: &str, tolerance: f64) -> Verdict {
    let Some(samples) = value.as_samples() else {
        return Verdict::Fail;
    };
    let expected: Vec<&str> = split_list(cell).collect();
    if expected.len() != samples.len() {
        return Verdict::Fail;
    }

    for (entry, actual) in expected.iter().zip(samples) {
        if is_open_position(entry) {
            continue;
        }
        let Ok(expected) = entry.parse::<f64>() else {
            return Verdict::TruthTableError;
        };
        if (expected - actual).abs() > tolerance {
            return Verdict::Fail;
        }
    }
    Verdict::Pass
}

/// Arc comparison: every extracted sample whose gantry angle falls within
/// the window of an expected angle must be within tolerance of that
/// angle's expected SSD.
///
/// A wildcard gantry truth cell leaves nothing to pair the SSD list with,
/// so a constrained SSD cell FAILs.
fn evaluate_arc_ssd(value: &ParameterValue, cell: &str, ctx: &EvaluationContext<'_>) -> Verdict {
    let Some(gantry_cell) = ctx.expected(Parameter::Gantry) else {
        return Verdict::TruthTableError;
    };
    if gantry_cell == ANY_VALUE {
        return Verdict::Fail;
    }
    if !CellGrammar::Angles.accepts(gantry_cell) {
        return Verdict::TruthTableError;
    }

    let (Some(angles), Some(ssds)) = (ctx.values.get(Parameter::Gantry).as_samples(), value.as_samples())
    else {
        return Verdict::Fail;
    };
    if angles.len() != ssds.len() {
        return Verdict::Fail;
    }

    let expected_angles: Vec<&str> = split_list(gantry_cell).collect();
    let expected_ssds: Vec<&str> = split_list(cell).collect();
    if expected_angles.len() != expected_ssds.len() {
        return Verdict::Fail;
    }

    let window = ctx.config.vmat_gantry_window_deg;
    let tolerance = ctx.config.ssd_tolerance_cm;
    for (angle_entry, ssd_entry) in expected_angles.iter().zip(&expected_ssds) {
        if is_open_position(angle_entry) || is_open_position(ssd_entry) {
            continue;
        }
        let (Ok(angle), Ok(ssd)) = (angle_entry.parse::<f64>(), ssd_entry.parse::<f64>()) else {
            return Verdict::TruthTableError;
        };
        let violated = angles
            .iter()
            .zip(ssds)
            .any(|(a, s)| (a - angle).abs() < window && (s - ssd).abs() > tolerance);
        if violated {
            return Verdict::Fail;
        }
    }
    Verdict::Pass
}

fn evaluate_wedge(value: &ParameterValue, cell: &str, _ctx: &EvaluationContext<'_>) -> Verdict {
    if !CellGrammar::Wedges.accepts(cell) {
        return Verdict::TruthTableError;
    }
    if cell == ANY_VALUE {
        return Verdict::Pass;
    }
    let Some(text) = value.as_text() else {
        return Verdict::Fail;
    };
    if cell == NO_WEDGE {
        return Verdict::from_match(split_list(text).all(|w| w == NO_WEDGE));
    }
    Verdict::from_match(text == cell)
}

/// `dose/fractions/unit`, field by field; `-` exempts a field.
fn evaluate_prescription_dose(
    value: &ParameterValue,
    cell: &str,
    _ctx: &EvaluationContext<'_>,
) -> Verdict {
    if cell == ANY_VALUE {
        return Verdict::Pass;
    }
    let expected: Vec<&str> = cell.split('/').map(str::trim).collect();
    if expected.len() != 3 {
        return Verdict::TruthTableError;
    }
    let Some(text) = value.as_text() else {
        return Verdict::Fail;
    };
    let actual: Vec<&str> = text.split('/').map(str::trim).collect();
    if actual.len() != 3 {
        return Verdict::Fail;
    }
    Verdict::from_match(
        expected
            .iter()
            .zip(&actual)
            .all(|(e, a)| *e == ANY_VALUE || e == a),
    )
}

/// `*<angle>` means the collimator must not sit at `<angle>`.
fn evaluate_collimator(value: &ParameterValue, cell: &str, _ctx: &EvaluationContext<'_>) -> Verdict {
    if !CellGrammar::Collimator.accepts(cell) {
        return Verdict::TruthTableError;
    }
    if cell == ANY_VALUE {
        return Verdict::Pass;
    }
    let Some(text) = value.as_text() else {
        return Verdict::Fail;
    };
    match cell.strip_prefix(NEGATION_PREFIX) {
        Some(forbidden) => Verdict::from_match(text != forbidden),
        None => Verdict::from_match(text == cell),
    }
}

/// A single expected size applies to every beam; a list is positional.
fn evaluate_field_size(value: &ParameterValue, cell: &str, _ctx: &EvaluationContext<'_>) -> Verdict {
    if cell == ANY_VALUE {
        return Verdict::Pass;
    }
    let Some(text) = value.as_text() else {
        return Verdict::Fail;
    };
    let actual: Vec<&str> = split_list(text).collect();
    let expected: Vec<&str> = split_list(cell).collect();

    let pairs: Vec<(&str, &str)> = if expected.len() == 1 {
        actual.iter().map(|a| (expected[0], *a)).collect()
    } else {
        if expected.len() != actual.len() {
            return Verdict::Fail;
        }
        expected.iter().copied().zip(actual.iter().copied()).collect()
    };

    let constrained = pairs.iter().filter(|(e, _)| !is_open_position(e));
    if constrained.clone().any(|(_, a)| *a == NOT_EXTRACTED) {
        return Verdict::UnsupportedDevice;
    }
    Verdict::from_match(constrained.into_iter().all(|(e, a)| e == a))
}
