//! Structured observability hooks for plan audits.
//!
//! This module provides:
//! - Plan-scoped tracing spans via the `AuditSpan` RAII guard
//! - Emission functions for extraction and evaluation milestones
//!
//! The engine never prints; these events are the only trace it leaves.

use std::fmt::Display;

use tracing::{info, warn};

use crate::domain::{DeliveryMode, Parameter};

/// RAII guard that enters a plan-scoped tracing span for the duration of an audit.
///
/// # Example
///
/// ```ignore
/// let _span = AuditSpan::enter("YellowLvlIII_7a", 7);
/// // every event below carries plan = "YellowLvlIII_7a", case = 7
/// ```
pub struct AuditSpan {
    _span: tracing::span::EnteredSpan,
}

impl AuditSpan {
    pub fn enter(plan: &str, case: usize) -> Self {
        let span = tracing::info_span!("plancheck.audit", plan = %plan, case = case);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a parameter could not be extracted from the plan.
pub fn emit_extraction_gap(parameter: Parameter, reason: &dyn Display) {
    warn!(
        event = "extraction.gap",
        parameter = parameter.id(),
        reason = %reason,
    );
}

/// Emit event: extraction finished.
pub fn emit_extraction_finished(mode: DeliveryMode, treatment_beams: usize, gaps: usize) {
    info!(
        event = "extraction.finished",
        mode = %mode,
        treatment_beams = treatment_beams,
        gaps = gaps,
    );
}

/// Emit event: a truth cell failed its grammar check.
pub fn emit_truth_table_error(parameter: Parameter, case: usize, cell: &str) {
    warn!(
        event = "evaluation.truth_table_error",
        parameter = parameter.id(),
        case = case,
        cell = %cell,
    );
}

/// Emit event: evaluation finished with verdict counts.
pub fn emit_evaluation_finished(case: usize, passed: usize, failed: usize, passed_overall: bool) {
    info!(
        event = "evaluation.finished",
        case = case,
        passed = passed,
        failed = failed,
        passed_overall = passed_overall,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_span_create() {
        let _span = AuditSpan::enter("plan", 1);
        emit_extraction_gap(Parameter::Ssd, &"no dose reference");
        emit_truth_table_error(Parameter::Gantry, 1, "abc");
    }
}
