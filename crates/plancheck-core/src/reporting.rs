//! Audit report artifacts and their renderings.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DeliveryMode, EvaluationResult, ExtractedParameterSet, Parameter, PlanCheckError, Result,
    Verdict,
};
use crate::truth_table::TruthTable;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// One parameter row of a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportEntry {
    pub parameter: Parameter,
    pub extracted: String,
    pub expected: String,
    pub verdict: Verdict,
}

/// Verdict counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub not_applicable: usize,
    pub not_implemented: usize,
    pub truth_table_errors: usize,
    pub overall_pass: bool,
}

/// Persisted result of auditing one plan against one case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub plan: String,
    pub case: usize,
    pub mode: DeliveryMode,
    pub truth_table_digest: String,
    pub summary: ReportSummary,
    pub entries: Vec<ReportEntry>,
}

impl AuditReport {
    /// Assemble a report from the outputs of one extract/evaluate pass.
    pub fn build(
        plan: impl Into<String>,
        values: &ExtractedParameterSet,
        truth_table: &TruthTable,
        result: &EvaluationResult,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(result.verdicts.len());
        for (parameter, verdict) in &result.verdicts {
            entries.push(ReportEntry {
                parameter: *parameter,
                extracted: values.get(*parameter).to_string(),
                expected: truth_table.cell(*parameter, result.case)?.to_string(),
                verdict: *verdict,
            });
        }

        let summary = ReportSummary {
            total: entries.len(),
            passed: result.count(Verdict::Pass),
            failed: result.count(Verdict::Fail),
            not_applicable: result.count(Verdict::NotApplicable),
            not_implemented: result.count(Verdict::NotImplemented)
                + result.count(Verdict::UnsupportedDevice),
            truth_table_errors: result.count(Verdict::TruthTableError),
            overall_pass: result.passed(),
        };

        Ok(Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            plan: plan.into(),
            case: result.case,
            mode: result.mode,
            truth_table_digest: truth_table.digest(),
            summary,
            entries,
        })
    }
}

/// `parameter: VERDICT` lines, for terminal output.
pub fn render_text(report: &AuditReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} (case {}, {})\n",
        report.plan, report.case, report.mode
    ));
    for entry in &report.entries {
        out.push_str(&format!("{}: {}\n", entry.parameter, entry.verdict));
    }
    out.push_str(&format!(
        "overall: {}\n",
        if report.summary.overall_pass { "PASS" } else { "FAIL" }
    ));
    out
}

/// CSV with columns `parameter,extracted,expected,result`.
pub fn render_csv(report: &AuditReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["parameter", "extracted", "expected", "result"])?;
    for entry in &report.entries {
        writer.write_record([
            entry.parameter.column_name(),
            entry.extracted.as_str(),
            entry.expected.as_str(),
            entry.verdict.as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PlanCheckError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write the report as pretty JSON.
pub fn write_report_json(path: &Path, report: &AuditReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParameterValue;
    use crate::evaluate::evaluate;

    fn table() -> TruthTable {
        let columns = Parameter::ALL.into_iter().map(|p| {
            let cell = match p {
                Parameter::Gantry => "270,0,90",
                Parameter::Wedge => "no wedge",
                _ => "-",
            };
            (p.column_name(), vec![cell])
        });
        TruthTable::from_named_columns(columns.chain(std::iter::once(("case", vec!["1"]))))
            .expect("valid table")
    }

    fn report() -> AuditReport {
        let tt = table();
        let values = ExtractedParameterSet::from_values(
            DeliveryMode::Imrt,
            [
                (Parameter::Gantry, ParameterValue::text("270,0,90")),
                (Parameter::Wedge, ParameterValue::text("30,no wedge,30")),
            ],
        );
        let result = evaluate(&values, &tt, 1).expect("evaluate");
        AuditReport::build("plan-a", &values, &tt, &result).expect("build")
    }

    #[test]
    fn report_summary_counts() {
        let r = report();
        assert_eq!(r.summary.total, Parameter::ALL.len());
        assert_eq!(r.summary.passed, 1);
        assert_eq!(r.summary.failed, 1);
        assert!(!r.summary.overall_pass);
        assert_eq!(r.truth_table_digest.len(), 64);
    }

    #[test]
    fn render_csv_quotes_list_values() {
        let csv = render_csv(&report()).expect("render");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("parameter,extracted,expected,result"));
        assert!(csv.contains("gantry,\"270,0,90\",\"270,0,90\",PASS"));
        assert!(csv.contains("wedge,\"30,no wedge,30\",no wedge,FAIL"));
    }

    #[test]
    fn render_text_lists_every_parameter() {
        let text = render_text(&report());
        assert!(text.starts_with("plan-a (case 1, IMRT)"));
        assert!(text.contains("gantry: PASS"));
        assert!(text.contains("couch: NOT IMPLEMENTED"));
        assert!(text.ends_with("overall: FAIL\n"));
    }

    #[test]
    fn write_report_json_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        let r = report();
        write_report_json(&path, &r).expect("write");
        let back: AuditReport =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(back, r);
    }
}
