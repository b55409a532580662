//! Plancheck Core Library
//!
//! Audits a radiotherapy treatment-plan record against a case-indexed truth
//! table. The [`Extractor`] turns a [`PlanRecord`] into canonical values;
//! the [`Evaluator`] grades them against one case of a [`TruthTable`].
//!
//! Both stages are pure and synchronous. A `TruthTable` is immutable after
//! load and can be shared across threads.

pub mod config;
pub mod domain;
pub mod evaluate;
pub mod extract;
pub mod grammar;
pub mod obs;
pub mod reporting;
pub mod telemetry;
pub mod truth_table;

pub use config::AuditConfig;

pub use domain::{
    Beam, ControlPoint, DeliveryMode, DevicePosition, DeviceType, DoseReference,
    EvaluationResult, ExtractedParameterSet, FluenceKind, FluenceMode, FractionGroup, Parameter,
    ParameterValue, PlanCheckError, PlanRecord, ReferencedDoseReference, Result, Verdict, Wedge,
};

pub use evaluate::{evaluate, evaluator_for, EvaluationContext, Evaluator, EvaluatorFn};
pub use extract::{detect_mode, extract, extractor_for, ExtractionContext, Extractor, ExtractorFn};
pub use obs::AuditSpan;
pub use reporting::{render_csv, render_text, write_report_json, AuditReport, ReportEntry};
pub use telemetry::init_tracing;
pub use truth_table::TruthTable;

/// Plancheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
