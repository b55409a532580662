//! Domain models for plancheck.
//!
//! Canonical definitions for the data contracts shared by the extractor and
//! the evaluator:
//! - `PlanRecord`: parsed treatment plan (read-only input)
//! - `Parameter`: the closed set of audited parameters
//! - `ExtractedParameterSet`: canonical value per parameter
//! - `EvaluationResult`: verdict per parameter

pub mod error;
pub mod parameter;
pub mod plan;
pub mod value;
pub mod verdict;

// Re-export main types and errors
pub use error::{PlanCheckError, Result};
pub use parameter::Parameter;
pub use plan::{
    Beam, ControlPoint, DevicePosition, DeviceType, DoseReference, FluenceKind, FluenceMode,
    FractionGroup, PlanRecord, ReferencedDoseReference, Wedge,
};
pub use value::{format_number, DeliveryMode, ExtractedParameterSet, ParameterValue, NOT_IMPLEMENTED};
pub use verdict::{EvaluationResult, Verdict};
