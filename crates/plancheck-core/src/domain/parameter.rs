//! The closed set of audited plan parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PlanCheckError;

/// A tracked plan parameter.
///
/// Declaration order is the reporting order; `BTreeMap<Parameter, _>`
/// iterates in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Mode,
    PrescriptionDose,
    PrescriptionPoint,
    IsocenterPoint,
    Override,
    Collimator,
    Gantry,
    Ssd,
    Couch,
    FieldSize,
    Wedge,
    Meas,
    Energy,
}

impl Parameter {
    /// Every parameter, in reporting order.
    pub const ALL: [Parameter; 13] = [
        Parameter::Mode,
        Parameter::PrescriptionDose,
        Parameter::PrescriptionPoint,
        Parameter::IsocenterPoint,
        Parameter::Override,
        Parameter::Collimator,
        Parameter::Gantry,
        Parameter::Ssd,
        Parameter::Couch,
        Parameter::FieldSize,
        Parameter::Wedge,
        Parameter::Meas,
        Parameter::Energy,
    ];

    /// Snake-case identifier used in JSON payloads.
    pub fn id(&self) -> &'static str {
        match self {
            Parameter::Mode => "mode",
            Parameter::PrescriptionDose => "prescription_dose",
            Parameter::PrescriptionPoint => "prescription_point",
            Parameter::IsocenterPoint => "isocenter_point",
            Parameter::Override => "override",
            Parameter::Collimator => "collimator",
            Parameter::Gantry => "gantry",
            Parameter::Ssd => "ssd",
            Parameter::Couch => "couch",
            Parameter::FieldSize => "field_size",
            Parameter::Wedge => "wedge",
            Parameter::Meas => "meas",
            Parameter::Energy => "energy",
        }
    }

    /// Header of this parameter's column in the truth table.
    pub fn column_name(&self) -> &'static str {
        match self {
            Parameter::Mode => "mode req",
            Parameter::PrescriptionDose => "prescription dose/#",
            Parameter::PrescriptionPoint => "prescription point",
            Parameter::IsocenterPoint => "isocentre point",
            Parameter::Override => "override",
            Parameter::Collimator => "collimator",
            Parameter::Gantry => "gantry",
            Parameter::Ssd => "SSD",
            Parameter::Couch => "couch",
            Parameter::FieldSize => "field size",
            Parameter::Wedge => "wedge",
            Parameter::Meas => "meas",
            Parameter::Energy => "energy",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Parameter {
    type Err = PlanCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if needle.eq_ignore_ascii_case("isocenter point") {
            return Ok(Parameter::IsocenterPoint);
        }
        Parameter::ALL
            .into_iter()
            .find(|p| {
                needle.eq_ignore_ascii_case(p.id()) || needle.eq_ignore_ascii_case(p.column_name())
            })
            .ok_or_else(|| PlanCheckError::UnknownParameter(needle.to_string()))
    }
}
