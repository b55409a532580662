//! Canonical extracted values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::parameter::Parameter;

/// Sentinel text for parameters without an extraction rule.
pub const NOT_IMPLEMENTED: &str = "NOT_IMPLEMENTED";

/// How the plan is delivered. Derived from gantry motion, never stored in
/// the plan itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryMode {
    /// Fixed gantry angle per beam.
    Imrt,
    /// Gantry rotates during the beam.
    Vmat,
    Unknown,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Imrt => "IMRT",
            DeliveryMode::Vmat => "VMAT",
            DeliveryMode::Unknown => "UNKNOWN",
        }
    }

    pub fn is_vmat(&self) -> bool {
        matches!(self, DeliveryMode::Vmat)
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical, comparable value of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    /// Scalar or comma-joined per-beam text.
    Text(String),
    /// Numeric samples (SSD per beam, or per control point for arcs).
    Samples(Vec<f64>),
    /// No extraction rule exists for this parameter.
    NotImplemented,
    /// The plan lacked what the rule needed.
    Error(String),
}

impl ParameterValue {
    pub fn text(value: impl Into<String>) -> Self {
        ParameterValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_samples(&self) -> Option<&[f64]> {
        match self {
            ParameterValue::Samples(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_implemented(&self) -> bool {
        !matches!(self, ParameterValue::NotImplemented)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Text(s) => f.write_str(s),
            ParameterValue::Samples(v) => {
                let joined: Vec<String> = v.iter().map(|x| format_number(*x)).collect();
                f.write_str(&joined.join(","))
            }
            ParameterValue::NotImplemented => f.write_str(NOT_IMPLEMENTED),
            ParameterValue::Error(msg) => f.write_str(msg),
        }
    }
}

/// Format a number with trailing fractional zeros removed (`10`, `1.5`, `85.19`).
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.4}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// One canonical value for every [`Parameter`], plus the derived delivery mode.
///
/// # Invariants
///
/// Every parameter in [`Parameter::ALL`] has an entry. Constructors fill
/// absent parameters with [`ParameterValue::NotImplemented`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedParameterSet {
    pub mode: DeliveryMode,
    values: BTreeMap<Parameter, ParameterValue>,
}

impl ExtractedParameterSet {
    /// Build a set from whatever values are known; the rest are `NotImplemented`.
    pub fn from_values(
        mode: DeliveryMode,
        known: impl IntoIterator<Item = (Parameter, ParameterValue)>,
    ) -> Self {
        let mut values: BTreeMap<Parameter, ParameterValue> = Parameter::ALL
            .into_iter()
            .map(|p| (p, ParameterValue::NotImplemented))
            .collect();
        values.extend(known);
        Self { mode, values }
    }

    pub fn get(&self, parameter: Parameter) -> &ParameterValue {
        // Entries for all parameters are created up front.
        static FALLBACK: ParameterValue = ParameterValue::NotImplemented;
        self.values.get(&parameter).unwrap_or(&FALLBACK)
    }

    /// Replace one value, returning the updated set.
    pub fn with_value(mut self, parameter: Parameter, value: ParameterValue) -> Self {
        self.values.insert(parameter, value);
        self
    }

    /// Values in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &ParameterValue)> {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    /// Number of parameters that have an extraction rule.
    pub fn implemented_count(&self) -> usize {
        self.values.values().filter(|v| v.is_implemented()).count()
    }
}
