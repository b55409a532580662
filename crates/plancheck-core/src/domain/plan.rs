//! In-memory treatment-plan record.
//!
//! This is the already-parsed shape of an RT plan: beams, their control
//! points and the plan-level dose/fraction entries. The engine only reads
//! it. All distances are millimetres and all angles degrees, as stored in
//! the source document.

use serde::{Deserialize, Serialize};

/// A parsed treatment plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanRecord {
    /// Free-form label (usually the source file name).
    pub label: Option<String>,
    /// Beams in plan order, setup beams included.
    pub beams: Vec<Beam>,
    pub dose_references: Vec<DoseReference>,
    pub fraction_groups: Vec<FractionGroup>,
}

impl PlanRecord {
    /// Beams that deliver treatment, in plan order.
    pub fn treatment_beams<'a>(&'a self, setup_description: &'a str) -> Vec<&'a Beam> {
        self.beams
            .iter()
            .filter(|beam| !beam.is_setup(setup_description))
            .collect()
    }
}

/// One radiation delivery unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Beam {
    pub number: Option<u32>,
    pub description: String,
    pub primary_dosimeter_unit: Option<String>,
    pub control_points: Vec<ControlPoint>,
    pub wedges: Vec<Wedge>,
}

impl Beam {
    /// Whether this beam is an imaging/alignment beam.
    pub fn is_setup(&self, setup_description: &str) -> bool {
        self.description == setup_description
    }

    pub fn first_control_point(&self) -> Option<&ControlPoint> {
        self.control_points.first()
    }
}

/// A sampled delivery state within a beam.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlPoint {
    pub gantry_angle: Option<f64>,
    pub source_to_surface_distance: Option<f64>,
    /// Collimator rotation.
    pub beam_limiting_device_angle: Option<f64>,
    /// Nominal energy in MV.
    pub nominal_beam_energy: Option<f64>,
    pub beam_limiting_device_positions: Vec<DevicePosition>,
    pub referenced_dose_references: Vec<ReferencedDoseReference>,
    pub fluence_mode: Option<FluenceMode>,
}

impl ControlPoint {
    /// First position entry for any of the given device types.
    pub fn device(&self, types: &[DeviceType]) -> Option<&DevicePosition> {
        self.beam_limiting_device_positions
            .iter()
            .find(|d| types.contains(&d.device_type))
    }
}

/// Beam-limiting device kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceType {
    X,
    Y,
    Asymx,
    Asymy,
    Mlcx,
    Mlcy,
}

/// Leaf/jaw boundary positions for one device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DevicePosition {
    pub device_type: DeviceType,
    #[serde(default)]
    pub positions: Vec<f64>,
}

/// Per-control-point dose reference; carries the dose point SSD.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReferencedDoseReference {
    pub beam_dose_point_ssd: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FluenceKind {
    Standard,
    NonStandard,
}

/// Primary fluence mode. A non-standard mode is typically flattening-filter free.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluenceMode {
    pub mode: FluenceKind,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Wedge {
    pub angle: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DoseReference {
    /// Total prescribed dose in Gy.
    pub target_prescription_dose: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FractionGroup {
    pub number_of_fractions_planned: Option<u32>,
}
