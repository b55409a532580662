//! Audit configuration passed explicitly to the extractor and evaluator.

use serde::{Deserialize, Serialize};

/// Tunables for extraction and evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// Beam description that marks imaging/alignment beams.
    pub setup_beam_description: String,

    /// Maximum allowed |expected - extracted| SSD difference, in cm (inclusive).
    pub ssd_tolerance_cm: f64,

    /// Arc samples within this many degrees (exclusive) of an expected gantry
    /// angle are checked against that angle's SSD.
    pub vmat_gantry_window_deg: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            setup_beam_description: "SETUP beam".to_string(),
            ssd_tolerance_cm: 1.0,
            vmat_gantry_window_deg: 0.3,
        }
    }
}

impl AuditConfig {
    pub fn with_setup_beam_description(mut self, description: impl Into<String>) -> Self {
        self.setup_beam_description = description.into();
        self
    }

    pub fn with_ssd_tolerance_cm(mut self, tolerance: f64) -> Self {
        self.ssd_tolerance_cm = tolerance;
        self
    }

    pub fn with_vmat_gantry_window_deg(mut self, window: f64) -> Self {
        self.vmat_gantry_window_deg = window;
        self
    }
}
