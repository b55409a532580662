//! Parameter extraction.
//!
//! Turns a [`PlanRecord`] into one canonical [`ParameterValue`] per
//! [`Parameter`]. Setup beams are excluded from every per-beam rule.
//! A rule that hits a structurally absent field degrades to an error value
//! for that parameter alone; the other parameters are still extracted.

use crate::config::AuditConfig;
use crate::domain::{
    format_number, Beam, ControlPoint, DeliveryMode, DeviceType, ExtractedParameterSet,
    FluenceKind, Parameter, ParameterValue, PlanRecord,
};
use crate::grammar::{NOT_EXTRACTED, NO_WEDGE};
use crate::obs;

/// Unit reported when the plan carries no primary dosimeter unit.
pub const UNKNOWN_DOSIMETER_UNIT: &str = "no dosimeter unit";

/// Marker appended to the energy when the fluence mode has no id of its own.
pub const FFF_MARKER: &str = "FFF";

/// Why a rule could not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionGap {
    #[error("plan has no treatment beams")]
    NoTreatmentBeams,

    #[error("{0} is missing")]
    MissingField(&'static str),
}

type Extracted = Result<ParameterValue, ExtractionGap>;

/// A per-parameter extraction rule.
pub type ExtractorFn = fn(&ExtractionContext<'_>) -> Extracted;

/// Read-only view shared by every rule during one extraction.
pub struct ExtractionContext<'a> {
    pub record: &'a PlanRecord,
    /// Non-setup beams in plan order.
    pub treatment_beams: Vec<&'a Beam>,
    pub mode: DeliveryMode,
}

impl<'a> ExtractionContext<'a> {
    fn first_beam(&self) -> Result<&'a Beam, ExtractionGap> {
        self.treatment_beams
            .first()
            .copied()
            .ok_or(ExtractionGap::NoTreatmentBeams)
    }

    fn last_beam(&self) -> Result<&'a Beam, ExtractionGap> {
        self.treatment_beams
            .last()
            .copied()
            .ok_or(ExtractionGap::NoTreatmentBeams)
    }

    /// Apply `f` to the first control point of every treatment beam.
    fn per_beam<T>(
        &self,
        f: impl Fn(&'a Beam, &'a ControlPoint) -> Result<T, ExtractionGap>,
    ) -> Result<Vec<T>, ExtractionGap> {
        if self.treatment_beams.is_empty() {
            return Err(ExtractionGap::NoTreatmentBeams);
        }
        self.treatment_beams
            .iter()
            .map(|&beam| f(beam, first_control_point(beam)?))
            .collect()
    }
}

/// Rule registry. `None` means the parameter has no extraction rule.
pub fn extractor_for(parameter: Parameter) -> Option<ExtractorFn> {
    match parameter {
        Parameter::Mode => Some(extract_mode),
        Parameter::PrescriptionDose => Some(extract_prescription_dose),
        Parameter::Collimator => Some(extract_collimator),
        Parameter::Gantry => Some(extract_gantry),
        Parameter::Ssd => Some(extract_ssd),
        Parameter::FieldSize => Some(extract_field_size),
        Parameter::Wedge => Some(extract_wedge),
        Parameter::Energy => Some(extract_energy),
        Parameter::PrescriptionPoint
        | Parameter::IsocenterPoint
        | Parameter::Override
        | Parameter::Couch
        | Parameter::Meas => None,
    }
}

/// Extracts canonical parameter values from plan records.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: AuditConfig,
}

impl Extractor {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Extract every parameter. Never fails; gaps become error values.
    pub fn extract(&self, record: &PlanRecord) -> (ExtractedParameterSet, DeliveryMode) {
        let treatment_beams = record.treatment_beams(&self.config.setup_beam_description);
        let mode = detect_mode(&treatment_beams);
        let ctx = ExtractionContext {
            record,
            treatment_beams,
            mode,
        };

        let mut gaps = 0;
        let values: Vec<(Parameter, ParameterValue)> = Parameter::ALL
            .into_iter()
            .map(|parameter| {
                let value = match extractor_for(parameter) {
                    None => ParameterValue::NotImplemented,
                    Some(rule) => rule(&ctx).unwrap_or_else(|gap| {
                        gaps += 1;
                        obs::emit_extraction_gap(parameter, &gap);
                        ParameterValue::Error(format!("error retrieving {}", parameter))
                    }),
                };
                (parameter, value)
            })
            .collect();

        obs::emit_extraction_finished(mode, ctx.treatment_beams.len(), gaps);
        (ExtractedParameterSet::from_values(mode, values), mode)
    }
}

/// Extract with the default configuration.
pub fn extract(record: &PlanRecord) -> (ExtractedParameterSet, DeliveryMode) {
    Extractor::default().extract(record)
}

/// VMAT when the gantry moves between the first two control points of the
/// first treatment beam, IMRT when it does not, UNKNOWN when that cannot be told.
pub fn detect_mode(treatment_beams: &[&Beam]) -> DeliveryMode {
    let Some(beam) = treatment_beams.first() else {
        return DeliveryMode::Unknown;
    };
    match beam.control_points.as_slice() {
        [first, second, ..] => match (first.gantry_angle, second.gantry_angle) {
            (Some(a), Some(b)) if a != b => DeliveryMode::Vmat,
            (Some(_), Some(_)) => DeliveryMode::Imrt,
            _ => DeliveryMode::Unknown,
        },
        _ => DeliveryMode::Unknown,
    }
}

fn first_control_point(beam: &Beam) -> Result<&ControlPoint, ExtractionGap> {
    beam.first_control_point()
        .ok_or(ExtractionGap::MissingField("control point"))
}

/// Whole units, fraction dropped (`50.4` -> `50`).
fn truncated(value: f64) -> String {
    format!("{}", value.trunc() as i64)
}

/// Millimetres to centimetres, two decimals.
fn mm_to_cm(mm: f64) -> f64 {
    (mm / 10.0 * 100.0).round() / 100.0
}

fn extract_mode(ctx: &ExtractionContext<'_>) -> Extracted {
    Ok(ParameterValue::text(ctx.mode.as_str()))
}

fn extract_prescription_dose(ctx: &ExtractionContext<'_>) -> Extracted {
    let dose = ctx
        .record
        .dose_references
        .first()
        .and_then(|d| d.target_prescription_dose)
        .ok_or(ExtractionGap::MissingField("target prescription dose"))?;
    let fractions = ctx
        .record
        .fraction_groups
        .first()
        .and_then(|g| g.number_of_fractions_planned)
        .ok_or(ExtractionGap::MissingField("number of fractions planned"))?;
    // Treatment beams first: setup beams often carry no unit.
    let unit = ctx
        .treatment_beams
        .iter()
        .copied()
        .chain(ctx.record.beams.iter())
        .find_map(|b| b.primary_dosimeter_unit.as_deref())
        .unwrap_or(UNKNOWN_DOSIMETER_UNIT);

    Ok(ParameterValue::Text(format!(
        "{}/{}/{}",
        truncated(dose),
        fractions,
        unit
    )))
}

/// Only meaningful for single-beam cases: reads the last treatment beam.
fn extract_collimator(ctx: &ExtractionContext<'_>) -> Extracted {
    let angle = first_control_point(ctx.last_beam()?)?
        .beam_limiting_device_angle
        .ok_or(ExtractionGap::MissingField("beam limiting device angle"))?;
    Ok(ParameterValue::Text(truncated(angle)))
}

fn extract_gantry(ctx: &ExtractionContext<'_>) -> Extracted {
    if ctx.mode.is_vmat() {
        let angles = ctx
            .first_beam()?
            .control_points
            .iter()
            .map(|cp| cp.gantry_angle.ok_or(ExtractionGap::MissingField("gantry angle")))
            .collect::<Result<Vec<f64>, _>>()?;
        return Ok(ParameterValue::Samples(angles));
    }

    let angles = ctx.per_beam(|_, cp| {
        cp.gantry_angle
            .map(truncated)
            .ok_or(ExtractionGap::MissingField("gantry angle"))
    })?;
    Ok(ParameterValue::Text(angles.join(",")))
}

fn extract_ssd(ctx: &ExtractionContext<'_>) -> Extracted {
    if ctx.mode.is_vmat() {
        // Arc SSD lives on the second referenced dose reference of each control point.
        let samples = ctx
            .first_beam()?
            .control_points
            .iter()
            .map(|cp| {
                cp.referenced_dose_references
                    .get(1)
                    .and_then(|r| r.beam_dose_point_ssd)
                    .map(mm_to_cm)
                    .ok_or(ExtractionGap::MissingField("beam dose point SSD"))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        return Ok(ParameterValue::Samples(samples));
    }

    let samples = ctx.per_beam(|_, cp| {
        cp.source_to_surface_distance
            .map(mm_to_cm)
            .ok_or(ExtractionGap::MissingField("source to surface distance"))
    })?;
    Ok(ParameterValue::Samples(samples))
}

fn extract_wedge(ctx: &ExtractionContext<'_>) -> Extracted {
    if ctx.treatment_beams.is_empty() {
        return Err(ExtractionGap::NoTreatmentBeams);
    }
    let wedges = ctx
        .treatment_beams
        .iter()
        .map(|beam| match beam.wedges.first() {
            None => Ok(NO_WEDGE.to_string()),
            Some(wedge) => wedge
                .angle
                .map(truncated)
                .ok_or(ExtractionGap::MissingField("wedge angle")),
        })
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ParameterValue::Text(wedges.join(",")))
}

fn extract_field_size(ctx: &ExtractionContext<'_>) -> Extracted {
    let sizes = ctx.per_beam(|_, cp| {
        let x = jaw_extent_cm(cp, &[DeviceType::X, DeviceType::Asymx]);
        let y = jaw_extent_cm(cp, &[DeviceType::Y, DeviceType::Asymy]);
        Ok(match (x, y) {
            (Some(x), Some(y)) => format!("{}x{}", format_number(y), format_number(x)),
            _ => NOT_EXTRACTED.to_string(),
        })
    })?;
    Ok(ParameterValue::Text(sizes.join(",")))
}

/// Opening between a jaw pair, in cm. `None` when no jaw of the given types
/// is present (MLC-only axes included).
fn jaw_extent_cm(cp: &ControlPoint, jaws: &[DeviceType]) -> Option<f64> {
    match cp.device(jaws)?.positions.as_slice() {
        [low, high, ..] => Some(mm_to_cm((high - low).abs())),
        _ => None,
    }
}

fn extract_energy(ctx: &ExtractionContext<'_>) -> Extracted {
    let cp = first_control_point(ctx.last_beam()?)?;
    let energy = cp
        .nominal_beam_energy
        .ok_or(ExtractionGap::MissingField("nominal beam energy"))?;

    let mut text = format_number(energy);
    if let Some(fluence) = &cp.fluence_mode {
        if fluence.mode != FluenceKind::Standard {
            text.push_str(fluence.id.as_deref().unwrap_or(FFF_MARKER));
        }
    }
    Ok(ParameterValue::Text(text))
}
