//! # Slope / Excavation Parameters
//!
//! Typed inputs for the soil-and-embankment excavation checks. Two
//! verification projects share one model: the maximum depth a vertical
//! excavation wall can stand, and the allowable height of a cut slope.
//!
//! Field validators run individually on every edit and collectively through
//! [`SlopeModel::validate`]. A failing validator reports the error; it never
//! coerces the stored value.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Which check the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VerificationProject {
    /// Maximum depth of an unsupported vertical excavation wall
    #[default]
    VerticalWallDepth,
    /// Allowable height of a cut slope at a given angle
    SafeSlope,
}

/// Fixed soil-type vocabulary offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SoilType {
    #[default]
    Clay,
    SiltyClay,
    Silt,
    Loess,
    FineSand,
    MediumSand,
    CoarseSand,
    GravelSand,
    AngularGravel,
    RoundedGravel,
    BrokenStone,
    Cobble,
}

impl SoilType {
    /// Cohesionless sand/gravel classes cannot stand as a vertical wall and
    /// are rejected for the vertical-wall-depth check.
    pub fn is_cohesionless(self) -> bool {
        matches!(
            self,
            SoilType::FineSand
                | SoilType::MediumSand
                | SoilType::CoarseSand
                | SoilType::GravelSand
                | SoilType::AngularGravel
                | SoilType::RoundedGravel
                | SoilType::BrokenStone
                | SoilType::Cobble
        )
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SoilType::Clay => "clay",
            SoilType::SiltyClay => "silty clay",
            SoilType::Silt => "silt",
            SoilType::Loess => "loess",
            SoilType::FineSand => "fine sand",
            SoilType::MediumSand => "medium sand",
            SoilType::CoarseSand => "coarse sand",
            SoilType::GravelSand => "gravelly sand",
            SoilType::AngularGravel => "angular gravel",
            SoilType::RoundedGravel => "rounded gravel",
            SoilType::BrokenStone => "broken stone",
            SoilType::Cobble => "cobble",
        }
    }
}

/// Input parameters for the slope/excavation checks.
///
/// The vertical-wall evaluator ignores `slope_angle_deg`; the safe-slope
/// evaluator ignores `top_load_q`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeModel {
    /// Selected verification project
    pub verification: VerificationProject,

    /// Uniform surcharge on the berm, kN/m², valid [0, 100]
    pub top_load_q: f64,

    /// Soil type from the fixed vocabulary
    pub soil_type: SoilType,

    /// Unit weight γ, kN/m³, valid [0.1, 40]
    pub unit_weight: f64,

    /// Internal friction angle φ, degrees, valid [0, 90)
    pub friction_angle_deg: f64,

    /// Cohesion c, kN/m², valid [0, 50]
    pub cohesion: f64,

    /// Slope angle θ from horizontal, degrees, valid (0, 90]
    pub slope_angle_deg: f64,
}

impl Default for SlopeModel {
    fn default() -> Self {
        SlopeModel {
            verification: VerificationProject::VerticalWallDepth,
            top_load_q: 0.0,
            soil_type: SoilType::Clay,
            unit_weight: 18.0,
            friction_angle_deg: 20.0,
            cohesion: 10.0,
            slope_angle_deg: 45.0,
        }
    }
}

/// Surcharge q, valid [0, 100] kN/m²
pub fn validate_top_load(value: f64) -> CalcResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(CalcError::invalid_parameters(
            "top_load_q",
            value.to_string(),
            "Surcharge must be between 0 and 100 kN/m²",
        ));
    }
    Ok(())
}

/// Unit weight γ, valid [0.1, 40] kN/m³
pub fn validate_unit_weight(value: f64) -> CalcResult<()> {
    if !value.is_finite() || !(0.1..=40.0).contains(&value) {
        return Err(CalcError::invalid_parameters(
            "unit_weight",
            value.to_string(),
            "Unit weight must be between 0.1 and 40 kN/m³",
        ));
    }
    Ok(())
}

/// Friction angle φ, valid [0, 90) degrees
pub fn validate_friction_angle(value: f64) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 || value >= 90.0 {
        return Err(CalcError::invalid_parameters(
            "friction_angle_deg",
            value.to_string(),
            "Friction angle must be at least 0° and below 90°",
        ));
    }
    Ok(())
}

/// Cohesion c, valid [0, 50] kN/m²
pub fn validate_cohesion(value: f64) -> CalcResult<()> {
    if !value.is_finite() || !(0.0..=50.0).contains(&value) {
        return Err(CalcError::invalid_parameters(
            "cohesion",
            value.to_string(),
            "Cohesion must be between 0 and 50 kN/m²",
        ));
    }
    Ok(())
}

/// Slope angle θ, valid (0, 90] degrees
pub fn validate_slope_angle(value: f64) -> CalcResult<()> {
    if !value.is_finite() || value <= 0.0 || value > 90.0 {
        return Err(CalcError::invalid_parameters(
            "slope_angle_deg",
            value.to_string(),
            "Slope angle must be above 0° and at most 90°",
        ));
    }
    Ok(())
}

impl SlopeModel {
    /// Validate every field plus the cross-field soil rule.
    ///
    /// A cohesionless soil with the vertical-wall check selected is
    /// rejected; the caller is expected to prompt and reset the soil type to
    /// the default.
    pub fn validate(&self) -> CalcResult<()> {
        validate_top_load(self.top_load_q)?;
        validate_unit_weight(self.unit_weight)?;
        validate_friction_angle(self.friction_angle_deg)?;
        validate_cohesion(self.cohesion)?;
        validate_slope_angle(self.slope_angle_deg)?;

        if self.verification == VerificationProject::VerticalWallDepth
            && self.soil_type.is_cohesionless()
        {
            return Err(CalcError::invalid_parameters(
                "soil_type",
                self.soil_type.display_name(),
                "Cohesionless soils cannot stand as a vertical wall; choose a cohesive soil type",
            ));
        }

        Ok(())
    }
}
