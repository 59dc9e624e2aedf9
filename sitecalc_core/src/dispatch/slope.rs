//! # Slope / Excavation Evaluators
//!
//! Closed-form code-book checks for foundation excavations:
//!
//! - **Vertical wall depth**: the maximum depth an unsupported vertical
//!   cut can stand, with a fixed safety factor K = 1.25:
//!
//!   `Hmax = 2c / (K·γ·tan(45° − φ/2)) − q/γ`
//!
//! - **Safe slope height**: the allowable height of a cut face at angle θ.
//!   The case is classified by the sign of θ − φ and the cohesion:
//!
//!   `h = 2c·sinθ·cosφ / (γ·sin²((θ − φ)/2))`
//!
//! Angles are supplied in degrees and converted to radians for the
//! trigonometry. Results are rounded for display only; the unrounded value
//! stays live for any dependent step.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::params::{SlopeModel, VerificationProject};

use super::{round_display, Formula};

/// Fixed safety factor for the vertical-wall check.
pub const SAFETY_FACTOR_K: f64 = 1.25;

/// Tolerance on |θ − φ| in radians, guarding against drift in the
/// degree-to-radian conversion when classifying the equal-angle case.
pub const ANGLE_TOLERANCE_RAD: f64 = 1e-9;

/// Case classification for the safe-slope check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopeClassification {
    /// θ = φ: height is not limited by shear failure
    Unrestricted,
    /// θ > φ with cohesion: a finite allowable height exists
    SteepStable,
    /// θ > φ without cohesion: unstable at any height
    Unbounded,
    /// θ < φ: same closed form as the steep case
    Gentle,
}

/// Result of a slope/excavation evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "case")]
pub enum SlopeResult {
    VerticalWall {
        /// Unrounded maximum depth, m
        hmax_m: f64,
        formula: Formula,
        narrative: String,
    },
    SafeSlope {
        classification: SlopeClassification,
        /// Unrounded allowable height, m; absent for the unrestricted and
        /// unbounded classes
        allowed_height_m: Option<f64>,
        formula: Option<Formula>,
        narrative: String,
    },
}

impl SlopeResult {
    pub fn narrative(&self) -> &str {
        match self {
            SlopeResult::VerticalWall { narrative, .. } => narrative,
            SlopeResult::SafeSlope { narrative, .. } => narrative,
        }
    }
}

/// Evaluate the selected verification project.
pub fn evaluate(model: &SlopeModel) -> CalcResult<SlopeResult> {
    model.validate()?;
    match model.verification {
        VerificationProject::VerticalWallDepth => vertical_wall_depth(model),
        VerificationProject::SafeSlope => safe_slope_height(model),
    }
}

fn vertical_wall_depth(model: &SlopeModel) -> CalcResult<SlopeResult> {
    let c = model.cohesion;
    let gamma = model.unit_weight;
    let phi_deg = model.friction_angle_deg;
    let q = model.top_load_q;

    let tan_term = (45.0 - phi_deg / 2.0).to_radians().tan();
    let denominator = SAFETY_FACTOR_K * gamma * tan_term;
    if !denominator.is_finite() || denominator <= 0.0 {
        return Err(CalcError::invalid_parameters(
            "friction_angle_deg",
            phi_deg.to_string(),
            "Friction angle leaves no positive active-pressure term",
        ));
    }

    let hmax = 2.0 * c / denominator - q / gamma;
    if !hmax.is_finite() || hmax <= 0.0 {
        return Err(CalcError::internal(format!(
            "vertical wall depth is not positive (c={c}, γ={gamma}, φ={phi_deg}°, q={q})"
        )));
    }

    let display = round_display(hmax, 2);
    let formula = Formula {
        expression: "Hmax = 2c / (K·γ·tan(45° − φ/2)) − q/γ".to_string(),
        substitution: format!(
            "Hmax = 2×{c:.2} / ({SAFETY_FACTOR_K}×{gamma:.2}×tan(45° − {phi_deg:.2}°/2)) − {q:.2}/{gamma:.2}"
        ),
        value: display,
        unit: "m".to_string(),
    };
    let narrative = format!(
        "With a safety factor of K = {SAFETY_FACTOR_K}, the excavation can stand as a \
         vertical wall up to a maximum depth of Hmax = {display:.2} m."
    );

    Ok(SlopeResult::VerticalWall {
        hmax_m: hmax,
        formula,
        narrative,
    })
}

fn safe_slope_height(model: &SlopeModel) -> CalcResult<SlopeResult> {
    let theta_deg = model.slope_angle_deg;
    let phi_deg = model.friction_angle_deg;
    let c = model.cohesion;
    let gamma = model.unit_weight;

    let theta = theta_deg.to_radians();
    let phi = phi_deg.to_radians();
    let delta = theta - phi;

    if delta.abs() <= ANGLE_TOLERANCE_RAD {
        return Ok(SlopeResult::SafeSlope {
            classification: SlopeClassification::Unrestricted,
            allowed_height_m: None,
            formula: None,
            narrative: format!(
                "The slope angle θ = {theta_deg:.2}° equals the internal friction angle; \
                 the excavation height is not limited by shear failure."
            ),
        });
    }

    if delta > 0.0 && c == 0.0 {
        return Ok(SlopeResult::SafeSlope {
            classification: SlopeClassification::Unbounded,
            allowed_height_m: None,
            formula: None,
            narrative: format!(
                "The slope angle θ = {theta_deg:.2}° exceeds the friction angle \
                 φ = {phi_deg:.2}° and the soil has no cohesion; the excavation is \
                 unstable at any height."
            ),
        });
    }

    let classification = if delta > 0.0 {
        SlopeClassification::SteepStable
    } else {
        SlopeClassification::Gentle
    };

    let half_delta_sin = (delta / 2.0).sin();
    let denominator = gamma * half_delta_sin * half_delta_sin;
    if !denominator.is_finite() || denominator <= 0.0 {
        return Err(CalcError::internal(format!(
            "degenerate slope denominator (θ={theta_deg}°, φ={phi_deg}°, γ={gamma})"
        )));
    }

    let height = 2.0 * c * theta.sin() * phi.cos() / denominator;
    if !height.is_finite() {
        return Err(CalcError::internal(format!(
            "allowable slope height is not finite (θ={theta_deg}°, φ={phi_deg}°, c={c}, γ={gamma})"
        )));
    }

    let display = round_display(height, 3);
    let formula = Formula {
        expression: "h = 2c·sinθ·cosφ / (γ·sin²((θ − φ)/2))".to_string(),
        substitution: format!(
            "h = 2×{c:.2}×sin{theta_deg:.2}°×cos{phi_deg:.2}° / \
             ({gamma:.2}×sin²(({theta_deg:.2}° − {phi_deg:.2}°)/2))"
        ),
        value: display,
        unit: "m".to_string(),
    };
    let narrative = format!(
        "At a slope angle of θ = {theta_deg:.2}° the allowable excavation height is \
         h = {display:.3} m."
    );

    Ok(SlopeResult::SafeSlope {
        classification,
        allowed_height_m: Some(height),
        formula: Some(formula),
        narrative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SoilType;

    fn wall_model() -> SlopeModel {
        SlopeModel {
            verification: VerificationProject::VerticalWallDepth,
            cohesion: 12.0,
            unit_weight: 20.0,
            friction_angle_deg: 15.0,
            top_load_q: 2.0,
            ..SlopeModel::default()
        }
    }

    fn slope_model(theta: f64, phi: f64, c: f64) -> SlopeModel {
        SlopeModel {
            verification: VerificationProject::SafeSlope,
            slope_angle_deg: theta,
            friction_angle_deg: phi,
            cohesion: c,
            unit_weight: 20.0,
            ..SlopeModel::default()
        }
    }

    #[test]
    fn test_vertical_wall_reference_case() {
        // c = 12, γ = 20, φ = 15°, q = 2 gives Hmax ≈ 1.15 m
        let result = evaluate(&wall_model()).unwrap();
        let SlopeResult::VerticalWall { hmax_m, formula, narrative } = result else {
            panic!("expected vertical-wall result");
        };
        assert!((hmax_m - 1.1511).abs() < 1e-3);
        assert_eq!(formula.value, 1.15);
        assert!(narrative.contains("1.15 m"));
    }

    #[test]
    fn test_vertical_wall_keeps_unrounded_value() {
        let SlopeResult::VerticalWall { hmax_m, formula, .. } = evaluate(&wall_model()).unwrap()
        else {
            panic!("expected vertical-wall result");
        };
        assert_ne!(hmax_m, formula.value);
        assert!((hmax_m - formula.value).abs() < 0.005);
    }

    #[test]
    fn test_surcharge_swallowing_the_wall_is_an_error() {
        // A heavy surcharge can push Hmax below zero; that is a numeric
        // domain outcome, not a valid depth.
        let model = SlopeModel {
            cohesion: 1.0,
            top_load_q: 50.0,
            ..wall_model()
        };
        assert_eq!(
            evaluate(&model).unwrap_err().error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_steep_stable() {
        // θ = 46°, φ = 45°, c = 10, γ = 20
        let result = evaluate(&slope_model(46.0, 45.0, 10.0)).unwrap();
        let SlopeResult::SafeSlope { classification, allowed_height_m, .. } = result else {
            panic!("expected safe-slope result");
        };
        assert_eq!(classification, SlopeClassification::SteepStable);
        let h = allowed_height_m.unwrap();
        assert!((h - 6679.37).abs() < 1.0, "h = {h}");
    }

    #[test]
    fn test_unbounded() {
        let result = evaluate(&slope_model(50.0, 45.0, 0.0)).unwrap();
        let SlopeResult::SafeSlope { classification, allowed_height_m, narrative, .. } = result
        else {
            panic!("expected safe-slope result");
        };
        assert_eq!(classification, SlopeClassification::Unbounded);
        assert!(allowed_height_m.is_none());
        assert!(narrative.contains("unstable at any height"));
    }

    #[test]
    fn test_gentle() {
        let result = evaluate(&slope_model(44.0, 45.0, 1.0)).unwrap();
        let SlopeResult::SafeSlope { classification, allowed_height_m, .. } = result else {
            panic!("expected safe-slope result");
        };
        assert_eq!(classification, SlopeClassification::Gentle);
        let h = allowed_height_m.unwrap();
        assert!((h - 645.02).abs() < 1.0, "h = {h}");
    }

    #[test]
    fn test_unrestricted_with_tolerance() {
        let result = evaluate(&slope_model(45.0, 45.0, 10.0)).unwrap();
        let SlopeResult::SafeSlope { classification, allowed_height_m, .. } = result else {
            panic!("expected safe-slope result");
        };
        assert_eq!(classification, SlopeClassification::Unrestricted);
        assert!(allowed_height_m.is_none());
    }

    #[test]
    fn test_evaluators_are_pure() {
        let model = wall_model();
        let first = evaluate(&model).unwrap();
        let second = evaluate(&model).unwrap();
        assert_eq!(first, second);

        let slope = slope_model(46.0, 45.0, 10.0);
        assert_eq!(evaluate(&slope).unwrap(), evaluate(&slope).unwrap());
    }

    #[test]
    fn test_blacklisted_soil_rejected_before_evaluation() {
        let model = SlopeModel {
            soil_type: SoilType::GravelSand,
            ..wall_model()
        };
        assert_eq!(
            evaluate(&model).unwrap_err().error_code(),
            "INVALID_PARAMETERS"
        );
    }

    #[test]
    fn test_slope_angle_unused_for_vertical_wall() {
        let mut a = wall_model();
        let mut b = wall_model();
        a.slope_angle_deg = 30.0;
        b.slope_angle_deg = 60.0;
        assert_eq!(evaluate(&a).unwrap(), evaluate(&b).unwrap());
    }

    #[test]
    fn test_top_load_unused_for_safe_slope() {
        let mut a = slope_model(46.0, 45.0, 10.0);
        let mut b = slope_model(46.0, 45.0, 10.0);
        a.top_load_q = 0.0;
        b.top_load_q = 50.0;
        assert_eq!(evaluate(&a).unwrap(), evaluate(&b).unwrap());
    }
}
