//! # Truck-Crane Parameters
//!
//! Typed inputs for the hydraulic truck-crane sizing check: the hook load
//! and lift geometry, the crane-selection strategy, and the ground-pressure
//! data used for the outrigger and overturning checks.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// How the working radius is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RadiusMethod {
    /// Smallest feasible radius from the capacity chart
    #[default]
    Auto,
    /// Use `min_radius_m` as supplied
    Manual,
}

/// Crane-selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RecommendationMode {
    /// Evaluate every crane of one manufacturer; recommend the smallest
    /// passing machine by maximum capacity
    ByManufacturer,
    /// Evaluate a single model
    #[default]
    ByModel,
    /// Evaluate every condition of one model; return those that pass
    ByCondition,
}

/// Boom configuration family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoomType {
    #[default]
    MainBoom,
    MainPlusJib,
}

/// Outrigger rectangle geometry and footing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutriggerLayout {
    /// Front-to-rear spacing between outrigger centres, m
    pub longitudinal_spacing_m: f64,
    /// Side-to-side spacing between outrigger centres, m
    pub lateral_spacing_m: f64,
    /// Pad height above ground, m
    pub pad_height_m: f64,
    /// Distance from the slew axis to the outrigger rectangle centre, m
    pub slew_offset_m: f64,
    /// Bearing area of one outrigger footing, m²
    pub pad_area_m2: f64,
}

impl Default for OutriggerLayout {
    fn default() -> Self {
        OutriggerLayout {
            longitudinal_spacing_m: 5.6,
            lateral_spacing_m: 5.0,
            pad_height_m: 0.4,
            slew_offset_m: 0.0,
            pad_area_m2: 0.64,
        }
    }
}

/// Input parameters for the hydraulic truck-crane check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruckCraneModel {
    /// Hook load Gw, tonnes
    pub load_gw_t: f64,
    /// Dynamic factor k1 applied to the hook load
    pub dynamic_factor_k1: f64,
    /// Required lift height h1 above ground, m
    pub max_lift_height_h1_m: f64,
    /// Clearance h2 between the load and the obstacle below, m
    pub min_clearance_h2_m: f64,

    /// Radius selection method
    pub radius_method: RadiusMethod,
    /// Working radius when `radius_method` is Manual, m
    pub min_radius_m: f64,
    /// Horizontal distance between the boom and the nearest object edge, m
    pub edge_distance_m: f64,
    /// Required boom-to-object safety distance ε, m
    pub safety_distance_m: f64,

    /// Crane-selection strategy
    pub recommendation: RecommendationMode,
    /// Manufacturer name (required for every recommendation mode)
    pub manufacturer: String,
    /// Model name (required for ByModel and ByCondition)
    pub model: String,
    /// Boom configuration family to consider
    pub boom_type: BoomType,
    /// Selected condition for ByModel; None picks the first matching one
    pub condition_id: Option<i64>,

    /// Per-axle loads of the bare machine, tonnes
    pub axle_loads_t: Vec<f64>,
    /// Outrigger geometry and footing data
    pub outriggers: OutriggerLayout,
    /// Counterweight mass, tonnes
    pub counterweight_t: f64,
    /// Distance from the slew axis to the counterweight centre, m
    pub counterweight_radius_m: f64,
    /// Soil bearing-capacity characteristic value, kPa
    pub soil_bearing_kpa: f64,
}

impl Default for TruckCraneModel {
    fn default() -> Self {
        TruckCraneModel {
            load_gw_t: 1.0,
            dynamic_factor_k1: 1.1,
            max_lift_height_h1_m: 8.0,
            min_clearance_h2_m: 2.0,
            radius_method: RadiusMethod::Auto,
            min_radius_m: 4.0,
            edge_distance_m: 2.0,
            safety_distance_m: 1.0,
            recommendation: RecommendationMode::ByModel,
            manufacturer: String::new(),
            model: String::new(),
            boom_type: BoomType::MainBoom,
            condition_id: None,
            axle_loads_t: vec![8.0, 8.0],
            outriggers: OutriggerLayout::default(),
            counterweight_t: 4.0,
            counterweight_radius_m: 2.5,
            soil_bearing_kpa: 300.0,
        }
    }
}

fn positive(field: &str, value: f64, what: &str) -> CalcResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalcError::invalid_parameters(
            field,
            value.to_string(),
            format!("{what} must be positive"),
        ));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64, what: &str) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::invalid_parameters(
            field,
            value.to_string(),
            format!("{what} cannot be negative"),
        ));
    }
    Ok(())
}

impl TruckCraneModel {
    /// Effective hook load Q = Gw · k1, tonnes.
    pub fn effective_load_t(&self) -> f64 {
        self.load_gw_t * self.dynamic_factor_k1
    }

    /// Bare-machine self weight from the per-axle loads, tonnes.
    pub fn self_weight_t(&self) -> f64 {
        self.axle_loads_t.iter().sum()
    }

    /// Height the boom tip must clear above ground, m.
    pub fn required_hook_height_m(&self) -> f64 {
        self.max_lift_height_h1_m + self.min_clearance_h2_m
    }

    /// Validate every field and the selection prerequisites.
    pub fn validate(&self) -> CalcResult<()> {
        positive("load_gw_t", self.load_gw_t, "Hook load")?;
        if !self.dynamic_factor_k1.is_finite() || !(1.0..=2.0).contains(&self.dynamic_factor_k1) {
            return Err(CalcError::invalid_parameters(
                "dynamic_factor_k1",
                self.dynamic_factor_k1.to_string(),
                "Dynamic factor must be between 1.0 and 2.0",
            ));
        }
        positive("max_lift_height_h1_m", self.max_lift_height_h1_m, "Lift height")?;
        non_negative("min_clearance_h2_m", self.min_clearance_h2_m, "Clearance")?;
        if self.radius_method == RadiusMethod::Manual {
            positive("min_radius_m", self.min_radius_m, "Working radius")?;
        }
        non_negative("edge_distance_m", self.edge_distance_m, "Edge distance")?;
        non_negative("safety_distance_m", self.safety_distance_m, "Safety distance")?;

        if self.manufacturer.trim().is_empty() {
            return Err(CalcError::invalid_parameters(
                "manufacturer",
                "",
                "A manufacturer must be selected",
            ));
        }
        if self.recommendation != RecommendationMode::ByManufacturer
            && self.model.trim().is_empty()
        {
            return Err(CalcError::invalid_parameters(
                "model",
                "",
                "A crane model must be selected",
            ));
        }

        if self.axle_loads_t.is_empty() {
            return Err(CalcError::invalid_parameters(
                "axle_loads_t",
                "[]",
                "At least one axle load is required",
            ));
        }
        for (i, axle) in self.axle_loads_t.iter().enumerate() {
            positive(&format!("axle_loads_t[{i}]"), *axle, "Axle load")?;
        }
        positive(
            "outriggers.longitudinal_spacing_m",
            self.outriggers.longitudinal_spacing_m,
            "Longitudinal outrigger spacing",
        )?;
        positive(
            "outriggers.lateral_spacing_m",
            self.outriggers.lateral_spacing_m,
            "Lateral outrigger spacing",
        )?;
        non_negative(
            "outriggers.pad_height_m",
            self.outriggers.pad_height_m,
            "Pad height",
        )?;
        non_negative(
            "outriggers.slew_offset_m",
            self.outriggers.slew_offset_m,
            "Slew offset",
        )?;
        positive("outriggers.pad_area_m2", self.outriggers.pad_area_m2, "Pad area")?;
        non_negative("counterweight_t", self.counterweight_t, "Counterweight")?;
        non_negative(
            "counterweight_radius_m",
            self.counterweight_radius_m,
            "Counterweight radius",
        )?;
        positive("soil_bearing_kpa", self.soil_bearing_kpa, "Soil bearing capacity")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model() -> TruckCraneModel {
        TruckCraneModel {
            manufacturer: "XCMG".to_string(),
            model: "QY25K".to_string(),
            ..TruckCraneModel::default()
        }
    }

    #[test]
    fn test_defaults_validate_with_selection() {
        assert!(test_model().validate().is_ok());
        // Missing manufacturer fails
        assert!(TruckCraneModel::default().validate().is_err());
    }

    #[test]
    fn test_effective_load() {
        let mut model = test_model();
        model.load_gw_t = 30.0;
        model.dynamic_factor_k1 = 1.2;
        assert!((model.effective_load_t() - 36.0).abs() < 1e-12);
    }

    #[test]
    fn test_self_weight_from_axles() {
        let mut model = test_model();
        model.axle_loads_t = vec![7.5, 8.5, 9.0];
        assert!((model.self_weight_t() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_dynamic_factor_range() {
        let mut model = test_model();
        model.dynamic_factor_k1 = 0.9;
        assert!(model.validate().is_err());
        model.dynamic_factor_k1 = 2.1;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_manual_radius_must_be_positive() {
        let mut model = test_model();
        model.radius_method = RadiusMethod::Manual;
        model.min_radius_m = 0.0;
        assert!(model.validate().is_err());
        model.min_radius_m = 4.0;
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_by_manufacturer_needs_no_model() {
        let mut model = test_model();
        model.recommendation = RecommendationMode::ByManufacturer;
        model.model = String::new();
        assert!(model.validate().is_ok());
    }
}
