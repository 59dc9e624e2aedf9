//! # Parameter Models
//!
//! Each supported calculation has a typed parameter model. A model owns its
//! data and is passed by reference into the pure dispatcher functions; the
//! UI shell observes it through the project store rather than reaching into
//! widget trees.
//!
//! The wrapper [`ParameterModel`] carries what every calculation shares: the
//! kind discriminator, the project identity, the dirty flag, and the display
//! name shown in the side panel.

pub mod slope;
pub mod truck_crane;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};
use crate::registry::CalculationKind;

pub use slope::{SlopeModel, SoilType, VerificationProject};
pub use truck_crane::{
    BoomType, OutriggerLayout, RadiusMethod, RecommendationMode, TruckCraneModel,
};

/// Opaque unique identifier shared between the live parameter model, the
/// side-panel tree entry, and the tab holding its form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Generate a fresh identity at project creation.
    pub fn new() -> Self {
        ProjectId(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        ProjectId::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Enum wrapper over the concrete parameter models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationParams {
    Slope(SlopeModel),
    TruckCrane(TruckCraneModel),
}

impl CalculationParams {
    /// The calculation kind implied by the concrete model.
    pub fn kind(&self) -> CalculationKind {
        match self {
            CalculationParams::Slope(_) => CalculationKind::SoilEmbankment,
            CalculationParams::TruckCrane(_) => CalculationKind::HydraulicTruckCrane,
        }
    }

    /// Run the model's full validation pass.
    pub fn validate(&self) -> CalcResult<()> {
        match self {
            CalculationParams::Slope(m) => m.validate(),
            CalculationParams::TruckCrane(m) => m.validate(),
        }
    }
}

/// A parameter model with its shared identity data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterModel {
    /// Calculation-type discriminator; persisted as its stable code
    pub kind: CalculationKind,
    /// Project identity, created with the project
    pub id: ProjectId,
    /// Set on any successful mutation; cleared by a save
    #[serde(skip)]
    pub dirty: bool,
    /// Name shown in the side-panel tree and report titles
    pub display_name: String,
    /// The concrete, typed inputs
    pub params: CalculationParams,
}

impl ParameterModel {
    /// Create a new slope/excavation project.
    pub fn new_slope(display_name: impl Into<String>) -> Self {
        Self::with_params(display_name, CalculationParams::Slope(SlopeModel::default()))
    }

    /// Create a new truck-crane project.
    pub fn new_truck_crane(display_name: impl Into<String>) -> Self {
        Self::with_params(
            display_name,
            CalculationParams::TruckCrane(TruckCraneModel::default()),
        )
    }

    /// Wrap concrete params in a fresh identity.
    pub fn with_params(display_name: impl Into<String>, params: CalculationParams) -> Self {
        ParameterModel {
            kind: params.kind(),
            id: ProjectId::new(),
            dirty: false,
            display_name: display_name.into(),
            params,
        }
    }

    /// Validate the kind/params pairing plus the concrete model.
    pub fn validate(&self) -> CalcResult<()> {
        if self.kind != self.params.kind() {
            return Err(CalcError::internal(format!(
                "kind {:?} does not match parameter model {:?}",
                self.kind,
                self.params.kind()
            )));
        }
        self.params.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_ids_are_unique() {
        assert_ne!(ProjectId::new(), ProjectId::new());
    }

    #[test]
    fn test_kind_matches_params() {
        let slope = ParameterModel::new_slope("Pit A");
        assert_eq!(slope.kind, CalculationKind::SoilEmbankment);
        assert!(!slope.dirty);

        let crane = ParameterModel::new_truck_crane("Lift 3");
        assert_eq!(crane.kind, CalculationKind::HydraulicTruckCrane);
    }

    #[test]
    fn test_mismatched_kind_is_internal_error() {
        let mut model = ParameterModel::new_slope("Pit A");
        model.kind = CalculationKind::CrawlerCrane;
        assert_eq!(model.validate().unwrap_err().error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_serde_roundtrip_keeps_kind_code() {
        let model = ParameterModel::new_slope("Pit A");
        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"kind\":6"));

        let roundtrip: ParameterModel = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.kind, model.kind);
        assert_eq!(roundtrip.id, model.id);
    }
}
