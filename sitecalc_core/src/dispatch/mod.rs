//! # Calculation Dispatcher
//!
//! Maps a parameter model to its formula evaluator and returns a structured
//! result. Dispatch is by calculation kind and, within a kind, by the
//! model's own sub-case discriminators. The evaluators are pure functions
//! of their inputs; the crane evaluator additionally reads the crane-spec
//! store.

pub mod slope;
pub mod truck_crane;

use serde::{Deserialize, Serialize};

use crate::crane_db::CraneSpecStore;
use crate::errors::{CalcError, CalcResult};
use crate::params::{CalculationParams, ParameterModel};
use crate::registry::CalculationKind;

pub use slope::{SlopeClassification, SlopeResult};
pub use truck_crane::{CraneEvaluation, CraneResult, FailReason, Verdict};

/// A formula with its substituted numeric values, ready for report
/// rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    /// Symbolic form, e.g. `Hmax = 2c / (K·γ·tan(45° − φ/2)) − q/γ`
    pub expression: String,
    /// The same form with numbers substituted
    pub substitution: String,
    /// Rounded display value
    pub value: f64,
    pub unit: String,
}

/// Tagged result record for every calculation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationResult {
    Slope(SlopeResult),
    Crane(CraneEvaluation),
}

/// Evaluate the model with the formula set for its kind.
///
/// Kinds without an evaluator (the uninitialised sentinel and the crawler
/// crane, which has no formula set yet) fail with `UnsupportedCase`.
pub fn calculate(
    model: &ParameterModel,
    crane_store: &dyn CraneSpecStore,
) -> CalcResult<CalculationResult> {
    match (model.kind, &model.params) {
        (CalculationKind::SoilEmbankment, CalculationParams::Slope(m)) => {
            slope::evaluate(m).map(CalculationResult::Slope)
        }
        (CalculationKind::HydraulicTruckCrane, CalculationParams::TruckCrane(m)) => {
            truck_crane::evaluate(m, crane_store).map(CalculationResult::Crane)
        }
        (kind, _) => Err(CalcError::unsupported_case(
            kind.display_name(),
            "no formula evaluator is registered for this calculation kind",
        )),
    }
}

/// Round for display only; dependent steps keep the unrounded value.
pub(crate) fn round_display(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crane_db::MemoryCraneStore;

    #[test]
    fn test_unsupported_kind() {
        let mut model = ParameterModel::new_slope("Pit A");
        model.kind = CalculationKind::CrawlerCrane;

        let store = MemoryCraneStore::new();
        let err = calculate(&model, &store).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_CASE");
    }

    #[test]
    fn test_round_display() {
        assert_eq!(round_display(1.15109, 2), 1.15);
        assert_eq!(round_display(645.0567, 3), 645.057);
        assert_eq!(round_display(2.5, 0), 3.0);
    }

    #[test]
    fn test_slope_dispatch() {
        let model = ParameterModel::new_slope("Pit A");
        let store = MemoryCraneStore::new();
        let result = calculate(&model, &store).unwrap();
        assert!(matches!(result, CalculationResult::Slope(_)));
    }
}
