//! # Truck-Crane Sizing Evaluator
//!
//! Sizes a hydraulic truck crane against a lift:
//!
//! 1. Effective load `Q = Gw·k1`.
//! 2. Working radius, either supplied or the smallest chart radius with a
//!    feasible boom.
//! 3. Shortest chart boom length whose tip clears `h1 + h2`, from the
//!    triangle between the boom hinge and the hook.
//! 4. Rated capacity from the chart, conservative cell selection.
//! 5. Safety checks: utilisation, boom-to-object clearance, outrigger
//!    bearing pressure, and overturning margin.
//! 6. Verdict with the enumerated failing reasons.
//!
//! The ground checks use a rigid-body moment balance over the outrigger
//! rectangle: the hook-load moment less the counterweight moment is shared
//! across the outrigger spacing, once for the lateral and once for the
//! longitudinal direction, and the worse direction governs.

use serde::{Deserialize, Serialize};

use crate::crane_db::{conservative_lookup, BoomCondition, CapacityRow, CraneSpec, CraneSpecStore};
use crate::errors::{CalcError, CalcResult};
use crate::params::{BoomType, RadiusMethod, RecommendationMode, TruckCraneModel};

/// Minimum acceptable ratio of stabilising to overturning moment.
pub const MIN_OVERTURNING_MARGIN: f64 = 1.2;

/// kN per tonne.
const GRAVITY: f64 = 9.8;

/// Reported margin when the load line falls inside the outrigger rectangle
/// and no overturning moment exists. Keeps results JSON-serializable.
const UNBOUNDED_MARGIN: f64 = 999.0;

const COORD_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Ok,
    Fail,
}

/// Enumerated reasons a configuration fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailReason {
    /// Effective load exceeds the rated capacity
    OverCapacity,
    /// No chart cell covers the requested configuration
    NoMatchingCapacity,
    /// Boom-to-object distance below the safety distance
    InsufficientClearance,
    /// Outrigger pressure exceeds the soil bearing characteristic
    BearingExceeded,
    /// Stabilising-to-overturning moment ratio below 1.2
    Overturning,
    /// No chart boom length reaches the required hook height
    UnreachableHeight,
}

/// Outcome for one evaluated crane/condition pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraneResult {
    pub crane_id: i64,
    pub crane: String,
    pub manufacturer: String,
    pub condition_id: i64,
    pub condition: String,

    pub working_radius_m: f64,
    pub boom_length_m: f64,
    pub rated_capacity_t: Option<f64>,
    pub utilisation: Option<f64>,
    pub bearing_pressure_kpa: f64,
    pub overturning_margin: f64,

    pub verdict: Verdict,
    pub reasons: Vec<FailReason>,
}

impl CraneResult {
    pub fn passes(&self) -> bool {
        self.verdict == Verdict::Ok
    }
}

/// All evaluated candidates plus the recommended one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraneEvaluation {
    /// Effective load Q = Gw·k1, tonnes
    pub effective_load_t: f64,
    pub candidates: Vec<CraneResult>,
    /// Index into `candidates` of the recommended configuration
    pub selected: Option<usize>,
}

impl CraneEvaluation {
    pub fn selected_result(&self) -> Option<&CraneResult> {
        self.selected.and_then(|i| self.candidates.get(i))
    }
}

/// Evaluate the crane model against the crane specification store.
pub fn evaluate(
    model: &TruckCraneModel,
    store: &dyn CraneSpecStore,
) -> CalcResult<CraneEvaluation> {
    model.validate()?;
    let q = model.effective_load_t();

    let mut candidates = Vec::new();
    match model.recommendation {
        RecommendationMode::ByModel => {
            let spec = find_model(store, &model.manufacturer, &model.model)?;
            let conditions = matching_conditions(store, &spec, model.boom_type)?;
            let condition = match model.condition_id {
                Some(id) => conditions
                    .into_iter()
                    .find(|c| c.condition_id == id)
                    .ok_or_else(|| {
                        CalcError::no_matching_capacity(
                            &spec.name,
                            id.to_string(),
                            "the selected condition does not exist for this boom type",
                        )
                    })?,
                None => conditions.into_iter().next().ok_or_else(|| {
                    CalcError::no_matching_capacity(
                        &spec.name,
                        "-",
                        "the crane has no conditions for the selected boom type",
                    )
                })?,
            };
            candidates.push(evaluate_condition(model, store, &spec, &condition, q)?);
        }
        RecommendationMode::ByCondition => {
            let spec = find_model(store, &model.manufacturer, &model.model)?;
            let conditions = matching_conditions(store, &spec, model.boom_type)?;
            if conditions.is_empty() {
                return Err(CalcError::no_matching_capacity(
                    &spec.name,
                    "-",
                    "the crane has no conditions for the selected boom type",
                ));
            }
            for condition in &conditions {
                candidates.push(evaluate_condition(model, store, &spec, condition, q)?);
            }
        }
        RecommendationMode::ByManufacturer => {
            // list_models orders by max capacity, so the first passing crane
            // is the smallest machine that does the job.
            let specs = store.list_models(&model.manufacturer)?;
            if specs.is_empty() {
                return Err(CalcError::no_matching_capacity(
                    &model.manufacturer,
                    "-",
                    "no cranes are registered for this manufacturer",
                ));
            }
            for spec in &specs {
                let conditions = matching_conditions(store, spec, model.boom_type)?;
                let mut best: Option<CraneResult> = None;
                for condition in &conditions {
                    let result = evaluate_condition(model, store, spec, condition, q)?;
                    let passed = result.passes();
                    match &best {
                        None => best = Some(result),
                        Some(b) if !b.passes() && passed => best = Some(result),
                        _ => {}
                    }
                    if passed {
                        break;
                    }
                }
                if let Some(result) = best {
                    candidates.push(result);
                }
            }
        }
    }

    let selected = candidates.iter().position(|r| r.passes());
    if selected.is_none() {
        tracing::debug!(
            effective_load_t = q,
            evaluated = candidates.len(),
            "no crane configuration passed all checks"
        );
    }
    Ok(CraneEvaluation {
        effective_load_t: q,
        candidates,
        selected,
    })
}

fn find_model(
    store: &dyn CraneSpecStore,
    manufacturer: &str,
    model_name: &str,
) -> CalcResult<CraneSpec> {
    store
        .list_models(manufacturer)?
        .into_iter()
        .find(|spec| spec.name == model_name)
        .ok_or_else(|| {
            CalcError::no_matching_capacity(
                model_name,
                "-",
                format!("no such model for manufacturer {manufacturer}"),
            )
        })
}

fn matching_conditions(
    store: &dyn CraneSpecStore,
    spec: &CraneSpec,
    boom_type: BoomType,
) -> CalcResult<Vec<BoomCondition>> {
    let want_jib = boom_type == BoomType::MainPlusJib;
    Ok(store
        .list_conditions(spec.crane_id)?
        .into_iter()
        .filter(|c| c.is_jib == want_jib)
        .collect())
}

/// Boom length needed for the tip to clear the hook height at this radius,
/// from the hinge-to-hook triangle.
fn required_boom_length(spec: &CraneSpec, radius_m: f64, hook_height_m: f64) -> f64 {
    let dx = (radius_m - spec.hinge_offset_m).max(0.0);
    let dy = (hook_height_m - spec.hinge_height_m).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

fn sorted_unique(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values.dedup_by(|a, b| (*a - *b).abs() < COORD_EPS);
    values
}

fn evaluate_condition(
    model: &TruckCraneModel,
    store: &dyn CraneSpecStore,
    spec: &CraneSpec,
    condition: &BoomCondition,
    q: f64,
) -> CalcResult<CraneResult> {
    let rows = store.capacity_table(spec.crane_id, condition.condition_id)?;
    let hook_height = model.required_hook_height_m();

    // Jib conditions reach with boom plus jib; the shortest jib on the
    // chart is requested so the conservative lookup stays on-chart.
    let jib_request = if condition.is_jib {
        rows.iter()
            .filter_map(|r| r.jib_length_m)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    } else {
        None
    };
    let reach_extra = jib_request.unwrap_or(0.0);

    let mut reasons = Vec::new();

    let working_radius = match model.radius_method {
        RadiusMethod::Manual => model.min_radius_m,
        RadiusMethod::Auto => {
            auto_radius(&rows, spec, hook_height, reach_extra, q).unwrap_or_else(|| {
                // Nothing feasible; report against the closest-in chart
                // radius so the failing checks are still meaningful.
                sorted_unique(rows.iter().map(|r| r.radius_m).collect())
                    .first()
                    .copied()
                    .unwrap_or(model.min_radius_m)
            })
        }
    };

    let required_len = required_boom_length(spec, working_radius, hook_height);
    let lengths = sorted_unique(rows.iter().map(|r| r.boom_length_m).collect());
    let boom_length = lengths
        .iter()
        .copied()
        .find(|&l| l + reach_extra + COORD_EPS >= required_len);

    let boom_length = match boom_length {
        Some(l) => l,
        None => {
            reasons.push(FailReason::UnreachableHeight);
            lengths.last().copied().unwrap_or(0.0)
        }
    };

    let rated_capacity = conservative_lookup(&rows, working_radius, boom_length, jib_request);
    if rated_capacity.is_none() {
        tracing::debug!(
            crane = %spec.name,
            condition = %condition.description,
            radius = working_radius,
            boom = boom_length,
            "capacity lookup miss"
        );
        reasons.push(FailReason::NoMatchingCapacity);
    }

    let utilisation = rated_capacity.map(|cap| q / cap);
    if let Some(u) = utilisation {
        if u > 1.0 {
            reasons.push(FailReason::OverCapacity);
        }
    }

    if model.edge_distance_m < model.safety_distance_m {
        reasons.push(FailReason::InsufficientClearance);
    }

    let ground = ground_checks(model, q, working_radius);
    if ground.pressure_kpa > model.soil_bearing_kpa {
        reasons.push(FailReason::BearingExceeded);
    }
    if ground.margin < MIN_OVERTURNING_MARGIN {
        reasons.push(FailReason::Overturning);
    }

    let verdict = if reasons.is_empty() {
        Verdict::Ok
    } else {
        Verdict::Fail
    };

    Ok(CraneResult {
        crane_id: spec.crane_id,
        crane: spec.name.clone(),
        manufacturer: spec.manufacturer.clone(),
        condition_id: condition.condition_id,
        condition: condition.description.clone(),
        working_radius_m: working_radius,
        boom_length_m: boom_length,
        rated_capacity_t: rated_capacity,
        utilisation,
        bearing_pressure_kpa: ground.pressure_kpa,
        overturning_margin: ground.margin,
        verdict,
        reasons,
    })
}

/// Smallest chart radius with a boom that both reaches the hook height and
/// carries the effective load.
fn auto_radius(
    rows: &[CapacityRow],
    spec: &CraneSpec,
    hook_height_m: f64,
    reach_extra_m: f64,
    q: f64,
) -> Option<f64> {
    let radii = sorted_unique(rows.iter().map(|r| r.radius_m).collect());
    radii.into_iter().find(|&radius| {
        let required = required_boom_length(spec, radius, hook_height_m);
        rows.iter().any(|row| {
            (row.radius_m - radius).abs() < COORD_EPS
                && row.boom_length_m + reach_extra_m + COORD_EPS >= required
                && row.capacity_t.map_or(false, |cap| cap >= q)
        })
    })
}

struct GroundCheck {
    pressure_kpa: f64,
    margin: f64,
}

/// Rigid-body moment balance over the outrigger rectangle.
///
/// The boom is taken over a side for the lateral direction and over an end
/// for the longitudinal one; the near pair of outriggers carries half the
/// total weight plus the shared net moment, and one leg carries half of
/// that pair load on its footing area.
fn ground_checks(model: &TruckCraneModel, q_t: f64, radius_m: f64) -> GroundCheck {
    let w_self = model.self_weight_t() * GRAVITY;
    let w_counter = model.counterweight_t * GRAVITY;
    let w_load = q_t * GRAVITY;
    let w_total = w_self + w_counter + w_load;

    // Load arm about the outrigger-rectangle centre; the slew offset moves
    // the load away from the centre in the worst slew position.
    let load_arm = radius_m + model.outriggers.slew_offset_m;

    let mut pressure_kpa: f64 = 0.0;
    let mut margin: f64 = UNBOUNDED_MARGIN;

    for spacing in [
        model.outriggers.lateral_spacing_m,
        model.outriggers.longitudinal_spacing_m,
    ] {
        let half = spacing / 2.0;

        let moment = w_load * load_arm - w_counter * model.counterweight_radius_m;
        let near_pair = w_total / 2.0 + moment / spacing;
        let leg = near_pair / 2.0;
        pressure_kpa = pressure_kpa.max(leg / model.outriggers.pad_area_m2);

        let overturning = w_load * (load_arm - half);
        let stabilising =
            w_self * half + w_counter * (half + model.counterweight_radius_m);
        let dir_margin = if overturning > 0.0 {
            (stabilising / overturning).min(UNBOUNDED_MARGIN)
        } else {
            UNBOUNDED_MARGIN
        };
        margin = margin.min(dir_margin);
    }

    GroundCheck {
        pressure_kpa,
        margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crane_db::MemoryCraneStore;

    /// Lift reaching 13 m so the 10.4 m boom is too short and the chart
    /// cell at (R = 4, L = 15.08) governs.
    fn base_model() -> TruckCraneModel {
        TruckCraneModel {
            load_gw_t: 30.0,
            dynamic_factor_k1: 1.2,
            max_lift_height_h1_m: 11.0,
            min_clearance_h2_m: 2.0,
            radius_method: RadiusMethod::Manual,
            min_radius_m: 4.0,
            manufacturer: "XCMG".to_string(),
            model: "QY25K".to_string(),
            condition_id: Some(11),
            ..TruckCraneModel::default()
        }
    }

    #[test]
    fn test_over_capacity_fails() {
        let store = MemoryCraneStore::sample();
        let eval = evaluate(&base_model(), &store).unwrap();

        // Q = 30 × 1.2 = 36 t against a 10.8 t cell
        assert!((eval.effective_load_t - 36.0).abs() < 1e-9);
        assert_eq!(eval.candidates.len(), 1);
        let result = &eval.candidates[0];
        assert_eq!(result.boom_length_m, 15.08);
        assert_eq!(result.rated_capacity_t, Some(10.8));
        assert_eq!(result.verdict, Verdict::Fail);
        assert!(result.reasons.contains(&FailReason::OverCapacity));
        assert!(eval.selected.is_none());
    }

    #[test]
    fn test_lighter_load_passes() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.load_gw_t = 8.0;

        let eval = evaluate(&model, &store).unwrap();
        let result = eval.selected_result().expect("a passing configuration");
        assert_eq!(result.verdict, Verdict::Ok);
        assert!(result.reasons.is_empty());
        // Q = 9.6 t on the 10.8 t cell
        let u = result.utilisation.unwrap();
        assert!((u - 0.889).abs() < 1e-3, "u = {u}");
    }

    #[test]
    fn test_auto_radius_picks_smallest_feasible() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.load_gw_t = 8.0;
        model.radius_method = RadiusMethod::Auto;

        let eval = evaluate(&model, &store).unwrap();
        let result = &eval.candidates[0];
        // 3.0 m offers only the 10.4 m boom, too short for a 13 m hook
        // height; 3.5 m is the first radius with a feasible cell.
        assert_eq!(result.working_radius_m, 3.5);
        assert_eq!(result.boom_length_m, 15.08);
        assert_eq!(result.rated_capacity_t, Some(12.0));
        assert!(result.passes());
    }

    #[test]
    fn test_by_manufacturer_recommends_smallest_passing_crane() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.recommendation = RecommendationMode::ByManufacturer;
        model.model = String::new();
        model.radius_method = RadiusMethod::Auto;
        model.load_gw_t = 20.0;
        model.dynamic_factor_k1 = 1.0;

        let eval = evaluate(&model, &store).unwrap();
        assert_eq!(eval.candidates.len(), 2);
        assert_eq!(eval.candidates[0].crane, "QY25K");
        assert!(!eval.candidates[0].passes());
        let selected = eval.selected_result().unwrap();
        assert_eq!(selected.crane, "QY50K");
    }

    #[test]
    fn test_by_condition_returns_matching_conditions() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.recommendation = RecommendationMode::ByCondition;
        model.condition_id = None;
        model.boom_type = BoomType::MainPlusJib;
        model.radius_method = RadiusMethod::Auto;
        model.load_gw_t = 1.5;
        model.dynamic_factor_k1 = 1.0;
        model.max_lift_height_h1_m = 8.0;

        let eval = evaluate(&model, &store).unwrap();
        assert_eq!(eval.candidates.len(), 1);
        let result = &eval.candidates[0];
        assert_eq!(result.condition_id, 12);
        assert!(result.passes());
        assert_eq!(result.rated_capacity_t, Some(2.0));
    }

    #[test]
    fn test_clearance_check() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.load_gw_t = 8.0;
        model.edge_distance_m = 0.5;
        model.safety_distance_m = 1.0;

        let eval = evaluate(&model, &store).unwrap();
        assert!(eval.candidates[0]
            .reasons
            .contains(&FailReason::InsufficientClearance));
    }

    #[test]
    fn test_bearing_check() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.load_gw_t = 8.0;
        model.soil_bearing_kpa = 50.0;

        let eval = evaluate(&model, &store).unwrap();
        let result = &eval.candidates[0];
        assert!(result.bearing_pressure_kpa > 50.0);
        assert!(result.reasons.contains(&FailReason::BearingExceeded));
    }

    #[test]
    fn test_overturning_check() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.load_gw_t = 2.5;
        model.dynamic_factor_k1 = 1.0;
        model.max_lift_height_h1_m = 8.0;
        model.min_radius_m = 12.0;
        model.axle_loads_t = vec![3.0, 3.0];
        model.counterweight_t = 0.0;

        let eval = evaluate(&model, &store).unwrap();
        let result = &eval.candidates[0];
        assert!(result.overturning_margin < MIN_OVERTURNING_MARGIN);
        assert!(result.reasons.contains(&FailReason::Overturning));
    }

    #[test]
    fn test_unreachable_height() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.max_lift_height_h1_m = 40.0;

        let eval = evaluate(&model, &store).unwrap();
        let result = &eval.candidates[0];
        assert!(result.reasons.contains(&FailReason::UnreachableHeight));
        assert_eq!(result.verdict, Verdict::Fail);
    }

    #[test]
    fn test_unknown_model_is_recoverable_miss() {
        let store = MemoryCraneStore::sample();
        let mut model = base_model();
        model.model = "QY999".to_string();

        let err = evaluate(&model, &store).unwrap_err();
        assert_eq!(err.error_code(), "NO_MATCHING_CAPACITY");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_ground_checks_worst_direction() {
        let model = base_model();
        // A longer arm raises pressure and lowers the margin
        let near = ground_checks(&model, 9.6, 4.0);
        let far = ground_checks(&model, 9.6, 6.0);
        assert!(far.pressure_kpa > near.pressure_kpa);
        assert!(far.margin < near.margin);
    }
}
