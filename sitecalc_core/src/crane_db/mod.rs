//! # Crane-Spec Store
//!
//! Read-only query interface over the crane specification data: crane
//! models, their boom conditions, and the manufacturer capacity charts.
//! The relational back end lives in [`sqlite`]; [`MemoryCraneStore`] holds
//! the same data in memory for tests and demos.
//!
//! Capacity charts are assumed monotone: for a fixed boom length the rated
//! capacity is non-increasing in radius, and for a fixed radius it is
//! non-increasing in boom length. The conservative lookup relies on this.

pub mod sqlite;

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;

pub use sqlite::SqliteCraneStore;

/// One crane model row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraneSpec {
    pub crane_id: i64,
    pub name: String,
    pub manufacturer: String,
    /// Maximum rated capacity over all charts, tonnes
    pub max_capacity_t: f64,
    /// Boom hinge height above ground, m
    pub hinge_height_m: f64,
    /// Horizontal offset of the boom hinge from the slew axis, m
    pub hinge_offset_m: f64,
}

/// One boom condition (counterweight / outrigger / jib combination) that
/// selects a capacity chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoomCondition {
    pub condition_id: i64,
    pub description: String,
    pub is_jib: bool,
}

/// One cell of a capacity chart. `capacity_t` is `None` where the source
/// chart is empty, meaning the crane cannot lift at that configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityRow {
    pub radius_m: f64,
    pub boom_length_m: f64,
    pub jib_length_m: Option<f64>,
    pub jib_angle_deg: Option<f64>,
    pub capacity_t: Option<f64>,
}

/// Read-only queries over the crane specification data.
pub trait CraneSpecStore {
    fn list_manufacturers(&self) -> CalcResult<Vec<String>>;

    fn list_models(&self, manufacturer: &str) -> CalcResult<Vec<CraneSpec>>;

    fn list_conditions(&self, crane_id: i64) -> CalcResult<Vec<BoomCondition>>;

    fn capacity_table(&self, crane_id: i64, condition_id: i64) -> CalcResult<Vec<CapacityRow>>;

    /// Rated capacity at `(radius, boom length)` for the given condition.
    ///
    /// Coordinates between chart entries resolve to the conservative
    /// adjacent cell; off-chart coordinates return `None`.
    fn lookup_capacity(
        &self,
        crane_id: i64,
        condition_id: i64,
        radius_m: f64,
        boom_length_m: f64,
        jib_length_m: Option<f64>,
    ) -> CalcResult<Option<f64>> {
        let rows = self.capacity_table(crane_id, condition_id)?;
        Ok(conservative_lookup(&rows, radius_m, boom_length_m, jib_length_m))
    }
}

const COORD_EPS: f64 = 1e-6;

/// Pick the chart cell for `(radius, boom length)`, never interpolating.
///
/// Both coordinates round up to the nearest chart entry; by the chart
/// monotonicity contract that cell carries a capacity no larger than the
/// true rating, so the selection errs on the safe side. Returns `None` when
/// either coordinate lies beyond the chart or the selected cell is empty.
pub fn conservative_lookup(
    rows: &[CapacityRow],
    radius_m: f64,
    boom_length_m: f64,
    jib_length_m: Option<f64>,
) -> Option<f64> {
    let mut best: Option<&CapacityRow> = None;

    for row in rows {
        if row.capacity_t.is_none() {
            continue;
        }
        if row.radius_m + COORD_EPS < radius_m || row.boom_length_m + COORD_EPS < boom_length_m {
            continue;
        }
        match (jib_length_m, row.jib_length_m) {
            (None, None) => {}
            (Some(want), Some(have)) if have + COORD_EPS >= want => {}
            _ => continue,
        }

        let better = match best {
            None => true,
            Some(current) => {
                let key = (row.radius_m, row.boom_length_m, row.jib_length_m.unwrap_or(0.0));
                let cur = (
                    current.radius_m,
                    current.boom_length_m,
                    current.jib_length_m.unwrap_or(0.0),
                );
                key < cur
            }
        };
        if better {
            best = Some(row);
        }
    }

    best.and_then(|row| row.capacity_t)
}

/// In-memory crane store for tests, demos, and data staged before import.
#[derive(Debug, Default)]
pub struct MemoryCraneStore {
    cranes: Vec<(CraneSpec, Vec<(BoomCondition, Vec<CapacityRow>)>)>,
}

impl MemoryCraneStore {
    pub fn new() -> Self {
        MemoryCraneStore::default()
    }

    pub fn add_crane(&mut self, spec: CraneSpec) -> &mut Self {
        self.cranes.push((spec, Vec::new()));
        self
    }

    pub fn add_condition(
        &mut self,
        crane_id: i64,
        condition: BoomCondition,
        rows: Vec<CapacityRow>,
    ) -> &mut Self {
        if let Some((_, conditions)) = self.cranes.iter_mut().find(|(c, _)| c.crane_id == crane_id)
        {
            conditions.push((condition, rows));
        }
        self
    }

    /// A small but realistic data set: two XCMG truck cranes and one
    /// Zoomlion machine, each with monotone capacity charts.
    pub fn sample() -> Self {
        fn cell(radius: f64, boom: f64, cap: f64) -> CapacityRow {
            CapacityRow {
                radius_m: radius,
                boom_length_m: boom,
                jib_length_m: None,
                jib_angle_deg: None,
                capacity_t: Some(cap),
            }
        }
        fn jib_cell(radius: f64, boom: f64, jib: f64, angle: f64, cap: f64) -> CapacityRow {
            CapacityRow {
                radius_m: radius,
                boom_length_m: boom,
                jib_length_m: Some(jib),
                jib_angle_deg: Some(angle),
                capacity_t: Some(cap),
            }
        }

        let mut store = MemoryCraneStore::new();

        store.add_crane(CraneSpec {
            crane_id: 1,
            name: "QY25K".to_string(),
            manufacturer: "XCMG".to_string(),
            max_capacity_t: 25.0,
            hinge_height_m: 2.2,
            hinge_offset_m: 1.6,
        });
        store.add_condition(
            1,
            BoomCondition {
                condition_id: 11,
                description: "Outriggers fully extended, main boom".to_string(),
                is_jib: false,
            },
            vec![
                cell(3.0, 10.4, 25.0),
                cell(3.5, 10.4, 22.5),
                cell(4.0, 10.4, 20.0),
                cell(5.0, 10.4, 16.0),
                cell(6.0, 10.4, 13.0),
                cell(3.5, 15.08, 12.0),
                cell(4.0, 15.08, 10.8),
                cell(5.0, 15.08, 9.0),
                cell(6.0, 15.08, 7.5),
                cell(8.0, 15.08, 5.5),
                cell(4.0, 23.0, 8.0),
                cell(5.0, 23.0, 7.2),
                cell(6.0, 23.0, 6.5),
                cell(8.0, 23.0, 5.0),
                cell(10.0, 23.0, 3.8),
                cell(12.0, 23.0, 2.8),
                cell(6.0, 31.0, 4.5),
                cell(8.0, 31.0, 3.6),
                cell(10.0, 31.0, 2.8),
                cell(12.0, 31.0, 2.2),
                cell(14.0, 31.0, 1.7),
            ],
        );
        store.add_condition(
            1,
            BoomCondition {
                condition_id: 12,
                description: "Outriggers fully extended, main boom + 8 m jib".to_string(),
                is_jib: true,
            },
            vec![
                jib_cell(10.0, 31.0, 8.0, 30.0, 2.0),
                jib_cell(12.0, 31.0, 8.0, 30.0, 1.6),
                jib_cell(14.0, 31.0, 8.0, 30.0, 1.2),
            ],
        );

        store.add_crane(CraneSpec {
            crane_id: 2,
            name: "QY50K".to_string(),
            manufacturer: "XCMG".to_string(),
            max_capacity_t: 50.0,
            hinge_height_m: 2.6,
            hinge_offset_m: 1.9,
        });
        store.add_condition(
            2,
            BoomCondition {
                condition_id: 21,
                description: "Outriggers fully extended, main boom".to_string(),
                is_jib: false,
            },
            vec![
                cell(3.0, 11.3, 50.0),
                cell(4.0, 11.3, 40.0),
                cell(5.0, 11.3, 32.0),
                cell(6.0, 11.3, 26.0),
                cell(4.0, 19.0, 30.0),
                cell(5.0, 19.0, 25.0),
                cell(6.0, 19.0, 21.0),
                cell(8.0, 19.0, 15.0),
                cell(10.0, 19.0, 11.0),
                cell(6.0, 27.0, 14.0),
                cell(8.0, 27.0, 11.0),
                cell(10.0, 27.0, 8.5),
                cell(12.0, 27.0, 6.8),
            ],
        );

        store.add_crane(CraneSpec {
            crane_id: 3,
            name: "QY30V".to_string(),
            manufacturer: "Zoomlion".to_string(),
            max_capacity_t: 30.0,
            hinge_height_m: 2.3,
            hinge_offset_m: 1.7,
        });
        store.add_condition(
            3,
            BoomCondition {
                condition_id: 31,
                description: "Outriggers fully extended, main boom".to_string(),
                is_jib: false,
            },
            vec![
                cell(3.0, 10.8, 30.0),
                cell(4.0, 10.8, 24.0),
                cell(5.0, 10.8, 19.0),
                cell(4.0, 16.5, 14.0),
                cell(5.0, 16.5, 12.0),
                cell(6.0, 16.5, 10.0),
                cell(8.0, 16.5, 7.2),
            ],
        );

        store
    }
}

impl CraneSpecStore for MemoryCraneStore {
    fn list_manufacturers(&self) -> CalcResult<Vec<String>> {
        let mut names: Vec<String> = self
            .cranes
            .iter()
            .map(|(c, _)| c.manufacturer.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn list_models(&self, manufacturer: &str) -> CalcResult<Vec<CraneSpec>> {
        let mut models: Vec<CraneSpec> = self
            .cranes
            .iter()
            .filter(|(c, _)| c.manufacturer == manufacturer)
            .map(|(c, _)| c.clone())
            .collect();
        models.sort_by(|a, b| {
            a.max_capacity_t
                .partial_cmp(&b.max_capacity_t)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(models)
    }

    fn list_conditions(&self, crane_id: i64) -> CalcResult<Vec<BoomCondition>> {
        Ok(self
            .cranes
            .iter()
            .find(|(c, _)| c.crane_id == crane_id)
            .map(|(_, conditions)| conditions.iter().map(|(c, _)| c.clone()).collect())
            .unwrap_or_default())
    }

    fn capacity_table(&self, crane_id: i64, condition_id: i64) -> CalcResult<Vec<CapacityRow>> {
        Ok(self
            .cranes
            .iter()
            .find(|(c, _)| c.crane_id == crane_id)
            .and_then(|(_, conditions)| {
                conditions
                    .iter()
                    .find(|(c, _)| c.condition_id == condition_id)
                    .map(|(_, rows)| rows.clone())
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_listing() {
        let store = MemoryCraneStore::sample();
        assert_eq!(store.list_manufacturers().unwrap(), vec!["XCMG", "Zoomlion"]);

        let xcmg = store.list_models("XCMG").unwrap();
        assert_eq!(xcmg.len(), 2);
        // Sorted by max capacity ascending
        assert_eq!(xcmg[0].name, "QY25K");
        assert_eq!(xcmg[1].name, "QY50K");
    }

    #[test]
    fn test_exact_lookup() {
        let store = MemoryCraneStore::sample();
        let cap = store.lookup_capacity(1, 11, 4.0, 15.08, None).unwrap();
        assert_eq!(cap, Some(10.8));
    }

    #[test]
    fn test_between_entries_takes_conservative_cell() {
        let store = MemoryCraneStore::sample();
        // Radius 4.5 falls between 4.0 and 5.0; the 5.0 cell has the
        // smaller capacity and must win.
        let cap = store.lookup_capacity(1, 11, 4.5, 15.08, None).unwrap();
        assert_eq!(cap, Some(9.0));
        // Boom length 12.0 falls between 10.4 and 15.08.
        let cap = store.lookup_capacity(1, 11, 4.0, 12.0, None).unwrap();
        assert_eq!(cap, Some(10.8));
    }

    #[test]
    fn test_off_chart_is_none() {
        let store = MemoryCraneStore::sample();
        assert_eq!(store.lookup_capacity(1, 11, 20.0, 15.08, None).unwrap(), None);
        assert_eq!(store.lookup_capacity(1, 11, 4.0, 40.0, None).unwrap(), None);
    }

    #[test]
    fn test_jib_rows_are_separate() {
        let store = MemoryCraneStore::sample();
        // Main-boom lookup never sees jib rows
        assert_eq!(store.lookup_capacity(1, 12, 10.0, 31.0, None).unwrap(), None);
        assert_eq!(
            store.lookup_capacity(1, 12, 10.0, 31.0, Some(8.0)).unwrap(),
            Some(2.0)
        );
    }

    #[test]
    fn test_empty_cell_means_cannot_lift() {
        let rows = vec![CapacityRow {
            radius_m: 4.0,
            boom_length_m: 10.0,
            jib_length_m: None,
            jib_angle_deg: None,
            capacity_t: None,
        }];
        assert_eq!(conservative_lookup(&rows, 4.0, 10.0, None), None);
    }

    #[test]
    fn test_sample_charts_are_monotone() {
        let store = MemoryCraneStore::sample();
        for (crane, _) in &store.cranes {
            for condition in store.list_conditions(crane.crane_id).unwrap() {
                let rows = store
                    .capacity_table(crane.crane_id, condition.condition_id)
                    .unwrap();
                for a in &rows {
                    for b in &rows {
                        let (Some(ca), Some(cb)) = (a.capacity_t, b.capacity_t) else {
                            continue;
                        };
                        if a.jib_length_m != b.jib_length_m {
                            continue;
                        }
                        // Larger radius at the same boom length never lifts more
                        if a.boom_length_m == b.boom_length_m && a.radius_m < b.radius_m {
                            assert!(ca >= cb, "chart not monotone in radius");
                        }
                        // Longer boom at the same radius never lifts more
                        if a.radius_m == b.radius_m && a.boom_length_m < b.boom_length_m {
                            assert!(ca >= cb, "chart not monotone in boom length");
                        }
                    }
                }
            }
        }
    }
}
