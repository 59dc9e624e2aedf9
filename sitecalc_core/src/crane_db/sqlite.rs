//! # SQLite Crane Store
//!
//! [`CraneSpecStore`] over the single relational crane-spec file. The core
//! only ever reads; the ingest tooling that fills the file is external and
//! must emit the schema below.
//!
//! ```sql
//! CREATE TABLE TruckCrane (
//!     TruckCraneID        INTEGER PRIMARY KEY,
//!     TruckCraneName      TEXT NOT NULL,
//!     CraneManufacturers  TEXT NOT NULL,
//!     MaxLiftingWeight    REAL NOT NULL,
//!     HingeHeight         REAL NOT NULL DEFAULT 2.2,
//!     HingeOffset         REAL NOT NULL DEFAULT 1.6
//! );
//! CREATE TABLE TruckCraneCapacity (
//!     TruckCraneID              INTEGER NOT NULL,
//!     ConditionID               INTEGER NOT NULL,
//!     SpeWorkCondition          TEXT NOT NULL,
//!     IsJibHosCon               INTEGER NOT NULL DEFAULT 0,
//!     TruckCraneRange           REAL NOT NULL,
//!     TruckCraneMainArmLen      REAL NOT NULL,
//!     SecondMainArmLen          REAL,
//!     SecondElevation           REAL,
//!     TruckCraneRatedLiftingCap REAL
//! );
//! ```
//!
//! An empty `TruckCraneRatedLiftingCap` means the crane cannot lift at that
//! configuration and surfaces as `None`.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags};

use crate::errors::{CalcError, CalcResult};

use super::{BoomCondition, CapacityRow, CraneSpec, CraneSpecStore};

/// Read-only store over the crane-spec database file.
///
/// The core is single-threaded cooperative, so a plain connection without
/// interior locking is enough.
pub struct SqliteCraneStore {
    conn: Connection,
}

impl SqliteCraneStore {
    /// Open the crane-spec file read-only.
    pub fn open(path: &Path) -> CalcResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            CalcError::file_error("open crane database", path.display().to_string(), e.to_string())
        })?;
        Ok(SqliteCraneStore { conn })
    }

    /// Wrap an existing connection. Used by ingest tooling and tests that
    /// build the database in memory.
    pub fn from_connection(conn: Connection) -> Self {
        SqliteCraneStore { conn }
    }
}

impl CraneSpecStore for SqliteCraneStore {
    fn list_manufacturers(&self) -> CalcResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT CraneManufacturers FROM TruckCrane ORDER BY CraneManufacturers",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn list_models(&self, manufacturer: &str) -> CalcResult<Vec<CraneSpec>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT TruckCraneID, TruckCraneName, CraneManufacturers,
                   MaxLiftingWeight, HingeHeight, HingeOffset
            FROM TruckCrane
            WHERE CraneManufacturers = ?1
            ORDER BY MaxLiftingWeight
            "#,
        )?;
        let models = stmt
            .query_map(params![manufacturer], |row| {
                Ok(CraneSpec {
                    crane_id: row.get(0)?,
                    name: row.get(1)?,
                    manufacturer: row.get(2)?,
                    max_capacity_t: row.get(3)?,
                    hinge_height_m: row.get(4)?,
                    hinge_offset_m: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(models)
    }

    fn list_conditions(&self, crane_id: i64) -> CalcResult<Vec<BoomCondition>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT ConditionID, MIN(SpeWorkCondition), MAX(IsJibHosCon)
            FROM TruckCraneCapacity
            WHERE TruckCraneID = ?1
            GROUP BY ConditionID
            ORDER BY ConditionID
            "#,
        )?;
        let conditions = stmt
            .query_map(params![crane_id], |row| {
                Ok(BoomCondition {
                    condition_id: row.get(0)?,
                    description: row.get(1)?,
                    is_jib: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(conditions)
    }

    fn capacity_table(&self, crane_id: i64, condition_id: i64) -> CalcResult<Vec<CapacityRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT TruckCraneRange, TruckCraneMainArmLen, SecondMainArmLen,
                   SecondElevation, TruckCraneRatedLiftingCap
            FROM TruckCraneCapacity
            WHERE TruckCraneID = ?1 AND ConditionID = ?2
            ORDER BY TruckCraneRange, TruckCraneMainArmLen
            "#,
        )?;
        let rows = stmt
            .query_map(params![crane_id, condition_id], |row| {
                Ok(CapacityRow {
                    radius_m: row.get(0)?,
                    boom_length_m: row.get(1)?,
                    jib_length_m: row.get(2)?,
                    jib_angle_deg: row.get(3)?,
                    capacity_t: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SqliteCraneStore {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE TruckCrane (
                TruckCraneID        INTEGER PRIMARY KEY,
                TruckCraneName      TEXT NOT NULL,
                CraneManufacturers  TEXT NOT NULL,
                MaxLiftingWeight    REAL NOT NULL,
                HingeHeight         REAL NOT NULL DEFAULT 2.2,
                HingeOffset         REAL NOT NULL DEFAULT 1.6
            );
            CREATE TABLE TruckCraneCapacity (
                TruckCraneID              INTEGER NOT NULL,
                ConditionID               INTEGER NOT NULL,
                SpeWorkCondition          TEXT NOT NULL,
                IsJibHosCon               INTEGER NOT NULL DEFAULT 0,
                TruckCraneRange           REAL NOT NULL,
                TruckCraneMainArmLen      REAL NOT NULL,
                SecondMainArmLen          REAL,
                SecondElevation           REAL,
                TruckCraneRatedLiftingCap REAL
            );

            INSERT INTO TruckCrane VALUES (1, 'QY25K', 'XCMG', 25.0, 2.2, 1.6);
            INSERT INTO TruckCrane VALUES (2, 'QY50K', 'XCMG', 50.0, 2.6, 1.9);

            INSERT INTO TruckCraneCapacity VALUES
                (1, 11, 'Outriggers fully extended, main boom', 0, 3.0, 10.4, NULL, NULL, 25.0),
                (1, 11, 'Outriggers fully extended, main boom', 0, 4.0, 10.4, NULL, NULL, 20.0),
                (1, 11, 'Outriggers fully extended, main boom', 0, 4.0, 15.08, NULL, NULL, 10.8),
                (1, 11, 'Outriggers fully extended, main boom', 0, 5.0, 15.08, NULL, NULL, 9.0),
                (1, 11, 'Outriggers fully extended, main boom', 0, 6.0, 15.08, NULL, NULL, NULL),
                (1, 12, 'Main boom + 8 m jib', 1, 10.0, 31.0, 8.0, 30.0, 2.0);
            "#,
        )
        .unwrap();
        SqliteCraneStore::from_connection(conn)
    }

    #[test]
    fn test_list_manufacturers_and_models() {
        let store = test_store();
        assert_eq!(store.list_manufacturers().unwrap(), vec!["XCMG"]);

        let models = store.list_models("XCMG").unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "QY25K");
        assert!((models[0].hinge_height_m - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_list_conditions() {
        let store = test_store();
        let conditions = store.list_conditions(1).unwrap();
        assert_eq!(conditions.len(), 2);
        assert!(!conditions[0].is_jib);
        assert!(conditions[1].is_jib);
    }

    #[test]
    fn test_capacity_table_and_lookup() {
        let store = test_store();
        let rows = store.capacity_table(1, 11).unwrap();
        assert_eq!(rows.len(), 5);

        // Exact cell
        assert_eq!(store.lookup_capacity(1, 11, 4.0, 15.08, None).unwrap(), Some(10.8));
        // NULL cell means cannot lift there; conservative search skips it
        assert_eq!(store.lookup_capacity(1, 11, 6.0, 15.08, None).unwrap(), None);
        // Jib condition
        assert_eq!(
            store.lookup_capacity(1, 12, 10.0, 31.0, Some(8.0)).unwrap(),
            Some(2.0)
        );
    }

    #[test]
    fn test_unknown_crane_is_empty() {
        let store = test_store();
        assert!(store.list_conditions(99).unwrap().is_empty());
        assert!(store.capacity_table(99, 1).unwrap().is_empty());
    }
}
