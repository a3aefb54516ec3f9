//! SQLite-backed local workout cache.
//!
//! One file holds everything: the append-only `workouts` table (keyed by the
//! remote identity) and the single-row `sync_meta` table. The remote source
//! is authoritative and never revises history, so `upsert` is INSERT OR
//! IGNORE - re-applying a batch is a no-op, which is what makes interrupted
//! syncs safe to resume.
//!
//! The connection sits behind a mutex. Every method is synchronous and
//! releases the lock before returning, so callers never hold it across an
//! await point.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use log::{debug, info};
use rusqlite::{params, Connection};

use crate::error::{Result, SyncError};
use crate::types::SyncState;
use ergstats::WorkoutRecord;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local store for workout records and sync metadata.
pub struct WorkoutStore {
    conn: Mutex<Connection>,
}

impl WorkoutStore {
    /// Open (or create) the cache file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init_schema(&conn)?;
        info!("[Store] Opened cache at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            -- Workout cache, append-only, keyed by the remote identity
            CREATE TABLE IF NOT EXISTS workouts (
                id              INTEGER PRIMARY KEY,
                date            TEXT NOT NULL,
                distance_m      REAL NOT NULL,
                duration_s      REAL NOT NULL,
                pace_500m       REAL,
                stroke_rate     REAL,
                calories        INTEGER,
                workout_type    TEXT NOT NULL
            );

            -- Singleton sync metadata row
            CREATE TABLE IF NOT EXISTS sync_meta (
                id              INTEGER PRIMARY KEY CHECK (id = 1),
                last_sync_utc   TEXT NOT NULL,
                total_rows      INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date);
        "#,
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SyncError::StoreUnavailable("connection lock poisoned".to_string()))
    }

    /// Insert records that are not yet cached; existing identities are left
    /// untouched. Returns the number of newly inserted rows. Applying the
    /// same batch twice leaves the store unchanged after the first call.
    pub fn upsert(&self, records: &[WorkoutRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO workouts
                     (id, date, distance_m, duration_s, pace_500m, stroke_rate, calories, workout_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in records {
                inserted += stmt.execute(params![
                    r.id,
                    r.date.format(DATE_FORMAT).to_string(),
                    r.distance_m,
                    r.duration_s,
                    r.pace_500m,
                    r.stroke_rate,
                    r.calories,
                    r.workout_type,
                ])?;
            }
        }
        tx.commit()?;

        debug!(
            "[Store] Upserted {} records ({} new)",
            records.len(),
            inserted
        );
        Ok(inserted)
    }

    /// Load records ordered by date ascending, optionally limited to an
    /// inclusive calendar-date range.
    pub fn query(&self, range: Option<(NaiveDate, NaiveDate)>) -> Result<Vec<WorkoutRecord>> {
        let conn = self.lock()?;
        let mut sql = String::from(
            "SELECT id, date, distance_m, duration_s, pace_500m, stroke_rate, calories, workout_type
             FROM workouts",
        );
        let mut bounds: Vec<String> = Vec::new();
        if let Some((from, to)) = range {
            sql.push_str(" WHERE date >= ?1 AND date <= ?2");
            bounds.push(from.format("%Y-%m-%d").to_string());
            bounds.push(format!("{} 23:59:59", to.format("%Y-%m-%d")));
        }
        sql.push_str(" ORDER BY date ASC, id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(&bounds), |row| {
            let raw_date: String = row.get(1)?;
            let date = NaiveDateTime::parse_from_str(&raw_date, DATE_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(WorkoutRecord {
                id: row.get(0)?,
                date,
                distance_m: row.get(2)?,
                duration_s: row.get(3)?,
                pace_500m: row.get(4)?,
                stroke_rate: row.get(5)?,
                calories: row.get(6)?,
                workout_type: row.get(7)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Total cached records.
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM workouts", [], |r| r.get(0))?;
        Ok(count as u64)
    }

    /// Current sync metadata; the never-synced state when no sync has run.
    pub fn sync_state(&self) -> Result<SyncState> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT last_sync_utc, total_rows FROM sync_meta WHERE id = 1",
                [],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match row {
            None => Ok(SyncState::never_synced()),
            Some((raw, total)) => {
                let last_sync = DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| SyncError::StoreUnavailable(format!("corrupt sync_meta: {}", e)))?
                    .with_timezone(&Utc);
                Ok(SyncState {
                    last_sync: Some(last_sync),
                    total_records: total as u64,
                })
            }
        }
    }

    /// Stamp the sync metadata row in one statement, so concurrent readers
    /// see either the previous state or the new one, never a mix. The stored
    /// timestamp never moves backwards.
    pub fn update_sync_state(&self, now: DateTime<Utc>, total_records: u64) -> Result<()> {
        let conn = self.lock()?;
        let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        conn.execute(
            "INSERT INTO sync_meta (id, last_sync_utc, total_rows)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                 last_sync_utc = MAX(last_sync_utc, excluded.last_sync_utc),
                 total_rows = excluded.total_rows",
            params![stamp, total_records as i64],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn workout(id: i64, day: u32, distance_m: f64) -> WorkoutRecord {
        let date = NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        WorkoutRecord::new(id, date, distance_m, distance_m / 4.0, "rower")
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = WorkoutStore::in_memory().unwrap();
        let batch = vec![workout(1, 1, 2000.0), workout(2, 2, 5000.0)];

        assert_eq!(store.upsert(&batch).unwrap(), 2);
        assert_eq!(store.count().unwrap(), 2);

        // Second application changes nothing
        assert_eq!(store.upsert(&batch).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.query(None).unwrap().len(), 2);
    }

    #[test]
    fn test_existing_identity_never_overwritten() {
        let store = WorkoutStore::in_memory().unwrap();
        store.upsert(&[workout(1, 1, 2000.0)]).unwrap();

        // A conflicting payload for the same identity is ignored
        let mut revised = workout(1, 1, 9999.0);
        revised.workout_type = "skierg".to_string();
        store.upsert(&[revised]).unwrap();

        let records = store.query(None).unwrap();
        assert_eq!(records[0].distance_m, 2000.0);
        assert_eq!(records[0].workout_type, "rower");
    }

    #[test]
    fn test_query_orders_by_date() {
        let store = WorkoutStore::in_memory().unwrap();
        store
            .upsert(&[workout(3, 20, 3000.0), workout(1, 5, 1000.0), workout(2, 12, 2000.0)])
            .unwrap();
        let records = store.query(None).unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_query_date_range_inclusive() {
        let store = WorkoutStore::in_memory().unwrap();
        store
            .upsert(&[workout(1, 5, 1000.0), workout(2, 12, 2000.0), workout(3, 20, 3000.0)])
            .unwrap();
        let from = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        let records = store.query(Some((from, to))).unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_sync_state_roundtrip() {
        let store = WorkoutStore::in_memory().unwrap();
        assert_eq!(store.sync_state().unwrap(), SyncState::never_synced());

        let stamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        store.update_sync_state(stamp, 42).unwrap();

        let state = store.sync_state().unwrap();
        assert_eq!(state.last_sync, Some(stamp));
        assert_eq!(state.total_records, 42);
    }

    #[test]
    fn test_last_sync_never_moves_backwards() {
        let store = WorkoutStore::in_memory().unwrap();
        let later = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        store.update_sync_state(later, 10).unwrap();
        store.update_sync_state(earlier, 12).unwrap();

        let state = store.sync_state().unwrap();
        assert_eq!(state.last_sync, Some(later));
        // Count still reflects the latest write
        assert_eq!(state.total_records, 12);
    }

    #[test]
    fn test_record_fields_survive_roundtrip() {
        let store = WorkoutStore::in_memory().unwrap();
        let mut r = workout(9, 3, 6000.0);
        r.stroke_rate = Some(24.0);
        r.calories = Some(310);
        store.upsert(std::slice::from_ref(&r)).unwrap();

        let loaded = store.query(None).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], r);
    }
}
