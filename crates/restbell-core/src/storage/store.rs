//! SQLite-backed exercise store: the data-model collaborator.
//!
//! Holds exercise timing parameters, superset pairing, and the persisted
//! timer progress (`current_index`/`elapsed_ms`) written back whenever an
//! engine pauses or is torn down, so reopening an exercise resumes
//! mid-phase. A key-value table carries live engine snapshots between
//! process invocations.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{SpecError, StorageError};
use crate::interval::IntervalSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: i64,
    pub name: String,
    /// Ordering within the workout; also the superset lead tie-break.
    pub position: i64,
    pub sets: u32,
    pub time_based: bool,
    pub work_secs: u32,
    pub rest_secs: u32,
    pub time_before_next_secs: u32,
    /// Superset partner, if any. Pairing is symmetric.
    pub superset_with: Option<i64>,
    /// Persisted timer progress.
    pub current_index: u32,
    pub elapsed_ms: u64,
}

impl TryFrom<&ExerciseRecord> for IntervalSpec {
    type Error = SpecError;

    fn try_from(record: &ExerciseRecord) -> Result<Self, SpecError> {
        IntervalSpec::new(
            record.sets,
            record.time_based,
            record.work_secs,
            record.rest_secs,
            record.time_before_next_secs,
        )
    }
}

/// Parameters for a new exercise.
#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub sets: u32,
    pub time_based: bool,
    pub work_secs: u32,
    pub rest_secs: u32,
    pub time_before_next_secs: u32,
}

/// SQLite store for exercises and persisted engine state.
pub struct ExerciseStore {
    conn: Connection,
}

impl ExerciseStore {
    /// Open the store at `~/.config/restbell/restbell.db`.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()
            .map_err(|err| StorageError::QueryFailed(err.to_string()))?
            .join("restbell.db");
        let conn = Connection::open(&path)
            .map_err(|source| StorageError::OpenFailed { path, source })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS exercises (
                id                    INTEGER PRIMARY KEY AUTOINCREMENT,
                name                  TEXT NOT NULL,
                position              INTEGER NOT NULL,
                sets                  INTEGER NOT NULL,
                time_based            INTEGER NOT NULL DEFAULT 0,
                work_secs             INTEGER NOT NULL DEFAULT 0,
                rest_secs             INTEGER NOT NULL DEFAULT 0,
                time_before_next_secs INTEGER NOT NULL DEFAULT 0,
                superset_with         INTEGER,
                current_index         INTEGER NOT NULL DEFAULT 1,
                elapsed_ms            INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    // ── Exercises ────────────────────────────────────────────────────

    pub fn add(&self, new: &NewExercise) -> Result<ExerciseRecord, StorageError> {
        let position: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM exercises",
            [],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO exercises
                (name, position, sets, time_based, work_secs, rest_secs, time_before_next_secs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.name,
                position,
                new.sets,
                new.time_based,
                new.work_secs,
                new.rest_secs,
                new.time_before_next_secs,
            ],
        )?;
        self.get(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> Result<ExerciseRecord, StorageError> {
        self.conn
            .query_row(
                "SELECT id, name, position, sets, time_based, work_secs, rest_secs,
                        time_before_next_secs, superset_with, current_index, elapsed_ms
                 FROM exercises WHERE id = ?1",
                params![id],
                Self::row_to_record,
            )
            .optional()?
            .ok_or(StorageError::NotFound(id))
    }

    pub fn list(&self) -> Result<Vec<ExerciseRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, position, sets, time_based, work_secs, rest_secs,
                    time_before_next_secs, superset_with, current_index, elapsed_ms
             FROM exercises ORDER BY position",
        )?;
        let rows = stmt.query_map([], Self::row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn remove(&self, id: i64) -> Result<(), StorageError> {
        // Drop the partner's back-reference first.
        self.conn.execute(
            "UPDATE exercises SET superset_with = NULL WHERE superset_with = ?1",
            params![id],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM exercises WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    // ── Timer progress write-back ────────────────────────────────────

    pub fn save_progress(
        &self,
        id: i64,
        current_index: u32,
        elapsed_ms: u64,
    ) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "UPDATE exercises SET current_index = ?2, elapsed_ms = ?3 WHERE id = ?1",
            params![id, current_index, elapsed_ms as i64],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    pub fn reset_progress(&self, id: i64) -> Result<(), StorageError> {
        self.save_progress(id, 1, 0)
    }

    // ── Superset pairing ─────────────────────────────────────────────

    /// Link two exercises as superset partners (symmetric).
    pub fn pair(&self, a: i64, b: i64) -> Result<(), StorageError> {
        // Validate both exist before touching either row.
        self.get(a)?;
        self.get(b)?;
        self.conn.execute(
            "UPDATE exercises SET superset_with = ?2 WHERE id = ?1",
            params![a, b],
        )?;
        self.conn.execute(
            "UPDATE exercises SET superset_with = ?2 WHERE id = ?1",
            params![b, a],
        )?;
        Ok(())
    }

    /// Remove an exercise's superset link, both directions.
    pub fn unpair(&self, id: i64) -> Result<(), StorageError> {
        let record = self.get(id)?;
        if let Some(partner) = record.superset_with {
            self.conn.execute(
                "UPDATE exercises SET superset_with = NULL WHERE id IN (?1, ?2)",
                params![id, partner],
            )?;
        }
        Ok(())
    }

    /// Which exercise of a superset pair leads the set-count display:
    /// the one earlier in the workout. An unpaired exercise leads itself.
    pub fn superset_lead(&self, id: i64) -> Result<ExerciseRecord, StorageError> {
        let record = self.get(id)?;
        match record.superset_with {
            Some(partner_id) => {
                let partner = self.get(partner_id)?;
                if partner.position < record.position {
                    Ok(partner)
                } else {
                    Ok(record)
                }
            }
            None => Ok(record),
        }
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ExerciseRecord> {
        Ok(ExerciseRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            position: row.get(2)?,
            sets: row.get(3)?,
            time_based: row.get(4)?,
            work_secs: row.get(5)?,
            rest_secs: row.get(6)?,
            time_before_next_secs: row.get(7)?,
            superset_with: row.get(8)?,
            current_index: row.get(9)?,
            elapsed_ms: row.get::<_, i64>(10)? as u64,
        })
    }
}
