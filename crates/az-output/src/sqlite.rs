//! SQLite output backend (feature `db`).
//!
//! Creates a single `exposure.db` in the configured output directory with
//! two tables: `zone_exposure` and `step_summaries`.

use std::path::Path;

use rusqlite::Connection;

use az_exposure::StepRecord;

use crate::writer::ExposureWriter;
use crate::OutputResult;

/// Writes the exposure log to an SQLite database, one transaction per step.
pub struct SqliteExposureWriter {
    conn: Connection,
    finished: bool,
}

impl SqliteExposureWriter {
    /// Open (or create) `exposure.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("exposure.db"))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS zone_exposure (
                 time          INTEGER NOT NULL,
                 zone_timestep TEXT    NOT NULL,
                 vehicle       TEXT    NOT NULL,
                 inserted_at   TEXT    NOT NULL,
                 speed         REAL    NOT NULL,
                 edge          TEXT    NOT NULL,
                 zone          TEXT    NOT NULL,
                 zone_ts       TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS step_summaries (
                 time              INTEGER PRIMARY KEY,
                 zone_timestep     TEXT    NOT NULL,
                 vehicles_in_zones INTEGER NOT NULL
             );",
        )?;
        Ok(Self {
            conn,
            finished: false,
        })
    }
}

impl ExposureWriter for SqliteExposureWriter {
    fn write_step(&mut self, record: &StepRecord) -> OutputResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO zone_exposure \
                 (time, zone_timestep, vehicle, inserted_at, speed, edge, zone, zone_ts) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for entry in &record.vehicles {
                for zone in &entry.zones {
                    stmt.execute(rusqlite::params![
                        record.time.0,
                        record.zone_timestep.as_str(),
                        entry.vehicle.as_str(),
                        entry.inserted_at.as_str(),
                        entry.speed,
                        entry.edge.as_str(),
                        zone.zone.as_str(),
                        zone.timestep.as_str(),
                    ])?;
                }
            }
            tx.execute(
                "INSERT OR REPLACE INTO step_summaries (time, zone_timestep, vehicles_in_zones) \
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    record.time.0,
                    record.zone_timestep.as_str(),
                    record.vehicles.len() as i64,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
