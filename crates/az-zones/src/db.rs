//! SQLite-backed relational zone store (feature `db`).
//!
//! Holds the same fields as the per-timestep zone files plus the precomputed
//! covered-edge list, keyed by `(id, timestep)`.  A simulation rerun over
//! static zone geometry reads definitions from here and skips the engine
//! coverage query entirely.

use std::path::Path;

use rusqlite::Connection;

use az_core::{EdgeId, Timestep};

use crate::loader::{
    format_color, format_edges, format_shape, parse_color, parse_edges, parse_shape, ZoneSource,
};
use crate::{ZoneDef, ZoneError, ZoneKind, ZoneResult};

/// Relational zone store over a single `zones` table.
pub struct ZoneDb {
    conn: Connection,
}

impl ZoneDb {
    /// Open (or create) the store at `path` and initialise the schema.
    pub fn open(path: &Path) -> ZoneResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS zones (
                 id       TEXT    NOT NULL,
                 timestep TEXT    NOT NULL,
                 level    INTEGER NOT NULL,
                 kind     TEXT    NOT NULL,
                 color    TEXT    NOT NULL,
                 shape    TEXT    NOT NULL,
                 edges    TEXT    NOT NULL,
                 PRIMARY KEY (id, timestep)
             );",
        )?;
        Ok(Self { conn })
    }

    /// Insert (or replace) one zone definition with its covered edges.
    pub fn insert(
        &mut self,
        timestep: &Timestep,
        def: &ZoneDef,
        edges: &[EdgeId],
    ) -> ZoneResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO zones (id, timestep, level, kind, color, shape, edges) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                def.raw_id,
                timestep.as_str(),
                def.level,
                def.kind.as_str(),
                format_color(def.color),
                format_shape(&def.ring),
                format_edges(edges),
            ],
        )?;
        Ok(())
    }

    /// Number of stored definitions across all timesteps.
    pub fn len(&self) -> ZoneResult<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM zones", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn is_empty(&self) -> ZoneResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl ZoneSource for ZoneDb {
    fn load(&mut self, timestep: &Timestep) -> ZoneResult<Vec<ZoneDef>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, level, kind, color, shape, edges FROM zones \
             WHERE timestep = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([timestep.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut defs = Vec::new();
        for row in rows {
            let (id, level, kind, color, shape, edges) = row?;
            let kind = ZoneKind::parse(&kind).ok_or_else(|| {
                ZoneError::Parse(format!("zone {id}: unknown kind {kind:?} in store"))
            })?;
            defs.push(ZoneDef {
                ring: parse_shape(&id, &shape)?,
                color: parse_color(&id, &color)?,
                raw_id: id,
                level: level as u8,
                kind,
                edges: Some(parse_edges(&edges)),
            });
        }
        Ok(defs)
    }
}
