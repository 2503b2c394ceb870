//! Zone file loading.
//!
//! # CSV format
//!
//! One file per timestep, named `zones_<HH-MM-SS>.csv`, one row per zone:
//!
//! ```csv
//! id,level,kind,color,shape
//! zone-1-0,1,zone,"171,213,157","10.0,0.0 90.0,0.0 90.0,80.0 10.0,80.0"
//! hole-1-0,1,hole-empty,"255,255,255","30.0,20.0 70.0,20.0 70.0,60.0 30.0,60.0"
//! ```
//!
//! `shape` is a space-separated list of `x,y` vertex pairs in engine-local
//! metres; `color` is `r,g,b`.  A file with only the header row is a valid
//! timestep with zero zones; a *missing* file is
//! [`ZoneError::DataNotFound`] and fatal.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use serde::Deserialize;

use az_core::{EdgeId, Timestep};
use az_engine::Color;
use az_geom::{Pt, Ring};

use crate::{ZoneDef, ZoneError, ZoneKind, ZoneResult};

// ── ZoneSource ────────────────────────────────────────────────────────────────

/// Provider of zone definitions per timestep.
///
/// The registry is generic over its source so a run can read per-timestep
/// CSV files ([`ZoneDir`]) or a precomputed relational store
/// ([`ZoneDb`][crate::ZoneDb], feature `db`) without code changes.
pub trait ZoneSource {
    fn load(&mut self, timestep: &Timestep) -> ZoneResult<Vec<ZoneDef>>;
}

/// The canonical file name for a timestep's zone batch.
pub fn zone_file_name(timestep: &Timestep) -> String {
    format!("zones_{timestep}.csv")
}

// ── CSV parsing ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ZoneRecord {
    id: String,
    level: u8,
    kind: String,
    color: String,
    shape: String,
}

/// Parse zone definitions from any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or loading from archives.
pub fn load_zone_reader<R: Read>(reader: R) -> ZoneResult<Vec<ZoneDef>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut defs = Vec::new();
    for result in csv_reader.deserialize::<ZoneRecord>() {
        let row = result.map_err(|e| ZoneError::Parse(e.to_string()))?;
        let kind = ZoneKind::parse(&row.kind).ok_or_else(|| {
            ZoneError::Parse(format!(
                "zone {}: unknown kind {:?} (expected zone, hole-empty, or hole-filled)",
                row.id, row.kind
            ))
        })?;
        defs.push(ZoneDef {
            ring: parse_shape(&row.id, &row.shape)?,
            color: parse_color(&row.id, &row.color)?,
            raw_id: row.id,
            level: row.level,
            kind,
            edges: None,
        });
    }
    Ok(defs)
}

/// Parse a space-separated `x,y x,y …` vertex list.
pub fn parse_shape(id: &str, shape: &str) -> ZoneResult<Ring> {
    let mut pts = Vec::new();
    for pair in shape.split_whitespace() {
        let (x, y) = pair.split_once(',').ok_or_else(|| bad_shape(id, pair))?;
        let x: f64 = x.parse().map_err(|_| bad_shape(id, pair))?;
        let y: f64 = y.parse().map_err(|_| bad_shape(id, pair))?;
        pts.push(Pt::new(x, y));
    }
    Ok(Ring::from_points(pts))
}

/// Serialize a ring back to the `x,y x,y …` form used by files and the
/// relational store.
pub fn format_shape(ring: &Ring) -> String {
    ring.points()
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn bad_shape(id: &str, pair: &str) -> ZoneError {
    ZoneError::Parse(format!("zone {id}: invalid shape vertex {pair:?}"))
}

/// Parse an `r,g,b` color triple.
pub fn parse_color(id: &str, color: &str) -> ZoneResult<Color> {
    let parts: Vec<&str> = color.split(',').collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(bad_color(id, color));
    };
    let parse = |v: &str| v.trim().parse::<u8>().map_err(|_| bad_color(id, color));
    Ok(Color::new(parse(r)?, parse(g)?, parse(b)?))
}

/// Serialize a color back to the `r,g,b` form.
pub fn format_color(color: Color) -> String {
    format!("{},{},{}", color.r, color.g, color.b)
}

fn bad_color(id: &str, color: &str) -> ZoneError {
    ZoneError::Parse(format!("zone {id}: invalid color {color:?} (expected r,g,b)"))
}

/// Serialize a covered-edge list for the relational store.
pub fn format_edges(edges: &[EdgeId]) -> String {
    edges
        .iter()
        .map(EdgeId::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a space-separated edge-id list from the relational store.
pub fn parse_edges(edges: &str) -> Vec<EdgeId> {
    edges.split_whitespace().map(EdgeId::new).collect()
}

// ── ZoneDir ───────────────────────────────────────────────────────────────────

/// Reads one `zones_<HH-MM-SS>.csv` per timestep from a directory.
pub struct ZoneDir {
    dir: PathBuf,
}

impl ZoneDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ZoneSource for ZoneDir {
    fn load(&mut self, timestep: &Timestep) -> ZoneResult<Vec<ZoneDef>> {
        let path = self.dir.join(zone_file_name(timestep));
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ZoneError::DataNotFound {
                    timestep: timestep.clone(),
                    path,
                });
            }
            Err(e) => return Err(e.into()),
        };
        load_zone_reader(BufReader::new(file))
    }
}
