//! Zone data model.

use rustc_hash::FxHashSet;

use az_core::{EdgeId, SimTime, Timestep, ZoneId};
use az_engine::Color;
use az_geom::Ring;

// ── ZoneKind ──────────────────────────────────────────────────────────────────

/// What a registered polygon represents in the zone layering.
///
/// The engine cannot natively represent polygons with holes, so an enclosed
/// region of lower severity is registered as its own polygon layered on top
/// of the zone it is carved from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ZoneKind {
    /// A restricted region at some severity level.
    Zone,
    /// A carved-out region that is entirely unrestricted (level 0).
    HoleEmpty,
    /// A carved-out region occupied by a further-nested zone.
    HoleFilled,
}

impl ZoneKind {
    #[inline]
    pub fn is_hole(self) -> bool {
        !matches!(self, ZoneKind::Zone)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "zone" => Some(ZoneKind::Zone),
            "hole-empty" => Some(ZoneKind::HoleEmpty),
            "hole-filled" => Some(ZoneKind::HoleFilled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneKind::Zone => "zone",
            ZoneKind::HoleEmpty => "hole-empty",
            ZoneKind::HoleFilled => "hole-filled",
        }
    }
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ZoneState ─────────────────────────────────────────────────────────────────

/// Lifecycle state.  Removal is terminal and modelled by eviction from the
/// registry, so no `Removed` variant exists on live values.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ZoneState {
    /// Created but not yet admitted (registration or edge mapping pending).
    Pending,
    /// Registered with the engine, participating in routing and exposure.
    Active,
    /// Visually retired; edge coverage stays valid for vehicles still
    /// referencing this timestep.
    Hidden,
}

// ── ZoneDef ───────────────────────────────────────────────────────────────────

/// A parsed zone definition, before registration with the engine.
#[derive(Clone, Debug)]
pub struct ZoneDef {
    /// Identifier from the input file, not yet scoped to a timestep.
    pub raw_id: String,
    /// Severity level; 0 is unrestricted.
    pub level: u8,
    pub kind: ZoneKind,
    pub color: Color,
    pub ring: Ring,
    /// Covered edges precomputed by a relational store.  `None` means the
    /// engine coverage query runs at registration.
    pub edges: Option<Vec<EdgeId>>,
}

// ── Zone ──────────────────────────────────────────────────────────────────────

/// A registered zone (or one part of a decomposed zone).
///
/// Parts share their parent's timestep, level, and kind, and own disjoint
/// subsets of the parent's covered edges.
#[derive(Clone, Debug)]
pub struct Zone {
    pub id: ZoneId,
    pub timestep: Timestep,
    pub level: u8,
    pub kind: ZoneKind,
    pub ring: Ring,
    pub edges: FxHashSet<EdgeId>,
    pub state: ZoneState,
    pub created_at: SimTime,
    pub color: Color,
}

impl Zone {
    /// `true` once the zone has outlived the retention window.
    #[inline]
    pub fn outlived(&self, keep_duration_secs: u32, now: SimTime) -> bool {
        self.created_at.0 + (keep_duration_secs as i64) < now.0
    }

    /// `true` if the zone covers `edge`.
    #[inline]
    pub fn covers(&self, edge: &EdgeId) -> bool {
        self.edges.contains(edge)
    }
}
