//! The `DecisionStore` — explicit per-vehicle decision state.
//!
//! Decision flags live in an owned map keyed by vehicle id rather than as
//! string attributes scattered over the engine's per-vehicle key/value
//! channel, which makes ownership explicit and lets destruction purge
//! everything in one call.  Records are created when a vehicle is admitted
//! and destroyed when it arrives or is removed, so the store never grows
//! beyond the live vehicle set.

use rustc_hash::{FxHashMap, FxHashSet};

use az_core::{SimTime, Timestep, VehicleId, ZoneId};

/// Cached decision state for one vehicle.
#[derive(Clone, Debug, Default)]
pub struct DecisionRecord {
    /// The sticky should-reroute-at-all decision; `None` until first
    /// evaluated, then fixed for the vehicle's lifetime.
    pub reroute: Option<bool>,

    /// Zones this vehicle has decided to avoid.  Entries referencing
    /// removed zones simply never match a live zone again.
    pub avoid: FxHashSet<ZoneId>,

    /// The zone timestep in effect when the vehicle was inserted.
    pub inserted_at: Timestep,

    /// Next scheduled forced re-optimization, when periodic recheck is on.
    pub next_recheck: Option<SimTime>,
}

/// All per-vehicle decision records, keyed by vehicle id.
#[derive(Default)]
pub struct DecisionStore {
    records: FxHashMap<VehicleId, DecisionRecord>,
}

impl DecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the record for a newly admitted vehicle.  A second insert for
    /// the same vehicle leaves the existing record untouched.
    pub fn insert(&mut self, vehicle: VehicleId, inserted_at: Timestep) {
        self.records.entry(vehicle).or_insert(DecisionRecord {
            inserted_at,
            ..DecisionRecord::default()
        });
    }

    pub fn get(&self, vehicle: &VehicleId) -> Option<&DecisionRecord> {
        self.records.get(vehicle)
    }

    /// Mutable record access, creating a default record for vehicles the
    /// admission path never saw.
    pub fn record_mut(&mut self, vehicle: &VehicleId) -> &mut DecisionRecord {
        self.records.entry(vehicle.clone()).or_default()
    }

    /// `true` once the vehicle's should-reroute decision has been made,
    /// regardless of its value.
    pub fn has_decided(&self, vehicle: &VehicleId) -> bool {
        self.records
            .get(vehicle)
            .is_some_and(|r| r.reroute.is_some())
    }

    /// Drop the records of destroyed vehicles.  Returns how many existed.
    pub fn purge(&mut self, vehicles: &[VehicleId]) -> usize {
        vehicles
            .iter()
            .filter(|v| self.records.remove(v).is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
