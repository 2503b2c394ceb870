//! Structured exposure records, one per simulated step.

use az_core::{EdgeId, SimTime, Timestep, VehicleId, ZoneId};

/// One zone occupied by a vehicle, with the timestep its geometry belongs
/// to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneRef {
    pub zone: ZoneId,
    pub timestep: Timestep,
}

/// One vehicle's telemetry for a step, listed only when the vehicle was
/// inside at least one zone.
#[derive(Clone, Debug)]
pub struct VehicleEntry {
    pub vehicle: VehicleId,
    /// The zone timestep in effect when the vehicle entered the simulation.
    pub inserted_at: Timestep,
    /// Speed in m/s at this step.
    pub speed: f64,
    /// The edge the vehicle currently occupies.
    pub edge: EdgeId,
    /// Every zone the vehicle's position resolved into, across all
    /// registered timestep groups.
    pub zones: Vec<ZoneRef>,
}

/// The exported artifact: one record per simulated step.
#[derive(Clone, Debug)]
pub struct StepRecord {
    pub time: SimTime,
    /// The registry's authoritative timestep at this step.
    pub zone_timestep: Timestep,
    pub vehicles: Vec<VehicleEntry>,
}

impl StepRecord {
    /// `true` when no vehicle was inside any zone this step.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}
