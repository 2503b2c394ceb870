//! The `TrafficControl` trait — every engine operation the zone subsystems
//! consume, and nothing more.

use az_core::{EdgeId, SimTime, VehicleId, ZoneId};
use az_geom::{Pt, Ring};

use crate::EngineResult;

// ── Style attributes ──────────────────────────────────────────────────────────

/// An RGB display color.  Cosmetic only; the engine renders it, nothing in
/// the decision logic reads it back.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Rendering attributes passed when registering a polygon.
#[derive(Copy, Clone, Debug)]
pub struct PolygonStyle {
    pub color: Color,
    /// Stacking layer; higher layers draw on top.
    pub layer: i32,
    pub fill: bool,
}

// ── TrafficControl ────────────────────────────────────────────────────────────

/// Pluggable control channel to the external traffic engine.
///
/// Implementations adapt a concrete engine's remote-control protocol; the
/// provided [`MemoryEngine`][crate::MemoryEngine] backs tests and demos.
/// All identifiers are engine-assigned strings wrapped in the `az-core` id
/// types.
pub trait TrafficControl {
    // ── Polygons ──────────────────────────────────────────────────────────

    /// Register a filled polygon with the engine.
    fn add_polygon(&mut self, id: &ZoneId, shape: &Ring, style: PolygonStyle)
        -> EngineResult<()>;

    /// Deregister a polygon, freeing engine-side geometry.
    fn remove_polygon(&mut self, id: &ZoneId) -> EngineResult<()>;

    /// Toggle a polygon's fill rendering without removing it.
    fn set_polygon_visible(&mut self, id: &ZoneId, visible: bool) -> EngineResult<()>;

    /// Attach an arbitrary string attribute to a polygon.
    fn set_polygon_attribute(&mut self, id: &ZoneId, key: &str, value: &str)
        -> EngineResult<()>;

    /// All edges covered by the polygon (radius-0 containment query).
    ///
    /// Junction-internal edges are included; filtering them is the caller's
    /// responsibility.
    fn edges_covering(&self, id: &ZoneId) -> EngineResult<Vec<EdgeId>>;

    /// Vehicles currently within `radius` metres of the polygon.
    fn vehicles_near_polygon(&self, id: &ZoneId, radius: f64) -> EngineResult<Vec<VehicleId>>;

    // ── Vehicles ──────────────────────────────────────────────────────────

    fn vehicle_position(&self, id: &VehicleId) -> EngineResult<Pt>;

    /// Current speed in m/s.
    fn vehicle_speed(&self, id: &VehicleId) -> EngineResult<f64>;

    /// The vehicle's full planned route as an edge list.
    fn vehicle_route(&self, id: &VehicleId) -> EngineResult<Vec<EdgeId>>;

    /// Index of the edge the vehicle currently occupies within its route.
    fn vehicle_route_index(&self, id: &VehicleId) -> EngineResult<usize>;

    /// The edge the vehicle currently occupies.
    fn vehicle_current_edge(&self, id: &VehicleId) -> EngineResult<EdgeId> {
        let route = self.vehicle_route(id)?;
        let index = self.vehicle_route_index(id)?;
        route
            .into_iter()
            .nth(index)
            .ok_or_else(|| crate::EngineError::UnknownVehicle(id.clone()))
    }

    /// Override the travel-time estimate of `edge` for this vehicle only.
    fn set_adapted_travel_time(
        &mut self,
        vehicle: &VehicleId,
        edge: &EdgeId,
        travel_time: f64,
    ) -> EngineResult<()>;

    /// Recompute the vehicle's route from its current position using the
    /// adapted travel-time estimates.
    fn reroute_by_travel_time(&mut self, vehicle: &VehicleId) -> EngineResult<()>;

    fn set_vehicle_color(&mut self, id: &VehicleId, color: Color) -> EngineResult<()>;

    /// Remove a vehicle from the simulation entirely (non-admission).
    fn remove_vehicle(&mut self, id: &VehicleId) -> EngineResult<()>;

    // ── Step-level queries ────────────────────────────────────────────────

    /// Vehicles loaded (about to be inserted) during the last step.
    fn loaded_vehicles(&self) -> Vec<VehicleId>;

    /// Vehicles inserted during the last step, minus any removed since.
    fn departed_vehicles(&self) -> Vec<VehicleId>;

    /// Vehicles that reached their destination during the last step.
    fn arrived_vehicles(&self) -> Vec<VehicleId>;

    /// All vehicles currently driving.
    fn active_vehicles(&self) -> Vec<VehicleId>;

    /// Vehicles still scheduled or driving; the step loop ends at zero.
    fn expected_vehicle_count(&self) -> usize;

    /// Advance the engine by one step.
    fn advance(&mut self, now: SimTime) -> EngineResult<()>;

    /// Shut the connection down.  Idempotent.
    fn close(&mut self);
}
