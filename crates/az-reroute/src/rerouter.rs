//! The `Rerouter` — static and dynamic zone-avoidance passes.

use log::{debug, info, warn};

use az_core::{DecisionPolicy, EdgeId, RerouteMode, SimConfig, SimTime, Timestep, VehicleId};
use az_engine::{Color, TrafficControl};
use az_zones::{Zone, ZoneRegistry, ZoneSource};

use crate::policy::decide;
use crate::{DecisionStore, RecheckQueue, RerouteResult};

/// Travel-time override applied to every edge of an avoided zone.  High
/// enough that any detour wins, low enough to stay additive without
/// overflow across a route.
pub const AVOID_TRAVEL_TIME: f64 = 99_999_999.0;

/// Per-step rerouting engine.  Holds no zone state of its own — zones are
/// read from the registry each pass — only the pending-update flag and the
/// periodic recheck schedule.
pub struct Rerouter {
    mode: RerouteMode,
    snapshot_zones: bool,
    reroute_on_update: bool,
    decision_policy: DecisionPolicy,
    dynamic_distance: f64,
    periodic_recheck: bool,
    recheck_period_secs: u32,
    seed: u64,

    /// Set by a zone update; makes the next pass evaluate all vehicles.
    update_pending: bool,
    rechecks: RecheckQueue,
}

impl Rerouter {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            mode: config.reroute_mode,
            snapshot_zones: config.snapshot_zones,
            reroute_on_update: config.reroute_on_zone_update,
            decision_policy: config.reroute_decision,
            dynamic_distance: config.dynamic_reroute_distance,
            periodic_recheck: config.periodic_recheck,
            recheck_period_secs: config.recheck_period_secs,
            seed: config.seed,
            update_pending: false,
            rechecks: RecheckQueue::new(),
        }
    }

    /// Called by the orchestrator once a zone update has committed.
    ///
    /// With frozen (snapshot) zones a vehicle never reacts to newer
    /// batches, so the forced re-evaluation only arms outside snapshot
    /// mode.
    pub fn on_zones_updated(&mut self) {
        if self.reroute_on_update && !self.snapshot_zones {
            self.update_pending = true;
        }
    }

    /// Drop all scheduling state for destroyed vehicles.
    pub fn purge(&mut self, vehicles: &[VehicleId]) {
        for vid in vehicles {
            self.rechecks.remove_vehicle(vid);
        }
    }

    pub fn pending_rechecks(&self) -> usize {
        self.rechecks.len()
    }

    /// Run one step of the configured policy over `new_vehicles` (or the
    /// whole fleet when a zone update forced re-evaluation).  Returns the
    /// number of reroute actions taken.
    pub fn step<E: TrafficControl, S: ZoneSource>(
        &mut self,
        engine: &mut E,
        registry: &ZoneRegistry<S>,
        store: &mut DecisionStore,
        new_vehicles: &[VehicleId],
        now: SimTime,
    ) -> RerouteResult<usize> {
        let forced = std::mem::take(&mut self.update_pending);
        let mut rerouted = match self.mode {
            RerouteMode::None => 0,
            RerouteMode::Static => {
                self.static_pass(engine, registry, store, new_vehicles, forced, now)?
            }
            RerouteMode::Dynamic => {
                self.dynamic_pass(engine, registry, store, new_vehicles, forced, now)?
            }
        };
        if self.periodic_recheck {
            rerouted += self.run_rechecks(engine, store, now)?;
        }
        Ok(rerouted)
    }

    // ── Decisions ─────────────────────────────────────────────────────────

    /// The sticky should-reroute decision: sampled at most once per
    /// vehicle, cached, and returned verbatim ever after.
    fn should_reroute(&self, store: &mut DecisionStore, vehicle: &VehicleId) -> bool {
        let record = store.record_mut(vehicle);
        if let Some(decision) = record.reroute {
            return decision;
        }
        let decision = decide(self.decision_policy, self.seed, vehicle.as_str());
        debug!("vehicle {vehicle} should-reroute decision: {decision}");
        record.reroute = Some(decision);
        decision
    }

    /// The per-zone avoidance decision, cached per (vehicle, zone).
    ///
    /// Holes are never avoided.  Zones outside the vehicle's timestep scope
    /// (its insertion timestep when zones are frozen, the registry's
    /// current timestep otherwise) are not applicable.
    fn should_avoid(
        &self,
        store: &mut DecisionStore,
        vehicle: &VehicleId,
        zone: &Zone,
        current: &Timestep,
    ) -> bool {
        if zone.kind.is_hole() {
            return false;
        }
        let snapshot = self.snapshot_zones;
        let record = store.record_mut(vehicle);
        if record.avoid.contains(&zone.id) {
            return true;
        }
        let scope = if snapshot {
            &record.inserted_at
        } else {
            current
        };
        if &zone.timestep != scope {
            return false;
        }
        record.avoid.insert(zone.id.clone());
        true
    }

    // ── Reroute action ────────────────────────────────────────────────────

    /// Bias every avoided zone's edges, reset hole edges, and invoke the
    /// engine's travel-time rerouting.
    ///
    /// Hole and zone edge sets overlap; holes are reset strictly after the
    /// zone overrides so they do not inherit the penalty.
    fn apply_reroute<E: TrafficControl, S: ZoneSource>(
        &mut self,
        engine: &mut E,
        registry: &ZoneRegistry<S>,
        store: &mut DecisionStore,
        vehicle: &VehicleId,
        group: &Timestep,
        now: SimTime,
    ) -> RerouteResult<()> {
        info!("rerouting vehicle {vehicle}");

        for zone in registry.zones_in_timestep(group, false) {
            if self.should_avoid(store, vehicle, zone, registry.current_timestep()) {
                for edge in sorted_edges(zone) {
                    engine.set_adapted_travel_time(vehicle, edge, AVOID_TRAVEL_TIME)?;
                }
            }
        }
        for hole in registry
            .zones_in_timestep(group, true)
            .into_iter()
            .filter(|z| z.kind.is_hole())
        {
            for edge in sorted_edges(hole) {
                engine.set_adapted_travel_time(vehicle, edge, 0.0)?;
            }
        }

        if let Err(e) = engine.reroute_by_travel_time(vehicle) {
            // Routing failure is non-fatal: the vehicle stays on its route.
            warn!("reroute failed for vehicle {vehicle}: {e}");
            return Ok(());
        }
        engine.set_vehicle_color(vehicle, Color::RED)?;

        if self.periodic_recheck {
            let at = now + self.recheck_period_secs as i64;
            store.record_mut(vehicle).next_recheck = Some(at);
            self.rechecks.push(at, vehicle.clone());
        }
        Ok(())
    }

    // ── Static policy ─────────────────────────────────────────────────────

    /// Evaluate each vehicle's full planned route against the current
    /// timestep's zones.
    fn static_pass<E: TrafficControl, S: ZoneSource>(
        &mut self,
        engine: &mut E,
        registry: &ZoneRegistry<S>,
        store: &mut DecisionStore,
        new_vehicles: &[VehicleId],
        forced: bool,
        now: SimTime,
    ) -> RerouteResult<usize> {
        let vehicles = if forced {
            engine.active_vehicles()
        } else {
            new_vehicles.to_vec()
        };
        let group = registry.current_timestep().clone();
        let mut rerouted = 0;

        for vid in vehicles {
            let route = engine.vehicle_route(&vid)?;
            let index = engine.vehicle_route_index(&vid)?.min(route.len());
            let upcoming = &route[index..];

            for zone in registry.zones_in_timestep(&group, false) {
                let intersecting = upcoming.iter().filter(|e| zone.covers(e)).count();
                if intersecting == 0 {
                    continue;
                }
                if !self.should_reroute(store, &vid) {
                    break;
                }
                self.log_encounter(&vid, zone, upcoming, forced, intersecting);
                self.apply_reroute(engine, registry, store, &vid, &group, now)?;
                rerouted += 1;
                break;
            }
        }
        Ok(rerouted)
    }

    // ── Dynamic policy ────────────────────────────────────────────────────

    /// Insertion check on the current edge, then a proximity sweep through
    /// the engine's radius-bounded context query.
    fn dynamic_pass<E: TrafficControl, S: ZoneSource>(
        &mut self,
        engine: &mut E,
        registry: &ZoneRegistry<S>,
        store: &mut DecisionStore,
        new_vehicles: &[VehicleId],
        forced: bool,
        now: SimTime,
    ) -> RerouteResult<usize> {
        let group = registry.current_timestep().clone();
        let mut rerouted = 0;

        let vehicles = if forced {
            engine.active_vehicles()
        } else {
            new_vehicles.to_vec()
        };
        for vid in vehicles {
            let route = engine.vehicle_route(&vid)?;
            let index = engine.vehicle_route_index(&vid)?;
            let Some(current_edge) = route.get(index) else {
                continue;
            };

            for zone in registry.zones_in_timestep(&group, false) {
                if !zone.covers(current_edge) {
                    continue;
                }
                if !self.should_reroute(store, &vid) {
                    break;
                }
                self.log_encounter(&vid, zone, &route[index..], forced, 1);
                self.apply_reroute(engine, registry, store, &vid, &group, now)?;
                rerouted += 1;
                break;
            }
        }

        // Proximity sweep over every registered zone.  Vehicles with a
        // sticky decision already made are skipped unless a zone update
        // forced this pass, which bounds dynamic mode at one avoidance
        // action per vehicle.
        for timestep in registry.timesteps() {
            for zone in registry.zones_in_timestep(&timestep, false) {
                let near = engine.vehicles_near_polygon(&zone.id, self.dynamic_distance)?;
                for vid in near {
                    if !forced && store.has_decided(&vid) {
                        continue;
                    }
                    let scope_matches = if self.snapshot_zones {
                        store
                            .get(&vid)
                            .is_some_and(|r| r.inserted_at == zone.timestep)
                    } else {
                        zone.timestep == group
                    };
                    if !scope_matches {
                        continue;
                    }

                    let route = engine.vehicle_route(&vid)?;
                    let index = engine.vehicle_route_index(&vid)?.min(route.len());
                    let upcoming = &route[index..];
                    let intersecting = upcoming.iter().filter(|e| zone.covers(e)).count();
                    if intersecting == 0 {
                        continue;
                    }
                    if !self.should_reroute(store, &vid) {
                        continue;
                    }
                    self.log_encounter(&vid, zone, upcoming, forced, intersecting);
                    let zone_group = zone.timestep.clone();
                    self.apply_reroute(engine, registry, store, &vid, &zone_group, now)?;
                    rerouted += 1;
                }
            }
        }
        Ok(rerouted)
    }

    // ── Periodic recheck ──────────────────────────────────────────────────

    /// Re-invoke the engine's rerouting primitive for vehicles whose
    /// recheck is due, keeping their routes optimal under the standing
    /// edge-cost overrides.
    fn run_rechecks<E: TrafficControl>(
        &mut self,
        engine: &mut E,
        store: &mut DecisionStore,
        now: SimTime,
    ) -> RerouteResult<usize> {
        let mut rechecked = 0;
        for vid in self.rechecks.drain_due(now) {
            match engine.reroute_by_travel_time(&vid) {
                Ok(()) => {
                    let at = now + self.recheck_period_secs as i64;
                    store.record_mut(&vid).next_recheck = Some(at);
                    self.rechecks.push(at, vid);
                    rechecked += 1;
                }
                Err(e) => {
                    // The vehicle has left the simulation.
                    debug!("dropping recheck for vehicle {vid}: {e}");
                }
            }
        }
        Ok(rechecked)
    }

    fn log_encounter(
        &self,
        vehicle: &VehicleId,
        zone: &Zone,
        upcoming: &[EdgeId],
        forced: bool,
        intersecting: usize,
    ) {
        if upcoming.first().is_some_and(|e| zone.covers(e)) {
            if forced {
                info!("vehicle {vehicle} was inside zone {} during zone update", zone.id);
            } else {
                info!("new vehicle {vehicle} was inserted inside zone {}", zone.id);
            }
        }
        info!(
            "vehicle {vehicle} route intersects zone {} ({intersecting} edges)",
            zone.id
        );
        if upcoming.last().is_some_and(|e| zone.covers(e)) {
            // Destination inside the zone: reroute anyway; the route
            // re-enters the zone at its cheapest boundary.
            debug!("destination of vehicle {vehicle} lies in zone {}", zone.id);
        }
    }
}

/// A zone's covered edges in deterministic order.
fn sorted_edges(zone: &Zone) -> Vec<&EdgeId> {
    let mut edges: Vec<&EdgeId> = zone.edges.iter().collect();
    edges.sort();
    edges
}
