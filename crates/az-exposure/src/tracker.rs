//! The `ExposureTracker`.

use log::debug;
use rustc_hash::FxHashMap;

use az_core::{ExposureMetric, SimConfig, SimTime, Timestep, VehicleId, ZoneId};
use az_engine::TrafficControl;
use az_geom::Pt;
use az_reroute::DecisionStore;
use az_zones::{ZoneRegistry, ZoneSource};

use crate::{ExposureResult, StepRecord, VehicleEntry, ZoneRef};

/// Bucket key: one accumulator per (zone timestep, vehicle, zone).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ExposureKey {
    pub timestep: Timestep,
    pub vehicle: VehicleId,
    pub zone: ZoneId,
}

/// Accumulates per-vehicle, per-zone exposure and emits one structured
/// record per step.
pub struct ExposureTracker {
    metric: ExposureMetric,
    totals: FxHashMap<ExposureKey, f64>,
    /// Previous-step position per vehicle, for the distance metric.
    last_position: FxHashMap<VehicleId, Pt>,
}

impl ExposureTracker {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            metric: config.exposure_metric,
            totals: FxHashMap::default(),
            last_position: FxHashMap::default(),
        }
    }

    /// Resolve containment for every live vehicle and accumulate this
    /// step's contributions.
    pub fn record_step<E: TrafficControl, S: ZoneSource>(
        &mut self,
        engine: &E,
        registry: &ZoneRegistry<S>,
        store: &DecisionStore,
        now: SimTime,
    ) -> ExposureResult<StepRecord> {
        let groups = registry.timesteps();
        let mut vehicles = Vec::new();

        for vid in engine.active_vehicles() {
            let position = engine.vehicle_position(&vid)?;
            let speed = engine.vehicle_speed(&vid)?;

            let contribution = match self.metric {
                ExposureMetric::Speed => speed,
                ExposureMetric::Distance => self
                    .last_position
                    .get(&vid)
                    .map_or(0.0, |prev| prev.distance(position)),
            };
            self.last_position.insert(vid.clone(), position);

            let mut zones = Vec::new();
            for group in &groups {
                // Holes resolve to no zone: no exposure inside them.
                let Some(zone) = registry.resolve_zone(position, group) else {
                    continue;
                };
                *self
                    .totals
                    .entry(ExposureKey {
                        timestep: group.clone(),
                        vehicle: vid.clone(),
                        zone: zone.id.clone(),
                    })
                    .or_insert(0.0) += contribution;
                zones.push(ZoneRef {
                    zone: zone.id.clone(),
                    timestep: zone.timestep.clone(),
                });
            }

            if zones.is_empty() {
                continue;
            }
            let inserted_at = store
                .get(&vid)
                .map(|r| r.inserted_at.clone())
                .unwrap_or_default();
            vehicles.push(VehicleEntry {
                edge: engine.vehicle_current_edge(&vid)?,
                vehicle: vid,
                inserted_at,
                speed,
                zones,
            });
        }

        debug!(
            "exposure step {now}: {} vehicles inside zones",
            vehicles.len()
        );
        Ok(StepRecord {
            time: now,
            zone_timestep: registry.current_timestep().clone(),
            vehicles,
        })
    }

    /// Accumulated exposure for one (timestep, vehicle, zone) bucket.
    pub fn total(&self, timestep: &Timestep, vehicle: &VehicleId, zone: &ZoneId) -> f64 {
        self.totals
            .get(&ExposureKey {
                timestep: timestep.clone(),
                vehicle: vehicle.clone(),
                zone: zone.clone(),
            })
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.totals.len()
    }

    /// Sum of every bucket, for end-of-run summaries.
    pub fn grand_total(&self) -> f64 {
        self.totals.values().sum()
    }

    /// Drop per-vehicle state for destroyed vehicles.  Accumulated totals
    /// are part of the run's output and stay.
    pub fn purge(&mut self, vehicles: &[VehicleId]) {
        for vid in vehicles {
            self.last_position.remove(vid);
        }
    }
}
