//! The `AdmissionController` — decides once per loaded vehicle whether it
//! may depart at all.

use log::info;
use rustc_hash::FxHashSet;

use az_core::{DecisionPolicy, SimConfig, Timestep, VehicleId};
use az_engine::TrafficControl;

use crate::policy::decide;
use crate::{DecisionStore, RerouteResult};

/// Outcome of one admission pass.
#[derive(Clone, Debug, Default)]
pub struct AdmissionSummary {
    /// Vehicles that departed this step, after non-admission removals.
    pub admitted: Vec<VehicleId>,
    /// Vehicles removed before departure.
    pub removed: usize,
}

/// Applies the non-departure policy to newly loaded vehicles.
///
/// Non-departure is *systematic*: one negative decision suppresses every
/// later trip of the same owner, so a traveller who leaves the car parked
/// stays off the road for the whole run.
pub struct AdmissionController {
    policy: DecisionPolicy,
    seed: u64,
    suppressed: FxHashSet<String>,
}

impl AdmissionController {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            policy: config.depart_decision,
            seed: config.seed,
            suppressed: FxHashSet::default(),
        }
    }

    /// Process the engine's freshly loaded vehicles, removing non-admitted
    /// ones, and stamp the survivors' decision records with the current
    /// zone timestep.
    pub fn process<E: TrafficControl>(
        &mut self,
        engine: &mut E,
        store: &mut DecisionStore,
        current: &Timestep,
    ) -> RerouteResult<AdmissionSummary> {
        let mut removed = 0;
        for vid in engine.loaded_vehicles() {
            let owner = vid.owner().to_owned();
            if self.suppressed.contains(&owner) {
                info!("removing vehicle {vid}: owner already opted out");
                engine.remove_vehicle(&vid)?;
                removed += 1;
                continue;
            }
            if !decide(self.policy, self.seed, vid.as_str()) {
                info!("removing vehicle {vid}: non-departure decision");
                engine.remove_vehicle(&vid)?;
                self.suppressed.insert(owner);
                removed += 1;
            }
        }

        let admitted = engine.departed_vehicles();
        for vid in &admitted {
            store.insert(vid.clone(), current.clone());
        }
        Ok(AdmissionSummary { admitted, removed })
    }

    /// Owners suppressed so far.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }
}
