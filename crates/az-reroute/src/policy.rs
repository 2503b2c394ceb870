//! Decision sampling.
//!
//! A decision site can be arbitrarily sophisticated (demographics, price
//! sensitivity, route length); the shipped policies are the systematic
//! baselines used in experiments.  Sampling is keyed by (run seed, vehicle
//! id), so a decision is reproducible across runs and across re-evaluations
//! within a run.

use az_core::{DecisionPolicy, DecisionRng};

/// Sample a yes/no decision for `vehicle_id` under `policy`.
pub fn decide(policy: DecisionPolicy, seed: u64, vehicle_id: &str) -> bool {
    match policy {
        DecisionPolicy::None => true,
        DecisionPolicy::Percent(p) => DecisionRng::new(seed, vehicle_id).gen_bool(p),
        DecisionPolicy::Random => DecisionRng::new(seed, vehicle_id).gen_bool(0.5),
    }
}
