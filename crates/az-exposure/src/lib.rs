//! `az-exposure` — accumulates how much exposure each vehicle collects
//! inside each zone, one simulated step at a time.
//!
//! Every step, each live vehicle's position is resolved against every
//! registered zone timestep group through the registry's hole-aware
//! containment rule.  Resolved zones accumulate a per-(timestep, vehicle,
//! zone) scalar — the vehicle's speed or its distance delta — and the step
//! emits one structured [`StepRecord`] for the output writers.
//!
//! # Crate layout
//!
//! | Module      | Contents                                    |
//! |-------------|---------------------------------------------|
//! | [`record`]  | `StepRecord`, `VehicleEntry`, `ZoneRef`     |
//! | [`tracker`] | `ExposureTracker`                           |
//! | [`error`]   | `ExposureError`, `ExposureResult<T>`        |

pub mod error;
pub mod record;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use error::{ExposureError, ExposureResult};
pub use record::{StepRecord, VehicleEntry, ZoneRef};
pub use tracker::ExposureTracker;
