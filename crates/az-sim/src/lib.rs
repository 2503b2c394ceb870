//! `az-sim` — the step orchestrator.
//!
//! # Step order
//!
//! ```text
//! for each engine step:
//!   ① Advance    — the engine inserts, moves, and retires vehicles.
//!   ② Admission  — non-departure policy removes vehicles before anything
//!                  else observes them.
//!   ③ Zone update (at the configured interval) — the registry commits
//!                  removals/hides/loads, then dependents are notified by
//!                  explicit calls, never a broadcast.
//!   ④ Rerouting  — static or dynamic pass over the committed zone state.
//!   ⑤ Exposure   — containment resolution and the step's log record.
//!   ⑥ Cleanup    — decision/schedule/position state of arrived vehicles
//!                  is purged.
//! ```
//!
//! This order is a correctness requirement: admission must complete before
//! rerouting sees the step's vehicle set, and a zone update must be fully
//! committed before rerouting or exposure read the new layering.
//!
//! Any error inside a step aborts the run through an orderly shutdown —
//! the exposure log is flushed and the engine connection closed — so
//! partial output always survives.

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimulationBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, StepObserver};
pub use sim::{NullWriter, Simulation};
