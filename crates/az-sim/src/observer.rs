//! Step observer trait for progress reporting and instrumentation.

use az_core::SimTime;
use az_exposure::StepRecord;
use az_zones::ZoneUpdate;

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run] at key
/// points in the step loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Observation is strictly read-only;
/// components are driven by the simulation itself in a fixed order, not by
/// observers.
pub trait StepObserver {
    /// Called at the very start of each step, before any processing.
    fn on_step_start(&mut self, _now: SimTime) {}

    /// Called at the end of each step with the number of reroute actions
    /// taken.
    fn on_step_end(&mut self, _now: SimTime, _rerouted: usize) {}

    /// Called after a zone update has fully committed.
    fn on_zone_update(&mut self, _update: &ZoneUpdate) {}

    /// Called with each step's exposure record, after it has been written.
    fn on_exposure(&mut self, _record: &StepRecord) {}

    /// Called once after the final step completes (not on abort).
    fn on_sim_end(&mut self, _now: SimTime) {}
}

/// A [`StepObserver`] that does nothing.
pub struct NoopObserver;

impl StepObserver for NoopObserver {}
