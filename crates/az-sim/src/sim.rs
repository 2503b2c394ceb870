//! The `Simulation` struct and its step loop.

use log::{error, info};

use az_core::{RerouteMode, SimConfig, SimTime};
use az_engine::TrafficControl;
use az_exposure::{ExposureTracker, StepRecord};
use az_output::{ExposureWriter, OutputResult};
use az_reroute::{AdmissionController, DecisionStore, Rerouter};
use az_zones::{ZoneRegistry, ZoneSource};

use crate::{SimResult, StepObserver};

/// An [`ExposureWriter`] that discards everything.  Used when a run does
/// not need the exposure artifact (tests, calibration runs).
pub struct NullWriter;

impl ExposureWriter for NullWriter {
    fn write_step(&mut self, _record: &StepRecord) -> OutputResult<()> {
        Ok(())
    }
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

/// The simulation runner: owns the engine channel and every component, and
/// drives them in the fixed per-step order.
///
/// Create via [`SimulationBuilder`][crate::SimulationBuilder].
pub struct Simulation<E: TrafficControl, S: ZoneSource> {
    pub config: SimConfig,
    pub engine: E,
    pub registry: ZoneRegistry<S>,
    pub admission: AdmissionController,
    pub rerouter: Rerouter,
    pub store: DecisionStore,
    pub tracker: ExposureTracker,

    writer: Box<dyn ExposureWriter>,
    now: SimTime,
    max_steps: Option<u64>,
    steps_run: u64,
}

impl<E: TrafficControl, S: ZoneSource> Simulation<E, S> {
    pub(crate) fn start(
        config: SimConfig,
        engine: E,
        registry: ZoneRegistry<S>,
        writer: Box<dyn ExposureWriter>,
        max_steps: Option<u64>,
    ) -> Self {
        let now = SimTime(config.start_secs);
        Self {
            admission: AdmissionController::new(&config),
            rerouter: Rerouter::new(&config),
            store: DecisionStore::new(),
            tracker: ExposureTracker::new(&config),
            config,
            engine,
            registry,
            writer,
            now,
            max_steps,
            steps_run: 0,
        }
    }

    /// The current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Run until the engine expects no more vehicles (or the optional step
    /// cap is reached).
    ///
    /// Any component error aborts the run: it is logged, the exposure log
    /// flushed, the engine connection closed, and the error returned.
    pub fn run<O: StepObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        loop {
            if self.engine.expected_vehicle_count() == 0 {
                break;
            }
            if self.max_steps.is_some_and(|max| self.steps_run >= max) {
                info!("step cap reached at {}", self.now);
                break;
            }

            observer.on_step_start(self.now);
            match self.step_once(observer) {
                Ok(rerouted) => observer.on_step_end(self.now, rerouted),
                Err(e) => {
                    error!("aborting run at {}: {e}", self.now);
                    self.shutdown();
                    return Err(e);
                }
            }

            self.now = self.now + 1;
            self.steps_run += 1;
        }

        info!("finished at {} after {} steps", self.now, self.steps_run);
        self.shutdown();
        observer.on_sim_end(self.now);
        Ok(())
    }

    /// One step in the required component order.
    fn step_once<O: StepObserver>(&mut self, observer: &mut O) -> SimResult<usize> {
        let now = self.now;
        self.engine.advance(now)?;

        // ── Admission: before rerouting sees the step's vehicle set ───────
        let current = self.registry.current_timestep().clone();
        let admitted = self
            .admission
            .process(&mut self.engine, &mut self.store, &current)?;

        // ── Zone update: committed and fanned out before any reader ───────
        let elapsed = now.since(SimTime(self.config.start_secs));
        if elapsed > 0 && elapsed % self.config.zone_update_interval_secs as i64 == 0 {
            let update = self.registry.update(&mut self.engine, now)?;
            self.rerouter.on_zones_updated();
            observer.on_zone_update(&update);
        }

        // ── Rerouting ─────────────────────────────────────────────────────
        let rerouted = if self.config.reroute_mode == RerouteMode::None {
            0
        } else {
            self.rerouter.step(
                &mut self.engine,
                &self.registry,
                &mut self.store,
                &admitted.admitted,
                now,
            )?
        };

        // ── Exposure ──────────────────────────────────────────────────────
        let record = self
            .tracker
            .record_step(&self.engine, &self.registry, &self.store, now)?;
        self.writer.write_step(&record)?;
        observer.on_exposure(&record);

        // ── Cleanup: state of destroyed vehicles must not outlive them ────
        let arrived = self.engine.arrived_vehicles();
        if !arrived.is_empty() {
            self.store.purge(&arrived);
            self.rerouter.purge(&arrived);
            self.tracker.purge(&arrived);
        }

        Ok(rerouted)
    }

    /// Flush the exposure log and close the engine connection.  Called on
    /// both normal completion and abort.
    fn shutdown(&mut self) {
        if let Err(e) = self.writer.finish() {
            error!("flushing exposure log failed: {e}");
        }
        self.engine.close();
    }
}
