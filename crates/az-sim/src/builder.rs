//! Fluent builder for constructing a [`Simulation`].

use az_core::{SimConfig, SimTime, Timestep};
use az_engine::TrafficControl;
use az_output::ExposureWriter;
use az_zones::{ZoneRegistry, ZoneSource};

use crate::sim::NullWriter;
use crate::{SimResult, Simulation};

/// Builder for [`Simulation<E, S>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — intervals, policies, seed, …
/// - `E: TrafficControl` — the engine channel
/// - `S: ZoneSource` — where zone batches come from
///
/// # Optional inputs
///
/// | Method         | Default                            |
/// |----------------|------------------------------------|
/// | `.writer(w)`   | [`NullWriter`] (discards the log)  |
/// | `.max_steps(n)`| unbounded                          |
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimulationBuilder::new(config, engine, ZoneDir::new("airdata"))
///     .writer(Box::new(CsvExposureWriter::new(out_dir)?))
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimulationBuilder<E: TrafficControl, S: ZoneSource> {
    config: SimConfig,
    engine: E,
    source: S,
    writer: Option<Box<dyn ExposureWriter>>,
    max_steps: Option<u64>,
}

impl<E: TrafficControl, S: ZoneSource> SimulationBuilder<E, S> {
    pub fn new(config: SimConfig, engine: E, source: S) -> Self {
        Self {
            config,
            engine,
            source,
            writer: None,
            max_steps: None,
        }
    }

    /// Supply the exposure log backend.
    pub fn writer(mut self, writer: Box<dyn ExposureWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Stop after `n` steps even if vehicles remain (useful for tests and
    /// partial runs).
    pub fn max_steps(mut self, n: u64) -> Self {
        self.max_steps = Some(n);
        self
    }

    /// Validate the configuration, load the initial zone timestep, and
    /// return a ready-to-run [`Simulation`].
    ///
    /// Configuration errors and missing initial zone data are fatal here,
    /// before the step loop ever starts.
    pub fn build(self) -> SimResult<Simulation<E, S>> {
        self.config.validate()?;

        let mut engine = self.engine;
        let mut registry = ZoneRegistry::new(self.source, &self.config);
        let start = SimTime(self.config.start_secs);
        registry.load_timestep(&mut engine, Timestep::from_sim_time(start), start)?;

        Ok(Simulation::start(
            self.config,
            engine,
            registry,
            self.writer.unwrap_or_else(|| Box::new(NullWriter)),
            self.max_steps,
        ))
    }
}
