//! Integration tests for az-sim.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use az_core::{
    EdgeId, RerouteMode, SimConfig, SimTime, Timestep, VehicleId, ZoneId,
};
use az_engine::{Color, MemoryEngine, MemoryEngineBuilder};
use az_exposure::StepRecord;
use az_geom::{Pt, Ring};
use az_output::{CsvExposureWriter, ExposureWriter, OutputResult};
use az_zones::{ZoneDef, ZoneError, ZoneKind, ZoneSource, ZoneUpdate};

use crate::{NoopObserver, SimError, SimulationBuilder, StepObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ts(s: &str) -> Timestep {
    Timestep::from_str(s).unwrap()
}

fn eid(s: &str) -> EdgeId {
    EdgeId::new(s)
}

fn vid(s: &str) -> VehicleId {
    VehicleId::new(s)
}

#[derive(Default)]
struct StubSource {
    batches: FxHashMap<String, Vec<ZoneDef>>,
}

impl StubSource {
    fn with(mut self, timestep: &str, defs: Vec<ZoneDef>) -> Self {
        self.batches.insert(timestep.to_owned(), defs);
        self
    }
}

impl ZoneSource for StubSource {
    fn load(&mut self, timestep: &Timestep) -> az_zones::ZoneResult<Vec<ZoneDef>> {
        self.batches
            .get(timestep.as_str())
            .cloned()
            .ok_or_else(|| ZoneError::DataNotFound {
                timestep: timestep.clone(),
                path: "stub".into(),
            })
    }
}

fn zone_def(raw_id: &str, x0: f64, x1: f64) -> ZoneDef {
    ZoneDef {
        raw_id: raw_id.to_owned(),
        level: 1,
        kind: ZoneKind::Zone,
        color: Color::new(171, 213, 157),
        ring: Ring::from_points(vec![
            Pt::new(x0, -10.0),
            Pt::new(x1, -10.0),
            Pt::new(x1, 10.0),
            Pt::new(x0, 10.0),
        ]),
        edges: None,
    }
}

/// Line e1/e2/e3 with a detour around e2; two vehicles: `a_0` crossing the
/// zone with an outside destination, `b_0` ending inside the zone.
fn two_vehicle_engine() -> MemoryEngine {
    let mut b = MemoryEngineBuilder::new();
    let n0 = b.add_node(Pt::new(0.0, 0.0));
    let n1 = b.add_node(Pt::new(100.0, 0.0));
    let n2 = b.add_node(Pt::new(200.0, 0.0));
    let n3 = b.add_node(Pt::new(300.0, 0.0));
    let n4 = b.add_node(Pt::new(150.0, 200.0));
    b.add_edge("e1", n0, n1, 10.0);
    b.add_edge("e2", n1, n2, 10.0);
    b.add_edge("e3", n2, n3, 10.0);
    b.add_edge("d1", n1, n4, 30.0);
    b.add_edge("d2", n4, n2, 30.0);
    b.add_vehicle("a_0", vec![eid("e1"), eid("e2"), eid("e3")], SimTime(0));
    b.add_vehicle("b_0", vec![eid("e1"), eid("e2")], SimTime(0));
    b.build()
}

/// Chain c0 → … → c11, one vehicle traversing the whole chain.
fn chain_engine() -> MemoryEngine {
    let mut b = MemoryEngineBuilder::new();
    let nodes: Vec<usize> = (0..13)
        .map(|i| b.add_node(Pt::new(i as f64 * 100.0, 0.0)))
        .collect();
    let mut route = Vec::new();
    for i in 0..12 {
        let id = format!("c{i}");
        b.add_edge(&id, nodes[i], nodes[i + 1], 10.0);
        route.push(eid(&id));
    }
    b.add_vehicle("a_0", route, SimTime(0));
    b.build()
}

#[derive(Default)]
struct CountingObserver {
    starts: usize,
    ends: usize,
    zone_updates: Vec<ZoneUpdate>,
    exposures: Vec<StepRecord>,
    sim_ends: usize,
}

impl StepObserver for CountingObserver {
    fn on_step_start(&mut self, _now: SimTime) {
        self.starts += 1;
    }
    fn on_step_end(&mut self, _now: SimTime, _rerouted: usize) {
        self.ends += 1;
    }
    fn on_zone_update(&mut self, update: &ZoneUpdate) {
        self.zone_updates.push(update.clone());
    }
    fn on_exposure(&mut self, record: &StepRecord) {
        self.exposures.push(record.clone());
    }
    fn on_sim_end(&mut self, _now: SimTime) {
        self.sim_ends += 1;
    }
}

/// Writer that records the number of steps written and whether `finish`
/// ran, through shared handles that survive the move into the simulation.
struct SharedWriter {
    steps: Arc<AtomicUsize>,
    finished: Arc<AtomicBool>,
}

impl ExposureWriter for SharedWriter {
    fn write_step(&mut self, _record: &StepRecord) -> OutputResult<()> {
        self.steps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn finish(&mut self) -> OutputResult<()> {
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ── Builder validation ────────────────────────────────────────────────────────

#[test]
fn invalid_config_aborts_startup() {
    let config = SimConfig {
        zone_update_interval_secs: 3_600,
        keep_duration_secs: 3_600,
        ..SimConfig::default()
    };
    let source = StubSource::default().with("00-00-00", vec![]);
    let result = SimulationBuilder::new(config, two_vehicle_engine(), source).build();
    assert!(matches!(result, Err(SimError::Config(_))));
}

#[test]
fn missing_initial_zone_data_aborts_startup() {
    let result = SimulationBuilder::new(
        SimConfig::default(),
        two_vehicle_engine(),
        StubSource::default(),
    )
    .build();
    assert!(matches!(
        result,
        Err(SimError::Zone(ZoneError::DataNotFound { .. }))
    ));
}

// ── End-to-end run ────────────────────────────────────────────────────────────

#[test]
fn static_run_reroutes_and_tracks_exposure() {
    let config = SimConfig {
        reroute_mode: RerouteMode::Static,
        ..SimConfig::default()
    };
    let source = StubSource::default().with("00-00-00", vec![zone_def("z", 120.0, 180.0)]);
    let mut sim = SimulationBuilder::new(config, two_vehicle_engine(), source)
        .build()
        .unwrap();

    let mut observer = CountingObserver::default();
    sim.run(&mut observer).unwrap();

    // a_0 detours (e1,d1,d2,e3 → 4 edges, arrives step 4); b_0 cannot
    // escape its in-zone destination and arrives at step 2.
    assert_eq!(observer.starts, 5);
    assert_eq!(observer.ends, 5);
    assert_eq!(observer.sim_ends, 1);
    assert_eq!(observer.exposures.len(), 5);
    assert!(observer.zone_updates.is_empty());

    let zone = ZoneId::scoped("z", &ts("00-00-00"));
    let group = ts("00-00-00");
    // The detouring vehicle never entered the zone.
    assert_eq!(sim.tracker.total(&group, &vid("a_0"), &zone), 0.0);
    // The zone-bound vehicle spent one step inside at 10 m/s.
    let inside = sim.tracker.total(&group, &vid("b_0"), &zone);
    assert!((inside - 10.0).abs() < 1e-9);

    // Arrived vehicles left no decision or schedule state behind.
    assert!(sim.store.is_empty());
    assert_eq!(sim.rerouter.pending_rechecks(), 0);
    assert!(sim.engine.is_closed());
}

#[test]
fn exposure_log_written_per_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = SimConfig {
        reroute_mode: RerouteMode::Static,
        ..SimConfig::default()
    };
    let source = StubSource::default().with("00-00-00", vec![zone_def("z", 120.0, 180.0)]);
    let mut sim = SimulationBuilder::new(config, two_vehicle_engine(), source)
        .writer(Box::new(CsvExposureWriter::new(dir.path()).unwrap()))
        .build()
        .unwrap();
    sim.run(&mut NoopObserver).unwrap();

    let summaries = std::fs::read_to_string(dir.path().join("step_summaries.csv")).unwrap();
    let lines: Vec<&str> = summaries.lines().collect();
    assert_eq!(lines.len(), 6, "header + one row per step");
    // Step 1: b_0 inside the zone.
    assert_eq!(lines[2], "1,00-00-00,1");

    let exposure = std::fs::read_to_string(dir.path().join("zone_exposure.csv")).unwrap();
    assert!(exposure.contains("b_0"));
    assert!(!exposure.contains("a_0"), "the detouring vehicle never logged");
}

// ── Zone updates in the loop ──────────────────────────────────────────────────

#[test]
fn zone_update_runs_at_interval_and_notifies() {
    let config = SimConfig {
        zone_update_interval_secs: 10,
        keep_duration_secs: 30,
        reroute_mode: RerouteMode::Static,
        reroute_on_zone_update: true,
        ..SimConfig::default()
    };
    let source = StubSource::default()
        .with("00-00-00", vec![zone_def("z", 520.0, 580.0)])
        .with("00-00-10", vec![zone_def("z", 820.0, 880.0)]);
    let mut sim = SimulationBuilder::new(config, chain_engine(), source)
        .max_steps(15)
        .build()
        .unwrap();

    let mut observer = CountingObserver::default();
    sim.run(&mut observer).unwrap();

    assert_eq!(observer.zone_updates.len(), 1);
    let update = &observer.zone_updates[0];
    assert_eq!(update.timestep, ts("00-00-10"));
    assert_eq!(update.loaded, 1);
    assert_eq!(update.hidden, 1, "the 00-00-00 batch was superseded");

    assert_eq!(sim.registry.current_timestep(), &ts("00-00-10"));
    let old = ZoneId::scoped("z", &ts("00-00-00"));
    assert!(!sim.registry.is_active(&old));
    assert!(sim.registry.zone(&old).is_some(), "hidden, not removed");
}

#[test]
fn missing_update_data_aborts_with_orderly_shutdown() {
    let steps = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let config = SimConfig {
        zone_update_interval_secs: 10,
        keep_duration_secs: 30,
        ..SimConfig::default()
    };
    // Only the initial batch exists; the update at t=10 must fail.
    let source = StubSource::default().with("00-00-00", vec![zone_def("z", 520.0, 580.0)]);
    let mut sim = SimulationBuilder::new(config, chain_engine(), source)
        .writer(Box::new(SharedWriter {
            steps: Arc::clone(&steps),
            finished: Arc::clone(&finished),
        }))
        .build()
        .unwrap();

    let mut observer = CountingObserver::default();
    let result = sim.run(&mut observer);
    assert!(matches!(
        result,
        Err(SimError::Zone(ZoneError::DataNotFound { .. }))
    ));

    // Ten full steps were written before the failing eleventh.
    assert_eq!(steps.load(Ordering::SeqCst), 10);
    assert!(finished.load(Ordering::SeqCst), "log flushed on abort");
    assert!(sim.engine.is_closed());
    assert_eq!(observer.sim_ends, 0, "no normal end after an abort");
}
