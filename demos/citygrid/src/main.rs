//! citygrid — smallest end-to-end airzone scenario.
//!
//! A fleet of commuters crosses a three-edge corridor with a detour over
//! the top.  Zone geometry rolls through three timesteps: first the middle
//! edge is restricted, then the restriction tightens, then it lifts.
//! Vehicles decide individually (80 % compliance) whether to detour; the
//! exposure log lands in `./citygrid-output/`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use log::info;

use az_core::{
    DecisionPolicy, EdgeId, RerouteMode, SimConfig, SimTime, Timestep, ZoneId,
};
use az_engine::{Color, MemoryEngine, MemoryEngineBuilder};
use az_geom::{Pt, Ring};
use az_output::CsvExposureWriter;
use az_sim::{SimulationBuilder, StepObserver};
use az_zones::{ZoneDef, ZoneError, ZoneKind, ZoneSource};

// ── Constants ─────────────────────────────────────────────────────────────────

const VEHICLES: usize = 24;
const DEPART_SPACING_SECS: i64 = 5;
const START_SECS: i64 = 36_000; // 10:00:00
const UPDATE_INTERVAL_SECS: u32 = 60;
const KEEP_DURATION_SECS: u32 = 180;
const OUTPUT_DIR: &str = "citygrid-output";

// ── Zone batches ──────────────────────────────────────────────────────────────

/// Three scripted timesteps, served from memory.  A deployment would read
/// per-timestep files via `ZoneDir` or a prepared store via `ZoneDb`; the
/// registry cannot tell the difference.
struct ScriptedZones {
    batches: HashMap<String, Vec<ZoneDef>>,
}

impl ScriptedZones {
    fn new() -> Self {
        let corridor = |raw_id: &str, level: u8, x0: f64, x1: f64| ZoneDef {
            raw_id: raw_id.to_owned(),
            level,
            kind: ZoneKind::Zone,
            color: Color::new(213, 94, 94),
            ring: Ring::from_points(vec![
                Pt::new(x0, -15.0),
                Pt::new(x1, -15.0),
                Pt::new(x1, 15.0),
                Pt::new(x0, 15.0),
            ]),
            edges: None,
        };

        let mut batches = HashMap::new();
        // 10:00 — the middle edge is restricted.
        batches.insert("10-00-00".into(), vec![corridor("mid", 1, 120.0, 180.0)]);
        // 10:01 — the restriction widens and tightens.
        batches.insert("10-01-00".into(), vec![corridor("mid", 2, 110.0, 290.0)]);
        // 10:02 — all clear.
        batches.insert("10-02-00".into(), vec![]);
        Self { batches }
    }
}

impl ZoneSource for ScriptedZones {
    fn load(&mut self, timestep: &Timestep) -> az_zones::ZoneResult<Vec<ZoneDef>> {
        self.batches
            .get(timestep.as_str())
            .cloned()
            .ok_or_else(|| ZoneError::DataNotFound {
                timestep: timestep.clone(),
                path: "scripted".into(),
            })
    }
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Corridor e1 → e2 → e3 with the detour d1/d2 bypassing e2, and the
/// commuter fleet departing on a fixed cadence.
fn build_engine() -> MemoryEngine {
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
    b.add_edge(":n1_0", n1, n1, 0.0);

    let route = vec![EdgeId::new("e1"), EdgeId::new("e2"), EdgeId::new("e3")];
    for i in 0..VEHICLES {
        b.add_vehicle(
            &format!("commuter-{i}_0"),
            route.clone(),
            SimTime(START_SECS + i as i64 * DEPART_SPACING_SECS),
        );
    }
    b.build()
}

// ── Progress observer ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Progress {
    steps: usize,
    rerouted: usize,
    updates: usize,
}

impl StepObserver for Progress {
    fn on_step_end(&mut self, _now: SimTime, rerouted: usize) {
        self.steps += 1;
        self.rerouted += rerouted;
    }

    fn on_zone_update(&mut self, update: &az_zones::ZoneUpdate) {
        self.updates += 1;
        info!(
            "zone update → {} ({} loaded, {} hidden, {} removed)",
            update.timestep, update.loaded, update.hidden, update.removed
        );
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimConfig {
        start_secs: START_SECS,
        zone_update_interval_secs: UPDATE_INTERVAL_SECS,
        keep_duration_secs: KEEP_DURATION_SECS,
        reroute_mode: RerouteMode::Static,
        reroute_on_zone_update: true,
        reroute_decision: DecisionPolicy::Percent(0.8),
        ..SimConfig::default()
    };

    std::fs::create_dir_all(OUTPUT_DIR)?;
    let writer = CsvExposureWriter::new(Path::new(OUTPUT_DIR))?;

    let mut sim = SimulationBuilder::new(config, build_engine(), ScriptedZones::new())
        .writer(Box::new(writer))
        .build()?;

    let mut progress = Progress::default();
    sim.run(&mut progress)?;

    let group = Timestep::from_sim_time(SimTime(START_SECS));
    let mid = ZoneId::scoped("mid", &group);
    println!("steps simulated:      {}", progress.steps);
    println!("zone updates:         {}", progress.updates);
    println!("reroute actions:      {}", progress.rerouted);
    println!("exposure buckets:     {}", sim.tracker.bucket_count());
    println!("exposure (sum, m/s):  {:.1}", sim.tracker.grand_total());
    println!(
        "first-batch zone {} still registered: {}",
        mid,
        sim.registry.zone(&mid).is_some()
    );
    println!("exposure log in ./{OUTPUT_DIR}/");
    Ok(())
}
