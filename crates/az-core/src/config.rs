//! Top-level simulation configuration.
//!
//! Typically loaded from a TOML/JSON file by the application crate and passed
//! to the simulation builder.  [`SimConfig::validate`] enforces the
//! cross-field requirements; an invalid configuration aborts startup before
//! the engine is touched.

use crate::{CoreError, CoreResult};

// ── Policy enums ──────────────────────────────────────────────────────────────

/// Which rerouting evaluation runs each step.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RerouteMode {
    /// Zones are tracked but never influence routing.
    #[default]
    None,
    /// Evaluate each vehicle's full planned route once at insertion.
    Static,
    /// Evaluate at insertion and continuously within a proximity radius.
    Dynamic,
}

impl RerouteMode {
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "none" => Ok(RerouteMode::None),
            "static" => Ok(RerouteMode::Static),
            "dynamic" => Ok(RerouteMode::Dynamic),
            other => Err(CoreError::Config(format!(
                "unknown rerouting mode {other:?} (expected none, static, or dynamic)"
            ))),
        }
    }
}

/// How a per-vehicle yes/no decision is sampled.
///
/// Used for both the should-reroute decision and the non-departure decision.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DecisionPolicy {
    /// Every vehicle decides yes.
    #[default]
    None,
    /// Yes with the given probability in `[0, 1]`.
    Percent(f64),
    /// Fair coin flip.
    Random,
}

/// What an exposure bucket accumulates each step.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExposureMetric {
    /// The vehicle's current speed (m/s, integrates to distance at 1 s steps).
    #[default]
    Speed,
    /// Distance moved since the previous step (m).
    Distance,
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Configuration surface consumed by the zone, rerouting, and exposure
/// subsystems.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Wall-clock second at which the run starts (second-of-day resolution
    /// determines the first zone timestep label).
    pub start_secs: i64,

    /// How often new zone geometry is loaded, in seconds.
    pub zone_update_interval_secs: u32,

    /// How long a zone batch is retained past its creation, in seconds.
    /// Must exceed `zone_update_interval_secs`.
    pub keep_duration_secs: u32,

    /// Which rerouting policy runs.
    pub reroute_mode: RerouteMode,

    /// When `true`, a vehicle only ever reacts to the zones in effect at its
    /// insertion time; when `false`, always to the most recent batch.
    pub snapshot_zones: bool,

    /// Force a full re-evaluation of all vehicles after every zone update.
    /// Has no effect when `snapshot_zones` is set.
    pub reroute_on_zone_update: bool,

    /// Proximity radius (m) for the dynamic policy's context sweep.
    /// Required > 0 when `reroute_mode` is `Dynamic`.
    pub dynamic_reroute_distance: f64,

    /// Re-invoke the engine's rerouting primitive for every rerouted vehicle
    /// at a fixed period, keeping routes optimal under the applied overrides.
    pub periodic_recheck: bool,

    /// Recheck period in seconds (e.g. 300 = 5 simulated minutes).
    pub recheck_period_secs: u32,

    /// Sampling policy for the sticky per-vehicle should-reroute decision.
    pub reroute_decision: DecisionPolicy,

    /// Sampling policy for the non-departure decision.
    pub depart_decision: DecisionPolicy,

    /// What exposure buckets accumulate.
    pub exposure_metric: ExposureMetric,

    /// Maximum polygon vertex count accepted by the engine; larger zone
    /// shapes are decomposed into parts.
    pub max_polygon_vertices: usize,

    /// Master RNG seed.  The same seed always produces identical decisions.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_secs: 0,
            zone_update_interval_secs: 3_600,
            keep_duration_secs: 3 * 3_600,
            reroute_mode: RerouteMode::None,
            snapshot_zones: false,
            reroute_on_zone_update: false,
            dynamic_reroute_distance: 0.0,
            periodic_recheck: false,
            recheck_period_secs: 300,
            reroute_decision: DecisionPolicy::None,
            depart_decision: DecisionPolicy::None,
            exposure_metric: ExposureMetric::Speed,
            max_polygon_vertices: 255,
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Check cross-field requirements.  Called by the simulation builder;
    /// any failure is fatal for startup.
    pub fn validate(&self) -> CoreResult<()> {
        if self.zone_update_interval_secs == 0 {
            return Err(CoreError::Config(
                "zone_update_interval_secs must be positive".into(),
            ));
        }
        if self.keep_duration_secs <= self.zone_update_interval_secs {
            return Err(CoreError::Config(format!(
                "keep_duration_secs ({}) must exceed zone_update_interval_secs ({})",
                self.keep_duration_secs, self.zone_update_interval_secs
            )));
        }
        if self.reroute_mode == RerouteMode::Dynamic && self.dynamic_reroute_distance <= 0.0 {
            return Err(CoreError::Config(
                "dynamic rerouting requires a positive dynamic_reroute_distance".into(),
            ));
        }
        if self.periodic_recheck && self.recheck_period_secs == 0 {
            return Err(CoreError::Config(
                "periodic_recheck requires a positive recheck_period_secs".into(),
            ));
        }
        if self.max_polygon_vertices < 3 {
            return Err(CoreError::Config(
                "max_polygon_vertices must be at least 3".into(),
            ));
        }
        validate_policy("reroute_decision", self.reroute_decision)?;
        validate_policy("depart_decision", self.depart_decision)?;
        Ok(())
    }
}

fn validate_policy(what: &str, policy: DecisionPolicy) -> CoreResult<()> {
    match policy {
        DecisionPolicy::Percent(p) if !(0.0..=1.0).contains(&p) => Err(CoreError::Config(
            format!("{what}: percent probability {p} must be within [0, 1]"),
        )),
        _ => Ok(()),
    }
}
