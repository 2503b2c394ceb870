//! `az-core` — foundational types for the airzone geofencing engine.
//!
//! This crate is a dependency of every other `az-*` crate.  It intentionally
//! has no `az-*` dependencies and minimal external ones (only `rand`,
//! `rustc-hash`, and `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`ids`]      | `VehicleId`, `ZoneId`, `EdgeId`                        |
//! | [`time`]     | `SimTime`, `Timestep`                                  |
//! | [`config`]   | `SimConfig`, `RerouteMode`, `DecisionPolicy`, …        |
//! | [`rng`]      | `DecisionRng` (per-vehicle deterministic RNG)          |
//! | [`error`]    | `CoreError`, `CoreResult`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.   |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DecisionPolicy, ExposureMetric, RerouteMode, SimConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{EdgeId, VehicleId, ZoneId};
pub use rng::DecisionRng;
pub use time::{SimTime, Timestep};
