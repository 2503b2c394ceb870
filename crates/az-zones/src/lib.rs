//! `az-zones` — zone data model, lifecycle registry, and edge-zone mapping.
//!
//! Zones are severity-leveled geofenced polygons, loaded in batches keyed by
//! wall-clock [`Timestep`][az_core::Timestep].  The [`ZoneRegistry`] owns
//! every zone's lifetime (`Pending → Active → Hidden → Removed`), registers
//! geometry with the engine, resolves which road edges each polygon covers,
//! and answers the nested-hole containment queries the exposure tracker and
//! rerouter depend on.
//!
//! # Crate layout
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`zone`]     | `Zone`, `ZoneKind`, `ZoneState`, `ZoneDef`             |
//! | [`loader`]   | `ZoneSource`, CSV file source, shape parsing           |
//! | [`mapper`]   | Edge-zone mapping over the engine coverage query       |
//! | [`registry`] | `ZoneRegistry`, `ZoneUpdate`                           |
//! | [`db`]       | `ZoneDb` relational store (feature `db`)               |
//! | [`error`]    | `ZoneError`, `ZoneResult<T>`                           |

pub mod error;
pub mod loader;
pub mod mapper;
pub mod registry;
pub mod zone;

#[cfg(feature = "db")]
pub mod db;


pub use error::{ZoneError, ZoneResult};
pub use loader::{load_zone_reader, zone_file_name, ZoneDir, ZoneSource};
pub use mapper::map_edges;
pub use registry::{ZoneRegistry, ZoneUpdate};
pub use zone::{Zone, ZoneDef, ZoneKind, ZoneState};

#[cfg(feature = "db")]
pub use db::ZoneDb;
