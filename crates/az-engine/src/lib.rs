//! `az-engine` — the simulation engine's control channel.
//!
//! The external microscopic traffic engine owns network topology, vehicle
//! kinematics, and shortest-path computation.  This crate pins down the
//! operations the zone subsystems consume as the [`TrafficControl`] trait,
//! so the rest of the workspace is engine-agnostic, and provides
//! [`MemoryEngine`] — a deliberately small in-memory implementation used by
//! tests and demos.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                 |
//! |-------------|----------------------------------------------------------|
//! | [`control`] | `TrafficControl`, `Color`, `PolygonStyle`                |
//! | [`memory`]  | `MemoryEngine`, `MemoryEngineBuilder`                    |
//! | [`error`]   | `EngineError`, `EngineResult<T>`                         |

pub mod control;
pub mod error;
pub mod memory;


pub use control::{Color, PolygonStyle, TrafficControl};
pub use error::{EngineError, EngineResult};
pub use memory::{MemoryEngine, MemoryEngineBuilder};
