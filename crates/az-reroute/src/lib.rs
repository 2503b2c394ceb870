//! `az-reroute` — admission control and the rerouting decision engine.
//!
//! Two per-vehicle decisions govern everything here, both *sticky*: decided
//! at most once, cached in the [`DecisionStore`], and never resampled.
//! The should-reroute decision gates whether a vehicle reacts to zones at
//! all; the per-zone should-avoid decision selects which zones it detours
//! around.  The reroute action biases the avoided zones' edge costs through
//! the engine's adapted travel times and invokes the engine's travel-time
//! rerouting primitive.
//!
//! # Crate layout
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`store`]     | `DecisionStore`, `DecisionRecord`                     |
//! | [`policy`]    | Decision sampling (`none`/`percent`/`random`)         |
//! | [`admission`] | `AdmissionController` — systematic non-departure      |
//! | [`rerouter`]  | `Rerouter` — static and dynamic passes                |
//! | [`recheck`]   | `RecheckQueue` — periodic forced re-optimization      |
//! | [`error`]     | `RerouteError`, `RerouteResult<T>`                    |

pub mod admission;
pub mod error;
pub mod policy;
pub mod recheck;
pub mod rerouter;
pub mod store;


pub use admission::{AdmissionController, AdmissionSummary};
pub use error::{RerouteError, RerouteResult};
pub use recheck::RecheckQueue;
pub use rerouter::{Rerouter, AVOID_TRAVEL_TIME};
pub use store::{DecisionRecord, DecisionStore};
