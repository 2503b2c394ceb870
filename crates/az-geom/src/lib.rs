//! `az-geom` — planar geometry for zone polygons.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                   |
//! |-----------|------------------------------------------------------------|
//! | [`pt`]    | `Pt`, `Axis`, `Bounds`                                     |
//! | [`ring`]  | `Ring` — a closed polygon with area/containment queries    |
//! | [`split`] | Axis-aligned splitting and bounded-vertex `decompose`      |
//! | [`error`] | `GeomError`, `GeomResult<T>`                               |
//!
//! Coordinates are engine-local planar metres (the external engine projects
//! geographic input before this crate ever sees it), so plain Euclidean
//! arithmetic applies throughout.

pub mod error;
pub mod pt;
pub mod ring;
pub mod split;


pub use error::{GeomError, GeomResult};
pub use pt::{Axis, Bounds, Pt};
pub use ring::Ring;
pub use split::{decompose, split_ring};
