//! Strongly typed identifier wrappers around engine-assigned names.
//!
//! The external simulation engine names every object with a string, so the
//! wrappers hold a `String` rather than an integer index.  All IDs are
//! `Clone + Ord + Hash` so they can be used as map keys and sorted collection
//! elements without ceremony.

use std::fmt;

/// Generate a typed ID wrapper around an engine-assigned string name.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The engine-side name, exactly as registered.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id! {
    /// A vehicle in the external simulation.  The engine composes these as
    /// `<owner>_<trip-counter>`; [`VehicleId::owner`] recovers the prefix.
    pub struct VehicleId;
}

string_id! {
    /// A registered zone polygon (or one part of a decomposed zone).
    pub struct ZoneId;
}

string_id! {
    /// A directed road-network edge in the engine's topology.
    pub struct EdgeId;
}

impl VehicleId {
    /// The traveller this vehicle belongs to: the id prefix before the last
    /// `_`, or the whole id when there is no separator.  Repeat trips of one
    /// traveller share an owner.
    pub fn owner(&self) -> &str {
        match self.0.rfind('_') {
            Some(i) => &self.0[..i],
            None => &self.0,
        }
    }
}

impl ZoneId {
    /// Compose the registry-scoped id for a zone loaded at `timestep`.
    pub fn scoped(raw: &str, timestep: &crate::Timestep) -> Self {
        Self(format!("{raw}_{timestep}"))
    }

    /// Derive the id for part `idx` of a decomposed zone.
    pub fn part(&self, idx: usize) -> Self {
        Self(format!("{}_part-{idx:02}", self.0))
    }
}

impl EdgeId {
    /// `true` for junction-internal connector edges.  The engine names these
    /// with a leading `:`; they are filtered out of zone coverage sets.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.0.starts_with(':')
    }
}
