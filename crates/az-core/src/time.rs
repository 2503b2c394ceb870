//! Simulation time model.
//!
//! # Design
//!
//! The external engine advances in one-second steps and reports absolute
//! wall-clock seconds; [`SimTime`] wraps that value.  Zone geometry is
//! batched by wall-clock label: every batch is keyed by a [`Timestep`] of
//! the form `HH-MM-SS`, derived from the second-of-day of the `SimTime` at
//! which the batch becomes authoritative.
//!
//! Keeping `SimTime` an integer means all retention arithmetic is exact and
//! comparisons are O(1); the string label exists only at the file-format and
//! logging boundary.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// Absolute simulation wall-clock time in seconds.
///
/// Stored as `i64` so subtraction in retention checks cannot underflow into
/// wraparound; times before the epoch simply go negative.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub i64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Return the time `secs` seconds after `self`.
    #[inline]
    pub fn offset(self, secs: i64) -> SimTime {
        SimTime(self.0 + secs)
    }

    /// Seconds elapsed from `earlier` to `self` (negative if out of order).
    #[inline]
    pub fn since(self, earlier: SimTime) -> i64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<i64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: i64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: SimTime) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

// ── Timestep ──────────────────────────────────────────────────────────────────

/// The wall-clock label (`HH-MM-SS`) identifying one batch of zone geometry.
///
/// Zero-padded, so lexicographic order equals chronological order within a
/// day and the derived `Ord` is correct.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestep(String);

impl Timestep {
    /// Derive the label from the second-of-day of `t`.
    pub fn from_sim_time(t: SimTime) -> Self {
        let day_secs = t.0.rem_euclid(86_400);
        let h = day_secs / 3_600;
        let m = (day_secs % 3_600) / 60;
        let s = day_secs % 60;
        Timestep(format!("{h:02}-{m:02}-{s:02}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Timestep {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('-').collect();
        let [h, m, sec] = fields.as_slice() else {
            return Err(CoreError::Parse(format!(
                "invalid timestep {s:?}: expected HH-MM-SS"
            )));
        };
        let parse = |v: &str, max: u32| {
            v.parse::<u32>()
                .ok()
                .filter(|&n| v.len() == 2 && n < max)
                .ok_or_else(|| {
                    CoreError::Parse(format!("invalid timestep {s:?}: expected HH-MM-SS"))
                })
        };
        parse(h, 24)?;
        parse(m, 60)?;
        parse(sec, 60)?;
        Ok(Timestep(s.to_owned()))
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
