//! `az-output` — exposure log writers.
//!
//! Two backends behind one [`ExposureWriter`] trait:
//!
//! | Feature  | Backend | Files created                                  |
//! |----------|---------|------------------------------------------------|
//! | *(none)* | CSV     | `zone_exposure.csv`, `step_summaries.csv`      |
//! | `db`     | SQLite  | `exposure.db`                                  |
//!
//! Both flush per step, so a run that aborts mid-way still leaves every
//! completed step's records readable.

pub mod csv;
pub mod error;
pub mod writer;

#[cfg(feature = "db")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvExposureWriter;
pub use error::{OutputError, OutputResult};
pub use writer::ExposureWriter;

#[cfg(feature = "db")]
pub use sqlite::SqliteExposureWriter;
