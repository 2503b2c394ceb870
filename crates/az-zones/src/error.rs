//! Zone-subsystem error type.

use std::path::PathBuf;

use thiserror::Error;

use az_core::Timestep;
use az_engine::EngineError;

/// Errors produced by `az-zones`.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// Zone data for a timestep is missing entirely.  Fatal: every
    /// subsequent routing and exposure decision would be wrong without it.
    #[error("zone data for timestep {timestep} not found at {path}")]
    DataNotFound { timestep: Timestep, path: PathBuf },

    #[error("zone parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[cfg(feature = "db")]
    #[error("zone store error: {0}")]
    Db(#[from] rusqlite::Error),
}

pub type ZoneResult<T> = Result<T, ZoneError>;
