//! Exposure-subsystem error type.

use thiserror::Error;

use az_engine::EngineError;

/// Errors produced by `az-exposure` — all of them engine-channel failures
/// surfaced while querying vehicle telemetry.
#[derive(Debug, Error)]
pub enum ExposureError {
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type ExposureResult<T> = Result<T, ExposureError>;
