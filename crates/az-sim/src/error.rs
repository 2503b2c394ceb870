//! Orchestrator error type.

use thiserror::Error;

use az_core::CoreError;
use az_engine::EngineError;
use az_exposure::ExposureError;
use az_output::OutputError;
use az_reroute::RerouteError;
use az_zones::ZoneError;

/// Any failure that can abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration: {0}")]
    Config(#[from] CoreError),

    #[error("zone subsystem: {0}")]
    Zone(#[from] ZoneError),

    #[error("engine channel: {0}")]
    Engine(#[from] EngineError),

    #[error("rerouting: {0}")]
    Reroute(#[from] RerouteError),

    #[error("exposure tracking: {0}")]
    Exposure(#[from] ExposureError),

    #[error("exposure log: {0}")]
    Output(#[from] OutputError),
}

pub type SimResult<T> = Result<T, SimError>;
