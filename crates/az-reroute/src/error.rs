//! Rerouting-subsystem error type.

use thiserror::Error;

use az_engine::EngineError;

/// Errors produced by `az-reroute`.  Everything here ultimately comes from
/// the engine channel; decision logic itself cannot fail.
#[derive(Debug, Error)]
pub enum RerouteError {
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type RerouteResult<T> = Result<T, RerouteError>;
