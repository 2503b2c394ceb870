//! Engine-channel error type.

use thiserror::Error;

use az_core::{EdgeId, VehicleId, ZoneId};

/// Errors produced by a [`TrafficControl`][crate::TrafficControl]
/// implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("vehicle {0} not known to the engine")]
    UnknownVehicle(VehicleId),

    #[error("polygon {0} not registered with the engine")]
    UnknownPolygon(ZoneId),

    #[error("edge {0} not in the network")]
    UnknownEdge(EdgeId),

    #[error("no route for vehicle {vehicle} to its destination")]
    NoRoute { vehicle: VehicleId },
}

pub type EngineResult<T> = Result<T, EngineError>;
