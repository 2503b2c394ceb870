//! Edge-zone mapping.
//!
//! A zone's covered-edge set is resolved once at registration through the
//! engine's radius-0 containment query and is immutable afterwards — the
//! network topology is fixed for the lifetime of a run, so the mapping is
//! never recomputed.

use log::debug;

use az_core::{EdgeId, ZoneId};
use az_engine::{EngineResult, TrafficControl};

/// Resolve the road edges covered by a registered polygon.
///
/// Junction-internal connector edges are filtered out: they exist only as an
/// engine naming convention and carry no routable geometry of their own.
/// The result is sorted for deterministic downstream iteration.
pub fn map_edges<E: TrafficControl>(engine: &E, id: &ZoneId) -> EngineResult<Vec<EdgeId>> {
    let mut edges: Vec<EdgeId> = engine
        .edges_covering(id)?
        .into_iter()
        .filter(|e| !e.is_internal())
        .collect();
    edges.sort();
    debug!("polygon {id} covers {} edges", edges.len());
    Ok(edges)
}
