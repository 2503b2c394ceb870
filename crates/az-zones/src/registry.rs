//! The `ZoneRegistry` — exclusive owner of zone lifetime.

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use az_core::{EdgeId, SimConfig, SimTime, Timestep, ZoneId};
use az_engine::{PolygonStyle, TrafficControl};
use az_geom::{decompose, Pt};

use crate::loader::ZoneSource;
use crate::mapper::map_edges;
use crate::{Zone, ZoneDef, ZoneKind, ZoneResult, ZoneState};

/// Summary of one registry update, handed to dependent components by the
/// step orchestrator once the update is committed.
#[derive(Clone, Debug)]
pub struct ZoneUpdate {
    /// The timestep that is now authoritative.
    pub timestep: Timestep,
    /// Zones (or zone parts) admitted.
    pub loaded: usize,
    /// Definitions dropped for covering no edges or failing decomposition.
    pub discarded: usize,
    /// Superseded zones visually retired.
    pub hidden: usize,
    /// Outlived zones deregistered and destroyed.
    pub removed: usize,
}

/// Owns the set of currently known zones, keyed by scoped zone id.
///
/// All mutation happens inside [`load_timestep`](Self::load_timestep),
/// [`retire`](Self::retire), and [`update`](Self::update); every other
/// component holds only read access for the remainder of a step.
pub struct ZoneRegistry<S: ZoneSource> {
    zones: FxHashMap<ZoneId, Zone>,
    current: Timestep,
    source: S,
    update_interval_secs: u32,
    keep_duration_secs: u32,
    max_vertices: usize,
}

impl<S: ZoneSource> ZoneRegistry<S> {
    pub fn new(source: S, config: &SimConfig) -> Self {
        Self {
            zones: FxHashMap::default(),
            current: Timestep::default(),
            source,
            update_interval_secs: config.zone_update_interval_secs,
            keep_duration_secs: config.keep_duration_secs,
            max_vertices: config.max_polygon_vertices,
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// The timestep whose zones are currently authoritative.
    pub fn current_timestep(&self) -> &Timestep {
        &self.current
    }

    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    /// Covered edges of a zone, or `None` once the zone is removed.  Stale
    /// references resolve to "zone not applicable", never an error.
    pub fn zone_edges(&self, id: &ZoneId) -> Option<&rustc_hash::FxHashSet<EdgeId>> {
        self.zones.get(id).map(|z| &z.edges)
    }

    /// `true` while the zone exists and has not been visually retired.
    pub fn is_active(&self, id: &ZoneId) -> bool {
        self.zones
            .get(id)
            .is_some_and(|z| z.state == ZoneState::Active)
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Zones of one timestep, sorted by id for deterministic iteration.
    pub fn zones_in_timestep(&self, timestep: &Timestep, include_holes: bool) -> Vec<&Zone> {
        let mut zones: Vec<&Zone> = self
            .zones
            .values()
            .filter(|z| &z.timestep == timestep)
            .filter(|z| include_holes || !z.kind.is_hole())
            .collect();
        zones.sort_by(|a, b| a.id.cmp(&b.id));
        zones
    }

    /// All timesteps with at least one registered zone, sorted.
    pub fn timesteps(&self) -> Vec<Timestep> {
        let mut out: Vec<Timestep> = self.zones.values().map(|z| z.timestep.clone()).collect();
        out.sort();
        out.dedup();
        out
    }

    // ── Containment resolution ────────────────────────────────────────────

    /// Resolve which logical zone of `group` contains `p`, applying the
    /// hole-priority rule.
    ///
    /// Candidates are the group's polygons containing `p`.  Non-hole
    /// candidates are visited innermost-first (descending severity level).
    /// A matching-level `hole-empty` means the point sits in an
    /// unrestricted island: no zone.  A matching-level `hole-filled` is
    /// discarded and resolution continues with the next candidate.  The
    /// layering changes with every zone update, so this is re-evaluated on
    /// each query rather than cached.
    pub fn resolve_zone(&self, p: Pt, group: &Timestep) -> Option<&Zone> {
        let mut zones: Vec<&Zone> = Vec::new();
        let mut holes: Vec<&Zone> = Vec::new();
        for z in self
            .zones
            .values()
            .filter(|z| &z.timestep == group && z.ring.contains_pt(p))
        {
            if z.kind.is_hole() {
                holes.push(z);
            } else {
                zones.push(z);
            }
        }
        zones.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then(a.ring.area().total_cmp(&b.ring.area()))
                .then(a.id.cmp(&b.id))
        });
        holes.sort_by(|a, b| b.level.cmp(&a.level).then(a.id.cmp(&b.id)));

        let mut discarded = vec![false; holes.len()];
        for z in zones {
            let matching = holes
                .iter()
                .enumerate()
                .find(|(i, h)| !discarded[*i] && h.level == z.level);
            match matching {
                Some((_, h)) if h.kind == ZoneKind::HoleEmpty => return None,
                Some((i, _)) => discarded[i] = true,
                None => return Some(z),
            }
        }
        None
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Load and register the zone batch for `timestep`, making it the
    /// authoritative one.
    pub fn load_timestep<E: TrafficControl>(
        &mut self,
        engine: &mut E,
        timestep: Timestep,
        now: SimTime,
    ) -> ZoneResult<(usize, usize)> {
        info!("loading zones for timestep {timestep}");
        let defs = self.source.load(&timestep)?;
        self.current = timestep.clone();

        let (mut loaded, mut discarded) = (0, 0);
        for def in defs {
            let (l, d) = self.register_def(engine, def, &timestep, now)?;
            loaded += l;
            discarded += d;
        }
        info!("timestep {timestep}: {loaded} zones registered, {discarded} discarded");
        Ok((loaded, discarded))
    }

    /// Register one definition, decomposing oversized shapes into parts.
    fn register_def<E: TrafficControl>(
        &mut self,
        engine: &mut E,
        def: ZoneDef,
        timestep: &Timestep,
        now: SimTime,
    ) -> ZoneResult<(usize, usize)> {
        let base = ZoneId::scoped(&def.raw_id, timestep);
        let style = PolygonStyle {
            color: def.color,
            layer: def.level as i32,
            fill: true,
        };

        if def.ring.len() < 3 {
            warn!(
                "skipping zone {base}: degenerate shape with {} vertices",
                def.ring.len()
            );
            return Ok((0, 1));
        }

        let rings = if def.ring.len() <= self.max_vertices {
            vec![def.ring.clone()]
        } else {
            warn!(
                "zone {base} has {} vertices (engine limit {}), splitting into parts",
                def.ring.len(),
                self.max_vertices
            );
            match decompose(&def.ring, self.max_vertices) {
                Ok(rings) => {
                    debug!("zone {base} split into {} parts", rings.len());
                    rings
                }
                Err(e) => {
                    warn!("skipping zone {base}: {e}");
                    return Ok((0, 1));
                }
            }
        };
        let whole = rings.len() == 1;

        let (mut loaded, mut discarded) = (0, 0);
        for (idx, ring) in rings.into_iter().enumerate() {
            let id = if whole { base.clone() } else { base.part(idx) };
            let mut zone = Zone {
                id: id.clone(),
                timestep: timestep.clone(),
                level: def.level,
                kind: def.kind,
                ring,
                edges: Default::default(),
                state: ZoneState::Pending,
                created_at: now,
                color: def.color,
            };

            engine.add_polygon(&id, &zone.ring, style)?;
            let edges = match (&def.edges, whole) {
                // Precomputed edge lists apply only to undecomposed zones;
                // parts need their own coverage query.
                (Some(pre), true) => {
                    let mut edges: Vec<EdgeId> =
                        pre.iter().filter(|e| !e.is_internal()).cloned().collect();
                    edges.sort();
                    edges
                }
                _ => map_edges(engine, &id)?,
            };

            if edges.is_empty() && def.kind == ZoneKind::Zone {
                debug!("discarding zone {id}: covers no edges");
                engine.remove_polygon(&id)?;
                discarded += 1;
                continue;
            }

            engine.set_polygon_attribute(&id, "zone_timestep", timestep.as_str())?;
            zone.edges = edges.into_iter().collect();
            zone.state = ZoneState::Active;
            self.zones.insert(id, zone);
            loaded += 1;
        }
        Ok((loaded, discarded))
    }

    /// Retire old zones: remove batches past the keep duration, hide
    /// superseded batches one update interval after their creation.
    pub fn retire<E: TrafficControl>(
        &mut self,
        engine: &mut E,
        now: SimTime,
    ) -> ZoneResult<(usize, usize)> {
        let removed = self.remove_outlived(engine, now)?;
        let hidden = self.hide_superseded(engine, now)?;
        Ok((hidden, removed))
    }

    fn remove_outlived<E: TrafficControl>(
        &mut self,
        engine: &mut E,
        now: SimTime,
    ) -> ZoneResult<usize> {
        let mut outlived: Vec<ZoneId> = self
            .zones
            .values()
            .filter(|z| z.outlived(self.keep_duration_secs, now))
            .map(|z| z.id.clone())
            .collect();
        outlived.sort();

        for id in &outlived {
            debug!("removing outlived zone {id}");
            engine.remove_polygon(id)?;
            self.zones.remove(id);
        }
        Ok(outlived.len())
    }

    fn hide_superseded<E: TrafficControl>(
        &mut self,
        engine: &mut E,
        now: SimTime,
    ) -> ZoneResult<usize> {
        let interval = self.update_interval_secs as i64;
        let mut superseded: Vec<ZoneId> = self
            .zones
            .values()
            .filter(|z| {
                z.state == ZoneState::Active
                    && z.timestep != self.current
                    && now.since(z.created_at) >= interval
            })
            .map(|z| z.id.clone())
            .collect();
        superseded.sort();

        for id in &superseded {
            debug!("hiding superseded zone {id}");
            engine.set_polygon_visible(id, false)?;
            if let Some(zone) = self.zones.get_mut(id) {
                zone.state = ZoneState::Hidden;
            }
        }
        Ok(superseded.len())
    }

    /// Full periodic update: drop outlived batches, load the batch for
    /// `now`, then hide whatever the new batch superseded.
    pub fn update<E: TrafficControl>(
        &mut self,
        engine: &mut E,
        now: SimTime,
    ) -> ZoneResult<ZoneUpdate> {
        info!("zone update at {now}");
        let removed = self.remove_outlived(engine, now)?;
        let (loaded, discarded) =
            self.load_timestep(engine, Timestep::from_sim_time(now), now)?;
        let hidden = self.hide_superseded(engine, now)?;
        Ok(ZoneUpdate {
            timestep: self.current.clone(),
            loaded,
            discarded,
            hidden,
            removed,
        })
    }
}
