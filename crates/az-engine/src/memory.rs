//! `MemoryEngine` — an in-memory reference implementation of
//! [`TrafficControl`].
//!
//! Deliberately small: vehicles hop one edge per step, speed is the edge's
//! base speed, and routing is Dijkstra over per-vehicle adapted travel
//! times.  That is enough to exercise every consumer of the control channel
//! (registry, rerouter, exposure tracker) without re-implementing a traffic
//! simulator.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over edge-geometry segments backs the radius-0
//! polygon coverage query: the polygon's bounding box prefilters candidate
//! segments, then an exact containment test decides coverage.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::debug;
use rstar::{RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use az_core::{EdgeId, SimTime, VehicleId, ZoneId};
use az_geom::{Pt, Ring};

use crate::{Color, EngineError, EngineResult, PolygonStyle, TrafficControl};

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// One edge-geometry segment in the spatial index.
struct SegmentEntry {
    envelope: AABB<[f64; 2]>,
    edge: usize,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

// ── Internal records ──────────────────────────────────────────────────────────

struct MemEdge {
    id: EdgeId,
    from: usize,
    to: usize,
    shape: Vec<Pt>,
    length: f64,
    /// Base travel time in seconds.
    travel_time: f64,
}

impl MemEdge {
    /// The point halfway along the edge's geometry, used as the position of
    /// any vehicle on it.
    fn midpoint(&self) -> Pt {
        let n = self.shape.len();
        if n % 2 == 1 {
            return self.shape[n / 2];
        }
        let (a, b) = (self.shape[n / 2 - 1], self.shape[n / 2]);
        Pt::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
    }
}

struct MemPolygon {
    ring: Ring,
    style: PolygonStyle,
    visible: bool,
    attributes: FxHashMap<String, String>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum VehicleState {
    Scheduled,
    Active,
    Arrived,
}

struct MemVehicle {
    route: Vec<EdgeId>,
    index: usize,
    depart: SimTime,
    state: VehicleState,
    color: Color,
    overrides: FxHashMap<EdgeId, f64>,
}

// ── MemoryEngine ──────────────────────────────────────────────────────────────

/// In-memory [`TrafficControl`] implementation.  Construct via
/// [`MemoryEngineBuilder`].
pub struct MemoryEngine {
    nodes: Vec<Pt>,
    edges: Vec<MemEdge>,
    edge_index: FxHashMap<EdgeId, usize>,
    /// Outgoing edge indices per node.
    out_edges: Vec<Vec<usize>>,
    segment_tree: RTree<SegmentEntry>,

    polygons: FxHashMap<ZoneId, MemPolygon>,
    vehicles: FxHashMap<VehicleId, MemVehicle>,

    last_loaded: Vec<VehicleId>,
    last_departed: Vec<VehicleId>,
    last_arrived: Vec<VehicleId>,
    closed: bool,
}

impl MemoryEngine {
    fn edge(&self, id: &EdgeId) -> EngineResult<&MemEdge> {
        self.edge_index
            .get(id)
            .map(|&i| &self.edges[i])
            .ok_or_else(|| EngineError::UnknownEdge(id.clone()))
    }

    fn polygon(&self, id: &ZoneId) -> EngineResult<&MemPolygon> {
        self.polygons
            .get(id)
            .ok_or_else(|| EngineError::UnknownPolygon(id.clone()))
    }

    fn active(&self, id: &VehicleId) -> EngineResult<&MemVehicle> {
        self.vehicles
            .get(id)
            .filter(|v| v.state == VehicleState::Active)
            .ok_or_else(|| EngineError::UnknownVehicle(id.clone()))
    }

    /// Edge the vehicle currently occupies.
    fn current_edge_of(&self, v: &MemVehicle, id: &VehicleId) -> EngineResult<usize> {
        let eid = v
            .route
            .get(v.index)
            .ok_or_else(|| EngineError::UnknownVehicle(id.clone()))?;
        self.edge_index
            .get(eid)
            .copied()
            .ok_or_else(|| EngineError::UnknownEdge(eid.clone()))
    }

    /// `true` if any part of the segment-sampled edge geometry lies inside
    /// the ring.
    fn edge_covered(&self, edge: &MemEdge, ring: &Ring) -> bool {
        edge.shape.iter().any(|&p| ring.contains_pt(p))
            || edge.shape.windows(2).any(|w| {
                let mid = Pt::new((w[0].x + w[1].x) * 0.5, (w[0].y + w[1].y) * 0.5);
                ring.contains_pt(mid)
            })
    }

    /// Dijkstra over adapted travel times from `start_node` to the entry
    /// node of `dest_edge`.  Returns the edge path, excluding `dest_edge`.
    fn shortest_path(
        &self,
        start_node: usize,
        dest_node: usize,
        overrides: &FxHashMap<EdgeId, f64>,
    ) -> Option<Vec<usize>> {
        if start_node == dest_node {
            return Some(Vec::new());
        }

        let n = self.nodes.len();
        // dist[v] = best known cost (ms) to reach v.
        let mut dist = vec![u64::MAX; n];
        // prev_edge[v] = edge index that reached v.
        let mut prev_edge = vec![usize::MAX; n];
        dist[start_node] = 0;

        // Min-heap: (cost, node). Reverse makes BinaryHeap behave as min-heap;
        // the node index is a deterministic tie-breaker.
        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
        heap.push(Reverse((0, start_node)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == dest_node {
                return Some(self.reconstruct(prev_edge, dest_node));
            }
            if cost > dist[node] {
                continue;
            }
            for &e in &self.out_edges[node] {
                let edge = &self.edges[e];
                let travel = overrides
                    .get(&edge.id)
                    .copied()
                    .unwrap_or(edge.travel_time);
                let cost_ms = (travel.max(0.0) * 1_000.0) as u64;
                let next_cost = cost.saturating_add(cost_ms);
                if next_cost < dist[edge.to] {
                    dist[edge.to] = next_cost;
                    prev_edge[edge.to] = e;
                    heap.push(Reverse((next_cost, edge.to)));
                }
            }
        }
        None
    }

    fn reconstruct(&self, prev_edge: Vec<usize>, to: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cur = to;
        loop {
            let e = prev_edge[cur];
            if e == usize::MAX {
                break;
            }
            path.push(e);
            cur = self.edges[e].from;
        }
        path.reverse();
        path
    }

    // ── Inspection (not part of the control channel) ──────────────────────

    pub fn has_polygon(&self, id: &ZoneId) -> bool {
        self.polygons.contains_key(id)
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn polygon_visible(&self, id: &ZoneId) -> Option<bool> {
        self.polygons.get(id).map(|p| p.visible)
    }

    pub fn polygon_style(&self, id: &ZoneId) -> Option<PolygonStyle> {
        self.polygons.get(id).map(|p| p.style)
    }

    pub fn polygon_attribute(&self, id: &ZoneId, key: &str) -> Option<&str> {
        self.polygons
            .get(id)
            .and_then(|p| p.attributes.get(key))
            .map(String::as_str)
    }

    pub fn adapted_travel_time(&self, vehicle: &VehicleId, edge: &EdgeId) -> Option<f64> {
        self.vehicles
            .get(vehicle)
            .and_then(|v| v.overrides.get(edge))
            .copied()
    }

    pub fn vehicle_color(&self, id: &VehicleId) -> Option<Color> {
        self.vehicles.get(id).map(|v| v.color)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl TrafficControl for MemoryEngine {
    // ── Polygons ──────────────────────────────────────────────────────────

    fn add_polygon(
        &mut self,
        id: &ZoneId,
        shape: &Ring,
        style: PolygonStyle,
    ) -> EngineResult<()> {
        self.polygons.insert(
            id.clone(),
            MemPolygon {
                ring: shape.clone(),
                style,
                visible: style.fill,
                attributes: FxHashMap::default(),
            },
        );
        Ok(())
    }

    fn remove_polygon(&mut self, id: &ZoneId) -> EngineResult<()> {
        self.polygons
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::UnknownPolygon(id.clone()))
    }

    fn set_polygon_visible(&mut self, id: &ZoneId, visible: bool) -> EngineResult<()> {
        let polygon = self
            .polygons
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownPolygon(id.clone()))?;
        polygon.visible = visible;
        Ok(())
    }

    fn set_polygon_attribute(&mut self, id: &ZoneId, key: &str, value: &str) -> EngineResult<()> {
        let polygon = self
            .polygons
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownPolygon(id.clone()))?;
        polygon.attributes.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn edges_covering(&self, id: &ZoneId) -> EngineResult<Vec<EdgeId>> {
        let ring = &self.polygon(id)?.ring;
        let b = ring.bounds();
        let envelope = AABB::from_corners([b.min_x, b.min_y], [b.max_x, b.max_y]);

        let mut covered: Vec<usize> = self
            .segment_tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.edge)
            .collect();
        covered.sort_unstable();
        covered.dedup();

        let mut result: Vec<EdgeId> = covered
            .into_iter()
            .filter(|&e| self.edge_covered(&self.edges[e], ring))
            .map(|e| self.edges[e].id.clone())
            .collect();
        result.sort();
        Ok(result)
    }

    fn vehicles_near_polygon(&self, id: &ZoneId, radius: f64) -> EngineResult<Vec<VehicleId>> {
        let ring = &self.polygon(id)?.ring;
        let bounds = ring.bounds();
        let mut near: Vec<VehicleId> = self
            .vehicles
            .iter()
            .filter(|(_, v)| v.state == VehicleState::Active)
            .filter_map(|(vid, v)| {
                let e = self.current_edge_of(v, vid).ok()?;
                let pos = self.edges[e].midpoint();
                // Bounding-box rejection before the exact boundary distance.
                if bounds.distance_to(pos) > radius {
                    return None;
                }
                (ring.distance_to_pt(pos) <= radius).then(|| vid.clone())
            })
            .collect();
        near.sort();
        Ok(near)
    }

    // ── Vehicles ──────────────────────────────────────────────────────────

    fn vehicle_position(&self, id: &VehicleId) -> EngineResult<Pt> {
        let v = self.active(id)?;
        let e = self.current_edge_of(v, id)?;
        Ok(self.edges[e].midpoint())
    }

    fn vehicle_speed(&self, id: &VehicleId) -> EngineResult<f64> {
        let v = self.active(id)?;
        let e = self.current_edge_of(v, id)?;
        let edge = &self.edges[e];
        Ok(if edge.travel_time > 0.0 {
            edge.length / edge.travel_time
        } else {
            0.0
        })
    }

    fn vehicle_route(&self, id: &VehicleId) -> EngineResult<Vec<EdgeId>> {
        Ok(self.active(id)?.route.clone())
    }

    fn vehicle_route_index(&self, id: &VehicleId) -> EngineResult<usize> {
        Ok(self.active(id)?.index)
    }

    fn set_adapted_travel_time(
        &mut self,
        vehicle: &VehicleId,
        edge: &EdgeId,
        travel_time: f64,
    ) -> EngineResult<()> {
        self.edge(edge)?;
        let v = self
            .vehicles
            .get_mut(vehicle)
            .ok_or_else(|| EngineError::UnknownVehicle(vehicle.clone()))?;
        v.overrides.insert(edge.clone(), travel_time);
        Ok(())
    }

    fn reroute_by_travel_time(&mut self, vehicle: &VehicleId) -> EngineResult<()> {
        let v = self.active(vehicle)?;
        let cur = self.current_edge_of(v, vehicle)?;
        let dest_id = v
            .route
            .last()
            .ok_or_else(|| EngineError::UnknownVehicle(vehicle.clone()))?;
        let dest = self
            .edge_index
            .get(dest_id)
            .copied()
            .ok_or_else(|| EngineError::UnknownEdge(dest_id.clone()))?;
        if cur == dest {
            return Ok(());
        }

        let path = self
            .shortest_path(self.edges[cur].to, self.edges[dest].from, &v.overrides)
            .ok_or_else(|| EngineError::NoRoute {
                vehicle: vehicle.clone(),
            })?;

        let index = v.index;
        let mut route: Vec<EdgeId> = v.route[..=index].to_vec();
        route.extend(path.into_iter().map(|e| self.edges[e].id.clone()));
        route.push(self.edges[dest].id.clone());
        debug!("vehicle {vehicle} rerouted onto {} edges", route.len());

        if let Some(v) = self.vehicles.get_mut(vehicle) {
            v.route = route;
        }
        Ok(())
    }

    fn set_vehicle_color(&mut self, id: &VehicleId, color: Color) -> EngineResult<()> {
        let v = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownVehicle(id.clone()))?;
        v.color = color;
        Ok(())
    }

    fn remove_vehicle(&mut self, id: &VehicleId) -> EngineResult<()> {
        self.vehicles
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::UnknownVehicle(id.clone()))
    }

    // ── Step-level queries ────────────────────────────────────────────────

    fn loaded_vehicles(&self) -> Vec<VehicleId> {
        self.last_loaded
            .iter()
            .filter(|v| self.vehicles.contains_key(v))
            .cloned()
            .collect()
    }

    fn departed_vehicles(&self) -> Vec<VehicleId> {
        self.last_departed
            .iter()
            .filter(|v| self.vehicles.contains_key(v))
            .cloned()
            .collect()
    }

    fn arrived_vehicles(&self) -> Vec<VehicleId> {
        self.last_arrived.clone()
    }

    fn active_vehicles(&self) -> Vec<VehicleId> {
        let mut ids: Vec<VehicleId> = self
            .vehicles
            .iter()
            .filter(|(_, v)| v.state == VehicleState::Active)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn expected_vehicle_count(&self) -> usize {
        self.vehicles
            .values()
            .filter(|v| v.state != VehicleState::Arrived)
            .count()
    }

    fn advance(&mut self, now: SimTime) -> EngineResult<()> {
        // Arrived vehicles were reported last step; forget them now.
        self.vehicles
            .retain(|_, v| v.state != VehicleState::Arrived);
        self.last_loaded.clear();
        self.last_departed.clear();
        self.last_arrived.clear();

        let mut ids: Vec<VehicleId> = self.vehicles.keys().cloned().collect();
        ids.sort();

        for id in ids {
            let Some(v) = self.vehicles.get_mut(&id) else {
                continue;
            };
            match v.state {
                VehicleState::Scheduled if v.depart <= now => {
                    v.state = VehicleState::Active;
                    v.index = 0;
                    self.last_loaded.push(id.clone());
                    self.last_departed.push(id);
                }
                VehicleState::Active => {
                    if v.index + 1 < v.route.len() {
                        v.index += 1;
                    } else {
                        v.state = VehicleState::Arrived;
                        self.last_arrived.push(id);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

// ── MemoryEngineBuilder ───────────────────────────────────────────────────────

/// Construct a [`MemoryEngine`] incrementally, then call
/// [`build`](Self::build).
///
/// # Example
///
/// ```
/// use az_core::{EdgeId, SimTime, VehicleId};
/// use az_geom::Pt;
/// use az_engine::MemoryEngineBuilder;
///
/// let mut b = MemoryEngineBuilder::new();
/// let a = b.add_node(Pt::new(0.0, 0.0));
/// let c = b.add_node(Pt::new(100.0, 0.0));
/// b.add_edge("e1", a, c, 10.0);
/// b.add_vehicle("veh_0", vec![EdgeId::new("e1")], SimTime::ZERO);
/// let engine = b.build();
/// ```
pub struct MemoryEngineBuilder {
    nodes: Vec<Pt>,
    edges: Vec<MemEdge>,
    vehicles: Vec<(VehicleId, Vec<EdgeId>, SimTime)>,
}

impl MemoryEngineBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            vehicles: Vec::new(),
        }
    }

    /// Add a junction at `pos` and return its index.
    pub fn add_node(&mut self, pos: Pt) -> usize {
        self.nodes.push(pos);
        self.nodes.len() - 1
    }

    /// Add a directed edge with a straight-line geometry between its nodes.
    pub fn add_edge(&mut self, id: &str, from: usize, to: usize, travel_time: f64) {
        let shape = vec![self.nodes[from], self.nodes[to]];
        self.add_edge_with_shape(id, from, to, travel_time, shape);
    }

    /// Add a directed edge with explicit polyline geometry.
    pub fn add_edge_with_shape(
        &mut self,
        id: &str,
        from: usize,
        to: usize,
        travel_time: f64,
        shape: Vec<Pt>,
    ) {
        let length = shape.windows(2).map(|w| w[0].distance(w[1])).sum();
        self.edges.push(MemEdge {
            id: EdgeId::new(id),
            from,
            to,
            shape,
            length,
            travel_time,
        });
    }

    /// Schedule a vehicle to depart at `depart` along `route`.
    pub fn add_vehicle(&mut self, id: &str, route: Vec<EdgeId>, depart: SimTime) {
        self.vehicles.push((VehicleId::new(id), route, depart));
    }

    /// Consume the builder and produce a ready [`MemoryEngine`].
    pub fn build(self) -> MemoryEngine {
        let mut out_edges = vec![Vec::new(); self.nodes.len()];
        let mut edge_index = FxHashMap::default();
        for (i, edge) in self.edges.iter().enumerate() {
            out_edges[edge.from].push(i);
            edge_index.insert(edge.id.clone(), i);
        }

        let entries: Vec<SegmentEntry> = self
            .edges
            .iter()
            .enumerate()
            .flat_map(|(i, edge)| {
                edge.shape.windows(2).map(move |w| SegmentEntry {
                    envelope: AABB::from_corners(
                        [w[0].x.min(w[1].x), w[0].y.min(w[1].y)],
                        [w[0].x.max(w[1].x), w[0].y.max(w[1].y)],
                    ),
                    edge: i,
                })
            })
            .collect();
        let segment_tree = RTree::bulk_load(entries);

        let vehicles = self
            .vehicles
            .into_iter()
            .map(|(id, route, depart)| {
                (
                    id,
                    MemVehicle {
                        route,
                        index: 0,
                        depart,
                        state: VehicleState::Scheduled,
                        color: Color::default(),
                        overrides: FxHashMap::default(),
                    },
                )
            })
            .collect();

        MemoryEngine {
            nodes: self.nodes,
            edges: self.edges,
            edge_index,
            out_edges,
            segment_tree,
            polygons: FxHashMap::default(),
            vehicles,
            last_loaded: Vec::new(),
            last_departed: Vec::new(),
            last_arrived: Vec::new(),
            closed: false,
        }
    }
}

impl Default for MemoryEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
