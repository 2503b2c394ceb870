//! `Ring` — a closed simple polygon stored as an ordered vertex list.

use crate::{Bounds, Pt};

/// A closed polygon.  The closing edge from the last vertex back to the
/// first is implicit; construction strips an explicit closing duplicate and
/// normalizes winding to counterclockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    pts: Vec<Pt>,
}

impl Ring {
    /// Build a ring from raw vertices.
    ///
    /// Consecutive duplicate vertices and an explicit closing vertex are
    /// dropped; clockwise input is reversed.  The result may still be
    /// degenerate (fewer than 3 vertices) — callers that require a proper
    /// polygon check [`len`](Self::len).
    pub fn from_points(raw: Vec<Pt>) -> Self {
        let mut pts: Vec<Pt> = Vec::with_capacity(raw.len());
        for p in raw {
            if pts.last().is_none_or(|last| *last != p) {
                pts.push(p);
            }
        }
        if pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        let mut ring = Ring { pts };
        if ring.signed_area() < 0.0 {
            ring.pts.reverse();
        }
        ring
    }

    #[inline]
    pub fn points(&self) -> &[Pt] {
        &self.pts
    }

    /// Vertex count (closing vertex not counted).
    #[inline]
    pub fn len(&self) -> usize {
        self.pts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    /// Iterator over the ring's edges, including the closing edge.
    pub fn segments(&self) -> impl Iterator<Item = (Pt, Pt)> + '_ {
        let n = self.pts.len();
        (0..n).map(move |i| (self.pts[i], self.pts[(i + 1) % n]))
    }

    /// Twice the signed area (shoelace); positive for counterclockwise.
    fn shoelace(&self) -> f64 {
        self.segments()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
    }

    /// Signed area; positive after normalization.
    #[inline]
    pub fn signed_area(&self) -> f64 {
        self.shoelace() * 0.5
    }

    /// Absolute enclosed area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.pts)
    }

    /// Even-odd containment test.  Points exactly on the boundary may land
    /// on either side; zone layering never depends on boundary points.
    pub fn contains_pt(&self, p: Pt) -> bool {
        let mut inside = false;
        for (a, b) in self.segments() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Distance from `p` to the polygon: zero inside, otherwise the distance
    /// to the nearest boundary segment.
    pub fn distance_to_pt(&self, p: Pt) -> f64 {
        if self.contains_pt(p) {
            return 0.0;
        }
        self.segments()
            .map(|(a, b)| p.distance_to_segment(a, b))
            .fold(f64::INFINITY, f64::min)
    }
}
