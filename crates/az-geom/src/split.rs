//! Axis-aligned polygon splitting and bounded-vertex decomposition.
//!
//! The simulation engine rejects polygons above a fixed vertex count, so
//! oversized zone shapes are cut along the longer axis of their bounding box
//! and the halves recursed until every part fits.  Cutting a concave polygon
//! can produce several disconnected parts on one side; [`split_ring`] stitches
//! vertex chains across the interior intervals of the cut line so each part
//! comes back as its own ring rather than a self-touching compound.

use crate::{Axis, GeomError, GeomResult, Pt, Ring};

const NONE: usize = usize::MAX;

/// A part's bounding box must keep at least this much extent on the cut axis
/// for splitting to continue; below it the input is declared non-convergent.
const MIN_EXTENT: f64 = 1e-9;

// ── Public API ────────────────────────────────────────────────────────────────

/// Decompose `ring` into parts of at most `max_vertices` vertices each.
///
/// Returns the input unchanged (as a one-element set) when it already fits.
/// The output is an unordered set of parts whose union covers the input and
/// whose areas sum to the input's area within floating-point tolerance.
///
/// # Errors
///
/// - [`GeomError::Degenerate`] for rings with fewer than 3 vertices.
/// - [`GeomError::BudgetTooSmall`] for budgets below 3.
/// - [`GeomError::NonConvergent`] when a part still over budget has a
///   (near-)zero extent along every axis, so further cuts cannot help.
pub fn decompose(ring: &Ring, max_vertices: usize) -> GeomResult<Vec<Ring>> {
    if ring.len() < 3 {
        return Err(GeomError::Degenerate {
            vertices: ring.len(),
        });
    }
    if max_vertices < 3 {
        return Err(GeomError::BudgetTooSmall(max_vertices));
    }
    let mut parts = Vec::new();
    split_until(ring.clone(), max_vertices, &mut parts)?;
    Ok(parts)
}

fn split_until(ring: Ring, max_vertices: usize, out: &mut Vec<Ring>) -> GeomResult<()> {
    if ring.len() <= max_vertices {
        out.push(ring);
        return Ok(());
    }
    let bounds = ring.bounds();
    let axis = bounds.longer_axis();
    let (lo, hi) = bounds.range(axis);
    if hi - lo <= MIN_EXTENT {
        return Err(GeomError::NonConvergent {
            vertices: ring.len(),
        });
    }
    let Some(cut) = choose_cut(&ring, axis, lo, hi) else {
        return Err(GeomError::NonConvergent {
            vertices: ring.len(),
        });
    };
    let (below, above) = split_ring(&ring, axis, cut);
    for part in below.into_iter().chain(above) {
        if part.len() >= 3 {
            split_until(part, max_vertices, out)?;
        }
    }
    Ok(())
}

/// Pick a cut coordinate near the middle of `[lo, hi]` that no ring vertex
/// sits on, so every crossing of the cut line is transversal.
fn choose_cut(ring: &Ring, axis: Axis, lo: f64, hi: f64) -> Option<f64> {
    let span = hi - lo;
    let tol = span * 1e-9;
    for k in 0..16 {
        let c = lo + span * (0.5 + k as f64 * 1e-3);
        if c >= hi {
            break;
        }
        if ring
            .points()
            .iter()
            .all(|p| (axis.coord(*p) - c).abs() > tol)
        {
            return Some(c);
        }
    }
    None
}

// ── split_ring ────────────────────────────────────────────────────────────────

/// Cut `ring` with the line `axis == c`, returning the parts on the low side
/// and the parts on the high side.
///
/// Concave rings can yield several parts per side.  Callers should avoid cut
/// coordinates that coincide with a vertex (see [`decompose`]'s cut
/// selection); a coincident vertex is tolerated but counted on the high side.
pub fn split_ring(ring: &Ring, axis: Axis, c: f64) -> (Vec<Ring>, Vec<Ring>) {
    let pts = ring.points();
    let n = pts.len();
    let d: Vec<f64> = pts.iter().map(|p| axis.coord(*p) - c).collect();
    let low = |v: f64| v < 0.0;

    if d.iter().all(|&v| low(v)) {
        return (vec![ring.clone()], vec![]);
    }
    if d.iter().all(|&v| !low(v)) {
        return (vec![], vec![ring.clone()]);
    }

    // Walk the ring once, accumulating vertex chains per side.  Exactly one
    // chain is open at any time; a crossing closes it and opens one on the
    // other side.
    let mut crossings: Vec<f64> = Vec::new();
    let mut sides = [SideAcc::new(), SideAcc::new()];
    let side_of = |v: f64| usize::from(!low(v));

    for i in 0..n {
        let (a, b) = (pts[i], pts[(i + 1) % n]);
        let (da, db) = (d[i], d[(i + 1) % n]);
        sides[side_of(da)].push_vertex(a);
        if low(da) != low(db) {
            let t = da / (da - db);
            let p = axis.point_at(a, b, t, c);
            let cross = crossings.len();
            crossings.push(axis.along(p));
            sides[side_of(da)].close_chain(cross, p);
            sides[side_of(db)].open_chain(cross, p);
        }
    }
    let [mut lo_acc, mut hi_acc] = sides;
    lo_acc.finish();
    hi_acc.finish();

    // Crossings sorted along the cut line alternate between entering and
    // leaving the polygon interior, so consecutive sorted pairs bound the
    // interior intervals that become the parts' cut-line edges.
    let mut order: Vec<usize> = (0..crossings.len()).collect();
    order.sort_by(|&a, &b| crossings[a].total_cmp(&crossings[b]));
    let mut partner = vec![NONE; crossings.len()];
    for pair in order.chunks_exact(2) {
        partner[pair[0]] = pair[1];
        partner[pair[1]] = pair[0];
    }

    let n_cross = crossings.len();
    (
        stitch(lo_acc.chains, &partner, n_cross),
        stitch(hi_acc.chains, &partner, n_cross),
    )
}

// ── Chain accumulation ────────────────────────────────────────────────────────

struct Chain {
    pts: Vec<Pt>,
    start_cross: usize,
    end_cross: usize,
}

struct SideAcc {
    chains: Vec<Chain>,
    open: usize,
}

impl SideAcc {
    fn new() -> Self {
        Self {
            chains: Vec::new(),
            open: NONE,
        }
    }

    fn push_vertex(&mut self, p: Pt) {
        if self.open == NONE {
            self.open = self.chains.len();
            self.chains.push(Chain {
                pts: Vec::new(),
                start_cross: NONE,
                end_cross: NONE,
            });
        }
        self.chains[self.open].pts.push(p);
    }

    fn close_chain(&mut self, cross: usize, p: Pt) {
        if self.open != NONE {
            let chain = &mut self.chains[self.open];
            chain.pts.push(p);
            chain.end_cross = cross;
            self.open = NONE;
        }
    }

    fn open_chain(&mut self, cross: usize, p: Pt) {
        self.open = self.chains.len();
        self.chains.push(Chain {
            pts: vec![p],
            start_cross: cross,
            end_cross: NONE,
        });
    }

    /// Resolve the wrap-around: iteration started mid-chain, so the chain
    /// still open after the last edge is the head of this side's first chain.
    fn finish(&mut self) {
        if self.open == NONE {
            return;
        }
        let last = self.chains.len() - 1;
        if self.chains[last].start_cross == NONE {
            // Never crossed the line: the whole ring lives on this side.
            self.open = NONE;
            return;
        }
        let tail = match self.chains.pop() {
            Some(t) => t,
            None => return,
        };
        let head = &mut self.chains[0];
        let mut pts = tail.pts;
        pts.append(&mut head.pts);
        head.pts = pts;
        head.start_cross = tail.start_cross;
        self.open = NONE;
    }
}

/// Join one side's chains into closed rings by following cut-line interior
/// intervals from each chain's exit crossing to the next chain's entry.
fn stitch(mut chains: Vec<Chain>, partner: &[usize], n_cross: usize) -> Vec<Ring> {
    let mut start_of = vec![NONE; n_cross];
    for (i, chain) in chains.iter().enumerate() {
        if chain.start_cross != NONE {
            start_of[chain.start_cross] = i;
        }
    }

    let mut used = vec![false; chains.len()];
    let mut out = Vec::new();
    for i in 0..chains.len() {
        if used[i] {
            continue;
        }
        if chains[i].start_cross == NONE {
            used[i] = true;
            out.push(Ring::from_points(std::mem::take(&mut chains[i].pts)));
            continue;
        }
        let mut pts: Vec<Pt> = Vec::new();
        let mut cur = i;
        loop {
            used[cur] = true;
            let end = chains[cur].end_cross;
            pts.append(&mut chains[cur].pts);
            let entry = if end == NONE { NONE } else { partner[end] };
            if entry == NONE {
                break;
            }
            let next = start_of[entry];
            if next == NONE || next == i || used[next] {
                break;
            }
            cur = next;
        }
        let ring = Ring::from_points(pts);
        if ring.len() >= 3 {
            out.push(ring);
        }
    }
    out
}
