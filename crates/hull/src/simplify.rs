//! Vertex-count reduction for an already-built convex hull (§4.2).
//!
//! Works on a plain triangle-soup view of the hull rather than editing the
//! half-edge arena in place: each iteration collapses one edge by deleting
//! a vertex and re-pointing its incident faces at the edge's surviving
//! endpoint, then re-derives a fresh, fully twin-linked `HullTopology` (see
//! `HullTopology::from_triangles`). Simpler to get right than in-place
//! half-edge surgery, and the vertex counts this runs over (tens to a few
//! hundred) make the extra rebuild cost a non-issue.

use std::collections::HashSet;

use crate::arena::{signed_volume_sum, HullTopology, VertexId};
use crate::point::Point3;
use crate::predicates::orient3d;

struct Working {
    points: Vec<Point3>,
    /// `None` once a vertex has been collapsed away.
    alive: Vec<bool>,
    faces: Vec<[VertexId; 3]>,
}

impl Working {
    fn from_topology(topo: &HullTopology) -> Working {
        let points = topo.vertices.iter().map(|v| v.point).collect();
        let alive = topo.vertices.iter().map(|v| v.half_edge.is_some()).collect();
        let faces = topo.live_faces().map(|f| topo.face_vertices(f)).collect();
        Working { points, alive, faces }
    }

    fn num_vertices(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    fn volume(&self) -> f64 {
        let mut sum = 0.0;
        for &[a, b, c] in &self.faces {
            let pa = self.points[a.0];
            let pb = self.points[b.0];
            let pc = self.points[c.0];
            sum += pa.dot(pb.cross(pc));
        }
        sum.abs() / 6.0
    }

    /// Undirected edges that bound exactly two faces — every edge of a
    /// closed hull.
    fn candidate_edges(&self) -> Vec<(VertexId, VertexId)> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for &[a, b, c] in &self.faces {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                let key = if u.0 < v.0 { (u, v) } else { (v, u) };
                if seen.insert(key) {
                    edges.push(key);
                }
            }
        }
        edges
    }

    /// Try collapsing `removed` into `kept`: every face containing
    /// `removed` gets it replaced by `kept`; the (up to two) faces that
    /// would become degenerate (repeating `kept`) are dropped instead.
    /// Returns the trial face list and its volume, or `None` if the
    /// collapse is structurally invalid (shouldn't happen on a manifold
    /// hull, but guards against surprises).
    fn trial_faces(&self, removed: VertexId, kept: VertexId) -> Option<Vec<[VertexId; 3]>> {
        let mut trial = Vec::with_capacity(self.faces.len());
        for &[a, b, c] in &self.faces {
            let sub = |x: VertexId| if x == removed { kept } else { x };
            let (na, nb, nc) = (sub(a), sub(b), sub(c));
            if na == nb || nb == nc || nc == na {
                continue;
            }
            trial.push([na, nb, nc]);
        }
        if trial.len() + 2 != self.faces.len() {
            // A well-formed manifold edge has exactly two incident faces,
            // both of which must degenerate under the substitution.
            return None;
        }
        Some(trial)
    }

    /// All points still alive except `excluded`, for the post-collapse
    /// convexity check.
    fn convex_after(&self, trial: &[[VertexId; 3]], excluded: VertexId) -> bool {
        let tol = 1e-9 * bounding_diagonal(&self.points, &self.alive).max(1.0);
        for &[a, b, c] in trial {
            let (pa, pb, pc) = (self.points[a.0], self.points[b.0], self.points[c.0]);
            for (i, alive) in self.alive.iter().enumerate() {
                if !alive || i == excluded.0 || i == a.0 || i == b.0 || i == c.0 {
                    continue;
                }
                let q = self.points[i];
                if orient3d(pa, pb, pc, q) > tol {
                    return false;
                }
            }
        }
        true
    }

    fn apply(&mut self, removed: VertexId, trial: Vec<[VertexId; 3]>) {
        self.alive[removed.0] = false;
        self.faces = trial;
    }

    fn to_topology(&self) -> HullTopology {
        HullTopology::from_triangles(&self.points, &self.faces)
    }
}

fn bounding_diagonal(points: &[Point3], alive: &[bool]) -> f64 {
    let live: Vec<Point3> =
        points.iter().zip(alive).filter(|(_, &a)| a).map(|(&p, _)| p).collect();
    crate::point::Bounds::of(&live).map(|b| b.diagonal()).unwrap_or(0.0)
}

pub(crate) fn simplify(topo: &HullTopology, max_vertices: usize, min_volume: f64) -> HullTopology {
    let mut work = Working::from_topology(topo);
    if work.num_vertices() <= max_vertices {
        return topo.clone();
    }

    loop {
        if work.num_vertices() <= max_vertices {
            break;
        }
        let current_volume = work.volume();

        let mut best: Option<(f64, VertexId, VertexId, Vec<[VertexId; 3]>)> = None;
        for (u, v) in work.candidate_edges() {
            for (removed, kept) in [(u, v), (v, u)] {
                let Some(trial) = work.trial_faces(removed, kept) else { continue };
                if trial.is_empty() {
                    continue;
                }
                let trial_volume: f64 = {
                    let mut sum = 0.0;
                    for &[a, b, c] in &trial {
                        let pa = work.points[a.0];
                        let pb = work.points[b.0];
                        let pc = work.points[c.0];
                        sum += pa.dot(pb.cross(pc));
                    }
                    sum.abs() / 6.0
                };
                let pocket = (current_volume - trial_volume).abs();
                if pocket > min_volume {
                    continue;
                }
                if !work.convex_after(&trial, removed) {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some((bp, br, bk, _)) => {
                        pocket < *bp
                            || (pocket == *bp
                                && (removed.0, kept.0) < (br.0, bk.0))
                    }
                };
                if better {
                    best = Some((pocket, removed, kept, trial));
                }
            }
        }

        let Some((_, removed, _, trial)) = best else { break };
        work.apply(removed, trial);
    }

    let rebuilt = work.to_topology();
    debug_assert!(signed_volume_sum(&rebuilt).abs() > 0.0 || work.num_vertices() < 4);
    rebuilt
}
