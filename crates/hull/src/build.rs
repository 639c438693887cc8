//! Incremental construction of a 3D convex hull from a point cloud, and
//! post-hoc vertex-removal simplification of an already-built hull.
//!
//! The construction follows the classic "QuickHull" incremental algorithm
//! (§4.2): grow from a seed tetrahedron, and for each remaining point find
//! the faces it is in front of (the *visible
//! set*), replace them with a fan of new faces to the point, relinking the
//! *horizon* — the boundary cycle between visible and non-visible faces —
//! to the new faces.

use std::collections::VecDeque;

use crate::arena::{signed_volume_sum, FaceId, HalfEdgeId, HullTopology, VertexId};
use crate::point::{Bounds, Point3};
use crate::predicates::orient3d;
use crate::simplify;
use crate::HullMesh;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    Ok,
    NotEnoughPoints,
    Coplanar,
    Degenerate,
}

#[derive(Clone, Debug, Default)]
pub struct IncrementalHull {
    points: Vec<Point3>,
    topo: HullTopology,
    /// Points already consumed as hull vertices, by index into `points`.
    used: Vec<bool>,
}

impl IncrementalHull {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_points(&mut self, points: &[Point3]) {
        self.points.extend_from_slice(points);
        self.used.resize(self.points.len(), false);
    }

    pub fn num_vertices(&self) -> usize {
        self.topo.vertices.iter().filter(|v| v.half_edge.is_some()).count()
    }

    pub fn topology(&self) -> &HullTopology {
        &self.topo
    }

    /// Sum of signed per-face tetrahedra referenced to the origin
    /// (divergence theorem), absolute value taken once at the end — the
    /// same convention as `Mesh::compute_volume` (§4.3).
    pub fn volume(&self) -> f64 {
        signed_volume_sum(&self.topo).abs() / 6.0
    }

    pub fn centroid(&self) -> Point3 {
        let live: Vec<Point3> = self
            .topo
            .vertices
            .iter()
            .filter(|v| v.half_edge.is_some())
            .map(|v| v.point)
            .collect();
        let n = (live.len().max(1)) as f64;
        let mut sum = Point3::ZERO;
        for p in live {
            sum = sum + p;
        }
        sum.scale(1.0 / n)
    }

    /// Build the hull from every point added so far, stopping early once
    /// there are no more points outside the hull, `max_vertices` would be
    /// exceeded, or the next point's pocket volume falls below
    /// `min_volume` (an absolute volume, already scaled by the caller —
    /// see DESIGN.md's resolution of the min_volume open question).
    pub fn process(&mut self, max_vertices: usize, min_volume: f64) -> ProcessResult {
        if self.points.len() < 4 {
            return ProcessResult::NotEnoughPoints;
        }

        match self.seed_tetrahedron() {
            Some(result) if result != ProcessResult::Ok => return result,
            None => return ProcessResult::Coplanar,
            _ => {}
        }

        loop {
            let Some((face, point_idx, _dist)) = self.farthest_outside_point() else { break };
            if self.topo.vertices.len() >= max_vertices {
                break;
            }

            let visible = self.visible_set(face, point_idx);
            let pocket_volume = self.pocket_volume(&visible, point_idx);
            if pocket_volume < min_volume {
                break;
            }

            if !self.insert_point(visible, point_idx) {
                return ProcessResult::Degenerate;
            }
        }

        ProcessResult::Ok
    }

    /// Choose the seed tetrahedron (§4.2): the first point, the point
    /// farthest from it, the point farthest from that line, and the point
    /// of greatest absolute signed distance from that plane.
    fn seed_tetrahedron(&mut self) -> Option<ProcessResult> {
        let pts = &self.points;
        let p0 = 0usize;

        let p1 = (1..pts.len())
            .max_by(|&a, &b| {
                (pts[a] - pts[p0]).norm().partial_cmp(&(pts[b] - pts[p0]).norm()).unwrap()
            })
            .unwrap();
        if (pts[p1] - pts[p0]).norm() == 0.0 {
            return Some(ProcessResult::Coplanar);
        }

        let line_dist = |i: usize| -> f64 {
            let ap = pts[i] - pts[p0];
            let along = (pts[p1] - pts[p0]).cross(ap);
            along.norm()
        };
        let p2 = (0..pts.len())
            .filter(|&i| i != p0 && i != p1)
            .max_by(|&a, &b| line_dist(a).partial_cmp(&line_dist(b)).unwrap())
            .unwrap();
        if line_dist(p2) == 0.0 {
            return Some(ProcessResult::Coplanar);
        }

        let normal = (pts[p1] - pts[p0]).cross(pts[p2] - pts[p0]);
        let plane_dist = |i: usize| -> f64 { normal.dot(pts[i] - pts[p0]) };
        let p3 = (0..pts.len())
            .filter(|&i| i != p0 && i != p1 && i != p2)
            .max_by(|&a, &b| plane_dist(a).abs().partial_cmp(&plane_dist(b).abs()).unwrap())?;

        let bounds = Bounds::of(pts).unwrap();
        let tol = 1e-9 * bounds.diagonal().max(1.0);
        if plane_dist(p3).abs() <= tol {
            return Some(ProcessResult::Coplanar);
        }

        let v0 = self.topo.add_vertex(pts[p0]);
        let v1 = self.topo.add_vertex(pts[p1]);
        let v2 = self.topo.add_vertex(pts[p2]);
        let v3 = self.topo.add_vertex(pts[p3]);
        for &p in &[p0, p1, p2, p3] {
            self.used[p] = true;
        }

        // Orient (v0,v1,v2) so its outward normal points away from v3.
        let (a, b, c) = if plane_dist(p3) > 0.0 { (v0, v2, v1) } else { (v0, v1, v2) };

        let f_base = self.topo.add_triangle(a, b, c);
        // Each side face reverses its shared base edge (b->a, c->b, a->c) —
        // the standard rule for a consistently outward-oriented tetrahedron:
        // every edge is traversed once in each direction by its two faces.
        let f0 = self.topo.add_triangle(b, a, v3);
        let f1 = self.topo.add_triangle(c, b, v3);
        let f2 = self.topo.add_triangle(a, c, v3);

        // Link the base face's three edges to the matching side-face edges,
        // and the side faces to each other across their shared spokes.
        let base_edges = self.topo.face_half_edges(f_base); // a->b, b->c, c->a
        let e0 = self.topo.face_half_edges(f0); // b->a, a->v3, v3->b
        let e1 = self.topo.face_half_edges(f1); // c->b, b->v3, v3->c
        let e2 = self.topo.face_half_edges(f2); // a->c, c->v3, v3->a

        self.topo.link_twins(base_edges[0], e0[0]); // a->b with b->a
        self.topo.link_twins(base_edges[1], e1[0]); // b->c with c->b
        self.topo.link_twins(base_edges[2], e2[0]); // c->a with a->c
        self.topo.link_twins(e0[1], e2[2]); // a->v3 with v3->a
        self.topo.link_twins(e0[2], e1[1]); // v3->b with b->v3
        self.topo.link_twins(e1[2], e2[1]); // v3->c with c->v3

        for i in 0..pts.len() {
            if self.used[i] {
                continue;
            }
            for &f in &[f_base, f0, f1, f2] {
                if self.dist_to_face(f, i) > 0.0 {
                    self.topo.face_mut(f).outside.push(i as u32);
                    break;
                }
            }
        }

        Some(ProcessResult::Ok)
    }

    #[inline]
    fn dist_to_face(&self, f: FaceId, point_idx: usize) -> f64 {
        let face = self.topo.face(f);
        let v0 = self.topo.face_vertices(f)[0];
        face.normal.dot(self.points[point_idx] - self.topo.point(v0))
    }

    /// The live face/point pair with globally maximal distance, breaking
    /// ties by the smaller point index for determinism.
    fn farthest_outside_point(&self) -> Option<(FaceId, usize, f64)> {
        let mut best: Option<(FaceId, usize, f64)> = None;
        for f in self.topo.live_faces() {
            let v0 = self.topo.point(self.topo.face_vertices(f)[0]);
            let Some((idx, dist)) = self.topo.face(f).farthest_outside(&self.points, v0) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, bi, bd)) => dist > bd || (dist == bd && (idx as usize) < bi),
            };
            if better {
                best = Some((f, idx as usize, dist));
            }
        }
        best
    }

    /// BFS over face adjacency from `seed`, collecting every face visible
    /// from `point_idx` (§4.2).
    fn visible_set(&self, seed: FaceId, point_idx: usize) -> Vec<FaceId> {
        let point = self.points[point_idx];
        let mut visited = vec![false; self.topo.faces.len()];
        let mut queue = VecDeque::new();
        let mut visible = Vec::new();

        visited[seed.0] = true;
        queue.push_back(seed);
        while let Some(f) = queue.pop_front() {
            visible.push(f);
            for nf in self.topo.neighbors(f) {
                if visited[nf.0] || !self.topo.face(nf).alive {
                    continue;
                }
                let [v0, v1, v2] = self.topo.face_vertices(nf);
                let a = self.topo.point(v0);
                let b = self.topo.point(v1);
                let c = self.topo.point(v2);
                if orient3d(a, b, c, point) > 0.0 {
                    visited[nf.0] = true;
                    queue.push_back(nf);
                }
            }
        }
        visible
    }

    fn pocket_volume(&self, visible: &[FaceId], point_idx: usize) -> f64 {
        let apex = self.points[point_idx];
        let mut sum = 0.0;
        for &f in visible {
            let [v0, v1, v2] = self.topo.face_vertices(f);
            let a = self.topo.point(v0);
            let b = self.topo.point(v1);
            let c = self.topo.point(v2);
            sum += orient3d(a, b, c, apex).abs() / 6.0;
        }
        sum
    }

    /// Delete the visible faces, add the new vertex, fan the horizon to it,
    /// and redistribute orphaned outside points. Returns `false` if a new
    /// face would be degenerate (near-zero area).
    fn insert_point(&mut self, visible: Vec<FaceId>, point_idx: usize) -> bool {
        let horizon = self.horizon_cycle(&visible);

        let mut orphans = Vec::new();
        for &f in &visible {
            orphans.extend(self.topo.face_mut(f).outside.drain(..));
            self.topo.kill_face(f);
        }

        let apex = self.topo.add_vertex(self.points[point_idx]);
        self.used[point_idx] = true;

        let bounds = Bounds::of(&self.points).unwrap();
        let area_tol = 1e-10 * bounds.diagonal() * bounds.diagonal();

        let mut new_faces = Vec::with_capacity(horizon.len());
        for &(a, b, outer_twin) in &horizon {
            let f = self.topo.add_triangle(a, b, apex);
            if self.topo.face(f).normal.norm() <= area_tol {
                return false;
            }
            let edges = self.topo.face_half_edges(f);
            self.topo.link_twins(edges[0], outer_twin);
            new_faces.push((f, edges));
        }
        for i in 0..new_faces.len() {
            let next = (i + 1) % new_faces.len();
            let mid_i = new_faces[i].1[1]; // b -> apex
            let top_next = new_faces[next].1[2]; // apex -> a (of next)
            self.topo.link_twins(mid_i, top_next);
        }

        for point_idx in orphans {
            if self.used[point_idx as usize] {
                continue;
            }
            for &(f, _) in &new_faces {
                if self.dist_to_face(f, point_idx as usize) > 0.0 {
                    self.topo.face_mut(f).outside.push(point_idx);
                    break;
                }
            }
        }

        true
    }

    /// Ordered cycle of `(origin, dest, twin-of-origin-edge)` triples for
    /// the horizon around `visible`.
    fn horizon_cycle(&self, visible: &[FaceId]) -> Vec<(VertexId, VertexId, HalfEdgeId)> {
        let is_visible = |f: FaceId| visible.contains(&f);

        let mut boundary: Vec<HalfEdgeId> = Vec::new();
        for &f in visible {
            for e in self.topo.face_half_edges(f) {
                let twin = self.topo.half_edge(e).twin;
                if !is_visible(self.topo.half_edge(twin).face) {
                    boundary.push(e);
                }
            }
        }

        // Stitch boundary edges into a single cycle by following "next
        // origin == this dest" (they form exactly one cycle on a closed,
        // genus-0 hull surface).
        let mut by_origin: std::collections::HashMap<usize, HalfEdgeId> =
            std::collections::HashMap::new();
        for &e in &boundary {
            by_origin.insert(self.topo.half_edge(e).origin.0, e);
        }

        let mut ordered = Vec::with_capacity(boundary.len());
        if let Some(&start) = boundary.first() {
            let mut current = start;
            loop {
                let he = self.topo.half_edge(current);
                let dest = self.topo.half_edge(he.twin).origin;
                ordered.push((he.origin, dest, he.twin));
                if dest == self.topo.half_edge(start).origin {
                    break;
                }
                current = *by_origin.get(&dest.0).expect("horizon is not a closed cycle");
            }
        }
        ordered
    }

    /// Read the hull back out as an indexed triangle mesh, compacting over
    /// tombstoned vertices.
    pub fn get_mesh(&self) -> HullMesh {
        let mut remap = vec![None; self.topo.vertices.len()];
        let mut points = Vec::new();
        for (i, v) in self.topo.vertices.iter().enumerate() {
            if v.half_edge.is_some() {
                remap[i] = Some(points.len() as u32);
                points.push(v.point);
            }
        }

        let mut triangles = Vec::new();
        for f in self.topo.live_faces() {
            let [v0, v1, v2] = self.topo.face_vertices(f);
            triangles.push([
                remap[v0.0].expect("live face references a dead vertex"),
                remap[v1.0].expect("live face references a dead vertex"),
                remap[v2.0].expect("live face references a dead vertex"),
            ]);
        }

        HullMesh { points, triangles }
    }

    /// Simplify the already-built hull to at most `max_vertices` vertices
    /// (§4.2), refusing any single edge collapse whose pocket volume would
    /// exceed `min_volume` (an absolute volume, already scaled by the
    /// caller) or whose result is non-convex. A no-op if the hull already
    /// has `max_vertices` or fewer vertices.
    pub fn simplify(&mut self, max_vertices: usize, min_volume: f64) {
        self.topo = simplify::simplify(&self.topo, max_vertices, min_volume);
    }
}
