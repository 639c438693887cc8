//! Flat-array half-edge topology for a closed, triangulated hull surface.
//!
//! Faces, half-edges and vertices live in three owning `Vec`s and are
//! addressed by index (`VertexId`, `HalfEdgeId`, `FaceId`) rather than
//! through mutually-pointing heap structures rather than cyclic
//! face/edge/vertex pointers. Every face here has exactly three
//! half-edges (the hull is always triangulated), so `next`/`prev` within a
//! face is a trivial rotation; `twin` is the only link that crosses faces.

use crate::point::Point3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfEdgeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub usize);

#[derive(Clone, Debug)]
pub struct Vertex {
    pub point: Point3,
    /// Any half-edge leaving this vertex; `None` once the vertex is deleted.
    pub half_edge: Option<HalfEdgeId>,
}

#[derive(Clone, Copy, Debug)]
pub struct HalfEdge {
    pub origin: VertexId,
    pub twin: HalfEdgeId,
    pub next: HalfEdgeId,
    pub prev: HalfEdgeId,
    pub face: FaceId,
}

#[derive(Clone, Debug)]
pub struct Face {
    pub half_edge: HalfEdgeId,
    /// Indices into the hull builder's point pool that are outside this
    /// face and not yet assigned to the hull (the "conflict list").
    pub outside: Vec<u32>,
    /// Outward normal, `(v1-v0) x (v2-v0)`, not normalized.
    pub normal: Point3,
    pub alive: bool,
}

impl Face {
    #[inline]
    pub fn farthest_outside(&self, points: &[Point3], v0: Point3) -> Option<(u32, f64)> {
        self.outside
            .iter()
            .map(|&idx| {
                let dist = self.normal.dot(points[idx as usize] - v0);
                (idx, dist)
            })
            .max_by(|(ai, a), (bi, b)| a.partial_cmp(b).unwrap().then(bi.cmp(ai)))
    }
}

/// Owning arena of vertices/half-edges/faces for one convex hull under
/// construction. All three element kinds are tombstoned (`alive = false` /
/// `half_edge = None`) rather than physically removed, so existing indices
/// stay valid across edits.
#[derive(Clone, Debug, Default)]
pub struct HullTopology {
    pub vertices: Vec<Vertex>,
    pub half_edges: Vec<HalfEdge>,
    pub faces: Vec<Face>,
}

impl HullTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex { point, half_edge: None });
        id
    }

    #[inline]
    pub fn point(&self, v: VertexId) -> Point3 {
        self.vertices[v.0].point
    }

    #[inline]
    pub fn half_edge(&self, e: HalfEdgeId) -> HalfEdge {
        self.half_edges[e.0]
    }

    #[inline]
    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f.0]
    }

    #[inline]
    pub fn face_mut(&mut self, f: FaceId) -> &mut Face {
        &mut self.faces[f.0]
    }

    /// Add a new triangular face over `(v0, v1, v2)` in the given winding
    /// order (its normal is `(v1-v0) x (v2-v0)`). Does not link twins —
    /// callers link the three new half-edges to their neighbors afterward.
    pub fn add_triangle(&mut self, v0: VertexId, v1: VertexId, v2: VertexId) -> FaceId {
        let face_id = FaceId(self.faces.len());
        let base = self.half_edges.len();
        let e0 = HalfEdgeId(base);
        let e1 = HalfEdgeId(base + 1);
        let e2 = HalfEdgeId(base + 2);

        self.half_edges.push(HalfEdge { origin: v0, twin: e0, next: e1, prev: e2, face: face_id });
        self.half_edges.push(HalfEdge { origin: v1, twin: e1, next: e2, prev: e0, face: face_id });
        self.half_edges.push(HalfEdge { origin: v2, twin: e2, next: e0, prev: e1, face: face_id });

        self.vertices[v0.0].half_edge.get_or_insert(e0);
        self.vertices[v1.0].half_edge.get_or_insert(e1);
        self.vertices[v2.0].half_edge.get_or_insert(e2);

        let p0 = self.point(v0);
        let p1 = self.point(v1);
        let p2 = self.point(v2);
        let normal = (p1 - p0).cross(p2 - p0);

        self.faces.push(Face { half_edge: e0, outside: Vec::new(), normal, alive: true });
        face_id
    }

    #[inline]
    pub fn link_twins(&mut self, a: HalfEdgeId, b: HalfEdgeId) {
        self.half_edges[a.0].twin = b;
        self.half_edges[b.0].twin = a;
    }

    /// The three vertices of a face, in winding order starting at
    /// `face.half_edge`.
    pub fn face_vertices(&self, f: FaceId) -> [VertexId; 3] {
        let e0 = self.faces[f.0].half_edge;
        let e1 = self.half_edges[e0.0].next;
        let e2 = self.half_edges[e1.0].next;
        [self.half_edges[e0.0].origin, self.half_edges[e1.0].origin, self.half_edges[e2.0].origin]
    }

    /// The three half-edges of a face, in winding order.
    pub fn face_half_edges(&self, f: FaceId) -> [HalfEdgeId; 3] {
        let e0 = self.faces[f.0].half_edge;
        let e1 = self.half_edges[e0.0].next;
        let e2 = self.half_edges[e1.0].next;
        [e0, e1, e2]
    }

    /// The face across each edge of `f` (`None` if the twin was never
    /// linked, which should not happen on a closed hull).
    pub fn neighbors(&self, f: FaceId) -> [FaceId; 3] {
        let edges = self.face_half_edges(f);
        edges.map(|e| self.half_edges[self.half_edges[e.0].twin.0].face)
    }

    pub fn kill_face(&mut self, f: FaceId) {
        self.faces[f.0].alive = false;
        self.faces[f.0].outside.clear();
    }

    pub fn live_faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId).filter(|&f| self.faces[f.0].alive)
    }

    pub fn num_live_faces(&self) -> usize {
        self.faces.iter().filter(|f| f.alive).count()
    }

    /// Rebuild a fresh, fully twin-linked topology from an explicit triangle
    /// soup. Used to materialize the result of simplification (§4.2), which
    /// works on a plain `Vec<[VertexId; 3]>` face list rather than editing
    /// half-edges in place.
    ///
    /// Every directed edge `(a, b)` of a triangle must have exactly one
    /// matching reverse `(b, a)` elsewhere in `triangles` — true for any
    /// closed, consistently-wound triangulation such as a convex hull.
    pub fn from_triangles(points: &[Point3], triangles: &[[VertexId; 3]]) -> HullTopology {
        let mut topo = HullTopology::new();
        for &p in points {
            topo.add_vertex(p);
        }

        let mut faces = Vec::with_capacity(triangles.len());
        for &[a, b, c] in triangles {
            faces.push(topo.add_triangle(a, b, c));
        }

        let mut by_directed_edge: std::collections::HashMap<(VertexId, VertexId), HalfEdgeId> =
            std::collections::HashMap::new();
        for &f in &faces {
            for e in topo.face_half_edges(f) {
                let he = topo.half_edge(e);
                let dest = topo.half_edge(he.next).origin;
                by_directed_edge.insert((he.origin, dest), e);
            }
        }
        for &f in &faces {
            for e in topo.face_half_edges(f) {
                let he = topo.half_edge(e);
                let dest = topo.half_edge(he.next).origin;
                if let Some(&twin) = by_directed_edge.get(&(dest, he.origin)) {
                    topo.half_edges[e.0].twin = twin;
                }
            }
        }

        topo
    }
}

/// Sum of signed per-face tetrahedra referenced to the origin (divergence
/// theorem); callers take the absolute value once at the end.
pub(crate) fn signed_volume_sum(topo: &HullTopology) -> f64 {
    let mut sum = 0.0;
    for f in topo.live_faces() {
        let [v0, v1, v2] = topo.face_vertices(f);
        let p0 = topo.point(v0);
        let p1 = topo.point(v1);
        let p2 = topo.point(v2);
        sum += p0.dot(p1.cross(p2));
    }
    sum
}
