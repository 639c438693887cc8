//! Incremental 3D convex hull construction and simplification.
//!
//! Self-contained: this crate knows nothing about voxels, meshes with
//! triangle connectivity beyond its own output, or the decomposition
//! pipeline that consumes it. It exposes exactly the operations the
//! "Incremental Convex Hull" component (C2) needs: build a hull
//! incrementally from a point cloud (`IncrementalHull::process`), read it
//! back out as an indexed triangle mesh (`IncrementalHull::get_mesh`), and
//! simplify an already-built hull down to a vertex budget
//! (`IncrementalHull::simplify`).

pub mod arena;
pub mod build;
pub mod point;
pub mod predicates;
mod simplify;

pub use arena::{FaceId, HalfEdgeId, HullTopology, VertexId};
pub use build::{IncrementalHull, ProcessResult};
pub use point::{Bounds, Point3};
pub use predicates::{orient3d, orient3d_sign};

/// An indexed triangle mesh read back out of a `HullTopology`: the format
/// every consumer of this crate (mesh clipping, the merger, the simplifier)
/// actually wants, as opposed to the half-edge arena used internally.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HullMesh {
    pub points: Vec<Point3>,
    pub triangles: Vec<[u32; 3]>,
}
