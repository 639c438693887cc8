//! `Hull` (§3): an owning mesh plus the volume and centroid the merger's
//! cost function and the compute entry point's output both need, cached
//! rather than recomputed on every lookup.

use crate::geometry::Vector3;
use crate::mesh::Mesh;

#[derive(Clone, Debug, PartialEq)]
pub struct Hull {
    pub mesh: Mesh,
    pub volume: f64,
    pub centroid: Vector3,
}

impl Hull {
    pub fn from_mesh(mesh: Mesh) -> Hull {
        let volume = mesh.compute_volume();
        let centroid = mesh.centroid();
        Hull { mesh, volume, centroid }
    }
}
