//! `Part` (§3): a work-in-progress piece of the decomposition, owning its
//! primitive set and the convex hull computed over it.

use anyhow::Result;

use crate::mesh::Mesh;
use crate::volume::PrimitiveSet;

pub struct Part {
    pub primitives: PrimitiveSet,
    pub hull: Mesh,
    pub volume: f64,
    pub hull_volume: f64,
}

impl Part {
    /// Build a `Part` from a primitive set, computing its true volume and
    /// the (possibly approximate, per `downsample`) convex hull over it.
    pub fn new(primitives: PrimitiveSet, downsample: usize) -> Result<Part> {
        let volume = primitives.total_volume();
        let hull = primitives.compute_convex_hull(downsample)?;
        let hull_volume = hull.compute_volume();
        Ok(Part { primitives, volume, hull_volume, hull })
    }

    /// `|V_hull - V| / v0` (glossary "Concavity").
    pub fn concavity(&self, v0: f64) -> f64 {
        (self.hull_volume - self.volume).abs() / v0.max(1e-300)
    }

    /// The voxelization discretization-error floor for this part's own
    /// primitive set (§4.5 `E = 1.01 * part.max_volume_error() / V0`).
    pub fn max_volume_error(&self) -> f64 {
        self.primitives.max_volume_error()
    }
}
