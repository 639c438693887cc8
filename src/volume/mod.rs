//! Volume rasterization and the primitive-set capability the decomposer
//! consumes (§3 "VoxelSet"/"TetrahedronSet"/"PrimitiveSet", §4.4 "C4").
//!
//! `PrimitiveSet` is a tagged variant over a closed, statically-known
//! operation set rather than a trait object: a plain two-armed enum over
//! `VoxelSet` and `TetrahedronSet`, so every call site matches on a known
//! pair of shapes instead of dispatching through a vtable.

pub mod tetra;
pub mod voxel;

use anyhow::Result;

use crate::geometry::{Bounds, Plane, Vector3};
use crate::linalg::{symmetric_eigen, Mat3};
use crate::mesh::Mesh;

pub use tetra::{Tetra, TetrahedronSet};
pub use voxel::{Voxel, VoxelSet};

/// Whether a primitive sits on the mesh's rasterized surface shell or
/// strictly in its flood-filled interior (§3 "VoxelSet").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loc {
    OnSurface,
    InsideSurface,
}

/// The closed capability set the decomposer (C5) needs from whichever
/// primitive representation is active (§4.4).
#[derive(Clone, Debug)]
pub enum PrimitiveSet {
    Voxel(VoxelSet),
    Tetra(TetrahedronSet),
}

impl PrimitiveSet {
    pub fn count(&self) -> usize {
        match self {
            PrimitiveSet::Voxel(v) => v.count(),
            PrimitiveSet::Tetra(t) => t.count(),
        }
    }

    pub fn surface_count(&self) -> usize {
        match self {
            PrimitiveSet::Voxel(v) => v.surface_count(),
            PrimitiveSet::Tetra(t) => t.surface_count(),
        }
    }

    pub fn inside_count(&self) -> usize {
        match self {
            PrimitiveSet::Voxel(v) => v.inside_count(),
            PrimitiveSet::Tetra(t) => t.inside_count(),
        }
    }

    pub fn total_volume(&self) -> f64 {
        match self {
            PrimitiveSet::Voxel(v) => v.total_volume(),
            PrimitiveSet::Tetra(t) => t.total_volume(),
        }
    }

    /// The discretization error floor: the volume straddled by surface
    /// primitives, estimated as their count times the set's average
    /// primitive volume. Below this floor, further splitting cannot make
    /// the measured concavity any more accurate, so the decomposer treats
    /// it as an alternate stopping threshold (§4.5 `E`).
    pub fn max_volume_error(&self) -> f64 {
        let n = self.count();
        if n == 0 {
            return 0.0;
        }
        (self.total_volume() / n as f64) * self.surface_count() as f64
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            PrimitiveSet::Voxel(v) => v.bounds(),
            PrimitiveSet::Tetra(t) => t.bounds(),
        }
    }

    pub fn clip(&self, plane: &Plane) -> (PrimitiveSet, PrimitiveSet) {
        match self {
            PrimitiveSet::Voxel(v) => {
                let (pos, neg) = v.clip(plane);
                (PrimitiveSet::Voxel(pos), PrimitiveSet::Voxel(neg))
            }
            PrimitiveSet::Tetra(t) => {
                let (pos, neg) = t.clip(plane);
                (PrimitiveSet::Tetra(pos), PrimitiveSet::Tetra(neg))
            }
        }
    }

    pub fn compute_clipped_volumes(&self, plane: &Plane) -> (f64, f64) {
        match self {
            PrimitiveSet::Voxel(v) => v.compute_clipped_volumes(plane),
            PrimitiveSet::Tetra(t) => t.compute_clipped_volumes(plane),
        }
    }

    pub fn select_surface_only(&self) -> PrimitiveSet {
        match self {
            PrimitiveSet::Voxel(v) => PrimitiveSet::Voxel(v.select_surface_only()),
            PrimitiveSet::Tetra(t) => PrimitiveSet::Tetra(t.select_surface_only()),
        }
    }

    pub fn intersect(
        &self,
        plane: &Plane,
        right_pts: &mut Vec<Vector3>,
        left_pts: &mut Vec<Vector3>,
        downsample: usize,
    ) {
        match self {
            PrimitiveSet::Voxel(v) => v.intersect(plane, right_pts, left_pts, downsample),
            PrimitiveSet::Tetra(t) => t.intersect(plane, right_pts, left_pts, downsample),
        }
    }

    pub fn compute_convex_hull(&self, downsample: usize) -> Result<Mesh> {
        let points = match self {
            PrimitiveSet::Voxel(v) => v.convex_hull_points(downsample),
            PrimitiveSet::Tetra(t) => t.convex_hull_points(downsample),
        };
        Mesh::convex_hull(&points)
    }

    /// Centroid and principal-axis frame (eigenvectors of the primitive
    /// centers' inertia tensor, descending eigenvalue order) used by the
    /// decomposer's symmetry cost term and, when `pca` is enabled, as the
    /// three directions candidate planes are swept along (§4.4, §4.5).
    pub fn principal_frame(&self) -> Option<PrincipalFrame> {
        let centers: Vec<Vector3> = match self {
            PrimitiveSet::Voxel(v) => v.voxels.iter().map(|vx| v.center(vx)).collect(),
            PrimitiveSet::Tetra(t) => t.tets.iter().map(|tet| tet.centroid()).collect(),
        };
        if centers.is_empty() {
            return None;
        }
        let n = centers.len() as f64;
        let centroid = centers.iter().fold(Vector3::ZERO, |acc, &p| acc + p).scale(1.0 / n);

        let mut inertia = Mat3::zero();
        for &p in &centers {
            let r = p - centroid;
            inertia.set(0, 0, inertia.get(0, 0) + r.y * r.y + r.z * r.z);
            inertia.set(1, 1, inertia.get(1, 1) + r.x * r.x + r.z * r.z);
            inertia.set(2, 2, inertia.get(2, 2) + r.x * r.x + r.y * r.y);
            inertia.set(0, 1, inertia.get(0, 1) - r.x * r.y);
            inertia.set(0, 2, inertia.get(0, 2) - r.x * r.z);
            inertia.set(1, 2, inertia.get(1, 2) - r.y * r.z);
        }
        inertia.set(1, 0, inertia.get(0, 1));
        inertia.set(2, 0, inertia.get(0, 2));
        inertia.set(2, 1, inertia.get(1, 2));

        let (eigenvalues, axes) = symmetric_eigen(inertia);
        Some(PrincipalFrame { centroid, eigenvalues, axes })
    }
}

/// Eigen-decomposition of a primitive set's inertia tensor: `eigenvalues`
/// are in descending order and `axes`'s matching columns are unit
/// eigenvectors.
#[derive(Clone, Copy, Debug)]
pub struct PrincipalFrame {
    pub centroid: Vector3,
    pub eigenvalues: [f64; 3],
    pub axes: Mat3,
}

impl PrincipalFrame {
    /// The axis whose eigen-gap to the other two is smallest — the
    /// decomposer's "preferred cutting direction" (§4.5) — and that gap
    /// normalized by the other eigenvalues as the symmetry weight `w`.
    pub fn preferred_cut_direction(&self) -> (Vector3, f64) {
        let cols = self.axes.columns();
        let e = self.eigenvalues;
        let gaps = [
            (e[0] - e[1]).abs() + (e[0] - e[2]).abs(),
            (e[1] - e[0]).abs() + (e[1] - e[2]).abs(),
            (e[2] - e[0]).abs() + (e[2] - e[1]).abs(),
        ];
        let best = (0..3).min_by(|&i, &j| gaps[i].partial_cmp(&gaps[j]).unwrap()).unwrap();
        let scale = e.iter().map(|v| v.abs()).sum::<f64>().max(1e-300);
        let w = (1.0 - gaps[best] / scale).clamp(0.0, 1.0);
        (cols[best], w)
    }
}

/// Rasterize `mesh` into a `VoxelSet` sized so the bounding box volume
/// divided by one voxel's volume is approximately `resolution` (§4.4, §6).
pub fn voxelize(mesh: &Mesh, resolution: usize) -> VoxelSet {
    voxel::voxelize(mesh, resolution)
}
