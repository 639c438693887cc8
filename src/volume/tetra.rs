//! Tetrahedron primitive set (§3 "TetrahedronSet"): the alternative to
//! `VoxelSet` selected by `Params::mode == Mode::Tetra`. Built by splitting
//! each voxel cube into 6 tetrahedra sharing the cube's main diagonal, a
//! standard space-filling decomposition that needs no alternating parity
//! between neighboring cubes (unlike the 5-tet scheme) and exactly
//! reproduces the cube's volume and `loc`.

use crate::geometry::{orient3d, Bounds, Plane, Vector3};
use crate::volume::voxel::VoxelSet;
use crate::volume::Loc;

#[derive(Clone, Copy, Debug)]
pub struct Tetra {
    pub verts: [Vector3; 4],
    pub loc: Loc,
}

impl Tetra {
    pub fn volume(&self) -> f64 {
        let [a, b, c, d] = self.verts;
        orient3d(a, b, c, d).abs() / 6.0
    }

    pub fn centroid(&self) -> Vector3 {
        let [a, b, c, d] = self.verts;
        (a + b + c + d).scale(0.25)
    }
}

#[derive(Clone, Debug, Default)]
pub struct TetrahedronSet {
    pub tets: Vec<Tetra>,
}

impl TetrahedronSet {
    pub fn from_voxel_set(voxels: &VoxelSet) -> TetrahedronSet {
        let mut tets = Vec::with_capacity(voxels.voxels.len() * 6);
        for v in &voxels.voxels {
            let c = voxels.corners(v);
            // c indices: 0=000 1=100 2=010 3=110 4=001 5=101 6=011 7=111
            let (c000, c100, c010, c110, c001, c101, c011, c111) =
                (c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]);
            for verts in [
                [c000, c100, c110, c111],
                [c000, c100, c101, c111],
                [c000, c010, c110, c111],
                [c000, c010, c011, c111],
                [c000, c001, c101, c111],
                [c000, c001, c011, c111],
            ] {
                tets.push(Tetra { verts, loc: v.loc });
            }
        }
        TetrahedronSet { tets }
    }

    pub fn count(&self) -> usize {
        self.tets.len()
    }

    pub fn surface_count(&self) -> usize {
        self.tets.iter().filter(|t| t.loc == Loc::OnSurface).count()
    }

    pub fn inside_count(&self) -> usize {
        self.tets.iter().filter(|t| t.loc == Loc::InsideSurface).count()
    }

    pub fn total_volume(&self) -> f64 {
        self.tets.iter().map(|t| t.volume()).sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let pts: Vec<Vector3> = self.tets.iter().flat_map(|t| t.verts).collect();
        Bounds::of(&pts)
    }

    pub fn clip(&self, plane: &Plane) -> (TetrahedronSet, TetrahedronSet) {
        let mut pos = TetrahedronSet::default();
        let mut neg = TetrahedronSet::default();
        for t in &self.tets {
            let side = plane.side(t.centroid());
            match t.loc {
                Loc::InsideSurface => {
                    if side >= 0.0 {
                        pos.tets.push(*t);
                    } else {
                        neg.tets.push(*t);
                    }
                }
                Loc::OnSurface => {
                    let any_pos = t.verts.iter().any(|&p| plane.side(p) >= 0.0);
                    let any_neg = t.verts.iter().any(|&p| plane.side(p) < 0.0);
                    if any_pos {
                        pos.tets.push(*t);
                    }
                    if any_neg || !any_pos {
                        neg.tets.push(*t);
                    }
                }
            }
        }
        (pos, neg)
    }

    pub fn compute_clipped_volumes(&self, plane: &Plane) -> (f64, f64) {
        let mut pos = 0.0;
        let mut neg = 0.0;
        for t in &self.tets {
            if plane.side(t.centroid()) >= 0.0 {
                pos += t.volume();
            } else {
                neg += t.volume();
            }
        }
        (pos, neg)
    }

    pub fn select_surface_only(&self) -> TetrahedronSet {
        TetrahedronSet {
            tets: self.tets.iter().filter(|t| t.loc == Loc::OnSurface).copied().collect(),
        }
    }

    pub fn intersect(
        &self,
        plane: &Plane,
        right_pts: &mut Vec<Vector3>,
        left_pts: &mut Vec<Vector3>,
        downsample: usize,
    ) {
        let diag = self.bounds().map(|b| b.diagonal()).unwrap_or(1.0);
        let band = diag / (downsample.max(1) as f64) * 0.1;
        let step = downsample.max(1);
        for (idx, t) in self.tets.iter().enumerate() {
            if t.loc != Loc::OnSurface || idx % step != 0 {
                continue;
            }
            if plane.side(t.centroid()).abs() > band {
                continue;
            }
            for &p in &t.verts {
                if plane.side(p) >= 0.0 {
                    right_pts.push(p);
                } else {
                    left_pts.push(p);
                }
            }
        }
    }

    pub fn convex_hull_points(&self, downsample: usize) -> Vec<Vector3> {
        let step = downsample.max(1);
        let mut pts = Vec::new();
        for (idx, t) in self.tets.iter().enumerate().filter(|(_, t)| t.loc == Loc::OnSurface) {
            if idx % step != 0 {
                continue;
            }
            pts.extend_from_slice(&t.verts);
        }
        if pts.len() < 4 {
            pts.clear();
            for t in self.tets.iter().filter(|t| t.loc == Loc::OnSurface) {
                pts.extend_from_slice(&t.verts);
            }
        }
        pts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::voxel::{voxelize, Voxel};

    #[test]
    fn six_tets_reproduce_a_single_voxels_volume() {
        let vs = VoxelSet {
            origin: Vector3::ZERO,
            scale: 2.0,
            voxels: vec![Voxel { i: 0, j: 0, k: 0, loc: Loc::InsideSurface }],
        };
        let ts = TetrahedronSet::from_voxel_set(&vs);
        assert_eq!(ts.count(), 6);
        assert!((ts.total_volume() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn tetra_set_total_volume_matches_voxel_set() {
        let mesh = crate::mesh::Mesh::new(
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(1.0, 0.0, 1.0),
                Vector3::new(0.0, 1.0, 1.0),
                Vector3::new(1.0, 1.0, 1.0),
            ],
            vec![
                [0, 1, 3], [0, 3, 2], [4, 6, 7], [4, 7, 5], [0, 2, 6], [0, 6, 4], [1, 5, 7],
                [1, 7, 3], [0, 4, 5], [0, 5, 1], [2, 3, 7], [2, 7, 6],
            ],
        );
        let vs = voxelize(&mesh, 20_000);
        let ts = TetrahedronSet::from_voxel_set(&vs);
        assert!((ts.total_volume() - vs.total_volume()).abs() < 1e-6);
    }
}
