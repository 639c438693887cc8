//! Indexed triangle mesh (§3 "Mesh", §4.3 "C3"): volume, plane-clipping
//! with capping, and the convex-hull entry point the rest of the crate
//! clips/hulls through.

use std::collections::HashMap;

use anyhow::{bail, Result};
use vhacd_hull::{IncrementalHull, ProcessResult};

use crate::geometry::{Plane, Vector3};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub points: Vec<Vector3>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(points: Vec<Vector3>, triangles: Vec<[u32; 3]>) -> Mesh {
        Mesh { points, triangles }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Divergence-theorem sum over triangles referenced to the origin,
    /// absolute value taken once at the end (§4.3).
    pub fn compute_volume(&self) -> f64 {
        let mut sum = 0.0;
        for &[i, j, k] in &self.triangles {
            let (p0, p1, p2) = (self.points[i as usize], self.points[j as usize], self.points[k as usize]);
            sum += p0.dot(p1.cross(p2));
        }
        sum.abs() / 6.0
    }

    pub fn centroid(&self) -> Vector3 {
        if self.points.is_empty() {
            return Vector3::ZERO;
        }
        let mut sum = Vector3::ZERO;
        for &p in &self.points {
            sum = sum + p;
        }
        sum.scale(1.0 / self.points.len() as f64)
    }

    /// Tight axis-aligned bounds of this mesh's points.
    pub fn bounds(&self) -> Option<vhacd_hull::Bounds> {
        vhacd_hull::Bounds::of(&self.points)
    }

    /// Build the convex hull of a point cloud via the incremental hull
    /// builder (§4.3 `compute_convex_hull`, delegating to C2).
    pub fn convex_hull(points: &[Vector3]) -> Result<Mesh> {
        if points.len() < 4 {
            bail!("convex hull needs at least 4 points, got {}", points.len());
        }
        let mut builder = IncrementalHull::new();
        builder.add_points(points);
        match builder.process(points.len(), 0.0) {
            ProcessResult::Ok => {}
            ProcessResult::NotEnoughPoints => bail!("convex hull needs at least 4 points"),
            ProcessResult::Coplanar => bail!("points are coplanar, no 3D hull exists"),
            ProcessResult::Degenerate => bail!("degenerate face encountered while building hull"),
        }
        let hull = builder.get_mesh();
        Ok(Mesh { points: hull.points, triangles: hull.triangles })
    }

    /// Split this mesh by `plane`, returning `(positive_side, negative_side)`
    /// — each a closed mesh, with every straddling triangle cut and capped
    /// by the triangulated cut loop (§4.3).
    pub fn clip(&self, plane: &Plane) -> (Mesh, Mesh) {
        let diag = self.bounds().map(|b| b.diagonal()).unwrap_or(1.0).max(1e-12);
        let tol = 1e-9 * diag;

        let mut pos = Mesh::default();
        let mut neg = Mesh::default();
        let mut cut_segments: Vec<(Vector3, Vector3)> = Vec::new();

        for &[i, j, k] in &self.triangles {
            let tri = [self.points[i as usize], self.points[j as usize], self.points[k as usize]];
            let d = tri.map(|p| plane.side(p));
            let has_pos = d.iter().any(|&x| x > tol);
            let has_neg = d.iter().any(|&x| x < -tol);

            if has_pos && !has_neg {
                push_triangle(&mut pos, tri);
            } else if has_neg && !has_pos {
                push_triangle(&mut neg, tri);
            } else if has_pos && has_neg {
                for t in fan_triangulate(&clip_half(tri, d, true, tol)) {
                    push_triangle(&mut pos, t);
                }
                for t in fan_triangulate(&clip_half(tri, d, false, tol)) {
                    push_triangle(&mut neg, t);
                }
                if let Some(seg) = cut_segment(tri, d, tol) {
                    cut_segments.push(seg);
                }
            }
            // has_pos == false && has_neg == false: triangle lies in the
            // cutting plane, contributes no volume on either side.
        }

        for loop_pts in trace_loops(&cut_segments, tol) {
            for t in build_cap(&loop_pts, plane.normal().scale(-1.0)) {
                push_triangle(&mut pos, t);
            }
            for t in build_cap(&loop_pts, plane.normal()) {
                push_triangle(&mut neg, t);
            }
        }

        (pos, neg)
    }
}

fn push_triangle(mesh: &mut Mesh, tri: [Vector3; 3]) {
    let base = mesh.points.len() as u32;
    mesh.points.extend_from_slice(&tri);
    mesh.triangles.push([base, base + 1, base + 2]);
}

/// Sutherland-Hodgman clip of one triangle against a half-space, keeping
/// `d >= -tol` (positive side) or `d <= tol` (negative side).
fn clip_half(tri: [Vector3; 3], d: [f64; 3], keep_positive: bool, tol: f64) -> Vec<Vector3> {
    let inside = |i: usize| if keep_positive { d[i] >= -tol } else { d[i] <= tol };
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let j = (i + 1) % 3;
        let (cur_in, next_in) = (inside(i), inside(j));
        if cur_in {
            out.push(tri[i]);
        }
        if cur_in != next_in {
            let t = d[i] / (d[i] - d[j]);
            out.push(tri[i] + (tri[j] - tri[i]).scale(t));
        }
    }
    out
}

fn fan_triangulate(poly: &[Vector3]) -> Vec<[Vector3; 3]> {
    if poly.len() < 3 {
        return Vec::new();
    }
    (1..poly.len() - 1).map(|i| [poly[0], poly[i], poly[i + 1]]).collect()
}

/// The two points where a genuinely straddling triangle's boundary crosses
/// the plane — either an edge crossing (linear interpolation) or a vertex
/// that sits exactly on the plane.
fn cut_segment(tri: [Vector3; 3], d: [f64; 3], tol: f64) -> Option<(Vector3, Vector3)> {
    let mut pts = Vec::with_capacity(2);
    for i in 0..3 {
        if d[i].abs() <= tol {
            pts.push(tri[i]);
        }
    }
    for i in 0..3 {
        let j = (i + 1) % 3;
        if (d[i] > tol && d[j] < -tol) || (d[i] < -tol && d[j] > tol) {
            let t = d[i] / (d[i] - d[j]);
            pts.push(tri[i] + (tri[j] - tri[i]).scale(t));
        }
    }
    if pts.len() == 2 {
        Some((pts[0], pts[1]))
    } else {
        None
    }
}

/// Quantize to a grid cell so independently-interpolated copies of the same
/// shared-edge crossing point (computed from each of the two triangles that
/// share that edge) collapse onto one canonical loop vertex.
fn quantize(p: Vector3, tol: f64) -> (i64, i64, i64) {
    let cell = tol.max(1e-12);
    ((p.x / cell).round() as i64, (p.y / cell).round() as i64, (p.z / cell).round() as i64)
}

/// Stitch cut segments into closed polylines by following shared endpoints.
fn trace_loops(segments: &[(Vector3, Vector3)], tol: f64) -> Vec<Vec<Vector3>> {
    let mut canon: HashMap<(i64, i64, i64), (Vector3, Vec<usize>)> = HashMap::new();
    let mut endpoint_of: Vec<[(i64, i64, i64); 2]> = Vec::with_capacity(segments.len());

    for (idx, &(a, b)) in segments.iter().enumerate() {
        let ka = quantize(a, tol);
        let kb = quantize(b, tol);
        canon.entry(ka).or_insert((a, Vec::new())).1.push(idx);
        canon.entry(kb).or_insert((b, Vec::new())).1.push(idx);
        endpoint_of.push([ka, kb]);
    }

    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        let mut loop_pts = Vec::new();
        let mut current_idx = start_idx;
        let start_key = endpoint_of[start_idx][0];
        let mut arrive_key = start_key;
        loop {
            used[current_idx] = true;
            let [k0, k1] = endpoint_of[current_idx];
            let next_key = if k0 == arrive_key { k1 } else { k0 };
            loop_pts.push(canon[&arrive_key].0);
            arrive_key = next_key;
            if arrive_key == start_key {
                break;
            }
            let Some(&next_idx) = canon[&arrive_key].1.iter().find(|&&i| !used[i]) else {
                break;
            };
            current_idx = next_idx;
        }
        if loop_pts.len() >= 3 {
            loops.push(loop_pts);
        }
    }
    loops
}

fn build_cap(loop_pts: &[Vector3], desired_normal: Vector3) -> Vec<[Vector3; 3]> {
    let mut tris = fan_triangulate(loop_pts);
    if let Some(&[a, b, c]) = tris.first() {
        let n = (b - a).cross(c - a);
        if n.dot(desired_normal) < 0.0 {
            for t in tris.iter_mut() {
                t.swap(1, 2);
            }
        }
    }
    tris
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Mesh {
        let p = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(0.0, 1.0, 1.0),
            Vector3::new(1.0, 1.0, 1.0),
        ];
        let triangles: Vec<[u32; 3]> = vec![
            [0, 1, 3], [0, 3, 2], // bottom z=0
            [4, 6, 7], [4, 7, 5], // top z=1
            [0, 2, 6], [0, 6, 4], // x=0
            [1, 5, 7], [1, 7, 3], // x=1
            [0, 4, 5], [0, 5, 1], // y=0
            [2, 3, 7], [2, 7, 6], // y=1
        ];
        Mesh::new(p.to_vec(), triangles)
    }

    #[test]
    fn cube_volume_is_one() {
        let cube = unit_cube();
        assert!((cube.compute_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cube_convex_hull_has_eight_vertices() {
        let cube = unit_cube();
        let hull = Mesh::convex_hull(&cube.points).unwrap();
        assert_eq!(hull.points.len(), 8);
        assert!((hull.compute_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clip_through_midplane_splits_volume_in_half() {
        use crate::geometry::Axis;
        let cube = unit_cube();
        let plane = Plane::axis_aligned(Axis::X, 0.5, 0);
        let (pos, neg) = cube.clip(&plane);
        assert!((pos.compute_volume() - 0.5).abs() < 1e-6, "pos = {}", pos.compute_volume());
        assert!((neg.compute_volume() - 0.5).abs() < 1e-6, "neg = {}", neg.compute_volume());
    }

    #[test]
    fn clip_entirely_outside_leaves_one_side_empty() {
        use crate::geometry::Axis;
        let cube = unit_cube();
        let plane = Plane::axis_aligned(Axis::X, 5.0, 0);
        let (pos, neg) = cube.clip(&plane);
        assert!(pos.is_empty());
        assert!((neg.compute_volume() - 1.0).abs() < 1e-9);
    }
}
