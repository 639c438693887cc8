//! Simplifier (§4.7 "C7"): reduce every output hull with more than
//! `max_vertices_per_hull` vertices to that budget by rebuilding it from
//! scratch through a fresh incremental hull, this time with the vertex cap
//! and minimum pocket volume wired into construction itself.

use vhacd_hull::{IncrementalHull, ProcessResult};

use crate::callback::Logger;
use crate::hull::Hull;
use crate::mesh::Mesh;

/// `v0` is the root hull volume used to turn `min_volume_per_hull` (a
/// fraction, §6) into the absolute pocket-volume floor `process` expects.
pub fn simplify(mut hulls: Vec<Hull>, max_vertices_per_hull: u32, min_volume_per_hull: f64, v0: f64, logger: &mut dyn Logger) -> Vec<Hull> {
    let max_vertices = max_vertices_per_hull as usize;
    let min_volume = v0 * min_volume_per_hull;

    for hull in &mut hulls {
        if hull.mesh.points.len() <= max_vertices {
            continue;
        }

        let mut builder = IncrementalHull::new();
        builder.add_points(&hull.mesh.points);
        match builder.process(max_vertices, min_volume) {
            ProcessResult::Ok => {
                let mesh_data = builder.get_mesh();
                *hull = Hull::from_mesh(Mesh::new(mesh_data.points, mesh_data.triangles));
            }
            other => {
                logger.log(&format!("simplifier: could not reduce hull ({other:?}), keeping original"));
            }
        }
    }

    hulls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::NullLogger;
    use crate::geometry::Vector3;

    fn sphere_points(n: usize) -> Vec<Vector3> {
        let mut pts = Vec::with_capacity(n);
        for i in 0..n {
            let t = i as f64 / n as f64;
            let phi = (2.0 * t - 1.0f64).acos();
            let theta = std::f64::consts::PI * (1.0 + 5.0f64.sqrt()) * i as f64;
            pts.push(Vector3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()));
        }
        pts
    }

    #[test]
    fn hull_under_budget_is_left_alone() {
        let mesh = Mesh::convex_hull(&sphere_points(40)).unwrap();
        let hull = Hull::from_mesh(mesh);
        let before = hull.mesh.points.len();
        let max_vertices = (before + 10) as u32;
        let mut logger = NullLogger;
        let result = simplify(vec![hull], max_vertices, 0.0001, 1.0, &mut logger);
        assert_eq!(result[0].mesh.points.len(), before);
    }

    #[test]
    fn oversized_hull_is_reduced_to_budget() {
        let mesh = Mesh::convex_hull(&sphere_points(200)).unwrap();
        let hull = Hull::from_mesh(mesh);
        assert!(hull.mesh.points.len() > 20);
        let v0 = hull.volume;
        let mut logger = NullLogger;
        let result = simplify(vec![hull], 20, 0.0001, v0, &mut logger);
        assert!(result[0].mesh.points.len() <= 20, "got {} vertices", result[0].mesh.points.len());
        assert!(result[0].volume > 0.0);
    }
}
