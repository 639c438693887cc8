//! Approximate convex decomposition of a closed triangle mesh (V-HACD):
//! voxelize the surface, recursively split it by a concavity/balance/
//! symmetry-scored plane search, merge the resulting hulls down to a budget,
//! and simplify every survivor to a vertex cap.
//!
//! [`compute`] is the crate's single public entry point (§6, §4.8 "C8"): it
//! sequences the six inner stages below, reporting progress/log lines
//! through the caller-supplied [`Callback`]/[`Logger`] sinks and honoring
//! `cancel` at every stage boundary. One generic function covers both
//! point precisions rather than a half-dozen near-duplicate entry points.

pub mod callback;
pub mod decomposer;
pub mod geometry;
pub mod hull;
pub mod linalg;
pub mod merger;
pub mod mesh;
pub mod params;
pub mod part;
pub mod simplifier;
pub mod volume;

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

pub use callback::{Callback, Logger, NullCallback, NullLogger, VecLogger};
pub use geometry::Vector3;
pub use hull::Hull;
pub use params::{Mode, Params};

use crate::mesh::Mesh;
use crate::volume::{voxelize, PrimitiveSet, TetrahedronSet};

/// One convex hull in the decomposition's output (§6 "Output").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputHull {
    pub points: Vec<[f64; 3]>,
    pub triangles: Vec<[i32; 3]>,
    pub centroid: [f64; 3],
    pub volume: f64,
}

/// The result of a [`compute`] call: an ordered list of hulls, empty on
/// cancellation or unrecoverable input failure (§7).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Decomposition {
    pub hulls: Vec<OutputHull>,
}

/// A point coordinate's source precision (§6: "array of positions as either
/// double or single precision"). Implemented for `f64` and `f32`; the rest
/// of the pipeline always works in `f64`.
pub trait PointScalar: Copy {
    fn to_f64(self) -> f64;
}

impl PointScalar for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

impl PointScalar for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// The six progress-bearing stages of §4.8's pipeline, with the accumulating
/// overall-percentage range each owns.
const STAGES: [(&str, f64, f64); 6] = [
    ("voxelize", 5.0, 15.0),
    ("build primitive set", 15.0, 20.0),
    ("decompose", 20.0, 90.0),
    ("compute hulls", 90.0, 95.0),
    ("merge", 95.0, 99.0),
    ("simplify", 99.0, 100.0),
];

fn report(callback: &mut dyn Callback, stage: &str, overall: f64, op_pct: f64) {
    callback.update(overall, op_pct, op_pct, stage, stage);
}

/// Build a [`Mesh`] from the host's flat point/triangle buffers (§6 "Compute
/// entry point inputs"). Normalizing/deduplicating vertices is the public
/// façade's job, not the core's (§1 "Explicitly out of scope") — this just
/// reads the buffers at their stride and copies them into owned storage.
fn mesh_from_buffers<T: PointScalar>(
    points: &[T],
    stride_points: usize,
    n_points: u32,
    triangles: &[i32],
    stride_triangles: usize,
    n_triangles: u32,
) -> Mesh {
    let stride_points = stride_points.max(1);
    let stride_triangles = stride_triangles.max(1);

    let mut pts = Vec::with_capacity(n_points as usize);
    for i in 0..n_points as usize {
        let base = i * stride_points;
        if base + 2 >= points.len() {
            break;
        }
        pts.push(Vector3::new(points[base].to_f64(), points[base + 1].to_f64(), points[base + 2].to_f64()));
    }

    let mut tris = Vec::with_capacity(n_triangles as usize);
    for i in 0..n_triangles as usize {
        let base = i * stride_triangles;
        if base + 2 >= triangles.len() {
            break;
        }
        let (a, b, c) = (triangles[base], triangles[base + 1], triangles[base + 2]);
        if a < 0 || b < 0 || c < 0 {
            continue;
        }
        let (a, b, c) = (a as u32, b as u32, c as u32);
        if a as usize >= pts.len() || b as usize >= pts.len() || c as usize >= pts.len() {
            continue;
        }
        tris.push([a, b, c]);
    }

    Mesh::new(pts, tris)
}

/// Run the full decomposition pipeline (§4.8 "C8").
///
/// `points`/`triangles` are interleaved buffers read at `stride_points`/
/// `stride_triangles` elements per entry (so a caller's own vertex format —
/// with normals, UVs, or anything else interleaved in between — does not
/// need to be repacked first). `cancel` is checked at every stage boundary
/// and, within the decomposer's plane search and the merger's loop, every
/// 128 inner iterations (§4.8, §5); a cancelled run returns an empty
/// [`Decomposition`] with no partial state exposed (§7).
#[allow(clippy::too_many_arguments)]
pub fn compute<T: PointScalar>(
    points: &[T],
    stride_points: usize,
    n_points: u32,
    triangles: &[i32],
    stride_triangles: usize,
    n_triangles: u32,
    params: &Params,
    callback: &mut dyn Callback,
    logger: &mut dyn Logger,
    cancel: &AtomicBool,
) -> Decomposition {
    let mut params = params.clone();
    params.validate(logger);

    report(callback, "input", 0.0, 0.0);
    let mesh = mesh_from_buffers(points, stride_points, n_points, triangles, stride_triangles, n_triangles);
    if mesh.points.len() < 4 || mesh.triangles.is_empty() {
        logger.log("compute: input has fewer than 4 points or no triangles, returning empty decomposition");
        return Decomposition::default();
    }
    let Some(bounds) = mesh.bounds() else {
        logger.log("compute: input has degenerate (zero-extent) bounds, returning empty decomposition");
        return Decomposition::default();
    };
    let extent = bounds.max - bounds.min;
    let max_extent = extent.x.max(extent.y).max(extent.z);
    if max_extent <= 0.0 || extent.x.min(extent.y).min(extent.z) <= 1e-9 * max_extent {
        logger.log("compute: input points are coplanar or collinear, returning empty decomposition");
        return Decomposition::default();
    }
    report(callback, "input", STAGES[0].1, 100.0);

    if cancel.load(Ordering::Acquire) {
        return Decomposition::default();
    }

    // Stage: voxelize.
    let (name, _lo, hi) = STAGES[0];
    let voxels = voxelize(&mesh, params.resolution as usize);
    if voxels.count() == 0 {
        logger.log("compute: voxelization produced no voxels, returning empty decomposition");
        return Decomposition::default();
    }
    report(callback, name, hi, 100.0);

    if cancel.load(Ordering::Acquire) {
        return Decomposition::default();
    }

    // Stage: build primitive set (§3 "PrimitiveSet", §6 "mode").
    let (name, _lo, hi) = STAGES[1];
    let primitives = match params.mode {
        Mode::Voxel => PrimitiveSet::Voxel(voxels),
        Mode::Tetra => PrimitiveSet::Tetra(TetrahedronSet::from_voxel_set(&voxels)),
    };
    logger.log(&format!(
        "compute: {} primitives ({} on surface, {} inside)",
        primitives.count(),
        primitives.surface_count(),
        primitives.inside_count()
    ));
    report(callback, name, hi, 100.0);

    if cancel.load(Ordering::Acquire) {
        return Decomposition::default();
    }

    // Stage: recursive decomposition (§4.5 "C5").
    let (name, lo, hi) = STAGES[2];
    let decompose_result = decomposer::decompose(primitives, &params, cancel, logger, |frac| {
        report(callback, name, lo + (hi - lo) * frac, frac * 100.0);
    });
    let Ok((parts, v0)) = decompose_result else {
        logger.log("compute: decomposition failed, returning empty decomposition");
        return Decomposition::default();
    };
    if parts.is_empty() {
        return Decomposition::default();
    }
    report(callback, name, hi, 100.0);

    if cancel.load(Ordering::Acquire) {
        return Decomposition::default();
    }

    // Stage: per-part hull (already computed by the decomposer; this just
    // collects each terminal part's hull into an owning `Hull`, §4.8 step 5).
    let (name, _lo, hi) = STAGES[3];
    let hulls: Vec<Hull> = parts
        .into_iter()
        .filter(|p| !p.hull.is_empty())
        .map(|p| Hull::from_mesh(p.hull))
        .collect();
    if hulls.is_empty() {
        logger.log("compute: every part produced a degenerate hull, returning empty decomposition");
        return Decomposition::default();
    }
    report(callback, name, hi, 100.0);

    if cancel.load(Ordering::Acquire) {
        return Decomposition::default();
    }

    // Stage: merge down to the hull-count budget (§4.6 "C6").
    let (name, _lo, hi) = STAGES[4];
    let merged = merger::merge(hulls, params.gamma, params.max_convex_hulls, v0, cancel);
    report(callback, name, hi, 100.0);

    if cancel.load(Ordering::Acquire) {
        return Decomposition::default();
    }

    // Stage: simplify every hull to the vertex budget (§4.7 "C7").
    let (name, _lo, hi) = STAGES[5];
    let simplified =
        simplifier::simplify(merged, params.max_vertices_per_hull, params.min_volume_per_hull, v0, logger);
    report(callback, name, hi, 100.0);

    let hulls = simplified
        .into_iter()
        .map(|h| OutputHull {
            points: h.mesh.points.iter().map(|&p| [p.x, p.y, p.z]).collect(),
            triangles: h.mesh.triangles.iter().map(|&[a, b, c]| [a as i32, b as i32, c as i32]).collect(),
            centroid: [h.centroid.x, h.centroid.y, h.centroid.z],
            volume: h.volume,
        })
        .collect();

    Decomposition { hulls }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> (Vec<f64>, Vec<i32>) {
        #[rustfmt::skip]
        let points = vec![
            0.0, 0.0, 0.0,
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            1.0, 1.0, 0.0,
            0.0, 0.0, 1.0,
            1.0, 0.0, 1.0,
            0.0, 1.0, 1.0,
            1.0, 1.0, 1.0,
        ];
        #[rustfmt::skip]
        let triangles = vec![
            0, 1, 3,  0, 3, 2,
            4, 6, 7,  4, 7, 5,
            0, 2, 6,  0, 6, 4,
            1, 5, 7,  1, 7, 3,
            0, 4, 5,  0, 5, 1,
            2, 3, 7,  2, 7, 6,
        ];
        (points, triangles)
    }

    #[test]
    fn unit_cube_decomposes_to_a_single_hull() {
        let (points, triangles) = unit_cube();
        let params = Params::default();
        let mut callback = NullCallback;
        let mut logger = NullLogger;
        let cancel = AtomicBool::new(false);
        let result = compute(
            &points,
            3,
            8,
            &triangles,
            3,
            12,
            &params,
            &mut callback,
            &mut logger,
            &cancel,
        );
        assert_eq!(result.hulls.len(), 1);
        assert_eq!(result.hulls[0].points.len(), 8);
        assert!((result.hulls[0].volume - 1.0).abs() < 0.01, "volume = {}", result.hulls[0].volume);
    }

    #[test]
    fn max_convex_hulls_one_forces_single_output_hull() {
        let (points, triangles) = unit_cube();
        let params = Params { max_convex_hulls: 1, concavity: 0.0001, ..Params::default() };
        let mut callback = NullCallback;
        let mut logger = NullLogger;
        let cancel = AtomicBool::new(false);
        let result = compute(
            &points,
            3,
            8,
            &triangles,
            3,
            12,
            &params,
            &mut callback,
            &mut logger,
            &cancel,
        );
        assert_eq!(result.hulls.len(), 1);
    }

    #[test]
    fn cancellation_returns_empty_decomposition() {
        let (points, triangles) = unit_cube();
        let params = Params::default();
        let mut callback = NullCallback;
        let mut logger = NullLogger;
        let cancel = AtomicBool::new(true);
        let result = compute(
            &points,
            3,
            8,
            &triangles,
            3,
            12,
            &params,
            &mut callback,
            &mut logger,
            &cancel,
        );
        assert!(result.hulls.is_empty());
    }

    #[test]
    fn degenerate_coplanar_input_returns_empty_decomposition() {
        #[rustfmt::skip]
        let points = vec![
            0.0, 0.0, 0.0,
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
        ];
        let triangles = vec![0, 1, 2];
        let params = Params::default();
        let mut callback = NullCallback;
        let mut logger = VecLogger::default();
        let cancel = AtomicBool::new(false);
        let result = compute(
            &points,
            3,
            3,
            &triangles,
            3,
            1,
            &params,
            &mut callback,
            &mut logger,
            &cancel,
        );
        assert!(result.hulls.is_empty());
        assert!(!logger.lines.is_empty());
    }

    #[test]
    fn f32_points_are_accepted() {
        #[rustfmt::skip]
        let points: Vec<f32> = vec![
            0.0, 0.0, 0.0,
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            1.0, 1.0, 0.0,
            0.0, 0.0, 1.0,
            1.0, 0.0, 1.0,
            0.0, 1.0, 1.0,
            1.0, 1.0, 1.0,
        ];
        #[rustfmt::skip]
        let triangles = vec![
            0, 1, 3,  0, 3, 2,
            4, 6, 7,  4, 7, 5,
            0, 2, 6,  0, 6, 4,
            1, 5, 7,  1, 7, 3,
            0, 4, 5,  0, 5, 1,
            2, 3, 7,  2, 7, 6,
        ];
        let params = Params::default();
        let mut callback = NullCallback;
        let mut logger = NullLogger;
        let cancel = AtomicBool::new(false);
        let result = compute(
            &points,
            3,
            8,
            &triangles,
            3,
            12,
            &params,
            &mut callback,
            &mut logger,
            &cancel,
        );
        assert_eq!(result.hulls.len(), 1);
    }
}
