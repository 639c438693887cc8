//! Recursive plane-based subdivision (§4.5 "C5"): for each current part,
//! search axis-aligned candidate planes, score them by a
//! concavity/balance/symmetry cost, split the part by the winning plane,
//! and recurse — or, once a part's own concavity is within budget, move it
//! to the results list.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use rayon::prelude::*;

use crate::callback::Logger;
use crate::geometry::{Axis, Plane, Vector3};
use crate::part::Part;
use crate::params::Params;
use crate::volume::PrimitiveSet;

/// Run the decomposer to completion (or until cancelled / `params.depth`
/// iterations), returning the terminal parts and the root hull volume V0
/// (§3 "CostMatrix") the merge and simplify stages normalize against.
pub fn decompose(
    primitives: PrimitiveSet,
    params: &Params,
    cancel: &AtomicBool,
    logger: &mut dyn Logger,
    mut progress: impl FnMut(f64),
) -> Result<(Vec<Part>, f64)> {
    let mut queue: VecDeque<Part> = VecDeque::new();
    queue.push_back(Part::new(primitives, params.convexhull_downsampling as usize)?);

    let mut results = Vec::new();
    let mut v0: Option<f64> = None;
    let mut iterations = 0u32;

    while let Some(part) = queue.pop_front() {
        if cancel.load(Ordering::Acquire) {
            return Ok((Vec::new(), 0.0));
        }
        if iterations >= params.depth {
            results.push(part);
            continue;
        }
        iterations += 1;

        let v0 = *v0.get_or_insert(part.hull_volume);
        let concavity = part.concavity(v0);
        let error_floor = 1.01 * part.max_volume_error() / v0.max(1e-300);

        if concavity <= params.concavity as f64 || concavity <= error_floor {
            results.push(part);
        } else {
            match split(&part, params, v0, cancel) {
                Some((left, right)) => {
                    queue.push_back(left);
                    queue.push_back(right);
                }
                None => {
                    // No viable split plane (e.g. every candidate produced a
                    // degenerate hull); accept the part as terminal rather
                    // than looping forever.
                    logger.log("decomposer: no viable split plane, keeping part as terminal");
                    results.push(part);
                }
            }
        }

        let denom = (results.len() + queue.len()).max(1) as f64;
        progress(results.len() as f64 / denom);
    }

    Ok((results, v0.unwrap_or(0.0)))
}

fn split(part: &Part, params: &Params, v0: f64, cancel: &AtomicBool) -> Option<(Part, Part)> {
    let directions = search_directions(part, params);
    let bounds = part.primitives.bounds()?;
    let scale = grid_scale(&part.primitives);

    let coarse = candidate_planes(&bounds, scale, params.plane_downsampling.max(1), &directions);
    let (mut best_plane, _best_cost) = search_best_plane(part, &coarse, params, v0, cancel)?;

    if params.plane_downsampling > 1 || params.convexhull_downsampling > 1 {
        let fine = refine_planes(&bounds, scale, &best_plane, params, &directions);
        if let Some((refined_plane, _)) = search_best_plane(part, &fine, params, v0, cancel) {
            best_plane = refined_plane;
        }
    }

    let (left_primitives, right_primitives) = part.primitives.clip(&best_plane);
    if left_primitives.count() == 0 || right_primitives.count() == 0 {
        return None;
    }

    let downsample = params.convexhull_downsampling as usize;
    let left = Part::new(left_primitives, downsample).ok()?;
    let right = Part::new(right_primitives, downsample).ok()?;
    Some((left, right))
}

/// World axes, unless `pca` is enabled — then the part's own principal axes
/// (§4.4 `align_to_principal_axes`, §9 "pca" open question): candidate
/// planes are swept along whichever three directions are in play, so no
/// data ever needs to be physically rotated.
fn search_directions(part: &Part, params: &Params) -> [(Axis, Vector3); 3] {
    if params.pca {
        if let Some(frame) = part.primitives.principal_frame() {
            let cols = frame.axes.columns();
            return [(Axis::None, cols[0]), (Axis::None, cols[1]), (Axis::None, cols[2])];
        }
    }
    [
        (Axis::X, Vector3::new(1.0, 0.0, 0.0)),
        (Axis::Y, Vector3::new(0.0, 1.0, 0.0)),
        (Axis::Z, Vector3::new(0.0, 0.0, 1.0)),
    ]
}

fn grid_scale(primitives: &PrimitiveSet) -> f64 {
    match primitives {
        PrimitiveSet::Voxel(v) => v.scale.max(1e-9),
        PrimitiveSet::Tetra(t) => {
            let avg_tet = t.total_volume() / t.count().max(1) as f64;
            (avg_tet * 6.0).max(1e-27).cbrt()
        }
    }
}

fn candidate_planes(
    bounds: &crate::geometry::Bounds,
    scale: f64,
    step: u32,
    directions: &[(Axis, Vector3); 3],
) -> Vec<Plane> {
    let center = (bounds.min + bounds.max).scale(0.5);
    let half = (bounds.max - bounds.min).scale(0.5);
    let mut planes = Vec::new();
    for &(axis, dir) in directions {
        let radius = dir.x.abs() * half.x + dir.y.abs() * half.y + dir.z.abs() * half.z;
        let c = dir.dot(center);
        let (lo, hi) = (c - radius, c + radius);
        let n = ((hi - lo) / scale).ceil().max(1.0) as i32;
        let mut idx = 1;
        while idx * step as i32 < n {
            let grid_index = idx * step as i32;
            let offset = lo + grid_index as f64 * scale;
            planes.push(make_plane(axis, dir, offset, grid_index));
            idx += 1;
        }
    }
    planes
}

fn refine_planes(
    bounds: &crate::geometry::Bounds,
    scale: f64,
    best: &Plane,
    params: &Params,
    directions: &[(Axis, Vector3); 3],
) -> Vec<Plane> {
    let best_normal = best.normal();
    let Some(&(axis, dir)) = directions
        .iter()
        .max_by(|(_, a), (_, b)| a.dot(best_normal).abs().partial_cmp(&b.dot(best_normal).abs()).unwrap())
    else {
        return Vec::new();
    };
    let center = (bounds.min + bounds.max).scale(0.5);
    let half = (bounds.max - bounds.min).scale(0.5);
    let radius = dir.x.abs() * half.x + dir.y.abs() * half.y + dir.z.abs() * half.z;
    let lo = dir.dot(center) - radius;

    let span = params.plane_downsampling.max(1) as i32;
    let mut planes = Vec::new();
    for grid_index in (best.index - span).max(1)..=(best.index + span) {
        let offset = lo + grid_index as f64 * scale;
        planes.push(make_plane(axis, dir, offset, grid_index));
    }
    planes
}

fn make_plane(axis: Axis, dir: Vector3, offset: f64, index: i32) -> Plane {
    match axis {
        Axis::None => Plane { a: dir.x, b: dir.y, c: dir.z, d: -offset, axis: Axis::None, index },
        _ => Plane::axis_aligned(axis, offset, index),
    }
}

/// Score every candidate plane, in parallel, and return the minimizer with
/// the deterministic tie-break of §4.5/§5: smaller total cost wins; on a
/// tie, the candidate earlier in `planes` wins, independent of which
/// worker thread evaluated it.
fn search_best_plane(
    part: &Part,
    planes: &[Plane],
    params: &Params,
    v0: f64,
    cancel: &AtomicBool,
) -> Option<(Plane, f64)> {
    if planes.is_empty() {
        return None;
    }
    let surface_only = part.primitives.select_surface_only();

    planes
        .par_iter()
        .enumerate()
        .filter(|&(i, _)| {
            if i % 128 == 0 && cancel.load(Ordering::Acquire) {
                return false;
            }
            true
        })
        .filter_map(|(i, plane)| plane_cost(part, &surface_only, plane, params, v0).map(|c| (i, *plane, c)))
        .reduce_with(|a, b| if (b.2, b.0) < (a.2, a.0) { b } else { a })
        .map(|(_, plane, cost)| (plane, cost))
}

fn plane_cost(
    part: &Part,
    surface_only: &PrimitiveSet,
    plane: &Plane,
    params: &Params,
    v0: f64,
) -> Option<f64> {
    let (v_pos, v_neg) = part.primitives.compute_clipped_volumes(plane);

    let (ch_pos_volume, ch_neg_volume) = if params.convexhull_approximation {
        let (hull_pos, hull_neg) = part.hull.clip(plane);
        let mut pos_pts = hull_pos.points.clone();
        let mut neg_pts = hull_neg.points.clone();
        surface_only.intersect(plane, &mut pos_pts, &mut neg_pts, params.convexhull_downsampling as usize);
        (hull_volume_of(&pos_pts)?, hull_volume_of(&neg_pts)?)
    } else {
        let (surf_pos, surf_neg) = surface_only.clip(plane);
        (
            surf_pos.compute_convex_hull(params.convexhull_downsampling as usize).ok()?.compute_volume(),
            surf_neg.compute_convex_hull(params.convexhull_downsampling as usize).ok()?.compute_volume(),
        )
    };

    let concavity = (ch_pos_volume - v_pos).abs() / v0 + (ch_neg_volume - v_neg).abs() / v0;
    let balance = params.alpha * (v_pos - v_neg).abs() / v0;

    let symmetry = match part.primitives.principal_frame() {
        Some(frame) => {
            let (dir, w) = frame.preferred_cut_direction();
            params.beta * w * plane.normal().dot(dir)
        }
        None => 0.0,
    };

    Some(concavity + balance + symmetry)
}

fn hull_volume_of(points: &[Vector3]) -> Option<f64> {
    crate::mesh::Mesh::convex_hull(points).ok().map(|m| m.compute_volume())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::NullLogger;
    use crate::mesh::Mesh;
    use crate::volume::voxelize;

    fn l_shape_mesh() -> Mesh {
        // Union of two axis-aligned unit cubes meeting at a right angle:
        // [0,2]x[0,1]x[0,1] plus [0,1]x[1,2]x[0,1].
        let mut points = Vec::new();
        let mut triangles = Vec::new();
        let mut add_box = |min: Vector3, max: Vector3| {
            let base = points.len() as u32;
            let corners = [
                Vector3::new(min.x, min.y, min.z),
                Vector3::new(max.x, min.y, min.z),
                Vector3::new(min.x, max.y, min.z),
                Vector3::new(max.x, max.y, min.z),
                Vector3::new(min.x, min.y, max.z),
                Vector3::new(max.x, min.y, max.z),
                Vector3::new(min.x, max.y, max.z),
                Vector3::new(max.x, max.y, max.z),
            ];
            points.extend_from_slice(&corners);
            let idx: [[u32; 3]; 12] = [
                [0, 1, 3], [0, 3, 2], [4, 6, 7], [4, 7, 5], [0, 2, 6], [0, 6, 4],
                [1, 5, 7], [1, 7, 3], [0, 4, 5], [0, 5, 1], [2, 3, 7], [2, 7, 6],
            ];
            for t in idx {
                triangles.push([base + t[0], base + t[1], base + t[2]]);
            }
        };
        add_box(Vector3::new(0.0, 0.0, 0.0), Vector3::new(2.0, 1.0, 1.0));
        add_box(Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 2.0, 1.0));
        Mesh::new(points, triangles)
    }

    #[test]
    fn high_concavity_threshold_yields_single_terminal_part() {
        let mesh = l_shape_mesh();
        let vs = voxelize(&mesh, 20_000);
        let primitives = PrimitiveSet::Voxel(vs);
        let params = Params { concavity: 1.0, ..Params::default() };
        let cancel = AtomicBool::new(false);
        let mut logger = NullLogger;
        let (parts, _v0) = decompose(primitives, &params, &cancel, &mut logger, |_| {}).unwrap();
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn tight_concavity_threshold_splits_l_shape() {
        let mesh = l_shape_mesh();
        let vs = voxelize(&mesh, 30_000);
        let primitives = PrimitiveSet::Voxel(vs);
        let params = Params { concavity: 0.02, max_convex_hulls: 2, ..Params::default() };
        let cancel = AtomicBool::new(false);
        let mut logger = NullLogger;
        let (parts, _v0) = decompose(primitives, &params, &cancel, &mut logger, |_| {}).unwrap();
        assert!(parts.len() >= 2, "expected the L-shape to split, got {} parts", parts.len());
        let total_volume: f64 = parts.iter().map(|p| p.volume).sum();
        assert!((total_volume - 2.0).abs() < 0.15, "total volume = {total_volume}");
    }

    #[test]
    fn cancellation_returns_no_parts() {
        let mesh = l_shape_mesh();
        let vs = voxelize(&mesh, 20_000);
        let primitives = PrimitiveSet::Voxel(vs);
        let params = Params { concavity: 0.001, ..Params::default() };
        let cancel = AtomicBool::new(true);
        let mut logger = NullLogger;
        let (parts, _v0) = decompose(primitives, &params, &cancel, &mut logger, |_| {}).unwrap();
        assert!(parts.is_empty());
    }
}
