//! Hull merger (§4.6 "C6"): greedily merges the pair of hulls with the
//! lowest combined-concavity cost until every remaining pair is above
//! `gamma` and the count is already within `max_convex_hulls`, or — when
//! still over budget — until the count itself is forced down regardless
//! of cost.
//!
//! The cost matrix is packed lower-triangular storage addressed by
//! `row*(row-1)/2 + col` (§3 "CostMatrix"): `n` hulls cost `n*(n-1)/2`
//! floats rather than a full `n*n` grid.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::hull::Hull;
use crate::mesh::Mesh;

const MERGED_AWAY: f64 = f64::INFINITY;

struct CostMatrix {
    costs: Vec<f64>,
    n: usize,
}

impl CostMatrix {
    fn build(hulls: &[Hull], v0: f64) -> CostMatrix {
        let n = hulls.len();
        let costs = vec![0.0; n * n.saturating_sub(1) / 2];
        let mut m = CostMatrix { costs, n };
        for row in 1..n {
            for col in 0..row {
                let cost = merge_cost(&hulls[row], &hulls[col], v0);
                m.set(row, col, cost);
            }
        }
        m
    }

    #[inline]
    fn packed_index(row: usize, col: usize) -> usize {
        debug_assert!(row > col, "cost matrix is strictly lower-triangular: row={row} col={col}");
        row * (row - 1) / 2 + col
    }

    /// Recover `(row, col)` from a packed index, per §4.6's explicit
    /// formula.
    fn recover(k: usize) -> (usize, usize) {
        let row = (((1.0 + 8.0 * k as f64).sqrt() - 1.0) / 2.0).ceil() as usize;
        let col = k - row * (row - 1) / 2;
        assert!(row > col, "recovered row must exceed col: row={row} col={col} k={k}");
        (row, col)
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.costs[Self::packed_index(row, col)]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        let idx = Self::packed_index(row, col);
        self.costs[idx] = value;
    }

    /// The cheapest pair, breaking ties by the smaller `(row, col)` in
    /// lexicographic order (§4.6 step 1).
    fn find_min(&self) -> Option<(usize, usize, f64)> {
        let mut best: Option<(usize, usize, f64)> = None;
        for row in 1..self.n {
            for col in 0..row {
                let cost = self.get(row, col);
                best = Some(match best {
                    None => (row, col, cost),
                    Some((br, bc, bcost)) => {
                        if (cost, row, col) < (bcost, br, bc) {
                            (row, col, cost)
                        } else {
                            (br, bc, bcost)
                        }
                    }
                });
            }
        }
        best
    }

    /// Move every entry involving `last` to the slot `dest` vacated by a
    /// removed hull, mirroring the `Vec::swap_remove` the caller performs
    /// on the hull list itself — the merge cost between two hulls depends
    /// only on their identity, not their storage index, so relabeling the
    /// slot is exact, not an approximation.
    fn relabel(&mut self, dest: usize, last: usize) {
        if dest == last {
            return;
        }
        for x in 0..self.n {
            if x == dest || x == last {
                continue;
            }
            let moved = self.get(last.max(x), last.min(x));
            self.set(dest.max(x), dest.min(x), moved);
        }
    }

    fn pop_last(&mut self) {
        self.n -= 1;
        self.costs.truncate(self.n * self.n.saturating_sub(1) / 2);
    }

    /// Recompute every entry touching `idx` against the other `n - 1`
    /// surviving hulls (§4.6 step 3, "recompute cost entries only for p2").
    fn recompute_row(&mut self, idx: usize, hulls: &[Hull], v0: f64) {
        for other in 0..self.n {
            if other == idx {
                continue;
            }
            let cost = merge_cost(&hulls[idx], &hulls[other], v0);
            self.set(idx.max(other), idx.min(other), cost);
        }
    }
}

/// `concavity(vol(h1) + vol(h2), vol(hull(h1 ∪ h2)), V0)` (§3 "CostMatrix"),
/// or `+∞` if the combined hull degenerates (§4.6 "Failure mode").
fn merge_cost(h1: &Hull, h2: &Hull, v0: f64) -> f64 {
    let mut points = h1.mesh.points.clone();
    points.extend_from_slice(&h2.mesh.points);
    match Mesh::convex_hull(&points) {
        Ok(combined) => {
            let combined_volume = combined.compute_volume();
            if combined_volume <= 1e-300 {
                MERGED_AWAY
            } else {
                (combined_volume - (h1.volume + h2.volume)).abs() / v0.max(1e-300)
            }
        }
        Err(_) => MERGED_AWAY,
    }
}

/// Greedily merge hulls down per §4.6, checking `cancel` at stage
/// boundaries and every 128 merge iterations (§4.8).
///
/// `v0` is the pipeline's single root volume (spec.md:46, "the volume of
/// the first-iteration root hull") that every `concavity(...)` cost is
/// normalized against — the same constant `simplifier::simplify` uses for
/// its own volume floor, not a value re-derived from the hulls being
/// merged here.
pub fn merge(mut hulls: Vec<Hull>, gamma: f64, max_convex_hulls: u32, v0: f64, cancel: &AtomicBool) -> Vec<Hull> {
    if hulls.len() < 2 {
        return hulls;
    }
    let v0 = v0.max(1e-300);
    let mut matrix = CostMatrix::build(&hulls, v0);

    let mut iterations = 0u32;
    loop {
        if iterations % 128 == 0 && cancel.load(Ordering::Acquire) {
            break;
        }
        iterations += 1;

        let Some((p1, p2, min_cost)) = matrix.find_min() else {
            break;
        };
        let over_budget = hulls.len() > max_convex_hulls as usize;
        if min_cost >= gamma && !over_budget {
            break;
        }

        let mut points = hulls[p1].mesh.points.clone();
        points.extend_from_slice(&hulls[p2].mesh.points);
        let combined_mesh = match Mesh::convex_hull(&points) {
            Ok(m) => m,
            Err(_) => {
                // Should not happen: this pair's cost just won the
                // minimum search, which already requires a valid hull.
                // Treat as unmergeable and stop rather than loop forever.
                break;
            }
        };
        hulls[p2] = Hull::from_mesh(combined_mesh);

        let last = hulls.len() - 1;
        hulls.swap_remove(p1);
        matrix.relabel(p1, last);
        matrix.pop_last();

        matrix.recompute_row(p2, &hulls, v0);

        if hulls.len() < 2 {
            break;
        }
    }

    hulls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector3;

    fn cube_at(min: Vector3, size: f64) -> Hull {
        let max = min + Vector3::new(size, size, size);
        let p = [
            Vector3::new(min.x, min.y, min.z),
            Vector3::new(max.x, min.y, min.z),
            Vector3::new(min.x, max.y, min.z),
            Vector3::new(max.x, max.y, min.z),
            Vector3::new(min.x, min.y, max.z),
            Vector3::new(max.x, min.y, max.z),
            Vector3::new(min.x, max.y, max.z),
            Vector3::new(max.x, max.y, max.z),
        ];
        let triangles: Vec<[u32; 3]> = vec![
            [0, 1, 3], [0, 3, 2], [4, 6, 7], [4, 7, 5], [0, 2, 6], [0, 6, 4],
            [1, 5, 7], [1, 7, 3], [0, 4, 5], [0, 5, 1], [2, 3, 7], [2, 7, 6],
        ];
        Hull::from_mesh(Mesh::new(p.to_vec(), triangles))
    }

    #[test]
    fn adjacent_cubes_merge_under_loose_gamma() {
        let hulls = vec![
            cube_at(Vector3::new(0.0, 0.0, 0.0), 1.0),
            cube_at(Vector3::new(1.0, 0.0, 0.0), 1.0),
        ];
        let cancel = AtomicBool::new(false);
        let merged = merge(hulls, 1.0, 64, 1.0, &cancel);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].volume - 2.0).abs() < 1e-6);
    }

    #[test]
    fn distant_cubes_stay_separate_under_tight_gamma() {
        let hulls = vec![
            cube_at(Vector3::new(0.0, 0.0, 0.0), 1.0),
            cube_at(Vector3::new(100.0, 0.0, 0.0), 1.0),
        ];
        let cancel = AtomicBool::new(false);
        let merged = merge(hulls, 0.0001, 64, 1.0, &cancel);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn count_budget_forces_merge_past_gamma() {
        let hulls = vec![
            cube_at(Vector3::new(0.0, 0.0, 0.0), 1.0),
            cube_at(Vector3::new(100.0, 0.0, 0.0), 1.0),
            cube_at(Vector3::new(200.0, 0.0, 0.0), 1.0),
        ];
        let cancel = AtomicBool::new(false);
        let merged = merge(hulls, 0.0001, 2, 1.0, &cancel);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn packed_index_and_recover_are_inverses() {
        for row in 1..8usize {
            for col in 0..row {
                let k = CostMatrix::packed_index(row, col);
                assert_eq!(CostMatrix::recover(k), (row, col));
            }
        }
    }

    #[test]
    fn cancellation_stops_without_panicking() {
        let hulls = vec![
            cube_at(Vector3::new(0.0, 0.0, 0.0), 1.0),
            cube_at(Vector3::new(1.0, 0.0, 0.0), 1.0),
        ];
        let cancel = AtomicBool::new(true);
        let merged = merge(hulls, 1.0, 64, 1.0, &cancel);
        assert_eq!(merged.len(), 2);
    }
}
