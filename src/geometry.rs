//! Shared geometric primitives (§3, §4.1): the `Vector3` type and the
//! axis-aligned `Plane` representation the decomposer searches over.
//!
//! `Vector3` is the hull crate's own `Point3` re-exported under the name
//! callers expect here — the two crates share one vector type rather
//! than each defining an equivalent one, the way a single workspace
//! naturally factors a type used on both sides of a crate boundary.

pub use vhacd_hull::point::{Bounds, Point3 as Vector3};
pub use vhacd_hull::predicates::{orient3d, orient3d_sign};

/// Which axis (if any) a `Plane`'s normal is aligned to. The decomposer
/// only ever generates axis-aligned candidate planes (§4.5), but `Plane`
/// itself does not require alignment — `clip`-ing a hull by the capping
/// plane of a previous split, for instance, still produces a `Plane` with
/// `axis: Axis::None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
    None,
}

/// `a*x + b*y + c*z + d = 0`, with `(a, b, c)` a unit normal.
///
/// `index` is the candidate plane's position along its axis in the current
/// part's voxel grid — used only to refine the neighborhood of a winning
/// plane during the coarse-then-fine search (§4.5) and to break ties
/// deterministically (§5).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub axis: Axis,
    pub index: i32,
}

impl Plane {
    /// An axis-aligned plane through `offset` along `axis`, with outward
    /// normal in the positive direction of that axis. `index` is the
    /// caller's grid-plane position, used only for tie-breaking and for
    /// the coarse/fine neighborhood refinement in §4.5.
    pub fn axis_aligned(axis: Axis, offset: f64, index: i32) -> Plane {
        let (a, b, c) = match axis {
            Axis::X => (1.0, 0.0, 0.0),
            Axis::Y => (0.0, 1.0, 0.0),
            Axis::Z => (0.0, 0.0, 1.0),
            Axis::None => panic!("axis_aligned requires a concrete axis"),
        };
        Plane { a, b, c, d: -offset, axis, index }
    }

    pub fn from_point_normal(point: Vector3, normal: Vector3) -> Plane {
        let n = normal.scale(1.0 / normal.norm().max(1e-300));
        Plane { a: n.x, b: n.y, c: n.z, d: -n.dot(point), axis: Axis::None, index: 0 }
    }

    /// Signed distance of `p` from the plane (positive on the side the
    /// normal points toward).
    #[inline]
    pub fn side(&self, p: Vector3) -> f64 {
        self.a * p.x + self.b * p.y + self.c * p.z + self.d
    }

    #[inline]
    pub fn normal(&self) -> Vector3 {
        Vector3::new(self.a, self.b, self.c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_plane_has_zero_side_at_offset() {
        let p = Plane::axis_aligned(Axis::X, 2.5, 10);
        assert!((p.side(Vector3::new(2.5, 9.0, -4.0))).abs() < 1e-12);
        assert!(p.side(Vector3::new(3.5, 0.0, 0.0)) > 0.0);
        assert!(p.side(Vector3::new(1.5, 0.0, 0.0)) < 0.0);
    }
}
