use crate::point::Point3;

/// Sign of the 3x3 determinant of `(b-a, c-a, d-a)`, i.e. six times the
/// signed volume of tetrahedron `(a, b, c, d)`.
///
/// Positive when `d` is on the side of plane `(a, b, c)` that a right-handed
/// normal `(b-a) x (c-a)` points towards; zero on (or numerically near) the
/// plane; negative on the other side.
///
/// Consistent under the four even permutations of `(a, b, c, d)` that share
/// an orientation, and flips sign under an odd permutation, by construction:
/// the determinant is the standard scalar triple product of the edge
/// vectors, not a fitted approximation. Degenerate results — |det| smaller
/// than `1e-12 * diag^3` for the tetrahedron's own bounding-box diagonal
/// `diag` — collapse to exactly `0.0` so that callers see a clean
/// coplanar/degenerate signal instead of a random-sign rounding artifact.
#[inline]
pub fn orient3d(a: Point3, b: Point3, c: Point3, d: Point3) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let det = ab.dot(ac.cross(ad));

    let diag = match crate::point::Bounds::of(&[a, b, c, d]) {
        Some(bounds) => bounds.diagonal(),
        None => 0.0,
    };
    let tol = 1e-12 * diag * diag * diag;

    if det.abs() <= tol.max(1e-300) { 0.0 } else { det }
}

/// `orient3d`'s sign only, as `-1`, `0`, or `1`.
#[inline]
pub fn orient3d_sign(a: Point3, b: Point3, c: Point3, d: Point3) -> i32 {
    let det = orient3d(a, b, c, d);
    if det > 0.0 { 1 } else if det < 0.0 { -1 } else { 0 }
}
