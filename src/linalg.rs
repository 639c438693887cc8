//! A 3x3 matrix type and a Jacobi eigenvalue solver for symmetric matrices,
//! used to diagonalize the inertia tensor of a primitive set into its
//! principal axes (§4.4, glossary "Principal axes").
//!
//! Jacobi's method is the standard closed-loop way to get both eigenvalues
//! and eigenvectors of a small symmetric matrix without a general-purpose
//! linear-algebra dependency; it converges quadratically and is numerically
//! well-behaved for the 3x3 case this crate ever needs.

use crate::geometry::Vector3;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mat3 {
    pub rows: [[f64; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 =
        Mat3 { rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] };

    pub fn zero() -> Mat3 {
        Mat3 { rows: [[0.0; 3]; 3] }
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.rows[r][c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: f64) {
        self.rows[r][c] = v;
    }

    pub fn mul_vec(&self, v: Vector3) -> Vector3 {
        Vector3::new(
            self.rows[0][0] * v.x + self.rows[0][1] * v.y + self.rows[0][2] * v.z,
            self.rows[1][0] * v.x + self.rows[1][1] * v.y + self.rows[1][2] * v.z,
            self.rows[2][0] * v.x + self.rows[2][1] * v.y + self.rows[2][2] * v.z,
        )
    }

    /// This matrix's transpose applied to `v` — used to rotate into the
    /// principal frame with the columns-as-basis-vectors convention
    /// `eigenvectors` returns (see `symmetric_eigen`).
    pub fn mul_vec_transposed(&self, v: Vector3) -> Vector3 {
        Vector3::new(
            self.rows[0][0] * v.x + self.rows[1][0] * v.y + self.rows[2][0] * v.z,
            self.rows[0][1] * v.x + self.rows[1][1] * v.y + self.rows[2][1] * v.z,
            self.rows[0][2] * v.x + self.rows[1][2] * v.y + self.rows[2][2] * v.z,
        )
    }

    pub fn columns(&self) -> [Vector3; 3] {
        [
            Vector3::new(self.rows[0][0], self.rows[1][0], self.rows[2][0]),
            Vector3::new(self.rows[0][1], self.rows[1][1], self.rows[2][1]),
            Vector3::new(self.rows[0][2], self.rows[1][2], self.rows[2][2]),
        ]
    }
}

/// Eigenvalues (descending) and the matrix whose columns are the matching
/// unit eigenvectors, for a symmetric 3x3 `m`.
pub fn symmetric_eigen(m: Mat3) -> ([f64; 3], Mat3) {
    let mut a = m;
    let mut v = Mat3::IDENTITY;

    for _sweep in 0..64 {
        let off = a.get(0, 1).powi(2) + a.get(0, 2).powi(2) + a.get(1, 2).powi(2);
        if off < 1e-30 {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            jacobi_rotate(&mut a, &mut v, p, q);
        }
    }

    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&i, &j| a.get(j, j).partial_cmp(&a.get(i, i)).unwrap());

    let values = [a.get(idx[0], idx[0]), a.get(idx[1], idx[1]), a.get(idx[2], idx[2])];
    let cols = v.columns();
    let mut sorted = Mat3::zero();
    for (new_c, &old_c) in idx.iter().enumerate() {
        let col = cols[old_c];
        sorted.set(0, new_c, col.x);
        sorted.set(1, new_c, col.y);
        sorted.set(2, new_c, col.z);
    }
    (values, sorted)
}

fn jacobi_rotate(a: &mut Mat3, v: &mut Mat3, p: usize, q: usize) {
    let apq = a.get(p, q);
    if apq.abs() < 1e-300 {
        return;
    }
    let app = a.get(p, p);
    let aqq = a.get(q, q);
    let theta = (aqq - app) / (2.0 * apq);
    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;

    for k in 0..3 {
        let akp = a.get(k, p);
        let akq = a.get(k, q);
        a.set(k, p, c * akp - s * akq);
        a.set(k, q, s * akp + c * akq);
    }
    for k in 0..3 {
        let apk = a.get(p, k);
        let aqk = a.get(q, k);
        a.set(p, k, c * apk - s * aqk);
        a.set(q, k, s * apk + c * aqk);
    }
    for k in 0..3 {
        let vkp = v.get(k, p);
        let vkq = v.get(k, q);
        v.set(k, p, c * vkp - s * vkq);
        v.set(k, q, s * vkp + c * vkq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_matrix_is_its_own_eigendecomposition() {
        let mut m = Mat3::zero();
        m.set(0, 0, 3.0);
        m.set(1, 1, 1.0);
        m.set(2, 2, 2.0);
        let (values, _vectors) = symmetric_eigen(m);
        assert!((values[0] - 3.0).abs() < 1e-9);
        assert!((values[1] - 2.0).abs() < 1e-9);
        assert!((values[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn eigenvectors_diagonalize_a_coupled_matrix() {
        let mut m = Mat3::zero();
        m.set(0, 0, 2.0);
        m.set(1, 1, 2.0);
        m.set(2, 2, 5.0);
        m.set(0, 1, 1.0);
        m.set(1, 0, 1.0);
        let (values, vectors) = symmetric_eigen(m);
        for (i, &lambda) in values.iter().enumerate() {
            let col = vectors.columns()[i];
            let mv = m.mul_vec(col);
            let expected = col.scale(lambda);
            assert!((mv - expected).norm() < 1e-6, "eigenpair {i} mismatched");
        }
    }
}
