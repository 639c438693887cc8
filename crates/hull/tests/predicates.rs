use vhacd_hull::{orient3d, orient3d_sign, Point3};

#[test]
fn sign_flips_under_odd_permutation() {
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(1.0, 0.0, 0.0);
    let c = Point3::new(0.0, 1.0, 0.0);
    let d = Point3::new(0.0, 0.0, 1.0);

    let base = orient3d(a, b, c, d);
    assert!(base > 0.0);
    // Swapping b and c is an odd permutation: sign must flip.
    assert!(orient3d(a, c, b, d) < 0.0);
}

#[test]
fn consistent_under_cyclic_permutation() {
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(1.0, 0.0, 0.0);
    let c = Point3::new(0.0, 1.0, 0.0);
    let d = Point3::new(0.3, 0.3, 1.0);

    let s1 = orient3d_sign(a, b, c, d);
    let s2 = orient3d_sign(b, c, a, d);
    let s3 = orient3d_sign(c, a, b, d);
    assert_eq!(s1, s2);
    assert_eq!(s2, s3);
}

#[test]
fn coplanar_points_are_zero() {
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(1.0, 0.0, 0.0);
    let c = Point3::new(0.0, 1.0, 0.0);
    let d = Point3::new(0.5, 0.5, 0.0);
    assert_eq!(orient3d(a, b, c, d), 0.0);
}
