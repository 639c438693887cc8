use vhacd_hull::{IncrementalHull, Point3, ProcessResult};

fn cube_points() -> Vec<Point3> {
    let mut pts = Vec::new();
    for &x in &[0.0, 1.0] {
        for &y in &[0.0, 1.0] {
            for &z in &[0.0, 1.0] {
                pts.push(Point3::new(x, y, z));
            }
        }
    }
    pts
}

#[test]
fn simplify_is_noop_under_budget() {
    let mut hull = IncrementalHull::new();
    hull.add_points(&cube_points());
    hull.process(64, 0.0);
    let before = hull.num_vertices();
    hull.simplify(64, 1e-9);
    assert_eq!(hull.num_vertices(), before);
}

#[test]
fn simplify_reduces_vertex_count_for_near_spherical_cloud() {
    let mut pts = Vec::new();
    let n = 24;
    for i in 0..n {
        let theta = (i as f64) * std::f64::consts::PI * 2.0 / n as f64;
        for j in 0..12 {
            let phi = (j as f64) * std::f64::consts::PI / 12.0;
            pts.push(Point3::new(
                theta.cos() * phi.sin(),
                theta.sin() * phi.sin(),
                phi.cos(),
            ));
        }
    }
    let mut hull = IncrementalHull::new();
    hull.add_points(&pts);
    let result = hull.process(10_000, 0.0);
    assert_eq!(result, ProcessResult::Ok);
    let before = hull.num_vertices();
    assert!(before > 12);

    hull.simplify(12, 1.0);
    assert!(hull.num_vertices() <= 12);
    assert!(hull.num_vertices() >= 4);
}
