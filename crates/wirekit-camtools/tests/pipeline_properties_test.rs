use wirekit_camtools::corner_sync::{sync_corners, PerimeterSet};
use wirekit_camtools::gcode::emit_gcode;
use wirekit_camtools::intersect::{intersect_segments, Intersection};
use wirekit_camtools::plane_slicer::slice_at_heights;
use wirekit_camtools::rulings::{detect_rulings, filter_by_span};
use wirekit_camtools::stitcher::stitch;
use wirekit_core::{Point3, SyncPair, Tolerances, TriangleMesh};

fn regular_polygon(n: usize, radius: f64) -> Vec<[f64; 2]> {
    (0..n)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / n as f64;
            [radius * a.cos(), radius * a.sin()]
        })
        .collect()
}

fn ring(outline: &[[f64; 2]], z: f64) -> Vec<Point3> {
    outline.iter().map(|[x, y]| Point3::new(*x, *y, z)).collect()
}

#[test]
fn test_prism_caps_slice_to_known_perimeter() {
    for n in [3, 5, 8] {
        let radius = 4.0;
        let mesh = TriangleMesh::prism(&regular_polygon(n, radius), 0.0, 12.0).unwrap();
        let slices = slice_at_heights(&mesh, None, None, &Tolerances::default()).unwrap();
        let expected = n as f64 * 2.0 * radius * (std::f64::consts::PI / n as f64).sin();

        for perimeter in [&slices.bottom, &slices.top] {
            assert_eq!(perimeter.polylines.len(), 1);
            let poly = &perimeter.polylines[0];
            assert!(poly.closed);
            assert_eq!(poly.len(), n + 1);
            assert!((poly.length() - expected).abs() < 1e-4);
        }
    }
}

#[test]
fn test_span_filter_property() {
    let height = 8.0;
    let chains: Vec<(Point3, Point3)> = [0.0, 0.3, 0.6, 1.0]
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let x = i as f64;
            (Point3::new(x, 1.0, 2.0), Point3::new(x, 1.0, 2.0 + s * height))
        })
        .collect();
    let kept: Vec<f64> = filter_by_span(&chains, 2.0, 2.0 + height, 0.5)
        .iter()
        .map(|r| r.span() / height)
        .collect();
    assert_eq!(kept, vec![0.6, 1.0]);
}

#[test]
fn test_box_has_vertical_and_diagonal_rulings() {
    let outline = [[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0]];
    let mesh = TriangleMesh::prism(&outline, 0.0, 6.0).unwrap();
    let rulings = detect_rulings(&mesh, 0.0, 6.0, 0.9, &Tolerances::default()).unwrap();
    assert_eq!(rulings.len(), 8);
    let vertical = rulings
        .iter()
        .filter(|r| (r.top.x - r.bottom.x).abs() < 1e-12 && (r.top.y - r.bottom.y).abs() < 1e-12)
        .count();
    assert_eq!(vertical, 4);
}

#[test]
fn test_stitcher_is_deterministic_and_closed() {
    let tol = Tolerances::default();
    let mesh = TriangleMesh::loft(
        &regular_polygon(6, 10.0),
        &regular_polygon(6, 6.0),
        0.0,
        10.0,
    )
    .unwrap();
    let slices = slice_at_heights(&mesh, None, None, &tol).unwrap();
    let p0 = slices.bottom.primary_ring("bottom").unwrap();
    let p1 = slices.top.primary_ring("top").unwrap();
    let rulings = detect_rulings(&mesh, 0.0, 10.0, 0.9, &tol).unwrap();

    let first = stitch(&p0, &p1, &rulings, None, &tol).unwrap();
    let second = stitch(&p0, &p1, &rulings, None, &tol).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), p1.len() + 1);
    assert_eq!(first.first(), first.last());
    assert!(first.iter().any(|s| s.is_ruling));
}

fn one_right_angle_set() -> PerimeterSet {
    // a right angle at the origin, every other corner above 100 degrees
    let outline = [[0.0, 0.0], [10.0, 0.0], [14.0, 8.0], [8.0, 14.0], [0.0, 10.0]];
    PerimeterSet {
        top: ring(&outline, 10.0),
        upper_quarter: ring(&outline, 7.5),
        middle: ring(&outline, 5.0),
        lower_quarter: ring(&outline, 2.5),
        bottom: ring(&outline, 0.0),
    }
}

#[test]
fn test_corner_sync_threshold_100_finds_right_angle() {
    let result = sync_corners(&one_right_angle_set(), 100.0, &Tolerances::default()).unwrap();
    assert_eq!(result.sync_pairs, vec![SyncPair::new(0, 0)]);
    assert_eq!(result.solution_lines.len(), 1);
    let line = result.solution_lines[0];
    assert!((line.angle_deg - 90.0).abs() < 1e-9);
    assert!((line.top - Point3::new(0.0, 0.0, 10.0)).norm() < 1e-9);
    assert!((line.bottom - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-9);
}

#[test]
fn test_corner_sync_threshold_45_finds_nothing() {
    let set = one_right_angle_set();
    let result = sync_corners(&set, 45.0, &Tolerances::default()).unwrap();
    assert!(result.sync_pairs.is_empty());
    assert!(result.solution_lines.is_empty());
    assert_eq!(result.top, set.top);
    assert_eq!(result.bottom, set.bottom);
}

#[test]
fn test_diagonals_cross_at_center() {
    let hit = intersect_segments(
        &Point3::new(0.0, 0.0, 0.0),
        &Point3::new(10.0, 10.0, 4.0),
        &Point3::new(0.0, 10.0, 9.0),
        &Point3::new(10.0, 0.0, 9.0),
        1e-9,
    );
    match hit {
        Some(Intersection::Point(p)) => {
            assert!((p.x - 5.0).abs() < 1e-12);
            assert!((p.y - 5.0).abs() < 1e-12);
            // Z follows the first segment
            assert!((p.z - 2.0).abs() < 1e-12);
        }
        other => panic!("expected a point, got {:?}", other),
    }
}

#[test]
fn test_unit_square_program() {
    let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let top = ring(&square, 10.0);
    let bottom = ring(&square, 0.0);
    let pairs = [SyncPair::new(0, 0)];
    let program = emit_gcode(&top, &bottom, &pairs, &Tolerances::default()).unwrap();

    let lines: Vec<&str> = program.split('\n').collect();
    assert_eq!(lines.len(), 5);
    for (k, line) in lines.iter().enumerate() {
        let b = bottom[k % 4];
        let t = top[k % 4];
        let expected = format!(
            "G1 X{:.4} Y{:.4} Z{:.4} U{:.4} V{:.4} W{:.4}",
            t.x, t.y, t.z, b.x, b.y, b.z
        );
        assert_eq!(*line, expected);
    }
}
