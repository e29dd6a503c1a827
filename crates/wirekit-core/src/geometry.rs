//! Point and vector vocabulary
//!
//! Every component works on `nalgebra` f64 points. The helpers here are the
//! single epsilon-aware equality and arc-length routines the pipeline shares.

use nalgebra::{Point3 as NaPoint3, Vector3 as NaVector3};

/// 3D point type
pub type Point3 = NaPoint3<f64>;

/// 3D vector type
pub type Vector3 = NaVector3<f64>;

/// A 3D line segment as a pair of endpoints
pub type Segment3 = (Point3, Point3);

/// Returns true when `a` and `b` are within `eps` of each other.
pub fn points_coincide(a: &Point3, b: &Point3, eps: f64) -> bool {
    (a - b).norm() <= eps
}

/// Z component of the XY cross product `u × v`.
pub fn cross_2d(u: &Vector3, v: &Vector3) -> f64 {
    u.x * v.y - u.y * v.x
}

/// Length of the XY projection of a vector.
pub fn norm_2d(v: &Vector3) -> f64 {
    v.x.hypot(v.y)
}

/// Point reflection of `p` through `center` (`2·center − p`).
pub fn reflect_through(p: &Point3, center: &Point3) -> Point3 {
    Point3::from(center.coords * 2.0 - p.coords)
}

/// Linear interpolation between two points.
pub fn lerp(a: &Point3, b: &Point3, t: f64) -> Point3 {
    a + (b - a) * t
}

/// Check that every coordinate of a point is finite.
pub fn is_finite_point(p: &Point3) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// Cumulative arc lengths along an open sequence of points.
///
/// `result[i]` is the length from `points[0]` to `points[i]`.
pub fn cumulative_lengths(points: &[Point3]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += (p - points[i - 1]).norm();
        }
        cum.push(total);
    }
    cum
}

/// Cumulative arc lengths around a closed ring.
///
/// Returns `ring.len() + 1` entries; the last is the full loop length.
pub fn cumulative_ring_lengths(ring: &[Point3]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(ring.len() + 1);
    let mut total = 0.0;
    cum.push(0.0);
    for i in 0..ring.len() {
        let next = (i + 1) % ring.len();
        total += (ring[next] - ring[i]).norm();
        cum.push(total);
    }
    cum
}

/// Point at `target` arc length along an open path with precomputed
/// cumulative lengths. Clamps to the path ends.
pub fn point_at_length(points: &[Point3], cum: &[f64], target: f64, eps: f64) -> Option<Point3> {
    let first = *points.first()?;
    let last = *points.last()?;
    let total = *cum.last()?;
    if target <= 0.0 {
        return Some(first);
    }
    if target >= total {
        return Some(last);
    }
    for i in 1..points.len() {
        if cum[i] >= target {
            let seg = cum[i] - cum[i - 1];
            if seg <= eps {
                return Some(points[i]);
            }
            let t = (target - cum[i - 1]) / seg;
            return Some(lerp(&points[i - 1], &points[i], t));
        }
    }
    Some(last)
}

/// Shoelace area of a ring projected to XY (positive when counter-clockwise).
pub fn signed_area_xy(ring: &[Point3]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice * 0.5
}

/// Index of the point in `points` nearest to `target`, first wins on ties.
pub fn nearest_index(points: &[Point3], target: &Point3) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = (p - target).norm_squared();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_through() {
        let p = Point3::new(1.0, 2.0, 0.0);
        let c = Point3::new(0.0, 0.0, 5.0);
        assert_eq!(reflect_through(&p, &c), Point3::new(-1.0, -2.0, 10.0));
    }

    #[test]
    fn test_cumulative_ring_lengths() {
        let ring = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let cum = cumulative_ring_lengths(&ring);
        assert_eq!(cum.len(), 5);
        assert!((cum[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_at_length_interpolates() {
        let pts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 2.0)];
        let cum = cumulative_lengths(&pts);
        let mid = point_at_length(&pts, &cum, cum[1] / 2.0, 1e-9).unwrap();
        assert!(points_coincide(&mid, &Point3::new(2.0, 0.0, 1.0), 1e-12));
    }

    #[test]
    fn test_nearest_index_first_wins() {
        let pts = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(-1.0, 0.0, 0.0)];
        assert_eq!(nearest_index(&pts, &Point3::origin()), Some(0));
        assert_eq!(nearest_index(&[], &Point3::origin()), None);
    }
}
