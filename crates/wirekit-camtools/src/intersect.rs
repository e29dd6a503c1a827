//! # Planar Segment Intersection
//!
//! Intersects 3D segments in their XY projection. The result is a point,
//! an overlapping segment (collinear inputs) or nothing. Z is recovered by
//! interpolating along the first segment.

use tracing::trace;
use wirekit_core::geometry::{cross_2d, lerp, norm_2d};
use wirekit_core::{points_coincide, Point3};

/// Result of intersecting two segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    Point(Point3),
    Segment(Point3, Point3),
}

impl Intersection {
    /// Every point carried by the intersection.
    pub fn points(&self) -> Vec<Point3> {
        match self {
            Intersection::Point(p) => vec![*p],
            Intersection::Segment(a, b) => vec![*a, *b],
        }
    }
}

/// Intersect segment `a0→a1` with segment `b0→b1`.
pub fn intersect_segments(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
    eps: f64,
) -> Option<Intersection> {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let det = cross_2d(&d1, &d2);

    if det.abs() < eps {
        return intersect_parallel(a0, a1, b0, b1, eps);
    }

    let r = b0 - a0;
    let t = cross_2d(&r, &d2) / det;
    let s = cross_2d(&r, &d1) / det;
    let range = -eps..=1.0 + eps;
    if !range.contains(&t) || !range.contains(&s) {
        return None;
    }
    Some(Intersection::Point(lerp(a0, a1, t)))
}

/// Parallel inputs: overlap of the two ranges along the dominant axis.
fn intersect_parallel(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
    eps: f64,
) -> Option<Intersection> {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let len1 = norm_2d(&d1);
    if len1 <= eps {
        // segment 1 is a single point in XY
        return on_segment(a0, b0, b1, eps).map(|_| Intersection::Point(*a0));
    }
    if norm_2d(&d2) <= eps {
        return on_segment(b0, a0, a1, eps).map(|t| Intersection::Point(lerp(a0, a1, t)));
    }

    // distance of b's endpoints from a's supporting line
    let off0 = cross_2d(&d1, &(b0 - a0)) / len1;
    let off1 = cross_2d(&d1, &(b1 - a0)) / len1;
    if off0.abs() > eps || off1.abs() > eps {
        return None;
    }

    let axis = if d1.x.abs() >= d1.y.abs() { 0 } else { 1 };
    let (a_lo, a_hi) = min_max(a0[axis], a1[axis]);
    let (b_lo, b_hi) = min_max(b0[axis], b1[axis]);
    let lo = a_lo.max(b_lo);
    let hi = a_hi.min(b_hi);
    if hi < lo - eps {
        return None;
    }

    let at = |value: f64| lerp(a0, a1, ((value - a0[axis]) / d1[axis]).clamp(0.0, 1.0));
    if hi - lo <= eps {
        return Some(Intersection::Point(at((lo + hi) * 0.5)));
    }
    Some(Intersection::Segment(at(lo), at(hi)))
}

/// Parameter of `p` along `s0→s1` when `p` lies on that segment in XY.
fn on_segment(p: &Point3, s0: &Point3, s1: &Point3, eps: f64) -> Option<f64> {
    let d = s1 - s0;
    let len = norm_2d(&d);
    let r = p - s0;
    if len <= eps {
        return (norm_2d(&r) <= eps).then_some(0.0);
    }
    if (cross_2d(&d, &r) / len).abs() > eps {
        return None;
    }
    let along = (d.x * r.x + d.y * r.y) / len;
    if along < -eps || along > len + eps {
        return None;
    }
    Some((along / len).clamp(0.0, 1.0))
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Collapse duplicate results into a deterministic set.
///
/// Points within `eps` merge (first wins), segments with coincident ends
/// become points, and segment endpoints are ordered by X then Y.
pub fn dedup_intersections(results: Vec<Intersection>, eps: f64) -> Vec<Intersection> {
    let mut out: Vec<Intersection> = Vec::with_capacity(results.len());
    for item in results {
        let item = match item {
            Intersection::Segment(a, b) if points_coincide(&a, &b, eps) => Intersection::Point(a),
            Intersection::Segment(a, b) => {
                let in_order = if (a.x - b.x).abs() > eps {
                    a.x < b.x
                } else {
                    a.y <= b.y
                };
                if in_order {
                    Intersection::Segment(a, b)
                } else {
                    Intersection::Segment(b, a)
                }
            }
            point => point,
        };
        let duplicate = out.iter().any(|seen| match (seen, &item) {
            (Intersection::Point(p), Intersection::Point(q)) => points_coincide(p, q, eps),
            (Intersection::Segment(p0, p1), Intersection::Segment(q0, q1)) => {
                points_coincide(p0, q0, eps) && points_coincide(p1, q1, eps)
            }
            _ => false,
        });
        if !duplicate {
            out.push(item);
        }
    }
    out
}

/// All intersections between the edges of two closed rings.
pub fn intersect_rings(a: &[Point3], b: &[Point3], eps: f64) -> Vec<Intersection> {
    let mut results = Vec::new();
    for i in 0..a.len() {
        let (a0, a1) = (&a[i], &a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            let (b0, b1) = (&b[j], &b[(j + 1) % b.len()]);
            if let Some(hit) = intersect_segments(a0, a1, b0, b1, eps) {
                results.push(hit);
            }
        }
    }
    let results = dedup_intersections(results, eps);
    trace!("Ring intersection found {} results", results.len());
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_crossing_diagonals() {
        let hit = intersect_segments(
            &p(0.0, 0.0, 0.0),
            &p(10.0, 10.0, 10.0),
            &p(0.0, 10.0, 3.0),
            &p(10.0, 0.0, 3.0),
            1e-9,
        );
        assert_eq!(hit, Some(Intersection::Point(p(5.0, 5.0, 5.0))));
    }

    #[test]
    fn test_disjoint_segments() {
        let hit = intersect_segments(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(2.0, -1.0, 0.0),
            &p(2.0, 1.0, 0.0),
            1e-9,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn test_parallel_offset_is_none() {
        let hit = intersect_segments(
            &p(0.0, 0.0, 0.0),
            &p(4.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
            &p(4.0, 1.0, 0.0),
            1e-9,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn test_collinear_overlap_is_segment() {
        let hit = intersect_segments(
            &p(0.0, 0.0, 0.0),
            &p(4.0, 0.0, 4.0),
            &p(6.0, 0.0, 0.0),
            &p(2.0, 0.0, 0.0),
            1e-9,
        );
        assert_eq!(hit, Some(Intersection::Segment(p(2.0, 0.0, 2.0), p(4.0, 0.0, 4.0))));
    }

    #[test]
    fn test_collinear_touching_is_point() {
        let hit = intersect_segments(
            &p(0.0, 0.0, 0.0),
            &p(0.0, 3.0, 0.0),
            &p(0.0, 3.0, 0.0),
            &p(0.0, 5.0, 0.0),
            1e-9,
        );
        assert_eq!(hit, Some(Intersection::Point(p(0.0, 3.0, 0.0))));
    }

    #[test]
    fn test_dedup_merges_and_orders() {
        let merged = dedup_intersections(
            vec![
                Intersection::Point(p(1.0, 1.0, 0.0)),
                Intersection::Point(p(1.0, 1.0 + 1e-12, 0.0)),
                Intersection::Segment(p(3.0, 0.0, 0.0), p(2.0, 0.0, 0.0)),
                Intersection::Segment(p(5.0, 5.0, 0.0), p(5.0, 5.0, 0.0)),
            ],
            1e-9,
        );
        assert_eq!(
            merged,
            vec![
                Intersection::Point(p(1.0, 1.0, 0.0)),
                Intersection::Segment(p(2.0, 0.0, 0.0), p(3.0, 0.0, 0.0)),
                Intersection::Point(p(5.0, 5.0, 0.0)),
            ]
        );
    }

    #[test]
    fn test_point_segment_off_the_other_segment() {
        let hit = intersect_segments(
            &p(5.0, 5.0, 0.0),
            &p(5.0, 5.0, 0.0),
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 0.0),
            1e-9,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn test_point_segment_on_the_other_segment() {
        let hit = intersect_segments(
            &p(5.0, 0.0, 2.0),
            &p(5.0, 0.0, 2.0),
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 0.0),
            1e-9,
        );
        assert_eq!(hit, Some(Intersection::Point(p(5.0, 0.0, 2.0))));

        let reversed = intersect_segments(
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 10.0),
            &p(4.0, 0.0, 7.0),
            &p(4.0, 0.0, 7.0),
            1e-9,
        );
        assert_eq!(reversed, Some(Intersection::Point(p(4.0, 0.0, 4.0))));
        assert_eq!(
            intersect_segments(
                &p(0.0, 0.0, 0.0),
                &p(10.0, 0.0, 0.0),
                &p(4.0, 3.0, 0.0),
                &p(4.0, 3.0, 0.0),
                1e-9,
            ),
            None
        );
    }

    #[test]
    fn test_two_point_segments() {
        let a = p(1.0, 1.0, 0.0);
        let b = p(1.0, 1.0, 4.0);
        assert_eq!(intersect_segments(&a, &a, &b, &b, 1e-9), Some(Intersection::Point(a)));
        let c = p(2.0, 1.0, 0.0);
        assert_eq!(intersect_segments(&a, &a, &c, &c, 1e-9), None);
    }
}
