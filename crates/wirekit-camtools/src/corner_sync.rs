//! # Corner Synchronization
//!
//! Adds matched vertices to the top and bottom rails at sharp corners of the
//! middle perimeter, so the wire passes through each corner on a straight
//! line instead of smearing it.
//!
//! For a corner `p` the bottom and lower-quarter perimeters are mirrored
//! through `p`. Where the mirrored bottom crosses the top, and the mirrored
//! lower quarter crosses the upper quarter, lie candidate points; a pair that
//! is collinear with `p` describes a straight line through the corner. The
//! top end of the nearest such line becomes the top sync point and its
//! mirror image through `p` the bottom sync point.

use crate::intersect::intersect_rings;
use tracing::{debug, info};
use wirekit_core::geometry::{norm_2d, reflect_through};
use wirekit_core::{
    points_coincide, require_ring, GeometryError, GeometryResult, Point3, SyncPair, Tolerances,
};

/// Interior angles this close to 180 degrees are treated as straight
const STRAIGHT_EPS_DEG: f64 = 1e-6;

/// The five single-loop perimeters corner synchronization works on
#[derive(Debug, Clone, PartialEq)]
pub struct PerimeterSet {
    pub top: Vec<Point3>,
    pub upper_quarter: Vec<Point3>,
    pub middle: Vec<Point3>,
    pub lower_quarter: Vec<Point3>,
    pub bottom: Vec<Point3>,
}

/// The straight wire line found through one corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionLine {
    /// Middle-perimeter vertex the line passes through
    pub corner: Point3,
    /// Top rail end
    pub top: Point3,
    /// Bottom rail end (the top end mirrored through the corner)
    pub bottom: Point3,
    /// Interior angle at the corner in degrees
    pub angle_deg: f64,
}

/// Rails with corner vertices inserted, plus the matching index pairs
#[derive(Debug, Clone, PartialEq)]
pub struct CornerSyncResult {
    pub top: Vec<Point3>,
    pub bottom: Vec<Point3>,
    /// Sorted ascending by top index
    pub sync_pairs: Vec<SyncPair>,
    /// Parallel to `sync_pairs`
    pub solution_lines: Vec<SolutionLine>,
}

/// Interior angle at `p` in the XY plane, in degrees.
///
/// A neighbour with no XY separation from `p` makes the angle undefined,
/// which is reported as 180 so the vertex is ignored.
pub fn interior_angle_deg(prev: &Point3, p: &Point3, next: &Point3, eps: f64) -> f64 {
    let a = norm_2d(&(prev - p));
    let b = norm_2d(&(next - p));
    if a <= eps || b <= eps {
        return 180.0;
    }
    let c = norm_2d(&(next - prev));
    let cos = ((a * a + b * b - c * c) / (2.0 * a * b)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Whether `p`, `a` and `b` lie on one line: the longest of the three
/// pairwise distances equals the sum of the other two.
fn collinear(p: &Point3, a: &Point3, b: &Point3, eps: f64) -> bool {
    let mut d = [(p - a).norm(), (p - b).norm(), (a - b).norm()];
    d.sort_by(f64::total_cmp);
    (d[2] - d[0] - d[1]).abs() <= eps
}

/// Locate `point` on a ring, inserting it when it falls inside an edge.
///
/// Returns the vertex index and whether a vertex was added.
fn locate_or_insert(
    ring: &mut Vec<Point3>,
    point: Point3,
    tol: &Tolerances,
) -> Option<(usize, bool)> {
    if let Some(i) = ring
        .iter()
        .position(|v| points_coincide(v, &point, tol.point_merge))
    {
        return Some((i, false));
    }
    let n = ring.len();
    let edge = (0..n).find(|&i| {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        (a - point).norm() + (point - b).norm() - (a - b).norm() < tol.collinear
    })?;
    let at = edge + 1;
    ring.insert(at, point);
    Some((at, true))
}

/// Find the sync line through corner `p`, if one exists.
fn corner_line(set: &PerimeterSet, p: &Point3, tol: &Tolerances) -> Option<(Point3, Point3)> {
    let mirrored_bottom: Vec<Point3> = set.bottom.iter().map(|q| reflect_through(q, p)).collect();
    let mirrored_lower: Vec<Point3> = set
        .lower_quarter
        .iter()
        .map(|q| reflect_through(q, p))
        .collect();

    let outer: Vec<Point3> = intersect_rings(&mirrored_bottom, &set.top, tol.parametric)
        .iter()
        .flat_map(|hit| hit.points())
        .collect();
    let inner: Vec<Point3> = intersect_rings(&mirrored_lower, &set.upper_quarter, tol.parametric)
        .iter()
        .flat_map(|hit| hit.points())
        .collect();

    let mut best: Option<(f64, Point3)> = None;
    for a in &outer {
        let reach = (a - p).norm();
        if reach <= tol.point_merge {
            continue;
        }
        if !inner.iter().any(|b| collinear(p, a, b, tol.collinear)) {
            continue;
        }
        match best {
            Some((d, _)) if d <= reach => {}
            _ => best = Some((reach, *a)),
        }
    }

    best.map(|(_, top)| (top, reflect_through(&top, p)))
}

/// Insert sync vertices at every middle-perimeter corner sharper than
/// `angle_threshold_deg`.
///
/// The input rings are left untouched; the returned rails are copies with
/// the new vertices spliced in. Corners without a valid line, or whose line
/// ends cannot be placed on the rails, are skipped.
pub fn sync_corners(
    set: &PerimeterSet,
    angle_threshold_deg: f64,
    tol: &Tolerances,
) -> GeometryResult<CornerSyncResult> {
    GeometryError::ensure_finite("angle_threshold_deg", angle_threshold_deg)?;
    let mut top = require_ring("top", set.top.clone())?;
    let mut bottom = require_ring("bottom", set.bottom.clone())?;
    require_ring("upper_quarter", set.upper_quarter.clone())?;
    let middle = require_ring("middle", set.middle.clone())?;
    require_ring("lower_quarter", set.lower_quarter.clone())?;

    let mut found: Vec<(SyncPair, SolutionLine)> = Vec::new();
    let n = middle.len();
    let mut sharp = 0;

    for i in 0..n {
        let p = middle[i];
        let (prev, next) = (&middle[(i + n - 1) % n], &middle[(i + 1) % n]);
        let angle = interior_angle_deg(prev, &p, next, tol.point_merge);
        if (180.0 - angle).abs() <= STRAIGHT_EPS_DEG || angle >= angle_threshold_deg {
            continue;
        }
        sharp += 1;

        let Some((top_point, bottom_point)) = corner_line(set, &p, tol) else {
            debug!("No sync line through corner {} ({:.2} deg)", i, angle);
            continue;
        };

        let mut next_top = top.clone();
        let mut next_bottom = bottom.clone();
        let (Some((ti, top_added)), Some((bi, bottom_added))) = (
            locate_or_insert(&mut next_top, top_point, tol),
            locate_or_insert(&mut next_bottom, bottom_point, tol),
        ) else {
            debug!("Sync line through corner {} does not land on both rails", i);
            continue;
        };
        top = next_top;
        bottom = next_bottom;

        for (pair, _) in &mut found {
            if top_added && pair.top >= ti {
                pair.top += 1;
            }
            if bottom_added && pair.bottom >= bi {
                pair.bottom += 1;
            }
        }
        found.push((
            SyncPair::new(ti, bi),
            SolutionLine {
                corner: p,
                top: top_point,
                bottom: bottom_point,
                angle_deg: angle,
            },
        ));
    }

    found.sort_by_key(|(pair, _)| *pair);
    info!(
        "Corner sync: {} of {} sharp corners synchronized (threshold {} deg)",
        found.len(),
        sharp,
        angle_threshold_deg
    );

    let (sync_pairs, solution_lines) = found.into_iter().unzip();
    Ok(CornerSyncResult {
        top,
        bottom,
        sync_pairs,
        solution_lines,
    })
}
