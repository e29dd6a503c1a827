//! # Kerf Offset Solver
//!
//! Offsets a wire corner by the wire radius on both rails and carries the
//! results down to the machine's guide planes.
//!
//! A corner is described by six points: `A`, `B`, `C` on the top rail
//! (corner, trailing neighbour, leading neighbour) and `D`, `E`, `F` in the
//! same roles on the bottom rail. `A → D` is the wire (the ruling).
//!
//! Each rail edge is offset perpendicular to both itself and the wire. The
//! offsets are oriented to open away from the wedge the two edges span,
//! which is the outside of a convex corner. From them the solver derives:
//! - `E_*`: the corner pushed along each edge offset
//! - `M_*`: the miter points where each offset edge meets the chamfer plane
//!   tangent to the wire circle on the corner bisector
//! - `I_*`: the single internal point where the two oppositely offset edge
//!   lines meet (used at concave corners)
//!
//! Every top/bottom pair is then extended along its own line to the two
//! guide heights.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wirekit_core::geometry::{cross_2d, is_finite_point};
use wirekit_core::{points_coincide, GeometryError, GeometryResult, Point3, Tolerances, Vector3};

/// Wire radius and guide heights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KerfParams {
    /// Wire radius plus spark gap (mm)
    pub wire_radius: f64,
    /// Height of the lower wire guide
    pub bottom_guide_z: f64,
    /// Height of the upper wire guide
    pub top_guide_z: f64,
}

impl KerfParams {
    pub fn validate(&self) -> GeometryResult<()> {
        let r = GeometryError::ensure_finite("wire_radius", self.wire_radius)?;
        if r <= 0.0 {
            return Err(GeometryError::invalid("wire_radius", "must be positive"));
        }
        let z0 = GeometryError::ensure_finite("bottom_guide_z", self.bottom_guide_z)?;
        let z1 = GeometryError::ensure_finite("top_guide_z", self.top_guide_z)?;
        if z1 <= z0 {
            return Err(GeometryError::invalid(
                "top_guide_z",
                format!("{} is not above the bottom guide {}", z1, z0),
            ));
        }
        Ok(())
    }
}

/// The six points describing one wire corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KerfPoints {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
    pub d: Point3,
    pub e: Point3,
    pub f: Point3,
}

/// A wire position expressed at the two guide heights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub bottom: Point3,
    pub top: Point3,
}

/// Offset points of one corner and their guide-plane projections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KerfSolution {
    pub e_b: Point3,
    pub e_c: Point3,
    pub e_e: Point3,
    pub e_f: Point3,
    pub m_b: Point3,
    pub m_c: Point3,
    pub m_e: Point3,
    pub m_f: Point3,
    /// `None` when the top offset lines are parallel
    pub i_bc: Option<Point3>,
    /// `None` when the bottom offset lines are parallel
    pub i_ef: Option<Point3>,
    /// `E_B`/`E_E` at the guides
    pub trailing: Option<GuideLine>,
    /// `E_C`/`E_F` at the guides
    pub leading: Option<GuideLine>,
    /// `M_B`/`M_E` at the guides
    pub miter_trailing: Option<GuideLine>,
    /// `M_C`/`M_F` at the guides
    pub miter_leading: Option<GuideLine>,
    /// `I_BC`/`I_EF` at the guides
    pub internal: Option<GuideLine>,
}

/// Perpendicular to `edge` and `wire`, scaled to `radius`.
fn offset_direction(
    name: &str,
    edge: &Vector3,
    wire: &Vector3,
    radius: f64,
    eps: f64,
) -> GeometryResult<Vector3> {
    edge.cross(wire)
        .try_normalize(eps)
        .map(|v| v * radius)
        .ok_or_else(|| {
            GeometryError::invalid(name, "edge has zero length or runs along the wire")
        })
}

/// Flip each offset that leans towards the other edge.
///
/// Returns `false` in the second slot when neither test was decisive (the
/// two edges are collinear).
fn open_outward(
    x_1: Vector3,
    x_2: Vector3,
    edge_1: &Vector3,
    edge_2: &Vector3,
    slack: f64,
) -> ((Vector3, Vector3), bool) {
    let lean_1 = x_1.dot(&edge_2.normalize());
    let lean_2 = x_2.dot(&edge_1.normalize());
    let x_1 = if lean_1 > slack { -x_1 } else { x_1 };
    let x_2 = if lean_2 > slack { -x_2 } else { x_2 };
    ((x_1, x_2), lean_1.abs() > slack || lean_2.abs() > slack)
}

/// Intersect the line `origin + t·dir` with the plane through `anchor`
/// with normal `normal`.
fn line_plane(
    origin: &Point3,
    dir: &Vector3,
    anchor: &Point3,
    normal: &Vector3,
    eps: f64,
) -> Option<Point3> {
    let denom = dir.dot(normal);
    if denom.abs() <= eps {
        return None;
    }
    let t = (anchor - origin).dot(normal) / denom;
    Some(origin + dir * t)
}

/// Closest-approach midpoint of two lines, `None` when they are parallel.
fn line_line(p1: &Point3, u: &Vector3, p2: &Point3, v: &Vector3, eps: f64) -> Option<Point3> {
    let w0 = p1 - p2;
    let a = u.dot(u);
    let b = u.dot(v);
    let c = v.dot(v);
    let d = u.dot(&w0);
    let e = v.dot(&w0);
    let den = a * c - b * b;
    if den.abs() <= eps * a * c {
        return None;
    }
    let t = (b * e - c * d) / den;
    let s = (a * e - b * d) / den;
    let on_1 = p1 + u * t;
    let on_2 = p2 + v * s;
    Some(Point3::from((on_1.coords + on_2.coords) * 0.5))
}

/// Extend the line through `top` and `bottom` to the two guide heights.
///
/// `None` when the line is parallel to the guide planes.
pub fn project_to_guides(
    top: &Point3,
    bottom: &Point3,
    z0: f64,
    z1: f64,
    eps: f64,
) -> Option<GuideLine> {
    let dir = top - bottom;
    if dir.z.abs() <= eps {
        return None;
    }
    let at = |z: f64| bottom + dir * ((z - bottom.z) / dir.z);
    Some(GuideLine {
        bottom: at(z0),
        top: at(z1),
    })
}

/// Miter points of one rail corner
fn miter(
    corner: &Point3,
    x_1: &Vector3,
    x_2: &Vector3,
    edge_1: &Vector3,
    edge_2: &Vector3,
    radius: f64,
    eps: f64,
) -> (Point3, Point3) {
    let e_1 = corner + x_1;
    let e_2 = corner + x_2;
    let Some(bisector) = (x_1 + x_2).try_normalize(eps) else {
        return (e_1, e_2);
    };
    let anchor = corner + bisector * radius;
    (
        line_plane(&e_1, edge_1, &anchor, &bisector, eps).unwrap_or(e_1),
        line_plane(&e_2, edge_2, &anchor, &bisector, eps).unwrap_or(e_2),
    )
}

/// Solve the kerf offsets of one corner.
pub fn kerf_offsets(
    points: &KerfPoints,
    params: &KerfParams,
    tol: &Tolerances,
) -> GeometryResult<KerfSolution> {
    params.validate()?;
    let KerfPoints { a, b, c, d, e, f } = *points;
    for (name, p) in [("A", a), ("B", b), ("C", c), ("D", d), ("E", e), ("F", f)] {
        if !is_finite_point(&p) {
            let value = [p.x, p.y, p.z]
                .into_iter()
                .find(|v| !v.is_finite())
                .unwrap_or(f64::NAN);
            return Err(GeometryError::NonFinite {
                name: name.to_string(),
                value,
            });
        }
    }

    let r = params.wire_radius;
    let eps = tol.parametric;
    let slack = tol.collinear * r;

    let wire = d - a;
    let ab = b - a;
    let ac = c - a;
    let de = e - d;
    let df = f - d;

    let x_b = offset_direction("AB", &ab, &wire, r, eps)?;
    let x_c = offset_direction("AC", &ac, &wire, r, eps)?;
    let x_e = offset_direction("DE", &de, &(-wire), r, eps)?;
    let x_f = offset_direction("DF", &df, &(-wire), r, eps)?;

    let ((x_b, x_c), _) = open_outward(x_b, x_c, &ab, &ac, slack);
    let ((mut x_e, mut x_f), decided) = open_outward(x_e, x_f, &de, &df, slack);
    if !decided {
        // collinear bottom edges: follow the top rail's side
        if x_e.dot(&x_b) < 0.0 {
            x_e = -x_e;
        }
        if x_f.dot(&x_c) < 0.0 {
            x_f = -x_f;
        }
    }

    let e_b = a + x_b;
    let e_c = a + x_c;
    let e_e = d + x_e;
    let e_f = d + x_f;

    let (m_b, m_c) = miter(&a, &x_b, &x_c, &ab, &ac, r, eps);
    let (m_e, m_f) = miter(&d, &x_e, &x_f, &de, &df, r, eps);

    let i_bc = line_line(&(a - x_b), &ab, &(a - x_c), &ac, eps);
    let i_ef = line_line(&(d - x_e), &de, &(d - x_f), &df, eps);

    let (z0, z1) = (params.bottom_guide_z, params.top_guide_z);
    let project = |top: &Point3, bottom: &Point3| project_to_guides(top, bottom, z0, z1, eps);

    Ok(KerfSolution {
        e_b,
        e_c,
        e_e,
        e_f,
        m_b,
        m_c,
        m_e,
        m_f,
        i_bc,
        i_ef,
        trailing: project(&e_b, &e_e),
        leading: project(&e_c, &e_f),
        miter_trailing: project(&m_b, &m_e),
        miter_leading: project(&m_c, &m_f),
        internal: match (i_bc, i_ef) {
            (Some(top), Some(bottom)) => project(&top, &bottom),
            _ => None,
        },
    })
}

/// Nearest index before (`step = n - 1`) or after (`step = 1`) `i` whose
/// top and bottom points both differ from those at `i`.
fn distinct_neighbour(
    top: &[Point3],
    bottom: &[Point3],
    i: usize,
    step: usize,
    eps: f64,
) -> Option<usize> {
    let n = top.len();
    let mut j = i;
    for _ in 1..n {
        j = (j + step) % n;
        let moved = !points_coincide(&top[j], &top[i], eps);
        if moved && !points_coincide(&bottom[j], &bottom[i], eps) {
            return Some(j);
        }
    }
    None
}

/// Kerf-compensate two index-synchronized closed rails.
///
/// Rails run counter-clockwise with the part on their left. Convex corners
/// produce the two miter points, concave corners the internal point and
/// straight runs a single outward offset. Vertices whose corner cannot be
/// solved are skipped with a warning.
pub fn compensate_rails(
    top: &[Point3],
    bottom: &[Point3],
    params: &KerfParams,
    tol: &Tolerances,
) -> GeometryResult<Vec<GuideLine>> {
    params.validate()?;
    if top.len() != bottom.len() {
        return Err(GeometryError::invalid(
            "rails",
            format!("top has {} vertices, bottom has {}", top.len(), bottom.len()),
        ));
    }
    wirekit_core::require_ring("top", top.to_vec())?;

    let n = top.len();
    let mut out = Vec::with_capacity(n * 2);
    let mut skipped = 0;

    for i in 0..n {
        let (Some(prev), Some(next)) = (
            distinct_neighbour(top, bottom, i, n - 1, tol.point_merge),
            distinct_neighbour(top, bottom, i, 1, tol.point_merge),
        ) else {
            skipped += 1;
            continue;
        };
        let points = KerfPoints {
            a: top[i],
            b: top[prev],
            c: top[next],
            d: bottom[i],
            e: bottom[prev],
            f: bottom[next],
        };
        let solution = match kerf_offsets(&points, params, tol) {
            Ok(solution) => solution,
            Err(err) => {
                warn!("Skipping kerf corner {}: {}", i, err);
                skipped += 1;
                continue;
            }
        };

        let incoming = (points.a - points.b).normalize();
        let outgoing = (points.c - points.a).normalize();
        let turn = cross_2d(&incoming, &outgoing);

        let lines = if turn > tol.collinear {
            vec![solution.miter_trailing, solution.miter_leading]
        } else if turn < -tol.collinear {
            vec![solution.internal]
        } else {
            // right-hand side of travel is outside the part
            let outward = Vector3::new(outgoing.y, -outgoing.x, 0.0);
            let pick = if (solution.e_b - points.a).dot(&outward) > 0.0 {
                solution.trailing
            } else {
                solution.leading
            };
            vec![pick]
        };

        for line in lines {
            match line {
                Some(line) => out.push(line),
                None => {
                    debug!("Kerf corner {} has no guide projection", i);
                    skipped += 1;
                }
            }
        }
    }

    info!(
        "Kerf compensation produced {} guide positions ({} skipped)",
        out.len(),
        skipped
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(radius: f64) -> KerfParams {
        KerfParams {
            wire_radius: radius,
            bottom_guide_z: -5.0,
            top_guide_z: 15.0,
        }
    }

    fn box_corner() -> KerfPoints {
        KerfPoints {
            a: Point3::new(10.0, 0.0, 10.0),
            b: Point3::new(0.0, 0.0, 10.0),
            c: Point3::new(10.0, 10.0, 10.0),
            d: Point3::new(10.0, 0.0, 0.0),
            e: Point3::new(0.0, 0.0, 0.0),
            f: Point3::new(10.0, 10.0, 0.0),
        }
    }

    fn close(a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn test_convex_corner_offsets_open_outward() {
        let s = kerf_offsets(&box_corner(), &params(1.0), &Tolerances::default()).unwrap();
        assert!(close(&s.e_b, &Point3::new(10.0, -1.0, 10.0)));
        assert!(close(&s.e_c, &Point3::new(11.0, 0.0, 10.0)));
        assert!(close(&s.e_e, &Point3::new(10.0, -1.0, 0.0)));
        assert!(close(&s.e_f, &Point3::new(11.0, 0.0, 0.0)));
    }

    #[test]
    fn test_miter_points_touch_wire_circle_chamfer() {
        let s = kerf_offsets(&box_corner(), &params(1.0), &Tolerances::default()).unwrap();
        let k = 2f64.sqrt() - 1.0;
        assert!(close(&s.m_b, &Point3::new(10.0 + k, -1.0, 10.0)));
        assert!(close(&s.m_c, &Point3::new(11.0, -k, 10.0)));
        assert!(close(&s.m_e, &Point3::new(10.0 + k, -1.0, 0.0)));
    }

    #[test]
    fn test_internal_point_and_projection() {
        let s = kerf_offsets(&box_corner(), &params(1.0), &Tolerances::default()).unwrap();
        assert!(close(&s.i_bc.unwrap(), &Point3::new(9.0, 1.0, 10.0)));
        let guide = s.internal.unwrap();
        assert!(close(&guide.bottom, &Point3::new(9.0, 1.0, -5.0)));
        assert!(close(&guide.top, &Point3::new(9.0, 1.0, 15.0)));
    }

    #[test]
    fn test_horizontal_line_has_no_projection() {
        let p = Point3::new(0.0, 0.0, 3.0);
        assert!(project_to_guides(&p, &Point3::new(1.0, 0.0, 3.0), 0.0, 10.0, 1e-9).is_none());
    }

    #[test]
    fn test_degenerate_inputs_are_rejected() {
        let mut points = box_corner();
        points.b = points.a;
        assert!(kerf_offsets(&points, &params(1.0), &Tolerances::default()).is_err());
        assert!(kerf_offsets(&box_corner(), &params(0.0), &Tolerances::default()).is_err());
        points = box_corner();
        points.c.y = f64::NAN;
        assert!(matches!(
            kerf_offsets(&points, &params(1.0), &Tolerances::default()),
            Err(GeometryError::NonFinite { .. })
        ));
    }

    fn rail(outline: &[[f64; 2]], z: f64) -> Vec<Point3> {
        outline.iter().map(|[x, y]| Point3::new(*x, *y, z)).collect()
    }

    #[test]
    fn test_square_rails_get_two_miter_points_per_corner() {
        let outline = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        let tol = Tolerances::default();
        let lines =
            compensate_rails(&rail(&outline, 10.0), &rail(&outline, 0.0), &params(0.5), &tol)
                .unwrap();
        assert_eq!(lines.len(), 8);
        // every guide point sits outside the part
        assert!(lines.iter().all(|l| {
            let p = l.top;
            p.x < 0.0 || p.x > 10.0 || p.y < 0.0 || p.y > 10.0
        }));
    }

    #[test]
    fn test_concave_corner_uses_internal_point() {
        // L-shaped part, the notch corner at (5, 5) is concave
        let outline = [
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 5.0],
            [5.0, 5.0],
            [5.0, 10.0],
            [0.0, 10.0],
        ];
        let tol = Tolerances::default();
        let lines =
            compensate_rails(&rail(&outline, 10.0), &rail(&outline, 0.0), &params(0.5), &tol)
                .unwrap();
        // five convex corners with two miter points, one internal point
        assert_eq!(lines.len(), 11);
        assert!(close(&lines[6].top, &Point3::new(5.5, 5.5, 15.0)));
        assert!(close(&lines[6].bottom, &Point3::new(5.5, 5.5, -5.0)));
    }

    #[test]
    fn test_straight_run_gets_single_outward_offset() {
        let outline = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        let tol = Tolerances::default();
        let lines =
            compensate_rails(&rail(&outline, 10.0), &rail(&outline, 0.0), &params(0.5), &tol)
                .unwrap();
        assert_eq!(lines.len(), 9);
        assert!(close(&lines[2].top, &Point3::new(5.0, -0.5, 15.0)));
        assert!(close(&lines[2].bottom, &Point3::new(5.0, -0.5, -5.0)));
    }
}
