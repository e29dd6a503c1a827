//! # Perimeter Stitcher
//!
//! Produces one traversal of the top rail (P1) paired with points on the
//! bottom rail (P0). Rulings pin exact vertex correspondences; every other
//! top vertex is matched to the bottom point at the same arc-length fraction
//! between the surrounding anchors.

use std::collections::BTreeMap;
use tracing::{debug, warn};
use wirekit_core::geometry::{cumulative_ring_lengths, lerp, nearest_index, norm_2d};
use wirekit_core::{require_ring, GeometryResult, Point3, Ruling, Tolerances, ToolpathStep};

/// A top-index to bottom-index correspondence used while stitching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    top: usize,
    bottom: usize,
}

/// Arc-length view of a closed ring
struct Ring<'a> {
    points: &'a [Point3],
    cum: Vec<f64>,
}

impl<'a> Ring<'a> {
    fn new(points: &'a [Point3]) -> Self {
        Self {
            cum: cumulative_ring_lengths(points),
            points,
        }
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn total(&self) -> f64 {
        self.cum[self.points.len()]
    }

    /// Forward distance from vertex `from` to vertex `to`, wrapping.
    fn forward(&self, from: usize, to: usize) -> f64 {
        if to >= from {
            self.cum[to] - self.cum[from]
        } else {
            self.total() - self.cum[from] + self.cum[to]
        }
    }

    /// Walk forward from `start` accumulating `distance`, then interpolate.
    fn point_along(&self, start: usize, distance: f64, eps: f64) -> Point3 {
        let n = self.len();
        let mut remaining = distance;
        let mut i = start;
        for _ in 0..n {
            let j = (i + 1) % n;
            let seg = (self.points[j] - self.points[i]).norm();
            if remaining <= seg {
                if seg <= eps {
                    return self.points[i];
                }
                return lerp(&self.points[i], &self.points[j], remaining / seg);
            }
            remaining -= seg;
            i = j;
        }
        self.points[i]
    }
}

/// Map each ruling to its nearest top and bottom vertices.
///
/// When several rulings land on one top vertex the one with the least XY
/// lean wins; on equal lean the earlier ruling is kept.
fn anchors_from_rulings(top: &[Point3], bottom: &[Point3], rulings: &[Ruling]) -> Vec<Anchor> {
    let mut by_top: BTreeMap<usize, (usize, f64)> = BTreeMap::new();
    for ruling in rulings {
        let (Some(t), Some(b)) = (
            nearest_index(top, &ruling.top),
            nearest_index(bottom, &ruling.bottom),
        ) else {
            continue;
        };
        let lean = norm_2d(&(ruling.top - ruling.bottom));
        match by_top.get(&t) {
            Some(&(_, best)) if best <= lean => {}
            _ => {
                by_top.insert(t, (b, lean));
            }
        }
    }
    by_top
        .into_iter()
        .map(|(top, (bottom, _))| Anchor { top, bottom })
        .collect()
}

/// Stitch the bottom rail `p0` to the top rail `p1`.
///
/// Both rails are rings of distinct vertices. The walk starts at the top
/// vertex nearest `lead_in` (or vertex 0), visits every top vertex once and
/// repeats the first step at the end. Without rulings the pair (0, 0) is the
/// only anchor.
pub fn stitch(
    p0: &[Point3],
    p1: &[Point3],
    rulings: &[Ruling],
    lead_in: Option<Point3>,
    tol: &Tolerances,
) -> GeometryResult<Vec<ToolpathStep>> {
    let p0 = require_ring("bottom", p0.to_vec())?;
    let p1 = require_ring("top", p1.to_vec())?;

    let mut anchors = anchors_from_rulings(&p1, &p0, rulings);
    let fallback = anchors.is_empty();
    if fallback {
        warn!("No rulings available, anchoring the rails at vertex 0");
        anchors.push(Anchor { top: 0, bottom: 0 });
    }

    let top = Ring::new(&p1);
    let bottom = Ring::new(&p0);
    let n = top.len();
    let start = lead_in
        .and_then(|p| nearest_index(&p1, &p))
        .unwrap_or(0);

    let mut steps = Vec::with_capacity(n + 1);
    for k in 0..n {
        let i = (start + k) % n;

        if let Some(anchor) = anchors.iter().find(|a| a.top == i) {
            steps.push(ToolpathStep {
                bottom: p0[anchor.bottom],
                top: p1[i],
                is_ruling: !fallback,
            });
            continue;
        }

        let (prev, next) = surrounding_anchors(&anchors, i);
        let top_span = if prev == next {
            top.total()
        } else {
            top.forward(prev.top, next.top)
        };
        let fraction = if top_span > tol.arc_length {
            top.forward(prev.top, i) / top_span
        } else {
            0.0
        };
        let bottom_span = if prev == next {
            bottom.total()
        } else {
            bottom.forward(prev.bottom, next.bottom)
        };

        steps.push(ToolpathStep {
            bottom: bottom.point_along(prev.bottom, fraction * bottom_span, tol.arc_length),
            top: p1[i],
            is_ruling: false,
        });
    }

    if let Some(first) = steps.first().copied() {
        steps.push(first);
    }

    debug!(
        "Stitched {} steps using {} anchors (start vertex {})",
        steps.len(),
        anchors.len(),
        start
    );
    Ok(steps)
}

/// Nearest anchors strictly before and after top index `i`, wrapping.
fn surrounding_anchors(anchors: &[Anchor], i: usize) -> (Anchor, Anchor) {
    // anchors are sorted by top index and never empty here
    let prev = anchors
        .iter()
        .rev()
        .find(|a| a.top < i)
        .or_else(|| anchors.last())
        .copied()
        .unwrap_or(Anchor { top: 0, bottom: 0 });
    let next = anchors
        .iter()
        .find(|a| a.top > i)
        .or_else(|| anchors.first())
        .copied()
        .unwrap_or(prev);
    (prev, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64, z: f64) -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(size, 0.0, z),
            Point3::new(size, size, z),
            Point3::new(0.0, size, z),
        ]
    }

    #[test]
    fn test_rulings_pin_exact_vertices() {
        let p0 = square(10.0, 0.0);
        let p1 = square(10.0, 5.0);
        let rulings = vec![Ruling::new(p0[2], p1[2])];
        let steps = stitch(&p0, &p1, &rulings, None, &Tolerances::default()).unwrap();
        assert_eq!(steps.len(), 5);
        assert!(steps[2].is_ruling);
        assert_eq!(steps[2].bottom, p0[2]);
        assert!(!steps[0].is_ruling);
    }

    #[test]
    fn test_fraction_maps_onto_larger_bottom() {
        let p0 = square(20.0, 0.0);
        let p1 = square(10.0, 5.0);
        let rulings = vec![Ruling::new(p0[0], p1[0])];
        let steps = stitch(&p0, &p1, &rulings, None, &Tolerances::default()).unwrap();
        // one anchor: top vertex 1 sits a quarter of the way round
        assert!((steps[1].bottom - Point3::new(20.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((steps[2].bottom - Point3::new(20.0, 20.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_interpolates_between_two_anchors() {
        let p0 = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(20.0, 0.0, 0.0),
            Point3::new(20.0, 10.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        ];
        let p1 = vec![
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(5.0, 0.0, 5.0),
            Point3::new(10.0, 0.0, 5.0),
            Point3::new(10.0, 10.0, 5.0),
            Point3::new(5.0, 10.0, 5.0),
            Point3::new(0.0, 10.0, 5.0),
        ];
        let rulings = vec![Ruling::new(p0[0], p1[0]), Ruling::new(p0[1], p1[2])];
        let steps = stitch(&p0, &p1, &rulings, None, &Tolerances::default()).unwrap();

        assert_eq!(steps.len(), 7);
        assert!(steps[0].is_ruling && steps[2].is_ruling);
        assert_eq!(steps[2].bottom, Point3::new(20.0, 0.0, 0.0));
        // halfway along the first span, top 10 long and bottom 20 long
        assert!((steps[1].bottom - Point3::new(10.0, 0.0, 0.0)).norm() < 1e-9);
        // second span: top 30 long, bottom 40 long
        assert!((steps[3].bottom - Point3::new(20.0 - 10.0 / 3.0, 10.0, 0.0)).norm() < 1e-9);
        assert!((steps[4].bottom - Point3::new(10.0, 10.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_lead_in_moves_start() {
        let p0 = square(10.0, 0.0);
        let p1 = square(10.0, 5.0);
        let steps = stitch(
            &p0,
            &p1,
            &[],
            Some(Point3::new(10.0, 10.0, 5.0)),
            &Tolerances::default(),
        )
        .unwrap();
        assert_eq!(steps[0].top, p1[2]);
        assert_eq!(steps.first(), steps.last());
    }

    #[test]
    fn test_vertical_ruling_wins_shared_top_vertex() {
        let p0 = square(10.0, 0.0);
        let p1 = square(10.0, 5.0);
        let rulings = vec![Ruling::new(p0[0], p1[1]), Ruling::new(p0[1], p1[1])];
        let anchors = anchors_from_rulings(&p1, &p0, &rulings);
        assert_eq!(anchors, vec![Anchor { top: 1, bottom: 1 }]);
    }

    #[test]
    fn test_degenerate_rail_is_an_error() {
        let p0 = square(10.0, 0.0);
        let err = stitch(&p0, &p0[..2], &[], None, &Tolerances::default()).unwrap_err();
        assert!(matches!(
            err,
            wirekit_core::GeometryError::DegeneratePerimeter { .. }
        ));
    }
}
