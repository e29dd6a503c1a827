//! Polylines, perimeters and the synchronization records built on them.

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{cumulative_lengths, signed_area_xy, Point3};
use serde::{Deserialize, Serialize};

/// Ordered sequence of points. Closed loops repeat the first point as the last.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point3>,
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point3>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Build a closed polyline from a ring of distinct vertices.
    pub fn from_ring(ring: &[Point3]) -> Self {
        let mut points = ring.to_vec();
        if let Some(first) = ring.first() {
            points.push(*first);
        }
        Self {
            points,
            closed: true,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total length along the stored points.
    pub fn length(&self) -> f64 {
        cumulative_lengths(&self.points)
            .last()
            .copied()
            .unwrap_or(0.0)
    }

    /// Distinct vertices of a closed loop, without the repeated closing point.
    ///
    /// Open polylines return all their points.
    pub fn ring(&self) -> &[Point3] {
        if self.closed && self.points.len() > 1 {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    /// Reverse a closed loop if it runs clockwise in XY.
    pub fn orient_ccw(&mut self) {
        if self.closed && signed_area_xy(self.ring()) < 0.0 {
            self.points.reverse();
        }
    }
}

/// All loops produced by one plane cut
#[derive(Debug, Clone, PartialEq)]
pub struct Perimeter {
    /// Height of the cutting plane
    pub z: f64,
    pub polylines: Vec<Polyline>,
}

impl Perimeter {
    pub fn new(z: f64, polylines: Vec<Polyline>) -> Self {
        Self { z, polylines }
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Closed loops only.
    pub fn closed_loops(&self) -> impl Iterator<Item = &Polyline> {
        self.polylines.iter().filter(|p| p.closed)
    }

    /// The longest closed loop, the profile a single wire path follows.
    pub fn primary_loop(&self) -> Option<&Polyline> {
        self.closed_loops()
            .max_by(|a, b| a.length().total_cmp(&b.length()))
    }

    /// Distinct vertices of the primary loop, rejecting loops under 3 vertices.
    pub fn primary_ring(&self, name: &str) -> GeometryResult<Vec<Point3>> {
        let ring = self
            .primary_loop()
            .map(|p| p.ring().to_vec())
            .unwrap_or_default();
        require_ring(name, ring)
    }
}

/// Validate that a ring has at least three vertices.
pub fn require_ring(name: &str, ring: Vec<Point3>) -> GeometryResult<Vec<Point3>> {
    if ring.len() < 3 {
        return Err(GeometryError::DegeneratePerimeter {
            name: name.to_string(),
            vertices: ring.len(),
        });
    }
    Ok(ring)
}

/// A straight edge chain spanning bottom to top
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruling {
    pub bottom: Point3,
    pub top: Point3,
}

impl Ruling {
    /// Create a ruling, ordering the endpoints by height.
    pub fn new(a: Point3, b: Point3) -> Self {
        if a.z <= b.z {
            Self { bottom: a, top: b }
        } else {
            Self { bottom: b, top: a }
        }
    }

    /// Height covered by the ruling.
    pub fn span(&self) -> f64 {
        (self.top.z - self.bottom.z).abs()
    }
}

/// Vertex-index correspondence between the top and bottom rail
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SyncPair {
    pub top: usize,
    pub bottom: usize,
}

impl SyncPair {
    pub fn new(top: usize, bottom: usize) -> Self {
        Self { top, bottom }
    }
}

/// One node of a ruling-stitched path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolpathStep {
    pub bottom: Point3,
    pub top: Point3,
    pub is_ruling: bool,
}
