//! Epsilon-bucketed vertex deduplication
//!
//! Points are hashed to a grid of cell size `eps`; lookups probe the 27
//! neighbouring cells so two points within `eps` always resolve to the same
//! vertex regardless of which side of a cell boundary they fall on.

use crate::geometry::Point3;
use std::collections::HashMap;

/// Discretized point key for hash map (handles floating point comparison)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    x: i64,
    y: i64,
    z: i64,
}

impl CellKey {
    fn from_point(point: &Point3, cell: f64) -> Self {
        Self {
            x: (point.x / cell).floor() as i64,
            y: (point.y / cell).floor() as i64,
            z: (point.z / cell).floor() as i64,
        }
    }
}

/// Deduplicating vertex table
#[derive(Debug, Clone)]
pub struct PointIndex {
    eps: f64,
    points: Vec<Point3>,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl PointIndex {
    /// Create an empty index merging points closer than `eps`.
    pub fn new(eps: f64) -> Self {
        Self {
            eps: eps.max(f64::MIN_POSITIVE),
            points: Vec::new(),
            cells: HashMap::new(),
        }
    }

    /// Merge distance
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Find an existing vertex within `eps` of `point`.
    pub fn find(&self, point: &Point3) -> Option<usize> {
        let key = CellKey::from_point(point, self.eps);
        let mut best: Option<(usize, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let probe = CellKey {
                        x: key.x + dx,
                        y: key.y + dy,
                        z: key.z + dz,
                    };
                    let Some(ids) = self.cells.get(&probe) else {
                        continue;
                    };
                    for &id in ids {
                        let d = (self.points[id] - point).norm();
                        if d > self.eps {
                            continue;
                        }
                        // lowest id wins so the result does not depend on probe order
                        match best {
                            Some((bid, _)) if bid <= id => {}
                            _ => best = Some((id, d)),
                        }
                    }
                }
            }
        }
        best.map(|(id, _)| id)
    }

    /// Return the id of the vertex at `point`, inserting it if new.
    pub fn insert(&mut self, point: Point3) -> usize {
        if let Some(id) = self.find(&point) {
            return id;
        }
        let id = self.points.len();
        self.cells
            .entry(CellKey::from_point(&point, self.eps))
            .or_default()
            .push(id);
        self.points.push(point);
        id
    }

    /// Vertex position by id.
    pub fn point(&self, id: usize) -> Point3 {
        self.points[id]
    }

    /// All unique vertices in insertion order.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_across_cell_boundary() {
        let mut index = PointIndex::new(1e-3);
        let a = index.insert(Point3::new(0.0009999, 0.0, 0.0));
        let b = index.insert(Point3::new(0.0010001, 0.0, 0.0));
        assert_eq!(a, b);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_keeps_distinct_points() {
        let mut index = PointIndex::new(1e-6);
        let a = index.insert(Point3::new(0.0, 0.0, 0.0));
        let b = index.insert(Point3::new(1.0, 0.0, 0.0));
        assert_ne!(a, b);
        assert_eq!(index.find(&Point3::new(1.0, 0.0, 5e-7)), Some(b));
        assert_eq!(index.find(&Point3::new(0.5, 0.0, 0.0)), None);
    }
}
