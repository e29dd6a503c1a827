//! # Ruling Detection
//!
//! Finds maximal straight chains of mesh edges and keeps those that span
//! enough of the part height to act as synchronization anchors between the
//! bottom and top rails.
//!
//! Each unconsumed edge seeds a chain. The chain grows at either end while
//! exactly one unvisited neighbour continues in the seed direction (unit dot
//! product above [`COLLINEAR_DOT`], roughly 2.5 degrees). Only the two chain
//! endpoints are kept.

use std::collections::HashSet;
use tracing::{debug, info};
use wirekit_core::{
    GeometryError, GeometryResult, Point3, PointIndex, Ruling, Tolerances, TriangleMesh, Vector3,
};

/// Minimum normalized dot product for two edge directions to count as collinear
pub const COLLINEAR_DOT: f64 = 0.999;

/// Deduplicated vertex/edge graph of a mesh
#[derive(Debug, Clone)]
pub struct EdgeGraph {
    vertices: PointIndex,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
}

impl EdgeGraph {
    /// Collect the unique edges of every triangle.
    pub fn from_mesh(mesh: &TriangleMesh, merge_eps: f64) -> Self {
        let mut vertices = PointIndex::new(merge_eps);
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut edges = Vec::new();
        let mut adjacency: Vec<Vec<usize>> = Vec::new();

        for tri in &mesh.triangles {
            for (a, b) in tri.edges() {
                let ia = vertices.insert(a);
                let ib = vertices.insert(b);
                if adjacency.len() < vertices.len() {
                    adjacency.resize(vertices.len(), Vec::new());
                }
                if ia == ib {
                    continue;
                }
                let key = (ia.min(ib), ia.max(ib));
                if seen.insert(key) {
                    edges.push(key);
                    adjacency[ia].push(ib);
                    adjacency[ib].push(ia);
                }
            }
        }

        Self {
            vertices,
            edges,
            adjacency,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Every maximal straight chain, as (start, end) vertex positions.
    pub fn straight_chains(&self) -> Vec<(Point3, Point3)> {
        let mut consumed: HashSet<(usize, usize)> = HashSet::new();
        let mut chains = Vec::new();

        for &(a, b) in &self.edges {
            if !consumed.insert((a, b)) {
                continue;
            }
            let Some(dir) = (self.vertices.point(b) - self.vertices.point(a)).try_normalize(0.0)
            else {
                continue;
            };

            let mut visited: HashSet<usize> = HashSet::from([a, b]);
            let end = self.extend(b, &dir, &mut visited, &mut consumed);
            let start = self.extend(a, &(-dir), &mut visited, &mut consumed);
            chains.push((self.vertices.point(start), self.vertices.point(end)));
        }

        chains
    }

    fn extend(
        &self,
        from: usize,
        dir: &Vector3,
        visited: &mut HashSet<usize>,
        consumed: &mut HashSet<(usize, usize)>,
    ) -> usize {
        let mut current = from;
        loop {
            let here = self.vertices.point(current);
            let candidates: Vec<usize> = self.adjacency[current]
                .iter()
                .copied()
                .filter(|n| !visited.contains(n))
                .filter(|&n| {
                    (self.vertices.point(n) - here)
                        .try_normalize(0.0)
                        .is_some_and(|d| d.dot(dir) > COLLINEAR_DOT)
                })
                .collect();
            let [next] = candidates.as_slice() else {
                return current;
            };
            consumed.insert((current.min(*next), current.max(*next)));
            visited.insert(*next);
            current = *next;
        }
    }
}

/// Keep chains whose height span covers `span_percentage` of the part.
pub fn filter_by_span(
    chains: &[(Point3, Point3)],
    bottom_z: f64,
    top_z: f64,
    span_percentage: f64,
) -> Vec<Ruling> {
    let required = span_percentage * (top_z - bottom_z);
    chains
        .iter()
        .filter(|(a, b)| (b.z - a.z).abs() >= required)
        .map(|(a, b)| Ruling::new(*a, *b))
        .collect()
}

/// Detect height-spanning straight edge chains.
pub fn detect_rulings(
    mesh: &TriangleMesh,
    bottom_z: f64,
    top_z: f64,
    span_percentage: f64,
    tol: &Tolerances,
) -> GeometryResult<Vec<Ruling>> {
    mesh.validate()?;
    GeometryError::ensure_finite("bottom_z", bottom_z)?;
    GeometryError::ensure_finite("top_z", top_z)?;
    if !(0.0..=1.0).contains(&span_percentage) {
        return Err(GeometryError::invalid(
            "span_percentage",
            format!("{} is outside 0..1", span_percentage),
        ));
    }

    let graph = EdgeGraph::from_mesh(mesh, tol.point_merge);
    let chains = graph.straight_chains();
    debug!(
        "Edge graph has {} vertices, {} edges, {} straight chains",
        graph.vertex_count(),
        graph.edge_count(),
        chains.len()
    );

    let rulings = filter_by_span(&chains, bottom_z, top_z, span_percentage);
    info!(
        "Detected {} rulings spanning at least {:.0}% of {:.4}",
        rulings.len(),
        span_percentage * 100.0,
        top_z - bottom_z
    );
    Ok(rulings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirekit_core::Triangle;

    #[test]
    fn test_span_filter_keeps_tall_chains() {
        let height = 10.0;
        let chains: Vec<(Point3, Point3)> = [0.0, 0.3, 0.6, 1.0]
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let x = i as f64;
                (Point3::new(x, 0.0, 0.0), Point3::new(x, 0.0, s * height))
            })
            .collect();
        let rulings = filter_by_span(&chains, 0.0, height, 0.5);
        let spans: Vec<f64> = rulings.iter().map(|r| r.span() / height).collect();
        assert_eq!(spans, vec![0.6, 1.0]);
    }

    #[test]
    fn test_collinear_edges_merge_into_one_chain() {
        // a tall thin wall whose vertical edge is split at mid height
        let a = Point3::new(0.0, 0.0, 0.0);
        let m = Point3::new(0.0, 0.0, 5.0);
        let t = Point3::new(0.0, 0.0, 10.0);
        let side = Point3::new(3.0, 0.0, 0.0);
        let mesh = TriangleMesh::new(vec![Triangle::new(a, side, m), Triangle::new(m, side, t)]);
        let rulings = detect_rulings(&mesh, 0.0, 10.0, 0.9, &Tolerances::default()).unwrap();
        assert!(rulings
            .iter()
            .any(|r| r.bottom == a && r.top == t));
        assert!(rulings.iter().all(|r| r.span() >= 9.0));
    }

    #[test]
    fn test_rejects_bad_span() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let mesh = TriangleMesh::new(vec![Triangle::new(
            a,
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        )]);
        let err = detect_rulings(&mesh, 0.0, 1.0, 1.5, &Tolerances::default()).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidParameter { .. }));
    }
}
