//! # Segment Graph Reconstruction
//!
//! Assembles unordered 3D line segments into ordered open and closed
//! polylines. Endpoints are deduplicated with the point-merge tolerance,
//! the resulting undirected graph is walked from its open ends first and
//! whatever remains afterwards is treated as closed loops.
//!
//! When a walk reaches a node with more than one unvisited neighbour the
//! slice is not a simple 2-manifold curve. The walk then continues along the
//! neighbour with the smallest turning angle and a warning is logged.

use tracing::{debug, warn};
use wirekit_core::{Point3, PointIndex, Polyline, Segment3};

/// Direction dot products closer than this are treated as a tie
const DIRECTION_TIE_EPS: f64 = 1e-12;

/// Undirected graph over deduplicated segment endpoints
#[derive(Debug, Clone)]
pub struct SegmentGraph {
    nodes: PointIndex,
    adjacency: Vec<Vec<usize>>,
}

impl SegmentGraph {
    /// Build the graph, dropping zero-length segments.
    pub fn build(segments: &[Segment3], merge_eps: f64) -> Self {
        let mut nodes = PointIndex::new(merge_eps);
        let mut adjacency: Vec<Vec<usize>> = Vec::new();
        let mut dropped = 0usize;

        for (a, b) in segments {
            let ia = nodes.insert(*a);
            let ib = nodes.insert(*b);
            if adjacency.len() < nodes.len() {
                adjacency.resize(nodes.len(), Vec::new());
            }
            if ia == ib {
                dropped += 1;
                continue;
            }
            if !adjacency[ia].contains(&ib) {
                adjacency[ia].push(ib);
                adjacency[ib].push(ia);
            }
        }

        if dropped > 0 {
            debug!("Dropped {} zero-length segments", dropped);
        }

        Self { nodes, adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// Walk open chains first, then closed loops.
    pub fn polylines(&self) -> Vec<Polyline> {
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut result = Vec::new();

        // open chains start at dangling ends
        for start in 0..n {
            if visited[start] || self.degree(start) > 1 {
                continue;
            }
            let path = self.walk(start, &mut visited);
            if path.len() > 1 {
                result.push(Polyline::new(self.positions(&path), false));
            }
        }

        for start in 0..n {
            if visited[start] {
                continue;
            }
            let mut path = self.walk(start, &mut visited);
            let closes = path.len() > 2
                && path
                    .last()
                    .is_some_and(|last| self.adjacency[*last].contains(&start));
            if closes {
                path.push(start);
            }
            if path.len() > 1 {
                result.push(Polyline::new(self.positions(&path), closes));
            }
        }

        result
    }

    fn walk(&self, start: usize, visited: &mut [bool]) -> Vec<usize> {
        let mut path = vec![start];
        visited[start] = true;
        let mut current = start;
        let mut previous: Option<usize> = None;

        loop {
            let candidates: Vec<usize> = self.adjacency[current]
                .iter()
                .copied()
                .filter(|n| !visited[*n])
                .collect();
            let next = match candidates.as_slice() {
                [] => break,
                [only] => *only,
                // leaving the start of a closed loop: either direction is fine
                [_, _] if previous.is_none() => self.straightest(None, current, &candidates),
                _ => {
                    let p = self.nodes.point(current);
                    warn!(
                        "Branching polyline graph at ({:.4}, {:.4}, {:.4}): {} neighbours",
                        p.x,
                        p.y,
                        p.z,
                        candidates.len()
                    );
                    self.straightest(previous, current, &candidates)
                }
            };
            visited[next] = true;
            path.push(next);
            previous = Some(current);
            current = next;
        }

        path
    }

    /// Neighbour with the smallest turning angle, lowest index on ties.
    fn straightest(&self, previous: Option<usize>, current: usize, candidates: &[usize]) -> usize {
        let lowest = candidates.iter().copied().min().unwrap_or(candidates[0]);
        let Some(prev) = previous else {
            return lowest;
        };
        let eps = self.nodes.eps();
        let here = self.nodes.point(current);
        let Some(incoming) = (here - self.nodes.point(prev)).try_normalize(eps) else {
            return lowest;
        };

        let mut best = lowest;
        let mut best_dot = f64::NEG_INFINITY;
        let mut sorted = candidates.to_vec();
        sorted.sort_unstable();
        for cand in sorted {
            let dot = (self.nodes.point(cand) - here)
                .try_normalize(eps)
                .map(|out| incoming.dot(&out))
                .unwrap_or(f64::NEG_INFINITY);
            if dot > best_dot + DIRECTION_TIE_EPS {
                best_dot = dot;
                best = cand;
            }
        }
        best
    }

    fn positions(&self, path: &[usize]) -> Vec<Point3> {
        path.iter().map(|&i| self.nodes.point(i)).collect()
    }
}

/// Assemble unordered segments into ordered polylines.
pub fn reconstruct_polylines(segments: &[Segment3], merge_eps: f64) -> Vec<Polyline> {
    let graph = SegmentGraph::build(segments, merge_eps);
    let polylines = graph.polylines();
    debug!(
        "Reconstructed {} polylines ({} closed) from {} segments over {} nodes",
        polylines.len(),
        polylines.iter().filter(|p| p.closed).count(),
        segments.len(),
        graph.node_count()
    );
    polylines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn test_square_loop_closes() {
        let segments = vec![
            (p(0.0, 0.0), p(1.0, 0.0)),
            (p(1.0, 1.0), p(0.0, 1.0)),
            (p(1.0, 0.0), p(1.0, 1.0)),
            (p(0.0, 0.0), p(0.0, 1.0)),
        ];
        let polys = reconstruct_polylines(&segments, 1e-6);
        assert_eq!(polys.len(), 1);
        assert!(polys[0].closed);
        assert_eq!(polys[0].len(), 5);
        assert_eq!(polys[0].points.first(), polys[0].points.last());
    }

    #[test]
    fn test_open_chain_starts_at_end() {
        let segments = vec![
            (p(1.0, 0.0), p(2.0, 0.0)),
            (p(0.0, 0.0), p(1.0, 0.0)),
        ];
        let polys = reconstruct_polylines(&segments, 1e-6);
        assert_eq!(polys.len(), 1);
        assert!(!polys[0].closed);
        assert_eq!(polys[0].points, vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]);
    }

    #[test]
    fn test_merges_nearby_endpoints_and_drops_zero_length() {
        let segments = vec![
            (p(0.0, 0.0), p(1.0, 0.0)),
            (p(1.0 + 1e-8, 0.0), p(1.0, 1.0)),
            (p(1.0, 1.0), p(1.0, 1.0)),
        ];
        let polys = reconstruct_polylines(&segments, 1e-6);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 3);
    }

    #[test]
    fn test_branch_prefers_straight_continuation() {
        // a T junction: the walk from (0,0) should run straight through (1,0)
        let segments = vec![
            (p(0.0, 0.0), p(1.0, 0.0)),
            (p(1.0, 0.0), p(1.0, 1.0)),
            (p(1.0, 0.0), p(2.0, 0.0)),
        ];
        let polys = reconstruct_polylines(&segments, 1e-6);
        assert_eq!(polys[0].points, vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]);
        // the stub's only neighbour is already consumed, leaving a single point
        assert_eq!(polys.len(), 1);
    }
}
