//! # Synchronized G-code Synthesis
//!
//! Interleaves the vertices of the top and bottom rails into one 4-axis
//! program. Between consecutive sync pairs the two sub-paths are
//! parameterized by arc-length fraction; every vertex of either rail becomes
//! a move, with the other rail interpolated at the same fraction.
//!
//! Output lines are exactly `G1 X.. Y.. Z.. U.. V.. W..` with four decimals:
//! XYZ is the top guide point, UVW the bottom guide point.

use crate::kerf::GuideLine;
use tracing::{debug, info, warn};
use wirekit_core::geometry::{cumulative_lengths, point_at_length};
use wirekit_core::{require_ring, GeometryError, GeometryResult, Point3, SyncPair, Tolerances};

fn coord(value: f64) -> String {
    let text = format!("{:.4}", value);
    if text == "-0.0000" {
        "0.0000".to_string()
    } else {
        text
    }
}

/// Format one synchronized move.
pub fn format_move(top: &Point3, bottom: &Point3) -> String {
    format!(
        "G1 X{} Y{} Z{} U{} V{} W{}",
        coord(top.x),
        coord(top.y),
        coord(top.z),
        coord(bottom.x),
        coord(bottom.y),
        coord(bottom.z)
    )
}

/// Rotate a ring so `start` becomes index 0.
fn roll(ring: &[Point3], start: usize) -> Vec<Point3> {
    ring[start..].iter().chain(&ring[..start]).copied().collect()
}

/// Forward walk from `from` to `to` inclusive.
///
/// Equal indices walk the full loop when `full_loop` is set (a single sync
/// pair) and give the lone vertex otherwise.
fn sub_path(ring: &[Point3], from: usize, to: usize, full_loop: bool) -> Vec<Point3> {
    let n = ring.len();
    let steps = match (to + n - from) % n {
        0 if full_loop => n,
        k => k,
    };
    (0..=steps).map(|k| ring[(from + k) % n]).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rail {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    fraction: f64,
    rail: Rail,
    point: Point3,
}

/// Arc-length view of one sub-path
struct Span {
    points: Vec<Point3>,
    cum: Vec<f64>,
    total: f64,
}

impl Span {
    fn new(points: Vec<Point3>) -> Self {
        let cum = cumulative_lengths(&points);
        let total = cum.last().copied().unwrap_or(0.0);
        Self { points, cum, total }
    }

    fn interior_events(&self, rail: Rail) -> impl Iterator<Item = Event> + '_ {
        let last = self.points.len().saturating_sub(1);
        (1..last).map(move |i| Event {
            fraction: self.cum[i] / self.total,
            rail,
            point: self.points[i],
        })
    }

    fn at_fraction(&self, fraction: f64, eps: f64) -> Option<Point3> {
        point_at_length(&self.points, &self.cum, fraction * self.total, eps)
    }
}

/// Validate, sort and deduplicate sync pairs against the rail lengths.
fn prepare_pairs(
    sync_pairs: &[SyncPair],
    top_len: usize,
    bottom_len: usize,
) -> GeometryResult<Vec<SyncPair>> {
    for pair in sync_pairs {
        if pair.top >= top_len {
            return Err(GeometryError::IndexOutOfRange {
                name: "top".to_string(),
                index: pair.top,
                len: top_len,
            });
        }
        if pair.bottom >= bottom_len {
            return Err(GeometryError::IndexOutOfRange {
                name: "bottom".to_string(),
                index: pair.bottom,
                len: bottom_len,
            });
        }
    }

    let mut pairs = sync_pairs.to_vec();
    if pairs.is_empty() {
        warn!("No sync pairs given, synchronizing the rails at vertex 0");
        pairs.push(SyncPair::new(0, 0));
    }
    pairs.sort();
    pairs.dedup_by_key(|p| p.top);
    Ok(pairs)
}

/// Emit the synchronized program for two closed rails.
///
/// Both rails are rolled so the first sync pair sits at index 0. The program
/// opens with a lead-in move at that pair and then, for each span between
/// consecutive pairs, one move per rail vertex followed by the exact
/// vertices of the closing pair. A top and a bottom vertex at the same
/// fraction share one move. Spans where either rail has no length are
/// skipped.
pub fn emit_gcode(
    top: &[Point3],
    bottom: &[Point3],
    sync_pairs: &[SyncPair],
    tol: &Tolerances,
) -> GeometryResult<String> {
    let top = require_ring("top", top.to_vec())?;
    let bottom = require_ring("bottom", bottom.to_vec())?;
    let pairs = prepare_pairs(sync_pairs, top.len(), bottom.len())?;

    let origin = pairs[0];
    let top = roll(&top, origin.top);
    let bottom = roll(&bottom, origin.bottom);
    let (n, m) = (top.len(), bottom.len());
    let pairs: Vec<SyncPair> = pairs
        .iter()
        .map(|p| {
            SyncPair::new(
                (p.top + n - origin.top) % n,
                (p.bottom + m - origin.bottom) % m,
            )
        })
        .collect();
    let full_loop = pairs.len() == 1;

    let mut lines = vec![format_move(&top[0], &bottom[0])];
    let mut skipped = 0;

    for (k, current) in pairs.iter().enumerate() {
        let next = pairs[(k + 1) % pairs.len()];
        let top_span = Span::new(sub_path(&top, current.top, next.top, full_loop));
        let bottom_span = Span::new(sub_path(&bottom, current.bottom, next.bottom, full_loop));
        if top_span.total <= tol.arc_length || bottom_span.total <= tol.arc_length {
            debug!("Skipping zero-length span {} -> {:?}", k, next);
            skipped += 1;
            continue;
        }

        let mut events: Vec<Event> = top_span
            .interior_events(Rail::Top)
            .chain(bottom_span.interior_events(Rail::Bottom))
            .collect();
        // stable: top events stay ahead of bottom events on ties
        events.sort_by(|a, b| a.fraction.total_cmp(&b.fraction));

        let mut i = 0;
        while i < events.len() {
            let event = events[i];
            let partner = events.get(i + 1).filter(|e| {
                e.rail != event.rail && (e.fraction - event.fraction).abs() <= tol.parametric
            });

            let (t, b) = match (event.rail, partner) {
                (Rail::Top, Some(other)) => (Some(event.point), Some(other.point)),
                (Rail::Bottom, Some(other)) => (Some(other.point), Some(event.point)),
                (Rail::Top, None) => (
                    Some(event.point),
                    bottom_span.at_fraction(event.fraction, tol.arc_length),
                ),
                (Rail::Bottom, None) => (
                    top_span.at_fraction(event.fraction, tol.arc_length),
                    Some(event.point),
                ),
            };
            if let (Some(t), Some(b)) = (t, b) {
                lines.push(format_move(&t, &b));
            }
            i += if partner.is_some() { 2 } else { 1 };
        }

        lines.push(format_move(&top[next.top], &bottom[next.bottom]));
    }

    info!(
        "Generated {} G-code lines from {} sync pairs ({} spans skipped)",
        lines.len(),
        pairs.len(),
        skipped
    );
    Ok(lines.join("\n"))
}

/// Format kerf-compensated guide positions as a program.
pub fn emit_guide_program(guides: &[GuideLine]) -> String {
    guides
        .iter()
        .map(|g| format_move(&g.top, &g.bottom))
        .collect::<Vec<_>>()
        .join("\n")
}
