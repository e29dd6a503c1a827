//! # Plane Slicer
//!
//! Extracts perimeter polylines from a triangle soup at a given height.
//!
//! Two cutting modes are provided:
//! - **Land face** ([`slice_land_face`]): a triangle contributes the edge whose
//!   two vertices lie exactly on the plane. This is the mode used for the top
//!   and bottom rails, which must be flat, axis-normal faces of the model.
//!   Any other height yields no segments.
//! - **Crossing** ([`slice_crossing`]): a triangle contributes the segment
//!   where the plane crosses its edges. Used for the intermediate heights the
//!   corner synchronizer needs.
//!
//! Both feed their segments through the segment graph and orient every
//! closed loop counter-clockwise so rails at different heights run the
//! same way.

use crate::corner_sync::PerimeterSet;
use crate::segment_graph::reconstruct_polylines;
use tracing::{debug, info};
use wirekit_core::geometry::lerp;
use wirekit_core::{
    GeometryError, GeometryResult, Perimeter, Point3, Segment3, Tolerances, Triangle, TriangleMesh,
};

/// Bottom (P0) and top (P1) perimeters of a model
#[derive(Debug, Clone)]
pub struct SliceResult {
    pub bottom: Perimeter,
    pub top: Perimeter,
}

/// Resolve the slicing heights, falling back to the mesh bounding box.
pub fn resolve_heights(
    mesh: &TriangleMesh,
    bottom_z: Option<f64>,
    top_z: Option<f64>,
) -> GeometryResult<(f64, f64)> {
    mesh.validate()?;
    let bounds = mesh.bounds().ok_or(GeometryError::EmptyMesh)?;
    let bottom = GeometryError::ensure_finite("bottom_z", bottom_z.unwrap_or(bounds.min.z))?;
    let top = GeometryError::ensure_finite("top_z", top_z.unwrap_or(bounds.max.z))?;
    Ok((bottom, top))
}

/// Segments from triangle edges lying on the plane `z`.
pub fn land_face_segments(mesh: &TriangleMesh, z: f64, eps: f64) -> Vec<Segment3> {
    mesh.triangles
        .iter()
        .filter_map(|tri| {
            let on_plane: Vec<Point3> = tri
                .vertices
                .iter()
                .copied()
                .filter(|v| (v.z - z).abs() <= eps)
                .collect();
            match on_plane.as_slice() {
                [a, b] => Some((*a, *b)),
                _ => None,
            }
        })
        .collect()
}

/// Segments where the plane `z` crosses triangle edges.
pub fn crossing_segments(mesh: &TriangleMesh, z: f64, eps: f64) -> Vec<Segment3> {
    mesh.triangles
        .iter()
        .filter_map(|tri| triangle_crossing(tri, z, eps))
        .collect()
}

fn triangle_crossing(tri: &Triangle, z: f64, eps: f64) -> Option<Segment3> {
    let on_plane = tri.vertices.iter().filter(|v| (v.z - z).abs() <= eps).count();
    if on_plane == 3 {
        return None;
    }

    let mut points: Vec<Point3> = Vec::with_capacity(3);
    for (a, b) in tri.edges() {
        let Some(p) = intersect_edge_with_plane_z(&a, &b, z, eps) else {
            continue;
        };
        if !points.iter().any(|q| (q - p).norm() <= eps) {
            points.push(p);
        }
    }

    match points.as_slice() {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}

/// Intersect an edge with a horizontal plane at Z height
fn intersect_edge_with_plane_z(v1: &Point3, v2: &Point3, z: f64, eps: f64) -> Option<Point3> {
    let d1 = v1.z - z;
    let d2 = v2.z - z;

    if d1.abs() <= eps {
        return Some(*v1);
    }
    if d2.abs() <= eps {
        return Some(*v2);
    }
    // both vertices strictly on the same side
    if d1 * d2 > 0.0 {
        return None;
    }

    let t = d1 / (d1 - d2);
    let mut p = lerp(v1, v2, t);
    p.z = z;
    Some(p)
}

fn assemble(segments: &[Segment3], z: f64, tol: &Tolerances) -> Perimeter {
    let mut polylines = reconstruct_polylines(segments, tol.point_merge);
    for poly in &mut polylines {
        poly.orient_ccw();
    }
    Perimeter::new(z, polylines)
}

/// Cut the flat land face at `z`.
pub fn slice_land_face(mesh: &TriangleMesh, z: f64, tol: &Tolerances) -> GeometryResult<Perimeter> {
    GeometryError::ensure_finite("z", z)?;
    mesh.validate()?;
    let segments = land_face_segments(mesh, z, tol.point_merge);
    debug!("Found {} land-face segments at Z = {}", segments.len(), z);
    Ok(assemble(&segments, z, tol))
}

/// Cut through the model at `z`, interpolating along crossed edges.
pub fn slice_crossing(mesh: &TriangleMesh, z: f64, tol: &Tolerances) -> GeometryResult<Perimeter> {
    GeometryError::ensure_finite("z", z)?;
    mesh.validate()?;
    let segments = crossing_segments(mesh, z, tol.point_merge);
    debug!("Found {} crossing segments at Z = {}", segments.len(), z);
    Ok(assemble(&segments, z, tol))
}

/// Slice the bottom and top land faces.
///
/// Heights that are `None` are taken from the mesh bounding box.
pub fn slice_at_heights(
    mesh: &TriangleMesh,
    bottom_z: Option<f64>,
    top_z: Option<f64>,
    tol: &Tolerances,
) -> GeometryResult<SliceResult> {
    let (z0, z1) = resolve_heights(mesh, bottom_z, top_z)?;
    let bottom = slice_land_face(mesh, z0, tol)?;
    let top = slice_land_face(mesh, z1, tol)?;
    info!(
        "Sliced bottom Z={} ({} loops) and top Z={} ({} loops)",
        z0,
        bottom.polylines.len(),
        z1,
        top.polylines.len()
    );
    Ok(SliceResult { bottom, top })
}

/// Build the five perimeters used for corner synchronization.
///
/// Top and bottom are land-face cuts; the quarter and middle heights are
/// crossing cuts. Each contributes its longest closed loop.
pub fn perimeter_set(
    mesh: &TriangleMesh,
    bottom_z: f64,
    top_z: f64,
    tol: &Tolerances,
) -> GeometryResult<PerimeterSet> {
    let height = top_z - bottom_z;
    let at = |fraction: f64| bottom_z + height * fraction;

    Ok(PerimeterSet {
        top: slice_land_face(mesh, top_z, tol)?.primary_ring("top")?,
        upper_quarter: slice_crossing(mesh, at(0.75), tol)?.primary_ring("upper_quarter")?,
        middle: slice_crossing(mesh, at(0.5), tol)?.primary_ring("middle")?,
        lower_quarter: slice_crossing(mesh, at(0.25), tol)?.primary_ring("lower_quarter")?,
        bottom: slice_land_face(mesh, bottom_z, tol)?.primary_ring("bottom")?,
    })
}
