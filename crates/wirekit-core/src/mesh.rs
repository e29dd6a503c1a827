//! # Triangle Mesh Module
//!
//! Triangle soup representation consumed by the slicer and ruling detector.
//! Connectivity is never trusted from the source; components rebuild the
//! adjacency they need.
//!
//! ## Supported Inputs
//! - Flat soup: runs of 9 floats (three xyz vertices per triangle)
//! - Indexed mesh: positions plus triangle index triples (tessellation output)
//! - STL files (ASCII or binary) through [`ModelImporter`]

use crate::error::{Error, GeometryError, GeometryResult, Result};
use crate::geometry::{is_finite_point, Point3, Vector3};
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;

/// Cross products shorter than this mark a zero-area triangle
const ZERO_AREA_EPS: f64 = 1e-12;

/// A triangle made up of three vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3; 3],
}

impl Triangle {
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Unit normal, or `None` for zero-area triangles.
    pub fn normal(&self) -> Option<Vector3> {
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];
        edge1.cross(&edge2).try_normalize(ZERO_AREA_EPS)
    }

    /// The three edges as vertex pairs.
    pub fn edges(&self) -> [(Point3, Point3); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3,
    pub max: Point3,
}

/// A triangle soup
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub triangles: Vec<Triangle>,
}

impl TriangleMesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// Build from runs of 9 floats.
    pub fn from_flat_soup(soup: &[f64]) -> GeometryResult<Self> {
        if soup.len() % 9 != 0 {
            return Err(GeometryError::malformed(format!(
                "soup length {} is not a multiple of 9",
                soup.len()
            )));
        }
        let triangles = soup
            .chunks_exact(9)
            .map(|c| {
                Triangle::new(
                    Point3::new(c[0], c[1], c[2]),
                    Point3::new(c[3], c[4], c[5]),
                    Point3::new(c[6], c[7], c[8]),
                )
            })
            .collect();
        let mesh = Self::new(triangles);
        mesh.validate()?;
        Ok(mesh)
    }

    /// Build from positions plus triangle index triples.
    pub fn from_indexed(positions: &[[f64; 3]], indices: &[[usize; 3]]) -> GeometryResult<Self> {
        let mut triangles = Vec::with_capacity(indices.len());
        for (face, idx) in indices.iter().enumerate() {
            let mut verts = [Point3::origin(); 3];
            for (k, &i) in idx.iter().enumerate() {
                let p = positions.get(i).ok_or_else(|| {
                    GeometryError::malformed(format!(
                        "face {} references vertex {} but only {} positions exist",
                        face,
                        i,
                        positions.len()
                    ))
                })?;
                verts[k] = Point3::new(p[0], p[1], p[2]);
            }
            triangles.push(Triangle { vertices: verts });
        }
        let mesh = Self::new(triangles);
        mesh.validate()?;
        Ok(mesh)
    }

    /// Build a ruled solid between two outlines of equal vertex count.
    ///
    /// Vertex `i` of the bottom outline is joined to vertex `i` of the top
    /// outline, each side quad split into two triangles, and both caps
    /// fan-triangulated from vertex 0 (outlines must be convex for valid caps).
    pub fn loft(
        bottom: &[[f64; 2]],
        top: &[[f64; 2]],
        bottom_z: f64,
        top_z: f64,
    ) -> GeometryResult<Self> {
        if bottom.len() != top.len() {
            return Err(GeometryError::invalid(
                "outline",
                format!(
                    "bottom has {} vertices, top has {}",
                    bottom.len(),
                    top.len()
                ),
            ));
        }
        if bottom.len() < 3 {
            return Err(GeometryError::DegeneratePerimeter {
                name: "outline".to_string(),
                vertices: bottom.len(),
            });
        }
        let b: Vec<Point3> = bottom.iter().map(|p| Point3::new(p[0], p[1], bottom_z)).collect();
        let t: Vec<Point3> = top.iter().map(|p| Point3::new(p[0], p[1], top_z)).collect();
        let n = b.len();

        let mut triangles = Vec::with_capacity(4 * n);
        for i in 0..n {
            let j = (i + 1) % n;
            triangles.push(Triangle::new(b[i], b[j], t[j]));
            triangles.push(Triangle::new(b[i], t[j], t[i]));
        }
        for i in 1..n - 1 {
            triangles.push(Triangle::new(b[0], b[i + 1], b[i]));
            triangles.push(Triangle::new(t[0], t[i], t[i + 1]));
        }
        let mesh = Self::new(triangles);
        mesh.validate()?;
        Ok(mesh)
    }

    /// Straight prism: the same outline at both heights.
    pub fn prism(outline: &[[f64; 2]], bottom_z: f64, top_z: f64) -> GeometryResult<Self> {
        Self::loft(outline, outline, bottom_z, top_z)
    }

    /// Convert an STL mesh to triangles
    pub fn from_stl_mesh(stl_mesh: &stl_io::IndexedMesh) -> Self {
        let to_point = |v: &stl_io::Vertex| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64);
        let triangles = stl_mesh
            .faces
            .iter()
            .filter_map(|face| {
                let [a, b, c] = face.vertices;
                let v0 = stl_mesh.vertices.get(a)?;
                let v1 = stl_mesh.vertices.get(b)?;
                let v2 = stl_mesh.vertices.get(c)?;
                Some(Triangle::new(to_point(v0), to_point(v1), to_point(v2)))
            })
            .collect();
        Self::new(triangles)
    }

    /// Reject empty meshes and non-finite coordinates.
    pub fn validate(&self) -> GeometryResult<()> {
        if self.triangles.is_empty() {
            return Err(GeometryError::EmptyMesh);
        }
        for (i, tri) in self.triangles.iter().enumerate() {
            if let Some(bad) = tri.vertices.iter().find(|v| !is_finite_point(v)) {
                let value = [bad.x, bad.y, bad.z]
                    .into_iter()
                    .find(|c| !c.is_finite())
                    .unwrap_or(f64::NAN);
                return Err(GeometryError::NonFinite {
                    name: format!("triangle {} vertex", i),
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of all vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut iter = self.triangles.iter().flat_map(|t| t.vertices.iter());
        let first = *iter.next()?;
        let (mut min, mut max) = (first, first);
        for v in iter {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }
        Some(Bounds { min, max })
    }

    /// Translate every vertex
    pub fn translate(&mut self, offset: Vector3) {
        for tri in &mut self.triangles {
            for v in &mut tri.vertices {
                *v += offset;
            }
        }
    }

    /// Scale the mesh uniformly about the origin
    pub fn scale(&mut self, factor: f64) {
        for tri in &mut self.triangles {
            for v in &mut tri.vertices {
                *v = Point3::from(v.coords * factor);
            }
        }
    }
}

/// 3D model importer for converting model files to meshes
#[derive(Debug, Clone)]
pub struct ModelImporter {
    pub scale: f64,
    /// Move the model so its lowest point sits on Z = 0
    pub seat_on_bed: bool,
}

impl ModelImporter {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            seat_on_bed: false,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_seat_on_bed(mut self, seat: bool) -> Self {
        self.seat_on_bed = seat;
        self
    }

    /// Import a model from a file path
    pub fn import_file(&self, path: &Path) -> Result<TriangleMesh> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase())
            .ok_or_else(|| {
                Error::Import(format!(
                    "Unable to determine file extension for: {}",
                    path.display()
                ))
            })?;

        match extension.as_str() {
            "stl" => {
                debug!("Importing STL file: {}", path.display());
                let mut file = std::fs::File::open(path)?;
                self.import_stl(&mut file)
            }
            _ => Err(Error::Import(format!(
                "Unsupported model format: .{}",
                extension
            ))),
        }
    }

    /// Import STL from any seekable reader (binary or ASCII)
    pub fn import_stl<R: Read + Seek>(&self, reader: &mut R) -> Result<TriangleMesh> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| Error::Import(format!("Failed to parse STL data: {}", e)))?;
        debug!("STL contains {} faces", stl.faces.len());

        let mut mesh = TriangleMesh::from_stl_mesh(&stl);
        mesh.validate()?;

        if self.scale != 1.0 {
            debug!("Scaling mesh by factor {}", self.scale);
            mesh.scale(self.scale);
        }

        if self.seat_on_bed {
            if let Some(bounds) = mesh.bounds() {
                debug!("Seating mesh on Z=0 (min z {})", bounds.min.z);
                mesh.translate(Vector3::new(0.0, 0.0, -bounds.min.z));
            }
        }

        Ok(mesh)
    }
}

impl Default for ModelImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: [[f64; 2]; 4] = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];

    #[test]
    fn test_flat_soup_rejects_partial_triangle() {
        let err = TriangleMesh::from_flat_soup(&[0.0; 10]).unwrap_err();
        assert!(matches!(err, GeometryError::MalformedMesh { .. }));
    }

    #[test]
    fn test_flat_soup_rejects_empty() {
        assert_eq!(
            TriangleMesh::from_flat_soup(&[]).unwrap_err(),
            GeometryError::EmptyMesh
        );
    }

    #[test]
    fn test_flat_soup_rejects_nan() {
        let mut soup = [0.0; 9];
        soup[3] = 1.0;
        soup[7] = f64::NAN;
        let err = TriangleMesh::from_flat_soup(&soup).unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { .. }));
    }

    #[test]
    fn test_indexed_out_of_range() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let err = TriangleMesh::from_indexed(&positions, &[[0, 1, 2]]).unwrap_err();
        assert!(matches!(err, GeometryError::MalformedMesh { .. }));
    }

    #[test]
    fn test_prism_bounds_and_count() {
        let mesh = TriangleMesh::prism(&SQUARE, 0.0, 5.0).unwrap();
        // 2 per side quad + 2 per cap
        assert_eq!(mesh.len(), 12);
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn test_loft_rejects_mismatched_outlines() {
        let err = TriangleMesh::loft(&SQUARE, &SQUARE[..3], 0.0, 1.0).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidParameter { .. }));
    }

    #[test]
    fn test_degenerate_triangle_has_no_normal() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(Triangle::new(p, p, p).normal().is_none());
    }

    #[test]
    fn test_import_binary_stl() {
        let mut stl = vec![0u8; 80];
        stl.extend_from_slice(&1u32.to_le_bytes());
        let floats: [f32; 12] = [
            0.0, 0.0, 1.0, // normal
            0.0, 0.0, 2.0, 1.0, 0.0, 2.0, 0.0, 1.0, 2.0,
        ];
        for f in floats {
            stl.extend_from_slice(&f.to_le_bytes());
        }
        stl.extend_from_slice(&0u16.to_le_bytes());

        let mut cursor = std::io::Cursor::new(stl);
        let mesh = ModelImporter::new()
            .with_seat_on_bed(true)
            .import_stl(&mut cursor)
            .unwrap();
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh.bounds().unwrap().min.z, 0.0);
    }
}
