//! # WireKit Core
//!
//! Core types, tolerances and utilities for WireKit.
//! Provides the geometric vocabulary shared by every stage of the
//! wire-EDM toolpath pipeline: points, polylines, perimeters, rulings,
//! sync pairs, triangle meshes and the error taxonomy.

pub mod error;
pub mod geometry;
pub mod mesh;
pub mod point_index;
pub mod polyline;
pub mod tolerance;

pub use error::{Error, GeometryError, GeometryResult, Result};
pub use geometry::{points_coincide, Point3, Segment3, Vector3};
pub use mesh::{Bounds, ModelImporter, Triangle, TriangleMesh};
pub use point_index::PointIndex;
pub use polyline::{require_ring, Perimeter, Polyline, Ruling, SyncPair, ToolpathStep};
pub use tolerance::Tolerances;
