//! Error handling for WireKit
//!
//! Provides the error types shared by every layer of the toolpath pipeline:
//! - Geometry errors (malformed meshes, non-finite heights, degenerate perimeters)
//! - Import errors (model files that cannot be read or parsed)
//!
//! Benign absences (no intersection, no corner solution) are never errors;
//! they are reported as `None` or an empty collection by the component itself.

use thiserror::Error;

/// Geometry input error type
///
/// Raised only for malformed top-level inputs that the caller must fix.
/// Local edge cases inside the pipeline resolve silently through the
/// configured tolerances instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The mesh has no triangles
    #[error("Mesh is empty")]
    EmptyMesh,

    /// The mesh data could not be interpreted as triangles
    #[error("Malformed mesh: {reason}")]
    MalformedMesh {
        /// Why the mesh was rejected.
        reason: String,
    },

    /// A coordinate or height was NaN or infinite
    #[error("Non-finite value for {name}: {value}")]
    NonFinite {
        /// The quantity that was non-finite.
        name: String,
        /// The offending value.
        value: f64,
    },

    /// A perimeter has too few vertices to form a loop
    #[error("Perimeter '{name}' has {vertices} vertices (need at least 3)")]
    DegeneratePerimeter {
        /// Which perimeter was degenerate.
        name: String,
        /// How many distinct vertices it has.
        vertices: usize,
    },

    /// A sync index does not address a perimeter vertex
    #[error("Index {index} out of range for '{name}' (length {len})")]
    IndexOutOfRange {
        /// Which sequence was indexed.
        name: String,
        /// The offending index.
        index: usize,
        /// Length of the sequence.
        len: usize,
    },

    /// A numeric parameter is outside its valid domain
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why it is invalid.
        reason: String,
    },
}

impl GeometryError {
    /// Build a malformed-mesh error
    pub fn malformed(reason: impl Into<String>) -> Self {
        GeometryError::MalformedMesh {
            reason: reason.into(),
        }
    }

    /// Build an invalid-parameter error
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        GeometryError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Reject NaN and infinities for a named scalar.
    pub fn ensure_finite(name: &str, value: f64) -> std::result::Result<f64, GeometryError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(GeometryError::NonFinite {
                name: name.to_string(),
                value,
            })
        }
    }
}

/// Main error type for WireKit
///
/// A unified error type that can represent any error from the core layer.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry input error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// A model file could not be parsed
    #[error("Import failed: {0}")]
    Import(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a geometry input error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for geometry validation
pub type GeometryResult<T> = std::result::Result<T, GeometryError>;
