//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for pipeline stages and
//! G-code generation.

use thiserror::Error;
use wirekit_core::GeometryError;

/// Errors that can occur during CAM tool operations.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Invalid parameters were provided to a CAM tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The input geometry was rejected.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// The pipeline has no model to work on.
    #[error("No model loaded")]
    NoModel,
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cam_tool_error_display() {
        let err = CamToolError::InvalidParameters("span must be within 0..1".to_string());
        assert_eq!(err.to_string(), "Invalid parameters: span must be within 0..1");

        assert_eq!(CamToolError::NoModel.to_string(), "No model loaded");
    }

    #[test]
    fn test_error_conversion() {
        let err: CamToolError = GeometryError::EmptyMesh.into();
        assert!(matches!(err, CamToolError::Geometry(_)));
        assert_eq!(err.to_string(), "Geometry error: Mesh is empty");
    }
}
