//! Numeric tolerances
//!
//! One place for every epsilon the pipeline uses. Each component takes a
//! `&Tolerances` and reads the field that matches the comparison it makes.

use serde::{Deserialize, Serialize};

/// Epsilon configuration shared by all pipeline components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Distance under which two points are the same vertex (mm)
    pub point_merge: f64,
    /// Slack allowed in collinearity and on-segment length tests (mm)
    pub collinear: f64,
    /// Lengths below this are treated as zero (mm)
    pub arc_length: f64,
    /// Slack on determinants and segment parameters in intersection math
    pub parametric: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            point_merge: 1e-6,
            collinear: 1e-5,
            arc_length: 1e-9,
            parametric: 1e-9,
        }
    }
}

impl Tolerances {
    /// Returns true when every tolerance is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [
            self.point_merge,
            self.collinear,
            self.arc_length,
            self.parametric,
        ]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let tol = Tolerances::default();
        assert!(tol.is_valid());
        assert!(tol.arc_length < tol.point_merge);
    }

    #[test]
    fn test_rejects_zero() {
        let tol = Tolerances {
            collinear: 0.0,
            ..Default::default()
        };
        assert!(!tol.is_valid());
    }
}
