//! # WireKit CAM Tools
//!
//! The geometry pipeline that turns a triangulated part into a synchronized
//! 4-axis wire-EDM program.
//!
//! ## Pipeline Stages
//!
//! - **Segment Graph**: Assembles unordered segments into ordered polylines
//! - **Plane Slicer**: Cuts rail perimeters out of the mesh at a height
//! - **Rulings**: Finds straight edge chains spanning the part height
//! - **Stitcher**: Pairs every top rail vertex with a bottom rail point
//! - **Intersect**: Planar segment intersection shared by corner sync
//! - **Corner Sync**: Inserts matched vertices at sharp corners
//! - **Kerf**: Wire-radius offsets carried to the guide planes
//! - **G-code**: Arc-length synchronized `G1 X Y Z U V W` program
//!
//! ## Supporting Infrastructure
//!
//! - **Pipeline**: Session state and the recompute entry point

pub mod corner_sync;
pub mod error;
pub mod gcode;
pub mod intersect;
pub mod kerf;
pub mod pipeline;
pub mod plane_slicer;
pub mod rulings;
pub mod segment_graph;
pub mod stitcher;

pub use corner_sync::{sync_corners, CornerSyncResult, PerimeterSet, SolutionLine};
pub use error::{CamToolError, CamToolResult};
pub use gcode::{emit_gcode, emit_guide_program, format_move};
pub use intersect::{dedup_intersections, intersect_rings, intersect_segments, Intersection};
pub use kerf::{compensate_rails, kerf_offsets, GuideLine, KerfParams, KerfPoints, KerfSolution};
pub use pipeline::{run_pipeline, JobResult, PipelineParams, Session};
pub use plane_slicer::{
    perimeter_set, slice_at_heights, slice_crossing, slice_land_face, SliceResult,
};
pub use rulings::detect_rulings;
pub use segment_graph::{reconstruct_polylines, SegmentGraph};
pub use stitcher::stitch;
