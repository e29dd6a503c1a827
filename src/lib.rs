//! # WireKit
//!
//! Wire-EDM toolpath generation for 4-axis machines. A triangulated part goes
//! in; a synchronized `G1 X Y Z U V W` program comes out, where XYZ drives
//! the upper wire guide and UVW the lower one.
//!
//! ## Architecture
//!
//! WireKit is organized as a workspace with multiple crates:
//!
//! 1. **wirekit-core** - Point types, tolerances, meshes, polylines, errors
//! 2. **wirekit-camtools** - Slicing, rulings, stitching, corner sync, kerf, G-code
//! 3. **wirekit-settings** - Job configuration and persistence
//! 4. **wirekit** - Command-line binary that integrates all crates

pub mod cli;

pub use wirekit_core::{
    Error, GeometryError, ModelImporter, Perimeter, Point3, Polyline, Result, Ruling, SyncPair,
    Tolerances, ToolpathStep, TriangleMesh,
};

pub use wirekit_camtools::{
    emit_gcode, kerf_offsets, stitch, sync_corners, CamToolError, CornerSyncResult, JobResult,
    KerfParams, PerimeterSet, PipelineParams, Session,
};

pub use wirekit_settings::{Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty output on stderr, leaving stdout for the program text
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
