//! Command-line front end
//!
//! Without `--config` the platform config file is used when present. The
//! program is written to `--output` or stdout. With kerf compensation
//! enabled the compensated guide program is written instead of the rail
//! program.

use crate::{Config, ModelImporter, Session};
use anyhow::{bail, Context};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "wirekit")]
#[command(about = "Generate a synchronized 4-axis wire-EDM program from an STL part")]
#[command(version, long_version = LONG_VERSION)]
pub struct Cli {
    /// Part to cut (STL, ASCII or binary)
    pub model: PathBuf,

    /// Job configuration (TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output file for the program (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Scale factor applied to the model on import
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Move the model so its lowest point sits on Z = 0
    #[arg(long)]
    pub seat_on_bed: bool,
}

/// Load the model and configuration, run the pipeline and write the program.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    if !cli.scale.is_finite() || cli.scale <= 0.0 {
        bail!("Scale must be a positive number, got {}", cli.scale);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path())?,
    };

    let mesh = ModelImporter::new()
        .with_scale(cli.scale)
        .with_seat_on_bed(cli.seat_on_bed)
        .import_file(&cli.model)
        .with_context(|| format!("Failed to import {}", cli.model.display()))?;
    info!("Loaded {} triangles from {}", mesh.len(), cli.model.display());

    let mut session = Session::new(config.to_session_params());
    session.load_mesh(mesh);
    let result = session.recompute().context("Toolpath generation failed")?;

    let program = result.guide_program.as_ref().unwrap_or(&result.program);
    match &cli.output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", program))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} lines to {}", program.lines().count(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", program)?;
        }
    }
    Ok(())
}
