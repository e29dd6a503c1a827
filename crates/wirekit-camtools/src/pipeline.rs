//! # Toolpath Pipeline
//!
//! [`Session`] holds the working state of one job: the loaded mesh, the
//! rulings the user added by hand and the current parameters. Each call to
//! [`Session::recompute`] runs every stage from scratch and replaces the
//! previous [`JobResult`]; nothing is carried over between runs.

use crate::corner_sync::{sync_corners, CornerSyncResult};
use crate::error::{CamToolError, CamToolResult};
use crate::gcode::{emit_gcode, emit_guide_program};
use crate::kerf::{compensate_rails, GuideLine, KerfParams};
use crate::plane_slicer::{perimeter_set, resolve_heights, slice_at_heights, SliceResult};
use crate::rulings::detect_rulings;
use crate::stitcher::stitch;
use tracing::{debug, info};
use wirekit_core::{Point3, Ruling, Tolerances, ToolpathStep, TriangleMesh};

/// Parameters for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    /// Bottom rail height, `None` for the mesh minimum
    pub bottom_z: Option<f64>,
    /// Top rail height, `None` for the mesh maximum
    pub top_z: Option<f64>,
    /// Fraction of the part height a ruling must cover
    pub span_percentage: f64,
    /// Corners sharper than this (degrees) are synchronized
    pub angle_threshold_deg: f64,
    /// Where the stitched path should start
    pub lead_in: Option<Point3>,
    /// Kerf compensation, skipped when `None`
    pub kerf: Option<KerfParams>,
    pub tolerances: Tolerances,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            bottom_z: None,
            top_z: None,
            span_percentage: 0.9,
            angle_threshold_deg: 135.0,
            lead_in: None,
            kerf: None,
            tolerances: Tolerances::default(),
        }
    }
}

impl PipelineParams {
    pub fn validate(&self) -> CamToolResult<()> {
        if !(0.0..=1.0).contains(&self.span_percentage) {
            return Err(CamToolError::InvalidParameters(format!(
                "span percentage {} is outside 0..1",
                self.span_percentage
            )));
        }
        let angle = self.angle_threshold_deg;
        if !angle.is_finite() || !(0.0..=180.0).contains(&angle) {
            return Err(CamToolError::InvalidParameters(format!(
                "angle threshold {} is outside 0..180 degrees",
                self.angle_threshold_deg
            )));
        }
        if !self.tolerances.is_valid() {
            return Err(CamToolError::InvalidParameters(
                "tolerances must be finite and positive".to_string(),
            ));
        }
        if let Some(kerf) = &self.kerf {
            kerf.validate()?;
        }
        Ok(())
    }
}

/// Everything one recompute produces
#[derive(Debug, Clone)]
pub struct JobResult {
    pub bottom_z: f64,
    pub top_z: f64,
    pub slices: SliceResult,
    /// Detected rulings followed by the manual ones
    pub rulings: Vec<Ruling>,
    pub toolpath: Vec<ToolpathStep>,
    pub corners: CornerSyncResult,
    /// Synchronized rail program
    pub program: String,
    /// Kerf-compensated guide positions, when kerf is enabled
    pub guides: Vec<GuideLine>,
    pub guide_program: Option<String>,
}

/// Working state of one job
#[derive(Debug, Default)]
pub struct Session {
    mesh: Option<TriangleMesh>,
    manual_rulings: Vec<Ruling>,
    params: PipelineParams,
    last: Option<JobResult>,
}

impl Session {
    pub fn new(params: PipelineParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Replace the model. Manual rulings belong to the old model and are dropped.
    pub fn load_mesh(&mut self, mesh: TriangleMesh) {
        debug!("Session model replaced ({} triangles)", mesh.len());
        self.mesh = Some(mesh);
        self.manual_rulings.clear();
        self.last = None;
    }

    pub fn mesh(&self) -> Option<&TriangleMesh> {
        self.mesh.as_ref()
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn set_params(&mut self, params: PipelineParams) {
        self.params = params;
    }

    pub fn add_manual_ruling(&mut self, bottom: Point3, top: Point3) {
        self.manual_rulings.push(Ruling::new(bottom, top));
    }

    pub fn manual_rulings(&self) -> &[Ruling] {
        &self.manual_rulings
    }

    pub fn clear_manual_rulings(&mut self) {
        self.manual_rulings.clear();
    }

    /// Result of the most recent successful recompute.
    pub fn last_result(&self) -> Option<&JobResult> {
        self.last.as_ref()
    }

    /// Run the whole pipeline against the current state.
    pub fn recompute(&mut self) -> CamToolResult<&JobResult> {
        let mesh = self.mesh.as_ref().ok_or(CamToolError::NoModel)?;
        let result = run_pipeline(mesh, &self.manual_rulings, &self.params)?;
        Ok(&*self.last.insert(result))
    }
}

/// Run every stage once.
pub fn run_pipeline(
    mesh: &TriangleMesh,
    manual_rulings: &[Ruling],
    params: &PipelineParams,
) -> CamToolResult<JobResult> {
    params.validate()?;
    let tol = &params.tolerances;

    let (bottom_z, top_z) = resolve_heights(mesh, params.bottom_z, params.top_z)?;
    if top_z <= bottom_z {
        return Err(CamToolError::InvalidParameters(format!(
            "top height {} is not above bottom height {}",
            top_z, bottom_z
        )));
    }

    let slices = slice_at_heights(mesh, Some(bottom_z), Some(top_z), tol)?;
    let p0 = slices.bottom.primary_ring("bottom")?;
    let p1 = slices.top.primary_ring("top")?;

    let mut rulings = detect_rulings(mesh, bottom_z, top_z, params.span_percentage, tol)?;
    rulings.extend_from_slice(manual_rulings);

    let toolpath = stitch(&p0, &p1, &rulings, params.lead_in, tol)?;

    let set = perimeter_set(mesh, bottom_z, top_z, tol)?;
    let corners = sync_corners(&set, params.angle_threshold_deg, tol)?;
    let program = emit_gcode(&corners.top, &corners.bottom, &corners.sync_pairs, tol)?;

    let (guides, guide_program) = match &params.kerf {
        Some(kerf) => {
            // the stitched path repeats its first step at the end
            let body = &toolpath[..toolpath.len().saturating_sub(1)];
            let top: Vec<Point3> = body.iter().map(|s| s.top).collect();
            let bottom: Vec<Point3> = body.iter().map(|s| s.bottom).collect();
            let guides = compensate_rails(&top, &bottom, kerf, tol)?;
            let text = emit_guide_program(&guides);
            (guides, Some(text))
        }
        None => (Vec::new(), None),
    };

    info!(
        "Pipeline finished: {} rulings, {} stitched steps, {} sync pairs",
        rulings.len(),
        toolpath.len(),
        corners.sync_pairs.len()
    );

    Ok(JobResult {
        bottom_z,
        top_z,
        slices,
        rulings,
        toolpath,
        corners,
        program,
        guides,
        guide_program,
    })
}
