//! Render job description and outcome.

use std::path::{Path, PathBuf};

use crate::error::TileError;
use crate::projection::{TileCoord, TileProjection};
use crate::render::RenderRequest;

// =============================================================================
// Render Job
// =============================================================================

/// One tile to be produced and cached.
///
/// Created per inbound request and moved into the queue; a worker consumes
/// it exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// Tile address
    pub coord: TileCoord,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Stylesheet passed through to the renderer
    pub stylesheet: PathBuf,

    /// Cache artifact path the renderer writes to
    pub output: PathBuf,
}

impl RenderJob {
    /// Create a new render job.
    pub fn new(
        coord: TileCoord,
        width: u32,
        height: u32,
        stylesheet: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            coord,
            width,
            height,
            stylesheet: stylesheet.into(),
            output: output.into(),
        }
    }

    /// Build the renderer request, computing the tile's geographic bounds.
    ///
    /// Fails with [`TileError::InvalidZoom`] if the projection table does not
    /// cover the job's zoom level.
    pub fn render_request(&self, projection: &TileProjection) -> Result<RenderRequest, TileError> {
        if !projection.supports_zoom(self.coord.zoom) {
            return Err(TileError::InvalidZoom {
                zoom: self.coord.zoom,
                max_zoom: projection.max_zoom().unwrap_or(0),
            });
        }

        Ok(RenderRequest {
            stylesheet: self.stylesheet.clone(),
            width: self.width,
            height: self.height,
            bounds: projection.tile_bounds(self.coord, self.width, self.height),
            output: self.output.clone(),
        })
    }
}

// =============================================================================
// Render Outcome
// =============================================================================

/// Result of a successfully completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Tile address
    pub coord: TileCoord,

    /// Path of the cached artifact, safe to serve
    pub path: PathBuf,

    /// Whether the artifact already existed and no render was performed
    pub cache_hit: bool,
}

impl RenderOutcome {
    pub(crate) fn new(job: &RenderJob, cache_hit: bool) -> Self {
        Self {
            coord: job.coord,
            path: job.output.clone(),
            cache_hit,
        }
    }

    /// Path of the cached artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
