use std::path::PathBuf;

use thiserror::Error;

use crate::projection::TileCoord;

/// Errors reported by an external map renderer
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The renderer process could not be started
    #[error("Failed to start renderer '{program}': {message}")]
    Spawn { program: String, message: String },

    /// The renderer ran but reported failure
    #[error("Renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The renderer reported success but did not produce the output file
    #[error("Renderer did not write output file {0}")]
    MissingOutput(PathBuf),

    /// The output file could not be checked after the renderer exited
    #[error("Failed to check renderer output {}: {message}", path.display())]
    OutputCheck { path: PathBuf, message: String },

    /// The renderer panicked while drawing the tile
    #[error("Renderer panicked: {0}")]
    Panicked(String),

    /// Any other renderer-side failure (used by in-process renderers)
    #[error("Render failed: {0}")]
    Other(String),
}

/// Errors that can occur while serving or producing a tile
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Request path does not match `/{zoom}/{x}/{y}.png` (maps to HTTP 400)
    #[error("Malformed tile request '{path}': {reason}")]
    MalformedRequest { path: String, reason: String },

    /// Zoom level is beyond the projection table (maps to HTTP 400)
    #[error("Invalid zoom level: {zoom} (max: {max_zoom})")]
    InvalidZoom { zoom: u32, max_zoom: u32 },

    /// Cache directory creation or existence check failed
    #[error("Cache I/O error at {}: {message}", path.display())]
    Cache { path: PathBuf, message: String },

    /// The external renderer failed for this tile
    #[error("Render error for tile {coord}: {source}")]
    Render {
        coord: TileCoord,
        #[source]
        source: RenderError,
    },

    /// The render queue shut down before the job completed
    #[error("Render queue closed before the job completed")]
    QueueClosed,

    /// The configured stylesheet does not exist
    #[error("Stylesheet not found: {}", .0.display())]
    StylesheetNotFound(PathBuf),
}

impl TileError {
    /// Build a cache error from an I/O error at the given path.
    pub fn cache(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        TileError::Cache {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error is the client's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TileError::MalformedRequest { .. } | TileError::InvalidZoom { .. }
        )
    }
}
