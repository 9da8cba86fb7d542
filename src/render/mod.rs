//! Boundary to the external map renderer.
//!
//! The server never draws pixels itself. A [`MapRenderer`] receives a
//! geographic bounding box, a stylesheet and an output size, and is
//! responsible for reprojecting into its own spatial reference, drawing and
//! writing the encoded image to the requested path.
//!
//! ```text
//! ┌──────────────┐   RenderRequest    ┌──────────────────────────┐
//! │ RenderQueue  │ ─────────────────▶ │       MapRenderer        │
//! │  (workers)   │ ◀───────────────── │ (CommandRenderer, mocks) │
//! └──────────────┘  Ok / RenderError  └──────────────────────────┘
//! ```

mod command;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::RenderError;
use crate::projection::GeoBounds;

pub use command::{CommandRenderer, DEFAULT_RENDERER_ARGS, DEFAULT_RENDERER_PROGRAM};

/// Everything a renderer needs to produce one tile image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Stylesheet describing layers and symbology
    pub stylesheet: PathBuf,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Geographic (EPSG:4326) extent to draw
    pub bounds: GeoBounds,

    /// File the encoded image must be written to
    pub output: PathBuf,
}

/// Trait for external map renderers.
///
/// Implementations must write the image to `request.output` before
/// returning `Ok`. They may be called concurrently from several workers.
#[async_trait]
pub trait MapRenderer: Send + Sync {
    /// Render the requested extent to `request.output`.
    async fn render(&self, request: &RenderRequest) -> Result<(), RenderError>;
}
