//! Renderer that shells out to an external program for each tile.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{MapRenderer, RenderRequest};
use crate::error::RenderError;

/// Default renderer program, looked up on `PATH`.
pub const DEFAULT_RENDERER_PROGRAM: &str = "render-map";

/// Default argument template passed to the renderer program.
///
/// The bounding box is EPSG:4326 `min_lon,min_lat,max_lon,max_lat`; the
/// renderer reprojects it into the stylesheet's spatial reference. A 128
/// pixel buffer keeps labels and symbols from being clipped at tile edges.
pub const DEFAULT_RENDERER_ARGS: &[&str] = &[
    "--stylesheet",
    "{stylesheet}",
    "--size",
    "{width}x{height}",
    "--bbox",
    "{min_lon},{min_lat},{max_lon},{max_lat}",
    "--buffer",
    "128",
    "--out",
    "{output}",
];

/// Runs an external program once per tile.
///
/// Arguments are templates; the placeholders `{stylesheet}`, `{width}`,
/// `{height}`, `{min_lon}`, `{min_lat}`, `{max_lon}`, `{max_lat}` and
/// `{output}` are substituted from the [`RenderRequest`]. A non-zero exit
/// status, or a zero exit status without an output file, is a failure.
///
/// # Example
///
/// ```
/// use tile_render_server::render::CommandRenderer;
///
/// let renderer = CommandRenderer::new("nik4")
///     .with_args(["-c", "{min_lon}", "{min_lat}", "{max_lon}", "{max_lat}"]);
/// assert_eq!(renderer.program(), "nik4");
/// ```
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Create a renderer for `program` with the default argument template.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: DEFAULT_RENDERER_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the argument template.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The program this renderer runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument template.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Expand the argument template for a request.
    pub fn expand_args(&self, request: &RenderRequest) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| expand_placeholders(arg, request))
            .collect()
    }
}

impl Default for CommandRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RENDERER_PROGRAM)
    }
}

fn expand_placeholders(template: &str, request: &RenderRequest) -> String {
    template
        .replace("{stylesheet}", &request.stylesheet.to_string_lossy())
        .replace("{width}", &request.width.to_string())
        .replace("{height}", &request.height.to_string())
        .replace("{min_lon}", &request.bounds.min.lon.to_string())
        .replace("{min_lat}", &request.bounds.min.lat.to_string())
        .replace("{max_lon}", &request.bounds.max.lon.to_string())
        .replace("{max_lat}", &request.bounds.max.lat.to_string())
        .replace("{output}", &request.output.to_string_lossy())
}

#[async_trait]
impl MapRenderer for CommandRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
        let args = self.expand_args(request);
        debug!(program = %self.program, ?args, "Invoking renderer");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RenderError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !output_written(&request.output).await? {
            return Err(RenderError::MissingOutput(request.output.clone()));
        }

        Ok(())
    }
}

async fn output_written(path: &Path) -> Result<bool, RenderError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| RenderError::OutputCheck {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

// =============================================================================
// Tests
// =============================================================================
