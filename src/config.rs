//! Configuration management for the tile server.
//!
//! This module provides the CLI surface via clap:
//! - `serve`: run the HTTP tile server
//! - `render`: render a single tile to a file and exit
//!
//! Most options can also be set via environment variables with the `TILE_`
//! prefix:
//!
//! - `TILE_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILE_PORT` - Server port (default: 9999)
//! - `TILE_CACHE_DIR` - Tile cache root directory (required for `serve`)
//! - `TILE_STYLESHEET` - Stylesheet path (default: osm.xml)
//! - `TILE_WORKERS` - Concurrent renders (default: 10)
//! - `TILE_RENDERER` - Renderer program (default: render-map)
//! - `TILE_STATIC_DIR` - Directory holding the `openlayers/` viewer
//! - `TILE_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::projection::{TileCoord, DEFAULT_MAX_ZOOM};
use crate::queue::{QueueConfig, DEFAULT_WORKERS};
use crate::render::{CommandRenderer, DEFAULT_RENDERER_PROGRAM};
use crate::server::DEFAULT_TILE_SIZE;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 9999;

/// Default stylesheet path.
pub const DEFAULT_STYLESHEET: &str = "osm.xml";

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Largest zoom level accepted for the projection table.
pub const MAX_SUPPORTED_ZOOM: u32 = 30;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Render Server - renders map tiles on demand and caches them on disk.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-render-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Consume the CLI and return the selected command.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP tile server.
    Serve(ServeConfig),

    /// Render a single tile to a file and exit.
    Render(RenderConfig),
}

/// External renderer settings shared by both subcommands.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Renderer program to invoke for each tile.
    #[arg(long, default_value = DEFAULT_RENDERER_PROGRAM, env = "TILE_RENDERER")]
    pub renderer: String,

    /// Renderer argument template (repeatable). Placeholders: {stylesheet},
    /// {width}, {height}, {min_lon}, {min_lat}, {max_lon}, {max_lat}, {output}.
    ///
    /// If not given, a default template is used.
    #[arg(long = "renderer-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub renderer_args: Vec<String>,
}

impl RendererConfig {
    /// Build the command renderer described by these settings.
    pub fn build(&self) -> CommandRenderer {
        let renderer = CommandRenderer::new(&self.renderer);
        if self.renderer_args.is_empty() {
            renderer
        } else {
            renderer.with_args(self.renderer_args.iter().cloned())
        }
    }
}

/// Configuration for the `serve` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILE_PORT")]
    pub port: u16,

    /// Directory containing `openlayers/` viewer assets, served under /openlayers.
    #[arg(long, env = "TILE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TILE_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated). If not specified, allows any origin.
    #[arg(long, env = "TILE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Tile Configuration
    // =========================================================================
    /// Root directory of the on-disk tile cache.
    #[arg(long, env = "TILE_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Stylesheet passed to the renderer.
    #[arg(long, default_value = DEFAULT_STYLESHEET, env = "TILE_STYLESHEET")]
    pub stylesheet: PathBuf,

    /// Tile width in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_width: u32,

    /// Tile height in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_height: u32,

    /// Highest zoom level served.
    #[arg(long, default_value_t = DEFAULT_MAX_ZOOM)]
    pub max_zoom: u32,

    // =========================================================================
    // Render Queue Configuration
    // =========================================================================
    /// Maximum number of concurrent renders.
    #[arg(long, default_value_t = DEFAULT_WORKERS, env = "TILE_WORKERS")]
    pub workers: usize,

    /// Share one render between concurrent requests for the same tile.
    #[arg(long, default_value_t = false)]
    pub coalesce: bool,

    #[command(flatten)]
    pub renderer: RendererConfig,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(
                "Cache directory is required. Set --cache-dir or TILE_CACHE_DIR".to_string(),
            );
        }

        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }

        validate_tile_size(self.tile_width, self.tile_height)?;
        validate_max_zoom(self.max_zoom)?;

        if self.renderer.renderer.is_empty() {
            return Err("renderer program must not be empty".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Render queue settings.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig::new(self.workers).with_coalesce(self.coalesce)
    }
}

/// Configuration for the `render` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RenderConfig {
    /// Tile X.
    #[arg(long)]
    pub x: u32,

    /// Tile Y.
    #[arg(long)]
    pub y: u32,

    /// Zoom level.
    #[arg(long)]
    pub zoom: u32,

    /// The output filename.
    #[arg(long)]
    pub out: PathBuf,

    /// Stylesheet passed to the renderer.
    #[arg(long, default_value = DEFAULT_STYLESHEET, env = "TILE_STYLESHEET")]
    pub stylesheet: PathBuf,

    /// Tile width in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub width: u32,

    /// Tile height in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub height: u32,

    /// Highest zoom level covered by the projection table.
    #[arg(long, default_value_t = DEFAULT_MAX_ZOOM)]
    pub max_zoom: u32,

    #[command(flatten)]
    pub renderer: RendererConfig,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl RenderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_tile_size(self.width, self.height)?;
        validate_max_zoom(self.max_zoom)?;

        if self.zoom > self.max_zoom {
            return Err(format!(
                "zoom {} exceeds max_zoom {}",
                self.zoom, self.max_zoom
            ));
        }

        Ok(())
    }

    /// The tile to render.
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.zoom, self.x, self.y)
    }
}

fn validate_tile_size(width: u32, height: u32) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err("tile width and height must be greater than 0".to_string());
    }
    Ok(())
}

fn validate_max_zoom(max_zoom: u32) -> Result<(), String> {
    if max_zoom > MAX_SUPPORTED_ZOOM {
        return Err(format!(
            "max_zoom must be at most {}, got {}",
            MAX_SUPPORTED_ZOOM, max_zoom
        ));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
