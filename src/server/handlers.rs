//! HTTP request handlers for the tile API.
//!
//! # Endpoints
//!
//! - `GET /{zoom}/{x}/{y}.png` - Serve a tile, rendering it on cache miss
//! - `GET /health` - Health check with render queue counters
//! - anything else - `400 Bad Request`

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

use crate::cache::{TileCachePath, TILE_EXTENSION};
use crate::error::TileError;
use crate::projection::TileCoord;
use crate::queue::{QueueStats, RenderJob, RenderQueue};
use crate::render::MapRenderer;

/// Default tile width and height in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Response header reporting whether the tile came from the cache.
pub const CACHE_HIT_HEADER: &str = "x-tile-cache-hit";

// =============================================================================
// Application State
// =============================================================================

/// Fixed parameters applied to every rendered tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSettings {
    /// Tile width in pixels
    pub width: u32,

    /// Tile height in pixels
    pub height: u32,

    /// Stylesheet handed to the renderer
    pub stylesheet: PathBuf,
}

impl TileSettings {
    /// Settings for 256x256 tiles with the given stylesheet.
    pub fn new(stylesheet: impl Into<PathBuf>) -> Self {
        Self {
            width: DEFAULT_TILE_SIZE,
            height: DEFAULT_TILE_SIZE,
            stylesheet: stylesheet.into(),
        }
    }

    /// Set the tile size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<R: MapRenderer> {
    /// Render queue that owns cache checks and rendering
    pub queue: Arc<RenderQueue<R>>,

    /// Cache layout used to address tiles on disk
    pub cache: TileCachePath,

    /// Size and stylesheet for every tile
    pub tile: TileSettings,

    /// Cache-Control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,
}

impl<R: MapRenderer> AppState<R> {
    /// Create a new application state.
    pub fn new(queue: RenderQueue<R>, cache: TileCachePath, tile: TileSettings) -> Self {
        Self::with_shared_queue(Arc::new(queue), cache, tile)
    }

    /// Create a new application state around a queue shared with other components.
    pub fn with_shared_queue(
        queue: Arc<RenderQueue<R>>,
        cache: TileCachePath,
        tile: TileSettings,
    ) -> Self {
        Self {
            queue,
            cache,
            tile,
            cache_max_age: 3600,
        }
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }
}

impl<R: MapRenderer> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            cache: self.cache.clone(),
            tile: self.tile.clone(),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from `/{zoom}/{x}/{filename}` where filename is `{y}.png`. All
/// segments are captured as strings so that malformed values produce the
/// same error as any other malformed path.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    pub zoom: String,
    pub x: String,
    pub filename: String,
}

impl TilePathParams {
    /// Parse the tile coordinate, requiring decimal digits and a `.png` suffix.
    pub fn coord(&self) -> Result<TileCoord, TileError> {
        let path = format!("/{}/{}/{}", self.zoom, self.x, self.filename);

        let y = self
            .filename
            .strip_suffix(TILE_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(|| TileError::MalformedRequest {
                path: path.clone(),
                reason: format!("expected a .{} tile", TILE_EXTENSION),
            })?;

        Ok(TileCoord::new(
            parse_index(&self.zoom, "zoom", &path)?,
            parse_index(&self.x, "x", &path)?,
            parse_index(y, "y", &path)?,
        ))
    }
}

fn parse_index(value: &str, name: &str, path: &str) -> Result<u32, TileError> {
    let malformed = || TileError::MalformedRequest {
        path: path.to_string(),
        reason: format!("{} must be a non-negative integer, got '{}'", name, value),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    value.parse().map_err(|_| malformed())
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "malformed_request", "render_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Render queue counters
    pub queue: QueueStats,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// Malformed requests map to 400; every cache, render or queue failure
/// collapses to 500. The detailed cause goes to the log, the client gets a
/// generic message.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileError::MalformedRequest { .. } => (StatusCode::BAD_REQUEST, "malformed_request"),
            TileError::InvalidZoom { .. } => (StatusCode::BAD_REQUEST, "invalid_zoom"),
            TileError::Cache { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "cache_error"),
            TileError::Render { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "render_error"),
            TileError::QueueClosed => (StatusCode::INTERNAL_SERVER_ERROR, "queue_closed"),
            TileError::StylesheetNotFound(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "stylesheet_not_found")
            }
        };

        let message = if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
            "Failed to produce tile".to_string()
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                self
            );
            self.to_string()
        };

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /{zoom}/{x}/{y}.png`
///
/// # Response
///
/// - `200 OK`: PNG tile streamed from the cache
/// - `400 Bad Request`: Malformed coordinates or unsupported zoom
/// - `500 Internal Server Error`: Cache I/O or render failure
///
/// # Headers
///
/// - `Content-Type: image/png`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Tile-Cache-Hit: true|false`
pub async fn tile_handler<R: MapRenderer + 'static>(
    State(state): State<AppState<R>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, TileError> {
    let coord = params.coord()?;

    let projection = state.queue.projection();
    if !projection.supports_zoom(coord.zoom) {
        return Err(TileError::InvalidZoom {
            zoom: coord.zoom,
            max_zoom: projection.max_zoom().unwrap_or(0),
        });
    }

    let job = RenderJob::new(
        coord,
        state.tile.width,
        state.tile.height,
        state.tile.stylesheet.clone(),
        state.cache.resolve(coord),
    );

    let outcome = state.queue.submit(job).await?;

    let file = tokio::fs::File::open(&outcome.path)
        .await
        .map_err(|e| TileError::cache(&outcome.path, e))?;

    debug!(
        zoom = coord.zoom,
        x = coord.x,
        y = coord.y,
        cache_hit = outcome.cache_hit,
        "Tile served"
    );

    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
        (
            HeaderName::from_static(CACHE_HIT_HEADER),
            outcome.cache_hit.to_string(),
        ),
    ];

    Ok((
        StatusCode::OK,
        headers,
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "queue": { "workers": 10, "queued": 0, "active": 1, ... }
/// }
/// ```
pub async fn health_handler<R: MapRenderer + 'static>(
    State(state): State<AppState<R>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        queue: state.queue.stats(),
    })
}

/// Reject every path that is not a tile, the health check or a static asset.
pub async fn fallback_handler(OriginalUri(uri): OriginalUri) -> TileError {
    TileError::MalformedRequest {
        path: uri.path().to_string(),
        reason: "expected /{zoom}/{x}/{y}.png".to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
