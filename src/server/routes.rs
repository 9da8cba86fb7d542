//! Router configuration for the tile server.
//!
//! # Route Structure
//!
//! ```text
//! /health                    - Health check with queue counters
//! /{zoom}/{x}/{y}.png        - Tile endpoint
//! /openlayers/*              - Static viewer assets (when a static dir is set)
//! everything else            - 400 Bad Request
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tile_render_server::cache::TileCachePath;
//! use tile_render_server::projection::TileProjection;
//! use tile_render_server::queue::{QueueConfig, RenderQueue};
//! use tile_render_server::render::CommandRenderer;
//! use tile_render_server::server::{create_router, AppState, RouterConfig, TileSettings};
//!
//! let queue = RenderQueue::new(
//!     CommandRenderer::default(),
//!     Arc::new(TileProjection::default()),
//!     QueueConfig::default(),
//! );
//! let state = AppState::new(queue, TileCachePath::new("/var/cache/tiles"), TileSettings::new("osm.xml"));
//! let router = create_router(state, RouterConfig::new().with_static_dir("./public"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:9999").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::{handler::HandlerWithoutStateExt, routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{fallback_handler, health_handler, tile_handler, AppState};
use crate::render::MapRenderer;

/// URL prefix under which static viewer assets are served.
pub const STATIC_PREFIX: &str = "/openlayers";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Directory containing the `openlayers/` viewer assets
    pub static_dir: Option<PathBuf>,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    /// - No static assets are served
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
            static_dir: None,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Serve `{dir}/openlayers/*` under `/openlayers/*`.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - The tile route and health check
/// - Optional static asset passthrough
/// - A fallback that answers 400 for every other path
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router<R>(state: AppState<R>, config: RouterConfig) -> Router
where
    R: MapRenderer + 'static,
{
    let state = state.with_cache_max_age(config.cache_max_age);
    let cors = build_cors_layer(&config);

    let mut router = Router::new()
        .route("/health", get(health_handler::<R>))
        .route("/{zoom}/{x}/{filename}", get(tile_handler::<R>));

    if let Some(ref dir) = config.static_dir {
        // Missing assets get the same 400 as any other unknown path
        let assets = ServeDir::new(dir.join(STATIC_PREFIX.trim_start_matches('/')))
            .fallback(fallback_handler.into_service());
        router = router.nest_service(STATIC_PREFIX, assets);
    }

    let router = router
        .fallback(fallback_handler)
        .with_state(state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
