//! # Tile Render Server
//!
//! An HTTP server that renders slippy-map tiles on demand and caches them on
//! disk.
//!
//! Clients request tiles by `/{zoom}/{x}/{y}.png`. A tile already present in
//! the cache is streamed straight from disk; otherwise a worker from a bounded
//! pool invokes the external map renderer for the tile's geographic bounding
//! box, writes the result into the cache, and the file is then served.
//!
//! ## Features
//!
//! - **Spherical Mercator math**: Precomputed per-zoom projection table
//! - **Write-once disk cache**: `{root}/{zoom}/{x}/{y}.png`, existence is the hit signal
//! - **Bounded rendering**: A fixed number of workers drain a FIFO job queue
//! - **Pluggable renderer**: Any program driven by an argument template
//! - **Static viewer passthrough**: Optional `/openlayers/*` asset serving
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`projection`] - Tile coordinates and Mercator projection table
//! - [`cache`] - Cache path layout and directory handling
//! - [`render`] - Renderer trait and external command renderer
//! - [`queue`] - Render jobs and the bounded worker pool
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tile_render_server::{
//!     create_router, AppState, CommandRenderer, QueueConfig, RenderQueue, RouterConfig,
//!     TileCachePath, TileProjection, TileSettings,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let queue = RenderQueue::new(
//!         CommandRenderer::default(),
//!         Arc::new(TileProjection::default()),
//!         QueueConfig::new(4),
//!     );
//!     let state = AppState::new(
//!         queue,
//!         TileCachePath::new("/var/cache/tiles"),
//!         TileSettings::new("osm.xml"),
//!     );
//!     let router = create_router(state, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:9999").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod projection;
pub mod queue;
pub mod render;
pub mod server;

// Re-export commonly used types
pub use cache::{artifact_exists, ensure_parent, TileCachePath, TILE_EXTENSION};
pub use config::{Cli, Command, RenderConfig, RendererConfig, ServeConfig};
pub use error::{RenderError, TileError};
pub use projection::{
    GeoBounds, GeoPoint, PixelPoint, TileCoord, TileProjection, ZoomLevel, BASE_TILE_SIZE,
    DEFAULT_MAX_ZOOM,
};
pub use queue::{
    QueueConfig, QueueStats, RenderHandle, RenderJob, RenderOutcome, RenderQueue, DEFAULT_WORKERS,
};
pub use render::{
    CommandRenderer, MapRenderer, RenderRequest, DEFAULT_RENDERER_ARGS, DEFAULT_RENDERER_PROGRAM,
};
pub use server::{
    create_router, fallback_handler, health_handler, tile_handler, AppState, ErrorResponse,
    HealthResponse, RouterConfig, TilePathParams, TileSettings, CACHE_HIT_HEADER,
    DEFAULT_TILE_SIZE,
};
