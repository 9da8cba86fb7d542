//! HTTP server layer for the tile server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                  GET /{zoom}/{x}/{y}.png                        │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (parse, submit, stream)  │  │ (router, CORS, static dir)  │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers never look at the cache themselves; every tile request becomes a
//! render job and the queue decides whether rendering is needed.

pub mod handlers;
pub mod routes;

pub use handlers::{
    fallback_handler, health_handler, tile_handler, AppState, ErrorResponse, HealthResponse,
    TilePathParams, TileSettings, CACHE_HIT_HEADER, DEFAULT_TILE_SIZE,
};
pub use routes::{create_router, RouterConfig, STATIC_PREFIX};
