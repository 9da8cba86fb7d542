//! Test utilities for integration tests.
//!
//! This module provides mock renderers that write real PNG files and helpers
//! for building routers over a temporary cache directory.

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tile_render_server::error::RenderError;
use tile_render_server::projection::TileProjection;
use tile_render_server::queue::{QueueConfig, RenderQueue};
use tile_render_server::render::{MapRenderer, RenderRequest};
use tile_render_server::server::{AppState, TileSettings};
use tile_render_server::{create_router, RouterConfig, TileCachePath};

// =============================================================================
// Mock Renderer with Call Tracking
// =============================================================================

/// A renderer that writes a solid-color PNG and tracks every invocation.
///
/// Clones share their counters, so a test can keep one copy for assertions
/// while the queue owns another.
#[derive(Clone, Default)]
pub struct MockRenderer {
    calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RenderRequest>>>,
    delay: Option<Duration>,
    fail: bool,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold each render for `delay` before writing the output.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every render without writing output.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of renders observed running at the same time.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MapRenderer for MockRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail {
            Err(RenderError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "stylesheet could not be loaded".to_string(),
            })
        } else {
            let png = create_test_png(request.width, request.height);
            tokio::fs::write(&request.output, png)
                .await
                .map_err(|e| RenderError::Other(e.to_string()))
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

// =============================================================================
// Test PNG Creation
// =============================================================================

/// Encode a solid-color RGB image as PNG.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([170, 211, 223]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Check whether the data starts with the PNG signature.
pub fn is_valid_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Build a render queue over the default projection table.
pub fn create_queue(renderer: MockRenderer, workers: usize) -> RenderQueue<MockRenderer> {
    RenderQueue::new(
        renderer,
        Arc::new(TileProjection::default()),
        QueueConfig::new(workers),
    )
}

/// Build a router rendering into `cache_dir` with tracing disabled.
pub fn create_test_router(renderer: MockRenderer, cache_dir: &Path) -> axum::Router {
    create_test_router_with_config(renderer, cache_dir, RouterConfig::new().with_tracing(false))
}

/// Build a router rendering into `cache_dir` with a custom router configuration.
pub fn create_test_router_with_config(
    renderer: MockRenderer,
    cache_dir: &Path,
    config: RouterConfig,
) -> axum::Router {
    let state = AppState::new(
        create_queue(renderer, 4),
        TileCachePath::new(cache_dir),
        TileSettings::new("osm.xml"),
    );
    create_router(state, config)
}
