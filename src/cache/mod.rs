//! On-disk tile cache layout.
//!
//! Rendered tiles live at `{root}/{zoom}/{x}/{y}.png`. A file's existence is
//! the only cache-hit signal: there is no metadata, TTL or checksum, and
//! files are only ever created, never rewritten or removed.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::TileError;
use crate::projection::TileCoord;

/// File extension of cached tiles.
pub const TILE_EXTENSION: &str = "png";

/// Resolves tile coordinates to cache file paths under a root directory.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use tile_render_server::cache::TileCachePath;
/// use tile_render_server::projection::TileCoord;
///
/// let cache = TileCachePath::new("/var/cache/tiles");
/// let path = cache.resolve(TileCoord::new(3, 5, 2));
/// assert_eq!(path, Path::new("/var/cache/tiles/3/5/2.png"));
/// ```
#[derive(Debug, Clone)]
pub struct TileCachePath {
    root: PathBuf,
}

impl TileCachePath {
    /// Create a resolver rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the cached artifact for `coord`.
    pub fn resolve(&self, coord: TileCoord) -> PathBuf {
        self.root
            .join(coord.zoom.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.{}", coord.y, TILE_EXTENSION))
    }
}

/// Create every missing directory above `path`.
///
/// Safe to call concurrently for the same chain: a directory that already
/// exists (or was created by another worker in the meantime) is success.
pub async fn ensure_parent(path: &Path) -> Result<(), TileError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    match tokio::fs::create_dir_all(parent).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && parent.is_dir() => Ok(()),
        Err(e) => Err(TileError::cache(parent, e)),
    }
}

/// Whether a cached artifact exists at `path`.
pub async fn artifact_exists(path: &Path) -> Result<bool, TileError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| TileError::cache(path, e))
}

// =============================================================================
// Tests
// =============================================================================
