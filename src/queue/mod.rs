//! Render queue and cache coordination.
//!
//! The queue sits between the HTTP layer and the external renderer:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ submit(RenderJob)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              RenderQueue                │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ cache check  │  │ TileProjection  │  │
//! │  │ (file exists)│  │ (tile bounds)   │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │ on miss
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              MapRenderer                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`RenderQueue`]: FIFO queue feeding a fixed pool of workers
//! - [`RenderJob`]: One tile to produce (coordinate, size, stylesheet, output path)
//! - [`RenderHandle`]: Future resolving to the job's [`RenderOutcome`]
//! - [`QueueConfig`]: Worker count and optional coalescing of duplicate jobs
//! - [`QueueStats`]: Counter snapshot reported by the health endpoint

mod job;
mod pool;

pub use job::{RenderJob, RenderOutcome};
pub use pool::{QueueConfig, QueueStats, RenderHandle, RenderQueue, DEFAULT_WORKERS};
