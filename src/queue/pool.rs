//! Bounded-concurrency render worker pool.
//!
//! A fixed number of worker tasks pull jobs from one shared FIFO channel.
//! Callers get a [`RenderHandle`] back immediately and await it for the
//! result; nothing blocks on submission.
//!
//! # Architecture
//!
//! ```text
//!  submit(job) ──▶ ┌───────────────────────┐
//!  submit(job) ──▶ │  FIFO channel (mpsc)  │
//!  submit(job) ──▶ └───────────┬───────────┘
//!                              │  one receiver, shared
//!           ┌──────────────────┼──────────────────┐
//!           ▼                  ▼                  ▼
//!      ┌─────────┐        ┌─────────┐        ┌─────────┐
//!      │worker 0 │        │worker 1 │  ...   │worker N │
//!      └────┬────┘        └────┬────┘        └────┬────┘
//!           │ 1. cache hit? ── yes ──▶ reply       │
//!           │ 2. mkdir -p                          │
//!           │ 3. bounds ──▶ MapRenderer            │
//!           ▼ 4. reply via oneshot                 ▼
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};
use std::task::{Context, Poll};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info};

use super::job::{RenderJob, RenderOutcome};
use crate::cache::{artifact_exists, ensure_parent};
use crate::error::{RenderError, TileError};
use crate::projection::TileProjection;
use crate::render::MapRenderer;

/// Default number of concurrent render workers.
pub const DEFAULT_WORKERS: usize = 10;

type JobResult = Result<RenderOutcome, TileError>;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the render queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of simultaneous renderer invocations
    pub workers: usize,

    /// Attach submissions for a tile that is already queued or rendering to
    /// the first job's result instead of enqueuing a duplicate
    pub coalesce: bool,
}

impl QueueConfig {
    /// Create a configuration with `workers` workers and coalescing disabled.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            coalesce: false,
        }
    }

    /// Enable or disable coalescing of duplicate in-flight jobs.
    pub fn with_coalesce(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Snapshot of queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Configured worker count
    pub workers: usize,

    /// Jobs waiting for a worker
    pub queued: usize,

    /// Jobs currently being processed
    pub active: usize,

    /// Jobs finished successfully (cache hits included)
    pub completed: usize,

    /// Jobs finished with an error
    pub failed: usize,

    /// Jobs answered from the cache without rendering
    pub cache_hits: usize,

    /// Submissions attached to an identical in-flight job
    pub coalesced: usize,
}

#[derive(Default)]
struct Counters {
    queued: AtomicUsize,
    active: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    cache_hits: AtomicUsize,
    coalesced: AtomicUsize,
}

// =============================================================================
// Render Handle
// =============================================================================

/// Future resolving to the result of a submitted job.
///
/// Resolves to [`TileError::QueueClosed`] if the job was dropped without a
/// result (the queue shut down).
pub struct RenderHandle {
    rx: oneshot::Receiver<JobResult>,
}

impl Future for RenderHandle {
    type Output = JobResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(TileError::QueueClosed)))
    }
}

// =============================================================================
// Render Queue
// =============================================================================

struct QueuedJob {
    job: RenderJob,
    reply: oneshot::Sender<JobResult>,
}

/// State shared between the queue handle and its workers.
struct Shared<R: MapRenderer> {
    renderer: Arc<R>,
    projection: Arc<TileProjection>,
    counters: Counters,
    coalesce: bool,

    /// Extra waiters for jobs in flight, keyed by output path (coalescing only)
    in_flight: std::sync::Mutex<HashMap<PathBuf, Vec<oneshot::Sender<JobResult>>>>,
}

/// Render queue with a fixed pool of workers.
///
/// Jobs are dequeued in strict submission order. Each worker checks the
/// cache first and only calls the renderer on a miss, so at most
/// `workers` renders run at once.
///
/// Without coalescing, two concurrent jobs for the same tile may both miss
/// the cache and both render; the last write wins. Renders are
/// deterministic, so the result is correct but the work is wasted.
///
/// The queue closes when it is dropped. Workers finish the jobs already
/// queued and then exit.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tile_render_server::queue::{QueueConfig, RenderJob, RenderQueue};
/// use tile_render_server::projection::{TileCoord, TileProjection};
/// use tile_render_server::render::CommandRenderer;
///
/// let queue = RenderQueue::new(
///     CommandRenderer::default(),
///     Arc::new(TileProjection::default()),
///     QueueConfig::default(),
/// );
///
/// let job = RenderJob::new(TileCoord::new(0, 0, 0), 256, 256, "osm.xml", "/cache/0/0/0.png");
/// let outcome = queue.submit(job).await?;
/// println!("served {} (cache hit: {})", outcome.path.display(), outcome.cache_hit);
/// ```
pub struct RenderQueue<R: MapRenderer> {
    tx: mpsc::UnboundedSender<QueuedJob>,
    shared: Arc<Shared<R>>,
    workers: usize,
}

impl<R: MapRenderer + 'static> RenderQueue<R> {
    /// Create a queue and spawn its workers on the current tokio runtime.
    ///
    /// A worker count of zero is raised to one.
    pub fn new(renderer: R, projection: Arc<TileProjection>, config: QueueConfig) -> Self {
        Self::with_shared_renderer(Arc::new(renderer), projection, config)
    }

    /// Create a queue around a renderer that is shared with other components.
    pub fn with_shared_renderer(
        renderer: Arc<R>,
        projection: Arc<TileProjection>,
        config: QueueConfig,
    ) -> Self {
        let workers = config.workers.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));

        let shared = Arc::new(Shared {
            renderer,
            projection,
            counters: Counters::default(),
            coalesce: config.coalesce,
            in_flight: std::sync::Mutex::new(HashMap::new()),
        });

        for id in 0..workers {
            tokio::spawn(worker_loop(id, Arc::clone(&rx), Arc::clone(&shared)));
        }

        debug!(workers, coalesce = config.coalesce, "Render queue started");

        Self {
            tx,
            shared,
            workers,
        }
    }
}

impl<R: MapRenderer> RenderQueue<R> {
    /// Submit a job. Returns immediately; await the handle for the result.
    pub fn submit(&self, job: RenderJob) -> RenderHandle {
        let (reply, rx) = oneshot::channel();
        let handle = RenderHandle { rx };

        if self.shared.coalesce {
            let mut in_flight = self
                .shared
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if let Some(waiters) = in_flight.get_mut(&job.output) {
                debug!(tile = %job.coord, "Attached to in-flight render");
                waiters.push(reply);
                self.shared.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                return handle;
            }
            in_flight.insert(job.output.clone(), Vec::new());
        }

        self.shared.counters.queued.fetch_add(1, Ordering::Relaxed);
        if let Err(mpsc::error::SendError(queued)) = self.tx.send(QueuedJob { job, reply }) {
            // Dropping `queued.reply` resolves the handle to QueueClosed
            self.shared.counters.queued.fetch_sub(1, Ordering::Relaxed);
            self.shared.take_waiters(&queued.job);
        }

        handle
    }

    /// Number of worker tasks.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The projection table used to compute tile bounds.
    pub fn projection(&self) -> &Arc<TileProjection> {
        &self.shared.projection
    }

    /// The renderer used by the workers.
    pub fn renderer(&self) -> &Arc<R> {
        &self.shared.renderer
    }

    /// Snapshot of the queue counters.
    pub fn stats(&self) -> QueueStats {
        let c = &self.shared.counters;
        QueueStats {
            workers: self.workers,
            queued: c.queued.load(Ordering::Relaxed),
            active: c.active.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            cache_hits: c.cache_hits.load(Ordering::Relaxed),
            coalesced: c.coalesced.load(Ordering::Relaxed),
        }
    }
}

impl<R: MapRenderer> Shared<R> {
    /// Check the cache, and render on a miss.
    async fn process(&self, job: &RenderJob) -> JobResult {
        if artifact_exists(&job.output).await? {
            debug!(tile = %job.coord, "Cache hit");
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(RenderOutcome::new(job, true));
        }

        let request = job.render_request(&self.projection)?;
        ensure_parent(&job.output).await?;

        info!(
            zoom = job.coord.zoom,
            x = job.coord.x,
            y = job.coord.y,
            "Rendering tile"
        );
        let start = Instant::now();

        self.renderer
            .render(&request)
            .await
            .map_err(|source| TileError::Render {
                coord: job.coord,
                source,
            })?;

        info!(
            zoom = job.coord.zoom,
            x = job.coord.x,
            y = job.coord.y,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tile rendered"
        );

        Ok(RenderOutcome::new(job, false))
    }

    /// Remove and return the coalesced waiters for a job.
    fn take_waiters(&self, job: &RenderJob) -> Vec<oneshot::Sender<JobResult>> {
        if !self.coalesce {
            return Vec::new();
        }
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&job.output)
            .unwrap_or_default()
    }

    /// Deliver a job's result to its submitter and any attached waiters.
    fn complete(&self, queued: QueuedJob, result: JobResult) {
        match &result {
            Ok(_) => self.counters.completed.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.counters.failed.fetch_add(1, Ordering::Relaxed),
        };

        for waiter in self.take_waiters(&queued.job) {
            let _ = waiter.send(result.clone());
        }
        // The submitter may have gone away; the tile is cached regardless
        let _ = queued.reply.send(result);
    }
}

async fn worker_loop<R: MapRenderer + 'static>(
    id: usize,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
    shared: Arc<Shared<R>>,
) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(queued) = next else {
            break;
        };

        shared.counters.queued.fetch_sub(1, Ordering::Relaxed);
        shared.counters.active.fetch_add(1, Ordering::Relaxed);

        // A panicking renderer only takes down this task, not the worker
        let task = tokio::spawn({
            let shared = Arc::clone(&shared);
            let job = queued.job.clone();
            async move { shared.process(&job).await }
        });
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(TileError::Render {
                coord: queued.job.coord,
                source: RenderError::Panicked(e.to_string()),
            }),
        };

        shared.counters.active.fetch_sub(1, Ordering::Relaxed);

        if let Err(ref e) = result {
            error!(
                worker = id,
                zoom = queued.job.coord.zoom,
                x = queued.job.coord.x,
                y = queued.job.coord.y,
                "Render job failed: {}",
                e
            );
        }

        shared.complete(queued, result);
    }

    debug!(worker = id, "Render worker exiting");
}

// =============================================================================
// Tests
// =============================================================================
