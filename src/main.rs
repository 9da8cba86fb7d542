//! Tile Render Server - renders map tiles on demand.
//!
//! This binary starts the HTTP server or renders a single tile.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_render_server::{
    cache::{ensure_parent, TileCachePath},
    config::{Cli, Command, RenderConfig, ServeConfig},
    error::TileError,
    projection::TileProjection,
    queue::{RenderJob, RenderQueue},
    render::MapRenderer,
    server::{create_router, AppState, RouterConfig, TileSettings},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Render(config) => run_render(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    if !config.stylesheet.exists() {
        error!("{}", TileError::StylesheetNotFound(config.stylesheet.clone()));
        return ExitCode::FAILURE;
    }

    let renderer = config.renderer.build();

    info!("Tile Render Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Cache dir: {}", config.cache_dir.display());
    info!("  Stylesheet: {}", config.stylesheet.display());
    info!(
        "  Tiles: {}x{} px, zoom 0-{}",
        config.tile_width, config.tile_height, config.max_zoom
    );
    info!(
        "  Workers: {}{}",
        config.workers,
        if config.coalesce { " (coalescing)" } else { "" }
    );
    info!("  Renderer: {} {}", renderer.program(), renderer.args().join(" "));
    match config.static_dir {
        Some(ref dir) => info!("  Static assets: {}", dir.display()),
        None => warn!("  Static assets: none, /openlayers is not served"),
    }

    let projection = Arc::new(TileProjection::with_max_zoom(config.max_zoom));
    let queue = RenderQueue::new(renderer, projection, config.queue_config());
    let settings = TileSettings::new(&config.stylesheet)
        .with_size(config.tile_width, config.tile_height);
    let state = AppState::new(queue, TileCachePath::new(&config.cache_dir), settings);

    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/0/0/0.png", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    if let Some(ref dir) = config.static_dir {
        router_config = router_config.with_static_dir(dir);
    }

    router_config
}

// =============================================================================
// Render Command
// =============================================================================

async fn run_render(config: RenderConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    if !config.stylesheet.exists() {
        error!("{}", TileError::StylesheetNotFound(config.stylesheet.clone()));
        return ExitCode::FAILURE;
    }

    let coord = config.coord();
    if !coord.is_valid() {
        warn!(
            "Tile {} lies outside the {}x{} grid of zoom {}",
            coord,
            coord.tiles_per_axis(),
            coord.tiles_per_axis(),
            coord.zoom
        );
    }

    let projection = TileProjection::with_max_zoom(config.max_zoom);
    let renderer = config.renderer.build();
    let job = RenderJob::new(
        coord,
        config.width,
        config.height,
        &config.stylesheet,
        &config.out,
    );

    match render_once(&renderer, &projection, &job).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Render one tile unconditionally, overwriting any existing output.
async fn render_once<R: MapRenderer>(
    renderer: &R,
    projection: &TileProjection,
    job: &RenderJob,
) -> Result<(), TileError> {
    let request = job.render_request(projection)?;
    ensure_parent(&request.output).await?;

    info!(
        "Rendering {} bbox=({}, {}, {}, {}) -> {}",
        job.coord,
        request.bounds.min.lon,
        request.bounds.min.lat,
        request.bounds.max.lon,
        request.bounds.max.lat,
        request.output.display()
    );

    let start = Instant::now();
    renderer
        .render(&request)
        .await
        .map_err(|source| TileError::Render {
            coord: job.coord,
            source,
        })?;

    info!(
        "Tile {} rendered in {}ms",
        job.coord,
        start.elapsed().as_millis()
    );
    Ok(())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_render_server=debug,tower_http=debug"
    } else {
        "tile_render_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
