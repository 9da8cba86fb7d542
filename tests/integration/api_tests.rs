//! API integration tests for tile retrieval and error handling.
//!
//! Tests verify:
//! - Rendering on cache miss and serving from disk on cache hit
//! - Error cases (malformed paths, unsupported zoom, render failure)
//! - Health check, static asset passthrough and response headers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tile_render_server::RouterConfig;

use super::test_utils::{
    create_test_png, create_test_router, create_test_router_with_config, is_valid_png,
    MockRenderer,
};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_miss_renders_and_serves_png() {
    let cache = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::new();
    let router = create_test_router(renderer.clone(), cache.path());

    let response = router.oneshot(get("/1/0/1.png")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(response.headers().get("x-tile-cache-hit").unwrap(), "false");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_png(&body), "Response should be a valid PNG");

    let cached = cache.path().join("1").join("0").join("1.png");
    assert_eq!(std::fs::read(&cached).unwrap(), body.to_vec());
    assert_eq!(renderer.calls(), 1);

    // Tile (1, 0, 1) is the south-west quadrant of the world
    let request = &renderer.requests()[0];
    assert_eq!((request.width, request.height), (256, 256));
    assert!((request.bounds.min.lon + 180.0).abs() < 1e-6);
    assert!(request.bounds.max.lon.abs() < 1e-6);
    assert!(request.bounds.max.lat.abs() < 1e-6);
    assert!(request.bounds.min.lat < -85.0);
    assert_eq!(request.output, cached);
}

#[tokio::test]
async fn test_second_request_is_cache_hit() {
    let cache = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::new();
    let router = create_test_router(renderer.clone(), cache.path());

    let first = router.clone().oneshot(get("/3/5/2.png")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("x-tile-cache-hit").unwrap(), "false");
    let first_body = first.into_body().collect().await.unwrap().to_bytes();

    let second = router.oneshot(get("/3/5/2.png")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers().get("x-tile-cache-hit").unwrap(), "true");
    let second_body = second.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(first_body, second_body);
    assert_eq!(renderer.calls(), 1, "cached tile must not be re-rendered");
}

#[tokio::test]
async fn test_existing_file_served_without_render() {
    let cache = tempfile::tempdir().unwrap();
    let tile_dir = cache.path().join("0").join("0");
    std::fs::create_dir_all(&tile_dir).unwrap();
    let png = create_test_png(8, 8);
    std::fs::write(tile_dir.join("0.png"), &png).unwrap();

    let renderer = MockRenderer::new();
    let router = create_test_router(renderer.clone(), cache.path());

    let response = router.oneshot(get("/0/0/0.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-tile-cache-hit").unwrap(), "true");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.to_vec(), png);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let cache = tempfile::tempdir().unwrap();
    let router = create_test_router_with_config(
        MockRenderer::new(),
        cache.path(),
        RouterConfig::new().with_tracing(false).with_cache_max_age(60),
    );

    let response = router.oneshot(get("/0/0/0.png")).await.unwrap();
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=60"
    );
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_malformed_paths_rejected() {
    let cache = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::new();
    let router = create_test_router(renderer.clone(), cache.path());

    for uri in [
        "/abc/def.png",
        "/foo",
        "/favicon.ico",
        "/a/b/c.png",
        "/1/2/3.jpg",
        "/1/2/3",
        "/1/-2/3.png",
        "/1/2/3/4.png",
        "/",
    ] {
        let response = router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {}",
            uri
        );

        let error = json_body(response).await;
        assert_eq!(error["error"], "malformed_request", "uri {}", uri);
    }

    assert_eq!(renderer.calls(), 0);
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_zoom_beyond_table_rejected() {
    let cache = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::new();
    let router = create_test_router(renderer.clone(), cache.path());

    let response = router.oneshot(get("/21/0/0.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error = json_body(response).await;
    assert_eq!(error["error"], "invalid_zoom");
    assert_eq!(error["status"], 400);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_render_failure_returns_500() {
    let cache = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::failing();
    let router = create_test_router(renderer.clone(), cache.path());

    let response = router.oneshot(get("/2/1/1.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error = json_body(response).await;
    assert_eq!(error["error"], "render_error");
    assert_eq!(error["message"], "Failed to produce tile");

    assert_eq!(renderer.calls(), 1);
    assert!(!cache.path().join("2").join("1").join("1.png").exists());
}

// =============================================================================
// Health Check
// =============================================================================

#[tokio::test]
async fn test_health_reports_queue_stats() {
    let cache = tempfile::tempdir().unwrap();
    let router = create_test_router(MockRenderer::new(), cache.path());

    let _ = router.clone().oneshot(get("/0/0/0.png")).await.unwrap();
    let _ = router.clone().oneshot(get("/0/0/0.png")).await.unwrap();

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = json_body(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(health["queue"]["workers"], 4);
    assert_eq!(health["queue"]["completed"], 2);
    assert_eq!(health["queue"]["cache_hits"], 1);
    assert_eq!(health["queue"]["failed"], 0);
}

// =============================================================================
// Static Assets and CORS
// =============================================================================

#[tokio::test]
async fn test_static_assets_served_under_prefix() {
    let cache = tempfile::tempdir().unwrap();
    let public = tempfile::tempdir().unwrap();
    let assets = public.path().join("openlayers");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("index.html"), "<html>map</html>").unwrap();

    let renderer = MockRenderer::new();
    let router = create_test_router_with_config(
        renderer.clone(),
        cache.path(),
        RouterConfig::new()
            .with_tracing(false)
            .with_static_dir(public.path()),
    );

    let response = router.oneshot(get("/openlayers/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"<html>map</html>");
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_missing_static_asset_rejected() {
    let cache = tempfile::tempdir().unwrap();
    let public = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(public.path().join("openlayers")).unwrap();

    let router = create_test_router_with_config(
        MockRenderer::new(),
        cache.path(),
        RouterConfig::new()
            .with_tracing(false)
            .with_static_dir(public.path()),
    );

    let response = router.oneshot(get("/openlayers/missing.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error = json_body(response).await;
    assert_eq!(error["error"], "malformed_request");
    assert!(error["message"]
        .as_str()
        .unwrap()
        .contains("/openlayers/missing.js"));
}

#[tokio::test]
async fn test_static_assets_absent_without_static_dir() {
    let cache = tempfile::tempdir().unwrap();
    let router = create_test_router(MockRenderer::new(), cache.path());

    let response = router.oneshot(get("/openlayers/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let cache = tempfile::tempdir().unwrap();
    let router = create_test_router(MockRenderer::new(), cache.path());

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://maps.example.com")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

fn with_origin(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("origin", origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cors_explicit_origins() {
    let cache = tempfile::tempdir().unwrap();
    let router = create_test_router_with_config(
        MockRenderer::new(),
        cache.path(),
        RouterConfig::new()
            .with_tracing(false)
            .with_cors_origins(vec!["https://maps.example.com".to_string()]),
    );

    let allowed = router
        .clone()
        .oneshot(with_origin("/health", "https://maps.example.com"))
        .await
        .unwrap();
    assert_eq!(
        allowed
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "https://maps.example.com"
    );

    let denied = router
        .oneshot(with_origin("/health", "https://evil.example.com"))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::OK);
    assert!(denied
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn test_cors_empty_origin_list_denies_all() {
    let cache = tempfile::tempdir().unwrap();
    let router = create_test_router_with_config(
        MockRenderer::new(),
        cache.path(),
        RouterConfig::new()
            .with_tracing(false)
            .with_cors_origins(vec![]),
    );

    let response = router
        .oneshot(with_origin("/health", "https://maps.example.com"))
        .await
        .unwrap();
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
