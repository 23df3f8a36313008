//! Router smoke tests. These exercise routing, extractors, and middleware
//! without a database: the pool is lazy and the endpoints hit here never
//! acquire a connection.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use tms_api::app::create_app;
use tms_api::config::Config;

fn test_app() -> axum::Router {
    let config = Config::load_for_test(&[("database.url", "postgres://localhost/tms_smoke")])
        .expect("test config");
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/tms_smoke")
        .expect("lazy pool");
    create_app(config, pool)
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_applied() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("x-content-type-options")
            .map(|v| v.to_str().unwrap()),
        Some("nosniff")
    );
    assert!(response.headers().contains_key("x-frame-options"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_uuid_path_is_client_error() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/loads/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint_exposed() {
    tms_api::middleware::metrics::init_metrics();
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
