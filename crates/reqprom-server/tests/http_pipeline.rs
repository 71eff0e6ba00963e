//! End-to-end tests: demo router + middleware driven through `oneshot`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use prometheus::Registry;
use tower::ServiceExt;

use reqprom_server::{
    app_state::AppState,
    config::{self, ServerConfig},
    obs::PrometheusRegistry,
    router,
};

use scrape::{counter_sum, histogram_count, histogram_sum, ALL_METRICS};

fn demo(cfg: ServerConfig) -> (Registry, Router) {
    let registry = Registry::new();
    let state = AppState::new(cfg, registry.clone()).unwrap();
    (registry, router::build_router(state))
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn ok_request_is_counted() {
    let (registry, app) = demo(ServerConfig::default());
    let resp = app.oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "hi");

    assert_eq!(counter_sum(&registry, "http_requests", &[("path", "/"), ("status", "200"), ("method", "GET")]), 1.0);
    assert_eq!(counter_sum(&registry, "http_requests_errors", &[]), 0.0);
    assert_eq!(histogram_count(&registry, "http_request_duration_seconds", &[("path", "/")]), 1);
    assert_eq!(histogram_sum(&registry, "http_response_size_bytes", &[("path", "/")]), 2.0);
}

#[tokio::test]
async fn status_route_counts_errors() {
    let (registry, app) = demo(ServerConfig::default());
    for uri in ["/status/201", "/status/404", "/status/503"] {
        app.clone().oneshot(get_req(uri)).await.unwrap();
    }

    assert_eq!(counter_sum(&registry, "http_requests", &[]), 3.0);
    assert_eq!(counter_sum(&registry, "http_requests_errors", &[]), 2.0);
    assert_eq!(counter_sum(&registry, "http_requests_errors", &[("status", "503")]), 1.0);
}

#[tokio::test]
async fn panicking_handler_yields_counted_500() {
    let (registry, app) = demo(ServerConfig::default());
    let resp = app.oneshot(get_req("/panic")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(counter_sum(&registry, "http_requests", &[("path", "/panic")]), 1.0);
    assert_eq!(counter_sum(&registry, "http_requests", &[("status", "500")]), 1.0);
    assert_eq!(counter_sum(&registry, "http_requests_errors", &[("status", "500")]), 1.0);
}

#[tokio::test]
async fn status_fault_keeps_its_status() {
    let (registry, app) = demo(ServerConfig::default());
    let resp = app.oneshot(get_req("/abort/418")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_string(resp).await, "aborted");

    assert_eq!(counter_sum(&registry, "http_requests", &[("status", "418")]), 1.0);
    assert_eq!(counter_sum(&registry, "http_requests_errors", &[("status", "418")]), 1.0);
}

#[tokio::test]
async fn request_size_is_observed() {
    let (registry, app) = demo(ServerConfig::default());
    let payload = vec![b'x'; 250];
    let req = Request::builder()
        .method("POST")
        .uri("/echo")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(histogram_sum(&registry, "http_request_size_bytes", &[("path", "/echo")]), 250.0);
    assert_eq!(histogram_sum(&registry, "http_response_size_bytes", &[("path", "/echo")]), 250.0);
    assert_eq!(counter_sum(&registry, "http_requests", &[("method", "POST")]), 1.0);
}

#[tokio::test]
async fn metrics_endpoint_is_not_self_observed() {
    let (registry, app) = demo(ServerConfig::default());
    for _ in 0..3 {
        let resp = app.clone().oneshot(get_req("/metrics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(ct.starts_with("text/plain; version=0.0.4"));
    }

    for name in ALL_METRICS {
        assert_eq!(histogram_count(&registry, name, &[]), 0, "{name}");
    }
    assert_eq!(counter_sum(&registry, "http_requests", &[]), 0.0);
}

#[tokio::test]
async fn metrics_endpoint_renders_observations() {
    let (_registry, app) = demo(ServerConfig::default());
    app.clone().oneshot(get_req("/healthz")).await.unwrap();

    let resp = app.oneshot(get_req("/metrics")).await.unwrap();
    let text = body_string(resp).await;
    assert!(text.contains("http_requests{method=\"GET\",path=\"/healthz\",status=\"200\"} 1"));
    assert!(!text.contains("path=\"/metrics\""));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_observed_exactly_once() {
    const N: usize = 128;
    let (registry, app) = demo(ServerConfig::default());

    let mut handles = Vec::with_capacity(N);
    for i in 0..N {
        let app = app.clone();
        let uri = if i % 2 == 0 { "/status/200" } else { "/status/500" };
        handles.push(tokio::spawn(async move {
            app.oneshot(get_req(uri)).await.unwrap().status()
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(counter_sum(&registry, "http_requests", &[]), N as f64);
    assert_eq!(counter_sum(&registry, "http_requests_errors", &[]), (N / 2) as f64);
    assert_eq!(histogram_count(&registry, "http_request_duration_seconds", &[]), N as u64);
}

#[tokio::test]
async fn tenant_header_becomes_a_label() {
    let cfg = config::load_from_str("version: 1\nmetrics:\n  tenant_header: \"x-tenant\"\n").unwrap();
    let (registry, app) = demo(cfg);

    let req = Request::builder()
        .uri("/")
        .header("x-tenant", "acme")
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(req).await.unwrap();
    app.oneshot(get_req("/")).await.unwrap();

    assert_eq!(counter_sum(&registry, "http_requests", &[("tenant", "acme")]), 1.0);
    assert_eq!(counter_sum(&registry, "http_requests", &[("tenant", "unknown")]), 1.0);
    assert_eq!(histogram_count(&registry, "http_request_size_bytes", &[("tenant", "acme")]), 1);
}

#[tokio::test]
async fn with_app_instruments_a_foreign_router() {
    let registry = Registry::new();
    let app: Router = Router::new().route("/ping", get(|| async { "pong" }));
    let (metrics, app) = PrometheusRegistry::with_app(registry.clone(), app, "scrape").unwrap();
    assert_eq!(metrics.endpoint_name(), "scrape");

    app.clone().oneshot(get_req("/ping")).await.unwrap();
    let resp = app.oneshot(get_req("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(counter_sum(&registry, "http_requests", &[("path", "/ping")]), 1.0);
}

#[tokio::test]
async fn init_app_twice_keeps_first_endpoint_name() {
    let metrics = Arc::new(PrometheusRegistry::new(Registry::new()).unwrap());
    let _a: Router = metrics.init_app(Router::new(), "first");
    let _b: Router = metrics.init_app(Router::new(), "second");
    assert_eq!(metrics.endpoint_name(), "first");
}
