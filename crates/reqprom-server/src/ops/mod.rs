//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format (mounted by `PrometheusRegistry::init_app`)

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::obs::PrometheusRegistry;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn metrics_response(registry: &PrometheusRegistry) -> Response {
    match registry.render() {
        Ok((body, content_type)) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "metrics render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}
