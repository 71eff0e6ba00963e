//! Axum router wiring.
//!
//! Demo routes plus `/metrics`; everything registered here is instrumented.

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use bytes::Bytes;

use crate::{app_state::AppState, obs::Fault, ops};

pub fn build_router(state: AppState) -> Router {
    let app = Router::new()
        .route("/", get(index))
        .route("/healthz", get(ops::healthz))
        .route("/echo", post(echo))
        .route("/status/:code", get(status))
        .route("/abort/:code", get(abort))
        .route("/panic", get(fail));

    state
        .metrics()
        .init_app(app, &state.cfg().metrics.endpoint_name)
}

async fn index() -> &'static str {
    "hi"
}

async fn echo(body: Bytes) -> Bytes {
    body
}

fn parse_status(code: u16) -> Result<StatusCode, Fault> {
    StatusCode::from_u16(code)
        .map_err(|_| Fault::status(StatusCode::BAD_REQUEST, format!("invalid status code: {code}")))
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), Fault> {
    let status = parse_status(code)?;
    Ok((status, format!("status {code}")))
}

async fn abort(Path(code): Path<u16>) -> Fault {
    match parse_status(code) {
        Ok(status) => Fault::status(status, "aborted"),
        Err(fault) => fault,
    }
}

async fn fail() -> &'static str {
    panic!("handler failure requested")
}
