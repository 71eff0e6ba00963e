//! Axum glue: runs the lifecycle hooks around every request.
//!
//! The timing token lives in this function's frame for the duration of the
//! request, so no request-local storage is needed.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;

use crate::obs::{Fault, PrometheusRegistry, RequestInfo};

pub async fn track_request(
    State(registry): State<Arc<PrometheusRegistry>>,
    req: Request,
    next: Next,
) -> Response {
    let info = RequestInfo::from_http(&req);
    let timing = registry.on_request_start(&info);

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => registry.on_response_ready(&info, timing, response),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(method = %info.method, path = %info.path, %message, "handler panicked");
            registry.on_error(&info, timing, Fault::Unhandled(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
