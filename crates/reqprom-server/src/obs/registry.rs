//! Request lifecycle hooks over the collector set.
//!
//! Per request: `on_request_start` hands back a [`RequestTiming`] token, the
//! host carries it alongside the request, and exactly one of
//! `on_response_ready` / `on_error` consumes it. Requests for the exposition
//! path are ignored by every hook.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, Router};
use prometheus::{Encoder, Registry, TextEncoder};
use thiserror::Error;

use reqprom_core::buckets::DURATION_BUCKETS;
use reqprom_core::error::{ReqPromError, Result};

use super::collectors::{
    CollectorSet, LabelValues, MetricInstrument, HTTP_REQUESTS, HTTP_REQUESTS_ERRORS,
    HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUEST_SIZE_BYTES, HTTP_RESPONSE_SIZE_BYTES,
};
use super::labels::{LabelStrategy, Labeler};
use super::request::{ObservedResponse, RequestInfo};

/// Path the exposition endpoint is mounted at.
pub const METRICS_PATH: &str = "/metrics";
/// Endpoint name used when none is given.
pub const DEFAULT_ENDPOINT_NAME: &str = "root";

fn status_is_error(status: u16) -> bool {
    status >= 400
}

fn is_metrics_path(path: &str) -> bool {
    path == METRICS_PATH
}

/// Start of one in-flight request. Not `Clone`: it is consumed once.
#[derive(Debug)]
pub struct RequestTiming {
    start: Instant,
}

impl RequestTiming {
    fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// A request that ended in a fault instead of a response.
#[derive(Debug, Error)]
pub enum Fault {
    /// Structured HTTP error carrying its own status.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },
    /// Anything else; answered with an empty 500.
    #[error("unhandled fault: {0}")]
    Unhandled(String),
}

impl Fault {
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Fault::Status {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        match self {
            Fault::Status { status, message } => (status, message).into_response(),
            Fault::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Construction options.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Check labeler output against the declared names on every request.
    pub strict_labels: bool,
    /// Upper bounds (seconds) of the duration histogram.
    pub duration_buckets: Vec<f64>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            strict_labels: true,
            duration_buckets: DURATION_BUCKETS.to_vec(),
        }
    }
}

/// HTTP request/response metrics for one host application.
pub struct PrometheusRegistry {
    collectors: CollectorSet,
    strategy: RwLock<Arc<LabelStrategy>>,
    strict_labels: bool,
    endpoint_name: OnceLock<String>,
}

impl PrometheusRegistry {
    /// Build with default options; instruments are registered immediately.
    pub fn new(registry: Registry) -> Result<Self> {
        Self::with_options(registry, RegistryOptions::default())
    }

    pub fn with_options(registry: Registry, opts: RegistryOptions) -> Result<Self> {
        let collectors = CollectorSet::new(registry, opts.duration_buckets, &[])?;
        Ok(Self {
            collectors,
            strategy: RwLock::new(Arc::new(LabelStrategy::none())),
            strict_labels: opts.strict_labels,
            endpoint_name: OnceLock::new(),
        })
    }

    /// Build and attach to `app` in one step.
    pub fn with_app<S>(
        registry: Registry,
        app: Router<S>,
        endpoint_name: &str,
    ) -> Result<(Arc<Self>, Router<S>)>
    where
        S: Clone + Send + Sync + 'static,
    {
        let this = Arc::new(Self::new(registry)?);
        let app = this.init_app(app, endpoint_name);
        Ok((this, app))
    }

    /// Mount `GET /metrics` and wrap every route registered so far in the
    /// lifecycle middleware. Routes added afterwards are not instrumented.
    pub fn init_app<S>(self: &Arc<Self>, app: Router<S>, endpoint_name: &str) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        if self.endpoint_name.set(endpoint_name.to_string()).is_err() {
            tracing::warn!(
                endpoint = endpoint_name,
                existing = self.endpoint_name(),
                "registry already attached to an app; keeping the first endpoint name"
            );
        }
        tracing::info!(endpoint = endpoint_name, path = METRICS_PATH, "metrics endpoint registered");

        let exposition = Arc::clone(self);
        app.route(
            METRICS_PATH,
            get(move || {
                let registry = Arc::clone(&exposition);
                async move { crate::ops::metrics_response(&registry) }
            }),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(self),
            crate::middleware::track_request,
        ))
    }

    /// Name the exposition endpoint was registered under.
    pub fn endpoint_name(&self) -> &str {
        self.endpoint_name
            .get()
            .map(String::as_str)
            .unwrap_or(DEFAULT_ENDPOINT_NAME)
    }

    /// Install a labeler and rebuild every instrument with its label names.
    ///
    /// Meant to run once at startup: all accumulated values are reset.
    pub fn custom_route_labeler<F>(&self, labeler: F, declared: &[&str]) -> Result<()>
    where
        F: Fn(&RequestInfo) -> HashMap<String, String> + Send + Sync + 'static,
    {
        let labeler: Labeler = Arc::new(labeler);
        let declared: Vec<String> = declared.iter().map(|s| s.to_string()).collect();
        let strategy = LabelStrategy::new(labeler, declared)?;
        self.set_strategy(strategy)
    }

    /// Replace the label strategy, then rebuild the collector set.
    pub fn set_strategy(&self, strategy: LabelStrategy) -> Result<()> {
        let mut slot = match self.strategy.write() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        };
        self.collectors.rebuild(strategy.declared_names())?;
        tracing::info!(labels = ?strategy.declared_names(), "label strategy replaced");
        *slot = Arc::new(strategy);
        Ok(())
    }

    fn strategy(&self) -> Arc<LabelStrategy> {
        match self.strategy.read() {
            Ok(g) => Arc::clone(&g),
            Err(p) => Arc::clone(&p.into_inner()),
        }
    }

    /// Extra labels for `req` under the current strategy.
    pub fn labels_for(&self, req: &RequestInfo) -> Result<HashMap<String, String>> {
        self.strategy().labels_for(req, self.strict_labels)
    }

    /// Instrument by metric name.
    pub fn get(&self, name: &str) -> Result<MetricInstrument> {
        self.collectors.get(name).inspect_err(|e| {
            tracing::error!(error = %e, "collector lookup failed");
        })
    }

    pub fn collectors(&self) -> &CollectorSet {
        &self.collectors
    }

    /// Before-request hook.
    pub fn on_request_start(&self, req: &RequestInfo) -> Option<RequestTiming> {
        if is_metrics_path(&req.path) {
            return None;
        }
        let timing = RequestTiming::start();
        if let Err(e) = self.record_request(req) {
            tracing::warn!(path = %req.path, error = %e, code = e.code().as_str(), "request size not recorded");
        }
        Some(timing)
    }

    /// After-response hook. Always returns `response` untouched.
    pub fn on_response_ready<R: ObservedResponse>(
        &self,
        req: &RequestInfo,
        timing: Option<RequestTiming>,
        response: R,
    ) -> R {
        if is_metrics_path(&req.path) {
            return response;
        }
        let Some(timing) = timing else {
            tracing::warn!(path = %req.path, "no start time found for request; skipping");
            return response;
        };
        if let Err(e) = self.record_response(req, timing.elapsed(), &response) {
            tracing::warn!(path = %req.path, error = %e, code = e.code().as_str(), "response not recorded");
        }
        response
    }

    /// Error hook: answer the fault and account for it like any response.
    pub fn on_error(
        &self,
        req: &RequestInfo,
        timing: Option<RequestTiming>,
        fault: Fault,
    ) -> Response {
        self.on_response_ready(req, timing, fault.into_response())
    }

    fn record_request(&self, req: &RequestInfo) -> Result<()> {
        let extra = self.labels_for(req)?;
        let mut labels = as_label_values(&extra);
        labels.insert("path", &req.path);

        let set = self.collectors.snapshot();
        set.get(HTTP_REQUEST_SIZE_BYTES)?
            .observe(&labels, req.content_length.unwrap_or(0) as f64)
    }

    fn record_response<R: ObservedResponse>(
        &self,
        req: &RequestInfo,
        elapsed: Duration,
        response: &R,
    ) -> Result<()> {
        let code = response.status_code();
        let status = code.to_string();
        let extra = self.labels_for(req)?;
        let mut labels = as_label_values(&extra);
        labels.insert("path", &req.path);

        let set = self.collectors.snapshot();
        set.get(HTTP_REQUEST_DURATION_SECONDS)?
            .observe(&labels, elapsed.as_secs_f64())?;
        set.get(HTTP_RESPONSE_SIZE_BYTES)?
            .observe(&labels, response.content_length().unwrap_or(0) as f64)?;

        labels.insert("method", &req.method);
        labels.insert("status", &status);

        set.get(HTTP_REQUESTS)?.inc(&labels)?;
        if status_is_error(code) {
            set.get(HTTP_REQUESTS_ERRORS)?.inc(&labels)?;
        }
        Ok(())
    }

    /// Encode everything in the registry in the text exposition format.
    pub fn render(&self) -> Result<(Vec<u8>, String)> {
        let encoder = TextEncoder::new();
        let families = self.collectors.registry().gather();
        let mut body = Vec::new();
        encoder
            .encode(&families, &mut body)
            .map_err(|e| ReqPromError::Internal(format!("encode metrics failed: {e}")))?;
        Ok((body, encoder.format_type().to_string()))
    }
}

fn as_label_values(extra: &HashMap<String, String>) -> LabelValues<'_> {
    extra
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}
