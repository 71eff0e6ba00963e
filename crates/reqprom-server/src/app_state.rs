//! Shared application state for the reqprom server.
//!
//! Builds the metrics registry from config and installs the optional tenant
//! labeler before any traffic is served.

use std::collections::HashMap;
use std::sync::Arc;

use prometheus::Registry;
use reqprom_core::error::Result;

use crate::config::ServerConfig;
use crate::obs::{PrometheusRegistry, RequestInfo};

/// Label value used when the tenant header is missing or not UTF-8.
pub const UNKNOWN_TENANT: &str = "unknown";

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    metrics: Arc<PrometheusRegistry>,
}

impl AppState {
    /// Build application state on top of `registry`.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: ServerConfig, registry: Registry) -> Result<Self> {
        let metrics = Arc::new(PrometheusRegistry::with_options(
            registry,
            cfg.metrics.registry_options(),
        )?);

        if let Some(header) = cfg.metrics.tenant_header.clone() {
            tracing::info!(header = %header, "tenant labeling enabled");
            metrics.custom_route_labeler(
                move |req: &RequestInfo| {
                    let tenant = req
                        .headers
                        .get(header.as_str())
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or(UNKNOWN_TENANT);
                    HashMap::from([("tenant".to_string(), tenant.to_string())])
                },
                &["tenant"],
            )?;
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, metrics }),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<PrometheusRegistry> {
        Arc::clone(&self.inner.metrics)
    }
}
