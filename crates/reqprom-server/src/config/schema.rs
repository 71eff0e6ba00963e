use std::net::SocketAddr;

use serde::Deserialize;
use reqprom_core::buckets::{is_valid_bounds, DURATION_BUCKETS};
use reqprom_core::error::{ReqPromError, Result};

use crate::obs::{RegistryOptions, DEFAULT_ENDPOINT_NAME};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ReqPromError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            ReqPromError::BadRequest(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_endpoint_name")]
    pub endpoint_name: String,

    #[serde(default = "default_strict_labels")]
    pub strict_labels: bool,

    /// Seconds; defaults to the fixed duration table.
    #[serde(default)]
    pub duration_buckets: Option<Vec<f64>>,

    /// When set, requests are labeled `tenant=<header value>`.
    #[serde(default)]
    pub tenant_header: Option<String>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            endpoint_name: default_endpoint_name(),
            strict_labels: default_strict_labels(),
            duration_buckets: None,
            tenant_header: None,
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if self.endpoint_name.trim().is_empty() {
            return Err(ReqPromError::BadRequest(
                "metrics.endpoint_name must not be empty".into(),
            ));
        }
        if let Some(b) = &self.duration_buckets {
            if !is_valid_bounds(b) {
                return Err(ReqPromError::BadRequest(
                    "metrics.duration_buckets must be non-empty, finite and strictly increasing"
                        .into(),
                ));
            }
        }
        if let Some(h) = &self.tenant_header {
            if axum::http::HeaderName::from_bytes(h.as_bytes()).is_err() {
                return Err(ReqPromError::BadRequest(format!(
                    "metrics.tenant_header is not a valid header name: {h}"
                )));
            }
        }
        Ok(())
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            strict_labels: self.strict_labels,
            duration_buckets: self
                .duration_buckets
                .clone()
                .unwrap_or_else(|| DURATION_BUCKETS.to_vec()),
        }
    }
}

fn default_endpoint_name() -> String {
    DEFAULT_ENDPOINT_NAME.into()
}
fn default_strict_labels() -> bool {
    true
}
