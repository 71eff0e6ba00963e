//! Server config loader (strict parsing).
//!
//! Beyond the listen address, the `metrics` section carries the label
//! checking mode, the duration bucket override and the tenant header; all of
//! it is validated here before the registry is built from it.

pub mod schema;

use std::fs;

use reqprom_core::error::{ReqPromError, Result};

pub use schema::{MetricsSection, ServerConfig, ServerSection};

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ReqPromError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| ReqPromError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
