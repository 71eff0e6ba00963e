//! Top-level facade crate for reqprom.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use reqprom_core::*;
}

pub mod server {
    pub use reqprom_server::*;
}

pub use reqprom_server::obs::{Fault, PrometheusRegistry, RequestInfo, METRICS_PATH};
