//! HTTP request instrumentation backed by the `prometheus` crate.
//!
//! - `collectors`: the five instruments and their rebuild
//! - `labels`    : caller-supplied extra label dimensions
//! - `request`   : request/response shapes the hooks read
//! - `registry`  : lifecycle hooks + exposition

pub mod collectors;
pub mod labels;
pub mod registry;
pub mod request;

pub use collectors::{CollectorSet, Collectors, InstrumentKind, MetricInstrument};
pub use labels::{LabelStrategy, Labeler};
pub use registry::{
    Fault, PrometheusRegistry, RegistryOptions, RequestTiming, DEFAULT_ENDPOINT_NAME,
    METRICS_PATH,
};
pub use request::{ObservedResponse, RequestInfo, ResponseInfo};
