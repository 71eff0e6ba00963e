//! Shared error type across reqprom crates.

use thiserror::Error;

/// Stable error codes (used by tests and log fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Lookup of a metric name that is not in the collector set.
    UnknownMetric,
    /// Labeler returned keys that differ from its declared names.
    LabelMismatch,
    /// Instrument construction, registration or labeling failed.
    Metric,
    /// Invalid input / malformed config.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnknownMetric => "UNKNOWN_METRIC",
            ErrorCode::LabelMismatch => "LABEL_MISMATCH",
            ErrorCode::Metric => "METRIC",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ReqPromError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum ReqPromError {
    #[error("no collector with name \"{0}\" found")]
    UnknownMetric(String),
    #[error("label mismatch: declared {declared:?}, got {got:?}")]
    LabelMismatch {
        declared: Vec<String>,
        got: Vec<String>,
    },
    #[error("metric: {0}")]
    Metric(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ReqPromError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ReqPromError::UnknownMetric(_) => ErrorCode::UnknownMetric,
            ReqPromError::LabelMismatch { .. } => ErrorCode::LabelMismatch,
            ReqPromError::Metric(_) => ErrorCode::Metric,
            ReqPromError::BadRequest(_) => ErrorCode::BadRequest,
            ReqPromError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            ReqPromError::Internal(_) => ErrorCode::Internal,
        }
    }
}
