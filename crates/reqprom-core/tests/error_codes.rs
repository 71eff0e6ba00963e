//! Error code mapping tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use reqprom_core::{ErrorCode, ReqPromError};

#[test]
fn codes_are_stable() {
    let cases = [
        (ReqPromError::UnknownMetric("x".into()), "UNKNOWN_METRIC"),
        (
            ReqPromError::LabelMismatch { declared: vec!["tenant".into()], got: vec![] },
            "LABEL_MISMATCH",
        ),
        (ReqPromError::Metric("dup".into()), "METRIC"),
        (ReqPromError::BadRequest("yaml".into()), "BAD_REQUEST"),
        (ReqPromError::UnsupportedVersion, "UNSUPPORTED_VERSION"),
        (ReqPromError::Internal("io".into()), "INTERNAL"),
    ];
    for (err, code) in cases {
        assert_eq!(err.code().as_str(), code);
    }
}

#[test]
fn unknown_metric_message_names_the_metric() {
    let err = ReqPromError::UnknownMetric("does_not_exist".into());
    assert_eq!(err.code(), ErrorCode::UnknownMetric);
    assert!(err.to_string().contains("does_not_exist"));
}
