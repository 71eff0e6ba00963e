#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use reqprom::core::buckets::linear_buckets;
use reqprom::{PrometheusRegistry, METRICS_PATH};

#[test]
fn facade_reexports() {
    assert_eq!(linear_buckets(100, 100, 5), vec![100, 200, 300, 400, 500]);
    assert_eq!(METRICS_PATH, "/metrics");

    let metrics = PrometheusRegistry::new(Default::default()).unwrap();
    assert!(metrics.get("http_requests").is_ok());
}
