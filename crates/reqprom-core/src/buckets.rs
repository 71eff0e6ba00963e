//! Histogram bucket boundaries.
//!
//! Size histograms use four linear tiers (hundreds of bytes, kilobytes, tens
//! of kilobytes, around one megabyte) to get rough logarithmic coverage
//! without an exponential helper. Duration buckets are fixed seconds.

/// `count` integers starting at `start`, each `width` apart.
///
/// Mirrors the Go client's `LinearBuckets`, but on integers and without a
/// failure mode: `count == 0` yields an empty vector, and the sequence stops
/// early at the last bound that fits in a `u64`.
pub fn linear_buckets(start: u64, width: u64, count: usize) -> Vec<u64> {
    (0..count as u64)
        .map_while(|i| width.checked_mul(i).and_then(|off| start.checked_add(off)))
        .collect()
}

fn size_tiers() -> Vec<u64> {
    let mut out = Vec::with_capacity(20);
    out.extend(linear_buckets(100, 100, 5));
    out.extend(linear_buckets(1_000, 1_000, 5));
    out.extend(linear_buckets(10_000, 10_000, 5));
    out.extend(linear_buckets(1_000_000, 10_000, 5));
    out
}

/// Bucket upper bounds (bytes) for `http_response_size_bytes`.
pub fn response_size_buckets() -> Vec<u64> {
    size_tiers()
}

/// Bucket upper bounds (bytes) for `http_request_size_bytes`.
pub fn request_size_buckets() -> Vec<u64> {
    size_tiers()
}

/// Default upper bounds (seconds) for `http_request_duration_seconds`.
pub const DURATION_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Convert integer bounds into the float form histogram options expect.
pub fn as_f64(bounds: &[u64]) -> Vec<f64> {
    bounds.iter().map(|&b| b as f64).collect()
}

/// True when `bounds` is non-empty, finite and strictly increasing.
pub fn is_valid_bounds(bounds: &[f64]) -> bool {
    !bounds.is_empty()
        && bounds.iter().all(|b| b.is_finite())
        && bounds.windows(2).all(|w| w[0] < w[1])
}
