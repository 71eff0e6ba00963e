//! reqprom core: transport-agnostic pieces shared by the server crate.
//!
//! This crate defines the error surface and the histogram bucket tables. It
//! intentionally carries no HTTP or runtime dependencies so it can be reused
//! by other host integrations.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ReqPromError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod buckets;
pub mod error;

/// Shared result type.
pub use error::{ErrorCode, ReqPromError, Result};
