//! reqprom server library entry.
//!
//! This crate binds the request metrics hooks to axum: the `obs` layer owns
//! the instruments and hooks, `middleware` runs them around each request, and
//! `router` wires the demo host used by the binary and integration tests.

pub mod app_state;
pub mod config;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod router;
