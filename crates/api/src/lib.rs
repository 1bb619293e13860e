//! HTTP host for GrantGate: identity extraction, per-request snapshots and
//! per-route policy enforcement on top of `axum`.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
