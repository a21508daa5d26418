//! HTTP API: server, routing, and the guarded-action layer.
//!
//! Every mutating handler follows the same sequence: resolve the caller's
//! organization context, run role/entitlement checks, and only then touch the
//! data store. A failed check denies the mutation unconditionally.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
