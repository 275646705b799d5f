//! HTTP API endpoints.
//!
//! - [`schedules`]: user-facing schedule CRUD, toggling, results paging,
//!   and manual runs (identity-verified).
//! - [`internal`]: the trigger service's execution entry point and the
//!   reconciliation pass (platform-invoked, not user-facing).
//! - [`health`]: liveness and readiness probes.

pub mod health;
pub mod internal;
pub mod schedules;
