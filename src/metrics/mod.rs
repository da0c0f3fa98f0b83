//! Prometheus metrics for the Security Group Operator
//!
//! Reconciliation counters, DCS API call outcomes and the HTTP endpoint
//! serving them.

mod prometheus;

pub use prometheus::*;
