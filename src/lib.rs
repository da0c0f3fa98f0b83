//! Security Group Kubernetes Operator
//!
//! This operator keeps security groups in the DCS management service in sync
//! with SecurityGroup custom resources.

pub mod adapters;
pub mod config;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod reconcilers;
pub mod store;

pub use error::{Error, Result};
