//! Kubernetes controllers for the SecurityGroup CRD
//!
//! This module contains the controller that watches for SecurityGroup changes
//! and hands each changed record to the reconciler.

mod security_group_controller;

pub use security_group_controller::run as run_security_group_controller;

use crate::config::OperatorConfig;
use crate::reconcilers::security_group::Reconciler;

/// Shared context for all controllers
pub struct Context {
    /// SecurityGroup reconciler
    pub reconciler: Reconciler,
    /// Operator configuration
    pub config: OperatorConfig,
}

impl Context {
    /// Create a new context
    pub fn new(reconciler: Reconciler, config: OperatorConfig) -> Self {
        Self { reconciler, config }
    }
}
