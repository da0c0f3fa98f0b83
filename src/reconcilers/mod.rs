//! Reconcilers for the SecurityGroup CRD
//!
//! This module contains the business logic for reconciling SecurityGroup
//! resources against the DCS management service:
//! - Finalizer bookkeeping
//! - Create/update/delete decisions
//! - Status condition updates

pub mod finalizer;
pub mod security_group;

pub use security_group::{Reconciler, ReconcilerOptions, SpecChangingPolicy};
