//! Adapters for the DCS management service
//!
//! The reconciler only sees the [`SecurityGroupApi`] capability; transport,
//! authentication and response decoding live in the implementations.

mod dcs_client;

pub use dcs_client::*;

use async_trait::async_trait;

use crate::crd::{SecurityGroupFields, Tenant};
use crate::error::Result;

/// A security group as created by the management service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedSecurityGroup {
    /// Identifier assigned by the service
    pub id: String,
    /// Server message returned with the response
    pub message: String,
}

/// CRUD operations on security groups, scoped by tenant
///
/// Every non-success response or transport failure is reported as
/// [`crate::Error::Adapter`].
#[async_trait]
pub trait SecurityGroupApi: Send + Sync {
    /// Create a security group
    async fn create(&self, tenant: &Tenant, fields: &SecurityGroupFields) -> Result<CreatedSecurityGroup>;

    /// Look up a security group; `None` when the service reports it absent
    async fn read_by_id(&self, tenant: &Tenant, id: &str) -> Result<Option<SecurityGroupFields>>;

    /// Update a security group, returning the server message
    async fn update_by_id(&self, tenant: &Tenant, id: &str, fields: &SecurityGroupFields) -> Result<String>;

    /// Delete a security group, returning the server message
    async fn delete_by_id(&self, tenant: &Tenant, id: &str) -> Result<String>;
}
