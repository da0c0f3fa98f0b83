//! Persistence of SecurityGroup records
//!
//! Writes carry the record's `resourceVersion`, so a write against a stale
//! copy is rejected with a conflict and the event is delivered again.

use std::fmt;

use async_trait::async_trait;
use kube::{
    api::PostParams,
    Api, Client, ResourceExt,
};

use crate::crd::SecurityGroup;
use crate::error::Result;

/// Namespace/name key of a SecurityGroup record
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an existing record
    pub fn of(sg: &SecurityGroup) -> Self {
        Self::new(
            sg.namespace().unwrap_or_else(|| "default".to_string()),
            sg.name_any(),
        )
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Read/write access to SecurityGroup records
#[async_trait]
pub trait SecurityGroupStore: Send + Sync {
    /// Fetch the current record, `None` if it no longer exists
    async fn get(&self, key: &ObjectKey) -> Result<Option<SecurityGroup>>;

    /// Replace metadata and spec (finalizers), returning the stored record
    async fn replace(&self, sg: &SecurityGroup) -> Result<SecurityGroup>;

    /// Replace the status subresource, returning the stored record
    async fn replace_status(&self, sg: &SecurityGroup) -> Result<SecurityGroup>;
}

/// Store backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<SecurityGroup> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SecurityGroupStore for KubeStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<SecurityGroup>> {
        Ok(self.api(&key.namespace).get_opt(&key.name).await?)
    }

    async fn replace(&self, sg: &SecurityGroup) -> Result<SecurityGroup> {
        let key = ObjectKey::of(sg);
        Ok(self
            .api(&key.namespace)
            .replace(&key.name, &PostParams::default(), sg)
            .await?)
    }

    async fn replace_status(&self, sg: &SecurityGroup) -> Result<SecurityGroup> {
        let key = ObjectKey::of(sg);
        let body = serde_json::to_vec(sg)?;
        Ok(self
            .api(&key.namespace)
            .replace_status(&key.name, &PostParams::default(), body)
            .await?)
    }
}
