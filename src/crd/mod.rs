//! Custom Resource Definitions for the Security Group Operator

mod condition;
mod security_group;

pub use condition::*;
pub use security_group::*;

use kube::CustomResourceExt;

use crate::error::Result;

/// Generate all CRD YAML manifests
pub fn generate_crds() -> Result<Vec<String>> {
    let crd = serde_yaml::to_string(&SecurityGroup::crd())
        .map_err(|e| crate::Error::config(format!("Failed to render CRD: {}", e)))?;
    Ok(vec![crd])
}
