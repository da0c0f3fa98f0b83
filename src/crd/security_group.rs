//! SecurityGroup Custom Resource Definition

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{conditions_equal, Condition};

/// SecurityGroup resource specification
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "paas.unicom.cn",
    version = "v1",
    kind = "SecurityGroup",
    plural = "securitygroups",
    singular = "securitygroup",
    shortname = "sg",
    namespaced,
    status = "SecurityGroupStatus",
    printcolumn = r#"{"name": "Id", "type": "string", "jsonPath": ".status.id"}"#,
    printcolumn = r#"{"name": "Ready", "type": "string", "jsonPath": ".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name": "Synced", "type": "string", "jsonPath": ".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupSpec {
    /// Tenant account the security group belongs to
    pub account_id: String,

    /// Tenant user acting on the security group
    pub user_id: String,

    /// Security group name
    pub name: String,

    /// Security group description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityGroupSpec {
    /// The fields the managed service is converged on
    pub fn desired(&self) -> SecurityGroupFields {
        SecurityGroupFields {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
        }
    }

    /// Tenant scope for calls against the management service
    pub fn tenant(&self) -> Tenant {
        Tenant {
            account_id: self.account_id.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

/// SecurityGroup status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupStatus {
    /// Status conditions, at most one per type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Identifier assigned by the management service (empty until created)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
}

impl SecurityGroupStatus {
    /// Same external id and the same condition set, ignoring order and
    /// transition times.
    pub fn equal(&self, other: &SecurityGroupStatus) -> bool {
        self.id == other.id && conditions_equal(&self.conditions, &other.conditions)
    }
}

/// The `{name, description}` projection compared during convergence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecurityGroupFields {
    pub name: String,
    pub description: String,
}

impl SecurityGroupFields {
    /// Field-by-field comparison of the converged projection
    pub fn matches(&self, other: &SecurityGroupFields) -> bool {
        self.name == other.name && self.description == other.description
    }
}

/// Account/user pair every management service call is scoped by
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tenant {
    pub account_id: String,
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(description: Option<&str>) -> SecurityGroupSpec {
        SecurityGroupSpec {
            account_id: "acct-1".to_string(),
            user_id: "user-1".to_string(),
            name: "web-sg".to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_desired_treats_missing_description_as_empty() {
        let desired = spec(None).desired();
        assert_eq!(desired.description, "");
        assert!(desired.matches(&SecurityGroupFields {
            name: "web-sg".to_string(),
            description: String::new(),
        }));
    }

    #[test]
    fn test_desired_detects_description_change() {
        let desired = spec(Some("allow 80/443/8080")).desired();
        let remote = SecurityGroupFields {
            name: "web-sg".to_string(),
            description: "allow 80/443".to_string(),
        };
        assert!(!desired.matches(&remote));
    }

    #[test]
    fn test_spec_wire_format() {
        let json = serde_json::to_value(spec(Some("allow 80/443"))).unwrap();
        assert_eq!(json["accountId"], "acct-1");
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["description"], "allow 80/443");

        let status = SecurityGroupStatus::default();
        assert_eq!(serde_json::to_value(&status).unwrap(), serde_json::json!({}));
    }
}
