//! HTTP client for the DCS security group API (v2)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CreatedSecurityGroup, SecurityGroupApi};
use crate::crd::{SecurityGroupFields, Tenant};
use crate::error::{Error, Result};
use crate::metrics;

/// Header carrying the tenant account
const ACCOUNT_HEADER: &str = "X-Account-ID";
/// Header carrying the tenant user
const USER_HEADER: &str = "X-User-ID";
/// Envelope code the service uses for success
const SUCCESS_CODE: i64 = 200;

/// Response envelope shared by every DCS endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CreateResult {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ListResult {
    list: Vec<RemoteSecurityGroup>,
}

#[derive(Debug, Deserialize)]
struct RemoteSecurityGroup {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Serialize)]
struct SecurityGroupRequest<'a> {
    name: &'a str,
    description: &'a str,
}

impl<'a> From<&'a SecurityGroupFields> for SecurityGroupRequest<'a> {
    fn from(fields: &'a SecurityGroupFields) -> Self {
        Self {
            name: &fields.name,
            description: &fields.description,
        }
    }
}

/// DCS management API client
#[derive(Clone, Debug)]
pub struct DcsClient {
    base_url: String,
    client: Client,
}

impl DcsClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/v2/security-groups", self.base_url)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/v2/security-groups/{}", self.base_url, id)
    }

    /// Send a tenant-scoped request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        tenant: &Tenant,
    ) -> Result<(String, Option<T>)> {
        let result = self.send_inner(operation, request, tenant).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::ADAPTER_CALLS
            .with_label_values(&[operation, outcome])
            .inc();
        result
    }

    async fn send_inner<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        tenant: &Tenant,
    ) -> Result<(String, Option<T>)> {
        let response = request
            .header(ACCOUNT_HEADER, &tenant.account_id)
            .header(USER_HEADER, &tenant.user_id)
            .send()
            .await
            .map_err(|e| Error::adapter(format!("failed to {} security group: {}", operation, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::adapter(format!("failed to {} security group: {}", operation, e)))?;

        debug!(operation, status = status.as_u16(), "DCS API response");

        if !status.is_success() {
            return Err(Error::adapter(format!(
                "failed to {} security group: HTTP {}: {}",
                operation, status, body
            )));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::adapter(format!(
                "failed to {} security group: invalid response: {}",
                operation, e
            ))
        })?;

        if envelope.code != SUCCESS_CODE {
            return Err(Error::adapter(format!(
                "failed to {} security group: {} (code {})",
                operation, envelope.message, envelope.code
            )));
        }

        Ok((envelope.message, envelope.result))
    }
}

#[async_trait]
impl SecurityGroupApi for DcsClient {
    async fn create(&self, tenant: &Tenant, fields: &SecurityGroupFields) -> Result<CreatedSecurityGroup> {
        let request = self
            .client
            .post(self.collection_url())
            .json(&SecurityGroupRequest::from(fields));

        let (message, result) = self.send::<CreateResult>("create", request, tenant).await?;
        let created = result
            .ok_or_else(|| Error::adapter("failed to create security group: response has no result"))?;

        Ok(CreatedSecurityGroup {
            id: created.id.to_string(),
            message,
        })
    }

    async fn read_by_id(&self, tenant: &Tenant, id: &str) -> Result<Option<SecurityGroupFields>> {
        let request = self
            .client
            .get(self.collection_url())
            .query(&[("searchById", id)]);

        let (_, result) = self.send::<ListResult>("get", request, tenant).await?;
        let found = result
            .ok_or_else(|| Error::adapter("failed to get security group: response has no result"))?;

        // No entry with the exact id means the group is gone
        Ok(found
            .list
            .into_iter()
            .find(|sg| sg.id.to_string() == id)
            .map(|sg| SecurityGroupFields {
                name: sg.name,
                description: sg.description,
            }))
    }

    async fn update_by_id(&self, tenant: &Tenant, id: &str, fields: &SecurityGroupFields) -> Result<String> {
        let request = self
            .client
            .put(self.item_url(id))
            .json(&SecurityGroupRequest::from(fields));

        let (message, _) = self.send::<serde_json::Value>("update", request, tenant).await?;
        Ok(message)
    }

    async fn delete_by_id(&self, tenant: &Tenant, id: &str) -> Result<String> {
        let request = self.client.delete(self.item_url(id));

        let (message, _) = self.send::<serde_json::Value>("delete", request, tenant).await?;
        Ok(message)
    }
}
