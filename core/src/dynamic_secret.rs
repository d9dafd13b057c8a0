//! Dynamic secret leases:
//! `/v3/configs/config/dynamic_secrets/dynamic_secret/leases`.
//!
//! A lease is issued for a fixed TTL and stays valid on the server until it
//! expires or is revoked.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::Payload;
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, ApiResponse};
use crate::settings;

/// An issued lease. Fields are absent when the server does not echo them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicSecretLease {
    pub slug: Option<String>,
    pub ttl_sec: Option<i64>,
    /// Provider-specific credentials.
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DynamicSecretLeaseResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(flatten)]
    pub lease: DynamicSecretLease,
}

impl_response!(DynamicSecretLeaseResponse);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSecretIssueLeaseOptions {
    pub project: String,
    pub config: String,
    /// Name of the dynamic secret.
    #[serde(rename = "dynamic_secret")]
    pub name: String,
    pub ttl_seconds: i32,
}

impl Payload for DynamicSecretIssueLeaseOptions {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSecretRevokeLeaseOptions {
    pub project: String,
    pub config: String,
    #[serde(rename = "dynamic_secret")]
    pub name: String,
    /// The lease to revoke.
    pub slug: String,
}

impl Payload for DynamicSecretRevokeLeaseOptions {}

#[derive(Debug, Clone)]
pub struct Client {
    pub backend: Backend,
    pub key: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Backend::default(), settings::key())
    }
}

impl Client {
    pub fn new(backend: Backend, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn issue_lease(
        &self,
        ctx: &Context,
        opts: &DynamicSecretIssueLeaseOptions,
    ) -> Result<(DynamicSecretLease, ApiResponse)> {
        let resp: DynamicSecretLeaseResponse = self.backend.call(
            ctx,
            Request::new(
                HttpMethod::Post,
                "/v3/configs/config/dynamic_secrets/dynamic_secret/leases",
                &self.key,
            )
            .payload(opts),
        )?;
        Ok((resp.lease, resp.api))
    }

    pub fn revoke_lease(&self, ctx: &Context, opts: &DynamicSecretRevokeLeaseOptions) -> Result<ApiResponse> {
        self.backend.call(
            ctx,
            Request::new(
                HttpMethod::Delete,
                "/v3/configs/config/dynamic_secrets/dynamic_secret/leases/lease",
                &self.key,
            )
            .payload(opts),
        )
    }
}

pub fn issue_lease(
    ctx: &Context,
    opts: &DynamicSecretIssueLeaseOptions,
) -> Result<(DynamicSecretLease, ApiResponse)> {
    Client::default().issue_lease(ctx, opts)
}

pub fn revoke_lease(ctx: &Context, opts: &DynamicSecretRevokeLeaseOptions) -> Result<ApiResponse> {
    Client::default().revoke_lease(ctx, opts)
}
