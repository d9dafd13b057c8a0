//! Service tokens: `/v3/configs/config/tokens`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::{Payload, Query};
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, null_as_default, ApiResponse};
use crate::settings;

/// A token granting access to a single config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceToken {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// The token itself. Only returned when the token is created.
    pub key: Option<String>,
    pub project: Option<String>,
    pub environment: Option<String>,
    pub config: Option<String>,
    /// `read` or `read/write`.
    pub access: Option<String>,
    pub expires_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceTokenResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    pub token: Option<ServiceToken>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceTokenListResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tokens: Vec<ServiceToken>,
}

impl_response!(ServiceTokenResponse, ServiceTokenListResponse);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTokenListOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub config: String,
}

impl Payload for ServiceTokenListOptions {
    fn query(&self, query: &mut Query) {
        query
            .push_nonzero("project", &self.project)
            .push_nonzero("config", &self.config);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTokenCreateOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl Payload for ServiceTokenCreateOptions {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTokenDeleteOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
}

impl Payload for ServiceTokenDeleteOptions {}

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

    pub fn list(
        &self,
        ctx: &Context,
        opts: &ServiceTokenListOptions,
    ) -> Result<(Vec<ServiceToken>, ApiResponse)> {
        let resp: ServiceTokenListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/configs/config/tokens", &self.key).payload(opts),
        )?;
        Ok((resp.tokens, resp.api))
    }

    pub fn create(
        &self,
        ctx: &Context,
        opts: &ServiceTokenCreateOptions,
    ) -> Result<(Option<ServiceToken>, ApiResponse)> {
        let resp: ServiceTokenResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v3/configs/config/tokens", &self.key).payload(opts),
        )?;
        Ok((resp.token, resp.api))
    }

    pub fn delete(&self, ctx: &Context, opts: &ServiceTokenDeleteOptions) -> Result<ApiResponse> {
        self.backend.call(
            ctx,
            Request::new(HttpMethod::Delete, "/v3/configs/config/tokens/token", &self.key).payload(opts),
        )
    }
}

pub fn list(ctx: &Context, opts: &ServiceTokenListOptions) -> Result<(Vec<ServiceToken>, ApiResponse)> {
    Client::default().list(ctx, opts)
}

pub fn create(ctx: &Context, opts: &ServiceTokenCreateOptions) -> Result<(Option<ServiceToken>, ApiResponse)> {
    Client::default().create(ctx, opts)
}

pub fn delete(ctx: &Context, opts: &ServiceTokenDeleteOptions) -> Result<ApiResponse> {
    Client::default().delete(ctx, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::query_of;

    #[test]
    fn list_omits_empty_query_values() {
        let opts = ServiceTokenListOptions {
            project: "backend".to_string(),
            config: String::new(),
        };
        assert_eq!(query_of(Some(&opts)).encode(), "project=backend");
    }

    #[test]
    fn create_body_omits_unset_fields() {
        let opts = ServiceTokenCreateOptions {
            project: "backend".to_string(),
            config: "prd".to_string(),
            name: "deploy".to_string(),
            access: Some("read".to_string()),
            expires_at: None,
        };
        let body: serde_json::Value = serde_json::from_slice(&opts.body().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "project": "backend", "config": "prd", "name": "deploy", "access": "read" })
        );
    }

    #[test]
    fn delete_sends_slug_in_body() {
        let opts = ServiceTokenDeleteOptions {
            project: "backend".to_string(),
            config: "prd".to_string(),
            slug: "tok_123".to_string(),
        };
        assert!(query_of(Some(&opts)).is_empty());
        let body: serde_json::Value = serde_json::from_slice(&opts.body().unwrap()).unwrap();
        assert_eq!(body["slug"], "tok_123");
    }
}
