//! Environments: `/v3/environments`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::{Payload, Query};
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, null_as_default, ApiResponse};
use crate::settings;
use crate::validate::{ValidationErrors, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub project: Option<String>,
    /// First secrets fetch from any config in the environment.
    pub initial_fetch_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnvironmentResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    pub environment: Option<Environment>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnvironmentListResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub environments: Vec<Environment>,
}

impl_response!(EnvironmentResponse, EnvironmentListResponse);

/// Identifies one environment; used by get and delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentGetOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub slug: String,
}

impl Payload for EnvironmentGetOptions {
    fn query(&self, query: &mut Query) {
        query.push("project", &self.project).push("environment", &self.slug);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("project", &self.project)
            .required("slug", &self.slug)
            .finish()
    }
}

pub type EnvironmentDeleteOptions = EnvironmentGetOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentListOptions {
    #[serde(skip)]
    pub project: String,
}

impl Payload for EnvironmentListOptions {
    fn query(&self, query: &mut Query) {
        query.push("project", &self.project);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required("project", &self.project).finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentCreateOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
}

impl Payload for EnvironmentCreateOptions {
    fn query(&self, query: &mut Query) {
        query.push("project", &self.project);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("project", &self.project)
            .required("name", &self.name)
            .required("slug", &self.slug)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRenameOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub slug: String,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(rename = "slug", default, skip_serializing_if = "Option::is_none")]
    pub new_slug: Option<String>,
}

impl Payload for EnvironmentRenameOptions {
    fn query(&self, query: &mut Query) {
        query.push("project", &self.project).push("environment", &self.slug);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("project", &self.project)
            .required("slug", &self.slug)
            .finish()
    }
}

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

    pub fn get(
        &self,
        ctx: &Context,
        opts: &EnvironmentGetOptions,
    ) -> Result<(Option<Environment>, ApiResponse)> {
        let resp: EnvironmentResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/environments/environment", &self.key).payload(opts),
        )?;
        Ok((resp.environment, resp.api))
    }

    pub fn list(
        &self,
        ctx: &Context,
        opts: &EnvironmentListOptions,
    ) -> Result<(Vec<Environment>, ApiResponse)> {
        let resp: EnvironmentListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/environments", &self.key).payload(opts),
        )?;
        Ok((resp.environments, resp.api))
    }

    pub fn create(
        &self,
        ctx: &Context,
        opts: &EnvironmentCreateOptions,
    ) -> Result<(Option<Environment>, ApiResponse)> {
        let resp: EnvironmentResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v3/environments", &self.key).payload(opts),
        )?;
        Ok((resp.environment, resp.api))
    }

    pub fn rename(
        &self,
        ctx: &Context,
        opts: &EnvironmentRenameOptions,
    ) -> Result<(Option<Environment>, ApiResponse)> {
        let resp: EnvironmentResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Put, "/v3/environments/environment", &self.key).payload(opts),
        )?;
        Ok((resp.environment, resp.api))
    }

    pub fn delete(&self, ctx: &Context, opts: &EnvironmentDeleteOptions) -> Result<ApiResponse> {
        self.backend.call(
            ctx,
            Request::new(HttpMethod::Delete, "/v3/environments/environment", &self.key).payload(opts),
        )
    }
}

pub fn get(ctx: &Context, opts: &EnvironmentGetOptions) -> Result<(Option<Environment>, ApiResponse)> {
    Client::default().get(ctx, opts)
}

pub fn list(ctx: &Context, opts: &EnvironmentListOptions) -> Result<(Vec<Environment>, ApiResponse)> {
    Client::default().list(ctx, opts)
}

pub fn create(ctx: &Context, opts: &EnvironmentCreateOptions) -> Result<(Option<Environment>, ApiResponse)> {
    Client::default().create(ctx, opts)
}

pub fn rename(ctx: &Context, opts: &EnvironmentRenameOptions) -> Result<(Option<Environment>, ApiResponse)> {
    Client::default().rename(ctx, opts)
}

pub fn delete(ctx: &Context, opts: &EnvironmentDeleteOptions) -> Result<ApiResponse> {
    Client::default().delete(ctx, opts)
}
