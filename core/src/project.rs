//! Projects: `/v3/projects`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::{ListOptions, Payload, Query};
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, null_as_default, ApiResponse};
use crate::settings;
use crate::validate::{ValidationErrors, Validator};

/// A Doppler project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Abbreviated name.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    pub project: Option<Project>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
}

impl_response!(ProjectResponse, ProjectListResponse);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectGetOptions {
    #[serde(skip)]
    pub name: String,
}

impl Payload for ProjectGetOptions {
    fn query(&self, query: &mut Query) {
        query.push("project", &self.name);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectListOptions {
    #[serde(skip)]
    pub list: ListOptions,
}

impl Payload for ProjectListOptions {
    fn query(&self, query: &mut Query) {
        query.inline(&self.list);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCreateOptions {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Payload for ProjectCreateOptions {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdateOptions {
    /// Current name of the project.
    #[serde(rename = "project")]
    pub name: String,
    #[serde(rename = "name", default, skip_serializing_if = "String::is_empty")]
    pub new_name: String,
    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub new_description: Option<String>,
}

impl Payload for ProjectUpdateOptions {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("name", &self.name)
            .required("new_name", &self.new_name)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeleteOptions {
    #[serde(rename = "project")]
    pub name: String,
}

impl Payload for ProjectDeleteOptions {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required("name", &self.name).finish()
    }
}

/// Client for the project endpoints.
#[derive(Debug, Clone)]
pub struct Client {
    pub backend: Backend,
    pub key: String,
}

impl Default for Client {
    /// A client on the default backend with the process-wide API key.
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

    pub fn get(&self, ctx: &Context, opts: &ProjectGetOptions) -> Result<(Option<Project>, ApiResponse)> {
        let resp: ProjectResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/projects/project", &self.key).payload(opts),
        )?;
        Ok((resp.project, resp.api))
    }

    pub fn list(&self, ctx: &Context, opts: &ProjectListOptions) -> Result<(Vec<Project>, ApiResponse)> {
        let resp: ProjectListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/projects", &self.key).payload(opts),
        )?;
        Ok((resp.projects, resp.api))
    }

    pub fn create(&self, ctx: &Context, opts: &ProjectCreateOptions) -> Result<(Option<Project>, ApiResponse)> {
        let resp: ProjectResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v3/projects", &self.key).payload(opts),
        )?;
        Ok((resp.project, resp.api))
    }

    pub fn update(&self, ctx: &Context, opts: &ProjectUpdateOptions) -> Result<(Option<Project>, ApiResponse)> {
        let resp: ProjectResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v3/projects/project", &self.key).payload(opts),
        )?;
        Ok((resp.project, resp.api))
    }

    pub fn delete(&self, ctx: &Context, opts: &ProjectDeleteOptions) -> Result<ApiResponse> {
        self.backend.call(
            ctx,
            Request::new(HttpMethod::Delete, "/v3/projects/project", &self.key).payload(opts),
        )
    }
}

/// [`Client::get`] on the default client.
pub fn get(ctx: &Context, opts: &ProjectGetOptions) -> Result<(Option<Project>, ApiResponse)> {
    Client::default().get(ctx, opts)
}

pub fn list(ctx: &Context, opts: &ProjectListOptions) -> Result<(Vec<Project>, ApiResponse)> {
    Client::default().list(ctx, opts)
}

pub fn create(ctx: &Context, opts: &ProjectCreateOptions) -> Result<(Option<Project>, ApiResponse)> {
    Client::default().create(ctx, opts)
}

pub fn update(ctx: &Context, opts: &ProjectUpdateOptions) -> Result<(Option<Project>, ApiResponse)> {
    Client::default().update(ctx, opts)
}

pub fn delete(ctx: &Context, opts: &ProjectDeleteOptions) -> Result<ApiResponse> {
    Client::default().delete(ctx, opts)
}
