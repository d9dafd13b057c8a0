//! Configs: `/v3/configs`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::{ListOptions, Payload, Query};
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, null_as_default, ApiResponse};
use crate::settings;

/// A config within an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub name: Option<String>,
    pub project: Option<String>,
    pub environment: Option<String>,
    /// Whether this is the root config of its environment.
    pub root: Option<bool>,
    pub locked: Option<bool>,
    pub initial_fetch_at: Option<String>,
    pub last_fetch_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    pub config: Option<Config>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigListResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub configs: Vec<Config>,
}

impl_response!(ConfigResponse, ConfigListResponse);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigGetOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub config: String,
}

impl Payload for ConfigGetOptions {
    fn query(&self, query: &mut Query) {
        query.push("project", &self.project).push("config", &self.config);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigListOptions {
    #[serde(skip)]
    pub list: ListOptions,
    #[serde(skip)]
    pub project: String,
}

impl Payload for ConfigListOptions {
    fn query(&self, query: &mut Query) {
        query.inline(&self.list).push("project", &self.project);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigCreateOptions {
    pub project: String,
    pub environment: String,
    pub name: String,
}

impl Payload for ConfigCreateOptions {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdateOptions {
    pub project: String,
    pub config: String,
    #[serde(rename = "name")]
    pub new_name: String,
}

impl Payload for ConfigUpdateOptions {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDeleteOptions {
    pub project: String,
    pub config: String,
}

impl Payload for ConfigDeleteOptions {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLockOptions {
    pub project: String,
    pub config: String,
}

impl Payload for ConfigLockOptions {}

pub type ConfigUnlockOptions = ConfigLockOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigCloneOptions {
    pub project: String,
    /// The config to clone.
    pub config: String,
    #[serde(rename = "name")]
    pub new_config: String,
}

impl Payload for ConfigCloneOptions {}

/// Client for the config endpoints.
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

    fn config_call<P: Payload>(
        &self,
        ctx: &Context,
        method: HttpMethod,
        path: &str,
        opts: &P,
    ) -> Result<(Option<Config>, ApiResponse)> {
        let resp: ConfigResponse = self
            .backend
            .call(ctx, Request::new(method, path, &self.key).payload(opts))?;
        Ok((resp.config, resp.api))
    }

    pub fn get(&self, ctx: &Context, opts: &ConfigGetOptions) -> Result<(Option<Config>, ApiResponse)> {
        self.config_call(ctx, HttpMethod::Get, "/v3/configs/config", opts)
    }

    pub fn list(&self, ctx: &Context, opts: &ConfigListOptions) -> Result<(Vec<Config>, ApiResponse)> {
        let resp: ConfigListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/configs", &self.key).payload(opts),
        )?;
        Ok((resp.configs, resp.api))
    }

    pub fn create(&self, ctx: &Context, opts: &ConfigCreateOptions) -> Result<(Option<Config>, ApiResponse)> {
        self.config_call(ctx, HttpMethod::Post, "/v3/configs", opts)
    }

    pub fn update(&self, ctx: &Context, opts: &ConfigUpdateOptions) -> Result<(Option<Config>, ApiResponse)> {
        self.config_call(ctx, HttpMethod::Post, "/v3/configs/config", opts)
    }

    pub fn delete(&self, ctx: &Context, opts: &ConfigDeleteOptions) -> Result<ApiResponse> {
        self.backend.call(
            ctx,
            Request::new(HttpMethod::Delete, "/v3/configs/config", &self.key).payload(opts),
        )
    }

    pub fn lock(&self, ctx: &Context, opts: &ConfigLockOptions) -> Result<(Option<Config>, ApiResponse)> {
        self.config_call(ctx, HttpMethod::Post, "/v3/configs/config/lock", opts)
    }

    pub fn unlock(&self, ctx: &Context, opts: &ConfigUnlockOptions) -> Result<(Option<Config>, ApiResponse)> {
        self.config_call(ctx, HttpMethod::Post, "/v3/configs/config/unlock", opts)
    }

    pub fn clone_config(
        &self,
        ctx: &Context,
        opts: &ConfigCloneOptions,
    ) -> Result<(Option<Config>, ApiResponse)> {
        self.config_call(ctx, HttpMethod::Post, "/v3/configs/config/clone", opts)
    }
}

pub fn get(ctx: &Context, opts: &ConfigGetOptions) -> Result<(Option<Config>, ApiResponse)> {
    Client::default().get(ctx, opts)
}

pub fn list(ctx: &Context, opts: &ConfigListOptions) -> Result<(Vec<Config>, ApiResponse)> {
    Client::default().list(ctx, opts)
}

pub fn create(ctx: &Context, opts: &ConfigCreateOptions) -> Result<(Option<Config>, ApiResponse)> {
    Client::default().create(ctx, opts)
}

pub fn update(ctx: &Context, opts: &ConfigUpdateOptions) -> Result<(Option<Config>, ApiResponse)> {
    Client::default().update(ctx, opts)
}

pub fn delete(ctx: &Context, opts: &ConfigDeleteOptions) -> Result<ApiResponse> {
    Client::default().delete(ctx, opts)
}

pub fn lock(ctx: &Context, opts: &ConfigLockOptions) -> Result<(Option<Config>, ApiResponse)> {
    Client::default().lock(ctx, opts)
}

pub fn unlock(ctx: &Context, opts: &ConfigUnlockOptions) -> Result<(Option<Config>, ApiResponse)> {
    Client::default().unlock(ctx, opts)
}

/// Clone a config within its environment. Named `clone_config` on
/// [`Client`] to stay clear of [`Clone::clone`].
pub fn clone(ctx: &Context, opts: &ConfigCloneOptions) -> Result<(Option<Config>, ApiResponse)> {
    Client::default().clone_config(ctx, opts)
}
