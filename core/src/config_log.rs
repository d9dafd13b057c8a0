//! Config logs: `/v3/configs/config/logs`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::{ListOptions, Payload, Query};
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, null_as_default, ApiResponse};
use crate::settings;
use crate::user::User;

/// One secret changed by a config log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLogDiff {
    pub name: Option<String>,
    pub added: Option<String>,
}

/// A recorded change to a config's secrets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLog {
    pub id: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub diff: Vec<ConfigLogDiff>,
    pub rollback: Option<bool>,
    pub user: Option<User>,
    pub project: Option<String>,
    pub environment: Option<String>,
    pub config: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigLogResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    pub config_log: Option<ConfigLog>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigLogListResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<ConfigLog>,
}

impl_response!(ConfigLogResponse, ConfigLogListResponse);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLogGetOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub config: String,
    /// Log id, sent as `log`.
    #[serde(skip)]
    pub id: String,
}

impl Payload for ConfigLogGetOptions {
    fn query(&self, query: &mut Query) {
        query
            .push("project", &self.project)
            .push("config", &self.config)
            .push("log", &self.id);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLogListOptions {
    #[serde(skip)]
    pub list: ListOptions,
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub config: String,
}

impl Payload for ConfigLogListOptions {
    fn query(&self, query: &mut Query) {
        query
            .inline(&self.list)
            .push("project", &self.project)
            .push("config", &self.config);
    }
}

/// Same query surface as a get; the rollback is a POST.
pub type ConfigLogRollbackOptions = ConfigLogGetOptions;

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
        opts: &ConfigLogGetOptions,
    ) -> Result<(Option<ConfigLog>, ApiResponse)> {
        let resp: ConfigLogResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/configs/config/logs/log", &self.key).payload(opts),
        )?;
        Ok((resp.config_log, resp.api))
    }

    pub fn list(&self, ctx: &Context, opts: &ConfigLogListOptions) -> Result<(Vec<ConfigLog>, ApiResponse)> {
        let resp: ConfigLogListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/configs/config/logs", &self.key).payload(opts),
        )?;
        Ok((resp.logs, resp.api))
    }

    /// Restore the config's secrets to the state before the given log entry.
    pub fn rollback(
        &self,
        ctx: &Context,
        opts: &ConfigLogRollbackOptions,
    ) -> Result<(Option<ConfigLog>, ApiResponse)> {
        let resp: ConfigLogResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v3/configs/config/logs/log/rollback", &self.key)
                .payload(opts),
        )?;
        Ok((resp.config_log, resp.api))
    }
}

pub fn get(ctx: &Context, opts: &ConfigLogGetOptions) -> Result<(Option<ConfigLog>, ApiResponse)> {
    Client::default().get(ctx, opts)
}

pub fn list(ctx: &Context, opts: &ConfigLogListOptions) -> Result<(Vec<ConfigLog>, ApiResponse)> {
    Client::default().list(ctx, opts)
}

pub fn rollback(ctx: &Context, opts: &ConfigLogRollbackOptions) -> Result<(Option<ConfigLog>, ApiResponse)> {
    Client::default().rollback(ctx, opts)
}
