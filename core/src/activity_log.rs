//! Workplace activity logs: `/v3/logs`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::{ListOptions, Payload, Query};
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, null_as_default, ApiResponse};
use crate::settings;
use crate::user::User;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
    /// Who triggered the event.
    pub user: Option<User>,
    pub project: Option<String>,
    pub environment: Option<String>,
    pub config: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityLogResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(rename = "log")]
    pub activity_log: Option<ActivityLog>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityLogListResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<ActivityLog>,
}

impl_response!(ActivityLogResponse, ActivityLogListResponse);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogGetOptions {
    /// Sent as `log`.
    #[serde(skip)]
    pub id: String,
}

impl Payload for ActivityLogGetOptions {
    fn query(&self, query: &mut Query) {
        query.push("log", &self.id);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogListOptions {
    #[serde(skip)]
    pub list: ListOptions,
}

impl Payload for ActivityLogListOptions {
    fn query(&self, query: &mut Query) {
        query.inline(&self.list);
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
        opts: &ActivityLogGetOptions,
    ) -> Result<(Option<ActivityLog>, ApiResponse)> {
        let resp: ActivityLogResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/logs/log", &self.key).payload(opts),
        )?;
        Ok((resp.activity_log, resp.api))
    }

    pub fn list(
        &self,
        ctx: &Context,
        opts: &ActivityLogListOptions,
    ) -> Result<(Vec<ActivityLog>, ApiResponse)> {
        let resp: ActivityLogListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/logs", &self.key).payload(opts),
        )?;
        Ok((resp.logs, resp.api))
    }
}

pub fn get(ctx: &Context, opts: &ActivityLogGetOptions) -> Result<(Option<ActivityLog>, ApiResponse)> {
    Client::default().get(ctx, opts)
}

pub fn list(ctx: &Context, opts: &ActivityLogListOptions) -> Result<(Vec<ActivityLog>, ApiResponse)> {
    Client::default().list(ctx, opts)
}
