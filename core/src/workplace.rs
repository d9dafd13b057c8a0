//! The workplace the API key belongs to: `/v3/workplace`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::Payload;
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, ApiResponse};
use crate::settings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workplace {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Where Doppler sends invoices.
    pub billing_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkplaceResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    pub workplace: Option<Workplace>,
}

impl_response!(WorkplaceResponse);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkplaceUpdateOptions {
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(rename = "billing_email", default, skip_serializing_if = "Option::is_none")]
    pub new_billing_email: Option<String>,
}

impl Payload for WorkplaceUpdateOptions {}

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

    pub fn get(&self, ctx: &Context) -> Result<(Option<Workplace>, ApiResponse)> {
        let resp: WorkplaceResponse = self
            .backend
            .call(ctx, Request::new(HttpMethod::Get, "/v3/workplace", &self.key))?;
        Ok((resp.workplace, resp.api))
    }

    pub fn update(
        &self,
        ctx: &Context,
        opts: &WorkplaceUpdateOptions,
    ) -> Result<(Option<Workplace>, ApiResponse)> {
        let resp: WorkplaceResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v3/workplace", &self.key).payload(opts),
        )?;
        Ok((resp.workplace, resp.api))
    }
}

pub fn get(ctx: &Context) -> Result<(Option<Workplace>, ApiResponse)> {
    Client::default().get(ctx)
}

pub fn update(ctx: &Context, opts: &WorkplaceUpdateOptions) -> Result<(Option<Workplace>, ApiResponse)> {
    Client::default().update(ctx, opts)
}
