//! Token revocation: `/v3/auth/revoke`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::Payload;
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::ApiResponse;
use crate::settings;
use crate::validate::{ValidationErrors, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRevokeOptions {
    pub tokens: Vec<AuthToken>,
}

impl Payload for AuthRevokeOptions {
    /// The endpoint takes the bare token array, not an object.
    fn body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.tokens)
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .greater_than_zero("tokens", self.tokens.len())
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

    pub fn revoke(&self, ctx: &Context, opts: &AuthRevokeOptions) -> Result<ApiResponse> {
        self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v3/auth/revoke", &self.key).payload(opts),
        )
    }
}

pub fn revoke(ctx: &Context, opts: &AuthRevokeOptions) -> Result<ApiResponse> {
    Client::default().revoke(ctx, opts)
}
