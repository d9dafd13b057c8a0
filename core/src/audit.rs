//! Workplace audit views: `/v3/workplace` and `/v3/workplace/users`.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::{Payload, Query};
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, null_as_default, ApiResponse};
use crate::settings;
use crate::user::User;
use crate::validate::{ValidationErrors, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWorkplace {
    pub id: Option<String>,
    pub name: Option<String>,
    pub billing_email: Option<String>,
    pub saml_enabled: Option<bool>,
    pub scim_enabled: Option<bool>,
}

/// A member of the workplace and their access level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWorkplaceUser {
    pub id: Option<String>,
    pub access: Option<String>,
    pub user: Option<User>,
    /// When the user joined the workplace.
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditWorkplaceResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    pub workplace: Option<AuditWorkplace>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditWorkplaceUserResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    pub workplace_user: Option<AuditWorkplaceUser>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditWorkplaceUserListResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workplace_users: Vec<AuditWorkplaceUser>,
}

impl_response!(
    AuditWorkplaceResponse,
    AuditWorkplaceUserResponse,
    AuditWorkplaceUserListResponse,
);

/// `settings=true` asks for extra detail such as SAML and SCIM state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWorkplaceGetOptions {
    #[serde(skip)]
    pub settings: Option<bool>,
}

impl Payload for AuditWorkplaceGetOptions {
    fn query(&self, query: &mut Query) {
        query.push("settings", &self.settings);
    }
}

pub type AuditWorkplaceUserListOptions = AuditWorkplaceGetOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWorkplaceUserGetOptions {
    /// Sent as the last path segment.
    #[serde(skip)]
    pub user_id: String,
    #[serde(skip)]
    pub settings: Option<bool>,
}

impl Payload for AuditWorkplaceUserGetOptions {
    fn query(&self, query: &mut Query) {
        query.push("settings", &self.settings);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required("user_id", &self.user_id).finish()
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

    pub fn workplace_get(
        &self,
        ctx: &Context,
        opts: &AuditWorkplaceGetOptions,
    ) -> Result<(Option<AuditWorkplace>, ApiResponse)> {
        let resp: AuditWorkplaceResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/workplace", &self.key).payload(opts),
        )?;
        Ok((resp.workplace, resp.api))
    }

    pub fn workplace_user_get(
        &self,
        ctx: &Context,
        opts: &AuditWorkplaceUserGetOptions,
    ) -> Result<(Option<AuditWorkplaceUser>, ApiResponse)> {
        let resp: AuditWorkplaceUserResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/workplace/users", &self.key)
                .segment(&opts.user_id)
                .payload(opts),
        )?;
        Ok((resp.workplace_user, resp.api))
    }

    pub fn workplace_user_list(
        &self,
        ctx: &Context,
        opts: &AuditWorkplaceUserListOptions,
    ) -> Result<(Vec<AuditWorkplaceUser>, ApiResponse)> {
        let resp: AuditWorkplaceUserListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/workplace/users", &self.key).payload(opts),
        )?;
        Ok((resp.workplace_users, resp.api))
    }
}

pub fn workplace_get(
    ctx: &Context,
    opts: &AuditWorkplaceGetOptions,
) -> Result<(Option<AuditWorkplace>, ApiResponse)> {
    Client::default().workplace_get(ctx, opts)
}

pub fn workplace_user_get(
    ctx: &Context,
    opts: &AuditWorkplaceUserGetOptions,
) -> Result<(Option<AuditWorkplaceUser>, ApiResponse)> {
    Client::default().workplace_user_get(ctx, opts)
}

pub fn workplace_user_list(
    ctx: &Context,
    opts: &AuditWorkplaceUserListOptions,
) -> Result<(Vec<AuditWorkplaceUser>, ApiResponse)> {
    Client::default().workplace_user_list(ctx, opts)
}
