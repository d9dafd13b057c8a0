//! Secrets: `/v3/configs/config/secret(s)`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::{Payload, Query, Scalar};
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, null_as_default, ApiResponse};
use crate::settings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretValue {
    pub raw: Option<String>,
    /// The value after references to other secrets are resolved.
    pub computed: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub name: Option<String>,
    pub value: Option<SecretValue>,
}

/// The secret's fields sit at the top level of the response object.
#[derive(Debug, Default, Deserialize)]
pub struct SecretResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(flatten)]
    pub secret: Secret,
}

#[derive(Debug, Default, Deserialize)]
pub struct SecretListResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secrets: BTreeMap<String, SecretValue>,
}

impl_response!(SecretResponse, SecretListResponse);

/// File formats accepted by the download endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadFormat {
    Json,
    Env,
    Yaml,
    Docker,
    EnvNoQuotes,
    DotnetJson,
}

impl DownloadFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadFormat::Json => "json",
            DownloadFormat::Env => "env",
            DownloadFormat::Yaml => "yaml",
            DownloadFormat::Docker => "docker",
            DownloadFormat::EnvNoQuotes => "env-no-quotes",
            DownloadFormat::DotnetJson => "dotnet-json",
        }
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Scalar for DownloadFormat {
    fn to_scalar(&self) -> Option<String> {
        Some(self.as_str().to_string())
    }

    fn is_zero(&self) -> bool {
        false
    }
}

/// Case conversions the API can apply to secret names on download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameTransformer {
    Camel,
    UpperCamel,
    LowerSnake,
    TfVar,
    Dotnet,
    DotnetEnv,
    LowerKebab,
}

impl NameTransformer {
    pub fn as_str(self) -> &'static str {
        match self {
            NameTransformer::Camel => "camel",
            NameTransformer::UpperCamel => "upper-camel",
            NameTransformer::LowerSnake => "lower-snake",
            NameTransformer::TfVar => "tf-var",
            NameTransformer::Dotnet => "dotnet",
            NameTransformer::DotnetEnv => "dotnet-env",
            NameTransformer::LowerKebab => "lower-kebab",
        }
    }
}

impl fmt::Display for NameTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Scalar for NameTransformer {
    fn to_scalar(&self) -> Option<String> {
        Some(self.as_str().to_string())
    }

    fn is_zero(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretGetOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub config: String,
    #[serde(skip)]
    pub name: String,
}

impl Payload for SecretGetOptions {
    fn query(&self, query: &mut Query) {
        query
            .push("project", &self.project)
            .push("config", &self.config)
            .push("name", &self.name);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretListOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub config: String,
    #[serde(skip)]
    pub include_dynamic: Option<bool>,
    /// Lease lifetime for dynamic secrets; needs `include_dynamic`.
    #[serde(skip)]
    pub dynamic_ttl_seconds: Option<i32>,
    /// Comma-separated secret names to include.
    #[serde(skip)]
    pub secrets: Option<String>,
}

impl Payload for SecretListOptions {
    fn query(&self, query: &mut Query) {
        query
            .push("project", &self.project)
            .push("config", &self.config)
            .push("include_dynamic_secrets", &self.include_dynamic)
            .push("dynamic_secrets_ttl_sec", &self.dynamic_ttl_seconds)
            .push("secrets", &self.secrets);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretUpdateOptions {
    pub project: String,
    pub config: String,
    /// Secret names mapped to their new raw values.
    pub secrets: BTreeMap<String, String>,
}

impl Payload for SecretUpdateOptions {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDownloadOptions {
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub config: String,
    #[serde(skip)]
    pub include_dynamic: Option<bool>,
    #[serde(skip)]
    pub dynamic_ttl_seconds: Option<i32>,
    #[serde(skip)]
    pub format: Option<DownloadFormat>,
    #[serde(skip)]
    pub name_transformer: Option<NameTransformer>,
}

impl Payload for SecretDownloadOptions {
    fn query(&self, query: &mut Query) {
        query
            .push("project", &self.project)
            .push("config", &self.config)
            .push("include_dynamic_secrets", &self.include_dynamic)
            .push("dynamic_secrets_ttl_sec", &self.dynamic_ttl_seconds)
            .push("format", &self.format)
            .push("name_transformer", &self.name_transformer);
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

    pub fn get(&self, ctx: &Context, opts: &SecretGetOptions) -> Result<(Secret, ApiResponse)> {
        let resp: SecretResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/configs/config/secret", &self.key).payload(opts),
        )?;
        Ok((resp.secret, resp.api))
    }

    pub fn list(
        &self,
        ctx: &Context,
        opts: &SecretListOptions,
    ) -> Result<(BTreeMap<String, SecretValue>, ApiResponse)> {
        let resp: SecretListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Get, "/v3/configs/config/secrets", &self.key).payload(opts),
        )?;
        Ok((resp.secrets, resp.api))
    }

    /// Write several secrets at once. Returns every secret in the config
    /// after the update.
    pub fn update(
        &self,
        ctx: &Context,
        opts: &SecretUpdateOptions,
    ) -> Result<(BTreeMap<String, SecretValue>, ApiResponse)> {
        let resp: SecretListResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Put, "/v3/configs/config/secrets", &self.key).payload(opts),
        )?;
        Ok((resp.secrets, resp.api))
    }

    /// Download the config's secrets as a file in the requested format.
    ///
    /// The body is returned verbatim; it is never decoded, so the envelope
    /// carries only HTTP metadata.
    pub fn download(&self, ctx: &Context, opts: &SecretDownloadOptions) -> Result<(String, ApiResponse)> {
        let response = self.backend.call_raw(
            ctx,
            Request::new(HttpMethod::Get, "/v3/configs/config/secrets/download", &self.key)
                .payload(opts),
        )?;

        let mut envelope = ApiResponse::default();
        envelope.bind(Some(&response));
        Ok((String::from_utf8_lossy(response.body()).into_owned(), envelope))
    }
}

pub fn get(ctx: &Context, opts: &SecretGetOptions) -> Result<(Secret, ApiResponse)> {
    Client::default().get(ctx, opts)
}

pub fn list(ctx: &Context, opts: &SecretListOptions) -> Result<(BTreeMap<String, SecretValue>, ApiResponse)> {
    Client::default().list(ctx, opts)
}

pub fn update(ctx: &Context, opts: &SecretUpdateOptions) -> Result<(BTreeMap<String, SecretValue>, ApiResponse)> {
    Client::default().update(ctx, opts)
}

pub fn download(ctx: &Context, opts: &SecretDownloadOptions) -> Result<(String, ApiResponse)> {
    Client::default().download(ctx, opts)
}
