//! Doppler Share links: `/v1/share/secrets`.
//!
//! Plain shares send the secret itself. Encrypted shares send a secret the
//! caller already encrypted client-side, along with the parameters of the key
//! derivation; the API accepts only [`ENCRYPTION_KDF`] with
//! [`ENCRYPTION_SALT_ROUNDS`].

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::encode::Payload;
use crate::error::Result;
use crate::http::{Context, HttpMethod, Request};
use crate::response::{impl_response, ApiResponse};
use crate::settings;
use crate::validate::{ValidationErrors, Validator};

/// Key derivation function required for encrypted shares.
pub const ENCRYPTION_KDF: &str = "pbkdf2";
/// Salt rounds required for encrypted shares.
pub const ENCRYPTION_SALT_ROUNDS: i32 = 100_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePlain {
    pub url: Option<String>,
    pub authenticated_url: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEncrypted {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SharePlainResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(flatten)]
    pub share: SharePlain,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareEncryptedResponse {
    #[serde(flatten)]
    pub api: ApiResponse,
    #[serde(flatten)]
    pub share: ShareEncrypted,
}

impl_response!(SharePlainResponse, ShareEncryptedResponse);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePlainOptions {
    pub secret: String,
    /// Views before the link expires, 1 to 50, or -1 for unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_views: Option<i32>,
    /// Days before the link expires, 1 to 90.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_days: Option<i32>,
}

impl Payload for SharePlainOptions {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required("secret", &self.secret).finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEncryptedOptions {
    /// Base64 of the AES-GCM encrypted secret.
    #[serde(rename = "encrypted_secret")]
    pub secret: String,
    /// SHA-256 of the password, not of the derived key.
    #[serde(rename = "hashed_password")]
    pub password: String,
    #[serde(rename = "encryption_kdf")]
    pub kdf: String,
    #[serde(rename = "encryption_salt_rounds")]
    pub salt_rounds: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_views: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_days: Option<i32>,
}

impl ShareEncryptedOptions {
    /// Options with the required KDF parameters filled in.
    pub fn new(secret: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            password: password.into(),
            kdf: ENCRYPTION_KDF.to_string(),
            salt_rounds: ENCRYPTION_SALT_ROUNDS,
            expire_views: None,
            expire_days: None,
        }
    }
}

impl Payload for ShareEncryptedOptions {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("secret", &self.secret)
            .required("password", &self.password)
            .required("kdf", &self.kdf)
            .equals("kdf", self.kdf.as_str(), ENCRYPTION_KDF)
            .required("salt_rounds", &self.salt_rounds)
            .equals("salt_rounds", &self.salt_rounds, &ENCRYPTION_SALT_ROUNDS)
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

    /// Create a share link for a plain-text secret.
    pub fn plain(&self, ctx: &Context, opts: &SharePlainOptions) -> Result<(SharePlain, ApiResponse)> {
        let resp: SharePlainResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v1/share/secrets/plain", &self.key).payload(opts),
        )?;
        Ok((resp.share, resp.api))
    }

    /// Create a share link for a secret encrypted by the caller.
    pub fn encrypted(
        &self,
        ctx: &Context,
        opts: &ShareEncryptedOptions,
    ) -> Result<(ShareEncrypted, ApiResponse)> {
        let resp: ShareEncryptedResponse = self.backend.call(
            ctx,
            Request::new(HttpMethod::Post, "/v1/share/secrets/encrypted", &self.key).payload(opts),
        )?;
        Ok((resp.share, resp.api))
    }
}

pub fn plain(ctx: &Context, opts: &SharePlainOptions) -> Result<(SharePlain, ApiResponse)> {
    Client::default().plain(ctx, opts)
}

pub fn encrypted(ctx: &Context, opts: &ShareEncryptedOptions) -> Result<(ShareEncrypted, ApiResponse)> {
    Client::default().encrypted(ctx, opts)
}
