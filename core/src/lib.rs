//! Blocking client for the Doppler secrets-management API.
//!
//! # Overview
//! Every endpoint is described as a [`Request`] carrying an options value
//! (the [`Payload`]). The [`Backend`] validates the options, splits them into
//! query parameters and a JSON body, sends the request and decodes the JSON
//! answer into a typed response holding the common [`ApiResponse`] envelope.
//!
//! # Design
//! - One module per API resource (`project`, `config`, `secret`, ...). Each
//!   exposes a `Client { backend, key }` plus free functions that forward to
//!   `Client::default()`, which reads the process-wide defaults in
//!   [`settings`].
//! - Options types decide their own routing: query fields are written in
//!   `Payload::query` and kept out of serde, everything serde emits is body.
//! - A response listing server messages is an error whatever its status code;
//!   an error status with no messages is not.
//! - Calls block. Deadlines and cancellation come from a per-call
//!   [`Context`].

pub mod activity_log;
pub mod audit;
pub mod auth;
pub mod backend;
pub mod config;
pub mod config_log;
pub mod dynamic_secret;
pub mod encode;
pub mod environment;
pub mod error;
pub mod http;
pub mod project;
pub mod response;
pub mod secret;
pub mod service_token;
pub mod settings;
pub mod share;
pub mod user;
pub mod validate;
pub mod workplace;

pub use backend::{normalize_url, Backend, BackendConfig, DEFAULT_HTTP_TIMEOUT};
pub use encode::{ListOptions, Payload, Query, Scalar};
pub use error::{Error, Result};
pub use crate::http::{Context, HttpMethod, Request};
pub use response::{ApiResponse, RateLimit, Response};
pub use user::User;
pub use validate::{ValidationErrors, Violation};

/// Version of this client, advertised in the User-Agent.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default base URL of the Doppler API.
pub const API_URL: &str = "https://api.doppler.com";
