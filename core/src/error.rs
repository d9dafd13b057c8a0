//! Error types for the Doppler client.
//!
//! # Design
//! One variant per stage a call can fail at, in the order the stages run.
//! Failures that happen after the server answered carry the response envelope
//! so callers can inspect status, request id and rate limit; failures before
//! any I/O carry none. A decode failure that coincides with server-reported
//! messages stays a single `Server` error with the decode cause attached.

use crate::response::ApiResponse;
use crate::validate::ValidationErrors;

/// Errors returned by `Backend` calls and the resource clients.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload failed validation; no request was sent.
    #[error("validate request payload: {0}")]
    InvalidPayload(#[from] ValidationErrors),

    /// The request body could not be serialized to JSON.
    #[error("encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The request URL could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// DNS, connect, TLS, timeout or body read failure.
    #[error(transparent)]
    Transport(#[from] ureq::Error),

    /// The call's context was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The call's context deadline passed before the request was sent.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The server answered but its body could not be read.
    #[error("read response body: {source}")]
    ReadBody {
        #[source]
        source: ureq::Error,
        response: Box<ApiResponse>,
    },

    /// The response body could not be decoded into the expected type.
    #[error("decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        response: Box<ApiResponse>,
    },

    /// The server reported one or more messages.
    #[error("{}", server_text(.response, .decode.as_ref()))]
    Server {
        response: Box<ApiResponse>,
        decode: Option<serde_json::Error>,
    },
}

impl Error {
    /// The response envelope, when the server answered.
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Error::ReadBody { response, .. }
            | Error::Decode { response, .. }
            | Error::Server { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Status code of the server's answer, when there was one.
    pub fn status_code(&self) -> Option<u16> {
        self.response().map(|response| response.status_code)
    }

    /// Messages the server reported.
    pub fn messages(&self) -> &[String] {
        match self {
            Error::Server { response, .. } => &response.messages,
            _ => &[],
        }
    }

    /// Whether the error happened before anything was sent.
    pub fn is_pre_io(&self) -> bool {
        matches!(
            self,
            Error::InvalidPayload(_)
                | Error::Encode(_)
                | Error::InvalidRequest(_)
                | Error::DeadlineExceeded
        )
    }
}

fn server_text(response: &ApiResponse, decode: Option<&serde_json::Error>) -> String {
    match decode {
        Some(decode) => format!("{}: decode response body: {decode}", response.message()),
        None => response.message(),
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
