//! Request description and per-call context.
//!
//! # Design
//! A `Request` is plain data: method, path relative to the backend's base URL,
//! API key, an optional borrowed payload and optional extra headers. Resource
//! clients build one per call and hand it to `Backend::call`, which consumes
//! it. The payload type is generic so the option-encoder works on concrete
//! types instead of reflecting over them at runtime.
//!
//! `Context` carries the caller's deadline and cancellation flag through the
//! blocking transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::encode::Payload;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound API call described as plain data.
///
/// `P` is the payload type; requests without options use the default `()`.
#[derive(Debug)]
pub struct Request<'a, P = ()> {
    pub method: HttpMethod,
    pub path: String,
    pub key: String,
    pub payload: Option<&'a P>,
    pub headers: HeaderMap,
    /// Caller-supplied values appended to `path`, each percent-encoded as one
    /// path segment.
    pub segments: Vec<String>,
}

impl<'a> Request<'a, ()> {
    pub fn new(method: HttpMethod, path: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            key: key.into(),
            payload: None,
            headers: HeaderMap::new(),
            segments: Vec::new(),
        }
    }
}

impl<'a, P: Payload> Request<'a, P> {
    /// Attach the options value whose fields become query parameters and body.
    pub fn payload<Q: Payload>(self, payload: &'a Q) -> Request<'a, Q> {
        Request {
            method: self.method,
            path: self.path,
            key: self.key,
            payload: Some(payload),
            headers: self.headers,
            segments: self.segments,
        }
    }

    /// Append `value` to the path as a single segment. Slashes, `?` and `#`
    /// are escaped rather than read as URL structure.
    pub fn segment(mut self, value: impl Into<String>) -> Self {
        self.segments.push(value.into());
        self
    }

    /// Add an extra header. Extra headers replace the defaults the backend
    /// sets under the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// Deadline and cancellation for a single call.
///
/// Clones share the cancellation flag, so a context handed to another thread
/// can cancel a call in flight on this one. The call returns
/// [`Error::Cancelled`](crate::Error::Cancelled) as soon as the flag is seen,
/// without waiting for the server.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context with no deadline that is never cancelled unless asked to.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline; `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }
}
