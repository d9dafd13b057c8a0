//! The request/response engine behind every resource client.
//!
//! # Design
//! `Backend` owns the base URL, a `ureq::Agent` and an optional tracing
//! dispatcher, and never changes after construction, so one value can serve
//! any number of threads. A call validates the payload, encodes it into query
//! and body, sends it with auth and User-Agent headers, binds the response
//! envelope and decodes the JSON body into the caller's response type.
//!
//! HTTP error statuses are not errors here. A call fails on the server's
//! account only when the envelope carries messages.

use std::any::Any;
use std::panic;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue};
use tracing::Dispatch;
use ureq::{Agent, RequestBuilder};
use url::Url;

use crate::encode::{self, Payload};
use crate::error::{Error, Result};
use crate::http::{Context, HttpMethod, Request};
use crate::response::{ApiResponse, Response};
use crate::{settings, API_URL};

/// Transport timeout applied when no agent is configured.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// How often a waiting call checks its context for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

static DEFAULT_AGENT: LazyLock<Agent> = LazyLock::new(|| {
    Agent::config_builder()
        .timeout_global(Some(DEFAULT_HTTP_TIMEOUT))
        .http_status_as_error(false)
        .build()
        .new_agent()
});

/// Configuration for [`Backend::new`]. Every field is optional.
#[derive(Clone, Default)]
pub struct BackendConfig {
    /// HTTP agent. Defaults to a shared agent with a 60 second timeout.
    pub agent: Option<Agent>,
    /// Base API URL. Defaults to [`API_URL`].
    pub url: Option<String>,
    /// Dispatcher receiving this backend's log events. Defaults to the
    /// process-wide tracing subscriber.
    pub logger: Option<Dispatch>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("agent", &self.agent.is_some())
            .field("url", &self.url)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

/// Sends requests to the Doppler API.
#[derive(Clone)]
pub struct Backend {
    url: String,
    agent: Agent,
    logger: Option<Dispatch>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

/// Strip a trailing slash and API version segment from a base URL. Endpoint
/// paths carry their own version prefix.
///
/// The slash, `/v3`, `/v1` pass repeats until nothing changes, so
/// `https://x//` becomes `https://x` and normalizing twice equals
/// normalizing once.
pub fn normalize_url(url: &str) -> String {
    let mut current = url;
    loop {
        let trimmed = current.strip_suffix('/').unwrap_or(current);
        let trimmed = trimmed.strip_suffix("/v3").unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix("/v1").unwrap_or(trimmed);
        if trimmed.len() == current.len() {
            return trimmed.to_string();
        }
        current = trimmed;
    }
}

impl Backend {
    pub fn new(config: BackendConfig) -> Self {
        let url = config.url.as_deref().unwrap_or(API_URL);
        Self {
            url: normalize_url(url),
            agent: config.agent.unwrap_or_else(|| DEFAULT_AGENT.clone()),
            logger: config.logger,
        }
    }

    /// The normalized base URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `request` and decode the JSON response into `R`.
    ///
    /// Empty bodies and non-JSON bodies leave the target at its default with
    /// only the envelope filled in.
    pub fn call<P: Payload, R: Response>(&self, ctx: &Context, request: Request<'_, P>) -> Result<R> {
        self.logged(|| self.round_trip(ctx, request))
    }

    /// Send `request` and hand back the HTTP response with its body read but
    /// not decoded. The envelope is not bound.
    pub fn call_raw<P: Payload>(
        &self,
        ctx: &Context,
        request: Request<'_, P>,
    ) -> Result<http::Response<Vec<u8>>> {
        self.logged(|| self.fetch(ctx, request))
    }

    fn logged<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.logger {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    fn round_trip<P: Payload, R: Response>(&self, ctx: &Context, request: Request<'_, P>) -> Result<R> {
        let method = request.method;
        let path = request.path.clone();

        let result = self.fetch(ctx, request).and_then(decode);
        if let Err(err) = &result {
            tracing::debug!(
                %method,
                %path,
                error = %err,
                response = ?err.response(),
                "HTTP request failed"
            );
        }
        result
    }

    fn fetch<P: Payload>(&self, ctx: &Context, request: Request<'_, P>) -> Result<http::Response<Vec<u8>>> {
        let outgoing = self.prepare(ctx, request)?;
        tracing::info!(method = %outgoing.method, url = %outgoing.url, "sending HTTP request");

        let agent = self.agent.clone();
        let received = in_flight(ctx, move || outgoing.send(&agent))?;
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        received
    }

    fn prepare<P: Payload>(&self, ctx: &Context, request: Request<'_, P>) -> Result<Outgoing> {
        if settings::validation_enabled() {
            if let Some(payload) = request.payload {
                payload.validate()?;
            }
        }

        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if ctx.is_expired() {
            return Err(Error::DeadlineExceeded);
        }

        let body = match request.method {
            HttpMethod::Get => Vec::new(),
            _ => encode::body_of(request.payload).map_err(Error::Encode)?,
        };
        Ok(Outgoing {
            method: request.method,
            url: self.request_url(&request)?,
            headers: request_headers(&request)?,
            body,
            timeout: ctx.remaining(),
        })
    }

    fn request_url<P: Payload>(&self, request: &Request<'_, P>) -> Result<Url> {
        let path = if request.path.starts_with('/') {
            request.path.clone()
        } else {
            format!("/{}", request.path)
        };

        let mut url = Url::parse(&format!("{}{path}", self.url))
            .map_err(|err| Error::InvalidRequest(format!("{}{path}: {err}", self.url)))?;
        if !request.segments.is_empty() {
            // Dot segments are dropped by the URL writer, which would change the endpoint.
            if let Some(dot) = request
                .segments
                .iter()
                .find(|segment| matches!(segment.as_str(), "" | "." | ".."))
            {
                return Err(Error::InvalidRequest(format!("{url}: path segment '{dot}'")));
            }
            let base = url.to_string();
            url.path_segments_mut()
                .map_err(|()| Error::InvalidRequest(format!("{base}: cannot take path segments")))?
                .pop_if_empty()
                .extend(&request.segments);
        }

        let query = encode::query_of(request.payload);
        if !query.is_empty() {
            url.set_query(Some(&query.encode()));
        }
        Ok(url)
    }
}

/// A fully built request, ready to hand to the transport.
struct Outgoing {
    method: HttpMethod,
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
    timeout: Option<Duration>,
}

impl Outgoing {
    /// Send the request and read the whole body. Blocks until the server
    /// answers or the transport gives up.
    fn send(self, agent: &Agent) -> Result<http::Response<Vec<u8>>> {
        let url = self.url.as_str();
        let (headers, timeout) = (&self.headers, self.timeout);
        let mut response = match self.method {
            HttpMethod::Get => configure(agent.get(url), headers, timeout).call(),
            HttpMethod::Post => configure(agent.post(url), headers, timeout).send(self.body.as_slice()),
            HttpMethod::Put => configure(agent.put(url), headers, timeout).send(self.body.as_slice()),
            HttpMethod::Delete => configure(agent.delete(url).force_send_body(), headers, timeout)
                .send(self.body.as_slice()),
        }?;

        let empty = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim() == "0");
        let body = if empty {
            Vec::new()
        } else {
            match response.body_mut().read_to_vec() {
                Ok(body) => body,
                Err(source) => {
                    return Err(Error::ReadBody {
                        source,
                        response: Box::new(envelope_of(&response)),
                    })
                }
            }
        };

        let (parts, _) = response.into_parts();
        Ok(http::Response::from_parts(parts, body))
    }
}

/// Run `job` on a worker thread and wait for it while watching `ctx`.
///
/// Returns [`Error::Cancelled`] as soon as the context is cancelled; the
/// worker is left to finish on its own and its result is dropped.
fn in_flight<T: Send + 'static>(ctx: &Context, job: impl FnOnce() -> T + Send + 'static) -> Result<T> {
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        // The receiver is gone once the caller stopped waiting.
        let _ = tx.send(job());
    });

    loop {
        match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok(value) => return Ok(value),
            Err(RecvTimeoutError::Timeout) if ctx.is_cancelled() => return Err(Error::Cancelled),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                let payload: Box<dyn Any + Send> = match worker.join() {
                    Err(payload) => payload,
                    Ok(()) => Box::new("request worker exited without an answer"),
                };
                panic::resume_unwind(payload)
            }
        }
    }
}

/// Default headers for `request`, with the request's own headers replacing
/// defaults of the same name.
fn request_headers<P>(request: &Request<'_, P>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if request.method != HttpMethod::Get {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    let credentials = STANDARD.encode(format!("{}:", request.key));
    headers.insert(AUTHORIZATION, header_value(&format!("Basic {credentials}"))?);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, header_value(&settings::user_agent())?);

    for name in request.headers.keys() {
        headers.remove(name);
        for value in request.headers.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| Error::InvalidRequest(err.to_string()))
}

fn configure<B>(
    mut builder: RequestBuilder<B>,
    headers: &HeaderMap,
    timeout: Option<Duration>,
) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let config = builder.config().http_status_as_error(false);
    match timeout {
        Some(timeout) => config.timeout_global(Some(timeout)).build(),
        None => config.build(),
    }
}

fn decode<R: Response>(response: http::Response<Vec<u8>>) -> Result<R> {
    let body = response.body();
    if body.is_empty() {
        return Ok(bound(R::default(), &response));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/json") {
        tracing::warn!(content_type, "response body is not JSON");
        return Ok(bound(R::default(), &response));
    }

    let target: R = match serde_json::from_slice(body) {
        Ok(target) => bound(target, &response),
        Err(source) => {
            // Salvage the envelope so server messages are not lost with the payload.
            let mut envelope: ApiResponse = serde_json::from_slice(body).unwrap_or_default();
            envelope.bind(Some(&response));
            return Err(if envelope.is_error() {
                Error::Server {
                    response: Box::new(envelope),
                    decode: Some(source),
                }
            } else {
                Error::Decode {
                    source,
                    response: Box::new(envelope),
                }
            });
        }
    };

    if target.envelope().is_error() {
        return Err(Error::Server {
            response: Box::new(target.envelope().clone()),
            decode: None,
        });
    }
    Ok(target)
}

fn envelope_of<B>(response: &http::Response<B>) -> ApiResponse {
    let mut envelope = ApiResponse::default();
    envelope.bind(Some(response));
    envelope
}

fn bound<R: Response, B>(mut target: R, response: &http::Response<B>) -> R {
    target.envelope_mut().bind(Some(response));
    target
}
