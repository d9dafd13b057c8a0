//! In-memory fake of the Doppler API for tests and local development.
//!
//! # Design
//! One axum router over a shared [`MockState`]. A middleware layer records
//! every request (method, path, query, headers, body), checks Basic auth and
//! stamps `X-Request-Id` and rate-limit headers on every response, so client
//! tests can assert the exact wire shape of what they sent.
//!
//! Creating a project seeds the `dev`, `stg` and `prd` environments, each with
//! a root config of the same name, the way Doppler does.

mod handlers;
pub mod store;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use uuid::Uuid;

use store::Store;

/// Requests allowed per rate-limit window.
pub const RATE_LIMIT: i64 = 240;
/// Length of a rate-limit window in seconds.
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// A request as the mock received it.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Raw query string, empty when there was none.
    pub query: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Decoded query parameters in wire order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .into_owned()
            .collect()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// State shared by every handler.
#[derive(Debug)]
pub struct MockState {
    pub store: RwLock<Store>,
    requests: Mutex<Vec<RecordedRequest>>,
    remaining: AtomicI64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            requests: Mutex::new(Vec::new()),
            remaining: AtomicI64::new(RATE_LIMIT),
        }
    }
}

impl MockState {
    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn record(&self, request: RecordedRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}

pub type Shared = Arc<MockState>;

/// Error body in Doppler's shape: `{"messages": [...], "success": false}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            messages: vec![message.into()],
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "messages": self.messages, "success": false });
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T = Json<serde_json::Value>> = Result<T, ApiError>;

pub fn app() -> Router {
    app_with_state(Shared::default())
}

pub fn app_with_state(state: Shared) -> Router {
    use handlers::*;

    Router::new()
        .route("/v3/projects", get(list_projects).post(create_project))
        .route(
            "/v3/projects/project",
            get(get_project).post(update_project).delete(delete_project),
        )
        .route("/v3/environments", get(list_environments).post(create_environment))
        .route(
            "/v3/environments/environment",
            get(get_environment).put(rename_environment).delete(delete_environment),
        )
        .route("/v3/configs", get(list_configs).post(create_config))
        .route(
            "/v3/configs/config",
            get(get_config).post(update_config).delete(delete_config),
        )
        .route("/v3/configs/config/lock", post(lock_config))
        .route("/v3/configs/config/unlock", post(unlock_config))
        .route("/v3/configs/config/clone", post(clone_config))
        .route("/v3/configs/config/logs", get(list_config_logs))
        .route("/v3/configs/config/logs/log", get(get_config_log))
        .route("/v3/configs/config/logs/log/rollback", post(rollback_config_log))
        .route("/v3/configs/config/secret", get(get_secret))
        .route("/v3/configs/config/secrets", get(list_secrets).put(update_secrets))
        .route("/v3/configs/config/secrets/download", get(download_secrets))
        .route(
            "/v3/configs/config/tokens",
            get(list_service_tokens).post(create_service_token),
        )
        .route("/v3/configs/config/tokens/token", delete(delete_service_token))
        .route(
            "/v3/configs/config/dynamic_secrets/dynamic_secret/leases",
            post(issue_lease),
        )
        .route(
            "/v3/configs/config/dynamic_secrets/dynamic_secret/leases/lease",
            delete(revoke_lease),
        )
        .route("/v1/share/secrets/plain", post(share_plain))
        .route("/v1/share/secrets/encrypted", post(share_encrypted))
        .route("/v3/workplace", get(get_workplace).post(update_workplace))
        .route("/v3/workplace/users", get(list_workplace_users))
        .route("/v3/workplace/users/{id}", get(get_workplace_user))
        .route("/v3/logs", get(list_activity_logs))
        .route("/v3/logs/log", get(get_activity_log))
        .route("/v3/auth/revoke", post(revoke_tokens))
        .layer(middleware::from_fn_with_state(state.clone(), track))
        .with_state(state)
}

/// Record the request, enforce auth and stamp the tracking headers.
async fn track(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => return ApiError::bad_request(err.to_string()).into_response(),
    };

    state.record(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or_default().to_string(),
        headers: parts.headers.clone(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    });

    let mut response = match authenticate(&state, &parts.headers).await {
        Ok(()) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Err(err) => err.into_response(),
    };

    let remaining = state
        .remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some((n - 1).max(0)))
        .map_or(0, |previous| (previous - 1).max(0));
    let reset = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |now| now.as_secs() + RATE_LIMIT_WINDOW_SECS);

    let headers = response.headers_mut();
    for (name, value) in [
        ("x-request-id", Uuid::new_v4().to_string()),
        ("x-ratelimit-limit", RATE_LIMIT.to_string()),
        ("x-ratelimit-remaining", remaining.to_string()),
        ("x-ratelimit-reset", reset.to_string()),
    ] {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
    response
}

/// Accept `Basic base64("<key>:")` with a non-empty key that was not revoked.
async fn authenticate(state: &MockState, headers: &HeaderMap) -> ApiResult<()> {
    let invalid = || ApiError::new(StatusCode::UNAUTHORIZED, "Invalid Auth token");

    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .ok_or_else(invalid)?;
    let decoded = STANDARD.decode(encoded).map_err(|_| invalid())?;
    let credentials = String::from_utf8(decoded).map_err(|_| invalid())?;
    let key = credentials.strip_suffix(':').unwrap_or(&credentials);
    if key.is_empty() || state.store.read().await.revoked.contains(key) {
        return Err(invalid());
    }
    Ok(())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serve `router` on a random local port from a background thread.
pub fn spawn(router: Router) -> std::io::Result<SocketAddr> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::spawn(move || {
        runtime.block_on(async move {
            let listener = TcpListener::from_std(std_listener)?;
            axum::serve(listener, router).await
        })
    });
    Ok(addr)
}

/// Serve a fresh mock API and return its address with the state handle.
pub fn start() -> std::io::Result<(SocketAddr, Shared)> {
    let state = Shared::default();
    let addr = spawn(app_with_state(state.clone()))?;
    Ok((addr, state))
}
