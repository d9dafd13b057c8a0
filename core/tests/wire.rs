//! Wire-level behaviour of the backend against hand-written servers.
//!
//! # Design
//! Each test serves a tiny axum router on a random port, shaped to produce
//! one particular answer (odd headers, wrong content types, empty or slow
//! bodies), and checks how the client binds and classifies it.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::Router;
use doppler::{
    audit, project, secret, workplace, ApiResponse, Backend, BackendConfig, Context, Error, HttpMethod,
    Request,
};

const KEY: &str = "dp.st.wire";
const JSON: (header::HeaderName, &str) = (header::CONTENT_TYPE, "application/json");

fn backend_for(router: Router) -> Backend {
    let addr = doppler_mock::spawn(router).unwrap();
    Backend::new(BackendConfig {
        url: Some(format!("http://{addr}")),
        ..Default::default()
    })
}

fn ctx() -> Context {
    Context::background()
}

/// Collects everything a fmt subscriber writes.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn captured_dispatch() -> (tracing::Dispatch, Captured) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (tracing::Dispatch::new(subscriber), captured)
}

#[test]
fn rate_limit_and_request_id_are_bound() {
    let router = Router::new().route(
        "/v3/workplace",
        get(|| async {
            (
                [
                    JSON,
                    (header::HeaderName::from_static("x-request-id"), "req-42"),
                    (header::HeaderName::from_static("x-ratelimit-limit"), "100"),
                    (header::HeaderName::from_static("x-ratelimit-remaining"), "50"),
                    (header::HeaderName::from_static("x-ratelimit-reset"), "1234567890"),
                ],
                r#"{"success":true,"workplace":{"id":"wp_1","name":"Acme"}}"#,
            )
        }),
    );
    let client = workplace::Client::new(backend_for(router), KEY);

    let (workplace, response) = client.get(&ctx()).unwrap();
    assert_eq!(workplace.unwrap().name.as_deref(), Some("Acme"));
    assert_eq!(response.status, "200 OK");
    assert_eq!(response.request_id.as_deref(), Some("req-42"));

    let rate_limit = response.rate_limit.unwrap();
    assert_eq!(rate_limit.limit, 100);
    assert_eq!(rate_limit.remaining, 50);
    assert_eq!(rate_limit.reset.to_rfc3339(), "2009-02-13T23:31:30+00:00");
}

#[test]
fn partial_rate_limit_headers_are_ignored() {
    let router = Router::new().route(
        "/v3/workplace",
        get(|| async {
            (
                [JSON, (header::HeaderName::from_static("x-ratelimit-limit"), "100")],
                r#"{"success":true}"#,
            )
        }),
    );
    let (_, response) = workplace::Client::new(backend_for(router), KEY)
        .get(&ctx())
        .unwrap();
    assert!(response.rate_limit.is_none());
}

#[test]
fn messages_on_200_are_an_error() {
    let router = Router::new().route(
        "/v3/projects/project",
        get(|| async { ([JSON], r#"{"success":false,"messages":["bad config","try again"]}"#) }),
    );
    let client = project::Client::new(backend_for(router), KEY);

    let err = client
        .get(&ctx(), &project::ProjectGetOptions { name: "backend".to_string() })
        .unwrap_err();
    assert!(matches!(err, Error::Server { decode: None, .. }), "{err:?}");
    assert_eq!(err.to_string(), "bad config: try again");
    let response = err.response().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.success, Some(false));
}

#[test]
fn error_status_without_messages_is_ok() {
    let router = Router::new().route(
        "/v3/projects/project",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, [JSON], r#"{"success":false}"#) }),
    );
    let client = project::Client::new(backend_for(router), KEY);

    let (project, response) = client
        .get(&ctx(), &project::ProjectGetOptions { name: "backend".to_string() })
        .unwrap();
    assert!(project.is_none());
    assert_eq!(response.status_code, 500);
    assert_eq!(response.status, "500 Internal Server Error");
}

#[test]
fn empty_body_binds_envelope_only() {
    let router = Router::new().route("/v3/workplace", get(|| async { StatusCode::ACCEPTED }));
    let (workplace, response) = workplace::Client::new(backend_for(router), KEY)
        .get(&ctx())
        .unwrap();
    assert!(workplace.is_none());
    assert_eq!(response.status_code, 202);
    assert!(response.success.is_none());
}

#[test]
fn non_json_body_warns_and_keeps_defaults() {
    let router = Router::new().route(
        "/v3/workplace",
        get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html>maintenance</html>") }),
    );
    let (dispatch, captured) = captured_dispatch();
    let addr = doppler_mock::spawn(router).unwrap();
    let backend = Backend::new(BackendConfig {
        url: Some(format!("http://{addr}")),
        logger: Some(dispatch),
        ..Default::default()
    });

    let (workplace, response) = workplace::Client::new(backend, KEY).get(&ctx()).unwrap();
    assert!(workplace.is_none());
    assert_eq!(response.status_code, 200);

    let logs = captured.text();
    assert!(logs.contains("response body is not JSON"), "{logs}");
    assert!(logs.contains("text/html"), "{logs}");
}

#[test]
fn failures_are_logged_at_debug() {
    let router = Router::new().route(
        "/v3/workplace",
        get(|| async { ([JSON], r#"{"messages":["Invalid Auth token"]}"#) }),
    );
    let (dispatch, captured) = captured_dispatch();
    let addr = doppler_mock::spawn(router).unwrap();
    let backend = Backend::new(BackendConfig {
        url: Some(format!("http://{addr}")),
        logger: Some(dispatch),
        ..Default::default()
    });

    workplace::Client::new(backend, KEY).get(&ctx()).unwrap_err();
    let logs = captured.text();
    assert!(logs.contains("HTTP request failed"), "{logs}");
    assert!(logs.contains("/v3/workplace"), "{logs}");
}

#[test]
fn malformed_json_is_a_decode_error() {
    let router = Router::new().route(
        "/v3/projects",
        get(|| async { ([JSON], r#"{"projects":5}"#) }),
    );
    let client = project::Client::new(backend_for(router), KEY);

    let err = client
        .list(&ctx(), &project::ProjectListOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    assert_eq!(err.status_code(), Some(200));
}

#[test]
fn malformed_json_with_messages_keeps_both_causes() {
    let router = Router::new().route(
        "/v3/projects",
        get(|| async { ([JSON], r#"{"projects":5,"messages":["Rate limited"]}"#) }),
    );
    let client = project::Client::new(backend_for(router), KEY);

    let err = client
        .list(&ctx(), &project::ProjectListOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Server { decode: Some(_), .. }), "{err:?}");
    assert_eq!(err.messages(), ["Rate limited"]);
    assert!(err.to_string().starts_with("Rate limited: decode response body: "));
}

#[test]
fn download_returns_raw_body() {
    let body = "API_KEY=123\nDB_URL=postgres://db";
    let router = Router::new().route(
        "/v3/configs/config/secrets/download",
        get(move || async move { ([(header::CONTENT_TYPE, "text/plain")], body) }),
    );
    let client = secret::Client::new(backend_for(router), KEY);

    let (downloaded, response) = client
        .download(
            &ctx(),
            &secret::SecretDownloadOptions {
                project: "backend".to_string(),
                config: "dev".to_string(),
                format: Some(secret::DownloadFormat::Docker),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(downloaded, body);
    assert_eq!(response.status_code, 200);
}

#[test]
fn url_is_normalized_before_joining() {
    let (addr, state) = doppler_mock::start().unwrap();
    for base in [format!("http://{addr}/v3/"), format!("http://{addr}/")] {
        let backend = Backend::new(BackendConfig {
            url: Some(base),
            ..Default::default()
        });
        workplace::Client::new(backend, KEY).get(&ctx()).unwrap();
        assert_eq!(state.last_request().unwrap().path, "/v3/workplace");
    }
}

#[test]
fn invalid_payload_never_reaches_the_server() {
    let (addr, state) = doppler_mock::start().unwrap();
    let backend = Backend::new(BackendConfig {
        url: Some(format!("http://{addr}")),
        ..Default::default()
    });

    let err = project::Client::new(backend, KEY)
        .get(&ctx(), &project::ProjectGetOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPayload(_)));
    assert_eq!(
        err.to_string(),
        "validate request payload: field 'name' failed on the 'required' rule"
    );
    assert!(err.response().is_none());
    assert!(state.requests().is_empty());
}

#[test]
fn request_headers_reach_the_server() {
    let (addr, state) = doppler_mock::start().unwrap();
    let backend = Backend::new(BackendConfig {
        url: Some(format!("http://{addr}")),
        ..Default::default()
    });

    let request = Request::new(HttpMethod::Get, "v3/workplace", KEY).header(
        header::HeaderName::from_static("x-trace-id"),
        header::HeaderValue::from_static("trace-1"),
    );
    let response: ApiResponse = backend.call(&ctx(), request).unwrap();
    assert_eq!(response.status_code, 200);

    let recorded = state.last_request().unwrap();
    assert_eq!(recorded.header("x-trace-id"), Some("trace-1"));
    assert_eq!(recorded.header("authorization"), Some("Basic ZHAuc3Qud2lyZTo="));
    assert!(recorded
        .header("user-agent")
        .is_some_and(|agent| agent.starts_with("doppler-go/")));
    assert_eq!(recorded.body, "");
}

#[test]
fn transport_timeout_is_a_transport_error() {
    let router = Router::new().route(
        "/v3/workplace",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            ([JSON], r#"{"success":true}"#)
        }),
    );
    let client = workplace::Client::new(backend_for(router), KEY);

    let err = client
        .get(&Context::with_timeout(Duration::from_millis(200)))
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err:?}");
    assert!(err.response().is_none());
}

#[test]
fn cancel_during_flight_returns_without_waiting_for_the_server() {
    let router = Router::new().route(
        "/v3/workplace",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            ([JSON], r#"{"success":true}"#)
        }),
    );
    let client = workplace::Client::new(backend_for(router), KEY);

    let ctx = Context::background();
    let canceller = ctx.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        canceller.cancel();
    });

    let started = Instant::now();
    let err = client.get(&ctx).unwrap_err();
    let elapsed = started.elapsed();
    handle.join().unwrap();
    assert!(matches!(err, Error::Cancelled), "{err:?}");
    assert!(err.response().is_none());
    assert!(elapsed < Duration::from_secs(1), "cancel took {elapsed:?}");
}

#[test]
fn user_id_stays_inside_its_path_segment() {
    let (addr, state) = doppler_mock::start().unwrap();
    let backend = Backend::new(BackendConfig {
        url: Some(format!("http://{addr}")),
        ..Default::default()
    });

    let err = audit::Client::new(backend, KEY)
        .workplace_user_get(
            &ctx(),
            &audit::AuditWorkplaceUserGetOptions {
                user_id: "x/../../projects".to_string(),
                settings: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.status_code(), Some(404), "{err:?}");
    assert_eq!(
        state.last_request().unwrap().path,
        "/v3/workplace/users/x%2F..%2F..%2Fprojects"
    );
}
