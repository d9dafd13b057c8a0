use axum::http::{self, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use doppler_mock::{app, app_with_state, Shared};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

const KEY: &str = "dp.pt.test";

fn auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("{KEY}:")))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: &str) -> axum::response::Response {
    app.clone().oneshot(request(method, uri, body)).await.unwrap()
}

async fn with_project() -> Router {
    let app = app();
    let resp = send(&app, "POST", "/v3/projects", r#"{"name":"backend"}"#).await;
    assert_eq!(resp.status(), StatusCode::OK);
    app
}

// --- auth ---

#[tokio::test]
async fn missing_auth_is_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/v3/projects").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["messages"][0], "Invalid Auth token");
}

#[tokio::test]
async fn revoked_key_is_rejected() {
    let app = app();
    let resp = send(&app, "POST", "/v3/auth/revoke", &format!(r#"[{{"token":"{KEY}"}}]"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, "GET", "/v3/projects", "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoke_without_tokens_is_400() {
    let resp = send(&app(), "POST", "/v3/auth/revoke", "[]").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- tracking headers ---

#[tokio::test]
async fn responses_carry_request_id_and_rate_limit() {
    let resp = send(&app(), "GET", "/v3/projects", "").await;

    let headers = resp.headers();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-ratelimit-limit"], "240");
    assert_eq!(headers["x-ratelimit-remaining"], "239");
    assert!(headers.contains_key("x-ratelimit-reset"));
}

#[tokio::test]
async fn requests_are_recorded() {
    let state = Shared::default();
    let app = app_with_state(state.clone());
    send(&app, "GET", "/v3/projects/project?project=backend", "").await;

    let recorded = state.last_request().unwrap();
    assert_eq!(recorded.method, "GET");
    assert_eq!(recorded.path, "/v3/projects/project");
    assert_eq!(recorded.query_pairs(), vec![("project".to_string(), "backend".to_string())]);
    assert_eq!(recorded.header("authorization"), Some(auth().as_str()));
}

// --- projects ---

#[tokio::test]
async fn project_lifecycle() {
    let app = with_project().await;

    let resp = send(&app, "GET", "/v3/projects/project?project=backend", "").await;
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["project"]["slug"], "backend");

    let resp = send(
        &app,
        "POST",
        "/v3/projects/project",
        r#"{"project":"backend","name":"Backend API","description":"core"}"#,
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["project"]["name"], "Backend API");
    assert_eq!(body["project"]["description"], "core");

    let resp = send(&app, "DELETE", "/v3/projects/project", r#"{"project":"backend"}"#).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, "GET", "/v3/projects/project?project=backend", "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn projects_paginate() {
    let app = app();
    for name in ["a", "b", "c"] {
        send(&app, "POST", "/v3/projects", &format!(r#"{{"name":"{name}"}}"#)).await;
    }

    let resp = send(&app, "GET", "/v3/projects?page=2&per_page=2", "").await;
    let body = body_json(resp).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["projects"].as_array().unwrap().len(), 1);
    assert_eq!(body["projects"][0]["slug"], "c");
}

// --- environments and configs ---

#[tokio::test]
async fn new_project_has_default_environments() {
    let app = with_project().await;
    let resp = send(&app, "GET", "/v3/environments?project=backend", "").await;
    let body = body_json(resp).await;
    let slugs: Vec<_> = body["environments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|env| env["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(slugs, ["dev", "prd", "stg"]);
}

#[tokio::test]
async fn environment_rename_moves_configs() {
    let app = with_project().await;
    let resp = send(
        &app,
        "PUT",
        "/v3/environments/environment?project=backend&environment=stg",
        r#"{"name":"QA","slug":"qa"}"#,
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["environment"]["slug"], "qa");
    assert_eq!(body["environment"]["name"], "QA");

    let resp = send(&app, "GET", "/v3/configs/config?project=backend&config=stg", "").await;
    let body = body_json(resp).await;
    assert_eq!(body["config"]["environment"], "qa");
}

#[tokio::test]
async fn locked_config_cannot_be_deleted() {
    let app = with_project().await;
    send(
        &app,
        "POST",
        "/v3/configs",
        r#"{"project":"backend","environment":"dev","name":"dev_personal"}"#,
    )
    .await;
    let resp = send(
        &app,
        "POST",
        "/v3/configs/config/lock",
        r#"{"project":"backend","config":"dev_personal"}"#,
    )
    .await;
    assert_eq!(body_json(resp).await["config"]["locked"], true);

    let resp = send(
        &app,
        "DELETE",
        "/v3/configs/config",
        r#"{"project":"backend","config":"dev_personal"}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clone_copies_secrets() {
    let app = with_project().await;
    send(
        &app,
        "PUT",
        "/v3/configs/config/secrets",
        r#"{"project":"backend","config":"dev","secrets":{"API_KEY":"123"}}"#,
    )
    .await;
    let resp = send(
        &app,
        "POST",
        "/v3/configs/config/clone",
        r#"{"project":"backend","config":"dev","name":"dev_copy"}"#,
    )
    .await;
    assert_eq!(body_json(resp).await["config"]["name"], "dev_copy");

    let resp = send(
        &app,
        "GET",
        "/v3/configs/config/secret?project=backend&config=dev_copy&name=API_KEY",
        "",
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["name"], "API_KEY");
    assert_eq!(body["value"]["raw"], "123");
}

// --- secrets ---

#[tokio::test]
async fn list_secrets_includes_computed_entries() {
    let app = with_project().await;
    let resp = send(&app, "GET", "/v3/configs/config/secrets?project=backend&config=dev", "").await;
    let body = body_json(resp).await;
    assert_eq!(body["secrets"]["DOPPLER_PROJECT"]["computed"], "backend");
    assert_eq!(body["secrets"]["DOPPLER_CONFIG"]["raw"], "dev");
}

#[tokio::test]
async fn download_formats() {
    let app = with_project().await;
    send(
        &app,
        "PUT",
        "/v3/configs/config/secrets",
        r#"{"project":"backend","config":"dev","secrets":{"API_KEY":"123"}}"#,
    )
    .await;

    let resp = send(
        &app,
        "GET",
        "/v3/configs/config/secrets/download?project=backend&config=dev&format=docker",
        "",
    )
    .await;
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "text/plain");
    let text = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(text.lines().any(|line| line == "API_KEY=123"));

    let resp = send(
        &app,
        "GET",
        "/v3/configs/config/secrets/download?project=backend&config=dev&format=json&name_transformer=camel",
        "",
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["apiKey"], "123");

    let resp = send(
        &app,
        "GET",
        "/v3/configs/config/secrets/download?project=backend&config=dev&format=xml",
        "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn secret_updates_are_logged_and_rolled_back() {
    let app = with_project().await;
    for value in ["1", "2"] {
        send(
            &app,
            "PUT",
            "/v3/configs/config/secrets",
            &format!(r#"{{"project":"backend","config":"dev","secrets":{{"A":"{value}"}}}}"#),
        )
        .await;
    }

    let resp = send(&app, "GET", "/v3/configs/config/logs?project=backend&config=dev", "").await;
    let body = body_json(resp).await;
    let newest = body["logs"][0]["id"].as_str().unwrap().to_string();

    let resp = send(
        &app,
        "POST",
        &format!("/v3/configs/config/logs/log/rollback?project=backend&config=dev&log={newest}"),
        "",
    )
    .await;
    assert_eq!(body_json(resp).await["config_log"]["rollback"], true);

    let resp = send(
        &app,
        "GET",
        "/v3/configs/config/secret?project=backend&config=dev&name=A",
        "",
    )
    .await;
    assert_eq!(body_json(resp).await["value"]["raw"], "1");
}

// --- service tokens and leases ---

#[tokio::test]
async fn service_token_key_only_shown_on_create() {
    let app = with_project().await;
    let resp = send(
        &app,
        "POST",
        "/v3/configs/config/tokens",
        r#"{"project":"backend","config":"dev","name":"ci"}"#,
    )
    .await;
    let body = body_json(resp).await;
    assert!(body["token"]["key"].as_str().unwrap().starts_with("dp.st.dev."));
    assert_eq!(body["token"]["access"], "read");

    let resp = send(&app, "GET", "/v3/configs/config/tokens?project=backend&config=dev", "").await;
    let body = body_json(resp).await;
    assert!(body["tokens"][0].get("key").is_none());
}

#[tokio::test]
async fn lease_revoke_is_empty_204() {
    let app = with_project().await;
    let resp = send(
        &app,
        "POST",
        "/v3/configs/config/dynamic_secrets/dynamic_secret/leases",
        r#"{"project":"backend","config":"dev","dynamic_secret":"db","ttl_seconds":60}"#,
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["ttl_sec"], 60);
    let slug = body["slug"].as_str().unwrap().to_string();

    let revoke = format!(
        r#"{{"project":"backend","config":"dev","dynamic_secret":"db","slug":"{slug}"}}"#
    );
    let path = "/v3/configs/config/dynamic_secrets/dynamic_secret/leases/lease";
    let resp = send(&app, "DELETE", path, &revoke).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&app, "DELETE", path, &revoke).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- share, workplace, activity ---

#[tokio::test]
async fn encrypted_share_checks_kdf() {
    let body = r#"{"encrypted_secret":"x","hashed_password":"y","encryption_kdf":"scrypt","encryption_salt_rounds":100000}"#;
    let resp = send(&app(), "POST", "/v1/share/secrets/encrypted", body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body.replace("scrypt", "pbkdf2");
    let resp = send(&app(), "POST", "/v1/share/secrets/encrypted", &body).await;
    assert!(body_json(resp).await["url"].as_str().unwrap().starts_with("https://"));
}

#[tokio::test]
async fn workplace_settings_are_opt_in() {
    let app = app();
    let body = body_json(send(&app, "GET", "/v3/workplace", "").await).await;
    assert!(body["workplace"].get("saml_enabled").is_none());

    let body = body_json(send(&app, "GET", "/v3/workplace?settings=true", "").await).await;
    assert_eq!(body["workplace"]["saml_enabled"], false);

    let body = body_json(send(&app, "GET", "/v3/workplace/users/usr_owner", "").await).await;
    assert_eq!(body["workplace_user"]["access"], "owner");
}

#[tokio::test]
async fn activity_logs_newest_first() {
    let app = with_project().await;
    send(&app, "POST", "/v3/projects", r#"{"name":"frontend"}"#).await;

    let body = body_json(send(&app, "GET", "/v3/logs", "").await).await;
    assert_eq!(body["logs"][0]["text"], "Created project frontend");
    let id = body["logs"][0]["id"].as_str().unwrap().to_string();

    let body = body_json(send(&app, "GET", &format!("/v3/logs/log?log={id}"), "").await).await;
    assert_eq!(body["log"]["project"], "frontend");
}
