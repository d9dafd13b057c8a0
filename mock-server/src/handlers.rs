use std::collections::{BTreeMap, HashMap};

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::store::{new_id, Config, Lease, ServiceToken, CREATED_AT};
use crate::{ApiError, ApiResult, Shared};

type Params = Query<HashMap<String, String>>;

const DEFAULT_PER_PAGE: usize = 20;

fn required<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ApiError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("Missing required parameter: {name}")))
}

fn flag(params: &HashMap<String, String>, name: &str) -> bool {
    params.get(name).is_some_and(|value| value == "true")
}

/// Slice `items` by the `page` / `per_page` parameters, 1-based.
fn paginate<T: Clone>(items: &[T], params: &HashMap<String, String>) -> (Vec<T>, usize) {
    let page = params
        .get("page")
        .and_then(|value| value.parse().ok())
        .filter(|page: &usize| *page > 0)
        .unwrap_or(1);
    let per_page = params
        .get("per_page")
        .and_then(|value| value.parse().ok())
        .filter(|per_page: &usize| *per_page > 0)
        .unwrap_or(DEFAULT_PER_PAGE);
    let slice = items
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    (slice, page)
}

fn ok(mut body: Value) -> Json<Value> {
    if let Value::Object(map) = &mut body {
        map.insert("success".to_string(), Value::Bool(true));
    }
    Json(body)
}

// --- projects ---

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub project: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct ProjectRef {
    pub project: String,
}

pub async fn list_projects(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let projects: Vec<_> = store.projects.values().cloned().collect();
    let (projects, page) = paginate(&projects, &params);
    Ok(ok(json!({ "projects": projects, "page": page })))
}

pub async fn create_project(State(state): State<Shared>, Json(input): Json<CreateProject>) -> ApiResult {
    let project = state
        .store
        .write()
        .await
        .create_project(&input.name, &input.description)?;
    Ok(ok(json!({ "project": project })))
}

pub async fn get_project(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let project = store.project(required(&params, "project")?)?;
    Ok(ok(json!({ "project": project })))
}

pub async fn update_project(State(state): State<Shared>, Json(input): Json<UpdateProject>) -> ApiResult {
    let mut store = state.store.write().await;
    let project = store
        .projects
        .get_mut(&input.project)
        .ok_or_else(|| ApiError::not_found("Could not find requested project"))?;
    if let Some(name) = input.name {
        project.name = name;
    }
    if let Some(description) = input.description {
        project.description = description;
    }
    Ok(ok(json!({ "project": project })))
}

pub async fn delete_project(State(state): State<Shared>, Json(input): Json<ProjectRef>) -> ApiResult {
    state.store.write().await.delete_project(&input.project)?;
    Ok(ok(json!({})))
}

// --- environments ---

#[derive(Deserialize)]
pub struct CreateEnvironment {
    pub name: String,
    pub slug: String,
}

#[derive(Deserialize)]
pub struct RenameEnvironment {
    pub name: Option<String>,
    pub slug: Option<String>,
}

pub async fn list_environments(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let project = required(&params, "project")?;
    store.project(project)?;
    let environments: Vec<_> = store
        .environments
        .values()
        .filter(|environment| environment.project == project)
        .cloned()
        .collect();
    Ok(ok(json!({ "environments": environments, "page": 1 })))
}

pub async fn create_environment(
    State(state): State<Shared>,
    Query(params): Params,
    Json(input): Json<CreateEnvironment>,
) -> ApiResult {
    let mut store = state.store.write().await;
    let project = required(&params, "project")?;
    store.project(project)?;
    if store.environment(project, &input.slug).is_ok() {
        return Err(ApiError::bad_request("An environment with this slug already exists"));
    }
    let environment = store.insert_environment(project, &input.slug, &input.name);
    store.log_activity(
        &format!("Created environment {}", input.name),
        Some(project),
        Some(&input.slug),
        None,
    );
    Ok(ok(json!({ "environment": environment })))
}

pub async fn get_environment(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let environment = store.environment(required(&params, "project")?, required(&params, "environment")?)?;
    Ok(ok(json!({ "environment": environment })))
}

pub async fn rename_environment(
    State(state): State<Shared>,
    Query(params): Params,
    Json(input): Json<RenameEnvironment>,
) -> ApiResult {
    let mut store = state.store.write().await;
    let project = required(&params, "project")?.to_string();
    let slug = required(&params, "environment")?.to_string();
    let mut environment = store.environment(&project, &slug)?.clone();

    if let Some(name) = input.name {
        environment.name = name;
    }
    if let Some(new_slug) = input.slug.filter(|new_slug| *new_slug != slug) {
        if store.environment(&project, &new_slug).is_ok() {
            return Err(ApiError::bad_request("An environment with this slug already exists"));
        }
        store.environments.remove(&(project.clone(), slug.clone()));
        for config in store.configs.values_mut() {
            if config.project == project && config.environment == slug {
                config.environment = new_slug.clone();
            }
        }
        environment.id = new_slug.clone();
        environment.slug = new_slug;
    }
    store.environments.insert(
        (project.clone(), environment.slug.clone()),
        environment.clone(),
    );
    Ok(ok(json!({ "environment": environment })))
}

pub async fn delete_environment(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let mut store = state.store.write().await;
    let project = required(&params, "project")?.to_string();
    let slug = required(&params, "environment")?.to_string();
    store.environment(&project, &slug)?;
    store.environments.remove(&(project.clone(), slug.clone()));
    store
        .configs
        .retain(|_, config| !(config.project == project && config.environment == slug));
    store.log_activity(
        &format!("Deleted environment {slug}"),
        Some(&project),
        Some(&slug),
        None,
    );
    Ok(ok(json!({})))
}

// --- configs ---

#[derive(Deserialize)]
pub struct ConfigRef {
    pub project: String,
    pub config: String,
}

#[derive(Deserialize)]
pub struct CreateConfig {
    pub project: String,
    pub environment: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct RenameConfig {
    pub project: String,
    pub config: String,
    pub name: String,
}

pub async fn list_configs(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let project = required(&params, "project")?;
    store.project(project)?;
    let environment = params.get("environment");
    let configs: Vec<_> = store
        .configs
        .values()
        .filter(|config| config.project == project)
        .filter(|config| environment.is_none_or(|environment| *environment == config.environment))
        .cloned()
        .collect();
    let (configs, page) = paginate(&configs, &params);
    Ok(ok(json!({ "configs": configs, "page": page })))
}

pub async fn create_config(State(state): State<Shared>, Json(input): Json<CreateConfig>) -> ApiResult {
    let config = state
        .store
        .write()
        .await
        .create_config(&input.project, &input.environment, &input.name)?;
    Ok(ok(json!({ "config": config })))
}

pub async fn get_config(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let config = store.config(required(&params, "project")?, required(&params, "config")?)?;
    Ok(ok(json!({ "config": config })))
}

pub async fn update_config(State(state): State<Shared>, Json(input): Json<RenameConfig>) -> ApiResult {
    let mut store = state.store.write().await;
    let mut config = store.config(&input.project, &input.config)?.clone();
    if config.locked {
        return Err(ApiError::bad_request("Cannot modify a locked config"));
    }
    if config.root {
        return Err(ApiError::bad_request("Cannot rename a root config"));
    }
    if !input.name.starts_with(&format!("{}_", config.environment)) {
        return Err(ApiError::bad_request(format!(
            "Config name must be prefixed with the environment slug: {}_",
            config.environment
        )));
    }

    let old_key = (input.project.clone(), input.config.clone());
    let new_key = (input.project.clone(), input.name.clone());
    store.configs.remove(&old_key);
    if let Some(secrets) = store.secrets.remove(&old_key) {
        store.secrets.insert(new_key.clone(), secrets);
    }
    config.name = input.name;
    store.configs.insert(new_key, config.clone());
    Ok(ok(json!({ "config": config })))
}

pub async fn delete_config(State(state): State<Shared>, Json(input): Json<ConfigRef>) -> ApiResult {
    let mut store = state.store.write().await;
    let config = store.config(&input.project, &input.config)?;
    if config.locked {
        return Err(ApiError::bad_request("Cannot delete a locked config"));
    }
    if config.root {
        return Err(ApiError::bad_request("Cannot delete a root config"));
    }
    let key = (input.project.clone(), input.config.clone());
    store.configs.remove(&key);
    store.secrets.remove(&key);
    Ok(ok(json!({})))
}

async fn set_locked(state: &Shared, input: &ConfigRef, locked: bool) -> ApiResult {
    let mut store = state.store.write().await;
    let config = store.config_mut(&input.project, &input.config)?;
    config.locked = locked;
    let config = config.clone();
    Ok(ok(json!({ "config": config })))
}

pub async fn lock_config(State(state): State<Shared>, Json(input): Json<ConfigRef>) -> ApiResult {
    set_locked(&state, &input, true).await
}

pub async fn unlock_config(State(state): State<Shared>, Json(input): Json<ConfigRef>) -> ApiResult {
    set_locked(&state, &input, false).await
}

pub async fn clone_config(State(state): State<Shared>, Json(input): Json<RenameConfig>) -> ApiResult {
    let mut store = state.store.write().await;
    let environment = store.config(&input.project, &input.config)?.environment.clone();
    let secrets = store.secrets(&input.project, &input.config)?;
    let config = store.create_config(&input.project, &environment, &input.name)?;
    store
        .secrets
        .insert((input.project.clone(), input.name.clone()), secrets);
    Ok(ok(json!({ "config": config })))
}

// --- config logs ---

pub async fn list_config_logs(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let project = required(&params, "project")?;
    let config = required(&params, "config")?;
    store.config(project, config)?;
    let logs: Vec<_> = store
        .config_logs
        .iter()
        .rev()
        .filter(|log| log.project == project && log.config == config)
        .cloned()
        .collect();
    let (logs, page) = paginate(&logs, &params);
    Ok(ok(json!({ "logs": logs, "page": page })))
}

pub async fn get_config_log(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let project = required(&params, "project")?;
    let config = required(&params, "config")?;
    let id = required(&params, "log")?;
    let log = store
        .config_logs
        .iter()
        .find(|log| log.id == id && log.project == project && log.config == config)
        .ok_or_else(|| ApiError::not_found("Could not find requested log"))?;
    Ok(ok(json!({ "config_log": log })))
}

pub async fn rollback_config_log(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let mut store = state.store.write().await;
    let log = store.rollback(
        required(&params, "project")?,
        required(&params, "config")?,
        required(&params, "log")?,
    )?;
    Ok(ok(json!({ "config_log": log })))
}

// --- secrets ---

#[derive(Deserialize)]
pub struct UpdateSecrets {
    pub project: String,
    pub config: String,
    pub secrets: BTreeMap<String, String>,
}

/// The config's secrets plus the computed `DOPPLER_*` entries.
fn secret_values(
    mut values: BTreeMap<String, String>,
    project: &str,
    config: &Config,
) -> BTreeMap<String, String> {
    values.insert("DOPPLER_PROJECT".to_string(), project.to_string());
    values.insert("DOPPLER_ENVIRONMENT".to_string(), config.environment.clone());
    values.insert("DOPPLER_CONFIG".to_string(), config.name.clone());
    values
}

fn as_secret_map(values: &BTreeMap<String, String>) -> Value {
    values
        .iter()
        .map(|(name, value)| (name.clone(), json!({ "raw": value, "computed": value })))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

pub async fn get_secret(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let project = required(&params, "project")?;
    let config = store.config(project, required(&params, "config")?)?;
    let name = required(&params, "name")?;
    let values = secret_values(store.secrets(project, &config.name)?, project, config);
    let value = values
        .get(name)
        .ok_or_else(|| ApiError::not_found("Could not find requested secret"))?;
    Ok(ok(json!({ "name": name, "value": { "raw": value, "computed": value } })))
}

pub async fn list_secrets(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let project = required(&params, "project")?;
    let config = store.config(project, required(&params, "config")?)?;
    let mut values = secret_values(store.secrets(project, &config.name)?, project, config);
    if let Some(names) = params.get("secrets") {
        let wanted: Vec<_> = names.split(',').map(str::trim).collect();
        values.retain(|name, _| wanted.contains(&name.as_str()));
    }
    Ok(ok(json!({ "secrets": as_secret_map(&values) })))
}

pub async fn update_secrets(State(state): State<Shared>, Json(input): Json<UpdateSecrets>) -> ApiResult {
    let mut store = state.store.write().await;
    let secrets = store.update_secrets(&input.project, &input.config, &input.secrets)?;
    let config = store.config(&input.project, &input.config)?;
    let values = secret_values(secrets, &input.project, config);
    Ok(ok(json!({ "secrets": as_secret_map(&values) })))
}

/// Apply one of Doppler's name transformers to an `UPPER_SNAKE` name.
pub fn transform_name(name: &str, transformer: &str) -> Option<String> {
    let words: Vec<String> = name
        .split('_')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect();
    let capitalize = |word: &String| {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        }
    };
    let upper_camel = |words: &[String]| words.iter().map(capitalize).collect::<String>();

    let transformed = match transformer {
        "camel" => match words.split_first() {
            Some((first, rest)) => format!("{first}{}", upper_camel(rest)),
            None => String::new(),
        },
        "upper-camel" => upper_camel(&words),
        "lower-snake" => words.join("_"),
        "lower-kebab" => words.join("-"),
        "tf-var" => format!("TF_VAR_{}", words.join("_")),
        "dotnet" | "dotnet-env" => {
            let separator = if transformer == "dotnet" { ":" } else { "__" };
            name.split("__")
                .map(|segment| {
                    let words: Vec<String> = segment
                        .split('_')
                        .filter(|word| !word.is_empty())
                        .map(str::to_lowercase)
                        .collect();
                    upper_camel(&words)
                })
                .collect::<Vec<_>>()
                .join(separator)
        }
        _ => return None,
    };
    Some(transformed)
}

pub async fn download_secrets(State(state): State<Shared>, Query(params): Params) -> Result<Response, ApiError> {
    let store = state.store.read().await;
    let project = required(&params, "project")?;
    let config = store.config(project, required(&params, "config")?)?;
    let mut values = secret_values(store.secrets(project, &config.name)?, project, config);

    if let Some(transformer) = params.get("name_transformer") {
        values = values
            .into_iter()
            .map(|(name, value)| {
                transform_name(&name, transformer)
                    .map(|name| (name, value))
                    .ok_or_else(|| ApiError::bad_request(format!("Invalid name transformer: {transformer}")))
            })
            .collect::<Result<_, _>>()?;
    }

    let format = params.get("format").map_or("json", String::as_str);
    let lines = |render: fn(&str, &str) -> String| {
        values
            .iter()
            .map(|(name, value)| render(name, value))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let (content_type, body) = match format {
        "json" | "dotnet-json" => ("application/json", json!(values).to_string()),
        "env" => ("text/plain", lines(|name, value| format!("{name}=\"{value}\""))),
        "env-no-quotes" | "docker" => ("text/plain", lines(|name, value| format!("{name}={value}"))),
        "yaml" => ("text/yaml", lines(|name, value| format!("{name}: \"{value}\""))),
        other => return Err(ApiError::bad_request(format!("Invalid format: {other}"))),
    };
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

// --- service tokens ---

#[derive(Deserialize)]
pub struct CreateServiceToken {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub config: String,
    #[serde(default)]
    pub name: String,
    pub access: Option<String>,
    pub expires_at: Option<String>,
}

#[derive(Deserialize)]
pub struct ServiceTokenRef {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub config: String,
    #[serde(default)]
    pub slug: String,
}

pub async fn list_service_tokens(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let project = required(&params, "project")?;
    let config = required(&params, "config")?;
    store.config(project, config)?;
    let tokens: Vec<_> = store
        .tokens
        .iter()
        .filter(|token| token.project == project && token.config == config)
        .map(|token| ServiceToken {
            key: None,
            ..token.clone()
        })
        .collect();
    Ok(ok(json!({ "tokens": tokens })))
}

pub async fn create_service_token(
    State(state): State<Shared>,
    Json(input): Json<CreateServiceToken>,
) -> ApiResult {
    let mut store = state.store.write().await;
    let environment = store.config(&input.project, &input.config)?.environment.clone();
    if input.name.is_empty() {
        return Err(ApiError::bad_request("Token name is required"));
    }
    let access = input.access.unwrap_or_else(|| "read".to_string());
    if access != "read" && access != "read/write" {
        return Err(ApiError::bad_request("Access must be one of: read, read/write"));
    }

    let slug = new_id();
    let token = ServiceToken {
        name: input.name,
        key: Some(format!("dp.st.{}.{slug}", input.config)),
        slug,
        project: input.project,
        environment,
        config: input.config,
        access,
        expires_at: input.expires_at,
        created_at: CREATED_AT.to_string(),
    };
    store.tokens.push(token.clone());
    Ok(ok(json!({ "token": token })))
}

pub async fn delete_service_token(
    State(state): State<Shared>,
    Json(input): Json<ServiceTokenRef>,
) -> ApiResult {
    let mut store = state.store.write().await;
    let position = store
        .tokens
        .iter()
        .position(|token| {
            token.slug == input.slug && token.project == input.project && token.config == input.config
        })
        .ok_or_else(|| ApiError::not_found("Could not find requested service token"))?;
    let token = store.tokens.remove(position);
    if let Some(key) = token.key {
        store.revoked.insert(key);
    }
    Ok(ok(json!({})))
}

// --- dynamic secrets ---

#[derive(Deserialize)]
pub struct IssueLease {
    pub project: String,
    pub config: String,
    pub dynamic_secret: String,
    pub ttl_seconds: i64,
}

#[derive(Deserialize)]
pub struct RevokeLease {
    pub project: String,
    pub config: String,
    pub dynamic_secret: String,
    pub slug: String,
}

pub async fn issue_lease(State(state): State<Shared>, Json(input): Json<IssueLease>) -> ApiResult {
    let mut store = state.store.write().await;
    store.config(&input.project, &input.config)?;
    if input.dynamic_secret.is_empty() {
        return Err(ApiError::bad_request("Missing required parameter: dynamic_secret"));
    }
    if input.ttl_seconds <= 0 {
        return Err(ApiError::bad_request("ttl_seconds must be positive"));
    }

    let lease = Lease {
        slug: new_id(),
        project: input.project,
        config: input.config,
        dynamic_secret: input.dynamic_secret,
        ttl_sec: input.ttl_seconds,
    };
    store.leases.insert(lease.slug.clone(), lease.clone());
    Ok(ok(json!({
        "slug": lease.slug,
        "ttl_sec": lease.ttl_sec,
        "value": { "username": format!("lease-{}", lease.slug), "password": new_id() },
    })))
}

/// Answers with an empty 204, like the real endpoint.
pub async fn revoke_lease(State(state): State<Shared>, Json(input): Json<RevokeLease>) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().await;
    let matches = store.leases.get(&input.slug).is_some_and(|lease| {
        lease.project == input.project
            && lease.config == input.config
            && lease.dynamic_secret == input.dynamic_secret
    });
    if !matches {
        return Err(ApiError::not_found("Could not find requested lease"));
    }
    store.leases.remove(&input.slug);
    Ok(StatusCode::NO_CONTENT)
}

// --- share ---

#[derive(Deserialize)]
pub struct SharePlain {
    pub secret: String,
    pub expire_views: Option<i32>,
    pub expire_days: Option<i32>,
}

#[derive(Deserialize)]
pub struct ShareEncrypted {
    pub encrypted_secret: String,
    pub hashed_password: String,
    pub encryption_kdf: String,
    pub encryption_salt_rounds: i32,
    pub expire_views: Option<i32>,
    pub expire_days: Option<i32>,
}

fn check_expiry(views: Option<i32>, days: Option<i32>) -> Result<(), ApiError> {
    if let Some(views) = views {
        if views != -1 && !(1..=50).contains(&views) {
            return Err(ApiError::bad_request("expire_views must be between 1 and 50, or -1"));
        }
    }
    if let Some(days) = days {
        if !(1..=90).contains(&days) {
            return Err(ApiError::bad_request("expire_days must be between 1 and 90"));
        }
    }
    Ok(())
}

pub async fn share_plain(Json(input): Json<SharePlain>) -> ApiResult {
    if input.secret.is_empty() {
        return Err(ApiError::bad_request("Missing required parameter: secret"));
    }
    check_expiry(input.expire_views, input.expire_days)?;
    let id = new_id();
    let password = new_id();
    Ok(ok(json!({
        "url": format!("https://share.doppler.com/s/{id}"),
        "authenticated_url": format!("https://share.doppler.com/s/{id}#{password}"),
        "password": password,
    })))
}

pub async fn share_encrypted(Json(input): Json<ShareEncrypted>) -> ApiResult {
    if input.encrypted_secret.is_empty() || input.hashed_password.is_empty() {
        return Err(ApiError::bad_request("Missing encrypted secret or password hash"));
    }
    if input.encryption_kdf != "pbkdf2" || input.encryption_salt_rounds != 100_000 {
        return Err(ApiError::bad_request("Unsupported key derivation parameters"));
    }
    check_expiry(input.expire_views, input.expire_days)?;
    Ok(ok(json!({ "url": format!("https://share.doppler.com/s/{}", new_id()) })))
}

// --- workplace and audit ---

#[derive(Deserialize)]
pub struct UpdateWorkplace {
    pub name: Option<String>,
    pub billing_email: Option<String>,
}

pub async fn get_workplace(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let workplace = &store.workplace;
    let mut body = json!({
        "id": workplace.id,
        "name": workplace.name,
        "billing_email": workplace.billing_email,
    });
    if flag(&params, "settings") {
        body["saml_enabled"] = Value::Bool(workplace.saml_enabled);
        body["scim_enabled"] = Value::Bool(workplace.scim_enabled);
    }
    Ok(ok(json!({ "workplace": body })))
}

pub async fn update_workplace(State(state): State<Shared>, Json(input): Json<UpdateWorkplace>) -> ApiResult {
    let mut store = state.store.write().await;
    if let Some(name) = input.name {
        store.workplace.name = name;
    }
    if let Some(billing_email) = input.billing_email {
        if !billing_email.contains('@') {
            return Err(ApiError::bad_request("Invalid billing email"));
        }
        store.workplace.billing_email = billing_email;
    }
    Ok(ok(json!({ "workplace": store.workplace })))
}

pub async fn list_workplace_users(State(state): State<Shared>) -> ApiResult {
    let store = state.store.read().await;
    Ok(ok(json!({ "workplace_users": store.members })))
}

pub async fn get_workplace_user(State(state): State<Shared>, Path(id): Path<String>) -> ApiResult {
    let store = state.store.read().await;
    let member = store
        .members
        .iter()
        .find(|member| member.id == id)
        .ok_or_else(|| ApiError::not_found("Could not find requested workplace user"))?;
    Ok(ok(json!({ "workplace_user": member })))
}

// --- activity logs ---

pub async fn list_activity_logs(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let logs: Vec<_> = store.activity_logs.iter().rev().cloned().collect();
    let (logs, page) = paginate(&logs, &params);
    Ok(ok(json!({ "logs": logs, "page": page })))
}

pub async fn get_activity_log(State(state): State<Shared>, Query(params): Params) -> ApiResult {
    let store = state.store.read().await;
    let id = required(&params, "log")?;
    let log = store
        .activity_logs
        .iter()
        .find(|log| log.id == id)
        .ok_or_else(|| ApiError::not_found("Could not find requested log"))?;
    Ok(ok(json!({ "log": log })))
}

// --- auth ---

#[derive(Deserialize)]
pub struct TokenRef {
    pub token: String,
}

pub async fn revoke_tokens(State(state): State<Shared>, Json(tokens): Json<Vec<TokenRef>>) -> ApiResult {
    if tokens.is_empty() {
        return Err(ApiError::bad_request("No tokens were provided"));
    }
    let mut store = state.store.write().await;
    store.revoked.extend(tokens.into_iter().map(|token| token.token));
    Ok(ok(json!({})))
}
