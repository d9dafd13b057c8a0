//! Records held by the mock and the rules Doppler applies to them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ApiError;

/// Timestamp stamped on every record the mock creates.
pub const CREATED_AT: &str = "2024-01-01T00:00:00.000Z";

/// Environments and root configs seeded into every new project.
pub const DEFAULT_ENVIRONMENTS: [(&str, &str); 3] = [
    ("dev", "Development"),
    ("stg", "Staging"),
    ("prd", "Production"),
];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub project: String,
    pub initial_fetch_at: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub name: String,
    pub project: String,
    pub environment: String,
    pub root: bool,
    pub locked: bool,
    pub initial_fetch_at: Option<String>,
    pub last_fetch_at: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceToken {
    pub name: String,
    pub slug: String,
    /// Only shown in the create response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub project: String,
    pub environment: String,
    pub config: String,
    pub access: String,
    pub expires_at: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogDiff {
    pub name: String,
    pub added: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConfigLog {
    pub id: String,
    pub text: String,
    pub html: String,
    pub diff: Vec<LogDiff>,
    pub rollback: bool,
    pub user: User,
    pub project: String,
    pub environment: String,
    pub config: String,
    pub created_at: String,
    /// Secrets as they were before this change.
    #[serde(skip)]
    pub previous: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActivityLog {
    pub id: String,
    pub text: String,
    pub html: String,
    pub user: User,
    pub project: Option<String>,
    pub environment: Option<String>,
    pub config: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: String,
    pub name: String,
    pub username: String,
    pub profile_image_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkplaceUser {
    pub id: String,
    pub access: String,
    pub user: User,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workplace {
    pub id: String,
    pub name: String,
    pub billing_email: String,
    #[serde(skip)]
    pub saml_enabled: bool,
    #[serde(skip)]
    pub scim_enabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lease {
    pub slug: String,
    pub project: String,
    pub config: String,
    pub dynamic_secret: String,
    pub ttl_sec: i64,
}

/// The user every API key belongs to.
pub fn owner() -> User {
    User {
        email: "owner@example.com".to_string(),
        name: "Workplace Owner".to_string(),
        username: "owner".to_string(),
        profile_image_url: "https://example.com/owner.png".to_string(),
    }
}

#[derive(Debug)]
pub struct Store {
    pub projects: BTreeMap<String, Project>,
    pub environments: BTreeMap<(String, String), Environment>,
    pub configs: BTreeMap<(String, String), Config>,
    pub secrets: BTreeMap<(String, String), BTreeMap<String, String>>,
    pub tokens: Vec<ServiceToken>,
    pub config_logs: Vec<ConfigLog>,
    pub activity_logs: Vec<ActivityLog>,
    pub leases: BTreeMap<String, Lease>,
    pub workplace: Workplace,
    pub members: Vec<WorkplaceUser>,
    /// Keys passed to the revoke endpoint; the auth layer rejects them.
    pub revoked: BTreeSet<String>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            projects: BTreeMap::new(),
            environments: BTreeMap::new(),
            configs: BTreeMap::new(),
            secrets: BTreeMap::new(),
            tokens: Vec::new(),
            config_logs: Vec::new(),
            activity_logs: Vec::new(),
            leases: BTreeMap::new(),
            workplace: Workplace {
                id: "wp_mock".to_string(),
                name: "Mock Workplace".to_string(),
                billing_email: "billing@example.com".to_string(),
                saml_enabled: false,
                scim_enabled: false,
            },
            members: vec![WorkplaceUser {
                id: "usr_owner".to_string(),
                access: "owner".to_string(),
                user: owner(),
                created_at: CREATED_AT.to_string(),
            }],
            revoked: BTreeSet::new(),
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn key(project: &str, name: &str) -> (String, String) {
    (project.to_string(), name.to_string())
}

/// Lowercase, dash-separated form of a display name.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

impl Store {
    pub fn project(&self, slug: &str) -> Result<&Project, ApiError> {
        self.projects
            .get(slug)
            .ok_or_else(|| ApiError::not_found("Could not find requested project"))
    }

    pub fn create_project(&mut self, name: &str, description: &str) -> Result<Project, ApiError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(ApiError::bad_request("Project name is required"));
        }
        if self.projects.contains_key(&slug) {
            return Err(ApiError::bad_request("A project with this name already exists"));
        }

        let project = Project {
            id: slug.clone(),
            name: name.to_string(),
            slug: slug.clone(),
            description: description.to_string(),
            created_at: CREATED_AT.to_string(),
        };
        self.projects.insert(slug.clone(), project.clone());

        for (env_slug, env_name) in DEFAULT_ENVIRONMENTS {
            self.insert_environment(&slug, env_slug, env_name);
        }
        self.log_activity(&format!("Created project {name}"), Some(&slug), None, None);
        Ok(project)
    }

    pub fn delete_project(&mut self, slug: &str) -> Result<(), ApiError> {
        self.projects
            .remove(slug)
            .ok_or_else(|| ApiError::not_found("Could not find requested project"))?;
        self.environments.retain(|(project, _), _| project != slug);
        self.configs.retain(|(project, _), _| project != slug);
        self.secrets.retain(|(project, _), _| project != slug);
        self.tokens.retain(|token| token.project != slug);
        self.log_activity(&format!("Deleted project {slug}"), Some(slug), None, None);
        Ok(())
    }

    pub fn environment(&self, project: &str, slug: &str) -> Result<&Environment, ApiError> {
        self.project(project)?;
        self.environments
            .get(&key(project, slug))
            .ok_or_else(|| ApiError::not_found("Could not find requested environment"))
    }

    /// Insert an environment and its root config.
    pub fn insert_environment(&mut self, project: &str, slug: &str, name: &str) -> Environment {
        let environment = Environment {
            id: slug.to_string(),
            slug: slug.to_string(),
            name: name.to_string(),
            project: project.to_string(),
            initial_fetch_at: None,
            created_at: CREATED_AT.to_string(),
        };
        self.environments
            .insert(key(project, slug), environment.clone());
        self.configs.insert(
            key(project, slug),
            Config {
                name: slug.to_string(),
                project: project.to_string(),
                environment: slug.to_string(),
                root: true,
                locked: false,
                initial_fetch_at: None,
                last_fetch_at: None,
                created_at: CREATED_AT.to_string(),
            },
        );
        environment
    }

    pub fn config(&self, project: &str, name: &str) -> Result<&Config, ApiError> {
        self.project(project)?;
        self.configs
            .get(&key(project, name))
            .ok_or_else(|| ApiError::not_found("Could not find requested config"))
    }

    pub fn config_mut(&mut self, project: &str, name: &str) -> Result<&mut Config, ApiError> {
        self.project(project)?;
        self.configs
            .get_mut(&key(project, name))
            .ok_or_else(|| ApiError::not_found("Could not find requested config"))
    }

    /// Branch configs are named after their environment: `<env>_<suffix>`.
    pub fn create_config(&mut self, project: &str, environment: &str, name: &str) -> Result<Config, ApiError> {
        self.environment(project, environment)?;
        if !name.starts_with(&format!("{environment}_")) {
            return Err(ApiError::bad_request(format!(
                "Config name must be prefixed with the environment slug: {environment}_"
            )));
        }
        if self.configs.contains_key(&key(project, name)) {
            return Err(ApiError::bad_request("A config with this name already exists"));
        }

        let config = Config {
            name: name.to_string(),
            project: project.to_string(),
            environment: environment.to_string(),
            root: false,
            locked: false,
            initial_fetch_at: None,
            last_fetch_at: None,
            created_at: CREATED_AT.to_string(),
        };
        self.configs.insert(key(project, name), config.clone());
        self.log_activity(
            &format!("Created config {name}"),
            Some(project),
            Some(environment),
            Some(name),
        );
        Ok(config)
    }

    pub fn secrets(&self, project: &str, config: &str) -> Result<BTreeMap<String, String>, ApiError> {
        self.config(project, config)?;
        Ok(self
            .secrets
            .get(&key(project, config))
            .cloned()
            .unwrap_or_default())
    }

    /// Merge `changes` into the config's secrets and log the change.
    pub fn update_secrets(
        &mut self,
        project: &str,
        config: &str,
        changes: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, ApiError> {
        let environment = self.config(project, config)?.environment.clone();
        if changes.is_empty() {
            return Err(ApiError::bad_request("No secrets were provided"));
        }

        let previous = self.secrets(project, config)?;
        let mut current = previous.clone();
        current.extend(changes.clone());
        self.secrets.insert(key(project, config), current.clone());

        let names: Vec<_> = changes.keys().cloned().collect();
        let text = format!("Updated secrets {}", names.join(", "));
        self.config_logs.push(ConfigLog {
            id: new_id(),
            html: format!("<p>{text}</p>"),
            text: text.clone(),
            diff: changes
                .iter()
                .map(|(name, value)| LogDiff {
                    name: name.clone(),
                    added: value.clone(),
                })
                .collect(),
            rollback: false,
            user: owner(),
            project: project.to_string(),
            environment: environment.clone(),
            config: config.to_string(),
            created_at: CREATED_AT.to_string(),
            previous,
        });
        self.log_activity(&text, Some(project), Some(&environment), Some(config));
        Ok(current)
    }

    /// Restore the secrets from before the given log entry.
    pub fn rollback(&mut self, project: &str, config: &str, log: &str) -> Result<ConfigLog, ApiError> {
        let entry = self
            .config_logs
            .iter()
            .find(|entry| entry.id == log && entry.project == project && entry.config == config)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Could not find requested log"))?;

        let current = self.secrets(project, config)?;
        self.secrets
            .insert(key(project, config), entry.previous.clone());

        let text = format!("Rolled back {}", entry.id);
        let rollback = ConfigLog {
            id: new_id(),
            html: format!("<p>{text}</p>"),
            text,
            diff: Vec::new(),
            rollback: true,
            user: owner(),
            previous: current,
            created_at: CREATED_AT.to_string(),
            ..entry
        };
        self.config_logs.push(rollback.clone());
        Ok(rollback)
    }

    pub fn log_activity(
        &mut self,
        text: &str,
        project: Option<&str>,
        environment: Option<&str>,
        config: Option<&str>,
    ) {
        self.activity_logs.push(ActivityLog {
            id: new_id(),
            text: text.to_string(),
            html: format!("<p>{text}</p>"),
            user: owner(),
            project: project.map(str::to_string),
            environment: environment.map(str::to_string),
            config: config.map(str::to_string),
            created_at: CREATED_AT.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Backend API"), "backend-api");
        assert_eq!(slugify("  web__app "), "web__app");
        assert_eq!(slugify("!!"), "");
    }

    #[test]
    fn new_project_seeds_default_environments() {
        let mut store = Store::default();
        store.create_project("Backend", "").unwrap();
        for (slug, _) in DEFAULT_ENVIRONMENTS {
            assert!(store.environment("backend", slug).is_ok());
            assert!(store.config("backend", slug).unwrap().root);
        }
        assert!(store.create_project("backend", "").is_err());
    }

    #[test]
    fn branch_configs_need_environment_prefix() {
        let mut store = Store::default();
        store.create_project("backend", "").unwrap();
        assert!(store.create_config("backend", "dev", "dev_personal").is_ok());
        let err = store.create_config("backend", "dev", "personal").unwrap_err();
        assert!(err.messages[0].contains("prefixed"));
    }

    #[test]
    fn rollback_restores_previous_secrets() {
        let mut store = Store::default();
        store.create_project("backend", "").unwrap();
        let first = BTreeMap::from([("A".to_string(), "1".to_string())]);
        store.update_secrets("backend", "dev", &first).unwrap();
        let second = BTreeMap::from([("A".to_string(), "2".to_string())]);
        store.update_secrets("backend", "dev", &second).unwrap();

        let log = store.config_logs[1].id.clone();
        let entry = store.rollback("backend", "dev", &log).unwrap();
        assert!(entry.rollback);
        assert_eq!(store.secrets("backend", "dev").unwrap()["A"], "1");
    }
}
