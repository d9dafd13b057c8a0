//! Process-wide defaults used by the resource modules' convenience functions.
//!
//! Set these once at start-up, before the first call. Code that needs
//! different keys or backends side by side should build `Backend` and resource
//! `Client` values explicitly instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::SDK_VERSION;

static KEY: RwLock<String> = RwLock::new(String::new());
static VALIDATION_ENABLED: AtomicBool = AtomicBool::new(true);
static APP_INFO: RwLock<Option<AppInfo>> = RwLock::new(None);
static USER_AGENT: LazyLock<RwLock<String>> = LazyLock::new(|| RwLock::new(compose_user_agent(None)));

/// The application this integration belongs to, advertised in the User-Agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub url: String,
    pub version: String,
}

impl AppInfo {
    /// `name[/version][ (url)]`
    pub fn format_user_agent(&self) -> String {
        let mut user_agent = self.name.clone();
        if !self.version.is_empty() {
            user_agent.push('/');
            user_agent.push_str(&self.version);
        }
        if !self.url.is_empty() {
            user_agent.push_str(" (");
            user_agent.push_str(&self.url);
            user_agent.push(')');
        }
        user_agent
    }
}

fn compose_user_agent(info: Option<&AppInfo>) -> String {
    let mut user_agent = format!("doppler-go/{SDK_VERSION}");
    if let Some(info) = info {
        user_agent.push(' ');
        user_agent.push_str(&info.format_user_agent());
    }
    user_agent
}

/// Set the API key used by `Client::default()` in every resource module.
pub fn set_key(key: impl Into<String>) {
    *KEY.write().unwrap_or_else(PoisonError::into_inner) = key.into();
}

pub fn key() -> String {
    KEY.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Turn payload validation on or off for every backend. On by default.
pub fn set_validation_enabled(enabled: bool) {
    VALIDATION_ENABLED.store(enabled, Ordering::SeqCst);
}

pub fn validation_enabled() -> bool {
    VALIDATION_ENABLED.load(Ordering::SeqCst)
}

/// Set or clear the application info and recompose the User-Agent.
///
/// # Panics
///
/// Panics if `info` is `Some` with an empty name.
pub fn set_app_info(info: Option<AppInfo>) {
    if let Some(info) = &info {
        assert!(!info.name.is_empty(), "app info name must not be empty");
    }

    let user_agent = compose_user_agent(info.as_ref());
    *APP_INFO.write().unwrap_or_else(PoisonError::into_inner) = info;
    *USER_AGENT.write().unwrap_or_else(PoisonError::into_inner) = user_agent;
}

pub fn app_info() -> Option<AppInfo> {
    APP_INFO.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// The User-Agent sent with every request.
pub fn user_agent() -> String {
    USER_AGENT.read().unwrap_or_else(PoisonError::into_inner).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_user_agent_variants() {
        let full = AppInfo {
            name: "doppler".to_string(),
            version: "0.1.0".to_string(),
            url: "https://example.com".to_string(),
        };
        assert_eq!(full.format_user_agent(), "doppler/0.1.0 (https://example.com)");

        let no_url = AppInfo {
            url: String::new(),
            ..full.clone()
        };
        assert_eq!(no_url.format_user_agent(), "doppler/0.1.0");

        let name_only = AppInfo {
            name: "doppler".to_string(),
            ..Default::default()
        };
        assert_eq!(name_only.format_user_agent(), "doppler");
    }

    #[test]
    fn compose_prefixes_sdk_version() {
        assert_eq!(compose_user_agent(None), format!("doppler-go/{SDK_VERSION}"));
        let info = AppInfo {
            name: "deployer".to_string(),
            version: "2.1".to_string(),
            ..Default::default()
        };
        assert_eq!(
            compose_user_agent(Some(&info)),
            format!("doppler-go/{SDK_VERSION} deployer/2.1")
        );
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_app_name_panics() {
        set_app_info(Some(AppInfo {
            version: "0.1.0".to_string(),
            ..Default::default()
        }));
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_app_info_panics() {
        set_app_info(Some(AppInfo::default()));
    }
}
