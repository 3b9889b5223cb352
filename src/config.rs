//! Application-level configuration loading: avatar catalog, locale and admin secrets.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "EAT_RACE_CONFIG_PATH";
const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";
const ADMIN_SESSION_TOKEN_ENV: &str = "ADMIN_SESSION_TOKEN";
const APP_ENV: &str = "APP_ENV";

/// Display language of the room frontends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Locale {
    /// Brazilian Portuguese.
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    /// English.
    #[serde(rename = "en")]
    En,
}

/// Secrets and cookie flags used by the admin session gate.
#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    /// Shared admin password; the console is closed when unset.
    pub password: Option<String>,
    /// Explicit cookie value; defaults to the SHA-256 hex of the password.
    pub session_token: Option<String>,
    /// Emit the `Secure` cookie attribute.
    pub secure_cookie: bool,
}

impl AdminConfig {
    /// Read the admin secrets from the process environment.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            password: non_empty(ADMIN_PASSWORD_ENV),
            session_token: non_empty(ADMIN_SESSION_TOKEN_ENV),
            secure_cookie: env::var(APP_ENV)
                .map(|value| value.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    avatars: Vec<String>,
    exclusive_avatars: Vec<String>,
    locale: Locale,
    enforce_exclusive_avatars: bool,
    admin: AdminConfig,
}

impl AppConfig {
    /// Load the configuration file, falling back to built-in defaults, then read admin
    /// secrets from the environment.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        avatars = app_config.avatars.len(),
                        exclusive_avatars = app_config.exclusive_avatars.len(),
                        locale = ?app_config.locale,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        let admin = AdminConfig::from_env();
        if admin.password.is_none() {
            warn!("{ADMIN_PASSWORD_ENV} is not set; the admin console rejects every login");
        }
        config.with_admin(admin)
    }

    /// Replace the admin secrets.
    pub fn with_admin(mut self, admin: AdminConfig) -> Self {
        self.admin = admin;
        self
    }

    /// Toggle ownership checks on exclusive avatars.
    pub fn with_enforced_exclusive_avatars(mut self, enforce: bool) -> Self {
        self.enforce_exclusive_avatars = enforce;
        self
    }

    /// Regular avatars anyone may pick.
    pub fn avatars(&self) -> &[String] {
        &self.avatars
    }

    /// Avatars unlocked through codes.
    pub fn exclusive_avatars(&self) -> &[String] {
        &self.exclusive_avatars
    }

    /// Language the frontends render in.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Whether exclusive avatars require a grant.
    pub fn enforce_exclusive_avatars(&self) -> bool {
        self.enforce_exclusive_avatars
    }

    /// Admin session settings.
    pub fn admin(&self) -> &AdminConfig {
        &self.admin
    }

    /// Whether `avatar` is part of the regular catalog.
    pub fn is_catalog_avatar(&self, avatar: &str) -> bool {
        self.avatars.iter().any(|candidate| candidate == avatar)
    }

    /// Whether `avatar` is one of the exclusive avatars.
    pub fn is_exclusive_avatar(&self, avatar: &str) -> bool {
        self.exclusive_avatars
            .iter()
            .any(|candidate| candidate == avatar)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            avatars: to_owned_list(DEFAULT_AVATARS),
            exclusive_avatars: to_owned_list(DEFAULT_EXCLUSIVE_AVATARS),
            locale: Locale::default(),
            enforce_exclusive_avatars: false,
            admin: AdminConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    avatars: Option<Vec<String>>,
    #[serde(default)]
    exclusive_avatars: Option<Vec<String>>,
    #[serde(default)]
    locale: Locale,
    #[serde(default)]
    enforce_exclusive_avatars: bool,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            avatars: value
                .avatars
                .unwrap_or_else(|| to_owned_list(DEFAULT_AVATARS)),
            exclusive_avatars: value
                .exclusive_avatars
                .unwrap_or_else(|| to_owned_list(DEFAULT_EXCLUSIVE_AVATARS)),
            locale: value.locale,
            enforce_exclusive_avatars: value.enforce_exclusive_avatars,
            admin: AdminConfig::default(),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

/// Built-in avatar catalog shipped with the binary.
const DEFAULT_AVATARS: &[&str] = &[
    "chef", "panda", "tiger", "robot", "astronaut", "ninja", "cat", "dog", "fox", "octopus",
];

const DEFAULT_EXCLUSIVE_AVATARS: &[&str] = &["golden-fork", "dragon", "crown"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_split_catalog_and_exclusive_avatars() {
        let config = AppConfig::default();
        assert!(config.is_catalog_avatar("chef"));
        assert!(!config.is_catalog_avatar("dragon"));
        assert!(config.is_exclusive_avatar("dragon"));
        assert!(!config.enforce_exclusive_avatars());
        assert_eq!(config.locale(), Locale::PtBr);
    }

    #[test]
    fn raw_config_keeps_defaults_for_missing_lists() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"locale":"en","exclusive_avatars":["unicorn"]}"#)
                .expect("parse raw config");
        let config: AppConfig = raw.into();
        assert_eq!(config.locale(), Locale::En);
        assert!(config.is_exclusive_avatar("unicorn"));
        assert!(!config.is_exclusive_avatar("dragon"));
        assert!(config.is_catalog_avatar("panda"));
    }
}
