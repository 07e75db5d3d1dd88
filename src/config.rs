//! Typed configuration sections.
//!
//! Each section is read out of the [`ConfigStore`](crate::configuration::ConfigStore)
//! by name, so `session.toml` feeds [`SessionConfig`] and so on. Every field carries a
//! serde default, which means a missing file simply yields the defaults below.

use crate::configuration::ConfigStore;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Secret used when `application.key` is left unset
pub const DEFAULT_APPLICATION_KEY: &str = "PleaseReplaceWithSecretKey!";

/// Longest accepted `session.lifetime`, 400 days
pub const MAX_SESSION_LIFETIME: u64 = 400 * 24 * 60 * 60;

/// Environment type for configuration overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Get environment from string
    pub fn from_name(env: &str) -> Self {
        match env.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Suffix used for overlay files (`session.prod.toml`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "dev",
            Environment::Production => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// All typed sections the framework itself reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub views: ViewConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Secret the session and cookie cipher derives its key from
    #[serde(default = "default_key")]
    pub key: String,

    /// URL prefix the application is mounted under
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub errors: ErrorsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorsConfig {
    /// Include failure details in error responses
    #[serde(default)]
    pub display: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// `native`, `cookie` or `database`
    #[serde(default = "default_session_driver")]
    pub driver: String,

    /// Seconds a stored value stays valid
    #[serde(default = "default_session_lifetime")]
    pub lifetime: u64,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_sessions_table")]
    pub table: String,

    #[serde(default)]
    pub secure: bool,

    #[serde(default = "default_same_site")]
    pub same_site: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_views_dir")]
    pub directory: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default)]
    pub cache_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_key() -> String {
    DEFAULT_APPLICATION_KEY.to_string()
}
fn default_base_path() -> String {
    "/".to_string()
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_session_driver() -> String {
    "native".to_string()
}
fn default_session_lifetime() -> u64 {
    3600
}
fn default_cookie_name() -> String {
    "base_session".to_string()
}
fn default_sessions_table() -> String {
    "sessions".to_string()
}
fn default_same_site() -> String {
    "Lax".to_string()
}
fn default_max_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_views_dir() -> String {
    "views".to_string()
}
fn default_extension() -> String {
    "html".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            base_path: default_base_path(),
            timezone: default_timezone(),
            errors: ErrorsConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            driver: default_session_driver(),
            lifetime: default_session_lifetime(),
            cookie_name: default_cookie_name(),
            table: default_sessions_table(),
            secure: false,
            same_site: default_same_site(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            directory: default_views_dir(),
            extension: default_extension(),
            cache_enabled: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Read every framework section out of a loaded store
    pub fn from_store(store: &ConfigStore) -> Result<Self> {
        let mut config = Self {
            application: store.section("application")?,
            session: store.section("session")?,
            database: store.section("database")?,
            views: store.section("views")?,
            server: store.section("server")?,
        };

        if config.application.key == DEFAULT_APPLICATION_KEY {
            log::warn!("application.key is still the default secret; set a real one");
        }
        if config.session.lifetime > MAX_SESSION_LIFETIME {
            log::warn!(
                "session.lifetime {} exceeds {}, clamping",
                config.session.lifetime,
                MAX_SESSION_LIFETIME
            );
            config.session.lifetime = MAX_SESSION_LIFETIME;
        }

        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_sections_missing() {
        let store = ConfigStore::from_value(json!({}));
        let config = AppConfig::from_store(&store).unwrap();

        assert_eq!(config.session.driver, "native");
        assert_eq!(config.session.lifetime, 3600);
        assert_eq!(config.views.extension, "html");
        assert_eq!(config.application.base_path, "/");
        assert_eq!(config.database.max_connections, 1);
        assert!(!config.application.errors.display);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let store = ConfigStore::from_value(json!({
            "session": { "driver": "cookie", "lifetime": 60 },
            "server": { "port": 9000 }
        }));
        let config = AppConfig::from_store(&store).unwrap();

        assert_eq!(config.session.driver, "cookie");
        assert_eq!(config.session.lifetime, 60);
        assert_eq!(config.session.cookie_name, "base_session");
        assert_eq!(config.server_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_session_lifetime_is_clamped() {
        let store = ConfigStore::from_value(json!({
            "session": { "lifetime": u64::MAX }
        }));
        let config = AppConfig::from_store(&store).unwrap();

        assert_eq!(config.session.lifetime, MAX_SESSION_LIFETIME);
    }

    #[test]
    fn test_environment_names() {
        assert_eq!(Environment::from_name("PROD"), Environment::Production);
        assert_eq!(Environment::from_name("staging"), Environment::Development);
        assert_eq!(Environment::Production.as_str(), "prod");
    }
}
