//! Configuration store with dot-notation access
//!
//! Configuration lives in TOML files inside one directory. Loading a name reads
//! `<dir>/<name>.toml` (dots in the name become sub-directories) and nests the file's
//! table under that name, so every value is reachable by a dotted path.
//!
//! # Usage
//! ```rust,ignore
//! use base::configuration::ConfigStore;
//!
//! let mut store = ConfigStore::new("config");
//! store.load_all(&["application", "session"])?;
//!
//! let lifetime = store.get_int("session.lifetime").unwrap_or(3600);
//! let driver = store.get_or("session.driver", "native".to_string());
//! ```
//!
//! The store is built once at startup and handed to the application explicitly;
//! there is no global instance.

use crate::config::Environment;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Loaded configuration tree
#[derive(Debug, Clone)]
pub struct ConfigStore {
    directory: PathBuf,
    environment: Option<Environment>,
    json: Value,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new("config")
    }
}

impl ConfigStore {
    /// Create an empty store reading files from `directory`
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            environment: None,
            json: Value::Object(Map::new()),
        }
    }

    /// Create a store directly from a JSON tree (no backing directory)
    pub fn from_value(json: Value) -> Self {
        let json = match json {
            Value::Object(_) => json,
            _ => Value::Object(Map::new()),
        };

        Self {
            directory: PathBuf::from("config"),
            environment: None,
            json,
        }
    }

    /// Merge `<name>.<env>.toml` overlays on top of every file loaded afterwards
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Load several configuration files in order
    pub fn load_all(&mut self, names: &[&str]) -> Result<()> {
        for name in names {
            self.load(name)?;
        }
        Ok(())
    }

    /// Load one configuration file by dotted name
    ///
    /// A missing file is not an error: lookups under that name fall back to their
    /// defaults. Top-level keys that are already present are left untouched, so the
    /// first file to define a key wins.
    pub fn load(&mut self, name: &str) -> Result<()> {
        let path = self.file_path(name, None);
        if !path.exists() {
            log::debug!("Config file '{}' not found, skipping", path.display());
            return Ok(());
        }

        #[allow(unused_mut)]
        let mut value = Self::load_toml_value(&path)?;

        if let Some(env) = self.environment.clone() {
            let overlay_path = self.file_path(name, Some(env.as_str()));
            if overlay_path.exists() {
                log::debug!(
                    "Loading environment-specific config from: {}",
                    overlay_path.display()
                );
                let overlay = Self::load_toml_value(&overlay_path)?;

                #[cfg(feature = "config")]
                {
                    value = serde_toml_merge::merge(value, overlay).map_err(|e| {
                        Error::config(format!("Failed to merge '{}': {}", name, e))
                    })?;
                }

                #[cfg(not(feature = "config"))]
                {
                    let _ = overlay;
                    log::warn!("Config feature not enabled, skipping overlay for '{}'", name);
                }
            }
        }

        let json = serde_json::to_value(&value)
            .map_err(|e| Error::config(format!("Failed to convert '{}': {}", name, e)))?;

        self.merge_missing(nest_path(name, json));
        log::debug!("Loaded configuration '{}' from {}", name, path.display());
        Ok(())
    }

    fn file_path(&self, name: &str, env: Option<&str>) -> PathBuf {
        let relative = name.replace('.', "/");
        match env {
            Some(env) => self.directory.join(format!("{}.{}.toml", relative, env)),
            None => self.directory.join(format!("{}.toml", relative)),
        }
    }

    fn load_toml_value(path: &Path) -> Result<toml::Value> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    fn merge_missing(&mut self, incoming: Value) {
        let (Value::Object(target), Value::Object(incoming)) = (&mut self.json, incoming) else {
            return;
        };

        for (key, value) in incoming {
            if target.contains_key(&key) {
                log::debug!("Config key '{}' already loaded, keeping first value", key);
                continue;
            }
            target.insert(key, value);
        }
    }

    /// Get a configuration value by dot-notation path
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.json, path)
    }

    /// Get a typed value, or `default` when the path is missing or has another type
    pub fn get_or<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.get(path)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(default)
    }

    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path).and_then(|v| v.as_str()).map(str::to_string)
    }

    /// Handles both signed and unsigned numbers
    pub fn get_int(&self, path: &str) -> Option<i64> {
        match self.get(path)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_u64().map(|u| u as i64)),
            _ => None,
        }
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// The whole configuration tree
    pub fn all(&self) -> &Value {
        &self.json
    }

    /// Deserialize a section, falling back to `T::default()` when it is absent
    pub fn section<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        match self.get(name) {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                Error::config(format!("Failed to deserialize section '{}': {}", name, e))
            }),
            None => Ok(T::default()),
        }
    }
}

/// Walk a JSON tree by a dot-separated path
pub fn lookup_path<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = obj;

    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            _ => return None,
        }
    }

    Some(current)
}

/// Wrap `value` in one object per path segment: `nest_path("a.b", v)` is `{a: {b: v}}`
pub fn nest_path(path: &str, value: Value) -> Value {
    path.rsplit('.').fold(value, |inner, key| {
        let mut map = Map::new();
        map.insert(key.to_string(), inner);
        Value::Object(map)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_dotted_lookup_with_default() {
        let store = ConfigStore::from_value(json!({"session": {"lifetime": 3600}}));

        assert_eq!(store.get_int("session.lifetime"), Some(3600));
        assert_eq!(store.get("session.missing"), None);
        assert_eq!(store.get_or("session.missing", 42), 42);
        assert!(!store.has("session.lifetime.deeper"));
    }

    #[test]
    fn test_nest_path() {
        assert_eq!(
            nest_path("admin.users", json!({"per_page": 10})),
            json!({"admin": {"users": {"per_page": 10}}})
        );
        assert_eq!(nest_path("app", json!(1)), json!({"app": 1}));
    }

    #[test]
    fn test_load_files_under_their_names() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "session.toml", "driver = \"cookie\"\nlifetime = 60\n");
        write(dir.path(), "admin/users.toml", "per_page = 25\n");

        let mut store = ConfigStore::new(dir.path());
        store.load_all(&["session", "admin.users", "missing"]).unwrap();

        assert_eq!(store.get_string("session.driver"), Some("cookie".to_string()));
        assert_eq!(store.get_int("session.lifetime"), Some(60));
        assert_eq!(store.get_int("admin.users.per_page"), Some(25));
        assert!(!store.has("missing"));
    }

    #[test]
    fn test_first_loaded_key_wins() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "admin/users.toml", "per_page = 25\n");
        write(dir.path(), "admin/roles.toml", "default = \"editor\"\n");

        let mut store = ConfigStore::new(dir.path());
        store.load("admin.users").unwrap();
        store.load("admin.roles").unwrap();

        assert!(store.has("admin.users.per_page"));
        assert!(!store.has("admin.roles"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.toml", "this is = = not toml");

        let mut store = ConfigStore::new(dir.path());
        assert!(matches!(store.load("broken"), Err(Error::Config(_))));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_environment_overlay() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "session.toml", "driver = \"native\"\nlifetime = 60\n");
        write(dir.path(), "session.prod.toml", "driver = \"database\"\n");

        let mut store = ConfigStore::new(dir.path()).with_environment(Environment::Production);
        store.load("session").unwrap();

        assert_eq!(store.get_string("session.driver"), Some("database".to_string()));
        assert_eq!(store.get_int("session.lifetime"), Some(60));
    }
}
