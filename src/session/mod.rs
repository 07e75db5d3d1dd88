//! Per-request sessions with flash values
//!
//! A [`Session`] is loaded by the [`SessionStore`] at the start of a request and
//! committed back at the end. Storage is delegated to a [`SessionDriver`] chosen from
//! `session.driver`.

use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod cookie;
pub mod database;
pub mod native;
pub mod store;

pub use cookie::CookieDriver;
pub use database::DatabaseDriver;
pub use native::NativeDriver;
pub use store::SessionStore;

/// Length of generated session ids
pub const SESSION_ID_LENGTH: usize = 32;

/// Current Unix timestamp in seconds
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Generate a random alphanumeric session id
pub fn generate_session_id() -> String {
    use rand::distributions::Alphanumeric;
    use rand::{thread_rng, Rng};

    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Flash lifecycle: set during one request, readable during the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashState {
    Fresh,
    Aged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<FlashState>,
    /// Unix seconds
    pub expires_at: u64,
}

impl SessionEntry {
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

pub type SessionEntries = BTreeMap<String, SessionEntry>;

/// What a driver hands back for a known session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub entries: SessionEntries,
}

/// Storage backend for session entries
///
/// `token` is the value carried by the session cookie. For id-based drivers it is the
/// session id; the cookie driver carries the whole sealed session in it.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` for unknown, expired or tampered sessions
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>>;

    /// Persist entries and return the token the session cookie must carry
    async fn save(&self, id: &str, entries: &SessionEntries) -> Result<String>;

    async fn destroy(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    entries: SessionEntries,
    lifetime: u64,
    is_new: bool,
    /// Cookie value the session was loaded from
    token: Option<String>,
}

impl Session {
    /// Fresh session with a new id
    pub fn new(lifetime: u64) -> Self {
        Self {
            id: generate_session_id(),
            entries: SessionEntries::new(),
            lifetime,
            is_new: true,
            token: None,
        }
    }

    pub(crate) fn restore(record: SessionRecord, lifetime: u64, token: &str) -> Self {
        Self {
            id: record.id,
            entries: record.entries,
            lifetime,
            is_new: false,
            token: Some(token.to_string()),
        }
    }

    pub(crate) fn with_stale_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn entries(&self) -> &SessionEntries {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: &str, value: Value, flash: Option<FlashState>) {
        let entry = SessionEntry {
            value,
            flash,
            expires_at: unix_timestamp().saturating_add(self.lifetime),
        };
        self.entries.insert(key.to_string(), entry);
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        self.insert(key, serde_json::to_value(value)?, None);
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) {
        self.insert(key, value.into(), None);
    }

    /// Store a value that survives until the end of the next request
    pub fn flash<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        self.insert(key, serde_json::to_value(value)?, Some(FlashState::Fresh));
        Ok(())
    }

    pub fn flash_value(&mut self, key: &str, value: impl Into<Value>) {
        self.insert(key, value.into(), Some(FlashState::Fresh));
    }

    /// Raw value, dropping the entry when it has expired
    pub fn get_value(&mut self, key: &str) -> Option<Value> {
        let now = unix_timestamp();
        if self.entries.get(key)?.is_expired(now) {
            log::debug!("Session value '{}' expired", key);
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Session value '{}' has an unexpected shape: {}", key, e);
                None
            }
        }
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    pub fn is_flashed(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.flash.is_some())
            .unwrap_or(false)
    }

    pub fn forget(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// End-of-request pass: drops aged flashes and expired entries, ages fresh flashes
    pub fn sweep(&mut self) {
        let now = unix_timestamp();
        self.entries.retain(|_, entry| {
            !entry.is_expired(now) && entry.flash != Some(FlashState::Aged)
        });
        for entry in self.entries.values_mut() {
            if entry.flash == Some(FlashState::Fresh) {
                entry.flash = Some(FlashState::Aged);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_eq!(a.len(), SESSION_ID_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_get_forget() {
        let mut session = Session::new(3600);
        session.set("user", &json!({"id": 7, "name": "Ana"})).unwrap();
        session.set_value("count", 3);

        assert_eq!(session.get::<i64>("count"), Some(3));
        assert_eq!(session.get_value("user").unwrap()["name"], "Ana");
        assert!(session.has("user"));
        assert!(!session.is_flashed("user"));

        assert_eq!(session.forget("count"), Some(json!(3)));
        assert!(!session.has("count"));
        assert_eq!(session.get::<String>("user"), None);
    }

    #[test]
    fn test_flash_survives_exactly_one_more_request() {
        let mut session = Session::new(3600);
        session.flash_value("notice", "Saved");
        session.set_value("user", "ana");

        // end of request N
        session.sweep();
        assert_eq!(session.get::<String>("notice"), Some("Saved".to_string()));

        // end of request N+1
        session.sweep();
        assert!(!session.has("notice"));
        assert!(session.has("user"));

        session.sweep();
        assert!(session.has("user"));
    }

    #[test]
    fn test_setting_a_flashed_key_makes_it_persistent() {
        let mut session = Session::new(3600);
        session.flash_value("mode", "edit");
        session.set_value("mode", "view");
        session.sweep();
        session.sweep();
        assert_eq!(session.get::<String>("mode"), Some("view".to_string()));
    }

    #[test]
    fn test_zero_lifetime_expires_immediately() {
        let mut session = Session::new(0);
        session.set_value("gone", true);
        assert!(session.get_value("gone").is_none());
        assert!(session.is_empty());

        session.set_value("also", true);
        session.sweep();
        assert!(session.is_empty());
    }
}
