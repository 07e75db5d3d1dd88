use super::{unix_timestamp, SessionDriver, SessionEntries, SessionRecord};
use crate::crypto::Cipher;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Saves between sweeps of expired sessions
const PURGE_EVERY: usize = 64;

#[derive(Debug, Clone)]
struct StoredSession {
    payload: String,
    expires_at: u64,
}

/// In-process session storage keyed by session id
#[derive(Clone)]
pub struct NativeDriver {
    sessions: Arc<DashMap<String, StoredSession>>,
    cipher: Cipher,
    lifetime: u64,
    saves: Arc<AtomicUsize>,
}

impl NativeDriver {
    pub fn new(cipher: Cipher, lifetime: u64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            cipher,
            lifetime,
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove expired sessions, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = unix_timestamp();
        let before = self.sessions.len();
        self.sessions.retain(|_, stored| stored.expires_at > now);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            log::debug!("Purged {} expired sessions", removed);
        }
        removed
    }
}

#[async_trait]
impl SessionDriver for NativeDriver {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn load(&self, token: &str) -> Result<Option<SessionRecord>> {
        let payload = match self.sessions.get(token) {
            Some(stored) if stored.expires_at > unix_timestamp() => stored.payload.clone(),
            Some(_) => {
                self.sessions.remove(token);
                return Ok(None);
            }
            None => return Ok(None),
        };

        match self.cipher.open::<SessionEntries>(&payload) {
            Ok(entries) => Ok(Some(SessionRecord {
                id: token.to_string(),
                entries,
            })),
            Err(e) => {
                log::warn!("Discarding unreadable session {}: {}", token, e);
                self.sessions.remove(token);
                Ok(None)
            }
        }
    }

    async fn save(&self, id: &str, entries: &SessionEntries) -> Result<String> {
        let stored = StoredSession {
            payload: self.cipher.seal(entries)?,
            expires_at: unix_timestamp().saturating_add(self.lifetime),
        };
        self.sessions.insert(id.to_string(), stored);

        if self.saves.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_expired();
        }

        Ok(id.to_string())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}
