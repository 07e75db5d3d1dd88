use super::{SessionDriver, SessionEntries, SessionRecord};
use crate::crypto::Cipher;
use crate::error::Result;
use async_trait::async_trait;

/// Browsers drop cookies larger than this
const MAX_COOKIE_BYTES: usize = 4096;

/// Keeps the whole session, sealed, inside the session cookie
#[derive(Debug, Clone)]
pub struct CookieDriver {
    cipher: Cipher,
}

impl CookieDriver {
    pub fn new(cipher: Cipher) -> Self {
        Self { cipher }
    }
}

#[async_trait]
impl SessionDriver for CookieDriver {
    fn name(&self) -> &'static str {
        "cookie"
    }

    async fn load(&self, token: &str) -> Result<Option<SessionRecord>> {
        match self.cipher.open::<(String, SessionEntries)>(token) {
            Ok((id, entries)) => Ok(Some(SessionRecord { id, entries })),
            Err(e) => {
                log::warn!("Discarding unreadable session cookie: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, id: &str, entries: &SessionEntries) -> Result<String> {
        let token = self.cipher.seal(&(id, entries))?;
        if token.len() > MAX_COOKIE_BYTES {
            log::warn!(
                "Session cookie is {} bytes, browsers may drop it",
                token.len()
            );
        }
        Ok(token)
    }

    async fn destroy(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}
