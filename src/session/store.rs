use super::{CookieDriver, DatabaseDriver, NativeDriver, Session, SessionDriver};
use crate::config::SessionConfig;
use crate::crypto::Cipher;
use crate::db::DbHandle;
use crate::error::{Error, Result};
use crate::http::{CookieJar, CookieOptions};
use std::sync::Arc;

/// Loads and commits sessions through the configured driver
#[derive(Clone)]
pub struct SessionStore {
    driver: Arc<dyn SessionDriver>,
    cookie_name: String,
    lifetime: u64,
    cookie_options: CookieOptions,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("driver", &self.driver.name())
            .field("cookie_name", &self.cookie_name)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl SessionStore {
    /// Pick the driver named by `session.driver`
    ///
    /// Unknown names fall back to `native`. The `database` driver needs a
    /// configured `database.url`.
    pub fn from_config(config: &SessionConfig, cipher: Cipher, db: &DbHandle) -> Result<Self> {
        let driver: Arc<dyn SessionDriver> = match config.driver.as_str() {
            "native" => Arc::new(NativeDriver::new(cipher, config.lifetime)),
            "cookie" => Arc::new(CookieDriver::new(cipher)),
            "database" => {
                if !db.is_configured() {
                    return Err(Error::config(
                        "session.driver = \"database\" requires database.url",
                    ));
                }
                Arc::new(DatabaseDriver::new(
                    db.clone(),
                    cipher,
                    &config.table,
                    config.lifetime,
                )?)
            }
            other => {
                log::warn!(
                    "Unknown session driver '{}', falling back to native",
                    other
                );
                Arc::new(NativeDriver::new(cipher, config.lifetime))
            }
        };

        log::info!("Session driver: {}", driver.name());
        Ok(Self::with_driver(driver, config))
    }

    pub fn with_driver(driver: Arc<dyn SessionDriver>, config: &SessionConfig) -> Self {
        let cookie_options = CookieOptions {
            max_age: Some(i64::try_from(config.lifetime).unwrap_or(i64::MAX)),
            secure: config.secure,
            same_site: Some(config.same_site.clone()).filter(|s| !s.is_empty()),
            ..CookieOptions::default()
        };

        Self {
            driver,
            cookie_name: config.cookie_name.clone(),
            lifetime: config.lifetime,
            cookie_options,
        }
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session named by the request's cookie, or a new one
    pub async fn start(&self, cookies: &CookieJar) -> Result<Session> {
        let token = match cookies.get(&self.cookie_name) {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(Session::new(self.lifetime)),
        };

        match self.driver.load(token).await? {
            Some(record) => Ok(Session::restore(record, self.lifetime, token)),
            None => {
                log::debug!("Session cookie did not match a live session");
                Ok(Session::new(self.lifetime).with_stale_token(token))
            }
        }
    }

    /// Persist the session and update the session cookie
    ///
    /// Empty sessions are not stored; an empty session that used to exist is
    /// destroyed and its cookie removed.
    pub async fn commit(&self, session: &mut Session, cookies: &mut CookieJar) -> Result<()> {
        if session.is_empty() {
            if !session.is_new() {
                self.driver.destroy(session.id()).await?;
            }
            if session.token().is_some() {
                cookies.remove_with_path(&self.cookie_name, &self.cookie_options.path);
            }
            return Ok(());
        }

        let token = self.driver.save(session.id(), session.entries()).await?;
        if session.token() != Some(token.as_str()) {
            cookies.set(&self.cookie_name, token, self.cookie_options.clone());
        }
        Ok(())
    }
}
