//! Per-request state handed to controllers
//!
//! A `Context` is built by the application for each request and owns the request,
//! the resolved route, the session and the cookie jar. Shared services (configuration,
//! cipher, database) are cheap handles cloned into it.

use crate::config::AppConfig;
use crate::configuration::ConfigStore;
use crate::crypto::Cipher;
use crate::db::DbHandle;
use crate::http::{CookieJar, Request, SealedCookies};
use crate::routing::{Params, Route};
use crate::session::Session;
use crate::url::Url;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Context {
    pub(crate) request: Request,
    pub(crate) route: Route,
    pub(crate) session: Session,
    pub(crate) cookies: CookieJar,
    pub(crate) config: Arc<ConfigStore>,
    pub(crate) settings: Arc<AppConfig>,
    pub(crate) cipher: Cipher,
    pub(crate) db: DbHandle,
    pub(crate) url: Url,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.request.method)
            .field("uri", &self.request.uri)
            .field("route", &self.route)
            .field("session", &self.session.id())
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn params(&self) -> &Params {
        &self.route.params
    }

    /// Positional route parameter, 1-based
    pub fn param(&self, index: usize) -> Option<&str> {
        self.route.params.get(index)
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.query(key)
    }

    pub fn form(&self) -> HashMap<String, String> {
        self.request.body_as_form()
    }

    pub fn referrer(&self) -> Option<&str> {
        self.request.referrer()
    }

    pub fn is_post(&self) -> bool {
        self.request.method == "POST"
    }

    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn cookies(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    /// Cookie jar view that seals values with the application key
    pub fn sealed_cookies(&mut self) -> SealedCookies<'_> {
        SealedCookies::new(&mut self.cookies, &self.cipher)
    }

    /// Dotted configuration lookup
    pub fn config(&self, path: &str) -> Option<&Value> {
        self.config.get(path)
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config
    }

    pub fn settings(&self) -> &AppConfig {
        &self.settings
    }

    pub fn db(&self) -> &DbHandle {
        &self.db
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[cfg(test)]
pub(crate) fn test_context(route: Route) -> Context {
    use crate::config::DatabaseConfig;

    Context {
        request: Request::new(&route.method, "/"),
        route,
        session: Session::new(3600),
        cookies: CookieJar::new(),
        config: Arc::new(ConfigStore::from_value(serde_json::json!({}))),
        settings: Arc::new(AppConfig::default()),
        cipher: Cipher::new("test"),
        db: DbHandle::new(DatabaseConfig::default()),
        url: Url::new("http", "localhost", "/"),
    }
}
