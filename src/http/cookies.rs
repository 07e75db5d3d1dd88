//! Request cookies plus the cookies queued for the response

use crate::crypto::Cipher;
use crate::error::Result;
use crate::http::Request;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub path: String,
    /// Seconds; `None` makes a browser-session cookie
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<String>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            secure: false,
            same_site: Some("Lax".to_string()),
        }
    }
}

impl CookieOptions {
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }
}

#[derive(Debug, Clone)]
enum Outgoing {
    Set { value: String, options: CookieOptions },
    Remove { path: String },
}

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    incoming: HashMap<String, String>,
    outgoing: IndexMap<String, Outgoing>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_request(request: &Request) -> Self {
        Self {
            incoming: request.cookies(),
            outgoing: IndexMap::new(),
        }
    }

    /// Current value, taking cookies queued during this request into account
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.outgoing.get(name) {
            Some(Outgoing::Set { value, .. }) => Some(value.as_str()),
            Some(Outgoing::Remove { .. }) => None,
            None => self.incoming.get(name).map(|s| s.as_str()),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>, options: CookieOptions) {
        self.outgoing.insert(
            name.to_string(),
            Outgoing::Set {
                value: value.into(),
                options,
            },
        );
    }

    /// Queue an expired cookie so the browser drops it
    pub fn remove(&mut self, name: &str) {
        self.remove_with_path(name, "/");
    }

    pub fn remove_with_path(&mut self, name: &str, path: &str) {
        self.outgoing.insert(
            name.to_string(),
            Outgoing::Remove {
                path: path.to_string(),
            },
        );
    }

    /// `Set-Cookie` header values in the order they were queued
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.outgoing
            .iter()
            .map(|(name, cookie)| match cookie {
                Outgoing::Set { value, options } => render_cookie(name, value, options),
                Outgoing::Remove { path } => format!(
                    "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
                    name, path
                ),
            })
            .collect()
    }
}

fn render_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut header = format!(
        "{}={}; Path={}",
        name,
        urlencoding::encode(value),
        options.path
    );

    if let Some(max_age) = options.max_age {
        header.push_str(&format!("; Max-Age={}", max_age));
        // Expires is left out when the date overflows
        let expires = chrono::TimeDelta::try_seconds(max_age)
            .and_then(|delta| chrono::Utc::now().checked_add_signed(delta));
        if let Some(expires) = expires {
            header.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
    }
    if options.http_only {
        header.push_str("; HttpOnly");
    }
    if options.secure {
        header.push_str("; Secure");
    }
    if let Some(same_site) = &options.same_site {
        header.push_str(&format!("; SameSite={}", same_site));
    }

    header
}

/// Cookies whose values are sealed with the application cipher
pub struct SealedCookies<'a> {
    jar: &'a mut CookieJar,
    cipher: &'a Cipher,
}

impl<'a> SealedCookies<'a> {
    pub fn new(jar: &'a mut CookieJar, cipher: &'a Cipher) -> Self {
        Self { jar, cipher }
    }

    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
        options: CookieOptions,
    ) -> Result<()> {
        let sealed = self.cipher.seal(value)?;
        self.jar.set(name, sealed, options);
        Ok(())
    }

    /// `None` when the cookie is absent or does not authenticate
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let raw = self.jar.get(name)?;
        match self.cipher.open(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("Discarding cookie '{}': {}", name, e);
                None
            }
        }
    }

    pub fn delete(&mut self, name: &str) {
        self.jar.remove(name);
    }
}
