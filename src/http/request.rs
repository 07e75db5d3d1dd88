use crate::error::Result;
use hyper::{Body, Request as HyperRequest};
use std::collections::HashMap;

/// Incoming HTTP request
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    body_bytes: Vec<u8>,
}

impl Request {
    /// Build a request by hand (tests, benches, embedding)
    pub fn new(method: &str, uri: &str) -> Self {
        let query = uri
            .split_once('?')
            .map(|(_, q)| Self::parse_query(q))
            .unwrap_or_default();

        Request {
            method: method.to_uppercase(),
            uri: uri.to_string(),
            headers: HashMap::new(),
            query,
            body_bytes: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body_bytes = body.into();
        self
    }

    pub async fn from_hyper(req: HyperRequest<Body>) -> Result<Self> {
        let method = req.method().to_string();
        let uri = req.uri().to_string();

        let mut headers = HashMap::new();
        for (name, value) in req.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), value_str.to_string());
            }
        }

        let query = Self::parse_query(req.uri().query().unwrap_or(""));
        let body_bytes = hyper::body::to_bytes(req.into_body()).await?.to_vec();

        Ok(Request {
            method,
            uri,
            headers,
            query,
            body_bytes,
        })
    }

    pub fn body_as_form(&self) -> HashMap<String, String> {
        let body_str = String::from_utf8_lossy(&self.body_bytes);
        Self::parse_query(&body_str)
    }

    pub fn body_as_string(&self) -> String {
        String::from_utf8_lossy(&self.body_bytes).to_string()
    }

    fn parse_query(query: &str) -> HashMap<String, String> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (Self::decode_component(key), Self::decode_component(value))
            })
            .collect()
    }

    /// Percent-decode a form component; `+` is a space
    fn decode_component(raw: &str) -> String {
        let spaced = raw.replace('+', " ");
        match urlencoding::decode(&spaced) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => spaced,
        }
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|s| s.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// HTTPS either directly or behind a proxy setting X-Forwarded-Proto
    pub fn is_secure(&self) -> bool {
        if let Some(proto) = self.headers.get("x-forwarded-proto") {
            return proto.eq_ignore_ascii_case("https");
        }
        self.uri.starts_with("https://")
    }

    pub fn referrer(&self) -> Option<&str> {
        self.headers.get("referer").map(|s| s.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies().remove(name)
    }

    /// All request cookies
    pub fn cookies(&self) -> HashMap<String, String> {
        self.headers
            .get("cookie")
            .map(|header| Self::parse_cookies(header))
            .unwrap_or_default()
    }

    fn parse_cookies(header: &str) -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                let value = value.trim().trim_matches('"');
                let value = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                cookies.insert(name.trim().to_string(), value);
            }
        }
        cookies
    }

    pub fn host(&self) -> Option<&str> {
        self.headers.get("host").map(|s| s.as_str())
    }

    /// Path component of the request URI, without the query string
    pub fn path(&self) -> &str {
        let without_scheme = match self.uri.find("://") {
            Some(idx) => {
                let after = &self.uri[idx + 3..];
                match after.find('/') {
                    Some(slash) => &after[slash..],
                    None => "/",
                }
            }
            None => self.uri.as_str(),
        };

        let path = without_scheme
            .split(['?', '#'])
            .next()
            .unwrap_or(without_scheme);

        if path.is_empty() {
            "/"
        } else {
            path
        }
    }

    /// Non-empty path segments
    pub fn segments(&self) -> Vec<&str> {
        self.path().split('/').filter(|s| !s.is_empty()).collect()
    }
}
