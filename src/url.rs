use crate::http::Request;

/// Absolute URLs for the running application
#[derive(Debug, Clone, PartialEq)]
pub struct Url {
    base: String,
}

impl Url {
    /// `base_path` is the mount prefix; the base URL always ends with `/`
    pub fn new(scheme: &str, host: &str, base_path: &str) -> Self {
        let trimmed = base_path.trim_matches('/');
        let path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };

        Self {
            base: format!("{}://{}{}", scheme, host, path),
        }
    }

    pub fn from_request(request: &Request, base_path: &str) -> Self {
        let scheme = if request.is_secure() { "https" } else { "http" };
        let host = request.host().unwrap_or("localhost");
        Self::new(scheme, host, base_path)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn to_route(&self, route: &str) -> String {
        format!("{}{}", self.base, route.trim_start_matches('/'))
    }
}
