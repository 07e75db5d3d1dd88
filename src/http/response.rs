use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn internal_error() -> Self {
        Self::text("Internal Server Error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Redirect with an explicit status; anything outside 3xx falls back to 302
    pub fn redirect(location: &str, status: u16) -> Self {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|s| s.is_redirection())
            .unwrap_or(StatusCode::FOUND);

        Self::new(status).with_header("Location", location)
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self::ok()
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_body(content.into().into_bytes())
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::ok()
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(content.into().into_bytes())
    }

    /// Unknown codes leave the status untouched
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_status_code(self, code: u16) -> Self {
        match StatusCode::from_u16(code) {
            Ok(status) => self.with_status(status),
            Err(_) => {
                log::warn!("Ignoring invalid status code {}", code);
                self
            }
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// First header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a repeated header such as `Set-Cookie`
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Convert for hyper, dropping headers hyper cannot encode
    ///
    /// A redirect whose `Location` is dropped becomes a 500; the remaining headers,
    /// `Set-Cookie` included, are still sent.
    pub fn into_hyper(self) -> hyper::Response<hyper::Body> {
        let mut status = self.status;
        let mut body = self.body;
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        let mut location_dropped = false;

        for (name, value) in self.headers {
            let parsed = HeaderName::from_bytes(name.as_bytes())
                .ok()
                .zip(HeaderValue::from_str(&value).ok());
            match parsed {
                Some((name, value)) => {
                    headers.append(name, value);
                }
                None => {
                    log::error!("Dropping invalid response header {}: {:?}", name, value);
                    location_dropped |= name.eq_ignore_ascii_case("location");
                }
            }
        }

        if location_dropped && status.is_redirection() {
            status = StatusCode::INTERNAL_SERVER_ERROR;
            body = b"Internal Server Error".to_vec();
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }

        let mut response = hyper::Response::new(hyper::Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
