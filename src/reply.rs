//! What a controller action hands back to the application

use crate::url::Url;
use crate::views::View;
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum Reply {
    /// Rendered when the reply is sent
    View(View),
    Redirect(Redirect),
    /// Sent as-is
    Raw(String),
}

impl From<View> for Reply {
    fn from(view: View) -> Self {
        Reply::View(view)
    }
}

impl From<Redirect> for Reply {
    fn from(redirect: Redirect) -> Self {
        Reply::Redirect(redirect)
    }
}

impl From<String> for Reply {
    fn from(raw: String) -> Self {
        Reply::Raw(raw)
    }
}

impl From<&str> for Reply {
    fn from(raw: &str) -> Self {
        Reply::Raw(raw.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Target {
    Absolute(String),
    Route(String),
    Back,
}

/// Redirect to an absolute URL, an application route or the referring page
#[derive(Debug, Clone)]
pub struct Redirect {
    target: Target,
    status: u16,
    flashes: Vec<(String, Value)>,
}

impl Redirect {
    /// `http://` and `https://` locations are kept; anything else is a route
    pub fn to(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        let target = if lower.starts_with("http://") || lower.starts_with("https://") {
            Target::Absolute(location.to_string())
        } else {
            Target::Route(location.to_string())
        };

        Self {
            target,
            status: 302,
            flashes: Vec::new(),
        }
    }

    /// Referring page, or the application base URL without a referrer
    pub fn back() -> Self {
        Self {
            target: Target::Back,
            status: 302,
            flashes: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Flash a value into the session for the next request
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.flashes.push((key.to_string(), value.into()));
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn flashes(&self) -> &[(String, Value)] {
        &self.flashes
    }

    pub fn location(&self, url: &Url, referrer: Option<&str>) -> String {
        match &self.target {
            Target::Absolute(location) => location.clone(),
            Target::Route(route) => url.to_route(route),
            Target::Back => referrer
                .map(str::to_string)
                .unwrap_or_else(|| url.base().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_locations() {
        let url = Url::new("http", "example.com", "/");

        assert_eq!(
            Redirect::to("HTTPS://other.org/x").location(&url, None),
            "HTTPS://other.org/x"
        );
        assert_eq!(
            Redirect::to("users/login").location(&url, None),
            "http://example.com/users/login"
        );
        assert_eq!(
            Redirect::back().location(&url, Some("http://example.com/form")),
            "http://example.com/form"
        );
        assert_eq!(Redirect::back().location(&url, None), "http://example.com/");
    }

    #[test]
    fn test_flashes_and_status() {
        let redirect = Redirect::to("/")
            .with("notice", "Saved")
            .with("count", 3)
            .with_status(303);

        assert_eq!(redirect.status(), 303);
        assert_eq!(redirect.flashes().len(), 2);
        assert_eq!(redirect.flashes()[1].1, Value::from(3));
    }

    #[test]
    fn test_reply_conversions() {
        assert!(matches!(Reply::from("ok"), Reply::Raw(s) if s == "ok"));
        assert!(matches!(Reply::from(View::new("home")), Reply::View(_)));
    }
}
