pub mod naming;
pub mod resolver;

pub use naming::{format_action, format_controller, pascal_case};
pub use resolver::{ControllerLayout, RouteResolver};

/// Positional route parameters, 1-indexed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<String>);

impl Params {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    /// `get(1)` is the first parameter
    pub fn get(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }
}

impl From<Vec<String>> for Params {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

/// Outcome of resolving one request path; computed per request
#[derive(Debug, Clone)]
pub struct Route {
    /// Upper-case HTTP method
    pub method: String,
    pub directories: Vec<String>,
    pub controller: String,
    pub action: String,
    pub params: Params,
}

impl Route {
    /// Directory prefix with a trailing slash (`blog/`), empty at the root
    pub fn directory(&self) -> String {
        self.directories
            .iter()
            .map(|d| format!("{}/", d))
            .collect()
    }

    /// Registry key of the controller (`blog/posts`)
    pub fn controller_path(&self) -> String {
        format!("{}{}", self.directory(), self.controller)
    }

    pub fn controller_class(&self) -> String {
        format_controller(&self.directories, &self.controller)
    }

    pub fn method_name(&self, restful: bool) -> String {
        format_action(&self.action, restful, &self.method)
    }

    /// `BlogPostsController::actionShow`
    pub fn handler_name(&self, restful: bool) -> String {
        format!("{}::{}", self.controller_class(), self.method_name(restful))
    }
}
