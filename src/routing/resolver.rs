//! Path-to-route resolution
//!
//! Resolution never fails: unknown controllers resolve to `index`, missing actions to
//! `index`, and whatever is left over becomes positional parameters. Whether the
//! resulting controller and action actually exist is decided at dispatch time.

use super::{Params, Route};

/// Answers questions about where controllers live
pub trait ControllerLayout {
    /// Is `path` (slash separated, no trailing slash) a controller directory?
    fn is_directory(&self, path: &str) -> bool;

    /// Is there a controller named `name` inside `directory` (empty for the root)?
    fn has_controller(&self, directory: &str, name: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct RouteResolver {
    base_path: String,
}

impl Default for RouteResolver {
    fn default() -> Self {
        Self::new("/")
    }
}

impl RouteResolver {
    pub fn new(base_path: &str) -> Self {
        let trimmed = base_path.trim_matches('/');
        let base_path = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        };
        Self { base_path }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Remove the mount prefix; paths outside it are returned untouched
    pub fn strip_base<'p>(&self, path: &'p str) -> &'p str {
        if self.base_path.is_empty() {
            return path;
        }
        match path.strip_prefix(self.base_path.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        }
    }

    /// Split into non-empty, percent-decoded segments
    pub fn segments(&self, path: &str) -> Vec<String> {
        self.strip_base(path)
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match urlencoding::decode(s) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => s.to_string(),
            })
            .collect()
    }

    pub fn resolve(&self, method: &str, path: &str, layout: &dyn ControllerLayout) -> Route {
        let mut segments = self.segments(path).into_iter().peekable();

        let mut directories: Vec<String> = Vec::new();
        while let Some(segment) = segments.peek() {
            let candidate = join_path(&directories, segment);
            if !layout.is_directory(&candidate) {
                break;
            }
            directories.push(segment.clone());
            segments.next();
        }

        let directory = directories.join("/");
        let controller = match segments.peek() {
            Some(segment) if layout.has_controller(&directory, segment) => {
                segments.next().unwrap_or_default()
            }
            _ => "index".to_string(),
        };

        let action = segments.next().unwrap_or_else(|| "index".to_string());
        let params = Params::new(segments.collect());

        let route = Route {
            method: method.to_uppercase(),
            directories,
            controller,
            action,
            params,
        };

        log::debug!(
            "Resolved {} {} to {}/{} ({} params)",
            route.method,
            path,
            route.controller_path(),
            route.action,
            route.params.len()
        );

        route
    }
}

fn join_path(directories: &[String], segment: &str) -> String {
    if directories.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", directories.join("/"), segment)
    }
}
