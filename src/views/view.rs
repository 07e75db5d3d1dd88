use super::engine::ViewEngine;
use super::renderer::RenderPass;
use crate::error::Error;
use serde_json::{Map, Value};

/// Lazily rendered template plus its data context
#[derive(Debug, Clone)]
pub struct View {
    name: String,
    data: Map<String, Value>,
    status: Option<u16>,
}

/// Result of rendering a [`View`]
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered { status: Option<u16>, body: String },
    Failed(RenderFailure),
}

#[derive(Debug)]
pub struct RenderFailure {
    /// Template in which the failure happened
    pub template: String,
    pub error: Error,
}

impl std::fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to render '{}': {}", self.template, self.error)
    }
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            RenderOutcome::Rendered { body, .. } => Some(body),
            RenderOutcome::Failed(_) => None,
        }
    }
}

impl View {
    /// Bind a template name to an initial data object
    ///
    /// Entries of `data` become the template's named bindings. Anything other than
    /// a JSON object (or null) is ignored.
    pub fn make(name: &str, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                log::warn!(
                    "View '{}' expects object data, ignoring {}",
                    name,
                    other
                );
                Map::new()
            }
        };

        Self {
            name: name.to_string(),
            data,
            status: None,
        }
    }

    pub fn new(name: &str) -> Self {
        Self::make(name, Value::Null)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Run the template (and any parents it extends)
    pub fn render(&self, engine: &ViewEngine) -> RenderOutcome {
        let mut pass = RenderPass::new(engine, self.data.clone());

        match pass.render_view(&self.name) {
            Ok(body) => RenderOutcome::Rendered {
                status: self.status,
                body,
            },
            Err(error) => {
                let template = pass.failed_in().unwrap_or(&self.name).to_string();
                log::error!("Render of '{}' failed in '{}': {}", self.name, template, error);
                RenderOutcome::Failed(RenderFailure { template, error })
            }
        }
    }
}
