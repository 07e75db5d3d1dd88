//! Executes parsed templates against a data context
//!
//! Output goes into a stack of buffers. The bottom buffer is the template's own output;
//! `section` pushes a capture buffer and `close` pops it again. One [`RenderPass`] lives
//! for one view render, so extend/section bookkeeping never leaks between requests.

use super::ast::{Condition, Node, Template};
use super::engine::ViewEngine;
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Marker inside a stored section that the next capture of that section replaces
pub const PARENT_MARKER: &str = "@parent";

/// Upper bound on nested `partial` calls
pub const MAX_INCLUDE_DEPTH: usize = 16;

struct LoopFrame {
    item_name: String,
    item: Value,
    index: usize,
}

pub struct RenderPass<'e> {
    engine: &'e ViewEngine,
    data: Map<String, Value>,
    buffers: Vec<String>,
    sections: HashMap<String, String>,
    open_section: Option<String>,
    extend: Option<String>,
    loops: Vec<LoopFrame>,
    include_depth: usize,
    failed_in: Option<String>,
}

impl<'e> RenderPass<'e> {
    pub fn new(engine: &'e ViewEngine, data: Map<String, Value>) -> Self {
        Self {
            engine,
            data,
            buffers: Vec::new(),
            sections: HashMap::new(),
            open_section: None,
            extend: None,
            loops: Vec::new(),
            include_depth: 0,
            failed_in: None,
        }
    }

    /// Name of the template that raised the first error, if any
    pub fn failed_in(&self) -> Option<&str> {
        self.failed_in.as_deref()
    }

    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(|s| s.as_str())
    }

    /// Render `name`, following `extend` calls until a template no longer extends
    ///
    /// The output of every extending template is discarded; only the last template in
    /// the chain produces the final body. Its sections stay available to the parents.
    pub fn render_view(&mut self, name: &str) -> Result<String> {
        let mut visited = HashSet::new();
        visited.insert(name.to_string());

        let mut body = self.run_template(name)?;

        while let Some(parent) = self.extend.take() {
            if !visited.insert(parent.clone()) {
                self.mark_failed(&parent);
                return Err(Error::template_state(format!(
                    "extend cycle detected at '{}'",
                    parent
                )));
            }
            log::debug!("Rendering parent template '{}'", parent);
            body = self.run_template(&parent)?;
        }

        Ok(body)
    }

    /// Run one top-level template into a fresh buffer
    fn run_template(&mut self, name: &str) -> Result<String> {
        let result = self.engine.load(name).and_then(|template| {
            self.buffers.push(String::new());
            let outcome = self.render_nodes(&template.nodes);
            let output = self.buffers.pop().unwrap_or_default();
            outcome?;

            if let Some(open) = self.open_section.take() {
                return Err(Error::template_state(format!(
                    "section '{}' was never closed",
                    open
                )));
            }
            Ok(output)
        });

        if result.is_err() {
            self.mark_failed(name);
        }
        result
    }

    fn mark_failed(&mut self, name: &str) {
        if self.failed_in.is_none() {
            self.failed_in = Some(name.to_string());
        }
    }

    fn write(&mut self, text: &str) {
        if let Some(buffer) = self.buffers.last_mut() {
            buffer.push_str(text);
        }
    }

    fn render_nodes(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.render_node(node)?;
        }
        Ok(())
    }

    fn render_node(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Text(text) => self.write(text),

            Node::Variable { path, raw } => {
                let value = self.resolve(path);
                let rendered = value_to_string(&value);
                if *raw {
                    self.write(&rendered);
                } else {
                    self.write(&escape_html(&rendered));
                }
            }

            Node::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition) {
                    self.render_nodes(then_branch)?;
                } else {
                    self.render_nodes(else_branch)?;
                }
            }

            Node::Loop {
                item_name,
                collection,
                body,
            } => self.render_loop(item_name, collection, body)?,

            // Outside a loop `@{index}` is an ordinary variable
            Node::Index => {
                let index = match self.loops.last() {
                    Some(frame) => frame.index.to_string(),
                    None => escape_html(&value_to_string(&self.resolve("index"))),
                };
                self.write(&index);
            }

            Node::Extend(name) => self.extend(name)?,
            Node::Section(name) => self.open(name)?,
            Node::Close => {
                let stored = self.close()?;
                self.write(&stored);
            }
            Node::Show(name) => {
                let stored = self.show(name);
                self.write(&stored);
            }
            Node::Partial(name) => {
                let output = self.partial(name)?;
                self.write(&output);
            }
        }
        Ok(())
    }

    fn render_loop(&mut self, item_name: &str, collection: &str, body: &[Node]) -> Result<()> {
        let items: Vec<Value> = match self.resolve(collection) {
            Value::Array(items) => items,
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            Value::Null => Vec::new(),
            other => {
                log::debug!("foreach over non-collection '{}': {}", collection, other);
                Vec::new()
            }
        };

        for (index, item) in items.into_iter().enumerate() {
            self.loops.push(LoopFrame {
                item_name: item_name.to_string(),
                item,
                index,
            });
            let result = self.render_nodes(body);
            self.loops.pop();
            result?;
        }
        Ok(())
    }

    /// Record the parent template; the rest of this template's output is discarded
    pub fn extend(&mut self, name: &str) -> Result<()> {
        if self.include_depth > 0 {
            return Err(Error::template_state(format!(
                "partial templates cannot extend '{}'",
                name
            )));
        }
        if let Some(open) = &self.open_section {
            return Err(Error::template_state(format!(
                "cannot extend '{}' while section '{}' is open",
                name, open
            )));
        }
        self.extend = Some(name.to_string());
        Ok(())
    }

    /// Start capturing output for a section; only one may be open
    pub fn open(&mut self, name: &str) -> Result<()> {
        if let Some(open) = &self.open_section {
            return Err(Error::template_state(format!(
                "cannot open section '{}' while section '{}' is open",
                name, open
            )));
        }
        self.open_section = Some(name.to_string());
        self.buffers.push(String::new());
        Ok(())
    }

    /// Finish the open section and return its stored text
    ///
    /// A previously stored value wins: the new capture only replaces `@parent` in it.
    pub fn close(&mut self) -> Result<String> {
        let name = self
            .open_section
            .take()
            .ok_or_else(|| Error::template_state("close called with no open section"))?;
        let captured = self.buffers.pop().unwrap_or_default();

        let stored = match self.sections.get(&name) {
            Some(previous) => previous.replace(PARENT_MARKER, &captured),
            None => captured,
        };
        self.sections.insert(name, stored.clone());
        Ok(stored)
    }

    pub fn show(&self, name: &str) -> String {
        self.sections.get(name).cloned().unwrap_or_default()
    }

    /// Render another template inline with the same data and section state
    pub fn partial(&mut self, name: &str) -> Result<String> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(Error::template(format!(
                "partial '{}' exceeds include depth {}",
                name, MAX_INCLUDE_DEPTH
            )));
        }

        let template: Arc<Template> = self.engine.load(name)?;
        if template.extends() {
            return Err(Error::template_state(format!(
                "partial template '{}' calls extend",
                name
            )));
        }

        let open_before = self.open_section.clone();
        self.include_depth += 1;
        self.buffers.push(String::new());
        let outcome = self.render_nodes(&template.nodes);
        let output = self.buffers.pop().unwrap_or_default();
        self.include_depth -= 1;

        if let Err(e) = outcome {
            self.mark_failed(name);
            return Err(e);
        }
        if self.open_section != open_before {
            self.mark_failed(name);
            return Err(Error::template_state(format!(
                "partial '{}' left section state unbalanced",
                name
            )));
        }
        Ok(output)
    }

    /// Look a dotted path up in loop variables first, then in the data context
    fn resolve(&self, path: &str) -> Value {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let root = self
            .loops
            .iter()
            .rev()
            .find(|frame| frame.item_name == head)
            .map(|frame| &frame.item)
            .or_else(|| self.data.get(head));

        match (root, rest) {
            (Some(value), None) => value.clone(),
            (Some(value), Some(rest)) => nested_value(value, rest).unwrap_or(Value::Null),
            (None, _) => Value::Null,
        }
    }

    fn evaluate(&self, condition: &Condition) -> bool {
        is_truthy(&self.resolve(&condition.path)) != condition.negated
    }
}

fn nested_value(data: &Value, path: &str) -> Option<Value> {
    let mut current = data;

    for part in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(part)?,
            Value::Array(arr) => match part {
                "length" | "count" => return Some(Value::from(arr.len())),
                _ => current = arr.get(part.parse::<usize>().ok()?)?,
            },
            Value::String(s) if part == "length" => return Some(Value::from(s.chars().count())),
            _ => return None,
        }
    }

    Some(current.clone())
}

/// Empty strings, `"0"`, zero, empty collections, `false` and null are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        _ => value.to_string(),
    }
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
