//! Template engine module for Agora.
//!
//! Provides a Handlebars-style template engine for the server-rendered pages.
//!
//! # Features
//!
//! - Variable expansion, HTML-escaped: `{{variable}}`
//! - Raw expansion: `{{{variable}}}`
//! - Conditionals: `{{#if condition}}...{{else}}...{{/if}}`, `{{#unless}}`
//! - Loops: `{{#each items}}...{{/each}}` with `@index`, `@first`, `@last`
//! - Escaping: `\{{` to output literal `{{`
//!
//! # Example
//!
//! ```
//! use agora::template::{TemplateContext, TemplateEngine, Value};
//!
//! let mut engine = TemplateEngine::new();
//! engine.load("greeting", "Hello, {{name}}!").unwrap();
//!
//! let mut context = TemplateContext::new();
//! context.set("name", Value::string("<World>"));
//!
//! let result = engine.render("greeting", &context).unwrap();
//! assert_eq!(result, "Hello, &lt;World&gt;!");
//! ```

mod loader;
mod parser;
mod renderer;

use std::collections::HashMap;

use thiserror::Error;

pub use loader::{builtin_engine, render_page, BUILTIN_PAGES, LAYOUT};
pub use parser::{Node, Parser};
pub use renderer::Renderer;

/// Template-related errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template not found.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Render error.
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// A value that can be used in templates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(i64),
    Bool(bool),
    List(Vec<Value>),
    /// An object (key-value pairs).
    Object(HashMap<String, Value>),
    Null,
}

impl Value {
    /// Convert the value to a string for display.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(_) => "[list]".to_string(),
            Value::Object(_) => "[object]".to_string(),
            Value::Null => String::new(),
        }
    }

    /// Check if the value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::List(l) => !l.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => false,
        }
    }

    /// Get a nested value by dot-separated path.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;

        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::List(list) => {
                    let index: usize = part.parse().ok()?;
                    current = list.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn number(n: i64) -> Self {
        Value::Number(n)
    }

    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(items)
    }

    /// Build an object from `(key, value)` pairs.
    pub fn object<K, V, I>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(
            items
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Context for template rendering.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, Value>,
}

impl TemplateContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable in the context.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Get a variable, resolving dot paths like `user.name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value);
        }

        let (root, rest) = name.split_once('.')?;
        self.variables.get(root)?.get_path(rest)
    }

    /// Create a child context that inherits all variables.
    pub fn child(&self) -> Self {
        self.clone()
    }
}

/// Template engine for parsing and rendering templates.
#[derive(Debug, Default)]
pub struct TemplateEngine {
    /// Parsed templates.
    templates: HashMap<String, Vec<Node>>,
}

impl TemplateEngine {
    /// Create a new template engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store a template.
    pub fn load(&mut self, name: impl Into<String>, content: &str) -> Result<()> {
        let nodes = Parser::new(content).parse()?;
        self.templates.insert(name.into(), nodes);
        Ok(())
    }

    /// Render a template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let nodes = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        Renderer::new(context).render(nodes)
    }

    /// Render a template string directly without loading.
    pub fn render_string(content: &str, context: &TemplateContext) -> Result<String> {
        let nodes = Parser::new(content).parse()?;
        Renderer::new(context).render(&nodes)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}
