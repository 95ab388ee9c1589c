//! Tool framework for the reasoning loop
//!
//! A fixed catalog of named operations, rendered into prompts as a schema and
//! dispatched through a permission gate.

pub mod builtin;
pub mod registry;
pub mod router;
pub mod security;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Context provided to tools during execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory relative paths are resolved against
    pub working_dir: PathBuf,
    /// Maximum output length (truncate if exceeded)
    pub max_output_len: usize,
    /// Timeout for HTTP requests in seconds
    pub http_timeout_secs: u64,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            max_output_len: 50000,
            http_timeout_secs: 30,
        }
    }
}

impl ToolContext {
    /// Create a new context with the given working directory
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    /// Resolve a path argument against the working directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.working_dir.join(candidate)
        }
    }

    /// Truncate output on a char boundary if it exceeds `max_output_len`
    pub fn truncate(&self, output: String) -> String {
        if output.len() <= self.max_output_len {
            return output;
        }

        let safe_end = output
            .char_indices()
            .take_while(|(idx, _)| *idx < self.max_output_len)
            .last()
            .map(|(idx, c)| idx + c.len_utf8())
            .unwrap_or(0);

        format!(
            "{}\n\n[Output truncated at {} characters]",
            &output[..safe_end],
            safe_end
        )
    }
}

/// Schema for a single tool parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterProperty {
    /// Parameter type (string, number, boolean)
    #[serde(rename = "type")]
    pub param_type: String,
    /// Parameter description
    pub description: String,
    /// Default value if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterProperty {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            param_type: "string".to_string(),
            description: description.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Ordered parameter list of a tool.
///
/// Order is significant: it is the order parameters appear in the prompt schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub properties: Vec<(String, ParameterProperty)>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, prop: ParameterProperty) -> Self {
        self.properties.push((name.into(), prop));
        self
    }

    pub fn with_required(mut self, name: impl Into<String>, prop: ParameterProperty) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.push((name, prop));
        self
    }

    /// Render as `name: type[ = default], ...`
    pub fn signature(&self) -> String {
        self.properties
            .iter()
            .map(|(name, prop)| match &prop.default {
                Some(default) => format!("{}: {} = {}", name, prop.param_type, default),
                None => format!("{}: {}", name, prop.param_type),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name
    pub name: String,
    /// Arguments as a JSON object
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The Tool trait that all tools implement.
///
/// Failures are returned as `Err` and turned into result text by the router,
/// prefixed with [`Tool::failure_label`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get a description of what the tool does
    fn description(&self) -> &str;

    /// Get the parameter schema
    fn parameters_schema(&self) -> ParameterSchema;

    /// Prefix for failure text, e.g. "Error reading file"
    fn failure_label(&self) -> &str;

    /// Execute the tool with the given arguments
    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String>;

    /// One schema line as shown to the model
    fn schema_line(&self) -> String {
        format!(
            "- {}({}): {}",
            self.name(),
            self.parameters_schema().signature(),
            self.description()
        )
    }
}

/// Fetch a required string argument
pub fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Missing required parameter: {}", name))
}

/// Fetch an optional string argument
pub fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(|v| v.as_str())
}
