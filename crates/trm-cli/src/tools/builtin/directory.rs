//! Directory listing and creation tools

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;

use crate::tools::{optional_str, required_str, ParameterProperty, ParameterSchema, Tool, ToolContext};

/// Tool for listing directory entries
pub struct ListDirTool;

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "Lists files in a directory."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with_property(
            "path",
            ParameterProperty::string("Directory to list").with_default(json!(".")),
        )
    }

    fn failure_label(&self) -> &str {
        "Error listing directory"
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let path = ctx.resolve(optional_str(args, "path").unwrap_or("."));

        let mut names = fs::read_dir(&path)
            .with_context(|| format!("{}", path.display()))?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("{}", path.display()))?;
        names.sort();

        Ok(ctx.truncate(names.join("\n")))
    }
}

/// Tool for creating directories (including parents)
pub struct MakeDirectoryTool;

#[async_trait]
impl Tool for MakeDirectoryTool {
    fn name(&self) -> &str {
        "make_directory"
    }

    fn description(&self) -> &str {
        "Creates a new directory (including parents)."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with_required("path", ParameterProperty::string("Directory to create"))
    }

    fn failure_label(&self) -> &str {
        "Error creating directory"
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let path_str = required_str(args, "path")?;
        let path = ctx.resolve(path_str);

        fs::create_dir_all(&path).with_context(|| format!("{}", path.display()))?;

        Ok(format!("Successfully created directory {}", path_str))
    }
}
