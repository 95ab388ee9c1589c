//! File read tool

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fs;

use crate::tools::{required_str, ParameterProperty, ParameterSchema, Tool, ToolContext};

/// Tool for reading file contents
pub struct FileReadTool;

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads the content of a file."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with_required(
            "path",
            ParameterProperty::string("The path to the file to read (absolute or relative to working directory)"),
        )
    }

    fn failure_label(&self) -> &str {
        "Error reading file"
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let path = ctx.resolve(required_str(args, "path")?);

        let content = fs::read_to_string(&path)
            .with_context(|| format!("{}", path.display()))?;

        Ok(ctx.truncate(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn test_read_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "line 1").unwrap();
        writeln!(temp, "line 2").unwrap();

        let ctx = ToolContext::default();
        let args = json!({ "path": temp.path().to_str().unwrap() });

        let output = FileReadTool.execute(&args, &ctx).await.unwrap();
        assert_eq!(output, "line 1\nline 2\n");
    }

    #[tokio::test]
    async fn test_read_relative_to_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "relative").unwrap();

        let ctx = ToolContext::new(temp_dir.path().to_path_buf());
        let output = FileReadTool
            .execute(&json!({ "path": "notes.txt" }), &ctx)
            .await
            .unwrap();
        assert_eq!(output, "relative");
    }

    #[tokio::test]
    async fn test_read_nonexistent_file() {
        let ctx = ToolContext::default();
        let args = json!({ "path": "/nonexistent/path/file.txt" });

        let err = FileReadTool.execute(&args, &ctx).await.unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/path/file.txt"));
    }
}
