//! File write tool

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fs;

use crate::tools::{required_str, ParameterProperty, ParameterSchema, Tool, ToolContext};

/// Tool for writing file contents
pub struct FileWriteTool;

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a file. Creates parent directories if needed."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .with_required("path", ParameterProperty::string("The path to write to (absolute or relative)"))
            .with_required("content", ParameterProperty::string("The content to write to the file"))
    }

    fn failure_label(&self) -> &str {
        "Error writing file"
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let path_str = required_str(args, "path")?;
        let content = required_str(args, "content")?;
        let path = ctx.resolve(path_str);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directories for {}", path.display()))?;
        }

        fs::write(&path, content).with_context(|| format!("{}", path.display()))?;

        Ok(format!("Successfully wrote to {}", path_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());
        let args = json!({ "path": "test.txt", "content": "Hello, World!" });

        let output = FileWriteTool.execute(&args, &ctx).await.unwrap();
        assert_eq!(output, "Successfully wrote to test.txt");

        let content = fs::read_to_string(temp_dir.path().join("test.txt")).unwrap();
        assert_eq!(content, "Hello, World!");
    }

    #[tokio::test]
    async fn test_write_file_creates_dirs_and_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("a/b/c/test.txt");

        let ctx = ToolContext::new(temp_dir.path().to_path_buf());
        let path = file_path.to_str().unwrap();

        FileWriteTool
            .execute(&json!({ "path": path, "content": "first" }), &ctx)
            .await
            .unwrap();
        FileWriteTool
            .execute(&json!({ "path": path, "content": "second" }), &ctx)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_write_file_missing_content() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());

        let err = FileWriteTool
            .execute(&json!({ "path": "x.txt" }), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("content"));
        assert!(!temp_dir.path().join("x.txt").exists());
    }
}
