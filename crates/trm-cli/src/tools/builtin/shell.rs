//! Shell command execution tool
//!
//! Commands run through a [`CommandRunner`]. The tool only formats output, so
//! a sandboxed or allow-listing runner can be swapped in without touching the
//! reasoning loop.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::tools::{required_str, ParameterProperty, ParameterSchema, Tool, ToolContext};

/// Fixed execution ceiling for model-chosen commands
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if killed by a signal
    pub status: Option<i32>,
}

/// Narrow interface for running a shell command
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput>;
}

/// Runs commands through the platform shell with a timeout
#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            timeout: COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput> {
        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %command, cwd = %cwd.display(), "Running shell command");

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.context("Failed to spawn shell")?,
            Err(_) => bail!("Command timed out after {} seconds", self.timeout.as_secs_f32()),
        };

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

/// Tool for executing shell commands
pub struct ExecuteCommandTool {
    runner: Arc<dyn CommandRunner>,
}

impl ExecuteCommandTool {
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Runs a shell command and returns stdout/stderr."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with_required("command", ParameterProperty::string("The shell command to execute"))
    }

    fn failure_label(&self) -> &str {
        "Error executing command"
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let command = required_str(args, "command")?;

        if !ctx.working_dir.exists() {
            bail!("Working directory does not exist: {}", ctx.working_dir.display());
        }

        let output = self.runner.run(command, &ctx.working_dir).await?;
        debug!(status = ?output.status, "Command finished");

        Ok(ctx.truncate(format!(
            "STDOUT:\n{}\nSTDERR:\n{}",
            output.stdout, output.stderr
        )))
    }
}
