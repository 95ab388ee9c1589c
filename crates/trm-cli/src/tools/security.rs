//! Permission gate for tool execution
//!
//! Every tool call is shown to the operator, who has a bounded window to deny
//! it. Silence is treated according to [`TimeoutPolicy`]. The default is
//! `Approve`, so the gate fails open and unattended runs keep going. Select
//! `Deny` to fail closed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ToolCall;

const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Result of a confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// Operator approved, or stayed silent under a fail-open policy
    Approved,
    /// Operator denied, or stayed silent under a fail-closed policy
    Denied,
}

/// What an unanswered prompt resolves to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Fail open
    #[default]
    Approve,
    /// Fail closed
    Deny,
}

impl TimeoutPolicy {
    fn outcome(self) -> ConfirmationResult {
        match self {
            TimeoutPolicy::Approve => ConfirmationResult::Approved,
            TimeoutPolicy::Deny => ConfirmationResult::Denied,
        }
    }
}

impl std::fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutPolicy::Approve => write!(f, "approve"),
            TimeoutPolicy::Deny => write!(f, "deny"),
        }
    }
}

/// Trait for handling tool execution confirmations
#[async_trait]
pub trait ConfirmationHandler: Send + Sync {
    /// Request confirmation for a tool call
    async fn confirm(&self, tool_call: &ToolCall) -> ConfirmationResult;
}

/// Interpret one line of operator input. Only an explicit "n"/"no" denies.
pub fn interpret_response(line: &str) -> ConfirmationResult {
    match line.trim().to_lowercase().as_str() {
        "n" | "no" => ConfirmationResult::Denied,
        _ => ConfirmationResult::Approved,
    }
}

/// Forward lines from a blocking reader over a channel.
///
/// The read runs on a detached OS thread, so an abandoned wait never holds up
/// runtime shutdown. The channel closes on end of input or a read error.
fn spawn_line_reader<R>(mut reader: R) -> UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    let spawned = std::thread::Builder::new()
        .name("operator-input".to_string())
        .spawn(move || loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read operator input");
                    break;
                }
            }
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start operator input reader");
    }
    rx
}

/// "60 seconds", "0.1 seconds"
fn describe_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{} seconds", timeout.as_secs())
    } else {
        format!("{:.1} seconds", timeout.as_secs_f32())
    }
}

/// Terminal confirmation with a bounded wait for operator input
pub struct TerminalConfirmation {
    timeout: Duration,
    on_timeout: TimeoutPolicy,
    lines: Mutex<UnboundedReceiver<String>>,
}

impl TerminalConfirmation {
    /// Read answers from stdin
    pub fn new(timeout: Duration, on_timeout: TimeoutPolicy) -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()), timeout, on_timeout)
    }

    /// Read answers from any blocking line source
    pub fn from_reader<R>(reader: R, timeout: Duration, on_timeout: TimeoutPolicy) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self::with_lines(spawn_line_reader(reader), timeout, on_timeout)
    }

    /// Take answers from a channel of lines; a closed channel is end of input
    pub fn with_lines(
        lines: UnboundedReceiver<String>,
        timeout: Duration,
        on_timeout: TimeoutPolicy,
    ) -> Self {
        Self {
            timeout,
            on_timeout,
            lines: Mutex::new(lines),
        }
    }

    fn announce(&self, tool_call: &ToolCall) {
        println!();
        println!("{}[ACTION]{} Tool: {}{}{}", YELLOW, RESET, BOLD, tool_call.name, RESET);

        if let Ok(pretty) = serde_json::to_string_pretty(&tool_call.arguments) {
            for line in pretty.lines() {
                println!("  {}", line);
            }
        }

        let verb = match self.on_timeout {
            TimeoutPolicy::Approve => "Auto-approving",
            TimeoutPolicy::Deny => "Auto-denying",
        };
        println!(
            "{} in {}... (Press ENTER to approve, 'n' to deny)",
            verb,
            describe_timeout(self.timeout)
        );
    }
}

#[async_trait]
impl ConfirmationHandler for TerminalConfirmation {
    async fn confirm(&self, tool_call: &ToolCall) -> ConfirmationResult {
        self.announce(tool_call);

        let mut lines = self.lines.lock().await;

        let result = match tokio::time::timeout(self.timeout, lines.recv()).await {
            Err(_) => {
                info!(
                    tool = %tool_call.name,
                    policy = %self.on_timeout,
                    "No operator response before approval timeout"
                );
                self.on_timeout.outcome()
            }
            Ok(None) => {
                debug!(tool = %tool_call.name, policy = %self.on_timeout, "Operator input closed");
                self.on_timeout.outcome()
            }
            Ok(Some(line)) => interpret_response(&line),
        };

        debug!(tool = %tool_call.name, result = ?result, "Confirmation result");
        result
    }
}

/// A confirmation handler that always approves (for unattended runs and tests)
#[allow(dead_code)]
pub struct AutoApprove;

#[async_trait]
impl ConfirmationHandler for AutoApprove {
    async fn confirm(&self, _tool_call: &ToolCall) -> ConfirmationResult {
        ConfirmationResult::Approved
    }
}

/// A confirmation handler that always denies (for testing)
#[allow(dead_code)]
pub struct AutoDeny;

#[async_trait]
impl ConfirmationHandler for AutoDeny {
    async fn confirm(&self, _tool_call: &ToolCall) -> ConfirmationResult {
        ConfirmationResult::Denied
    }
}
