//! Tool routing and dispatch

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::registry::ToolRegistry;
use super::security::{ConfirmationHandler, ConfirmationResult};
use super::{ToolCall, ToolContext};

/// Result of routing a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult {
    /// Tool ran to completion
    Success(String),
    /// Tool ran and failed; carries the labelled failure text
    Failed(String),
    /// Operator denied execution
    Denied,
    /// No tool with this name is registered
    NotFound(String),
}

impl RouteResult {
    /// The result text fed back to the model
    pub fn into_text(self) -> String {
        match self {
            RouteResult::Success(output) | RouteResult::Failed(output) => output,
            RouteResult::Denied => "Permission denied by user.".to_string(),
            RouteResult::NotFound(name) => format!("Error: Tool {} not found.", name),
        }
    }
}

/// Router for dispatching tool calls through the permission gate
pub struct ToolRouter {
    registry: ToolRegistry,
    confirmation: Arc<dyn ConfirmationHandler>,
    ctx: ToolContext,
}

impl ToolRouter {
    /// Create a new router with the given registry and confirmation handler
    pub fn new(
        registry: ToolRegistry,
        confirmation: impl ConfirmationHandler + 'static,
        ctx: ToolContext,
    ) -> Self {
        Self {
            registry,
            confirmation: Arc::new(confirmation),
            ctx,
        }
    }

    /// Route a single tool call. Never fails: every outcome is a `RouteResult`.
    #[instrument(skip(self, tool_call), fields(tool = %tool_call.name))]
    pub async fn route(&self, tool_call: &ToolCall) -> RouteResult {
        let tool = match self.registry.get(&tool_call.name) {
            Some(t) => t,
            None => {
                warn!(tool = %tool_call.name, "Tool not found");
                return RouteResult::NotFound(tool_call.name.clone());
            }
        };

        debug!("Requesting operator confirmation");
        if self.confirmation.confirm(tool_call).await == ConfirmationResult::Denied {
            info!(tool = %tool_call.name, "Operator denied tool execution");
            return RouteResult::Denied;
        }

        info!(tool = %tool_call.name, "Executing tool");
        match tool.execute(&tool_call.arguments, &self.ctx).await {
            Ok(output) => {
                info!(tool = %tool_call.name, output_len = output.len(), "Tool executed successfully");
                RouteResult::Success(output)
            }
            Err(e) => {
                warn!(tool = %tool_call.name, error = %format!("{:#}", e), "Tool execution failed");
                RouteResult::Failed(format!("{}: {:#}", tool.failure_label(), e))
            }
        }
    }

    /// Route a call and return the result text
    pub async fn invoke(&self, tool_call: &ToolCall) -> String {
        self.route(tool_call).await.into_text()
    }

    /// Get a reference to the registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for ToolRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRouter")
            .field("registry", &self.registry)
            .field("ctx", &self.ctx)
            .finish()
    }
}
