//! Tool registry for managing available tools

use std::sync::Arc;

use super::Tool;

/// Registry of available tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool, replacing any tool with the same name in place
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let tool: Arc<dyn Tool> = Arc::new(tool);
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// List all registered tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Model-readable description of every tool, one line each.
    ///
    /// Derived from the registered tools, so it always matches what `get` resolves.
    pub fn schema(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.schema_line())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParameterProperty, ParameterSchema, ToolContext};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::Value;

    struct MockTool {
        name: &'static str,
        description: &'static str,
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            self.description
        }

        fn parameters_schema(&self) -> ParameterSchema {
            ParameterSchema::new().with_required("text", ParameterProperty::string("Text"))
        }

        fn failure_label(&self) -> &str {
            "Error mocking"
        }

        async fn execute(&self, _args: &Value, _ctx: &ToolContext) -> Result<String> {
            Ok("mock output".to_string())
        }
    }

    fn mock(name: &'static str) -> MockTool {
        MockTool {
            name,
            description: "A mock tool for testing",
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("mock"));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("mock").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_registry_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("zeta"));
        registry.register(mock("alpha"));
        registry.register(mock("mid"));

        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("a"));
        registry.register(mock("b"));
        registry.register(MockTool {
            name: "a",
            description: "Replacement",
        });

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().description(), "Replacement");
    }

    #[test]
    fn test_registry_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("first"));
        registry.register(mock("second"));

        assert_eq!(
            registry.schema(),
            "- first(text: string): A mock tool for testing\n- second(text: string): A mock tool for testing"
        );
    }
}
