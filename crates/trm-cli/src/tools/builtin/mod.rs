//! Built-in tools for the reasoning loop

mod directory;
mod file_read;
mod file_write;
mod shell;
mod web_search;

pub use directory::{ListDirTool, MakeDirectoryTool};
pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use shell::{CommandOutput, CommandRunner, ExecuteCommandTool, ShellRunner};
pub use web_search::{SearchProvider, WebSearchTool};

use super::registry::ToolRegistry;

/// Create the fixed tool catalog with the platform shell behind `execute_command`
pub fn create_default_registry(search: SearchProvider) -> ToolRegistry {
    create_registry(search, ShellRunner::new())
}

/// Create the fixed tool catalog.
///
/// Registration order is the order tools appear in the prompt schema.
pub fn create_registry(search: SearchProvider, runner: impl CommandRunner + 'static) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(FileReadTool);
    registry.register(FileWriteTool);
    registry.register(ListDirTool);
    registry.register(MakeDirectoryTool);
    registry.register(ExecuteCommandTool::new(runner));
    registry.register(WebSearchTool::new(search));

    registry
}
