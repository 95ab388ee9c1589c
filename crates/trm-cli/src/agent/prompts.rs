//! Prompt templates for the three model calls of a step

use serde_json::json;

/// Ask whether the next step needs deliberate planning
pub fn complexity_prompt(task: &str, state: &str) -> String {
    format!(
        "Task: {task}
Current State: {state}

Does the NEXT step require complex planning or code generation?
Respond with ONLY 'YES' or 'NO'.
Complex:"
    )
}

/// One reflection cycle. `reflections` holds only this step's earlier cycles.
pub fn reflection_prompt(task: &str, state: &str, reflections: &[String]) -> String {
    format!(
        "You are a senior software engineer reasoning step by step about a task.
Task: {task}
Context: {state}
Reflections so far: {reflections}

Analyze the task and progress. What is the next logical step to complete the task?
Focus on identifying errors, missing information, or complex logic needs.
Keep your reasoning deep but concise.",
        reflections = json!(reflections)
    )
}

/// Ask for exactly one JSON action
pub fn action_prompt(
    tools_schema: &str,
    skill_names: &[String],
    reflections: &[String],
    state: &str,
) -> String {
    format!(
        r#"You are a senior software engineer. You MUST complete the task using the provided tools.
Available Tools:
{tools_schema}

Available Skills: {skills}

Based on these reflections: {reflections}
And current state: {state}

Choose exactly ONE action from the tools above. Use `execute_command` for system operations not covered by other tools.
Output ONLY a valid JSON object.
Format for tool usage:
{{
  "tool": "tool_name",
  "args": {{ "arg1": "value" }}
}}

If the task is fully completed, verify everything and output:
{{
  "final_answer": "Summary of what was done and verification results."
}}

JSON only:"#,
        skills = json!(skill_names),
        reflections = json!(reflections)
    )
}

/// Appended to a tool result that reports an unknown tool
pub fn tool_hint(names: &[&str]) -> String {
    format!("\nHint: Choose from available tools: {}", json!(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_prompt() {
        let prompt = complexity_prompt("build", "Task: build");
        assert!(prompt.starts_with("Task: build\nCurrent State: Task: build"));
        assert!(prompt.ends_with("Complex:"));
    }

    #[test]
    fn test_reflection_prompt_embeds_json_reflections() {
        let prompt = reflection_prompt("t", "Task: t", &["first \"idea\"".to_string()]);
        assert!(prompt.contains(r#"Reflections so far: ["first \"idea\""]"#));

        let prompt = reflection_prompt("t", "Task: t", &[]);
        assert!(prompt.contains("Reflections so far: []"));
    }

    #[test]
    fn test_action_prompt_sections() {
        let prompt = action_prompt(
            "- list_dir(path: string = \".\"): Lists files in a directory.",
            &["deploy".to_string()],
            &[],
            "Task: t",
        );

        assert!(prompt.contains("Available Tools:\n- list_dir("));
        assert!(prompt.contains(r#"Available Skills: ["deploy"]"#));
        assert!(prompt.contains("Based on these reflections: []"));
        assert!(prompt.contains("And current state: Task: t"));
        assert!(prompt.contains("\"tool\": \"tool_name\""));
        assert!(prompt.ends_with("JSON only:"));
    }

    #[test]
    fn test_tool_hint() {
        assert_eq!(
            tool_hint(&["read_file", "list_dir"]),
            "\nHint: Choose from available tools: [\"read_file\",\"list_dir\"]"
        );
    }
}
