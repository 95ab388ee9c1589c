//! Parsing of model output into a single action
//!
//! Models wrap JSON in prose and markdown fences, so the raw text is never
//! trusted as JSON. The span from the first `{` to the last `}` is parsed.
//! That can merge several objects or swallow trailing text; it is kept as is
//! because models are prompted against exactly this behavior.

use serde_json::{Map, Value};

/// The single instruction a step produces
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Invoke a registered tool
    ToolCall {
        name: String,
        args: Map<String, Value>,
    },
    /// The task is done
    FinalAnswer { text: String },
    /// Output could not be read as an action object
    Unparseable { reason: String, raw: String },
    /// A valid object carrying neither a tool nor a final answer
    NoAction,
}

/// Slice from the first `{` to the last `}`, if both exist in that order
pub fn extract_json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

impl Action {
    /// Parse raw model output. Never fails; bad input becomes `Unparseable`.
    pub fn parse(raw: &str) -> Action {
        let unparseable = |reason: String| Action::Unparseable {
            reason,
            raw: raw.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return unparseable("Model returned an empty response".to_string());
        }

        let span = match extract_json_span(trimmed) {
            Some(span) => span,
            None => return unparseable("No JSON object found in model output".to_string()),
        };

        let mut object = match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(object)) => object,
            Ok(_) => return unparseable("Action must be a JSON object".to_string()),
            Err(e) => return unparseable(format!("Invalid JSON: {}", e)),
        };

        match object.remove("tool") {
            Some(Value::String(name)) if !name.is_empty() => {
                let args = match object.remove("args") {
                    None | Some(Value::Null) => Map::new(),
                    Some(Value::Object(args)) => args,
                    Some(_) => return unparseable("\"args\" must be a JSON object".to_string()),
                };
                return Action::ToolCall { name, args };
            }
            Some(Value::Null) | Some(Value::String(_)) | None => {}
            Some(_) => return unparseable("\"tool\" must be a string".to_string()),
        }

        match object.remove("final_answer") {
            Some(Value::String(text)) if !text.is_empty() => Action::FinalAnswer { text },
            _ => Action::NoAction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_call(name: &str, args: Value) -> Action {
        Action::ToolCall {
            name: name.to_string(),
            args: args.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_parse_raw_tool_call() {
        let raw = r#"{"tool": "list_dir", "args": {"path": "src"}}"#;
        assert_eq!(Action::parse(raw), tool_call("list_dir", json!({ "path": "src" })));
    }

    #[test]
    fn test_parse_tool_call_in_prose() {
        let raw = r#"Sure! I'll write the file now.
{"tool":"write_file","args":{"path":"hello.txt","content":"Hi"}}
Let me know if you need anything else."#;
        assert_eq!(
            Action::parse(raw),
            tool_call("write_file", json!({ "path": "hello.txt", "content": "Hi" }))
        );
    }

    #[test]
    fn test_parse_markdown_fence() {
        let raw = "```json\n{\"tool\": \"read_file\", \"args\": {\"path\": \"a.txt\"}}\n";
        assert_eq!(Action::parse(raw), tool_call("read_file", json!({ "path": "a.txt" })));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let raw = r#"noise {"tool": "x", "args": {"nested": {"deep": [1, 2]}}} trailing"#;
        let once = extract_json_span(raw).unwrap();
        assert_eq!(once, r#"{"tool": "x", "args": {"nested": {"deep": [1, 2]}}}"#);
        assert_eq!(extract_json_span(once), Some(once));
        assert_eq!(Action::parse(raw), Action::parse(once));
    }

    #[test]
    fn test_parse_final_answer() {
        let raw = r#"{"final_answer": "Created hello.txt"}"#;
        assert_eq!(
            Action::parse(raw),
            Action::FinalAnswer {
                text: "Created hello.txt".to_string()
            }
        );
    }

    #[test]
    fn test_tool_takes_precedence_over_final_answer() {
        let raw = r#"{"tool": "list_dir", "final_answer": "done"}"#;
        assert_eq!(Action::parse(raw), tool_call("list_dir", json!({})));
    }

    #[test]
    fn test_parse_empty() {
        for raw in ["", "   \n"] {
            match Action::parse(raw) {
                Action::Unparseable { reason, .. } => assert!(reason.contains("empty")),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_truncated_payload() {
        let raw = r#"{"tool": "write_file", "args": {"path": "a.txt""#;
        assert!(matches!(Action::parse(raw), Action::Unparseable { .. }));

        let raw = r#"{"tool": "write_file", "args": {"path": "a.txt"}"#;
        match Action::parse(raw) {
            Action::Unparseable { reason, raw: kept } => {
                assert!(reason.starts_with("Invalid JSON"));
                assert_eq!(kept, raw);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_no_braces() {
        match Action::parse("I think we should list the directory") {
            Action::Unparseable { reason, .. } => assert!(reason.contains("No JSON object")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(Action::parse("} backwards {"), Action::Unparseable { .. }));
    }

    #[test]
    fn test_multiple_objects_are_merged_into_one_span() {
        let raw = r#"{"tool": "a", "args": {}} and then {"tool": "b", "args": {}}"#;
        assert!(matches!(Action::parse(raw), Action::Unparseable { .. }));
    }

    #[test]
    fn test_parse_no_action() {
        assert_eq!(Action::parse(r#"{"thought": "hmm"}"#), Action::NoAction);
        assert_eq!(Action::parse(r#"{"tool": "", "final_answer": ""}"#), Action::NoAction);
    }

    #[test]
    fn test_parse_bad_args() {
        assert!(matches!(
            Action::parse(r#"{"tool": "list_dir", "args": "src"}"#),
            Action::Unparseable { .. }
        ));
        assert_eq!(
            Action::parse(r#"{"tool": "list_dir", "args": null}"#),
            tool_call("list_dir", json!({}))
        );
    }

    #[test]
    fn test_parse_non_string_tool() {
        assert!(matches!(
            Action::parse(r#"{"tool": 5}"#),
            Action::Unparseable { .. }
        ));
    }
}
