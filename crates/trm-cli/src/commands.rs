//! CLI commands implementation

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use trm_core::OllamaClient;

use crate::agent::{AgentLoop, Outcome, StateRecord};
use crate::config::Settings;
use crate::skills::SkillCatalog;
use crate::tools::builtin::{create_default_registry, SearchProvider};
use crate::tools::router::ToolRouter;
use crate::tools::security::TerminalConfirmation;
use crate::tools::ToolContext;

// ANSI color codes
const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn client_for(settings: &Settings) -> OllamaClient {
    OllamaClient::new(&settings.ollama_url, &settings.model)
        .with_timeout(settings.request_timeout())
        .with_retry(settings.retry())
}

/// Numbered listing lines, current model starred
fn model_lines(models: &[String], current: &str) -> Vec<String> {
    models
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let star = if name == current { "* " } else { "  " };
            format!("{}{}. {}", star, i + 1, name)
        })
        .collect()
}

/// Resolve a 1-based selection against the listing
fn select_model<'a>(models: &'a [String], selection: &str) -> Option<&'a str> {
    let index: usize = selection.parse().ok()?;
    index
        .checked_sub(1)
        .and_then(|i| models.get(i))
        .map(String::as_str)
}

/// Show available models
pub async fn list_models(settings: &Settings) -> Result<()> {
    let models = client_for(settings).list_models().await;

    if models.is_empty() {
        println!("\n{}No models found. Is Ollama running?{}", RED, RESET);
        return Ok(());
    }

    println!("\n{}Available Ollama Models{}", BOLD, RESET);
    for line in model_lines(&models, &settings.model) {
        println!("{}", line);
    }
    println!(
        "\nTip: Run {}trm <number>{} to switch models.",
        BLUE, RESET
    );
    Ok(())
}

/// Switch the configured model by its listing number and persist the settings
pub async fn switch_model(mut settings: Settings, selection: &str, config_path: &Path) -> Result<()> {
    let models = client_for(&settings).list_models().await;

    let Some(model) = select_model(&models, selection) else {
        bail!("Invalid model number: {}", selection);
    };

    settings.model = model.to_string();
    settings.save(config_path)?;
    info!(model = %settings.model, path = %config_path.display(), "Switched model");

    println!("\n{}Model switched to:{} {}", GREEN, RESET, settings.model);
    Ok(())
}

/// Run one agent session for `task`
pub async fn run_task(settings: &Settings, task: &str) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;

    let search = if settings.search_enabled {
        SearchProvider::duckduckgo()
    } else {
        SearchProvider::Unavailable
    };
    let router = ToolRouter::new(
        create_default_registry(search),
        TerminalConfirmation::new(settings.approval_timeout(), settings.on_approval_timeout),
        ToolContext::new(working_dir.clone()),
    );
    let skills = SkillCatalog::open(working_dir.join(&settings.skills_dir))?;

    let agent = AgentLoop::new(
        Arc::new(client_for(settings)),
        router,
        skills,
        settings.agent_config(working_dir),
    );

    let report = agent.run(task).await?;
    info!(
        steps = report.steps,
        actions = report.state.count(|r| matches!(r, StateRecord::Action { .. })),
        errors = report.state.count(|r| matches!(r, StateRecord::Error { .. })),
        completed = report.outcome.is_completed(),
        "Session finished"
    );

    let color = match report.outcome {
        Outcome::Completed(_) => GREEN,
        Outcome::BudgetExhausted { max_steps } => {
            warn!(max_steps, "Task did not finish within the step budget");
            YELLOW
        }
    };
    println!(
        "\n{}{}Result{} ({} steps): {}",
        BOLD,
        color,
        RESET,
        report.steps,
        report.outcome.message()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_model_lines_star_current() {
        let lines = model_lines(&names(&["llama3", "mistral"]), "mistral");
        assert_eq!(lines, vec!["  1. llama3", "* 2. mistral"]);
    }

    #[test]
    fn test_select_model() {
        let models = names(&["llama3", "mistral"]);
        assert_eq!(select_model(&models, "1"), Some("llama3"));
        assert_eq!(select_model(&models, "2"), Some("mistral"));
        assert_eq!(select_model(&models, "0"), None);
        assert_eq!(select_model(&models, "3"), None);
        assert_eq!(select_model(&models, "99999999999999999999999"), None);
    }

    async fn tags_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "llama3" }, { "name": "qwen2.5-coder" }]
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_switch_model_persists() {
        let server = tags_server().await;
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let settings = Settings {
            ollama_url: server.uri(),
            ..Default::default()
        };
        switch_model(settings, "2", &config_path).await.unwrap();

        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(&config_path).unwrap()).unwrap();
        assert_eq!(saved["model"], "qwen2.5-coder");
        assert_eq!(saved["ollama_url"], server.uri());
    }

    #[tokio::test]
    async fn test_switch_model_out_of_range() {
        let server = tags_server().await;
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let settings = Settings {
            ollama_url: server.uri(),
            ..Default::default()
        };
        let err = switch_model(settings, "5", &config_path).await.unwrap_err();

        assert!(err.to_string().contains("Invalid model number: 5"));
        assert!(!config_path.exists());
    }
}
