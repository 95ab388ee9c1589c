//! trm: Autonomous think-refine-act coding agent for local LLMs
//!
//! Give it a task and it plans, reflects and calls tools against an Ollama
//! model until the task is done. With no task it lists models; with a number
//! it switches to that model.

mod agent;
mod commands;
mod config;
mod skills;
mod tools;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Settings, DEFAULT_CONFIG_FILE};
use skills::DEFAULT_SKILLS_DIR;
use tools::security::TimeoutPolicy;

#[derive(Debug, Parser)]
#[command(name = "trm")]
#[command(about = "Autonomous think-refine-act coding agent for local LLMs", version)]
struct Cli {
    /// The task to perform, or a model number to switch to
    task: Option<String>,

    /// Ollama URL
    #[arg(long, env = "OLLAMA_URL", default_value = trm_core::DEFAULT_OLLAMA_URL)]
    url: String,

    /// Ollama model name
    #[arg(long, env = "TRM_MODEL", default_value = "llama3")]
    model: String,

    /// Auto-approval timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Ollama request timeout in seconds
    #[arg(long, default_value_t = 2000)]
    ollama_timeout: u64,

    /// Ollama request retries
    #[arg(long, default_value_t = 3)]
    ollama_retries: u32,

    /// Path to a JSON config file merged over these flags
    #[arg(long, env = "TRM_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum steps before giving up
    #[arg(long, default_value_t = 50)]
    max_steps: usize,

    /// Reflection cycles on complex steps
    #[arg(long, default_value_t = 3)]
    cycles: usize,

    /// Deny tool calls nobody answers within the timeout
    #[arg(long)]
    deny_on_timeout: bool,

    /// Disable web search
    #[arg(long)]
    no_search: bool,

    /// Skill catalog directory
    #[arg(long, default_value = DEFAULT_SKILLS_DIR)]
    skills_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress step-by-step progress output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Settings from flags alone
    fn settings(&self) -> Settings {
        Settings {
            ollama_url: self.url.clone(),
            model: self.model.clone(),
            timeout: self.timeout,
            ollama_timeout: self.ollama_timeout,
            ollama_retries: self.ollama_retries,
            max_steps: self.max_steps,
            reasoning_cycles: self.cycles,
            on_approval_timeout: if self.deny_on_timeout {
                TimeoutPolicy::Deny
            } else {
                TimeoutPolicy::Approve
            },
            search_enabled: !self.no_search,
            skills_dir: self.skills_dir.clone(),
            show_progress: !self.quiet,
            ..Default::default()
        }
    }
}

fn is_model_number(task: &str) -> bool {
    !task.is_empty() && task.chars().all(|c| c.is_ascii_digit())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = cli.settings();
    if let Some(ref path) = cli.config {
        settings = settings.merge_file(path)?;
    }

    match cli.task.as_deref() {
        None => commands::list_models(&settings).await,
        Some(task) if is_model_number(task) => {
            let config_path = cli
                .config
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
            commands::switch_model(settings, task, config_path).await
        }
        Some(task) => commands::run_task(&settings, task).await,
    }
}
