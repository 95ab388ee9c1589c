//! Session settings
//!
//! Settings start from command-line flags. A JSON config file, when given and
//! present, is merged over them key by key; keys this version does not know
//! are carried through unchanged when the settings are saved again.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use trm_core::{RetryConfig, DEFAULT_OLLAMA_URL};

use crate::agent::AgentConfig;
use crate::skills::DEFAULT_SKILLS_DIR;
use crate::tools::security::TimeoutPolicy;

/// File written by model switching when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Everything a session needs to know before it starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ollama_url: String,
    pub model: String,
    /// Approval timeout in seconds
    pub timeout: u64,
    /// Model request timeout in seconds
    pub ollama_timeout: u64,
    pub ollama_retries: u32,
    pub max_steps: usize,
    pub reasoning_cycles: usize,
    pub on_approval_timeout: TimeoutPolicy,
    pub search_enabled: bool,
    pub skills_dir: PathBuf,
    /// Print step-by-step progress to the console
    pub show_progress: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: "llama3".to_string(),
            timeout: 60,
            ollama_timeout: 2000,
            ollama_retries: 3,
            max_steps: 50,
            reasoning_cycles: 3,
            on_approval_timeout: TimeoutPolicy::Approve,
            search_enabled: true,
            skills_dir: PathBuf::from(DEFAULT_SKILLS_DIR),
            show_progress: true,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Merge the JSON object at `path` over these settings.
    ///
    /// A missing file is not an error; the settings come back unchanged.
    pub fn merge_file(self, path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using flags only");
            return Ok(self);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let overrides: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        self.merge(overrides)
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Shallow key-by-key merge of a JSON object
    pub fn merge(self, overrides: Value) -> Result<Self> {
        let Value::Object(overrides) = overrides else {
            bail!("Config must be a JSON object");
        };

        let Value::Object(mut base) = serde_json::to_value(&self)? else {
            bail!("Settings did not serialize to an object");
        };
        for (key, value) in overrides {
            base.insert(key, value);
        }

        Ok(serde_json::from_value(Value::Object(base))?)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama_timeout)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(self.ollama_retries)
    }

    /// Agent configuration for a session rooted at `working_dir`
    pub fn agent_config(&self, working_dir: PathBuf) -> AgentConfig {
        AgentConfig::default()
            .with_max_steps(self.max_steps)
            .with_reasoning_cycles(self.reasoning_cycles)
            .with_working_dir(working_dir)
            .with_verbose(self.show_progress)
    }
}
