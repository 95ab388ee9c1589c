//! Agent loop implementation
//!
//! Each step asks the model whether the next move is complex, optionally runs
//! a fixed number of reflection cycles, then asks for exactly one JSON action
//! and dispatches it. Nothing the model returns can end the session except a
//! final answer; everything else is recorded in the state and the loop moves on.

use std::fmt;
use std::io::{stdout, Write};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use trm_core::LanguageModel;

use crate::skills::SkillCatalog;
use crate::tools::router::ToolRouter;
use crate::tools::ToolCall;

use super::action::Action;
use super::prompts::{action_prompt, complexity_prompt, reflection_prompt, tool_hint};
use super::state::{AgentConfig, AgentReport, Outcome, SessionState};

// ANSI colors
const GREEN: &str = "\x1b[92m";
const BLUE: &str = "\x1b[94m";
const YELLOW: &str = "\x1b[93m";
const CYAN: &str = "\x1b[96m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const ACTION_STOP: &[&str] = &["```"];
const NO_ACTION_NOTE: &str = "No valid tool provided. Reasoning must be more specific.";
const PREVIEW_CHARS: usize = 100;

/// The agent loop orchestrator
pub struct AgentLoop {
    model: Arc<dyn LanguageModel>,
    router: ToolRouter,
    skills: SkillCatalog,
    config: AgentConfig,
    console: Mutex<Box<dyn Write + Send>>,
}

impl AgentLoop {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        router: ToolRouter,
        skills: SkillCatalog,
        config: AgentConfig,
    ) -> Self {
        debug!(
            tools = router.registry().len(),
            model = %model.model_name(),
            "Creating agent loop"
        );
        Self {
            model,
            router,
            skills,
            config,
            console: Mutex::new(Box::new(stdout())),
        }
    }

    /// Send progress output somewhere other than stdout
    #[allow(dead_code)]
    pub fn with_console(mut self, console: impl Write + Send + 'static) -> Self {
        self.console = Mutex::new(Box::new(console));
        self
    }

    /// Console progress, shown only when verbose. Write failures are logged and dropped.
    fn progress(&self, args: fmt::Arguments<'_>) {
        if !self.config.verbose {
            return;
        }
        let Ok(mut console) = self.console.lock() else {
            return;
        };
        if let Err(e) = console.write_fmt(args).and_then(|_| console.flush()) {
            debug!(error = %e, "Failed to write progress");
        }
    }

    /// Run the agent with a task until it answers or the step budget runs out
    #[instrument(skip(self), fields(model = %self.model.model_name()))]
    pub async fn run(&self, task: &str) -> Result<AgentReport> {
        info!(
            working_dir = %self.config.working_dir.display(),
            max_steps = self.config.max_steps,
            reasoning_cycles = self.config.reasoning_cycles,
            "Starting agent loop"
        );
        self.progress(format_args!("\n{}Starting task:{} {}\n", BLUE, RESET, task));

        let mut state = SessionState::new(task);

        for step in 1..=self.config.max_steps {
            debug!(step, records = state.records().len(), "Starting step");
            self.progress(format_args!("\n{}--- Step {} ---{}\n", DIM, step, RESET));

            let rendered = state.render();
            let reflections = if self.is_complex(task, &rendered).await {
                self.reflect(task, &rendered).await
            } else {
                self.progress(format_args!("  Processing action...\n"));
                Vec::new()
            };

            let prompt = action_prompt(
                &self.router.registry().schema(),
                &self.skills.names(),
                &reflections,
                &rendered,
            );
            let raw = self
                .model
                .generate(&prompt, self.config.action_temperature, ACTION_STOP)
                .await;

            match Action::parse(&raw) {
                Action::ToolCall { name, args } => {
                    let call = ToolCall::new(name.clone(), Value::Object(args));
                    let mut result = self.router.invoke(&call).await;
                    if result.to_lowercase().contains("not found") {
                        result.push_str(&tool_hint(&self.router.registry().names()));
                    }

                    self.progress(format_args!(
                        "  {}[Tool: {}]{} {}...\n",
                        CYAN,
                        name,
                        RESET,
                        result.chars().take(PREVIEW_CHARS).collect::<String>()
                    ));
                    state.record_action(name, result);
                }
                Action::FinalAnswer { text } => {
                    info!(steps = step, "Agent completed task");
                    self.progress(format_args!("\n{}Task completed:{} {}\n", GREEN, RESET, text));
                    return Ok(AgentReport {
                        outcome: Outcome::Completed(text),
                        steps: step,
                        state,
                    });
                }
                Action::Unparseable { reason, raw } => {
                    warn!(step, reason = %reason, "Failed to parse action");
                    self.progress(format_args!("  {}Failed to parse action:{} {}\n", YELLOW, RESET, reason));
                    state.record_error(reason, &raw);
                }
                Action::NoAction => {
                    debug!(step, "Model produced neither a tool nor a final answer");
                    self.progress(format_args!(
                        "  {}No tool or final answer found. Re-evaluating next step.{}\n",
                        YELLOW, RESET
                    ));
                    state.record_note(NO_ACTION_NOTE);
                }
            }
        }

        warn!(max_steps = self.config.max_steps, "Step budget exhausted");
        self.progress(format_args!("\n{}Maximum reasoning attempts reached.{}\n", YELLOW, RESET));

        Ok(AgentReport {
            outcome: Outcome::BudgetExhausted {
                max_steps: self.config.max_steps,
            },
            steps: self.config.max_steps,
            state,
        })
    }

    /// An empty reply counts as "not complex"
    async fn is_complex(&self, task: &str, rendered: &str) -> bool {
        let reply = self
            .model
            .generate(
                &complexity_prompt(task, rendered),
                self.config.complexity_temperature,
                &[],
            )
            .await;
        let complex = reply.to_uppercase().contains("YES");
        debug!(complex, reply_len = reply.len(), "Complexity check");
        complex
    }

    /// Run the reflection cycles of one step. The returned set is step-local.
    async fn reflect(&self, task: &str, rendered: &str) -> Vec<String> {
        let cycles = self.config.reasoning_cycles;
        let mut reflections = Vec::with_capacity(cycles);

        for cycle in 1..=cycles {
            self.progress(format_args!("  Reasoning cycle {}/{}... ", cycle, cycles));

            let thought = self
                .model
                .generate(
                    &reflection_prompt(task, rendered, &reflections),
                    self.config.reflection_temperature,
                    &[],
                )
                .await;

            if thought.is_empty() {
                debug!(cycle, "Empty reflection");
                self.progress(format_args!("{}empty{}\n", DIM, RESET));
            } else {
                reflections.push(thought);
                self.progress(format_args!("{}OK{}\n", GREEN, RESET));
            }
        }

        debug!(kept = reflections.len(), cycles, "Reflection finished");
        reflections
    }
}
