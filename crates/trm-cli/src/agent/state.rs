//! Agent state management

use std::fmt;
use std::path::PathBuf;

/// Number of raw model characters kept in an error record
pub const ERROR_EXCERPT_CHARS: usize = 200;

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum steps before giving up
    pub max_steps: usize,
    /// Reflection cycles run on steps judged complex
    pub reasoning_cycles: usize,
    /// Temperature of the YES/NO complexity check
    pub complexity_temperature: f32,
    /// Temperature of each reflection cycle
    pub reflection_temperature: f32,
    /// Temperature of action generation
    pub action_temperature: f32,
    /// Working directory
    pub working_dir: PathBuf,
    /// Whether to print progress to the console
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            reasoning_cycles: 3,
            complexity_temperature: 0.1,
            reflection_temperature: 0.5,
            action_temperature: 0.2,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            verbose: true,
        }
    }
}

impl AgentConfig {
    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_reasoning_cycles(mut self, cycles: usize) -> Self {
        self.reasoning_cycles = cycles;
        self
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// One entry of the session log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRecord {
    /// The task, always first
    Task(String),
    /// A dispatched tool and its result text
    Action { tool: String, result: String },
    /// Model output that could not be turned into an action
    Error { message: String, excerpt: String },
    /// Steering note for the next step
    Note(String),
}

impl fmt::Display for StateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateRecord::Task(task) => write!(f, "Task: {}", task),
            StateRecord::Action { tool, result } => write!(f, "Action: {}\nResult: {}", tool, result),
            StateRecord::Error { message, excerpt } => {
                write!(f, "Error parsing action: {}. Thought: {}...", message, excerpt)
            }
            StateRecord::Note(text) => write!(f, "Action: {}", text),
        }
    }
}

/// Append-only log of everything that happened in a session.
///
/// Seeded with the task; rendered to text only when building prompts.
#[derive(Debug, Clone)]
pub struct SessionState {
    records: Vec<StateRecord>,
}

impl SessionState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            records: vec![StateRecord::Task(task.into())],
        }
    }

    pub fn record_action(&mut self, tool: impl Into<String>, result: impl Into<String>) {
        self.records.push(StateRecord::Action {
            tool: tool.into(),
            result: result.into(),
        });
    }

    /// Record a parse failure, keeping only the head of the raw output
    pub fn record_error(&mut self, message: impl Into<String>, raw: &str) {
        self.records.push(StateRecord::Error {
            message: message.into(),
            excerpt: raw.chars().take(ERROR_EXCERPT_CHARS).collect(),
        });
    }

    pub fn record_note(&mut self, text: impl Into<String>) {
        self.records.push(StateRecord::Note(text.into()));
    }

    pub fn records(&self) -> &[StateRecord] {
        &self.records
    }

    /// Number of records of the given kind
    pub fn count(&self, pred: impl Fn(&StateRecord) -> bool) -> usize {
        self.records.iter().filter(|r| pred(r)).count()
    }

    /// Text form used inside prompts
    pub fn render(&self) -> String {
        self.records
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model produced a final answer
    Completed(String),
    /// The step budget ran out first
    BudgetExhausted { max_steps: usize },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    /// The text handed back to the caller
    pub fn message(&self) -> &str {
        match self {
            Outcome::Completed(answer) => answer,
            Outcome::BudgetExhausted { .. } => "Max steps reached.",
        }
    }
}

/// Everything a finished session hands back
#[derive(Debug, Clone)]
pub struct AgentReport {
    pub outcome: Outcome,
    /// Steps actually executed
    pub steps: usize,
    pub state: SessionState,
}
