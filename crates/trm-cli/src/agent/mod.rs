//! Agent framework for autonomous task execution
//!
//! Implements a think, refine, act loop over a local language model.

mod action;
mod agent_loop;
mod prompts;
mod state;

pub use agent_loop::AgentLoop;
pub use state::{AgentConfig, Outcome, StateRecord};
