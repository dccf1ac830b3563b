//! # Commander Agent
//!
//! The agent turns a request into shell commands, one round at a time:
//! 1. The reasoning model plans the next step over the whole transcript
//! 2. The structured model turns the plan into `{"command": ...}`
//! 3. The security model judges the command safe or unsafe
//! 4. Unsafe commands wait for a human `y`/`n`
//! 5. The shell runs the command; its output goes back into the transcript
//! 6. Repeat until `[finish]` or the round limit, then the actor model answers
//!
//! Models, shell, terminal and output are all injected, so the loop runs the
//! same against fakes.

mod agent;
pub mod approval;
pub mod config;
pub mod conversation;
pub mod executor;
pub mod prompt;
pub mod report;
pub mod stage;
pub mod types;

#[cfg(test)]
mod testing;

pub use agent::{Agent, AgentConfig, AgentResult, Termination};
pub use approval::{Approval, ApprovalRequest, Approver, TerminalApprover};
pub use config::Config;
pub use conversation::Conversation;
pub use executor::{Executor, ShellExecutor};
pub use report::Reporter;
pub use types::{Clearance, Command, Environment, ExecutionResult, SecurityVerdict};
