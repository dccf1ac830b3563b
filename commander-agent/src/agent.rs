//! Agent implementation - the round controller.
//!
//! One round: reason -> extract -> vet -> (ask) -> execute -> record.
//! The loop ends when the reasoning model emits the finish sentinel, when the
//! round limit is hit, or when any stage fails. A stage failure aborts the
//! session without a summary.

use crate::approval::{Approval, ApprovalRequest, Approver};
use crate::conversation::Conversation;
use crate::executor::Executor;
use crate::prompt;
use crate::report::Reporter;
use crate::stage::{self, Decision};
use crate::types::{Clearance, Command, Environment, ExecutionResult, SecurityVerdict};
use commander_error::Result;
use commander_model::{ChatMessage, LlmProvider, Team};
use tracing::{debug, error, info, warn};

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Rounds allowed before the loop is forced to stop
    pub max_rounds: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: crate::config::DEFAULT_MAX_ROUNDS,
        }
    }
}

/// How the loop ended, when it ended well enough to summarize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Finished,
    RoundLimitReached,
}

/// Result from agent execution
#[derive(Debug, Clone)]
pub struct AgentResult {
    /// The actor model's answer, verbatim
    pub answer: String,
    /// Completed rounds
    pub rounds: usize,
    pub termination: Termination,
}

/// Where the controller is within a round
#[derive(Debug)]
enum Phase {
    Reasoning,
    Extracting { plan: String },
    Gating { command: Command },
    AwaitingHuman { command: Command, reason: String },
    Executing { command: Command, clearance: Clearance },
    Recording { entry: String },
}

/// The round controller. Owns the conversation for the length of a session.
pub struct Agent<P, E, A, R>
where
    P: LlmProvider,
    E: Executor,
    A: Approver,
    R: Reporter,
{
    team: Team<P>,
    executor: E,
    approver: A,
    reporter: R,
    env: Environment,
    config: AgentConfig,
    conversation: Conversation,
    rounds: usize,
}

impl<P, E, A, R> Agent<P, E, A, R>
where
    P: LlmProvider,
    E: Executor,
    A: Approver,
    R: Reporter,
{
    pub fn new(team: Team<P>, executor: E, approver: A, reporter: R, env: Environment) -> Self {
        Self::with_config(team, executor, approver, reporter, env, AgentConfig::default())
    }

    pub fn with_config(
        team: Team<P>,
        executor: E,
        approver: A,
        reporter: R,
        env: Environment,
        mut config: AgentConfig,
    ) -> Self {
        // Zero would let one round run before the limit is checked
        if config.max_rounds == 0 {
            config.max_rounds = crate::config::DEFAULT_MAX_ROUNDS;
        }
        Self {
            team,
            executor,
            approver,
            reporter,
            env,
            config,
            conversation: Conversation::default(),
            rounds: 0,
        }
    }

    /// The transcript of the latest session
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Rounds completed in the latest session
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn team(&self) -> &Team<P> {
        &self.team
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn approver(&self) -> &A {
        &self.approver
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Run one session for `question` to completion.
    ///
    /// `Err` means the session was aborted by a stage failure; the warning
    /// has already been reported and no summary was produced.
    pub async fn run(&mut self, question: &str) -> Result<AgentResult> {
        if !self.conversation.is_empty() {
            debug!(messages = self.conversation.len(), "discarding previous session transcript");
        }
        self.conversation = Conversation::seeded(prompt::initial_reasoning(&self.env.os), question);
        self.rounds = 0;
        info!(question = %question, max_rounds = self.config.max_rounds, "session started");

        let termination = match self.drive().await {
            Ok(termination) => termination,
            Err(e) => {
                error!(error = %e, rounds = self.rounds, "session aborted");
                let what = if e.kind().is_model_failure() {
                    "a model call failed"
                } else {
                    "a stage failed"
                };
                self.reporter.warn(&format!("Stopped: {}. {}", what, e.message()));
                return Err(e);
            }
        };

        self.reporter.status("Writing the answer...");
        let answer = stage::summarize(&self.team.actor, &self.conversation)
            .await
            .map_err(|e| {
                error!(error = %e, "summary failed");
                self.reporter.warn(&format!("Could not produce an answer: {}", e.message()));
                e
            })?;

        info!(rounds = self.rounds, termination = ?termination, "session finished");
        Ok(AgentResult {
            answer,
            rounds: self.rounds,
            termination,
        })
    }

    /// The state machine. Returns only through a terminal state or an error.
    async fn drive(&mut self) -> Result<Termination> {
        let mut phase = Phase::Reasoning;

        loop {
            phase = match phase {
                Phase::Reasoning => {
                    self.reporter.status(&format!("Thinking... (round {})", self.rounds + 1));
                    match stage::reason(&self.team.reasoning, &self.conversation).await? {
                        Decision::Finish => {
                            info!(rounds = self.rounds, "reasoning model signalled finish");
                            return Ok(Termination::Finished);
                        }
                        Decision::Plan(plan) => Phase::Extracting { plan },
                    }
                }

                Phase::Extracting { plan } => Phase::Gating {
                    command: stage::extract_command(&self.team.structured, &plan).await?,
                },

                Phase::Gating { command } => {
                    self.reporter.command(&command);
                    match stage::judge(&self.team.security, &self.env, &command).await? {
                        SecurityVerdict::Safe => Phase::Executing {
                            command,
                            clearance: Clearance::SecurityGate,
                        },
                        SecurityVerdict::Unsafe { reason } => {
                            warn!(command = %command, reason = %reason, "command flagged unsafe");
                            self.reporter.warn(&format!("Flagged as unsafe: {}", reason));
                            Phase::AwaitingHuman { command, reason }
                        }
                    }
                }

                Phase::AwaitingHuman { command, reason } => {
                    let request = ApprovalRequest {
                        command: &command,
                        cwd: &self.env.cwd,
                        reason: &reason,
                    };
                    match self.approver.approve(&request)? {
                        Approval::Approved => Phase::Executing {
                            command,
                            clearance: Clearance::Human,
                        },
                        Approval::Declined => {
                            self.reporter.status("Skipped. Asking for another approach...");
                            Phase::Recording {
                                entry: declined_entry(&command, &reason),
                            }
                        }
                    }
                }

                Phase::Executing { command, clearance } => {
                    info!(command = %command, clearance = ?clearance, "executing");
                    let result = self.executor.execute(&command).await;
                    self.reporter.executed(&command, &result);
                    Phase::Recording {
                        entry: executed_entry(&command, &result),
                    }
                }

                Phase::Recording { entry } => {
                    self.conversation.push(ChatMessage::assistant(entry));
                    self.rounds += 1;
                    if self.rounds >= self.config.max_rounds {
                        warn!(rounds = self.rounds, "round limit reached");
                        self.reporter.warn(&format!(
                            "Reached the limit of {} rounds.",
                            self.config.max_rounds
                        ));
                        self.conversation
                            .push(ChatMessage::system(prompt::round_limit(self.config.max_rounds)));
                        return Ok(Termination::RoundLimitReached);
                    }
                    Phase::Reasoning
                }
            };
        }
    }
}

fn executed_entry(command: &Command, result: &ExecutionResult) -> String {
    format!(
        "I ran the command: {}\nOutput:\n{}",
        command,
        result.observed()
    )
}

fn declined_entry(command: &Command, reason: &str) -> String {
    format!(
        "I proposed the command: {}\nIt was flagged as unsafe ({}) and the user declined to run it. \
I need a different approach.",
        command, reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        team, RecordingExecutor, RecordingReporter, ScriptedApprover, ScriptedProvider,
    };
    use commander_error::ErrorKind;
    use commander_model::Role;

    type TestAgent = Agent<ScriptedProvider, RecordingExecutor, ScriptedApprover, RecordingReporter>;

    fn agent(
        reasoning: ScriptedProvider,
        structured: ScriptedProvider,
        security: ScriptedProvider,
        approver: ScriptedApprover,
        max_rounds: usize,
    ) -> TestAgent {
        Agent::with_config(
            team(reasoning, structured, security, ScriptedProvider::new(["final answer"])),
            RecordingExecutor::new(),
            approver,
            RecordingReporter::default(),
            Environment::new("linux", "/work"),
            AgentConfig { max_rounds },
        )
    }

    #[tokio::test]
    async fn test_zero_max_rounds_uses_default() {
        let mut agent = agent(
            ScriptedProvider::repeating("I will run ls"),
            ScriptedProvider::repeating(r#"{"command":"ls"}"#),
            ScriptedProvider::repeating(r#"{"safe":true}"#),
            ScriptedApprover::none(),
            0,
        );

        let result = agent.run("what is here?").await.unwrap();

        assert_eq!(result.termination, Termination::RoundLimitReached);
        assert_eq!(result.rounds, crate::config::DEFAULT_MAX_ROUNDS);
        assert_eq!(agent.executor().commands().len(), crate::config::DEFAULT_MAX_ROUNDS);
    }

    #[tokio::test]
    async fn test_round_limit_runs_summary() {
        let mut agent = agent(
            ScriptedProvider::repeating("I will run ls"),
            ScriptedProvider::repeating(r#"{"command":"ls"}"#),
            ScriptedProvider::repeating(r#"{"safe":true}"#),
            ScriptedApprover::none(),
            3,
        );

        let result = agent.run("what is here?").await.unwrap();

        assert_eq!(result.termination, Termination::RoundLimitReached);
        assert_eq!(result.rounds, 3);
        assert_eq!(result.answer, "final answer");
        assert_eq!(agent.executor().commands(), vec!["ls", "ls", "ls"]);
        assert_eq!(agent.team().reasoning.calls(), 3);
        assert_eq!(agent.team().actor.calls(), 1);
        assert_eq!(agent.reporter().statuses().iter().filter(|s| *s == "$ ls").count(), 3);

        // seed pair + one record per round + the limit notice
        let messages = agent.conversation().messages();
        assert_eq!(messages.len(), 2 + 3 + 1);
        assert_eq!(messages[5].role, Role::System);
        assert!(messages[5].content.contains("3 rounds"));
    }

    #[tokio::test]
    async fn test_conversation_grows_by_one_per_round() {
        let mut agent = agent(
            ScriptedProvider::new(["step one", "step two", "done [finish]"]),
            ScriptedProvider::new([r#"{"command":"echo 1"}"#, r#"{"command":"echo 2"}"#]),
            ScriptedProvider::repeating(r#"{"safe":true}"#),
            ScriptedApprover::none(),
            5,
        );

        let result = agent.run("count").await.unwrap();

        assert_eq!(result.termination, Termination::Finished);
        assert_eq!(result.rounds, 2);
        let messages = agent.conversation().messages();
        assert_eq!(messages.len(), 2 + 2);
        assert!(messages[2..].iter().all(|m| m.role == Role::Assistant));
        assert!(messages[2].content.contains("echo 1"));
        assert!(messages[3].content.contains("echo 2"));
    }

    #[tokio::test]
    async fn test_each_round_sees_previous_results() {
        let mut agent = agent(
            ScriptedProvider::new(["look around", "[finish]"]),
            ScriptedProvider::new([r#"{"command":"ls"}"#]),
            ScriptedProvider::repeating(r#"{"safe":true}"#),
            ScriptedApprover::none(),
            5,
        );

        agent.run("what is here?").await.unwrap();

        let requests = agent.team().reasoning.requests();
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[1].messages.len(), 4);
        assert!(requests[1].messages[2].content.contains("output of ls"));
    }

    #[tokio::test]
    async fn test_finish_skips_extraction() {
        let mut agent = agent(
            ScriptedProvider::new(["Nothing to do. [finish]"]),
            ScriptedProvider::repeating(r#"{"command":"ls"}"#),
            ScriptedProvider::repeating(r#"{"safe":true}"#),
            ScriptedApprover::none(),
            5,
        );

        let result = agent.run("hello").await.unwrap();

        assert_eq!(result.termination, Termination::Finished);
        assert_eq!(result.rounds, 0);
        assert_eq!(agent.team().structured.calls(), 0);
        assert_eq!(agent.team().security.calls(), 0);
        assert!(agent.executor().commands().is_empty());
        assert_eq!(agent.team().actor.calls(), 1);
        assert_eq!(agent.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_extraction_aborts() {
        let mut agent = agent(
            ScriptedProvider::repeating("I will run ls"),
            ScriptedProvider::new([r#"{"comand":"ls"}"#]),
            ScriptedProvider::repeating(r#"{"safe":true}"#),
            ScriptedApprover::none(),
            5,
        );

        let err = agent.run("list").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert_eq!(err.operation(), "stage::extract");
        assert!(agent.executor().commands().is_empty());
        assert_eq!(agent.team().security.calls(), 0);
        assert_eq!(agent.team().actor.calls(), 0);
        assert_eq!(agent.conversation().len(), 2);
        assert!(agent.reporter().warnings().iter().any(|w| w.starts_with("Stopped")));
    }

    #[tokio::test]
    async fn test_malformed_verdict_aborts_without_running() {
        let mut agent = agent(
            ScriptedProvider::repeating("I will clean up"),
            ScriptedProvider::repeating(r#"{"command":"rm -rf target"}"#),
            ScriptedProvider::new([r#"{"safe":false}"#]),
            ScriptedApprover::new([Approval::Approved]),
            5,
        );

        let err = agent.run("clean").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert_eq!(err.operation(), "stage::security");
        assert!(agent.executor().commands().is_empty());
        assert_eq!(agent.approver().asked(), 0);
    }

    #[tokio::test]
    async fn test_reasoning_failure_aborts() {
        let mut agent = agent(
            ScriptedProvider::failing(commander_model::ProviderError::Network("down".into())),
            ScriptedProvider::repeating(r#"{"command":"ls"}"#),
            ScriptedProvider::repeating(r#"{"safe":true}"#),
            ScriptedApprover::none(),
            5,
        );

        let err = agent.run("list").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert_eq!(agent.team().structured.calls(), 0);
        assert_eq!(agent.team().actor.calls(), 0);
    }

    #[tokio::test]
    async fn test_declined_command_is_recorded_and_replanned() {
        let mut agent = agent(
            ScriptedProvider::new(["delete build", "inspect instead", "[finish]"]),
            ScriptedProvider::new([r#"{"command":"rm -rf build"}"#, r#"{"command":"ls build"}"#]),
            ScriptedProvider::new([
                r#"{"safe":false,"reason":"deletes files"}"#,
                r#"{"safe":true}"#,
            ]),
            ScriptedApprover::new([Approval::Declined]),
            5,
        );

        let result = agent.run("tidy up").await.unwrap();

        assert_eq!(agent.executor().commands(), vec!["ls build"]);
        assert_eq!(agent.approver().asked(), 1);
        assert_eq!(result.rounds, 2);

        let messages = agent.conversation().messages();
        assert_eq!(messages.len(), 4);
        assert!(messages[2].content.contains("rm -rf build"));
        assert!(messages[2].content.contains("declined"));
        assert!(messages[2].content.contains("deletes files"));
        assert!(messages[3].content.contains("ls build"));
    }

    #[tokio::test]
    async fn test_approved_unsafe_command_runs() {
        let mut agent = agent(
            ScriptedProvider::new(["make a dir", "[finish]"]),
            ScriptedProvider::new([r#"{"command":"mkdir helloworld"}"#]),
            ScriptedProvider::new([r#"{"safe":false,"reason":"creates a directory"}"#]),
            ScriptedApprover::new([Approval::Approved]),
            5,
        );

        agent.run("create helloworld").await.unwrap();

        assert_eq!(agent.executor().commands(), vec!["mkdir helloworld"]);
        let asked = agent.approver().requests();
        assert_eq!(asked[0].0, "mkdir helloworld");
        assert_eq!(asked[0].1, "/work");
        assert_eq!(asked[0].2, "creates a directory");
    }

    #[tokio::test]
    async fn test_every_executed_command_was_cleared() {
        let mut agent = agent(
            ScriptedProvider::repeating("next"),
            ScriptedProvider::new([
                r#"{"command":"a"}"#,
                r#"{"command":"b"}"#,
                r#"{"command":"c"}"#,
                r#"{"command":"d"}"#,
            ]),
            ScriptedProvider::new([
                r#"{"safe":true}"#,
                r#"{"safe":false,"reason":"r"}"#,
                r#"{"safe":false,"reason":"r"}"#,
                r#"{"safe":true}"#,
            ]),
            ScriptedApprover::new([Approval::Approved, Approval::Declined]),
            4,
        );

        let result = agent.run("go").await.unwrap();

        assert_eq!(result.termination, Termination::RoundLimitReached);
        assert_eq!(result.rounds, 4);
        // "a" and "d" were safe, "b" was approved, "c" was declined
        assert_eq!(agent.executor().commands(), vec!["a", "b", "d"]);
    }

    #[tokio::test]
    async fn test_failed_command_feeds_back() {
        let executor_results = RecordingExecutor::new();
        executor_results.push_result(ExecutionResult::failure("no such file\n", Some(1)));

        let mut agent = Agent::with_config(
            team(
                ScriptedProvider::new(["cat it", "[finish]"]),
                ScriptedProvider::new([r#"{"command":"cat missing.txt"}"#]),
                ScriptedProvider::repeating(r#"{"safe":true}"#),
                ScriptedProvider::new(["The file does not exist."]),
            ),
            executor_results,
            ScriptedApprover::none(),
            RecordingReporter::default(),
            Environment::new("linux", "/work"),
            AgentConfig { max_rounds: 5 },
        );

        let result = agent.run("show missing.txt").await.unwrap();

        assert_eq!(result.answer, "The file does not exist.");
        let recorded = &agent.conversation().messages()[2].content;
        assert!(recorded.contains("no such file"));
        assert!(recorded.contains("exit status 1"));
    }

    #[tokio::test]
    async fn test_summary_failure_is_reported() {
        let mut agent = Agent::with_config(
            team(
                ScriptedProvider::new(["[finish]"]),
                ScriptedProvider::empty(),
                ScriptedProvider::empty(),
                ScriptedProvider::failing(commander_model::ProviderError::EmptyResponse),
            ),
            RecordingExecutor::new(),
            ScriptedApprover::none(),
            RecordingReporter::default(),
            Environment::new("linux", "/work"),
            AgentConfig::default(),
        );

        let err = agent.run("hi").await.unwrap_err();
        assert_eq!(err.operation(), "stage::summarize");
        assert!(agent
            .reporter()
            .warnings()
            .iter()
            .any(|w| w.starts_with("Could not produce an answer")));
    }

    #[tokio::test]
    async fn test_run_resets_state_between_sessions() {
        let mut agent = agent(
            ScriptedProvider::new(["ls please", "[finish]", "[finish]"]),
            ScriptedProvider::new([r#"{"command":"ls"}"#]),
            ScriptedProvider::repeating(r#"{"safe":true}"#),
            ScriptedApprover::none(),
            5,
        );
        agent.team().actor.push_reply("second answer");

        agent.run("first").await.unwrap();
        assert_eq!(agent.rounds(), 1);

        let result = agent.run("second").await.unwrap();
        assert_eq!(result.rounds, 0);
        assert_eq!(agent.conversation().len(), 2);
        assert_eq!(agent.conversation().question(), Some("second"));
    }
}
