//! Fakes for driving the controller without a network, a shell or a terminal.

use crate::approval::{Approval, ApprovalRequest, Approver};
use crate::executor::Executor;
use crate::report::Reporter;
use crate::types::{Command, ExecutionResult};
use commander_error::Result;
use commander_model::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ProviderError, Team, Usage,
};
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn team(
    reasoning: ScriptedProvider,
    structured: ScriptedProvider,
    security: ScriptedProvider,
    actor: ScriptedProvider,
) -> Team<ScriptedProvider> {
    Team::new(reasoning, structured, security, actor)
}

/// Replies from a queue, then from `fallback` if set
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Same reply on every call
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::empty()
        }
    }

    /// Fails on the first call
    pub fn failing(error: ProviderError) -> Self {
        let provider = Self::empty();
        provider.replies.lock().unwrap().push_back(Err(error));
        provider
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);

        let next = self.replies.lock().unwrap().pop_front();
        let content = match next {
            Some(reply) => reply?,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ProviderError::Other("script exhausted".into()))?,
        };

        Ok(CompletionResponse {
            id: format!("scripted-{}", self.calls()),
            model: "scripted-model".into(),
            content: Some(content),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }
}

/// Records commands instead of running them
#[derive(Default)]
pub struct RecordingExecutor {
    results: Mutex<VecDeque<ExecutionResult>>,
    commands: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next execution; otherwise it succeeds with
    /// `output of <command>`
    pub fn push_result(&self, result: ExecutionResult) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl Executor for RecordingExecutor {
    async fn execute(&self, command: &Command) -> ExecutionResult {
        self.commands.lock().unwrap().push(command.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ExecutionResult::success(format!("output of {}", command)))
    }
}

/// Answers from a queue; panics if asked more often than scripted
#[derive(Default)]
pub struct ScriptedApprover {
    answers: VecDeque<Approval>,
    requests: Vec<(String, String, String)>,
}

impl ScriptedApprover {
    pub fn new(answers: impl IntoIterator<Item = Approval>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn asked(&self) -> usize {
        self.requests.len()
    }

    /// (command, cwd, reason) for every request
    pub fn requests(&self) -> &[(String, String, String)] {
        &self.requests
    }
}

impl Approver for ScriptedApprover {
    fn approve(&mut self, request: &ApprovalRequest<'_>) -> Result<Approval> {
        self.requests.push((
            request.command.to_string(),
            request.cwd.display().to_string(),
            request.reason.to_string(),
        ));
        Ok(self.answers.pop_front().expect("approver asked more often than scripted"))
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    statuses: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn command(&self, command: &Command) {
        self.statuses.lock().unwrap().push(format!("$ {}", command));
    }

    fn executed(&self, _command: &Command, result: &ExecutionResult) {
        self.statuses
            .lock()
            .unwrap()
            .push(format!("exit {:?}", result.exit_code));
    }
}
