//! The model-backed stages of a round: reasoning, structured extraction,
//! security judgement and the final summary.
//!
//! Each stage is one request/response call. Transport failures and replies
//! of the wrong shape come back as errors; nothing here retries.

use crate::conversation::Conversation;
use crate::prompt;
use crate::types::{Command, Environment, SecurityVerdict};
use commander_error::{Error, Result};
use commander_model::{provider_error, ChatMessage, LlmProvider};
use serde::Deserialize;
use tracing::{debug, info};

/// What the reasoning model decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The sentinel was present; the loop ends here
    Finish,
    /// A plan for the next step, to be turned into a command
    Plan(String),
}

/// Ask the reasoning model for the next step over the whole transcript
pub async fn reason<P: LlmProvider>(provider: &P, conversation: &Conversation) -> Result<Decision> {
    let messages = conversation.with_instruction(ChatMessage::system(prompt::finish_instruction()));
    let reply = provider
        .chat(messages)
        .await
        .map_err(|e| provider_error(e, "stage::reason", provider.default_model()))?;

    info!(provider = provider.name(), chars = reply.len(), "reasoning model replied");
    debug!(reply = %reply, "reasoning output");

    if reply.contains(prompt::FINISH_SENTINEL) {
        return Ok(Decision::Finish);
    }
    Ok(Decision::Plan(reply))
}

/// Turn a plan into one shell command via the structured model
pub async fn extract_command<P: LlmProvider>(provider: &P, plan: &str) -> Result<Command> {
    let messages = vec![
        ChatMessage::system(prompt::structured_extraction()),
        ChatMessage::user(plan),
    ];
    let reply = provider
        .chat(messages)
        .await
        .map_err(|e| provider_error(e, "stage::extract", provider.default_model()))?;

    debug!(provider = provider.name(), reply = %reply, "structured model output");
    let command = parse_command(&reply).map_err(|e| e.with_operation("stage::extract"))?;
    info!(command = %command, "command extracted");
    Ok(command)
}

/// Ask the security model whether `command` is safe to run in `env`
pub async fn judge<P: LlmProvider>(
    provider: &P,
    env: &Environment,
    command: &Command,
) -> Result<SecurityVerdict> {
    let cwd = env.cwd.display().to_string();
    let messages = vec![
        ChatMessage::system(prompt::security(&env.os, &cwd, command.as_str())),
        ChatMessage::user(command.as_str()),
    ];
    let reply = provider
        .chat(messages)
        .await
        .map_err(|e| provider_error(e, "stage::security", provider.default_model()))?;

    debug!(provider = provider.name(), reply = %reply, "security model output");
    let verdict = parse_verdict(&reply).map_err(|e| e.with_operation("stage::security"))?;
    info!(safe = verdict.is_safe(), reason = verdict.reason().unwrap_or(""), "security verdict");
    Ok(verdict)
}

/// Produce the final answer from the whole transcript
pub async fn summarize<P: LlmProvider>(provider: &P, conversation: &Conversation) -> Result<String> {
    let question = conversation.question().unwrap_or_default();
    let messages = conversation.with_instruction(ChatMessage::user(prompt::summary(question)));
    let answer = provider
        .chat(messages)
        .await
        .map_err(|e| provider_error(e, "stage::summarize", provider.default_model()))?;

    info!(provider = provider.name(), chars = answer.len(), "summary produced");
    Ok(answer)
}

// ============================================================================
// Reply parsing
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandReply {
    command: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VerdictReply {
    safe: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Strip a Markdown code fence around a JSON reply. Only a reply that opens
/// with a fence is unwrapped; backticks inside the JSON are left alone.
fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string (`json`) on the opening line
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse `{"command": "<string>"}`. Any other shape is an error.
pub fn parse_command(content: &str) -> Result<Command> {
    let json = strip_fence(content);
    let reply: CommandReply = serde_json::from_str(json).map_err(|e| {
        Error::parse_failed(format!("structured reply is not {{\"command\": string}}: {}", e), content)
            .set_source(e)
    })?;

    if reply.command.trim().is_empty() {
        return Err(Error::parse_failed("structured reply has an empty command", content));
    }
    Ok(Command::new(reply.command))
}

/// Parse `{"safe": true}` or `{"safe": false, "reason": "<string>"}`.
/// An unsafe verdict without a reason is an error, never a default.
pub fn parse_verdict(content: &str) -> Result<SecurityVerdict> {
    let json = strip_fence(content);
    let reply: VerdictReply = serde_json::from_str(json).map_err(|e| {
        Error::parse_failed(format!("security reply is not {{\"safe\": bool}}: {}", e), content)
            .set_source(e)
    })?;

    if reply.safe {
        return Ok(SecurityVerdict::Safe);
    }
    match reply.reason {
        Some(reason) if !reason.trim().is_empty() => Ok(SecurityVerdict::Unsafe { reason }),
        _ => Err(Error::parse_failed("unsafe security verdict without a reason", content)),
    }
}
