//! # commander-model
//!
//! The model team: the chat completion endpoints commander talks to.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based LLM communication (OpenAI-compatible HTTP)
//! - **Response format**: Plain text or a constrained JSON object
//! - **Team**: Reasoning, Structured, Security and Actor endpoints built from
//!   one configuration shape

pub mod provider;
pub mod team;

pub use commander_error::{Error, ErrorKind, Result};
pub use provider::{
    LlmProvider, ProviderConfig, ProviderError,
    ChatMessage, Role, ToolCall, CompletionRequest, CompletionResponse,
    ResponseFormat, FinishReason, Usage,
    OpenAIProvider,
};
pub use team::{ModelConfig, Team, TeamConfig, provider_error};
