//! Core wire types shared by backends and the orchestrator

use serde::{Deserialize, Serialize};

use crate::message::BoxedMessage;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Instructions for the model
    System,
    /// Message from the user
    User,
    /// Message from the model
    Assistant,
    /// Tool execution result
    Tool,
    /// Catch-all for roles this library does not recognize
    Other,
}

impl Role {
    /// Map a wire-level role string onto a role tag. Unknown values become
    /// [`Role::Other`]; the message's raw bytes still carry the exact text.
    pub fn parse(value: &str) -> Self {
        match value {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::Other => "other",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural end of response
    Stop,
    /// The model wants tools invoked
    ToolCalls,
    /// Provider token ceiling reached
    Length,
    /// A value this library does not recognize; fatal for the current call
    Other(String),
}

impl FinishReason {
    /// Map a wire-level finish reason onto a tag, preserving unknown values
    /// so the orchestrator can surface them verbatim.
    pub fn parse(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "tool_calls" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::Length => "length",
            FinishReason::Other(value) => value,
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model-issued request to invoke a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-minted identifier, echoed back on the tool-result message
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Opaque JSON text holding the arguments
    pub arguments: String,
}

/// Token consumption reported by a provider for one API call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One provider round-trip result.
///
/// The response either requests tool calls (the loop continues) or carries
/// the final text (the conversation is complete for this turn).
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant's message
    pub message: BoxedMessage,
    /// Why generation stopped
    pub finish_reason: FinishReason,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
}

/// Tool definition advertised to the provider for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (used in API calls)
    pub name: String,
    /// Human-readable description for the model
    pub description: String,
    /// JSON Schema for parameters, forwarded verbatim
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}
