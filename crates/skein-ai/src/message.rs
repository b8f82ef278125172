//! The opaque message contract and its raw-preserving implementation

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Role, ToolCall};

/// A single conversation message as produced by a provider backend.
///
/// Implementations expose read-only views of the fields the orchestrator
/// needs and must reproduce their original serialized form from
/// [`Message::to_bytes`], so that provider-specific fields (including ones
/// this library has never heard of) survive a trip through persisted
/// conversation state. Messages are immutable after creation.
pub trait Message: std::fmt::Debug + Send + Sync {
    /// Role of the message sender
    fn role(&self) -> Role;

    /// Text content of the message
    fn content(&self) -> &str;

    /// Tool calls requested by the assistant; empty for other roles
    fn tool_calls(&self) -> Vec<ToolCall>;

    /// Id of the tool call this message answers; `None` unless the role is
    /// [`Role::Tool`]
    fn tool_call_id(&self) -> Option<&str>;

    /// Canonical serialized form of the message
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

/// Type alias for a shared message
pub type BoxedMessage = Arc<dyn Message>;

/// Known fields of the message envelope. Everything else lives only in the
/// raw bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Envelope {
    #[serde(default)]
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// A [`Message`] backed by its raw JSON envelope.
///
/// Two slots per instance: the exact bytes the provider produced, and a
/// decoded view of the fields the orchestrator reads. [`Message::to_bytes`]
/// returns the raw slot unchanged, so fields this library does not know
/// about (reasoning traces, citations, ...) are carried through state
/// persistence byte for byte.
#[derive(Debug, Clone)]
pub struct JsonMessage {
    raw: Vec<u8>,
    parsed: Envelope,
}

impl JsonMessage {
    /// Reconstruct a message from its serialized envelope, keeping the
    /// bytes verbatim. Fails when the bytes do not parse as an envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let parsed: Envelope =
            serde_json::from_slice(bytes).map_err(|e| Error::InvalidMessage(e.to_string()))?;
        Ok(Self {
            raw: bytes.to_vec(),
            parsed,
        })
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::from_envelope(Envelope {
            role: Role::System.as_str().to_string(),
            content: Some(content.into()),
            ..Envelope::default()
        })
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::from_envelope(Envelope {
            role: Role::User.as_str().to_string(),
            content: Some(content.into()),
            ..Envelope::default()
        })
    }

    /// Create an assistant message with text content.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::from_envelope(Envelope {
            role: Role::Assistant.as_str().to_string(),
            content: Some(content.into()),
            ..Envelope::default()
        })
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self::from_envelope(Envelope {
            role: Role::Assistant.as_str().to_string(),
            content: Some(content.into()),
            tool_calls,
            ..Envelope::default()
        })
    }

    /// Create a tool-result message answering `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::from_envelope(Envelope {
            role: Role::Tool.as_str().to_string(),
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            ..Envelope::default()
        })
    }

    fn from_envelope(parsed: Envelope) -> Self {
        // The envelope is a plain string/vec struct; serializing it cannot fail.
        let raw = serde_json::to_vec(&parsed).expect("message envelope serialization");
        Self { raw, parsed }
    }
}

impl Message for JsonMessage {
    fn role(&self) -> Role {
        Role::parse(&self.parsed.role)
    }

    fn content(&self) -> &str {
        self.parsed.content.as_deref().unwrap_or("")
    }

    fn tool_calls(&self) -> Vec<ToolCall> {
        self.parsed.tool_calls.clone()
    }

    fn tool_call_id(&self) -> Option<&str> {
        self.parsed.tool_call_id.as_deref()
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.raw.clone())
    }
}
