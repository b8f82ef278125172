//! The provider backend consumed by the orchestrator

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::message::BoxedMessage;
use crate::types::{ChatResponse, ToolDefinition};

/// A chat-completion provider.
///
/// Implementations perform single-turn API calls; the orchestration layer
/// owns the tool-calling loop. A backend is shared read-only across
/// concurrent orchestrator calls, so implementations must be `Send + Sync`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Make one provider round-trip and return the response. The response
    /// may request tool calls (requiring further iteration) or carry the
    /// final text for this turn.
    ///
    /// `cancel` aborts the in-flight request; implementations are expected
    /// to respect both it and their own per-request deadline, whichever
    /// fires first.
    async fn chat_completion(
        &self,
        messages: &[BoxedMessage],
        tools: &[ToolDefinition],
        cancel: CancellationToken,
    ) -> Result<ChatResponse>;

    /// Stable provider identifier (e.g. "openai", "anthropic").
    ///
    /// Used to lock persisted conversation state to the backend that
    /// produced it; state from one provider is never replayed into another.
    fn provider_name(&self) -> &str;

    /// Create a system message for this provider.
    fn new_system_message(&self, content: &str) -> BoxedMessage;

    /// Create a user message for this provider.
    fn new_user_message(&self, content: &str) -> BoxedMessage;

    /// Create a tool-result message answering `tool_call_id`.
    fn new_tool_message(&self, tool_call_id: &str, content: &str) -> BoxedMessage;

    /// Reconstruct a message from bytes previously produced by
    /// [`Message::to_bytes`](crate::message::Message::to_bytes).
    fn unmarshal_message(&self, bytes: &[u8]) -> Result<BoxedMessage>;
}
