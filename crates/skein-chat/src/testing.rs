//! Shared test doubles: a scripted backend over [`JsonMessage`] and message
//! construction helpers.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use skein_ai::{
    Backend, BoxedMessage, ChatResponse, FinishReason, JsonMessage, TokenUsage, ToolCall,
    ToolDefinition,
};

use crate::compaction::CompactionRequest;

pub(crate) fn system_msg(text: &str) -> BoxedMessage {
    Arc::new(JsonMessage::system(text))
}

pub(crate) fn user_msg(text: &str) -> BoxedMessage {
    Arc::new(JsonMessage::user(text))
}

pub(crate) fn assistant_msg(text: &str) -> BoxedMessage {
    Arc::new(JsonMessage::assistant(text))
}

pub(crate) fn tool_msg(tool_call_id: &str, text: &str) -> BoxedMessage {
    Arc::new(JsonMessage::tool(tool_call_id, text))
}

pub(crate) fn usage(prompt_tokens: u32) -> TokenUsage {
    TokenUsage {
        prompt_tokens,
        completion_tokens: 50,
        total_tokens: prompt_tokens + 50,
    }
}

/// A scripted Stop response with plain text.
pub(crate) fn stop_response(text: &str) -> ChatResponse {
    ChatResponse {
        message: assistant_msg(text),
        finish_reason: FinishReason::Stop,
        usage: None,
    }
}

/// A scripted Stop response carrying usage figures.
pub(crate) fn stop_response_with_usage(text: &str, prompt_tokens: u32) -> ChatResponse {
    ChatResponse {
        message: assistant_msg(text),
        finish_reason: FinishReason::Stop,
        usage: Some(usage(prompt_tokens)),
    }
}

/// A scripted response requesting the given tool calls.
pub(crate) fn tool_calls_response(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse {
        message: Arc::new(JsonMessage::assistant_with_tool_calls("", calls)),
        finish_reason: FinishReason::ToolCalls,
        usage: None,
    }
}

pub(crate) fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

/// Build a compaction request over the mock backend.
pub(crate) fn compaction_request(
    messages: Vec<BoxedMessage>,
    last_api_usage: Option<TokenUsage>,
) -> CompactionRequest {
    let processed_length = messages.len();
    CompactionRequest {
        state_messages: messages,
        processed_length,
        leading_system_messages: Vec::new(),
        last_api_usage,
        backend: Arc::new(MockBackend::new("test")),
    }
}

/// Backend double that pops scripted responses in order and records the
/// message list of every call. When the script runs dry it answers with a
/// plain assistant "done".
pub(crate) struct MockBackend {
    provider: String,
    responses: Mutex<Vec<ChatResponse>>,
    fail_next: Mutex<Option<skein_ai::Error>>,
    pub(crate) calls: Mutex<Vec<Vec<BoxedMessage>>>,
}

impl MockBackend {
    pub(crate) fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            responses: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn scripted(provider: &str, responses: Vec<ChatResponse>) -> Self {
        let backend = Self::new(provider);
        *backend.responses.lock() = responses;
        backend
    }

    /// Fail the next completion call with `error`.
    pub(crate) fn fail_next(&self, error: skein_ai::Error) {
        *self.fail_next.lock() = Some(error);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Messages the backend saw on call `index`.
    pub(crate) fn call_messages(&self, index: usize) -> Vec<BoxedMessage> {
        self.calls.lock()[index].clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn chat_completion(
        &self,
        messages: &[BoxedMessage],
        _tools: &[ToolDefinition],
        _cancel: CancellationToken,
    ) -> skein_ai::Result<ChatResponse> {
        self.calls.lock().push(messages.to_vec());

        if let Some(error) = self.fail_next.lock().take() {
            return Err(error);
        }

        let mut responses = self.responses.lock();
        if responses.is_empty() {
            Ok(stop_response("done"))
        } else {
            Ok(responses.remove(0))
        }
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn new_system_message(&self, content: &str) -> BoxedMessage {
        Arc::new(JsonMessage::system(content))
    }

    fn new_user_message(&self, content: &str) -> BoxedMessage {
        Arc::new(JsonMessage::user(content))
    }

    fn new_tool_message(&self, tool_call_id: &str, content: &str) -> BoxedMessage {
        Arc::new(JsonMessage::tool(tool_call_id, content))
    }

    fn unmarshal_message(&self, bytes: &[u8]) -> skein_ai::Result<BoxedMessage> {
        Ok(Arc::new(JsonMessage::from_bytes(bytes)?))
    }
}
