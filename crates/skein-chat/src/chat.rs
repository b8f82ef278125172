//! The conversation orchestrator.
//!
//! [`Chat`] drives the iterative model/tool loop: ask the backend for one
//! completion, run any requested tools, feed the results back, and stop
//! when the model finishes or a bound trips. Successful turns re-encode
//! history into an opaque [`ConversationState`] after optional compaction.
//!
//! System messages follow the session-memory pattern: the leading system
//! block of each call is a fresh preamble (timestamps, user identity) and
//! is never persisted, while system messages appearing after the first
//! non-system option are contextual and stay in history.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use skein_ai::{Backend, BoxedMessage, FinishReason, ToolCall};

use crate::compaction::{CompactionRequest, Compactor};
use crate::error::{Error, Result};
use crate::logger::{ActionLogger, NullActionLogger, ToolExecutionRecord};
use crate::state::{
    build_messages, extract_leading_system, strip_leading_system, ConversationState,
};
use crate::tool::{ToolContext, ToolRequest, ToolSet};

/// Default bound on the tool-calling loop.
const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// Orchestrates multi-turn conversations against a [`Backend`].
///
/// Configuration is fixed at construction and all call methods take
/// `&self`, so one `Chat` safely serves concurrent calls. Tools, backends,
/// and loggers supplied by the caller must themselves tolerate concurrent
/// invocation if shared.
pub struct Chat {
    pub(crate) backend: Arc<dyn Backend>,
    max_tool_iterations: usize,
    compactor: Option<Arc<dyn Compactor>>,
    action_logger: Option<Arc<dyn ActionLogger>>,
    verbose_tool_logging: bool,
}

impl Chat {
    /// Create an orchestrator over `backend` with default settings.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            compactor: None,
            action_logger: None,
            verbose_tool_logging: false,
        }
    }

    /// Override the default tool-iteration bound for all calls.
    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// Compact history at the end of each successful turn.
    pub fn with_compactor(mut self, compactor: Arc<dyn Compactor>) -> Self {
        self.compactor = Some(compactor);
        self
    }

    /// Default destination for tool-action records, overridable per call.
    pub fn with_action_logger(mut self, logger: Arc<dyn ActionLogger>) -> Self {
        self.action_logger = Some(logger);
        self
    }

    /// Include tool arguments and results in execution records and debug
    /// logs. Off by default so sensitive payloads stay out of logs.
    pub fn with_verbose_tool_logging(mut self, verbose: bool) -> Self {
        self.verbose_tool_logging = verbose;
        self
    }

    /// Run one full chat turn with conversation history.
    ///
    /// Decodes `state` (an unreadable or incompatible blob degrades to a
    /// fresh conversation), assembles preamble + history + new messages,
    /// then loops: one completion per iteration, executing requested tools
    /// between iterations. On normal completion the returned state carries
    /// the updated history, compacted when a compactor is configured; the
    /// system preamble is never persisted.
    pub async fn chat_with_state(
        &self,
        state: Option<&ConversationState>,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<(String, ConversationState)> {
        let (state_messages, _processed_length) = self.decode_state(state);
        let opt_messages = self.materialize(&request.messages);
        let mut messages = build_messages(&opt_messages, &state_messages);

        let definitions = request.tools.definitions();
        let action_logger: Arc<dyn ActionLogger> = request
            .action_logger
            .or_else(|| self.action_logger.clone())
            .unwrap_or_else(|| Arc::new(NullActionLogger));
        let max_iterations = request
            .max_tool_iterations
            .unwrap_or(self.max_tool_iterations);

        for iteration in 0..max_iterations {
            tracing::debug!(iteration, "starting chat iteration");

            let response = match self
                .backend
                .chat_completion(&messages, &definitions, cancel.clone())
                .await
            {
                Ok(response) => response,
                Err(error) => {
                    tracing::error!(%error, iteration, "chat completion failed");
                    return Err(error.into());
                }
            };

            messages.push(response.message.clone());

            match response.finish_reason {
                FinishReason::Stop => {
                    tracing::debug!(iteration, "chat completed");

                    let mut history = strip_leading_system(&messages);
                    if let Some(compactor) = &self.compactor {
                        let compaction = CompactionRequest {
                            processed_length: history.len(),
                            leading_system_messages: extract_leading_system(&messages),
                            state_messages: history,
                            last_api_usage: response.usage,
                            backend: self.backend.clone(),
                        };
                        history = compactor.compact(&compaction).await?.state_messages;
                    }

                    let processed_length = history.len();
                    let new_state = self.encode_state(&history, processed_length)?;
                    return Ok((response.message.content().to_string(), new_state));
                }

                FinishReason::ToolCalls => {
                    let calls = response.message.tool_calls();
                    tracing::debug!(count = calls.len(), "executing tool calls");
                    let results = self
                        .execute_tools(&calls, &request.tools, &action_logger, &cancel)
                        .await;
                    messages.extend(results);
                }

                FinishReason::Length => {
                    tracing::error!("provider hit its token ceiling");
                    return Err(Error::MaxTokens);
                }

                FinishReason::Other(reason) => {
                    tracing::error!(%reason, "unknown finish reason");
                    return Err(Error::UnknownFinishReason(reason));
                }
            }
        }

        tracing::error!(max_iterations, "tool loop exhausted");
        Err(Error::MaxToolIterations(max_iterations))
    }

    /// Stateless convenience wrapper: runs with empty history and discards
    /// the returned state.
    pub async fn chat(&self, request: ChatRequest, cancel: CancellationToken) -> Result<String> {
        let (text, _state) = self.chat_with_state(None, request, cancel).await?;
        Ok(text)
    }

    /// Add messages to history without calling the provider.
    ///
    /// Useful for out-of-band context between turns ("user checked in at
    /// location X"). Only message options are honored; tool options are
    /// ignored. The stored processed length is left unchanged, marking the
    /// appended messages as not yet seen by the model.
    pub fn append_to_state(
        &self,
        state: Option<&ConversationState>,
        request: ChatRequest,
    ) -> Result<ConversationState> {
        let (mut messages, processed_length) = self.decode_state(state);
        messages.extend(self.materialize(&request.messages));
        self.encode_state(&messages, processed_length)
    }

    /// Run each tool call in order, producing one tool message per call.
    /// Infrastructure failures become in-band "Error: ..." results so the
    /// model can see them and recover.
    async fn execute_tools(
        &self,
        calls: &[ToolCall],
        tools: &ToolSet,
        action_logger: &Arc<dyn ActionLogger>,
        cancel: &CancellationToken,
    ) -> Vec<BoxedMessage> {
        let ctx = ToolContext {
            cancel: cancel.clone(),
            logger: action_logger.clone(),
        };

        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let request = ToolRequest::from_call(call);
            let content = match tools.dispatch(&ctx, &request).await {
                Ok(result) => result.result,
                Err(error) => {
                    tracing::error!(
                        %error,
                        tool_name = %call.name,
                        tool_id = %call.id,
                        "tool execution error"
                    );
                    format!("Error: {error}")
                }
            };

            action_logger.log(Box::new(self.execution_record(call, &content)));
            if self.verbose_tool_logging {
                tracing::debug!(
                    tool_name = %call.name,
                    tool_id = %call.id,
                    arguments = %call.arguments,
                    result = %content,
                    "tool executed"
                );
            } else {
                tracing::debug!(tool_name = %call.name, tool_id = %call.id, "tool executed");
            }

            results.push(self.backend.new_tool_message(&call.id, &content));
        }
        results
    }

    fn execution_record(&self, call: &ToolCall, content: &str) -> ToolExecutionRecord {
        ToolExecutionRecord {
            tool_name: call.name.clone(),
            call_id: call.id.clone(),
            arguments: self.verbose_tool_logging.then(|| call.arguments.clone()),
            result: self.verbose_tool_logging.then(|| content.to_string()),
        }
    }

    fn materialize(&self, pending: &[PendingMessage]) -> Vec<BoxedMessage> {
        pending
            .iter()
            .map(|message| match message {
                PendingMessage::System(text) => self.backend.new_system_message(text),
                PendingMessage::User(text) => self.backend.new_user_message(text),
            })
            .collect()
    }
}

/// A message option, materialized through the backend factories at call
/// time.
enum PendingMessage {
    System(String),
    User(String),
}

/// Per-call options, composable builder style.
#[derive(Default)]
pub struct ChatRequest {
    messages: Vec<PendingMessage>,
    tools: ToolSet,
    action_logger: Option<Arc<dyn ActionLogger>>,
    max_tool_iterations: Option<usize>,
}

impl ChatRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system message to the pending list. Leading system messages
    /// form the ephemeral preamble and are not persisted; system messages
    /// after the first non-system option are inline context and persist.
    pub fn system_message(mut self, text: impl Into<String>) -> Self {
        self.messages.push(PendingMessage::System(text.into()));
        self
    }

    /// Append a user message to the pending list.
    pub fn user_message(mut self, text: impl Into<String>) -> Self {
        self.messages.push(PendingMessage::User(text.into()));
        self
    }

    /// Make `tools` available to the model for this call.
    pub fn tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    /// Bound the tool-calling loop for this call, overriding the
    /// orchestrator's setting.
    pub fn max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = Some(max);
        self
    }

    /// Receive tool-action records for this call.
    pub fn action_logger(mut self, logger: Arc<dyn ActionLogger>) -> Self {
        self.action_logger = Some(logger);
        self
    }
}
