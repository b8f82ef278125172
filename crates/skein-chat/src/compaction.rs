//! Compaction framework: when and how conversation history shrinks.
//!
//! A [`Compactor`] runs at the end of each successful turn, never between
//! tool iterations, and decides whether the persisted history should be
//! shorter. The when/how split ([`CompactionTrigger`], [`CompactionStrategy`])
//! lets both halves be customized independently; [`SplitCompactor`] pairs
//! one of each and [`CompositeCompactor`] tries a list in order.
//!
//! Compactors never see the leading system preamble (it is passed alongside
//! for reference) and their traits are async so provider-aware strategies
//! can summarize through the backend.

use std::sync::Arc;

use async_trait::async_trait;

use skein_ai::{Backend, BoxedMessage, Role, TokenUsage};

use crate::error::Result;

/// Inputs for a compaction decision.
pub struct CompactionRequest {
    /// Conversation history eligible for compaction. Leading system
    /// messages are never part of this list.
    pub state_messages: Vec<BoxedMessage>,

    /// How many of `state_messages` the provider has already seen. Equals
    /// the history length when invoked at the end of a turn; shorter when
    /// messages were injected through `append_to_state` since. The built-in
    /// compactors ignore the distinction; strategies that want to defer
    /// their decision can use it.
    pub processed_length: usize,

    /// The system preamble of the current call, for reference only. May be
    /// empty. Never altered by compaction.
    pub leading_system_messages: Vec<BoxedMessage>,

    /// Token usage from the most recent provider call, if reported. The
    /// prompt figure covers the whole conversation including the preamble.
    pub last_api_usage: Option<TokenUsage>,

    /// The backend in use, for provider-aware strategies.
    pub backend: Arc<dyn Backend>,
}

/// Outcome of a compaction pass.
#[derive(Debug)]
pub struct CompactionResponse {
    /// The new history. May be the input list, a suffix of it, a rewritten
    /// (for example summarized) list, or empty.
    pub state_messages: Vec<BoxedMessage>,

    /// True if the history changed.
    pub was_compacted: bool,
}

impl CompactionResponse {
    /// The history is unchanged.
    pub fn not_compacted(request: &CompactionRequest) -> Self {
        Self {
            state_messages: request.state_messages.clone(),
            was_compacted: false,
        }
    }

    /// The history was replaced by `state_messages`.
    pub fn compacted(state_messages: Vec<BoxedMessage>) -> Self {
        Self {
            state_messages,
            was_compacted: true,
        }
    }
}

/// Decides whether conversation history should shrink and performs the
/// shrinking. This is the interface the orchestrator calls, so it is the
/// entry point for custom schemes; errors abort the enclosing chat call.
#[async_trait]
pub trait Compactor: Send + Sync {
    async fn compact(&self, request: &CompactionRequest) -> Result<CompactionResponse>;
}

/// The "when" half of a compactor.
#[async_trait]
pub trait CompactionTrigger: Send + Sync {
    async fn should_compact(&self, request: &CompactionRequest) -> Result<bool>;
}

/// The "how" half of a compactor.
#[async_trait]
pub trait CompactionStrategy: Send + Sync {
    async fn compact_messages(&self, request: &CompactionRequest) -> Result<CompactionResponse>;
}

/// Pairs an arbitrary trigger with an arbitrary strategy.
pub struct SplitCompactor {
    pub trigger: Box<dyn CompactionTrigger>,
    pub strategy: Box<dyn CompactionStrategy>,
}

#[async_trait]
impl Compactor for SplitCompactor {
    async fn compact(&self, request: &CompactionRequest) -> Result<CompactionResponse> {
        if self.trigger.should_compact(request).await? {
            self.strategy.compact_messages(request).await
        } else {
            Ok(CompactionResponse::not_compacted(request))
        }
    }
}

/// Tries nested compactors in order until one compacts or an error is
/// returned; reports a no-op when none do.
pub struct CompositeCompactor {
    pub compactors: Vec<Box<dyn Compactor>>,
}

#[async_trait]
impl Compactor for CompositeCompactor {
    async fn compact(&self, request: &CompactionRequest) -> Result<CompactionResponse> {
        for compactor in &self.compactors {
            let response = compactor.compact(request).await?;
            if response.was_compacted {
                return Ok(response);
            }
        }
        Ok(CompactionResponse::not_compacted(request))
    }
}

/// Fires when any nested trigger fires. Triggers run in order until one
/// returns true or an error.
pub struct CompositeTrigger {
    pub triggers: Vec<Box<dyn CompactionTrigger>>,
}

#[async_trait]
impl CompactionTrigger for CompositeTrigger {
    async fn should_compact(&self, request: &CompactionRequest) -> Result<bool> {
        for trigger in &self.triggers {
            if trigger.should_compact(request).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Drop messages from the front until the list starts with a user message.
///
/// Providers reject histories that open mid-exchange, for example a tool
/// result with no preceding call; user messages are always safe restart
/// points. Returns an empty list when no user message remains.
pub fn advance_to_first_user_message(mut messages: Vec<BoxedMessage>) -> Vec<BoxedMessage> {
    match messages.iter().position(|m| m.role() == Role::User) {
        Some(first) => messages.split_off(first),
        None => Vec::new(),
    }
}
