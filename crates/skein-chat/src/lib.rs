//! skein-chat: multi-turn conversation orchestration with tools and state
//!
//! This crate drives the model/tool loop against a [`skein_ai::Backend`]:
//! it asks the provider for one completion at a time, runs requested tools
//! through caller-supplied handlers, feeds results back, and re-encodes the
//! conversation into an opaque [`ConversationState`] blob that survives
//! process restarts. Pluggable [`Compactor`]s bound history growth.

pub mod chat;
pub mod compaction;
pub mod error;
pub mod logger;
pub mod message_limit;
pub mod state;
pub mod token_limit;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{Chat, ChatRequest};
pub use compaction::{
    advance_to_first_user_message, CompactionRequest, CompactionResponse, CompactionStrategy,
    CompactionTrigger, Compactor, CompositeCompactor, CompositeTrigger, SplitCompactor,
};
pub use error::{Error, Result};
pub use logger::{
    ActionAccumulator, ActionLogger, NullActionLogger, ToolAction, ToolExecutionRecord,
};
pub use message_limit::MessageLimitCompactor;
pub use state::ConversationState;
pub use token_limit::TokenLimitCompactor;
pub use tool::{BoxedTool, Tool, ToolContext, ToolError, ToolRequest, ToolResult, ToolSet};
