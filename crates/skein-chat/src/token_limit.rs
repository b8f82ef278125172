//! Usage-based compaction: shrink when the prompt outgrows a token budget.

use async_trait::async_trait;

use crate::compaction::{
    advance_to_first_user_message, CompactionRequest, CompactionResponse, CompactionStrategy,
    CompactionTrigger, Compactor,
};
use crate::error::Result;

/// Removes the oldest messages when the last reported prompt token count
/// exceeds `max_tokens`, advancing to a user-message boundary afterwards.
/// The decision rests on real usage figures from the provider; without them
/// the compactor stays quiet.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenLimitCompactor {
    /// Prompt-token ceiling checked against the last reported usage. Zero
    /// disables the compactor.
    pub max_tokens: u32,

    /// Token count to aim for after compaction. Zero means three quarters
    /// of `max_tokens`, leaving headroom before the next trigger.
    pub target_tokens: u32,
}

impl TokenLimitCompactor {
    fn target(&self) -> u32 {
        if self.target_tokens > 0 {
            self.target_tokens
        } else {
            (self.max_tokens * 3) / 4
        }
    }
}

#[async_trait]
impl Compactor for TokenLimitCompactor {
    async fn compact(&self, request: &CompactionRequest) -> Result<CompactionResponse> {
        if self.should_compact(request).await? {
            self.compact_messages(request).await
        } else {
            Ok(CompactionResponse::not_compacted(request))
        }
    }
}

#[async_trait]
impl CompactionTrigger for TokenLimitCompactor {
    async fn should_compact(&self, request: &CompactionRequest) -> Result<bool> {
        // Cannot make an informed decision without usage data.
        let Some(usage) = request.last_api_usage else {
            return Ok(false);
        };
        Ok(self.max_tokens > 0 && usage.prompt_tokens > self.max_tokens)
    }
}

#[async_trait]
impl CompactionStrategy for TokenLimitCompactor {
    async fn compact_messages(&self, request: &CompactionRequest) -> Result<CompactionResponse> {
        let Some(usage) = request.last_api_usage else {
            return Ok(CompactionResponse::not_compacted(request));
        };

        // Already at or under target, nothing to remove.
        if usage.prompt_tokens <= self.target() {
            return Ok(CompactionResponse::not_compacted(request));
        }

        // Keep at least two messages for context.
        if request.state_messages.len() <= 2 {
            return Ok(CompactionResponse::not_compacted(request));
        }

        // Per-message token counts are unknown, so drop the oldest third and
        // let the next turn's usage figure steer any further trimming.
        let remove_count = (request.state_messages.len() / 3).max(1);
        let kept = request.state_messages[remove_count..].to_vec();
        Ok(CompactionResponse::compacted(advance_to_first_user_message(
            kept,
        )))
    }
}
