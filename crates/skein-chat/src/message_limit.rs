//! Count-based compaction: keep only the most recent messages.

use async_trait::async_trait;

use crate::compaction::{
    advance_to_first_user_message, CompactionRequest, CompactionResponse, CompactionStrategy,
    CompactionTrigger, Compactor,
};
use crate::error::Result;

/// Keeps the last `max_messages` entries once history grows past the limit,
/// then advances to the first user message so state resumes at a natural
/// boundary. Usable whole, or through its trigger and strategy halves.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageLimitCompactor {
    /// Maximum number of messages to keep in state. Zero disables the
    /// compactor.
    pub max_messages: usize,
}

#[async_trait]
impl Compactor for MessageLimitCompactor {
    async fn compact(&self, request: &CompactionRequest) -> Result<CompactionResponse> {
        if self.should_compact(request).await? {
            self.compact_messages(request).await
        } else {
            Ok(CompactionResponse::not_compacted(request))
        }
    }
}

#[async_trait]
impl CompactionTrigger for MessageLimitCompactor {
    async fn should_compact(&self, request: &CompactionRequest) -> Result<bool> {
        Ok(self.max_messages > 0 && request.state_messages.len() > self.max_messages)
    }
}

#[async_trait]
impl CompactionStrategy for MessageLimitCompactor {
    async fn compact_messages(&self, request: &CompactionRequest) -> Result<CompactionResponse> {
        let keep_from = request.state_messages.len().saturating_sub(self.max_messages);
        let kept = request.state_messages[keep_from..].to_vec();
        Ok(CompactionResponse::compacted(advance_to_first_user_message(
            kept,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assistant_msg, compaction_request, user_msg};
    use skein_ai::Role;

    #[tokio::test]
    async fn test_no_compaction_under_limit() {
        let compactor = MessageLimitCompactor { max_messages: 4 };
        let request = compaction_request(vec![user_msg("a"), assistant_msg("b")], None);

        let response = compactor.compact(&request).await.unwrap();
        assert!(!response.was_compacted);
        assert_eq!(response.state_messages.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_limit_disables() {
        let compactor = MessageLimitCompactor { max_messages: 0 };
        let messages = vec![
            user_msg("a"),
            assistant_msg("b"),
            user_msg("c"),
            assistant_msg("d"),
        ];
        let request = compaction_request(messages, None);

        let response = compactor.compact(&request).await.unwrap();
        assert!(!response.was_compacted);
        assert_eq!(response.state_messages.len(), 4);
    }

    #[tokio::test]
    async fn test_keeps_last_messages_from_user_boundary() {
        let compactor = MessageLimitCompactor { max_messages: 4 };
        let messages = vec![
            user_msg("q1"),
            assistant_msg("r1"),
            user_msg("q2"),
            assistant_msg("r2"),
            user_msg("q3"),
            assistant_msg("r3"),
        ];
        let request = compaction_request(messages, None);

        let response = compactor.compact(&request).await.unwrap();
        assert!(response.was_compacted);
        assert_eq!(response.state_messages.len(), 4);
        assert_eq!(response.state_messages[0].role(), Role::User);
        assert_eq!(response.state_messages[0].content(), "q2");
    }

    #[tokio::test]
    async fn test_advances_past_leading_assistant() {
        let compactor = MessageLimitCompactor { max_messages: 4 };
        let messages = vec![
            user_msg("q1"),
            assistant_msg("r1a"),
            assistant_msg("r1b"),
            user_msg("q2"),
            assistant_msg("r2"),
        ];
        let request = compaction_request(messages, None);

        // Last four start mid-exchange; the result snaps to the next user
        // message.
        let response = compactor.compact(&request).await.unwrap();
        assert!(response.was_compacted);
        assert_eq!(response.state_messages.len(), 2);
        assert_eq!(response.state_messages[0].content(), "q2");
    }

    #[tokio::test]
    async fn test_no_user_message_left_empties_history() {
        let compactor = MessageLimitCompactor { max_messages: 2 };
        let messages = vec![
            user_msg("q1"),
            assistant_msg("r1"),
            assistant_msg("r2"),
            assistant_msg("r3"),
        ];
        let request = compaction_request(messages, None);

        let response = compactor.compact(&request).await.unwrap();
        assert!(response.was_compacted);
        assert!(response.state_messages.is_empty());
    }
}
