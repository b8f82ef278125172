//! Opaque conversation state and its codec.
//!
//! State is a versioned JSON envelope carrying each message's provider
//! serialization verbatim. Decoding is deliberately forgiving: anything
//! that cannot be restored for the current backend is discarded with a
//! logged warning and the conversation starts fresh. Encoding failures, by
//! contrast, surface as errors.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use skein_ai::{BoxedMessage, Role};

use crate::chat::Chat;
use crate::error::{Error, Result};

/// Version written to and required from the state envelope.
pub(crate) const STATE_VERSION: u32 = 1;

/// An opaque blob of conversation history.
///
/// Clients store and retrieve it between turns but must not inspect it; the
/// layout is private to this crate and validated against the producing
/// backend on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState(Vec<u8>);

impl ConversationState {
    /// Wrap previously persisted bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes for persistence.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the state into its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for ConversationState {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Internal layout of the blob. Not exposed to clients.
#[derive(Serialize, Deserialize)]
struct StateEnvelope {
    /// State format version (current: 1)
    version: u32,
    /// Backend provider name (e.g. "openai")
    provider: String,
    /// How many messages a completion call has already processed; later
    /// appended messages are excluded
    processed_length: usize,
    /// Conversation history, each element a provider envelope verbatim
    messages: Vec<Box<RawValue>>,
}

impl Chat {
    /// Serialize conversation history to an opaque blob.
    pub(crate) fn encode_state(
        &self,
        messages: &[BoxedMessage],
        processed_length: usize,
    ) -> Result<ConversationState> {
        let mut raw_messages = Vec::with_capacity(messages.len());
        for (index, message) in messages.iter().enumerate() {
            let bytes = message
                .to_bytes()
                .map_err(|e| Error::StateEncoding(format!("marshal message {index}: {e}")))?;
            let text = String::from_utf8(bytes)
                .map_err(|e| Error::StateEncoding(format!("marshal message {index}: {e}")))?;
            let raw = RawValue::from_string(text)
                .map_err(|e| Error::StateEncoding(format!("marshal message {index}: {e}")))?;
            raw_messages.push(raw);
        }

        let envelope = StateEnvelope {
            version: STATE_VERSION,
            provider: self.backend.provider_name().to_string(),
            processed_length,
            messages: raw_messages,
        };

        let data = serde_json::to_vec(&envelope).map_err(|e| Error::StateEncoding(e.to_string()))?;
        Ok(ConversationState(data))
    }

    /// Deserialize conversation state from an opaque blob, returning the
    /// history and the stored processed length.
    ///
    /// Never fails: an absent or empty blob, a parse failure, a version or
    /// provider mismatch, or any message that does not reconstruct all
    /// degrade to an empty history, logged so operators can observe the
    /// silent reset.
    pub(crate) fn decode_state(&self, state: Option<&ConversationState>) -> (Vec<BoxedMessage>, usize) {
        let Some(state) = state else {
            return (Vec::new(), 0);
        };
        if state.is_empty() {
            return (Vec::new(), 0);
        }

        let envelope: StateEnvelope = match serde_json::from_slice(state.as_bytes()) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable conversation state");
                return (Vec::new(), 0);
            }
        };

        if envelope.version != STATE_VERSION {
            tracing::warn!(
                version = envelope.version,
                supported = STATE_VERSION,
                "discarding conversation state with unsupported version"
            );
            return (Vec::new(), 0);
        }

        let current = self.backend.provider_name();
        if envelope.provider != current {
            tracing::warn!(
                state_provider = %envelope.provider,
                current_provider = %current,
                "discarding conversation state from another provider"
            );
            return (Vec::new(), 0);
        }

        let mut messages = Vec::with_capacity(envelope.messages.len());
        for (index, raw) in envelope.messages.iter().enumerate() {
            match self.backend.unmarshal_message(raw.get().as_bytes()) {
                Ok(message) => messages.push(message),
                Err(error) => {
                    tracing::warn!(%error, index, "discarding conversation state with unreadable message");
                    return (Vec::new(), 0);
                }
            }
        }

        (messages, envelope.processed_length)
    }
}

/// Build the full message list for one provider call: leading system
/// messages from the options, then stored history, then the remaining
/// option messages. The leading system block is the ephemeral preamble; it
/// refreshes every call and is never persisted.
pub(crate) fn build_messages(
    opt_messages: &[BoxedMessage],
    state_messages: &[BoxedMessage],
) -> Vec<BoxedMessage> {
    let split = opt_messages
        .iter()
        .position(|m| m.role() != Role::System)
        .unwrap_or(opt_messages.len());
    let (preamble, rest) = opt_messages.split_at(split);

    let mut result = Vec::with_capacity(opt_messages.len() + state_messages.len());
    result.extend_from_slice(preamble);
    result.extend_from_slice(state_messages);
    result.extend_from_slice(rest);
    result
}

/// Drop only the leading system messages. Everything from the first
/// non-system message onward is kept, inline system messages included.
///
/// {1S, 2S, 3U, 4S, 5U} becomes {3U, 4S, 5U}
pub(crate) fn strip_leading_system(messages: &[BoxedMessage]) -> Vec<BoxedMessage> {
    match messages.iter().position(|m| m.role() != Role::System) {
        Some(first) => messages[first..].to_vec(),
        None => Vec::new(),
    }
}

/// The inverse of [`strip_leading_system`]: only the leading system block.
/// Used to hand compactors the preamble for reference.
///
/// {1S, 2S, 3U, 4S, 5U} becomes {1S, 2S}
pub(crate) fn extract_leading_system(messages: &[BoxedMessage]) -> Vec<BoxedMessage> {
    match messages.iter().position(|m| m.role() != Role::System) {
        Some(first) => messages[..first].to_vec(),
        None => messages.to_vec(),
    }
}
