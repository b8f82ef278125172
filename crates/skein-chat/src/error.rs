//! Error types for skein-chat

use thiserror::Error;

/// Result type alias using skein-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort an orchestrated chat call.
///
/// Tool failures never appear here; they are converted into in-band tool
/// results so the model can react. Unreadable conversation state does not
/// appear here either; it is discarded with a logged warning and the call
/// proceeds from a fresh history.
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the provider layer
    #[error(transparent)]
    Ai(#[from] skein_ai::Error),

    /// The provider ran out of tokens mid-conversation
    #[error("conversation exceeded max tokens")]
    MaxTokens,

    /// The provider returned a finish reason this library does not know
    #[error("unknown finish reason: {0}")]
    UnknownFinishReason(String),

    /// The tool-calling loop hit its iteration bound
    #[error("exceeded max tool iterations ({0})")]
    MaxToolIterations(usize),

    /// Conversation state could not be encoded
    #[error("failed to encode conversation state: {0}")]
    StateEncoding(String),

    /// A compactor failed
    #[error("compaction failed: {0}")]
    Compaction(String),
}
