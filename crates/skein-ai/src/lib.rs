//! skein-ai: provider abstraction for the skein conversation orchestrator
//!
//! This crate defines the boundary between the orchestration layer and a
//! concrete LLM provider: the opaque [`Message`] contract, the [`Backend`]
//! trait, and the wire-level value types they exchange. Provider HTTP
//! clients implement [`Backend`] and live outside this workspace.

pub mod backend;
pub mod error;
pub mod message;
pub mod types;

pub use backend::Backend;
pub use error::{Error, Result};
pub use message::{BoxedMessage, JsonMessage, Message};
pub use types::*;
