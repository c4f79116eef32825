//! Internal canonical types for chat request and stream representation
//!
//! These types are dialect-agnostic. Every inbound dialect converts to them
//! and every upstream chunk is decoded into them.

pub mod chunk;
pub mod message;
pub mod request;

use std::pin::Pin;

use futures_util::Stream;

pub use chunk::{ChatChunk, ChunkChoice, ChunkDelta, FinishReason};
pub use message::{Message, Role};
pub use request::ChatRequest;

use crate::error::LlmError;

/// Lazy, finite sequence of chat chunks from one upstream call
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>>;
