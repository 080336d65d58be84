//! Streaming-chat wire types: message + origin + chat context + request/response.
//!
//! This crate defines the wire shape of one streaming-chat turn: the request a
//! client posts, and each newline-delimited response line the server emits.
//! It does not depend on trellis. The runtime bridges its internal journal
//! messages into [`ChatMessage`] values and serializes one [`ChatResponse`]
//! per line.

pub mod context;
pub mod message;
pub mod origin;
pub mod request;

pub use context::{ChatContext, ChatHistory};
pub use message::{ChatMessage, ChatMessageType};
pub use origin::{full_name_from_origin, OriginEntry};
pub use request::{ChatFilter, ChatFilterType, ChatRequest, ChatResponse, UserMessage};
