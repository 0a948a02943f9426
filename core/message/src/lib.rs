//! Value types for conversation messages.
//!
//! These types are shared between the in-memory Context and the
//! append-only History: a `Message` carries no storage concerns of its
//! own, it is plain data that the memory engine's aggregates wrap.

mod content;
mod message;
mod tool_call;

pub use content::ContentPart;
pub use content::MessageContent;
pub use message::Message;
pub use message::MessageType;
pub use message::Role;
pub use message::Usage;
pub use tool_call::ToolCall;
pub use tool_call::ToolCallFunction;
