//! The core [`Message`] value type and its small companion enums.

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::content::MessageContent;
use crate::tool_call::ToolCall;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions. Exactly one exists, at index 0 of a Context.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
    /// Tool/function result.
    Tool,
}

/// Tag distinguishing how a message's content should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    /// Plain conversational text.
    Text,
    /// An assistant message that issued one or more tool calls.
    ToolCall,
    /// A tool-role message carrying a tool's result.
    ToolResult,
    /// A synthesized compaction summary.
    Summary,
}

/// Token usage reported alongside a model response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<i64>,
    /// Tokens consumed by the completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<i64>,
    /// Total tokens for the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i64>,
}

/// A single message in a conversation.
///
/// This is a value type, not an aggregate: it carries no identity of its
/// own beyond `message_id`, and the engine's aggregates (Context, History)
/// own collections of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id for this message, stable across Context and History.
    pub message_id: String,
    /// The message's role.
    pub role: Role,
    /// The message's content.
    pub content: MessageContent,
    /// How to interpret this message's content, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<MessageType>,
    /// Tool calls issued by an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// For a tool-role message, the id of the call it answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Why generation stopped, for assistant messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Token usage, for assistant messages produced by a model call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Message {
    /// Allocate a fresh message id.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            message_id: Self::new_id(),
            role: Role::System,
            content: MessageContent::text(content),
            r#type: Some(MessageType::Text),
            tool_calls: None,
            tool_call_id: None,
            finish_reason: None,
            usage: None,
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            message_id: Self::new_id(),
            role: Role::User,
            content: MessageContent::text(content),
            r#type: Some(MessageType::Text),
            tool_calls: None,
            tool_call_id: None,
            finish_reason: None,
            usage: None,
        }
    }

    /// Build a plain-text assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            message_id: Self::new_id(),
            role: Role::Assistant,
            content: MessageContent::text(content),
            r#type: Some(MessageType::Text),
            tool_calls: None,
            tool_call_id: None,
            finish_reason: None,
            usage: None,
        }
    }

    /// Build an assistant message that issues tool calls.
    pub fn assistant_tool_call(tool_calls: Vec<ToolCall>) -> Self {
        Message {
            message_id: Self::new_id(),
            role: Role::Assistant,
            content: MessageContent::text(""),
            r#type: Some(MessageType::ToolCall),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            finish_reason: Some("tool_calls".to_string()),
            usage: None,
        }
    }

    /// Build a tool-result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message {
            message_id: Self::new_id(),
            role: Role::Tool,
            content: MessageContent::text(content),
            r#type: Some(MessageType::ToolResult),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            finish_reason: None,
            usage: None,
        }
    }

    /// Build a synthesized "interrupted" tool-result message standing in
    /// for a tool call that never got a response.
    pub fn interrupted_tool_result(tool_call_id: impl Into<String>) -> Self {
        let body = serde_json::json!({
            "success": false,
            "error": "TOOL_CALL_INTERRUPTED",
            "interrupted": true,
            "message": "Tool call was interrupted before a result was recorded.",
        });
        Message::tool_result(tool_call_id, body.to_string())
    }

    /// Build a compaction summary message.
    pub fn summary(content: impl Into<String>) -> Self {
        Message {
            message_id: Self::new_id(),
            role: Role::Assistant,
            content: MessageContent::text(content),
            r#type: Some(MessageType::Summary),
            tool_calls: None,
            tool_call_id: None,
            finish_reason: None,
            usage: None,
        }
    }

    /// Whether this message carries a non-empty set of tool calls.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    /// Whether this message is the synthesized interrupted-tool-result shape.
    pub fn is_interrupted_tool_result(&self) -> bool {
        self.role == Role::Tool && self.content.to_plain_text().contains("TOOL_CALL_INTERRUPTED")
    }

    /// Rough token estimate: about one token per four characters, plus a
    /// small fixed per-message overhead for role/metadata framing.
    pub fn estimate_tokens(&self) -> i64 {
        const PER_MESSAGE_OVERHEAD: i64 = 4;
        (self.content.char_len() as i64) / 4 + PER_MESSAGE_OVERHEAD
    }
}

#[cfg(test)]
#[path = "message.test.rs"]
mod tests;
