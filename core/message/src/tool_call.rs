//! Tool-call shapes carried on assistant messages.

use serde::Deserialize;
use serde::Serialize;

/// The function body of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Name of the tool/function being invoked.
    pub name: String,
    /// JSON-encoded arguments, as a string (matches the wire shape every
    /// provider uses: arguments are not parsed until a tool actually runs).
    pub arguments: String,
}

/// A single tool call issued by an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique id for this call, referenced by the matching tool-result
    /// message's `tool_call_id`.
    pub id: String,
    /// Always `"function"` today; kept as a field rather than a unit variant
    /// so the wire format stays stable if other call kinds appear.
    #[serde(rename = "type")]
    pub kind: String,
    /// The function being called.
    pub function: ToolCallFunction,
}

impl ToolCall {
    /// Build a function tool call.
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        ToolCall {
            id: id.into(),
            kind: "function".to_string(),
            function: ToolCallFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Whether this call is syntactically valid: non-empty id, `type =
    /// "function"`, non-empty function name, and arguments present as a
    /// string (always true here since `arguments` is typed as `String`, but
    /// kept explicit so the invariant is visible at the call site).
    pub fn is_syntactically_valid(&self) -> bool {
        !self.id.is_empty() && self.kind == "function" && !self.function.name.is_empty()
    }
}

#[cfg(test)]
#[path = "tool_call.test.rs"]
mod tests;
