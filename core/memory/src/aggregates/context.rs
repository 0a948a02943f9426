//! The Context aggregate: the prompt actually sent to the model.

use memengine_message::Message;
use memengine_message::Role;
use serde::Deserialize;
use serde::Serialize;

/// The live, mutable message list the engine hands the LLM.
///
/// Invariants: exactly one system message at index 0; for every message
/// with a tool-call list, the set of `tool_call_id`s that appear as
/// subsequent tool-role messages is a subset of that list's valid ids; no
/// two consecutive non-system messages share a `message_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentContext {
    /// The owning session.
    pub session_id: String,
    /// This context's own identifier, distinct from `session_id`.
    pub context_id: String,
    /// Ordered messages, system message first.
    pub messages: Vec<Message>,
    /// Monotonically increasing version, bumped on every structural change.
    pub version: u64,
    /// The compaction that produced the current summary, if any.
    pub last_compaction_id: Option<String>,
}

impl CurrentContext {
    /// Build a fresh context containing only the system message.
    pub fn new(session_id: impl Into<String>, context_id: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        CurrentContext {
            session_id: session_id.into(),
            context_id: context_id.into(),
            messages: vec![Message::system(system_prompt)],
            version: 1,
            last_compaction_id: None,
        }
    }

    /// The system message, which invariantly sits at index 0.
    pub fn system_message(&self) -> &Message {
        // Safety of indexing: repair (§4.7) and every mutation in this crate
        // maintain "system message at index 0" as a hard invariant.
        &self.messages[0]
    }

    /// Non-system messages, in order.
    pub fn non_system_messages(&self) -> &[Message] {
        &self.messages[1..]
    }

    /// Index of the last message with the given id, if present.
    pub fn last_index_of(&self, message_id: &str) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| m.message_id == message_id)
    }

    /// Upsert a message: if its id matches the last message's id, replace
    /// it in place (the streaming-token case); otherwise append.
    ///
    /// Returns whether an append occurred (as opposed to an in-place
    /// replace), which callers use to decide whether to bump `version`.
    pub fn upsert_last(&mut self, message: Message) -> bool {
        if let Some(last) = self.messages.last()
            && last.message_id == message.message_id
        {
            let idx = self.messages.len() - 1;
            self.messages[idx] = message;
            false
        } else {
            self.messages.push(message);
            true
        }
    }

    /// Reset to only the system message.
    pub fn clear_to_system(&mut self) {
        self.messages.truncate(1);
    }

    /// Validate the tool-call/tool-result subset invariant and the
    /// no-duplicate-consecutive-ids invariant. Returns the first
    /// violation description found, if any.
    pub fn check_invariants(&self) -> Option<String> {
        if self.messages.is_empty() || self.messages[0].role != Role::System {
            return Some("context must start with a system message".to_string());
        }
        for window in self.messages.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            if a.role != Role::System
                && b.role != Role::System
                && a.message_id == b.message_id
            {
                return Some(format!(
                    "consecutive non-system messages share message_id {}",
                    a.message_id
                ));
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "context.test.rs"]
mod tests;
