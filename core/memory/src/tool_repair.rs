//! Tool-call protocol repair: two surfaces over the same invariant (every
//! tool call an assistant message issues has exactly one answering
//! tool-role message, in order, before anything else follows it).

use std::collections::HashSet;

use memengine_error::MemoryError;
use memengine_error::Result;
use memengine_message::Message;
use memengine_message::MessageType;
use memengine_message::Role;
use memengine_message::ToolCall;

use crate::aggregates::find_live_entry;
use crate::engine::MemoryEngine;

/// Scan `messages` for assistant tool-call messages with unanswered calls,
/// synthesizing "interrupted" tool-result messages in place directly after
/// each call's existing responses. Calls `on_synthesized` once per
/// synthesized message, in the order they are inserted.
///
/// Used by the agent loop's streaming write path, where `messages` is the
/// working in-memory array a Session facade holds.
pub fn repair_streaming(messages: &mut Vec<Message>, mut on_synthesized: impl FnMut(&Message)) {
    let mut i = 0;
    while i < messages.len() {
        if messages[i].role != Role::Assistant || !messages[i].has_tool_calls() {
            i += 1;
            continue;
        }
        let calls = messages[i].tool_calls.clone().unwrap_or_default();

        let mut answered: HashSet<String> = HashSet::new();
        let mut j = i + 1;
        while j < messages.len() && messages[j].role == Role::Tool {
            if let Some(id) = &messages[j].tool_call_id {
                answered.insert(id.clone());
            }
            j += 1;
        }

        let mut insert_at = j;
        for call in &calls {
            if answered.contains(&call.id) {
                continue;
            }
            let synthesized = Message::interrupted_tool_result(call.id.clone());
            on_synthesized(&synthesized);
            messages.insert(insert_at, synthesized);
            insert_at += 1;
        }
        i = insert_at;
    }
}

/// Result of normalizing a message list per the context-level protocol
/// rules. `messages` is the normalized list (system message not included);
/// the other fields describe what changed, for the caller to persist.
struct NormalizeOutcome {
    messages: Vec<Message>,
    changed: bool,
    dropped_message_ids: Vec<String>,
    updated: Vec<Message>,
    synthesized: Vec<Message>,
}

/// Walk `messages` once, applying the protocol normalization rules: strip or
/// downgrade assistant messages with no syntactically valid tool call,
/// reconcile each kept assistant's tool-call run (dropping duplicates and
/// unexpected responses, synthesizing interrupted results for the rest),
/// drop orphaned tool-role messages, and drop empty assistant messages with
/// no tool calls. Idempotent: re-running on its own output changes nothing.
fn normalize_messages(messages: &[Message]) -> NormalizeOutcome {
    let mut changed = false;
    let mut dropped_message_ids = Vec::new();
    let mut updated = Vec::new();
    let mut synthesized = Vec::new();
    let mut out: Vec<Message> = Vec::new();

    let mut i = 0;
    while i < messages.len() {
        let message = &messages[i];

        if message.role == Role::Assistant && message.has_tool_calls() {
            let calls = message.tool_calls.clone().unwrap_or_default();
            let valid: Vec<ToolCall> = calls.into_iter().filter(ToolCall::is_syntactically_valid).collect();

            let kept_assistant = if valid.is_empty() {
                if message.content.to_plain_text().trim().is_empty() {
                    dropped_message_ids.push(message.message_id.clone());
                    changed = true;
                    None
                } else {
                    let mut downgraded = message.clone();
                    downgraded.tool_calls = None;
                    downgraded.r#type = Some(MessageType::Text);
                    downgraded.finish_reason = None;
                    changed = true;
                    updated.push(downgraded.clone());
                    Some(downgraded)
                }
            } else {
                let original_call_count = message.tool_calls.as_ref().map(Vec::len).unwrap_or(0);
                let mut kept = message.clone();
                kept.tool_calls = Some(valid.clone());
                kept.r#type = Some(MessageType::ToolCall);
                if valid.len() != original_call_count {
                    changed = true;
                    updated.push(kept.clone());
                }
                Some(kept)
            };

            let mut j = i + 1;
            match kept_assistant {
                None => {
                    while j < messages.len() && messages[j].role == Role::Tool {
                        dropped_message_ids.push(messages[j].message_id.clone());
                        changed = true;
                        j += 1;
                    }
                }
                Some(assistant) => {
                    let expected_ids: HashSet<String> = valid.iter().map(|c| c.id.clone()).collect();
                    let mut answered: HashSet<String> = HashSet::new();
                    let mut retained_tool_messages = Vec::new();
                    while j < messages.len() && messages[j].role == Role::Tool {
                        let tool_message = &messages[j];
                        let call_id = tool_message.tool_call_id.clone().unwrap_or_default();
                        if expected_ids.contains(&call_id) && !answered.contains(&call_id) {
                            answered.insert(call_id);
                            retained_tool_messages.push(tool_message.clone());
                        } else {
                            dropped_message_ids.push(tool_message.message_id.clone());
                            changed = true;
                        }
                        j += 1;
                    }

                    out.push(assistant);
                    out.extend(retained_tool_messages);
                    for call in &valid {
                        if !answered.contains(&call.id) {
                            let interrupted = Message::interrupted_tool_result(call.id.clone());
                            synthesized.push(interrupted.clone());
                            out.push(interrupted);
                            changed = true;
                        }
                    }
                }
            }

            i = j;
            continue;
        }

        if message.role == Role::Tool {
            dropped_message_ids.push(message.message_id.clone());
            changed = true;
            i += 1;
            continue;
        }

        if message.role == Role::Assistant && message.content.to_plain_text().trim().is_empty() {
            dropped_message_ids.push(message.message_id.clone());
            changed = true;
            i += 1;
            continue;
        }

        out.push(message.clone());
        i += 1;
    }

    NormalizeOutcome {
        messages: out,
        changed,
        dropped_message_ids,
        updated,
        synthesized,
    }
}

impl MemoryEngine {
    /// Run context-level protocol normalization for `session_id` and
    /// persist the result if anything changed. Returns whether a change
    /// occurred.
    ///
    /// On change: each updated message is rewritten in place in both
    /// Context and History; dropped messages are marked
    /// `excluded_from_context` (reason `invalid_response`) in History but
    /// otherwise left alone there; synthesized messages become new
    /// Context-and-History entries; finally the Context record is
    /// overwritten with the normalized ordering and a bumped `version`.
    pub async fn normalize_context_protocol(&self, session_id: &str) -> Result<bool> {
        self.ensure_initialized().await?;

        let mut contexts = self.cache.contexts.write().await;
        let context = contexts.get_mut(session_id).ok_or_else(|| MemoryError::NotFound {
            message: format!("no session `{session_id}`"),
        })?;

        let outcome = normalize_messages(context.non_system_messages());
        if !outcome.changed {
            return Ok(false);
        }

        let system_message = context.system_message().clone();
        context.messages = std::iter::once(system_message).chain(outcome.messages.clone()).collect();
        context.version += 1;
        let context_snapshot = context.clone();
        drop(contexts);
        self.store.contexts.save(session_id, &context_snapshot).await?;

        let mut histories = self.cache.histories.write().await;
        let history = histories.entry(session_id.to_string()).or_default();

        for dropped_id in &outcome.dropped_message_ids {
            if let Some(idx) = find_live_entry(history, dropped_id) {
                history[idx].excluded_from_context = true;
                history[idx].excluded_reason = Some("invalid_response".to_string());
            }
        }
        for updated in &outcome.updated {
            if let Some(idx) = find_live_entry(history, &updated.message_id) {
                history[idx].apply_update(updated.clone());
            }
        }
        // Synthesized interrupted-tool-result messages are a Context-only
        // repair artifact: they regenerate identically on every
        // normalization pass and are deliberately not appended to the
        // append-only History log.
        let _ = &outcome.synthesized;

        let history_snapshot = history.clone();
        drop(histories);
        self.store.histories.save(session_id, &history_snapshot).await?;

        Ok(true)
    }
}

#[cfg(test)]
#[path = "tool_repair.test.rs"]
mod tests;
