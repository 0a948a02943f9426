//! Compaction engine: token accounting, trigger evaluation, message-region
//! split, tool-pair preservation, and summary synthesis.
//!
//! This is distinct from [`crate::aggregates::CompactionRecord`], the data
//! type a compaction event leaves behind; this module is the decision and
//! transformation logic that produces one.

use async_trait::async_trait;
use memengine_error::MemoryError;
use memengine_error::Result;
use memengine_message::Message;
use memengine_message::MessageType;
use memengine_message::Role;

use crate::aggregates::CompactionReason;
use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::engine::MemoryEngine;
use crate::services::CompactContextOptions;

/// Knobs controlling when and how compaction runs.
#[derive(Debug, Clone, Copy)]
pub struct CompactionConfig {
    /// Non-system messages always kept verbatim, before tool-pair
    /// adjustment.
    pub keep_last_n: u64,
    /// Fraction of the effective budget that must be in use to trigger.
    pub trigger_ratio: f64,
    /// The model's total context window.
    pub max_tokens: i64,
    /// Tokens reserved for the model's own output.
    pub max_output_tokens: i64,
    /// Per-message cap when serializing the pending region for the
    /// summarization prompt.
    pub max_serialized_message_chars: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        CompactionConfig {
            keep_last_n: 6,
            trigger_ratio: 0.8,
            max_tokens: 128_000,
            max_output_tokens: 4_096,
            max_serialized_message_chars: 2_000,
        }
    }
}

/// Generates a summary for the archived region of a conversation. Backed
/// in production by whatever LLM provider the agent loop already talks to;
/// the engine depends only on this trait.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Produce a summary for `prompt`, generated at low temperature.
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// Token-usage accounting for a Context snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBreakdown {
    pub accumulated_from_usage: i64,
    pub messages_with_usage: usize,
    pub estimate: i64,
    pub reliable: bool,
    pub used: i64,
}

/// Accumulate `usage.total_tokens` across messages that carry it, and a
/// cheap content-length estimate. The accumulated figure is reliable only
/// when usage is present on more than half the messages and no summary
/// message exists in the context (a summary means earlier usage numbers no
/// longer describe what is actually in the prompt).
pub fn compute_token_breakdown(context: &CurrentContext) -> TokenBreakdown {
    let messages = &context.messages;
    let accumulated_from_usage: i64 = messages
        .iter()
        .filter_map(|m| m.usage.as_ref())
        .filter_map(|u| u.total_tokens)
        .sum();
    let messages_with_usage = messages.iter().filter(|m| m.usage.is_some()).count();
    let has_summary = messages.iter().any(|m| m.r#type == Some(MessageType::Summary));
    let reliable = !messages.is_empty() && messages_with_usage * 2 > messages.len() && !has_summary;
    let estimate: i64 = messages.iter().map(Message::estimate_tokens).sum();
    let used = if reliable { accumulated_from_usage } else { estimate };
    TokenBreakdown {
        accumulated_from_usage,
        messages_with_usage,
        estimate,
        reliable,
        used,
    }
}

/// Whether compaction should run for the given token breakdown and
/// message count, per `config`.
pub fn should_trigger(breakdown: &TokenBreakdown, non_system_count: usize, config: &CompactionConfig) -> bool {
    let effective_budget = (config.max_tokens - config.max_output_tokens) as f64;
    let used_enough = (breakdown.used as f64) >= config.trigger_ratio * effective_budget;
    used_enough && non_system_count as u64 > config.keep_last_n
}

/// The pending (to be summarized) and active (to be kept) message regions,
/// after the keepLastN split, the last-user-message shift, and tool-pair
/// preservation have all been applied.
struct RegionSplit {
    pending: Vec<Message>,
    active: Vec<Message>,
}

fn split_regions(non_system: &[Message], keep_last_n: u64) -> RegionSplit {
    let count = non_system.len();
    let mut split = count.saturating_sub(keep_last_n as usize);

    if let Some(last_user_idx) = non_system.iter().rposition(|m| m.role == Role::User)
        && last_user_idx < split
    {
        split = last_user_idx;
    }

    let (pending, active) = non_system.split_at(split);
    RegionSplit {
        pending: pending.to_vec(),
        active: active.to_vec(),
    }
}

fn issuer_of(tool_call_id: &str, candidates: &[Message]) -> Option<String> {
    candidates
        .iter()
        .find(|m| {
            m.role == Role::Assistant
                && m.tool_calls
                    .as_ref()
                    .is_some_and(|calls| calls.iter().any(|c| c.id == tool_call_id))
        })
        .map(|m| m.message_id.clone())
}

/// Apply tool-pair preservation to a region split.
///
/// Two rules run to a fixed point:
/// 1. A tool round trip sitting at the pending/active seam is never
///    severed from the turn it completes: while the last pending message is
///    a tool response, or an assistant whose tool calls are not all
///    answered within the remaining pending prefix, it migrates to the
///    front of active.
/// 2. A tool-role message in active whose issuing assistant is still in
///    pending pulls that assistant (and any of its other tool responses
///    still in pending) forward too.
fn preserve_tool_pairs(mut split: RegionSplit) -> RegionSplit {
    loop {
        let mut migrated_this_pass = false;

        loop {
            let unanswered_tail = match split.pending.last() {
                Some(last) => match last.role {
                    Role::Tool => true,
                    Role::Assistant => last.tool_calls.as_ref().is_some_and(|calls| {
                        calls.iter().any(|c| {
                            !split
                                .pending
                                .iter()
                                .any(|m| m.role == Role::Tool && m.tool_call_id.as_deref() == Some(c.id.as_str()))
                        })
                    }),
                    _ => false,
                },
                None => false,
            };
            if !unanswered_tail {
                break;
            }
            let Some(message) = split.pending.pop() else { break };
            split.active.insert(0, message);
            migrated_this_pass = true;
        }

        let combined: Vec<Message> = split.pending.iter().chain(split.active.iter()).cloned().collect();
        let orphan_assistant_ids: Vec<String> = split
            .active
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .filter_map(|id| issuer_of(id, &combined))
            .filter(|assistant_id| split.pending.iter().any(|m| &m.message_id == assistant_id))
            .collect();

        for assistant_id in orphan_assistant_ids {
            if let Some(idx) = split.pending.iter().position(|m| m.message_id == assistant_id) {
                let assistant = split.pending.remove(idx);
                split.active.insert(0, assistant);
                migrated_this_pass = true;
            }
        }

        if !migrated_this_pass {
            break;
        }
    }
    split
}

/// Render the fixed eight-section compaction prompt for `pending` (with
/// any leading summary already extracted by the caller).
fn build_summary_prompt(pending: &[Message], previous_summary: Option<&str>, max_chars: usize) -> String {
    let transcript: String = pending
        .iter()
        .map(|m| {
            let mut text = m.content.to_plain_text();
            if text.len() > max_chars {
                text.truncate(max_chars);
                text.push_str("...[truncated]");
            }
            format!("[{:?}] {}", m.role, text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let previous_block = previous_summary
        .map(|s| format!("<PREVIOUS_SUMMARY>\n{s}\n</PREVIOUS_SUMMARY>\n\n"))
        .unwrap_or_default();

    format!(
        "{previous_block}\
## 1. Task Context\nSummarize the working task this conversation is pursuing.\n\n\
## 2. Key Decisions\nList decisions made and why.\n\n\
## 3. Files & Artifacts Touched\nList files, commands, or resources referenced.\n\n\
## 4. Tool Usage\nSummarize tool calls issued and their outcomes.\n\n\
## 5. Errors & Resolutions\nNote errors encountered and how they were resolved.\n\n\
## 6. Current State\nDescribe where the task stands right now.\n\n\
## 7. Open Items\nList unresolved questions or next steps.\n\n\
## 8. Constraints\nNote any constraints the agent must keep respecting.\n\n\
Compress the conversation below into the eight sections above.\n\n{transcript}"
    )
}

/// Evaluate whether `session_id` should compact, and if so, run the full
/// pipeline and persist the result through [`MemoryEngine::compact_context`].
/// Returns `None` when the trigger condition is not met.
pub async fn maybe_compact(
    engine: &MemoryEngine,
    session_id: &str,
    config: &CompactionConfig,
    provider: &dyn SummaryProvider,
    reason: CompactionReason,
) -> Result<Option<CompactionRecord>> {
    let Some(context) = engine.get_current_context(session_id).await? else {
        return Err(MemoryError::NotFound {
            message: format!("no session `{session_id}`"),
        });
    };

    let breakdown = compute_token_breakdown(&context);
    let non_system = context.non_system_messages();
    if !should_trigger(&breakdown, non_system.len(), config) {
        return Ok(None);
    }

    let split = preserve_tool_pairs(split_regions(non_system, config.keep_last_n));

    let (previous_summary, remaining_pending) = match split.pending.split_first() {
        Some((first, rest)) if first.r#type == Some(MessageType::Summary) => (Some(first.content.to_plain_text()), rest.to_vec()),
        _ => (None, split.pending.clone()),
    };

    let prompt = build_summary_prompt(&remaining_pending, previous_summary.as_deref(), config.max_serialized_message_chars);
    let summary_text = provider.summarize(&prompt).await?;
    let summary_message = Message::summary(summary_text);

    let archived_message_ids: Vec<String> = split.pending.iter().map(|m| m.message_id.clone()).collect();

    let record = engine
        .compact_context(
            session_id,
            CompactContextOptions {
                keep_last_n: split.active.len() as u64,
                summary: summary_message,
                reason,
                token_count_before: Some(breakdown.used),
                token_count_after: None,
            },
        )
        .await?;

    debug_assert_eq!(record.archived_message_ids.len(), archived_message_ids.len());
    Ok(Some(record))
}

#[cfg(test)]
#[path = "compaction_engine.test.rs"]
mod tests;
