//! Session-context service: create/read/update/clear/compact across the
//! (Session, Context, History, Compaction) quartet.

use chrono::Utc;
use memengine_error::MemoryError;
use memengine_error::Result;
use memengine_message::Message;
use memengine_message::Role;
use uuid::Uuid;

use crate::aggregates::CompactionReason;
use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::aggregates::HistoryMessage;
use crate::aggregates::SessionData;
use crate::aggregates::find_live_entry;
use crate::engine::MemoryEngine;
use crate::query::HistoryFilter;
use crate::query::HistoryQueryOptions;
use crate::query::QueryOptions;
use crate::query::SessionFilter;

/// Per-call options for `add_message_to_context`.
#[derive(Debug, Clone, Copy)]
pub struct AddMessageOptions {
    pub add_to_history: bool,
}

impl Default for AddMessageOptions {
    fn default() -> Self {
        AddMessageOptions { add_to_history: true }
    }
}

/// Options driving a single compaction event. The summary message itself
/// is produced by the compaction engine (§4.12) before this call; this
/// service only performs the archive/rebuild/record bookkeeping.
pub struct CompactContextOptions {
    pub keep_last_n: u64,
    pub summary: Message,
    pub reason: CompactionReason,
    pub token_count_before: Option<i64>,
    pub token_count_after: Option<i64>,
}

impl MemoryEngine {
    /// Allocate a fresh `session_id` if omitted; fail if the id already
    /// exists. Builds Session, Context (one system message), History (one
    /// entry), and an empty Compaction list, persisting all four.
    pub async fn create_session(&self, session_id: Option<String>, system_prompt: impl Into<String>) -> Result<String> {
        self.ensure_initialized().await?;
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let system_prompt = system_prompt.into();

        {
            let sessions = self.cache.sessions.read().await;
            if sessions.contains_key(&session_id) {
                return Err(MemoryError::AlreadyExists {
                    session_id: session_id.clone(),
                });
            }
        }

        let context_id = Uuid::new_v4().to_string();
        let context = CurrentContext::new(session_id.clone(), context_id.clone(), system_prompt.clone());
        let history = vec![HistoryMessage::new(context.system_message().clone(), 1)];
        let session = SessionData::new(session_id.clone(), system_prompt, context_id);
        let compactions: Vec<CompactionRecord> = Vec::new();

        self.cache.sessions.write().await.insert(session_id.clone(), session.clone());
        self.cache.contexts.write().await.insert(session_id.clone(), context.clone());
        self.cache.histories.write().await.insert(session_id.clone(), history.clone());
        self.cache
            .compactions
            .write()
            .await
            .insert(session_id.clone(), compactions.clone());

        let (r1, r2, r3, r4) = tokio::join!(
            self.store.sessions.save(&session_id, &session),
            self.store.contexts.save(&session_id, &context),
            self.store.histories.save(&session_id, &history),
            self.store.compactions.save(&session_id, &compactions),
        );
        r1?;
        r2?;
        r3?;
        r4?;

        Ok(session_id)
    }

    /// Fetch a deep-clone snapshot of one Session.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionData>> {
        self.ensure_initialized().await?;
        Ok(self.cache.sessions.read().await.get(session_id).cloned())
    }

    /// List sessions matching `filter`, with pagination.
    pub async fn query_sessions(&self, filter: &SessionFilter, options: &QueryOptions) -> Result<Vec<SessionData>> {
        self.ensure_initialized().await?;
        let sessions = self.cache.sessions.read().await;
        let matched: Vec<SessionData> = sessions
            .values()
            .filter(|s| filter.status.is_none_or(|status| s.status == status))
            .cloned()
            .collect();
        Ok(options.apply(matched))
    }

    /// Fetch a deep-clone snapshot of one session's live Context.
    pub async fn get_current_context(&self, session_id: &str) -> Result<Option<CurrentContext>> {
        self.ensure_initialized().await?;
        Ok(self.cache.contexts.read().await.get(session_id).cloned())
    }

    /// Overwrite the engine's Context snapshot directly, bypassing the
    /// upsert logic in `add_message_to_context`. Used by the tool-call
    /// repairer and the Session facade's `sync()`.
    pub async fn save_current_context(&self, session_id: &str, context: CurrentContext) -> Result<()> {
        self.ensure_initialized().await?;
        self.cache
            .contexts
            .write()
            .await
            .insert(session_id.to_string(), context.clone());
        self.store.contexts.save(session_id, &context).await
    }

    /// Upsert `message` into Context (streaming-token replace if its id
    /// matches the last message, otherwise append) and, if requested, into
    /// History (update-in-place preserving `sequence`, otherwise append).
    pub async fn add_message_to_context(
        &self,
        session_id: &str,
        message: Message,
        options: AddMessageOptions,
    ) -> Result<()> {
        self.ensure_initialized().await?;

        let mut contexts = self.cache.contexts.write().await;
        let context = contexts
            .get_mut(session_id)
            .ok_or_else(|| MemoryError::NotFound {
                message: format!("no session `{session_id}`"),
            })?;

        let appended = context.upsert_last(message.clone());
        if appended {
            context.version += 1;
        }
        let context_snapshot = context.clone();
        drop(contexts);

        let mut history_changed = false;
        if options.add_to_history {
            let mut histories = self.cache.histories.write().await;
            let history = histories.entry(session_id.to_string()).or_default();
            match find_live_entry(history, &message.message_id) {
                Some(idx) => history[idx].apply_update(message),
                None => {
                    let sequence = history.len() as u64 + 1;
                    history.push(HistoryMessage::new(message, sequence));
                    history_changed = true;
                }
            }
            let history_snapshot = history.clone();
            drop(histories);
            self.store.histories.save(session_id, &history_snapshot).await?;
        }

        self.store.contexts.save(session_id, &context_snapshot).await?;

        let mut sessions = self.cache.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.touch();
            if history_changed {
                session.total_messages = self
                    .cache
                    .histories
                    .read()
                    .await
                    .get(session_id)
                    .map(|h| h.len() as u64)
                    .unwrap_or(session.total_messages);
            }
            let session_snapshot = session.clone();
            drop(sessions);
            self.store.sessions.save(session_id, &session_snapshot).await?;
        }

        Ok(())
    }

    /// Locate the last occurrence of `message_id` in Context and apply
    /// `updates`, refusing any attempt to change `message_id`. Propagates
    /// the same update to History while preserving `sequence`.
    pub async fn update_message_in_context(&self, session_id: &str, message_id: &str, mut updates: Message) -> Result<()> {
        self.ensure_initialized().await?;
        updates.message_id = message_id.to_string();

        let mut contexts = self.cache.contexts.write().await;
        let context = contexts
            .get_mut(session_id)
            .ok_or_else(|| MemoryError::NotFound {
                message: format!("no session `{session_id}`"),
            })?;
        let idx = context.last_index_of(message_id).ok_or_else(|| MemoryError::NotFound {
            message: format!("no message `{message_id}` in context for session `{session_id}`"),
        })?;
        context.messages[idx] = updates.clone();
        let context_snapshot = context.clone();
        drop(contexts);
        self.store.contexts.save(session_id, &context_snapshot).await?;

        let mut histories = self.cache.histories.write().await;
        if let Some(history) = histories.get_mut(session_id)
            && let Some(idx) = find_live_entry(history, message_id)
        {
            history[idx].apply_update(updates);
            let history_snapshot = history.clone();
            drop(histories);
            self.store.histories.save(session_id, &history_snapshot).await?;
        }

        Ok(())
    }

    /// Splice `message_id` out of Context (no-op for the system role) and
    /// mark its History entry excluded. Returns whether a removal occurred.
    pub async fn remove_message_from_context(
        &self,
        session_id: &str,
        message_id: &str,
        reason: impl Into<String>,
    ) -> Result<bool> {
        self.ensure_initialized().await?;
        let reason = reason.into();

        let mut contexts = self.cache.contexts.write().await;
        let Some(context) = contexts.get_mut(session_id) else {
            return Ok(false);
        };
        let Some(idx) = context.messages.iter().rposition(|m| m.message_id == message_id) else {
            return Ok(false);
        };
        if context.messages[idx].role == Role::System {
            return Ok(false);
        }
        context.messages.remove(idx);
        context.version += 1;
        let context_snapshot = context.clone();
        drop(contexts);
        self.store.contexts.save(session_id, &context_snapshot).await?;

        let mut histories = self.cache.histories.write().await;
        if let Some(history) = histories.get_mut(session_id)
            && let Some(idx) = find_live_entry(history, message_id)
        {
            history[idx].excluded_from_context = true;
            history[idx].excluded_reason = Some(reason);
            let history_snapshot = history.clone();
            drop(histories);
            self.store.histories.save(session_id, &history_snapshot).await?;
        }

        self.touch_session(session_id).await?;
        Ok(true)
    }

    /// Reset Context to only the system message. History is unchanged.
    pub async fn clear_context(&self, session_id: &str) -> Result<()> {
        self.ensure_initialized().await?;
        let mut contexts = self.cache.contexts.write().await;
        let context = contexts
            .get_mut(session_id)
            .ok_or_else(|| MemoryError::NotFound {
                message: format!("no session `{session_id}`"),
            })?;
        context.clear_to_system();
        context.version += 1;
        let snapshot = context.clone();
        drop(contexts);
        self.store.contexts.save(session_id, &snapshot).await
    }

    /// Partition Context's non-system messages into an archive prefix and
    /// a kept suffix, stamp `archived_by` on the archived History entries,
    /// upsert the summary into History, rebuild Context as
    /// `[system, summary, ...kept]`, and append a CompactionRecord.
    pub async fn compact_context(&self, session_id: &str, options: CompactContextOptions) -> Result<CompactionRecord> {
        self.ensure_initialized().await?;

        let mut contexts = self.cache.contexts.write().await;
        let context = contexts
            .get_mut(session_id)
            .ok_or_else(|| MemoryError::NotFound {
                message: format!("no session `{session_id}`"),
            })?;

        let non_system = context.non_system_messages().to_vec();
        let keep_last_n = options.keep_last_n as usize;
        let split = non_system.len().saturating_sub(keep_last_n);
        let archived: Vec<Message> = non_system[..split].to_vec();
        let kept: Vec<Message> = non_system[split..].to_vec();
        let archived_ids: Vec<String> = archived.iter().map(|m| m.message_id.clone()).collect();

        let record_id = Uuid::new_v4().to_string();
        let summary = options.summary;
        let summary_message_id = summary.message_id.clone();

        let system_message = context.system_message().clone();
        context.messages = std::iter::once(system_message)
            .chain(std::iter::once(summary.clone()))
            .chain(kept.into_iter())
            .collect();
        context.version += 1;
        context.last_compaction_id = Some(record_id.clone());
        let context_snapshot = context.clone();
        drop(contexts);
        self.store.contexts.save(session_id, &context_snapshot).await?;

        let mut histories = self.cache.histories.write().await;
        let history = histories.entry(session_id.to_string()).or_default();
        let archived_set: std::collections::HashSet<&String> = archived_ids.iter().collect();
        for entry in history.iter_mut() {
            if archived_set.contains(&entry.message.message_id) {
                entry.archived_by = Some(record_id.clone());
            }
        }
        match find_live_entry(history, &summary_message_id) {
            Some(idx) => {
                history[idx].apply_update(summary);
                history[idx].is_summary = true;
            }
            None => {
                let sequence = history.len() as u64 + 1;
                let mut entry = HistoryMessage::new(summary, sequence);
                entry.is_summary = true;
                history.push(entry);
            }
        }
        let history_snapshot = history.clone();
        drop(histories);
        self.store.histories.save(session_id, &history_snapshot).await?;

        let record = CompactionRecord {
            record_id,
            session_id: session_id.to_string(),
            compacted_at: Utc::now(),
            message_count_before: non_system.len() as u64,
            message_count_after: context_snapshot.non_system_messages().len() as u64,
            archived_message_ids: archived_ids,
            summary_message_id,
            reason: options.reason,
            token_count_before: options.token_count_before,
            token_count_after: options.token_count_after,
        };

        let mut compactions = self.cache.compactions.write().await;
        let list = compactions.entry(session_id.to_string()).or_default();
        list.push(record.clone());
        let list_snapshot = list.clone();
        drop(compactions);
        self.store.compactions.save(session_id, &list_snapshot).await?;

        let mut sessions = self.cache.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.touch();
            session.compaction_count = list_snapshot.len() as u64;
            let snapshot = session.clone();
            drop(sessions);
            self.store.sessions.save(session_id, &snapshot).await?;
        }

        Ok(record)
    }

    /// Filter, sort, and paginate a session's History.
    pub async fn get_full_history(
        &self,
        session_id: &str,
        filter: &HistoryFilter,
        options: &HistoryQueryOptions,
    ) -> Result<Vec<HistoryMessage>> {
        self.ensure_initialized().await?;
        let histories = self.cache.histories.read().await;
        let Some(history) = histories.get(session_id) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<HistoryMessage> = history
            .iter()
            .filter(|h| {
                filter
                    .message_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&h.message.message_id))
            })
            .filter(|h| {
                filter
                    .sequence_range
                    .is_none_or(|(min, max)| h.sequence >= min && h.sequence <= max)
            })
            .filter(|h| filter.include_summary.is_none_or(|want| h.is_summary == want))
            .filter(|h| {
                filter
                    .archived_by
                    .as_ref()
                    .is_none_or(|id| h.archived_by.as_deref() == Some(id.as_str()))
            })
            .cloned()
            .collect();

        matched.sort_by_key(|h| h.sequence);
        if !options.ascending {
            matched.reverse();
        }
        let paginated = QueryOptions {
            offset: options.offset,
            limit: options.limit,
        }
        .apply(matched);
        Ok(paginated)
    }

    /// Deep-clone snapshot of a session's CompactionRecord list.
    pub async fn get_compaction_records(&self, session_id: &str) -> Result<Vec<CompactionRecord>> {
        self.ensure_initialized().await?;
        Ok(self.cache.compactions.read().await.get(session_id).cloned().unwrap_or_default())
    }

    async fn touch_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.cache.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.touch();
            let snapshot = session.clone();
            drop(sessions);
            self.store.sessions.save(session_id, &snapshot).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_context.test.rs"]
mod tests;
