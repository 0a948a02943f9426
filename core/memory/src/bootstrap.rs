//! Bootstrap / repair: the single non-concurrent initialization pass.
//!
//! Loads every aggregate from the store, then repairs cross-aggregate
//! invariants without discarding data: a Session with no Context gets one
//! synthesized from History; a Session with no History gets one projected
//! from Context; a Session with no Compaction list gets an empty one.
//! Repair never re-runs after the first successful `initialize()`.

use std::collections::HashMap;

use futures::future::try_join_all;
use memengine_error::Result;
use tracing::info;
use uuid::Uuid;

use crate::aggregates::CompactionRecord;
use crate::aggregates::CurrentContext;
use crate::aggregates::HistoryMessage;
use crate::aggregates::SessionData;
use crate::cache::Cache;
use crate::store::StoreBundle;

/// Run `prepare()` + `load_all()` against every port, repair missing
/// siblings, and hydrate `cache` with the result.
pub async fn bootstrap(store: &StoreBundle, cache: &Cache) -> Result<()> {
    store.prepare_all().await?;

    let mut sessions = store.sessions.load_all().await?;
    let mut contexts = store.contexts.load_all().await?;
    let mut histories = store.histories.load_all().await?;
    let mut compactions = store.compactions.load_all().await?;
    let tasks = store.tasks.load_all().await?;
    let subtask_runs = store.subtask_runs.load_all().await?;

    let repairs = plan_repairs(&mut sessions, &mut contexts, &mut histories, &mut compactions);
    apply_repairs(store, repairs).await?;

    info!(
        sessions = sessions.len(),
        tasks = tasks.len(),
        subtask_runs = subtask_runs.len(),
        "bootstrap loaded and repaired memory engine state"
    );

    cache
        .hydrate(sessions, contexts, histories, compactions, tasks, subtask_runs)
        .await;
    Ok(())
}

/// One pending write produced by the repair pass.
enum Repair {
    Session(String, SessionData),
    Context(String, CurrentContext),
    History(String, Vec<HistoryMessage>),
    Compaction(String, Vec<CompactionRecord>),
}

fn plan_repairs(
    sessions: &mut HashMap<String, SessionData>,
    contexts: &mut HashMap<String, CurrentContext>,
    histories: &mut HashMap<String, Vec<HistoryMessage>>,
    compactions: &mut HashMap<String, Vec<CompactionRecord>>,
) -> Vec<Repair> {
    let mut repairs = Vec::new();
    let session_ids: Vec<String> = sessions.keys().cloned().collect();

    for session_id in &session_ids {
        let has_context = contexts.contains_key(session_id);
        let has_history = histories.contains_key(session_id);

        if !has_context {
            let context = synthesize_context_from_history(session_id, sessions, histories.get(session_id));
            if let Some(session) = sessions.get_mut(session_id) {
                session.current_context_id = context.context_id.clone();
            }
            contexts.insert(session_id.clone(), context.clone());
            repairs.push(Repair::Context(session_id.clone(), context));
            if let Some(session) = sessions.get(session_id) {
                repairs.push(Repair::Session(session_id.clone(), session.clone()));
            }
        } else if !has_history {
            let context = contexts.get(session_id).cloned().unwrap_or_else(|| {
                CurrentContext::new(session_id.clone(), Uuid::new_v4().to_string(), "")
            });
            let history = synthesize_history_from_context(&context);
            histories.insert(session_id.clone(), history.clone());
            repairs.push(Repair::History(session_id.clone(), history));
        }

        if !compactions.contains_key(session_id) {
            compactions.insert(session_id.clone(), Vec::new());
            repairs.push(Repair::Compaction(session_id.clone(), Vec::new()));
        }
    }

    repairs
}

fn synthesize_context_from_history(
    session_id: &str,
    sessions: &HashMap<String, SessionData>,
    history: Option<&Vec<HistoryMessage>>,
) -> CurrentContext {
    let system_prompt = sessions
        .get(session_id)
        .map(|s| s.system_prompt.clone())
        .unwrap_or_default();

    let recovered: Vec<memengine_message::Message> = history
        .map(|entries| {
            entries
                .iter()
                .filter(|h| h.archived_by.is_none() && !h.excluded_from_context)
                .map(|h| h.message.clone())
                .collect()
        })
        .unwrap_or_default();

    let context_id = sessions
        .get(session_id)
        .map(|s| s.current_context_id.clone())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut context = CurrentContext::new(session_id.to_string(), context_id, system_prompt);
    for message in recovered {
        if message.role == memengine_message::Role::System {
            continue;
        }
        context.messages.push(message);
    }
    context
}

fn synthesize_history_from_context(context: &CurrentContext) -> Vec<HistoryMessage> {
    context
        .messages
        .iter()
        .enumerate()
        .map(|(idx, message)| {
            let mut entry = HistoryMessage::new(message.clone(), (idx + 1) as u64);
            if idx == 0 {
                entry.turn = Some(0);
            }
            entry
        })
        .collect()
}

async fn apply_repairs(store: &StoreBundle, repairs: Vec<Repair>) -> Result<()> {
    let mut session_writes = Vec::new();
    let mut context_writes = Vec::new();
    let mut history_writes = Vec::new();
    let mut compaction_writes = Vec::new();

    for repair in repairs {
        match repair {
            Repair::Session(id, value) => session_writes.push(async move { store.sessions.save(&id, &value).await }),
            Repair::Context(id, value) => context_writes.push(async move { store.contexts.save(&id, &value).await }),
            Repair::History(id, value) => {
                history_writes.push(async move { store.histories.save(&id, &value).await })
            }
            Repair::Compaction(id, value) => {
                compaction_writes.push(async move { store.compactions.save(&id, &value).await })
            }
        }
    }

    try_join_all(session_writes).await?;
    try_join_all(context_writes).await?;
    try_join_all(history_writes).await?;
    try_join_all(compaction_writes).await?;
    Ok(())
}

#[cfg(test)]
#[path = "bootstrap.test.rs"]
mod tests;
