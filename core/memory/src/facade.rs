//! Session facade: a single-session working copy over the engine, with a
//! serialized persist queue so rapid streaming updates cannot interleave.

use std::sync::Arc;

use memengine_error::MemoryError;
use memengine_error::Result;
use memengine_message::Message;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::aggregates::CompactionRecord;
use crate::aggregates::CompactionReason;
use crate::aggregates::CurrentContext;
use crate::compaction_engine::CompactionConfig;
use crate::compaction_engine::SummaryProvider;
use crate::compaction_engine::maybe_compact;
use crate::engine::MemoryEngine;
use crate::services::AddMessageOptions;

/// How a [`Session`] obtains its `session_id` on first `initialize()`.
pub enum SessionInit {
    /// Create a new session, optionally with a caller-chosen id.
    Fresh { session_id: Option<String>, system_prompt: String },
    /// Resume an existing session's Context.
    Resume { session_id: String },
}

/// Optional compaction wiring. Without this, `compact_before_llm_call`
/// only runs protocol normalization and never compacts.
pub struct FacadeCompaction {
    pub config: CompactionConfig,
    pub provider: Arc<dyn SummaryProvider>,
}

enum PersistOp {
    Write { message: Message, options: AddMessageOptions },
    Flush(oneshot::Sender<()>),
}

struct SessionState {
    session_id: String,
    context: CurrentContext,
    persist_tx: mpsc::Sender<PersistOp>,
}

/// Wraps a single `session_id` with a local in-memory Context copy the
/// agent loop reads and writes against directly, backed by the engine
/// through a serialized persist queue.
pub struct Session {
    engine: Arc<MemoryEngine>,
    pending_init: Mutex<Option<SessionInit>>,
    state: RwLock<Option<SessionState>>,
    initialized: RwLock<bool>,
    init_lock: Mutex<()>,
    compaction: Option<FacadeCompaction>,
}

impl Session {
    /// Build a facade over `engine`. No I/O happens until `initialize()`.
    pub fn new(engine: Arc<MemoryEngine>, init: SessionInit) -> Self {
        Session {
            engine,
            pending_init: Mutex::new(Some(init)),
            state: RwLock::new(None),
            initialized: RwLock::new(false),
            init_lock: Mutex::new(()),
            compaction: None,
        }
    }

    /// Wire a compaction engine and summary provider into this facade.
    pub fn with_compaction(mut self, config: CompactionConfig, provider: Arc<dyn SummaryProvider>) -> Self {
        self.compaction = Some(FacadeCompaction { config, provider });
        self
    }

    async fn ensure_initialized(&self) -> Result<()> {
        if *self.initialized.read().await {
            Ok(())
        } else {
            Err(MemoryError::NotInitialized)
        }
    }

    /// Idempotent, concurrency-safe: creates or resumes the session,
    /// starts the persist-queue worker, and runs context-level protocol
    /// normalization once the local Context copy is loaded.
    #[allow(clippy::expect_used)]
    pub async fn initialize(&self) -> Result<()> {
        if *self.initialized.read().await {
            return Ok(());
        }
        let _guard = self.init_lock.lock().await;
        if *self.initialized.read().await {
            return Ok(());
        }

        self.engine.initialize().await?;

        let init = self
            .pending_init
            .lock()
            .await
            .take()
            .ok_or(MemoryError::InvariantViolation {
                message: "session facade initialize() payload already consumed".to_string(),
            })?;

        let (session_id, context) = match init {
            SessionInit::Fresh { session_id, system_prompt } => {
                let session_id = self.engine.create_session(session_id, system_prompt).await?;
                let context = self
                    .engine
                    .get_current_context(&session_id)
                    .await?
                    .expect("create_session always leaves a Context behind");
                (session_id, context)
            }
            SessionInit::Resume { session_id } => {
                let context = self.engine.get_current_context(&session_id).await?.ok_or_else(|| MemoryError::NotFound {
                    message: format!("no session `{session_id}`"),
                })?;
                (session_id, context)
            }
        };

        let (persist_tx, mut persist_rx) = mpsc::channel::<PersistOp>(256);
        let engine = Arc::clone(&self.engine);
        let worker_session_id = session_id.clone();
        tokio::spawn(async move {
            while let Some(op) = persist_rx.recv().await {
                match op {
                    PersistOp::Write { message, options } => {
                        if let Err(err) = engine.add_message_to_context(&worker_session_id, message, options).await {
                            tracing::warn!(
                                session_id = %worker_session_id,
                                error = %err,
                                "session facade persist queue write failed, continuing"
                            );
                        }
                    }
                    PersistOp::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });

        *self.state.write().await = Some(SessionState {
            session_id,
            context,
            persist_tx,
        });
        *self.initialized.write().await = true;
        drop(_guard);

        self.run_protocol_normalization().await?;
        Ok(())
    }

    /// The resolved session id. Only valid after `initialize()`.
    #[allow(clippy::expect_used)]
    pub async fn session_id(&self) -> Result<String> {
        self.ensure_initialized().await?;
        Ok(self.state.read().await.as_ref().expect("initialized").session_id.clone())
    }

    /// Snapshot of the facade's local Context messages.
    #[allow(clippy::expect_used)]
    pub async fn messages(&self) -> Result<Vec<Message>> {
        self.ensure_initialized().await?;
        Ok(self.state.read().await.as_ref().expect("initialized").context.messages.clone())
    }

    /// Upsert `message` into the local Context copy (streaming-token
    /// replace if it matches the last message, append otherwise) and
    /// enqueue the same write against the engine.
    #[allow(clippy::expect_used)]
    pub async fn add_message(&self, message: Message, options: AddMessageOptions) -> Result<()> {
        self.ensure_initialized().await?;
        let persist_tx = {
            let mut guard = self.state.write().await;
            let state = guard.as_mut().expect("initialized");
            let appended = state.context.upsert_last(message.clone());
            if appended {
                state.context.version += 1;
            }
            state.persist_tx.clone()
        };
        persist_tx
            .send(PersistOp::Write { message, options })
            .await
            .map_err(|_| MemoryError::BackendUnavailable {
                message: "session facade persist queue is closed".to_string(),
            })
    }

    /// Await every write currently queued, then overwrite the engine's
    /// Context snapshot with the facade's local copy.
    #[allow(clippy::expect_used)]
    pub async fn sync(&self) -> Result<()> {
        self.ensure_initialized().await?;
        let (persist_tx, session_id, context_snapshot) = {
            let guard = self.state.read().await;
            let state = guard.as_ref().expect("initialized");
            (state.persist_tx.clone(), state.session_id.clone(), state.context.clone())
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        if persist_tx.send(PersistOp::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }

        self.engine.save_current_context(&session_id, context_snapshot).await
    }

    /// Run context-level protocol normalization, then — if a compaction
    /// engine is wired in — evaluate and, if triggered, run compaction.
    /// Skips compaction entirely when none is configured.
    pub async fn compact_before_llm_call(&self) -> Result<Option<CompactionRecord>> {
        self.ensure_initialized().await?;
        self.run_protocol_normalization().await?;

        let Some(compaction) = &self.compaction else {
            return Ok(None);
        };
        let session_id = self.session_id().await?;
        let record = maybe_compact(
            &self.engine,
            &session_id,
            &compaction.config,
            compaction.provider.as_ref(),
            CompactionReason::TokenLimit,
        )
        .await?;

        if record.is_some() {
            self.reload_local_context(&session_id).await?;
        }
        Ok(record)
    }

    #[allow(clippy::expect_used)]
    async fn run_protocol_normalization(&self) -> Result<()> {
        let session_id = { self.state.read().await.as_ref().expect("initialized").session_id.clone() };
        let changed = self.engine.normalize_context_protocol(&session_id).await?;
        if changed {
            self.reload_local_context(&session_id).await?;
        }
        Ok(())
    }

    #[allow(clippy::expect_used)]
    async fn reload_local_context(&self, session_id: &str) -> Result<()> {
        let refreshed = self.engine.get_current_context(session_id).await?.ok_or_else(|| MemoryError::NotFound {
            message: format!("no session `{session_id}`"),
        })?;
        self.state.write().await.as_mut().expect("initialized").context = refreshed;
        Ok(())
    }
}

#[cfg(test)]
#[path = "facade.test.rs"]
mod tests;
