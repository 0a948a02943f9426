//! Durable, concurrency-safe conversation memory engine.
//!
//! [`MemoryEngine`] is the source of truth for a session's Context,
//! History, Compaction, Task, and SubTaskRun state, backed by a
//! [`store::StoreBundle`]. [`facade::Session`] wraps one session's worth
//! of engine calls behind a local working copy and a serialized persist
//! queue, for an agent loop that streams messages faster than it wants
//! to fsync them.

mod aggregates;
mod atomic_io;
mod bootstrap;
mod cache;
mod compaction_engine;
mod engine;
mod facade;
mod query;
mod services;
mod store;
mod tool_repair;

pub use aggregates::CompactionReason;
pub use aggregates::CompactionRecord;
pub use aggregates::CurrentContext;
pub use aggregates::HistoryMessage;
pub use aggregates::SessionData;
pub use aggregates::SessionStatus;
pub use aggregates::RunMode;
pub use aggregates::RunStatus;
pub use aggregates::SubTaskRunData;
pub use aggregates::TaskData;
pub use aggregates::TaskStatus;
pub use compaction_engine::CompactionConfig;
pub use compaction_engine::SummaryProvider;
pub use compaction_engine::TokenBreakdown;
pub use compaction_engine::compute_token_breakdown;
pub use compaction_engine::maybe_compact;
pub use engine::MemoryEngine;
pub use facade::FacadeCompaction;
pub use facade::Session;
pub use facade::SessionInit;
pub use query::HistoryFilter;
pub use query::HistoryQueryOptions;
pub use query::QueryOptions;
pub use query::SessionFilter;
pub use query::SubTaskRunFilter;
pub use query::TaskFilter;
pub use services::AddMessageOptions;
pub use services::CompactContextOptions;
pub use store::Closer;
pub use store::CompactionStorePort;
pub use store::ContextStorePort;
pub use store::DEFAULT_COLLECTION_PREFIX;
pub use store::DEFAULT_DATABASE;
pub use store::DocumentAdapter;
pub use store::DocumentAdapterConfig;
pub use store::DocumentAdapterOptions;
pub use store::DocumentDriver;
pub use store::FileAdapter;
pub use store::HistoryStorePort;
pub use store::SessionStorePort;
pub use store::StoreBundle;
pub use store::SubTaskRunStorePort;
pub use store::TaskStorePort;
pub use store::Tier;
pub use store::TieredAdapter;
pub use store::TierRouting;
pub use store::UnsupportedAdapter;
pub use tool_repair::repair_streaming;
