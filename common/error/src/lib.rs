//! Shared error taxonomy for the conversation memory engine.
//!
//! Every error surfaced by the engine's public contract is a typed value
//! drawn from [`MemoryError`], never an ad-hoc string or a panic. Adapters
//! and services build variants with [`snafu`] context selectors instead of
//! constructing the enum directly.

mod status_code;

pub use status_code::StatusCode;

use snafu::Snafu;

/// The error taxonomy described by the engine's error-handling design.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MemoryError {
    /// A public operation was called before `initialize()` completed.
    #[snafu(display("memory engine not initialized"))]
    NotInitialized,

    /// Creating a session id that already exists.
    #[snafu(display("session `{session_id}` already exists"))]
    AlreadyExists { session_id: String },

    /// A session, context, message, or record is missing for a mutation.
    #[snafu(display("not found: {message}"))]
    NotFound { message: String },

    /// A cross-aggregate invariant was violated.
    #[snafu(display("invariant violation: {message}"))]
    InvariantViolation { message: String },

    /// The selected adapter type has no implementation yet.
    #[snafu(display("backend `{backend}` is not implemented yet: {message}"))]
    BackendUnsupported { backend: String, message: String },

    /// The adapter could not acquire its driver, directory, or database.
    #[snafu(display("backend unavailable: {message}"))]
    BackendUnavailable { message: String },

    /// A single file failed to parse and had no recoverable backup.
    #[snafu(display("corrupt data at {path}: {message}"))]
    CorruptData { path: String, message: String },

    /// A single-file write failed.
    #[snafu(display("write failed for {path}: {source}"))]
    WriteFailure {
        path: String,
        source: std::io::Error,
    },
}

impl MemoryError {
    /// The coarse status classification for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            MemoryError::NotInitialized => StatusCode::NotInitialized,
            MemoryError::AlreadyExists { .. } => StatusCode::AlreadyExists,
            MemoryError::NotFound { .. } => StatusCode::NotFound,
            MemoryError::InvariantViolation { .. } => StatusCode::InvariantViolation,
            MemoryError::BackendUnsupported { .. } => StatusCode::BackendUnsupported,
            MemoryError::BackendUnavailable { .. } => StatusCode::BackendUnavailable,
            MemoryError::CorruptData { .. } => StatusCode::CorruptData,
            MemoryError::WriteFailure { .. } => StatusCode::WriteFailure,
        }
    }
}

/// Convenience alias used throughout the engine.
pub type Result<T, E = MemoryError> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
