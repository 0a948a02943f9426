//! Coarse status classification shared by every error kind in the engine.
//!
//! Each [`MemoryError`](crate::MemoryError) variant maps to exactly one
//! [`StatusCode`] so that callers can discriminate on the taxonomy in the
//! engine's external contract without matching on the error enum itself.

use strum::AsRefStr;

/// Status classification for an engine error.
///
/// Mirrors the error kinds enumerated in the engine's error-handling design:
/// each kind is either something the caller can recover from locally
/// (`AlreadyExists`, `NotFound`) or something that indicates the engine or
/// its storage backend is unusable until fixed (`BackendUnavailable`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StatusCode {
    /// Any public operation was called before `initialize()` completed.
    NotInitialized,
    /// Creating a session id that already exists.
    AlreadyExists,
    /// Session, context, message, or record is missing for a mutation.
    NotFound,
    /// A cross-aggregate invariant was violated.
    InvariantViolation,
    /// The selected adapter type has no implementation yet.
    BackendUnsupported,
    /// The adapter could not acquire its driver, directory, or database.
    BackendUnavailable,
    /// A single file failed to parse and had no recoverable backup.
    CorruptData,
    /// A single-file write failed.
    WriteFailure,
}

impl StatusCode {
    /// Whether a caller may reasonably retry the operation that produced
    /// this status without changing its inputs.
    pub fn retryable(self) -> bool {
        matches!(self, StatusCode::WriteFailure | StatusCode::BackendUnavailable)
    }
}
