//! Error types for the scheduler, the session engine, the stores and deck export.

use crate::database::DeckId;
use crate::engine::SessionHandle;
use thiserror::Error;

/// Errors raised by a review store or deck provider.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Deck not found: {0}")]
    DeckNotFound(DeckId),

    /// The backing store could not be reached or refused the write
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by study sessions and the session engine.
///
/// Any of these aborts the current step; the session keeps the state it had
/// before the call, so the same action can be retried.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Invalid quality rating {0}, expected a value in 0..=5")]
    InvalidQuality(u8),

    #[error("Failed to persist review record: {0}")]
    PersistenceFailure(#[from] StoreError),

    #[error("Unknown session: {0}")]
    UnknownSession(SessionHandle),

    /// Another action, usually a rating waiting on the store, holds the session.
    /// Reads such as `stats` are rejected as well.
    #[error("Session is busy with another action")]
    SessionBusy,
}

/// Errors from JSON deck import/export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
