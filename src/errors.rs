//! Error types for the settlement core.
//!
//! Every error that can leave the core is one of these variants; the API
//! layer maps them onto HTTP statuses and stable error codes. Store
//! internals are carried in `Store` for logging and are never echoed to
//! callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad amount, target, or game parameters. Rejected before any
    /// store access; nothing was mutated.
    #[error("Invalid bet: {0}")]
    Validation(String),

    /// Balance check failed inside the settlement transaction. No bet
    /// record was written.
    #[error("Insufficient balance: have {balance}, bet requires {requested}")]
    InsufficientBalance { balance: u64, requested: u64 },

    /// No account row exists for the principal.
    #[error("Unknown principal: {0}")]
    UnknownPrincipal(String),

    /// The requested bet record does not exist.
    #[error("Bet not found: {0}")]
    BetNotFound(String),

    /// Transaction lock conflict that survived the bounded retry loop.
    #[error("Settlement conflict after retries: {0}")]
    Conflict(String),

    /// A persisted record failed an internal consistency check
    /// (e.g. undecodable bet record). Surfaced, never silently fixed.
    #[error("Integrity failure: {0}")]
    Integrity(String),

    /// Store-level failure (open, read, write, commit).
    #[error("Store error: {0}")]
    Store(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Lock conflicts are the only retryable failure; everything else
    /// aborts the settlement immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }
}

impl From<rocksdb::Error> for CoreError {
    fn from(e: rocksdb::Error) -> Self {
        use rocksdb::ErrorKind;
        match e.kind() {
            ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => {
                CoreError::Conflict(e.to_string())
            }
            _ => CoreError::Store(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Integrity(format!("Record encoding failed: {}", e))
    }
}
