use restock_core::LocationKey;
use thiserror::Error;

/// Errors raised while reading or writing the restock state document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrap IO errors on the state file.
    #[error("failed to access restock state: {0}")]
    Io(#[from] std::io::Error),
    /// Wrap serde issues on the whole document.
    #[error("failed to parse restock state: {0}")]
    Json(#[from] serde_json::Error),
}

/// One state-document entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed record `{key}`: {reason}")]
pub struct MalformedRecord {
    /// Raw key as found in the document.
    pub key: String,
    /// Decode failure description.
    pub reason: String,
}

/// Failures surfaced by registry and restock operations.
///
/// None of these are fatal; callers report them and carry on.
#[derive(Debug, Error)]
pub enum RestockError {
    /// The operation needs an existing record and there is none.
    #[error("container at {0} is not registered for restocking")]
    NotRegistered(LocationKey),
    /// The live object is gone or no longer holds a slot array.
    #[error("container at {0} is not accessible")]
    ContainerUnavailable(LocationKey),
    /// Restock intervals are whole, non-negative seconds.
    #[error("invalid restock interval {0}: must be a non-negative number of seconds")]
    InvalidInterval(i64),
    /// The state document could not be written or read.
    #[error(transparent)]
    Persistence(#[from] StoreError),
    /// A single entry was skipped during load.
    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecord),
}
