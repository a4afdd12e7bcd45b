use thiserror::Error;

/// Failure taxonomy of the transfer-tool contract.
///
/// Every operation fails with one of these variants; callers can match on
/// them instead of parsing message strings. Nothing here is fatal to the
/// process.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A job id that was never returned by `submit`.
    #[error("unknown transfer job: {0}")]
    UnknownJob(String),

    /// A request missing mandatory fields was handed to `submit`.
    #[error("malformed transfer request '{request_id}': {reason}")]
    MalformedRequest { request_id: String, reason: String },

    /// Source/destination location class the adapter cannot move data
    /// between.
    #[error("unsupported transfer class: {0}")]
    UnsupportedTransferClass(String),

    /// Descriptor store read/write failure. Not retried internally.
    #[error("descriptor store failure: {0}")]
    Store(#[from] tokio_rusqlite::Error),

    #[error("descriptor serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
