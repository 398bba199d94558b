//! Draft storage error types

/// Errors from a draft repository.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// The key-value backend failed.
    #[error("Draft storage error: {0}")]
    Backend(#[from] async_sqlite::Error),

    /// A stored blob is not valid draft JSON.
    #[error("Draft serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
