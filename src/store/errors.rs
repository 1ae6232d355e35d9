//! Persistence error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("interaction {id} not found")]
    NotFound { id: i64 },

    #[error("hcp_name is required to save an interaction")]
    MissingHcpName,
}
