//! Agent-level error types.

use thiserror::Error;

use crate::completion::CompletionError;

/// Errors that can occur inside the pipeline. None of these escape the
/// orchestrator — they collapse into the context's error string and the
/// formatter's apology branch.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The completion provider call failed.
    #[error("{0}")]
    Completion(#[from] CompletionError),

    /// A caller-input invariant was violated before any gateway call.
    #[error("{reason}")]
    Validation { reason: String },

    /// A handler produced a structurally unusable result.
    #[error("extraction error: {reason}")]
    Extraction { reason: String },
}
