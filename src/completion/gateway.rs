//! The gateway seam between the pipeline and the completion provider.
//!
//! The classifier and every task handler depend on this trait rather than on
//! the HTTP client directly, so tests can substitute a scripted double with a
//! call counter and no network.

use async_trait::async_trait;

use super::errors::CompletionError;

/// Prompt in, best-effort text out.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Send one prompt to the provider and return its raw text answer.
    ///
    /// Fails on transport, auth, or non-success responses. Never retried by
    /// callers — recovery, if any, happens inside the implementation.
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CompletionError>;
}
