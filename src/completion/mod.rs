//! Completion Gateway — wraps the external text-completion provider.
//!
//! This module owns all communication with the provider:
//! - `client`: non-streaming chat completions with a primary→backup fallback
//! - `config`: endpoint, key, and model selection from the environment
//! - `extract`: the defensive structured-output fallback chain
//! - `gateway`: the trait seam the pipeline depends on (test doubles plug in here)
//!
//! The client speaks the OpenAI Chat Completions API, so the provider is
//! interchangeable via config — switching models is a config change, not a
//! code change.

pub mod client;
pub mod config;
pub mod errors;
pub mod extract;
pub mod gateway;
pub mod types;

// Re-exports for convenience
pub use client::CompletionClient;
pub use config::CompletionConfig;
pub use errors::CompletionError;
pub use extract::{extract_structured, parse_structured, Extraction};
pub use gateway::CompletionGateway;
