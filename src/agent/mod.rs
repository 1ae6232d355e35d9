//! Agent — the conversational CRM pipeline.
//!
//! Submodules:
//! - `types`: Interaction record, intents, tool outputs, pipeline context
//! - `intent`: LLM-backed intent classification with keyword dispatch
//! - `tools`: One handler per intent (log / edit / schedule / insights / validate)
//! - `formatter`: Renders the pipeline result as user-facing prose
//! - `orchestrator`: Linear classify → handle → format pipeline
//! - `errors`: Agent-level error types

pub mod errors;
pub mod formatter;
pub mod intent;
pub mod orchestrator;
pub mod tools;
pub mod types;

// Re-exports for convenience
pub use errors::AgentError;
pub use orchestrator::Orchestrator;
pub use types::{
    AgentReply, FollowUpPlan, HcpValidation, InsightReport, Intent, Interaction,
    InteractionPatch, Priority, Sentiment,
};
