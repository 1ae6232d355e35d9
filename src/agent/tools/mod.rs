//! The five task handlers.
//!
//! Every handler follows the same shape: build a task-specific prompt, run it
//! through [`extract_structured`](crate::completion::extract_structured),
//! treat the parse sentinel as "nothing extracted" rather than a failure,
//! apply its own defaulting rules, and merge with the prior record under its
//! own policy:
//!
//! - `log`: replace — builds a brand-new record, never reads the prior one
//! - `edit`: field-level overlay — only extracted fields overwrite
//! - `schedule`: additive — sets `follow_up_date` and `key_insights` only
//! - `insights`: additive — overwrites `key_insights` only
//! - `validate`: overlay — replaces `hcp_name`, overwrites `key_insights`
//!
//! Provider failures propagate as `Err`; the orchestrator converts them into
//! the context error and preserves the prior record.

pub mod edit;
pub mod insights;
pub mod log;
pub mod schedule;
pub mod validate;

#[cfg(test)]
pub mod test_support;
