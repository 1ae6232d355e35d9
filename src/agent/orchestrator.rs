//! The pipeline orchestrator.
//!
//! One strictly linear pass per request: classify → dispatch to exactly one
//! handler → format. The only branch is on the classified intent; a classifier
//! failure skips the handlers entirely. No stage is revisited and nothing is
//! retried — a caller who wants a retry re-submits the whole request.
//!
//! The gateway is injected at construction time so tests (and alternative
//! providers) plug in without global state.

use std::sync::Arc;

use crate::completion::CompletionGateway;

use super::formatter::format_reply;
use super::intent;
use super::tools;
use super::types::{AgentReply, Intent, Interaction, PipelineContext, ToolOutcome};

/// Sequences one request through the pipeline.
///
/// Holds no per-request state; every `process` call builds its own
/// [`PipelineContext`], so independent requests can run concurrently on
/// separate instances or share one behind an `Arc`.
pub struct Orchestrator {
    gateway: Arc<dyn CompletionGateway>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }

    /// Run one user message through the pipeline.
    ///
    /// `current` is the stored record the message refers to, if any. On any
    /// error the reply's `ok` is false and its record echoes `current`
    /// unchanged (an empty record when there was none).
    pub async fn process(&self, message: &str, current: Option<Interaction>) -> AgentReply {
        let mut ctx = PipelineContext {
            message: message.to_string(),
            current,
            ..PipelineContext::default()
        };
        let has_existing = ctx.current.as_ref().is_some_and(Interaction::has_subject);

        tracing::info!(
            message_len = ctx.message.len(),
            has_existing,
            "processing chat message"
        );

        // classify
        match intent::classify(self.gateway.as_ref(), &ctx.message, has_existing).await {
            Ok(intent) => ctx.intent = Some(intent),
            Err(e) => {
                tracing::error!(error = %e, "intent classification failed");
                ctx.intent = Some(Intent::Error);
                ctx.error = Some(e.to_string());
            }
        }

        // dispatch
        if ctx.error.is_none() {
            self.run_handler(&mut ctx).await;
        }

        // format
        let intent = ctx.intent.unwrap_or(Intent::Error);
        let fallback = ctx.current.clone().unwrap_or_default();
        let record_for_summary = ctx.merged.as_ref().unwrap_or(&fallback);
        ctx.summary = format_reply(
            intent,
            ctx.error.as_deref(),
            record_for_summary,
            ctx.outcome.as_ref(),
        );

        let ok = ctx.error.is_none();
        let record = if ok {
            ctx.merged.unwrap_or(fallback)
        } else {
            fallback
        };

        tracing::info!(intent = %intent, ok, "pipeline complete");

        AgentReply {
            record,
            summary: ctx.summary,
            intent,
            ok,
        }
    }

    /// Dispatch to the handler selected by the classified intent.
    ///
    /// Handler errors of any kind are absorbed here: the context records the
    /// error text and keeps the prior record, and nothing propagates further.
    async fn run_handler(&self, ctx: &mut PipelineContext) {
        let intent = match ctx.intent {
            Some(intent) if intent != Intent::Error => intent,
            _ => return,
        };
        let gateway = self.gateway.as_ref();

        tracing::info!(intent = %intent, "running handler");

        let result = match intent {
            Intent::Log => tools::log::run(gateway, &ctx.message)
                .await
                .map(|record| (Some(record), ToolOutcome::Logged)),
            Intent::Edit => {
                let current = ctx.current.clone().unwrap_or_default();
                tools::edit::run(gateway, &current, &ctx.message)
                    .await
                    .map(|record| (Some(record), ToolOutcome::Edited))
            }
            Intent::Schedule => tools::schedule::run(gateway, ctx.current.as_ref(), &ctx.message)
                .await
                .map(|(record, plan)| (Some(record), ToolOutcome::Scheduled(plan))),
            Intent::Insights => tools::insights::run(gateway, ctx.current.as_ref())
                .await
                .map(|(record, report)| (Some(record), ToolOutcome::Analyzed(report))),
            Intent::Validate => tools::validate::run(gateway, ctx.current.as_ref(), &ctx.message)
                .await
                .map(|(record, validation)| (record, ToolOutcome::Validated(validation))),
            Intent::Error => unreachable!("error intent never reaches a handler"),
        };

        match result {
            Ok((merged, outcome)) => {
                ctx.outcome = Some(outcome);
                match merged {
                    Some(record) => ctx.merged = Some(record),
                    // The validate handler's structured failure
                    None => ctx.error = Some("Validation failed".to_string()),
                }
            }
            Err(e) => {
                tracing::error!(intent = %intent, error = %e, "handler failed");
                ctx.error = Some(e.to_string());
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
