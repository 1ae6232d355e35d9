//! Edit handler — correct an existing record via conversation.
//!
//! Merge policy: **field-level overlay**. The prompt instructs the provider to
//! emit only the fields the user wants changed, because the merge is a shallow
//! overlay: any field the provider emits — even one that is actually
//! unchanged — overwrites the prior value. That tradeoff (simplicity over
//! robustness) is part of the contract; do not add diffing here.

use serde_json::Value;

use crate::agent::errors::AgentError;
use crate::agent::types::{Interaction, InteractionPatch};
use crate::completion::{extract_structured, CompletionGateway, Extraction};

/// Apply the user's correction to the current record.
///
/// A sentinel or empty extraction is a no-op: the current record comes back
/// unchanged.
pub async fn run(
    gateway: &dyn CompletionGateway,
    current: &Interaction,
    message: &str,
) -> Result<Interaction, AgentError> {
    let prompt = extraction_prompt(current, message)?;
    let extraction = extract_structured(gateway, &prompt, 0.1).await?;

    let patch = match extraction {
        Extraction::Fields(map) => {
            serde_json::from_value::<InteractionPatch>(Value::Object(map)).unwrap_or_default()
        }
        Extraction::Unparsed { .. } => InteractionPatch::default(),
    };

    let mut merged = current.clone();
    if patch.is_empty() {
        tracing::debug!("edit extracted no changes, keeping record as-is");
        return Ok(merged);
    }

    patch.apply_to(&mut merged);
    Ok(merged)
}

fn extraction_prompt(current: &Interaction, message: &str) -> Result<String, AgentError> {
    let current_json =
        serde_json::to_string_pretty(current).map_err(|e| AgentError::Extraction {
            reason: format!("failed to render current record: {e}"),
        })?;

    Ok(format!(
        r#"You are an expert medical sales assistant. The user wants to correct/update an existing HCP interaction record.

Current interaction data:
{current_json}

User's correction message: "{message}"

Identify ONLY the fields that the user wants to change and extract their new values.

Return ONLY valid JSON (no markdown, no explanation) with ONLY the fields that changed:

Example: If user says "sentiment was negative", return: {{"sentiment": "Negative"}}
Example: If user says "name was Dr. John and I shared samples", return: {{"hcp_name": "Dr. John", "materials_shared": ["samples"]}}

Available fields you can change:
- hcp_name (string)
- date (YYYY-MM-DD format)
- sentiment ("Positive", "Negative", or "Neutral")
- materials_shared (array of strings)
- discussion_summary (string)
- products_discussed (array of strings)
- follow_up_date (YYYY-MM-DD format or null)

Return ONLY the changed fields as JSON. If nothing changed, return {{}}.
"#
    ))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::test_support::MockGateway;
    use crate::agent::types::Sentiment;

    fn current() -> Interaction {
        Interaction {
            hcp_name: Some("Dr. A".into()),
            sentiment: Sentiment::Positive,
            materials_shared: vec!["x".into()],
            ..Interaction::default()
        }
    }

    #[tokio::test]
    async fn preserves_untouched_fields() {
        let gateway = MockGateway::replying(r#"{"sentiment": "Negative"}"#);
        let merged = run(&gateway, &current(), "actually sentiment was negative")
            .await
            .unwrap();
        assert_eq!(merged.sentiment, Sentiment::Negative);
        assert_eq!(merged.hcp_name.as_deref(), Some("Dr. A"));
        assert_eq!(merged.materials_shared, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn multiple_fields_overlay() {
        let gateway = MockGateway::replying(
            r#"{"hcp_name": "Dr. John", "materials_shared": ["samples"]}"#,
        );
        let merged = run(&gateway, &current(), "name was Dr. John, I shared samples")
            .await
            .unwrap();
        assert_eq!(merged.hcp_name.as_deref(), Some("Dr. John"));
        assert_eq!(merged.materials_shared, vec!["samples".to_string()]);
        assert_eq!(merged.sentiment, Sentiment::Positive);
    }

    #[tokio::test]
    async fn empty_extraction_is_noop() {
        let gateway = MockGateway::replying("{}");
        let merged = run(&gateway, &current(), "never mind").await.unwrap();
        assert_eq!(merged, current());
    }

    #[tokio::test]
    async fn sentinel_is_noop() {
        let gateway = MockGateway::replying("Sorry, I can't tell what changed.");
        let merged = run(&gateway, &current(), "???").await.unwrap();
        assert_eq!(merged, current());
    }

    #[tokio::test]
    async fn unrequested_field_is_accepted_uncritically() {
        // The provider hallucinates a summary the user never mentioned.
        // The shallow overlay takes it at face value — preserved behavior.
        let gateway = MockGateway::replying(
            r#"{"sentiment": "Neutral", "discussion_summary": "Discussed pricing"}"#,
        );
        let merged = run(&gateway, &current(), "sentiment was neutral")
            .await
            .unwrap();
        assert_eq!(
            merged.discussion_summary.as_deref(),
            Some("Discussed pricing")
        );
    }

    #[tokio::test]
    async fn prompt_embeds_current_record() {
        let gateway = MockGateway::replying("{}");
        run(&gateway, &current(), "fix it").await.unwrap();
        let prompt = gateway.last_prompt().unwrap();
        assert!(prompt.contains("Dr. A"));
        assert!(prompt.contains("fix it"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let gateway = MockGateway::failing("down");
        assert!(run(&gateway, &current(), "change it").await.is_err());
    }
}
