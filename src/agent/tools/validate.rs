//! Validate handler — check and normalize an HCP name.
//!
//! Merge policy: **overlay**. The current record is copied; `hcp_name` is
//! replaced with the provider-formatted name and `key_insights` is
//! overwritten with specialty and validation notes.
//!
//! An empty name short-circuits to a structured failure before any gateway
//! call is made.

use serde::Deserialize;
use serde_json::Value;

use crate::agent::errors::AgentError;
use crate::agent::types::{HcpValidation, Interaction};
use crate::completion::{extract_structured, CompletionGateway, Extraction};

#[derive(Debug, Default, Deserialize)]
struct ValidateExtraction {
    #[serde(default)]
    is_valid: Option<bool>,
    #[serde(default)]
    formatted_name: Option<String>,
    #[serde(default)]
    likely_specialty: Option<String>,
    #[serde(default)]
    validation_notes: Option<String>,
    #[serde(default)]
    requires_verification: Option<bool>,
}

/// Validate the HCP name on the record (or, when the record has none, the raw
/// message itself).
///
/// Returns the merged record only when the name was judged valid; `None`
/// signals a structured validation failure the orchestrator turns into the
/// pipeline error.
pub async fn run(
    gateway: &dyn CompletionGateway,
    current: Option<&Interaction>,
    message: &str,
) -> Result<(Option<Interaction>, HcpValidation), AgentError> {
    let hcp_name = current
        .and_then(|c| c.hcp_name.as_deref())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(message)
        .to_string();

    if hcp_name.trim().is_empty() {
        tracing::warn!("validate called with an empty HCP name");
        return Ok((
            None,
            HcpValidation {
                is_valid: false,
                formatted_name: None,
                likely_specialty: "Unknown".to_string(),
                validation_notes: "HCP name is empty".to_string(),
                requires_verification: true,
            },
        ));
    }

    let prompt = validation_prompt(&hcp_name);
    let extraction = extract_structured(gateway, &prompt, 0.1).await?;

    let extracted = match extraction {
        Extraction::Fields(map) => {
            serde_json::from_value::<ValidateExtraction>(Value::Object(map)).unwrap_or_default()
        }
        Extraction::Unparsed { .. } => ValidateExtraction::default(),
    };

    let validation = HcpValidation {
        is_valid: extracted.is_valid.unwrap_or(true),
        formatted_name: Some(
            extracted
                .formatted_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| title_case(&hcp_name)),
        ),
        likely_specialty: extracted
            .likely_specialty
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "General Practice".to_string()),
        validation_notes: extracted
            .validation_notes
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Name validated".to_string()),
        requires_verification: extracted.requires_verification.unwrap_or(false),
    };

    if !validation.is_valid {
        return Ok((None, validation));
    }

    let mut merged = current.cloned().unwrap_or_default();
    merged.hcp_name = validation.formatted_name.clone();
    merged.key_insights = Some(format!(
        "HCP Validation:\n- Specialty: {}\n- Notes: {}",
        validation.likely_specialty, validation.validation_notes
    ));

    Ok((Some(merged), validation))
}

/// Capitalize the first letter of each whitespace-separated word and lower
/// the rest ("dr smith" → "Dr Smith").
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn validation_prompt(hcp_name: &str) -> String {
    format!(
        r#"You are a healthcare database expert. Validate and enrich this HCP name.

HCP Name: "{hcp_name}"

Analyze and return:

1. is_valid: Is this a valid HCP name format? (true/false)
   - Valid examples: "Dr. Smith", "Dr. John Patel", "Prof. Williams"
   - Invalid examples: "doctor", "xyz", "123"

2. formatted_name: Properly formatted name with correct capitalization and title
   - Add "Dr." prefix if missing but clearly a doctor's name
   - Proper case for names (e.g., "smith" -> "Smith")
   - Keep existing titles (Dr., Prof., etc.)

3. likely_specialty: Best guess of medical specialty based on common naming patterns or context
   - Options: "Cardiology", "Neurology", "Oncology", "Pediatrics", "General Practice", "Surgery", "Unknown"
   - If no context, use "General Practice"

4. validation_notes: Any issues found or corrections made
   - Examples: "Name format corrected", "Added Dr. prefix", "No issues found"

5. requires_verification: Should this be manually verified? (true/false)
   - True if name is very short, unusual, or incomplete

Return ONLY valid JSON (no markdown):
{{
    "is_valid": true,
    "formatted_name": "Dr. Name",
    "likely_specialty": "Cardiology",
    "validation_notes": "notes here",
    "requires_verification": false
}}
"#
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::test_support::MockGateway;

    #[tokio::test]
    async fn empty_name_short_circuits_without_gateway_call() {
        let gateway = MockGateway::replying("should never be sent");
        let (merged, validation) = run(&gateway, None, "").await.unwrap();
        assert!(merged.is_none());
        assert!(!validation.is_valid);
        assert!(validation.requires_verification);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn whitespace_name_short_circuits() {
        let gateway = MockGateway::replying("unused");
        let (merged, validation) = run(&gateway, None, "   ").await.unwrap();
        assert!(merged.is_none());
        assert!(!validation.is_valid);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn valid_name_overlays_formatted_name_and_insights() {
        let gateway = MockGateway::replying(
            r#"{"is_valid": true, "formatted_name": "Dr. Smith",
                "likely_specialty": "Cardiology",
                "validation_notes": "Added Dr. prefix",
                "requires_verification": false}"#,
        );
        let current = Interaction {
            hcp_name: Some("dr smith".into()),
            discussion_summary: Some("stents".into()),
            ..Interaction::default()
        };
        let (merged, validation) = run(&gateway, Some(&current), "verify the name")
            .await
            .unwrap();
        let merged = merged.unwrap();
        assert_eq!(merged.hcp_name.as_deref(), Some("Dr. Smith"));
        assert_eq!(merged.discussion_summary.as_deref(), Some("stents"));
        let insights = merged.key_insights.unwrap();
        assert!(insights.contains("Specialty: Cardiology"));
        assert!(insights.contains("Notes: Added Dr. prefix"));
        assert!(validation.is_valid);
    }

    #[tokio::test]
    async fn invalid_verdict_returns_no_record() {
        let gateway = MockGateway::replying(
            r#"{"is_valid": false, "validation_notes": "not a name", "requires_verification": true}"#,
        );
        let (merged, validation) = run(&gateway, None, "xyz").await.unwrap();
        assert!(merged.is_none());
        assert!(!validation.is_valid);
        assert!(validation.requires_verification);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn sentinel_defaults_to_valid_with_title_cased_name() {
        let gateway = MockGateway::replying("no structured data at all");
        let (merged, validation) = run(&gateway, None, "dr smith").await.unwrap();
        assert!(validation.is_valid);
        assert_eq!(validation.formatted_name.as_deref(), Some("Dr Smith"));
        assert_eq!(validation.likely_specialty, "General Practice");
        assert!(!validation.requires_verification);
        assert!(merged.is_some());
    }

    #[tokio::test]
    async fn record_name_preferred_over_message() {
        let gateway = MockGateway::replying("{}");
        let current = Interaction {
            hcp_name: Some("Dr. Patel".into()),
            ..Interaction::default()
        };
        run(&gateway, Some(&current), "is this right?").await.unwrap();
        assert!(gateway
            .last_prompt()
            .unwrap()
            .contains("HCP Name: \"Dr. Patel\""));
    }

    #[test]
    fn title_case_examples() {
        assert_eq!(title_case("dr smith"), "Dr Smith");
        assert_eq!(title_case("DR. JOHN PATEL"), "Dr. John Patel");
        assert_eq!(title_case(""), "");
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let gateway = MockGateway::failing("offline");
        assert!(run(&gateway, None, "Dr. Smith").await.is_err());
    }
}
