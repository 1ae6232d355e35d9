//! Log handler — extract a brand-new interaction from a free-text description.
//!
//! Merge policy: **replace**. The prior record is never read; two calls with
//! the same message produce the same record no matter what was stored before.

use serde::Deserialize;
use serde_json::Value;

use crate::agent::errors::AgentError;
use crate::agent::types::{de, today, Interaction, Sentiment};
use crate::completion::{extract_structured, CompletionGateway, Extraction};

/// Extraction payload for a new interaction. Every field is optional so the
/// handler's defaulting stays in one place.
#[derive(Debug, Default, Deserialize)]
struct LogExtraction {
    #[serde(default)]
    hcp_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_date")]
    date: Option<chrono::NaiveDate>,
    #[serde(default)]
    sentiment: Option<Sentiment>,
    #[serde(default, deserialize_with = "de::string_list")]
    materials_shared: Vec<String>,
    #[serde(default)]
    discussion_summary: Option<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    products_discussed: Vec<String>,
}

/// Extract a new interaction record from the user's message.
///
/// An unparseable or empty extraction yields an all-defaults record (date
/// today, sentiment Neutral, empty lists) rather than a failure.
pub async fn run(
    gateway: &dyn CompletionGateway,
    message: &str,
) -> Result<Interaction, AgentError> {
    let prompt = extraction_prompt(message);
    let extraction = extract_structured(gateway, &prompt, 0.1).await?;

    let extracted = match extraction {
        Extraction::Fields(map) => {
            serde_json::from_value::<LogExtraction>(Value::Object(map)).unwrap_or_default()
        }
        Extraction::Unparsed { .. } => LogExtraction::default(),
    };

    Ok(Interaction {
        hcp_name: extracted.hcp_name.filter(|n| !n.trim().is_empty()),
        date: extracted.date.unwrap_or_else(today),
        sentiment: extracted.sentiment.unwrap_or_default(),
        materials_shared: extracted.materials_shared,
        discussion_summary: extracted
            .discussion_summary
            .filter(|s| !s.trim().is_empty()),
        products_discussed: extracted.products_discussed,
        follow_up_date: None,
        key_insights: None,
    })
}

fn extraction_prompt(message: &str) -> String {
    let today = today().format("%Y-%m-%d");
    format!(
        r#"You are an expert medical sales assistant. Extract structured information from the user's message about their HCP interaction.

User message: "{message}"

Today's date is {today}.

Extract the following information and return ONLY valid JSON (no markdown, no code blocks, no explanation):

1. hcp_name: The doctor/healthcare professional's name (e.g., "Dr. Smith", "Dr. John Patel")
2. date: The date of meeting in YYYY-MM-DD format. If not specified, use today's date: {today}
3. sentiment: The overall sentiment (must be one of: "Positive", "Negative", or "Neutral")
4. materials_shared: Array of materials/documents shared (e.g., ["brochures", "samples", "clinical data"])
5. discussion_summary: Brief summary of what was discussed
6. products_discussed: Array of product names mentioned (e.g., ["product X", "diabetes medication"])

Return ONLY this JSON format, nothing else:
{{
    "hcp_name": "extracted name or null",
    "date": "YYYY-MM-DD",
    "sentiment": "Positive|Negative|Neutral",
    "materials_shared": ["item1", "item2"],
    "discussion_summary": "brief summary",
    "products_discussed": ["product1", "product2"]
}}

IMPORTANT:
- If a field cannot be extracted, use null for strings or [] for arrays
- Always return valid JSON
- Do not include any text before or after the JSON
"#
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::test_support::MockGateway;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn extracts_full_record() {
        let gateway = MockGateway::replying(
            r#"{"hcp_name": "Dr. Smith", "date": "2026-08-20", "sentiment": "Positive",
                "materials_shared": ["brochures"], "discussion_summary": "Product X efficacy",
                "products_discussed": ["product X"]}"#,
        );
        let record = run(&gateway, "met Dr. Smith, went well").await.unwrap();
        assert_eq!(record.hcp_name.as_deref(), Some("Dr. Smith"));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 8, 20).unwrap());
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert_eq!(record.materials_shared, vec!["brochures".to_string()]);
        assert_eq!(record.products_discussed, vec!["product X".to_string()]);
        assert!(record.follow_up_date.is_none());
        assert!(record.key_insights.is_none());
    }

    #[tokio::test]
    async fn sentinel_yields_default_record() {
        let gateway = MockGateway::replying("I couldn't find any structured data, sorry.");
        let record = run(&gateway, "something vague").await.unwrap();
        assert!(record.hcp_name.is_none());
        assert_eq!(record.date, today());
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert!(record.materials_shared.is_empty());
    }

    #[tokio::test]
    async fn malformed_date_defaults_to_today() {
        let gateway =
            MockGateway::replying(r#"{"hcp_name": "Dr. A", "date": "sometime last week"}"#);
        let record = run(&gateway, "met Dr. A").await.unwrap();
        assert_eq!(record.date, today());
    }

    #[tokio::test]
    async fn empty_name_becomes_none() {
        let gateway = MockGateway::replying(r#"{"hcp_name": "  ", "sentiment": "negative"}"#);
        let record = run(&gateway, "bad meeting").await.unwrap();
        assert!(record.hcp_name.is_none());
        assert_eq!(record.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn fenced_response_parses() {
        let gateway = MockGateway::replying(
            "Here is the extraction:\n```json\n{\"hcp_name\": \"Dr. Patel\"}\n```",
        );
        let record = run(&gateway, "saw Dr. Patel").await.unwrap();
        assert_eq!(record.hcp_name.as_deref(), Some("Dr. Patel"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let gateway = MockGateway::failing("auth failed");
        assert!(run(&gateway, "met Dr. Smith").await.is_err());
    }
}
