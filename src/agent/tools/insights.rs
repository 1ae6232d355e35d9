//! Insights handler — analyze an interaction for opportunities and next steps.
//!
//! Merge policy: **additive**. The current record is copied; only
//! `key_insights` is overwritten with a formatted composite of priority,
//! opportunities, concerns, and recommended actions.

use serde::Deserialize;
use serde_json::Value;

use crate::agent::errors::AgentError;
use crate::agent::types::{de, InsightReport, Interaction, Priority};
use crate::completion::{extract_structured, CompletionGateway, Extraction};

#[derive(Debug, Default, Deserialize)]
struct InsightExtraction {
    #[serde(default, deserialize_with = "de::string_list")]
    opportunities: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    concerns: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    recommended_actions: Vec<String>,
    #[serde(default)]
    priority_level: Option<String>,
}

/// Analyze the current interaction.
///
/// Defaults: empty opportunity/concern lists are allowed, but
/// `recommended_actions` always carries at least a generic follow-up; a
/// missing priority is derived from the record's sentiment.
pub async fn run(
    gateway: &dyn CompletionGateway,
    current: Option<&Interaction>,
) -> Result<(Interaction, InsightReport), AgentError> {
    let record = current.cloned().unwrap_or_default();

    let prompt = analysis_prompt(&record);
    let extraction = extract_structured(gateway, &prompt, 0.3).await?;

    let extracted = match extraction {
        Extraction::Fields(map) => {
            serde_json::from_value::<InsightExtraction>(Value::Object(map)).unwrap_or_default()
        }
        Extraction::Unparsed { .. } => InsightExtraction::default(),
    };

    let report = InsightReport {
        opportunities: extracted.opportunities,
        concerns: extracted.concerns,
        recommended_actions: if extracted.recommended_actions.is_empty() {
            vec!["Follow up with HCP".to_string()]
        } else {
            extracted.recommended_actions
        },
        priority_level: extracted
            .priority_level
            .as_deref()
            .and_then(Priority::from_loose)
            .unwrap_or_else(|| Priority::from_sentiment(record.sentiment)),
    };

    let mut merged = record;
    merged.key_insights = Some(compose_insights(&report));

    Ok((merged, report))
}

/// Render the report as the `key_insights` text block.
fn compose_insights(report: &InsightReport) -> String {
    let mut text = format!("Priority: {}\n\n", report.priority_level);
    if !report.opportunities.is_empty() {
        text.push_str(&format!(
            "Opportunities:\n- {}\n\n",
            report.opportunities.join("\n- ")
        ));
    }
    if !report.concerns.is_empty() {
        text.push_str(&format!("Concerns:\n- {}\n\n", report.concerns.join("\n- ")));
    }
    if !report.recommended_actions.is_empty() {
        text.push_str(&format!(
            "Recommended Actions:\n- {}",
            report.recommended_actions.join("\n- ")
        ));
    }
    text.trim_end().to_string()
}

fn analysis_prompt(record: &Interaction) -> String {
    let hcp_name = record.hcp_name.as_deref().unwrap_or("Unknown HCP");
    let discussion = record
        .discussion_summary
        .as_deref()
        .unwrap_or("No discussion summary");
    let products = if record.products_discussed.is_empty() {
        "None".to_string()
    } else {
        record.products_discussed.join(", ")
    };
    let materials = if record.materials_shared.is_empty() {
        "None".to_string()
    } else {
        record.materials_shared.join(", ")
    };

    format!(
        r#"You are a medical sales analyst. Analyze this HCP interaction and extract strategic insights.

Interaction Details:
- HCP: {hcp_name}
- Sentiment: {sentiment}
- Discussion: {discussion}
- Products Discussed: {products}
- Materials Shared: {materials}

Analyze this interaction and provide:

1. opportunities: 2-3 sales opportunities or positive signals identified
2. concerns: Any concerns, objections, or negative signals (or empty array if none)
3. recommended_actions: 2-3 specific next actions to move the opportunity forward
4. priority_level: Overall priority ("High", "Medium", or "Low") based on opportunity potential

Consider:
- Sentiment indicates interest level
- Materials shared show engagement depth
- Discussion topics reveal needs

Return ONLY valid JSON (no markdown):
{{
    "opportunities": ["opportunity1", "opportunity2"],
    "concerns": ["concern1"],
    "recommended_actions": ["action1", "action2"],
    "priority_level": "High|Medium|Low"
}}
"#,
        sentiment = record.sentiment,
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
