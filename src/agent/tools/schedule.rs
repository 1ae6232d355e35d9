//! Schedule handler — plan a follow-up meeting with generated talking points.
//!
//! Merge policy: **additive**. The current record is copied; only
//! `follow_up_date` and `key_insights` (synthesized from talking points and
//! preparation notes) are set.

use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use crate::agent::errors::AgentError;
use crate::agent::types::{de, today, FollowUpPlan, Interaction};
use crate::completion::{extract_structured, CompletionGateway, Extraction};

/// Subject used when no record names one.
const FALLBACK_SUBJECT: &str = "HCP";

#[derive(Debug, Default, Deserialize)]
struct ScheduleExtraction {
    #[serde(default, deserialize_with = "de::opt_date")]
    follow_up_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::string_list")]
    talking_points: Vec<String>,
    #[serde(default)]
    preparation_notes: Option<String>,
}

/// Plan a follow-up from the user's request.
///
/// Defaults: one week from today when no date is extractable; generic talking
/// points and preparation notes when the provider offers none.
pub async fn run(
    gateway: &dyn CompletionGateway,
    current: Option<&Interaction>,
    message: &str,
) -> Result<(Interaction, FollowUpPlan), AgentError> {
    let hcp_name = current
        .and_then(|c| c.hcp_name.as_deref())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(FALLBACK_SUBJECT)
        .to_string();

    let prompt = extraction_prompt(&hcp_name, message);
    let extraction = extract_structured(gateway, &prompt, 0.2).await?;

    let extracted = match extraction {
        Extraction::Fields(map) => {
            serde_json::from_value::<ScheduleExtraction>(Value::Object(map)).unwrap_or_default()
        }
        Extraction::Unparsed { .. } => ScheduleExtraction::default(),
    };

    let plan = FollowUpPlan {
        hcp_name,
        follow_up_date: extracted.follow_up_date.unwrap_or_else(next_week),
        talking_points: if extracted.talking_points.is_empty() {
            vec![
                "Follow-up discussion".to_string(),
                "Address questions".to_string(),
                "Next steps".to_string(),
            ]
        } else {
            extracted.talking_points
        },
        preparation_notes: extracted
            .preparation_notes
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Review previous interaction notes".to_string()),
    };

    let mut merged = current.cloned().unwrap_or_default();
    merged.follow_up_date = Some(plan.follow_up_date);
    merged.key_insights = Some(format!(
        "Follow-up planned:\n- {}\n\nPreparation: {}",
        plan.talking_points.join("\n- "),
        plan.preparation_notes
    ));

    Ok((merged, plan))
}

fn next_week() -> NaiveDate {
    today() + Duration::days(7)
}

fn extraction_prompt(hcp_name: &str, message: &str) -> String {
    let today = today();
    let next_week = (today + Duration::days(7)).format("%Y-%m-%d");
    let next_month = (today + Duration::days(30)).format("%Y-%m-%d");
    let today = today.format("%Y-%m-%d");

    format!(
        r#"You are a medical sales coach helping schedule follow-up meetings.

HCP Name: {hcp_name}
User request: "{message}"
Today's date: {today}

Extract follow-up scheduling information:

1. follow_up_date: Infer the date from the user's message in YYYY-MM-DD format
   - "next week" = approximately {next_week}
   - "next month" = approximately {next_month}
   - "tomorrow" = one day from today
   - If no specific time mentioned, default to one week from today

2. talking_points: Generate 3-4 key topics to discuss in the follow-up
   - Based on the user's message
   - Be specific and actionable

3. preparation_notes: What should be prepared before the meeting
   - Materials needed
   - Data to gather
   - Questions to prepare

Return ONLY valid JSON (no markdown):
{{
    "follow_up_date": "YYYY-MM-DD",
    "talking_points": ["point1", "point2", "point3"],
    "preparation_notes": "what to prepare"
}}
"#
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
