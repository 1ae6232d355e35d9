//! Intent classification for incoming messages.
//!
//! The provider is asked to answer with exactly one label word, then the raw
//! answer is normalized by substring containment against an ordered keyword
//! table. Matching the answer loosely (instead of demanding strict enum
//! output) absorbs the provider's tendency to add filler words while staying
//! deterministic and cheap to test.

use crate::completion::{CompletionError, CompletionGateway};

use super::types::Intent;

/// Sampling for classification: near-deterministic, tiny answer.
const CLASSIFY_TEMPERATURE: f32 = 0.1;
const CLASSIFY_MAX_TOKENS: u32 = 20;

/// Keyword table checked in order; the first containment match wins.
/// Precedence matters: a message normalized to "change the schedule" must
/// land on `edit`, not `schedule`.
const KEYWORD_TABLE: &[(&[&str], Intent)] = &[
    (&["log"], Intent::Log),
    (&["edit", "update", "change"], Intent::Edit),
    (&["schedule", "follow"], Intent::Schedule),
    (&["insight", "analyz", "opportun"], Intent::Insights),
    (&["validat", "verify", "check"], Intent::Validate),
];

/// Classify a user message into one of the five intents.
///
/// A gateway failure propagates to the caller — the orchestrator records it
/// and skips straight to the formatter's error branch. No retry.
pub async fn classify(
    gateway: &dyn CompletionGateway,
    message: &str,
    has_existing_record: bool,
) -> Result<Intent, CompletionError> {
    let prompt = classification_prompt(message, has_existing_record);
    let answer = gateway
        .complete(&prompt, CLASSIFY_TEMPERATURE, CLASSIFY_MAX_TOKENS)
        .await?;
    let intent = normalize(&answer, has_existing_record);
    tracing::info!(intent = %intent, raw = %answer.trim(), "classified intent");
    Ok(intent)
}

/// Normalize a raw classifier answer into an intent.
///
/// Falls back to `edit` when prior data exists (the user is most likely
/// refining it) and `log` otherwise.
pub fn normalize(answer: &str, has_existing_record: bool) -> Intent {
    let lower = answer.trim().to_lowercase();

    for (keywords, intent) in KEYWORD_TABLE {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *intent;
        }
    }

    if has_existing_record {
        Intent::Edit
    } else {
        Intent::Log
    }
}

fn classification_prompt(message: &str, has_existing_record: bool) -> String {
    let existing = if has_existing_record { "Yes" } else { "No" };
    format!(
        r#"You are an intent classifier for a medical sales CRM system.

User message: "{message}"

Existing data present: {existing}

Classify the user's intent into ONE of these categories:

1. "log" - User wants to LOG a new interaction
   - Examples: "I met with Dr. Smith", "Today's meeting was positive", "Just had a call with..."
   - Use when: Creating NEW interaction from scratch

2. "edit" - User wants to EDIT/CORRECT existing data
   - Examples: "Actually the name was...", "Change sentiment to...", "Sorry, I meant..."
   - Use when: Correcting or updating previously entered information
   - IMPORTANT: Only use if existing data is present

3. "schedule" - User wants to SCHEDULE a follow-up
   - Examples: "Schedule follow-up next week", "Book a meeting with...", "Plan next visit..."
   - Use when: Explicitly scheduling future meetings

4. "insights" - User wants ANALYSIS/INSIGHTS
   - Examples: "What are the opportunities?", "Analyze this interaction", "Give me insights..."
   - Use when: Requesting AI analysis of interaction

5. "validate" - User wants to VALIDATE HCP information
   - Examples: "Is Dr. Smith's name correct?", "Verify this doctor", "Check HCP details..."
   - Use when: Validating or checking HCP information

Return ONLY the intent name, nothing else: log, edit, schedule, insights, or validate
"#
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
