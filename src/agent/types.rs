//! Shared types for the agent pipeline.
//!
//! The central entity is the [`Interaction`] record. Handlers never pass loose
//! maps between stages — extraction output is deserialized into per-intent
//! structs and the pipeline carries one structurally-typed record throughout.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Sentiment ───────────────────────────────────────────────────────────────

/// Overall sentiment of an interaction. Never absent — defaults to Neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }

    /// Lenient parse: case-insensitive substring match, anything else is
    /// Neutral. The provider writes "positive", "Positive", or the occasional
    /// "Very positive" — all of which should land on the same variant.
    pub fn from_loose(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("positive") {
            Sentiment::Positive
        } else if lower.contains("negative") {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Sentiment::from_loose(&text))
    }
}

// ─── Interaction Record ──────────────────────────────────────────────────────

/// One logged meeting with a healthcare professional.
///
/// Invariants: `sentiment` is always present (Neutral by default); the list
/// fields are never null (empty instead); `hcp_name` may be `None` only while
/// the record is in-flight — the store rejects it at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default)]
    pub hcp_name: Option<String>,
    #[serde(default = "today")]
    pub date: NaiveDate,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub materials_shared: Vec<String>,
    #[serde(default)]
    pub discussion_summary: Option<String>,
    #[serde(default)]
    pub products_discussed: Vec<String>,
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default)]
    pub key_insights: Option<String>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            hcp_name: None,
            date: today(),
            sentiment: Sentiment::Neutral,
            materials_shared: Vec::new(),
            discussion_summary: None,
            products_discussed: Vec::new(),
            follow_up_date: None,
            key_insights: None,
        }
    }
}

impl Interaction {
    /// Whether the record names its subject. This is what "existing record
    /// present" means to the classifier: a record without an HCP name is
    /// treated as empty.
    pub fn has_subject(&self) -> bool {
        self.hcp_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

/// The current local date. Extraction defaults and the record default both
/// key off this.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ─── Interaction Patch ───────────────────────────────────────────────────────

/// A field-level overlay: only the fields present are applied. Produced by the
/// edit handler's extraction and by the PATCH API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hcp_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, deserialize_with = "de::opt_string_list", skip_serializing_if = "Option::is_none")]
    pub materials_shared: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion_summary: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_list", skip_serializing_if = "Option::is_none")]
    pub products_discussed: Option<Vec<String>>,
    #[serde(default, deserialize_with = "de::opt_date", skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_insights: Option<String>,
}

impl InteractionPatch {
    /// True when no field is set; applying an empty patch is a no-op.
    pub fn is_empty(&self) -> bool {
        self.hcp_name.is_none()
            && self.date.is_none()
            && self.sentiment.is_none()
            && self.materials_shared.is_none()
            && self.discussion_summary.is_none()
            && self.products_discussed.is_none()
            && self.follow_up_date.is_none()
            && self.key_insights.is_none()
    }

    /// Shallow overlay: every present field overwrites the record's value;
    /// absent fields leave the record untouched. A field the provider emits
    /// unchanged still counts as authoritative — there is deliberately no
    /// diffing against the prior value.
    pub fn apply_to(&self, record: &mut Interaction) {
        if let Some(name) = &self.hcp_name {
            record.hcp_name = Some(name.clone());
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(sentiment) = self.sentiment {
            record.sentiment = sentiment;
        }
        if let Some(materials) = &self.materials_shared {
            record.materials_shared = materials.clone();
        }
        if let Some(summary) = &self.discussion_summary {
            record.discussion_summary = Some(summary.clone());
        }
        if let Some(products) = &self.products_discussed {
            record.products_discussed = products.clone();
        }
        if let Some(date) = self.follow_up_date {
            record.follow_up_date = Some(date);
        }
        if let Some(insights) = &self.key_insights {
            record.key_insights = Some(insights.clone());
        }
    }
}

// ─── Intent ──────────────────────────────────────────────────────────────────

/// The five classified request categories, plus the classifier-failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Log,
    Edit,
    Schedule,
    Insights,
    Validate,
    Error,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Log => "log",
            Intent::Edit => "edit",
            Intent::Schedule => "schedule",
            Intent::Insights => "insights",
            Intent::Validate => "validate",
            Intent::Error => "error",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Per-intent handler results ──────────────────────────────────────────────

/// Priority assigned by the insights handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Fallback when the provider does not commit to a priority: sentiment
    /// stands in for opportunity potential.
    pub fn from_sentiment(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Positive => Priority::High,
            Sentiment::Negative => Priority::Low,
            Sentiment::Neutral => Priority::Medium,
        }
    }

    pub fn from_loose(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("high") {
            Some(Priority::High)
        } else if lower.contains("low") {
            Some(Priority::Low)
        } else if lower.contains("medium") {
            Some(Priority::Medium)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the schedule handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUpPlan {
    pub hcp_name: String,
    pub follow_up_date: NaiveDate,
    pub talking_points: Vec<String>,
    pub preparation_notes: String,
}

/// Output of the insights handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub opportunities: Vec<String>,
    pub concerns: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub priority_level: Priority,
}

/// Output of the validate handler. A structured failure (`is_valid == false`)
/// is a first-class result, not an error — the orchestrator decides what to
/// do with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HcpValidation {
    pub is_valid: bool,
    pub formatted_name: Option<String>,
    pub likely_specialty: String,
    pub validation_notes: String,
    pub requires_verification: bool,
}

/// Tagged union of handler outputs, kept for the formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Logged,
    Edited,
    Scheduled(FollowUpPlan),
    Analyzed(InsightReport),
    Validated(HcpValidation),
}

// ─── Pipeline context and reply ──────────────────────────────────────────────

/// Ephemeral per-request state threaded through the pipeline stages. Created
/// at entry, mutated by each stage, discarded after the reply is built.
/// Never shared across requests.
#[derive(Debug, Default)]
pub struct PipelineContext {
    /// The raw user message.
    pub message: String,
    /// The stored record this request operates on, if any.
    pub current: Option<Interaction>,
    /// The in-progress merged record. `None` until a handler succeeds.
    pub merged: Option<Interaction>,
    /// The raw handler output, for the formatter.
    pub outcome: Option<ToolOutcome>,
    /// The detected intent.
    pub intent: Option<Intent>,
    /// The user-facing summary.
    pub summary: String,
    /// First error recorded by any stage; short-circuits formatting.
    pub error: Option<String>,
}

/// Result of one pipeline run.
///
/// `ok` is false iff any stage recorded an error, in which case `record`
/// echoes the caller's current record unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    pub record: Interaction,
    pub summary: String,
    pub intent: Intent,
    pub ok: bool,
}

// ─── Lenient deserializers ───────────────────────────────────────────────────

/// Deserializers tolerant of the shapes the provider actually emits: dates as
/// arbitrary strings, lists as a bare string, explicit nulls everywhere.
pub(crate) mod de {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept `"YYYY-MM-DD"`; anything else (prose, null, wrong type)
    /// becomes `None` so the handler's own defaulting kicks in.
    pub fn opt_date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
    }

    /// Accept an array of strings, a single bare string, or null.
    pub fn opt_string_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        other => Some(other.to_string()),
                    })
                    .collect(),
            ),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(vec![s]),
            _ => None,
        })
    }

    /// Like [`opt_string_list`] but collapses "missing" to an empty list.
    pub fn string_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        Ok(opt_string_list(deserializer)?.unwrap_or_default())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_loose_parse() {
        assert_eq!(Sentiment::from_loose("Positive"), Sentiment::Positive);
        assert_eq!(Sentiment::from_loose("very negative"), Sentiment::Negative);
        assert_eq!(Sentiment::from_loose("meh"), Sentiment::Neutral);
        assert_eq!(Sentiment::from_loose(""), Sentiment::Neutral);
    }

    #[test]
    fn interaction_default_invariants() {
        let record = Interaction::default();
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert!(record.materials_shared.is_empty());
        assert!(record.products_discussed.is_empty());
        assert_eq!(record.date, today());
        assert!(!record.has_subject());
    }

    #[test]
    fn has_subject_ignores_whitespace() {
        let mut record = Interaction::default();
        record.hcp_name = Some("   ".into());
        assert!(!record.has_subject());
        record.hcp_name = Some("Dr. Smith".into());
        assert!(record.has_subject());
    }

    #[test]
    fn interaction_round_trips_through_json() {
        let record = Interaction {
            hcp_name: Some("Dr. Patel".into()),
            date: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
            sentiment: Sentiment::Positive,
            materials_shared: vec!["brochures".into()],
            discussion_summary: Some("Discussed efficacy".into()),
            products_discussed: vec!["GlucoControl".into()],
            follow_up_date: None,
            key_insights: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"2026-08-26\""));
        assert!(json.contains("\"Positive\""));
        let back: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn interaction_deserializes_from_sparse_json() {
        // Only a name: everything else takes the documented defaults.
        let record: Interaction = serde_json::from_str(r#"{"hcp_name": "Dr. A"}"#).unwrap();
        assert_eq!(record.hcp_name.as_deref(), Some("Dr. A"));
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert!(record.materials_shared.is_empty());
    }

    #[test]
    fn patch_overlay_only_touches_present_fields() {
        let mut record = Interaction {
            hcp_name: Some("Dr. A".into()),
            sentiment: Sentiment::Positive,
            materials_shared: vec!["x".into()],
            ..Interaction::default()
        };
        let patch = InteractionPatch {
            sentiment: Some(Sentiment::Negative),
            ..InteractionPatch::default()
        };
        patch.apply_to(&mut record);
        assert_eq!(record.sentiment, Sentiment::Negative);
        assert_eq!(record.hcp_name.as_deref(), Some("Dr. A"));
        assert_eq!(record.materials_shared, vec!["x".to_string()]);
    }

    #[test]
    fn empty_patch_is_noop() {
        let patch = InteractionPatch::default();
        assert!(patch.is_empty());
        let mut record = Interaction {
            hcp_name: Some("Dr. A".into()),
            ..Interaction::default()
        };
        let before = record.clone();
        patch.apply_to(&mut record);
        assert_eq!(record, before);
    }

    #[test]
    fn patch_tolerates_malformed_dates_and_bare_strings() {
        let patch: InteractionPatch = serde_json::from_str(
            r#"{"date": "next tuesday", "materials_shared": "samples", "follow_up_date": null}"#,
        )
        .unwrap();
        assert!(patch.date.is_none());
        assert!(patch.follow_up_date.is_none());
        assert_eq!(patch.materials_shared, Some(vec!["samples".to_string()]));
    }

    #[test]
    fn priority_fallbacks() {
        assert_eq!(
            Priority::from_sentiment(Sentiment::Positive),
            Priority::High
        );
        assert_eq!(Priority::from_sentiment(Sentiment::Negative), Priority::Low);
        assert_eq!(
            Priority::from_sentiment(Sentiment::Neutral),
            Priority::Medium
        );
        assert_eq!(Priority::from_loose("HIGH priority"), Some(Priority::High));
        assert_eq!(Priority::from_loose("whatever"), None);
    }
}
