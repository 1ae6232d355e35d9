//! User-facing response formatting.
//!
//! Pure presentation: no state, no gateway calls. A recorded error takes
//! absolute precedence — the apology string is returned and every other input
//! is ignored.

use super::types::{Intent, Interaction, ToolOutcome};

/// Render the pipeline result as a prose summary.
pub fn format_reply(
    intent: Intent,
    error: Option<&str>,
    record: &Interaction,
    outcome: Option<&ToolOutcome>,
) -> String {
    if let Some(error) = error {
        return format!("Sorry, I encountered an error: {error}");
    }

    match (intent, outcome) {
        (Intent::Log, _) => format_log(record),
        (Intent::Edit, _) => format_edit(record),
        (Intent::Schedule, Some(ToolOutcome::Scheduled(plan))) => {
            let mut text = format!("Follow-up scheduled for {}!\n", plan.follow_up_date);
            if !plan.talking_points.is_empty() {
                text.push_str("\nTalking points:\n");
                for point in &plan.talking_points {
                    text.push_str(&format!("  - {point}\n"));
                }
            }
            text.push_str(&format!("\nPreparation: {}", plan.preparation_notes));
            text
        }
        (Intent::Insights, Some(ToolOutcome::Analyzed(report))) => {
            let mut text = format!(
                "Analysis complete! Priority: {}\n",
                report.priority_level
            );
            if !report.opportunities.is_empty() {
                text.push_str("\nOpportunities:\n");
                for opportunity in &report.opportunities {
                    text.push_str(&format!("  - {opportunity}\n"));
                }
            }
            if !report.recommended_actions.is_empty() {
                text.push_str("\nRecommended actions:\n");
                for action in &report.recommended_actions {
                    text.push_str(&format!("  - {action}\n"));
                }
            }
            text.trim_end().to_string()
        }
        (Intent::Validate, Some(ToolOutcome::Validated(validation))) => {
            let name = validation.formatted_name.as_deref().unwrap_or("Unknown");
            let mut text = format!(
                "HCP information validated!\n\nName: {name}\nLikely specialty: {}",
                validation.likely_specialty
            );
            if validation.requires_verification {
                text.push_str("\n\nManual verification recommended.");
            }
            text
        }
        _ => "Request processed successfully!".to_string(),
    }
}

fn format_log(record: &Interaction) -> String {
    let hcp_name = record.hcp_name.as_deref().unwrap_or("the HCP");
    let mut text = format!(
        "I've logged your interaction with {hcp_name}.\n\nDetails captured:\n- Date: {}\n- Sentiment: {}\n",
        record.date, record.sentiment
    );
    if !record.materials_shared.is_empty() {
        text.push_str(&format!(
            "- Materials: {}\n",
            record.materials_shared.join(", ")
        ));
    }
    if !record.products_discussed.is_empty() {
        text.push_str(&format!(
            "- Products: {}\n",
            record.products_discussed.join(", ")
        ));
    }
    text.push_str("\nYour interaction has been recorded successfully!");
    text
}

fn format_edit(record: &Interaction) -> String {
    format!(
        "I've updated the interaction with your changes.\n\nCurrent data:\n- HCP: {}\n- Sentiment: {}\n\nThe form has been updated.",
        record.hcp_name.as_deref().unwrap_or("N/A"),
        record.sentiment
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
