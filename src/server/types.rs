//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::agent::types::{Intent, Interaction};

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// When set, the stored record the message refers to.
    #[serde(default)]
    pub interaction_id: Option<i64>,
}

/// Reply of `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The merged record after the pipeline ran.
    pub form_data: Interaction,
    /// The user-facing prose summary.
    pub chat_response: String,
    pub intent: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<i64>,
}

/// Query parameters for `GET /api/interactions`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

// ─── Tests ───────────────────────────────────────────────────────────────────
