//! HTTP boundary — axum router over the pipeline and the store.
//!
//! `POST /api/chat` runs the conversational pipeline; `/api/interactions` is
//! plain CRUD over stored records. The SQLite handle is synchronous, so all
//! routes serialize database access behind one async mutex.

pub mod types;

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::Mutex;

use crate::agent::types::Interaction;
use crate::agent::{InteractionPatch, Orchestrator};
use crate::store::{CrmDatabase, StoreError, StoredInteraction};

use types::{ChatRequest, ChatResponse, ListParams};

// ─── State and router ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub db: Arc<Mutex<CrmDatabase>>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, db: CrmDatabase) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            db: Arc::new(Mutex::new(db)),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/interactions", post(create_interaction).get(list_interactions))
        .route(
            "/api/interactions/{id}",
            get(get_interaction)
                .patch(patch_interaction)
                .delete(delete_interaction),
        )
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// HTTP-facing error. Everything a route can fail with collapses to a status
/// code and a JSON `{"error": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(m) | ApiError::Unprocessable(m) | ApiError::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.message(), "request failed");
        } else {
            tracing::warn!(status = %status, error = %self.message(), "request rejected");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => ApiError::NotFound(format!("interaction {id} not found")),
            StoreError::MissingHcpName => ApiError::Unprocessable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ─── Routes ─────────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Run one chat message through the pipeline.
///
/// The merged record is returned to the caller but not persisted; the client
/// decides when a draft becomes a saved interaction.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::Unprocessable("message must not be empty".into()));
    }

    let current = match req.interaction_id {
        Some(id) => {
            let db = state.db.lock().await;
            let stored = db
                .get(id)?
                .ok_or_else(|| ApiError::NotFound(format!("interaction {id} not found")))?;
            Some(stored.interaction)
        }
        None => None,
    };

    let reply = state.orchestrator.process(&req.message, current).await;
    if !reply.ok {
        return Err(ApiError::Internal(reply.summary));
    }

    Ok(Json(ChatResponse {
        form_data: reply.record,
        chat_response: reply.summary,
        intent: reply.intent,
        interaction_id: req.interaction_id,
    }))
}

async fn create_interaction(
    State(state): State<AppState>,
    Json(record): Json<Interaction>,
) -> Result<(StatusCode, Json<StoredInteraction>), ApiError> {
    let db = state.db.lock().await;
    let id = db.create(&record)?;
    let stored = db
        .get(id)?
        .ok_or_else(|| ApiError::Internal("created record vanished".into()))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn get_interaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StoredInteraction>, ApiError> {
    let db = state.db.lock().await;
    let stored = db
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("interaction {id} not found")))?;
    Ok(Json(stored))
}

async fn patch_interaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<InteractionPatch>,
) -> Result<Json<StoredInteraction>, ApiError> {
    let db = state.db.lock().await;
    let stored = db.apply_patch(id, &patch)?;
    Ok(Json(stored))
}

async fn list_interactions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<StoredInteraction>>, ApiError> {
    let db = state.db.lock().await;
    let interactions = db.list(params.skip, params.limit.min(500))?;
    Ok(Json(interactions))
}

async fn delete_interaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let db = state.db.lock().await;
    db.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let err: ApiError = StoreError::NotFound { id: 3 }.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = StoreError::MissingHcpName.into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn api_error_statuses() {
        assert_eq!(
            ApiError::Unprocessable("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
