//! CRM server binary: load config, open the database, serve the HTTP API.

use std::sync::Arc;

use anyhow::Context;

use hcp_crm::agent::Orchestrator;
use hcp_crm::completion::{CompletionClient, CompletionConfig};
use hcp_crm::server::{self, AppState};
use hcp_crm::store::CrmDatabase;
use hcp_crm::{data_dir, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = CompletionConfig::from_env().context("loading completion config")?;
    tracing::info!(
        base_url = %config.base_url,
        model = %config.model_primary,
        "completion provider configured"
    );

    let db_path = resolve_db_path()?;
    let db = CrmDatabase::open(&db_path)
        .with_context(|| format!("opening database at {db_path}"))?;
    tracing::info!(db_path = %db_path, "database opened");

    let client = CompletionClient::new(config)?;
    let orchestrator = Orchestrator::new(Arc::new(client));
    let state = AppState::new(orchestrator, db);

    let bind = std::env::var("HCP_CRM_BIND").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(addr = %bind, "listening");

    axum::serve(listener, server::router().with_state(state))
        .await
        .context("server error")?;
    Ok(())
}

/// Resolve the SQLite path: `HCP_CRM_DB` wins, otherwise the platform data
/// directory (created if needed).
fn resolve_db_path() -> anyhow::Result<String> {
    if let Ok(path) = std::env::var("HCP_CRM_DB") {
        return Ok(path);
    }
    let dir = data_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir.join("crm.db").to_string_lossy().into_owned())
}
