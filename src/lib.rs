pub mod agent;
pub mod completion;
pub mod server;
pub mod store;

/// Return the platform-standard data directory for the CRM.
///
/// - macOS: `~/Library/Application Support/hcp-crm/`
/// - Windows: `{FOLDERID_RoamingAppData}\hcp-crm\`
/// - Linux: `$XDG_DATA_HOME/hcp-crm/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.hcp-crm/` only if none of the above can be resolved.
pub fn data_dir() -> std::path::PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("hcp-crm");
    }
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".hcp-crm")
}

/// Initialize the tracing subscriber — structured logs to stderr.
///
/// `RUST_LOG` overrides the default filter (`hcp_crm=info,warn`).
pub fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hcp_crm=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .init();
}
