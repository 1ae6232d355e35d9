//! Persistence — SQLite-backed storage for interaction records.

pub mod database;
pub mod errors;

pub use database::{CrmDatabase, StoredInteraction};
pub use errors::StoreError;
