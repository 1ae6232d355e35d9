//! SQLite persistence for interaction records.
//!
//! Uses `rusqlite` in synchronous mode; the HTTP layer serializes access
//! behind an async mutex. List fields are stored as JSON text, dates as
//! ISO-8601 text.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::errors::StoreError;
use crate::agent::types::{Interaction, InteractionPatch, Sentiment};

// ─── Database ───────────────────────────────────────────────────────────────

/// A stored interaction: the record plus its row identity and timestamps.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StoredInteraction {
    pub id: i64,
    #[serde(flatten)]
    pub interaction: Interaction,
    pub created_at: String,
    pub updated_at: String,
}

/// SQLite database handle for the CRM.
pub struct CrmDatabase {
    conn: Connection,
}

impl CrmDatabase {
    /// Open (or create) the database at the given path.
    ///
    /// Pass `":memory:"` for an in-memory database (tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent reads
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self { conn };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hcp_name TEXT NOT NULL,
                date TEXT NOT NULL,
                sentiment TEXT NOT NULL DEFAULT 'Neutral',
                materials_shared TEXT NOT NULL DEFAULT '[]',
                discussion_summary TEXT,
                products_discussed TEXT NOT NULL DEFAULT '[]',
                follow_up_date TEXT,
                key_insights TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_interactions_hcp
                ON interactions(hcp_name);
            ",
        )?;
        Ok(())
    }

    /// Insert a new interaction and return its row id.
    ///
    /// A record without an HCP name is rejected; the pipeline may carry
    /// nameless records in flight but they never reach storage.
    pub fn create(&self, interaction: &Interaction) -> Result<i64, StoreError> {
        if !interaction.has_subject() {
            return Err(StoreError::MissingHcpName);
        }

        self.conn.execute(
            "INSERT INTO interactions
             (hcp_name, date, sentiment, materials_shared, discussion_summary,
              products_discussed, follow_up_date, key_insights)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                interaction.hcp_name,
                interaction.date.to_string(),
                interaction.sentiment.as_str(),
                serde_json::to_string(&interaction.materials_shared)?,
                interaction.discussion_summary,
                serde_json::to_string(&interaction.products_discussed)?,
                interaction.follow_up_date.map(|d| d.to_string()),
                interaction.key_insights,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Fetch one interaction by id.
    pub fn get(&self, id: i64) -> Result<Option<StoredInteraction>, StoreError> {
        let result = self
            .conn
            .query_row(
                "SELECT id, hcp_name, date, sentiment, materials_shared,
                        discussion_summary, products_discussed, follow_up_date,
                        key_insights, created_at, updated_at
                 FROM interactions WHERE id = ?1",
                params![id],
                |row| Ok(row_to_stored(row)),
            )
            .optional()?;
        Ok(result)
    }

    /// Replace the record stored under `id`.
    pub fn update(&self, id: i64, interaction: &Interaction) -> Result<(), StoreError> {
        if !interaction.has_subject() {
            return Err(StoreError::MissingHcpName);
        }

        let updated = self.conn.execute(
            "UPDATE interactions SET
                hcp_name = ?2, date = ?3, sentiment = ?4, materials_shared = ?5,
                discussion_summary = ?6, products_discussed = ?7,
                follow_up_date = ?8, key_insights = ?9,
                updated_at = datetime('now')
             WHERE id = ?1",
            params![
                id,
                interaction.hcp_name,
                interaction.date.to_string(),
                interaction.sentiment.as_str(),
                serde_json::to_string(&interaction.materials_shared)?,
                interaction.discussion_summary,
                serde_json::to_string(&interaction.products_discussed)?,
                interaction.follow_up_date.map(|d| d.to_string()),
                interaction.key_insights,
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound { id });
        }
        Ok(())
    }

    /// Apply a field-level patch to the stored record and return the result.
    pub fn apply_patch(
        &self,
        id: i64,
        patch: &InteractionPatch,
    ) -> Result<StoredInteraction, StoreError> {
        let stored = self.get(id)?.ok_or(StoreError::NotFound { id })?;
        let mut record = stored.interaction;
        patch.apply_to(&mut record);
        self.update(id, &record)?;
        self.get(id)?.ok_or(StoreError::NotFound { id })
    }

    /// List interactions, newest first.
    pub fn list(&self, offset: usize, limit: usize) -> Result<Vec<StoredInteraction>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, hcp_name, date, sentiment, materials_shared,
                    discussion_summary, products_discussed, follow_up_date,
                    key_insights, created_at, updated_at
             FROM interactions
             ORDER BY id DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
            Ok(row_to_stored(row))
        })?;

        let mut interactions = Vec::new();
        for row in rows {
            interactions.push(row?);
        }
        Ok(interactions)
    }

    /// Delete an interaction.
    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM interactions WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound { id });
        }
        Ok(())
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Convert a rusqlite row to a StoredInteraction.
fn row_to_stored(row: &rusqlite::Row<'_>) -> StoredInteraction {
    StoredInteraction {
        id: row.get(0).unwrap_or(0),
        interaction: Interaction {
            hcp_name: row.get(1).unwrap_or(None),
            date: parse_date(&row.get::<_, String>(2).unwrap_or_default())
                .unwrap_or_else(crate::agent::types::today),
            sentiment: Sentiment::from_loose(&row.get::<_, String>(3).unwrap_or_default()),
            materials_shared: parse_json_array(row.get::<_, String>(4).unwrap_or_default()),
            discussion_summary: row.get(5).unwrap_or(None),
            products_discussed: parse_json_array(row.get::<_, String>(6).unwrap_or_default()),
            follow_up_date: row
                .get::<_, Option<String>>(7)
                .unwrap_or(None)
                .as_deref()
                .and_then(parse_date),
            key_insights: row.get(8).unwrap_or(None),
        },
        created_at: row.get(9).unwrap_or_default(),
        updated_at: row.get(10).unwrap_or_default(),
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Parse a JSON string into a Vec<String>, defaulting to empty.
fn parse_json_array(json: String) -> Vec<String> {
    serde_json::from_str(&json).unwrap_or_default()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> CrmDatabase {
        CrmDatabase::open(":memory:").unwrap()
    }

    fn record() -> Interaction {
        Interaction {
            hcp_name: Some("Dr. Smith".into()),
            date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
            sentiment: Sentiment::Positive,
            materials_shared: vec!["brochures".into(), "samples".into()],
            discussion_summary: Some("Efficacy data".into()),
            products_discussed: vec!["GlucoControl".into()],
            follow_up_date: NaiveDate::from_ymd_opt(2026, 9, 2),
            key_insights: None,
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let db = test_db();
        let id = db.create(&record()).unwrap();

        let stored = db.get(id).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.interaction, record());
        assert!(!stored.created_at.is_empty());
    }

    #[test]
    fn create_without_name_is_rejected() {
        let db = test_db();
        let nameless = Interaction::default();
        assert!(matches!(
            db.create(&nameless),
            Err(StoreError::MissingHcpName)
        ));

        let blank = Interaction {
            hcp_name: Some("   ".into()),
            ..Interaction::default()
        };
        assert!(matches!(db.create(&blank), Err(StoreError::MissingHcpName)));
    }

    #[test]
    fn get_missing_returns_none() {
        let db = test_db();
        assert!(db.get(999).unwrap().is_none());
    }

    #[test]
    fn update_replaces_whole_record() {
        let db = test_db();
        let id = db.create(&record()).unwrap();

        let mut changed = record();
        changed.sentiment = Sentiment::Negative;
        changed.materials_shared.clear();
        db.update(id, &changed).unwrap();

        let stored = db.get(id).unwrap().unwrap();
        assert_eq!(stored.interaction.sentiment, Sentiment::Negative);
        assert!(stored.interaction.materials_shared.is_empty());
    }

    #[test]
    fn update_missing_is_not_found() {
        let db = test_db();
        assert!(matches!(
            db.update(42, &record()),
            Err(StoreError::NotFound { id: 42 })
        ));
    }

    #[test]
    fn patch_touches_only_present_fields() {
        let db = test_db();
        let id = db.create(&record()).unwrap();

        let patch: InteractionPatch =
            serde_json::from_str(r#"{"sentiment": "Negative"}"#).unwrap();
        let stored = db.apply_patch(id, &patch).unwrap();

        assert_eq!(stored.interaction.sentiment, Sentiment::Negative);
        assert_eq!(stored.interaction.hcp_name.as_deref(), Some("Dr. Smith"));
        assert_eq!(
            stored.interaction.materials_shared,
            vec!["brochures".to_string(), "samples".to_string()]
        );
    }

    #[test]
    fn patch_missing_record_is_not_found() {
        let db = test_db();
        let patch = InteractionPatch::default();
        assert!(matches!(
            db.apply_patch(1, &patch),
            Err(StoreError::NotFound { id: 1 })
        ));
    }

    #[test]
    fn list_is_newest_first_with_pagination() {
        let db = test_db();
        for i in 0..5 {
            let mut r = record();
            r.hcp_name = Some(format!("Dr. {i}"));
            db.create(&r).unwrap();
        }

        let page = db.list(0, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].interaction.hcp_name.as_deref(), Some("Dr. 4"));
        assert_eq!(page[1].interaction.hcp_name.as_deref(), Some("Dr. 3"));

        let next = db.list(2, 2).unwrap();
        assert_eq!(next[0].interaction.hcp_name.as_deref(), Some("Dr. 2"));
    }

    #[test]
    fn delete_removes_row() {
        let db = test_db();
        let id = db.create(&record()).unwrap();
        db.delete(id).unwrap();
        assert!(db.get(id).unwrap().is_none());
        assert!(matches!(db.delete(id), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crm.db");
        let path = path.to_str().unwrap();

        let id = {
            let db = CrmDatabase::open(path).unwrap();
            db.create(&record()).unwrap()
        };

        let db = CrmDatabase::open(path).unwrap();
        let stored = db.get(id).unwrap().unwrap();
        assert_eq!(stored.interaction, record());
    }
}
