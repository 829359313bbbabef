//! SQLite persistence for interaction history.
//!
//! The table is append-only: rows are inserted once and never updated or
//! deleted. There is no retention policy, so the file grows without bound.

use crate::{CodesketchError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use codesketch_types::{InteractionRecord, NewInteraction};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// History window used when a caller does not pass a limit.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// SQLite-based interaction store.
pub struct InteractionStore {
    conn: Mutex<Connection>,
}

impl InteractionStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        tracing::info!(target: "codesketch::store", "Opened interaction store at {:?}", path);
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_prompt TEXT NOT NULL,
                generated_code TEXT,
                diagram_base64 TEXT,
                analysis_json TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_interactions_session_id ON interactions(session_id);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CodesketchError::StoreUnavailable(e.to_string()))
    }

    /// Record an interaction and return its id.
    ///
    /// The write is committed before this returns; on failure the
    /// transaction is rolled back and nothing is visible.
    pub fn insert(&self, interaction: &NewInteraction) -> Result<i64> {
        let analysis_json = interaction
            .analysis
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        // Stamped under the lock so created_at order always matches id order
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        tx.execute(
            r#"
            INSERT INTO interactions (
                session_id, user_prompt, generated_code, diagram_base64,
                analysis_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                interaction.session_id,
                interaction.user_prompt,
                interaction.generated_code,
                interaction.diagram_base64,
                analysis_json,
                created_at,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(
            target: "codesketch::store",
            id,
            session_id = %interaction.session_id,
            "Recorded interaction"
        );
        Ok(id)
    }

    /// The most recent `limit` interactions of a session, oldest first.
    ///
    /// Other sessions are never visible. No matches is an empty list.
    pub fn query_by_session(&self, session_id: &str, limit: usize) -> Result<Vec<InteractionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, session_id, user_prompt, generated_code, diagram_base64,
                   analysis_json, created_at
            FROM interactions
            WHERE session_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut records = stmt
            .query_map(params![session_id, limit], |row| Self::row_to_record(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        records.reverse();
        Ok(records)
    }

    /// Number of interactions recorded for a session.
    pub fn count_for_session(&self, session_id: &str) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM interactions WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Check if the database is accessible (for health checks).
    pub fn health_check(&self) -> bool {
        match self.conn() {
            Ok(conn) => match conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(target: "codesketch::store", "Database health check failed: {}", e);
                    false
                }
            },
            Err(e) => {
                tracing::warn!(target: "codesketch::store", "Database health check failed: {}", e);
                false
            }
        }
    }

    /// Flush and close the underlying connection.
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|e| CodesketchError::StoreUnavailable(e.to_string()))?;
        conn.close().map_err(|(_, e)| CodesketchError::DatabaseError(e))?;
        tracing::info!(target: "codesketch::store", "Closed interaction store");
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<InteractionRecord> {
        let created_at_idx = row.as_ref().column_index("created_at")?;
        let raw: String = row.get(created_at_idx)?;
        let created_at = DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    created_at_idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(InteractionRecord {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            user_prompt: row.get("user_prompt")?,
            generated_code: row.get("generated_code")?,
            diagram_base64: row.get("diagram_base64")?,
            analysis_json: row.get("analysis_json")?,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesketch_types::{CodeAnalysis, PatternTag};
    use tempfile::TempDir;

    fn create_test_store() -> (InteractionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("data").join("test.db");
        let store = InteractionStore::open(&db_path).unwrap();
        (store, temp_dir)
    }

    fn interaction(session_id: &str, prompt: &str) -> NewInteraction {
        NewInteraction {
            session_id: session_id.to_string(),
            user_prompt: prompt.to_string(),
            generated_code: Some(format!("print({:?})", prompt)),
            diagram_base64: Some("aW1n".to_string()),
            analysis: Some(CodeAnalysis {
                token_count: 4,
                avg_cyclomatic_complexity: 0.0,
                patterns: vec![PatternTag::IfStatement],
                latency_ms: None,
            }),
        }
    }

    #[test]
    fn test_insert_then_query_round_trips() {
        let (store, _temp) = create_test_store();
        let new = NewInteraction {
            session_id: "testsession".to_string(),
            user_prompt: "Hello\nwith ünïcode and 'quotes'".to_string(),
            generated_code: Some("print('hi')\n\t# tab".to_string()),
            diagram_base64: Some("YmFzZTY0".to_string()),
            analysis: Some(CodeAnalysis {
                token_count: 2,
                ..Default::default()
            }),
        };

        let id = store.insert(&new).unwrap();
        let history = store.query_by_session("testsession", DEFAULT_HISTORY_LIMIT).unwrap();

        assert_eq!(history.len(), 1);
        let record = &history[0];
        assert_eq!(record.id, id);
        assert_eq!(record.user_prompt, new.user_prompt);
        assert_eq!(record.generated_code, new.generated_code);
        assert_eq!(record.diagram_base64, new.diagram_base64);
        assert_eq!(record.analysis(), new.analysis);
    }

    #[test]
    fn test_nullable_fields_stay_null() {
        let (store, _temp) = create_test_store();
        store
            .insert(&NewInteraction {
                session_id: "s".to_string(),
                user_prompt: String::new(),
                generated_code: None,
                diagram_base64: None,
                analysis: None,
            })
            .unwrap();

        let record = &store.query_by_session("s", 10).unwrap()[0];
        assert_eq!(record.user_prompt, "");
        assert!(record.generated_code.is_none());
        assert!(record.diagram_base64.is_none());
        assert!(record.analysis_json.is_none());
    }

    #[test]
    fn test_ids_strictly_increase_across_sessions() {
        let (store, _temp) = create_test_store();
        let a = store.insert(&interaction("a", "one")).unwrap();
        let b = store.insert(&interaction("b", "two")).unwrap();
        let c = store.insert(&interaction("a", "three")).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let (store, _temp) = create_test_store();
        store.insert(&interaction("a", "for a")).unwrap();
        store.insert(&interaction("b", "for b")).unwrap();
        store.insert(&interaction("a", "again a")).unwrap();

        let history = store.query_by_session("a", DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.session_id == "a"));

        assert!(store.query_by_session("missing", 10).unwrap().is_empty());
    }

    #[test]
    fn test_limit_keeps_most_recent_oldest_first() {
        let (store, _temp) = create_test_store();
        let prompts = ["p0", "p1", "p2", "p3", "p4"];
        for p in prompts {
            store.insert(&interaction("a", p)).unwrap();
        }

        let history = store.query_by_session("a", prompts.len() - 1).unwrap();
        let got: Vec<&str> = history.iter().map(|r| r.user_prompt.as_str()).collect();
        assert_eq!(got, vec!["p1", "p2", "p3", "p4"]);

        let ids: Vec<i64> = history.iter().map(|r| r.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let (store, _temp) = create_test_store();
        store.insert(&interaction("a", "x")).unwrap();
        assert!(store.query_by_session("a", 0).unwrap().is_empty());
    }

    #[test]
    fn test_count_for_session() {
        let store = InteractionStore::open_in_memory().unwrap();
        store.insert(&interaction("a", "1")).unwrap();
        store.insert(&interaction("a", "2")).unwrap();
        store.insert(&interaction("b", "3")).unwrap();
        assert_eq!(store.count_for_session("a").unwrap(), 2);
        assert_eq!(store.count_for_session("c").unwrap(), 0);
    }

    #[test]
    fn test_concurrent_inserts_keep_time_and_id_order_aligned() {
        let (store, _temp) = create_test_store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.insert(&interaction("shared", &format!("{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = store.query_by_session("shared", 1000).unwrap();
        assert_eq!(history.len(), 100);
        assert!(history.windows(2).all(|w| w[0].id < w[1].id));
        assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let store = InteractionStore::open_in_memory().unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO interactions (session_id, user_prompt, created_at) VALUES ('s', 'p', 'yesterday')",
                [],
            )
            .unwrap();

        let err = store.query_by_session("s", 10).unwrap_err();
        assert!(matches!(
            err,
            CodesketchError::DatabaseError(rusqlite::Error::FromSqlConversionFailure(6, _, _))
        ));
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("app.db");

        let store = InteractionStore::open(&db_path).unwrap();
        let id = store.insert(&interaction("s1", "persist me")).unwrap();
        assert!(store.health_check());
        store.close().unwrap();

        let reopened = InteractionStore::open(&db_path).unwrap();
        let history = reopened.query_by_session("s1", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].user_prompt, "persist me");
    }
}
