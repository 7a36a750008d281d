// SQLite-backed document store.

use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::Value;
use tracing::debug;

use crate::store::{matches_filters, DocPath, Document, DocumentStore, StoreError, WriteBatch};

/// Documents stored as JSON text keyed by `(collection, id)`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                data       TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (collection, id)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn read(tx: &Transaction<'_>, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = tx
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![path.collection, path.id],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    fn write(tx: &Transaction<'_>, path: &DocPath, data: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_string(data)?;
        tx.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)
             ON CONFLICT(collection, id) DO UPDATE SET
                data       = excluded.data,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![path.collection, path.id, json],
        )?;
        Ok(())
    }
}

impl DocumentStore for Database {
    fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![path.collection, path.id],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    fn query(&self, collection: &str, filters: &[(&str, Value)]) -> Result<Vec<Document>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut docs = Vec::new();
        for (id, raw) in rows {
            let data: Value = serde_json::from_str(&raw)?;
            if matches_filters(&data, filters) {
                docs.push(Document {
                    path: DocPath::new(collection, id),
                    data,
                });
            }
        }
        Ok(docs)
    }

    /// Commits inside one SQLite transaction. Any failing op rolls the whole
    /// batch back when the transaction is dropped uncommitted.
    fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut applied = 0;
        for op in batch.into_ops() {
            let path = op.path().clone();
            let current = Self::read(&tx, &path)?;
            let next = op.apply(current)?;
            Self::write(&tx, &path, &next)?;
            applied += 1;
        }
        tx.commit()?;
        debug!("committed batch of {applied} writes");
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn season() -> DocPath {
        DocPath::new("seasons", "S9")
    }

    #[test]
    fn open_creates_documents_table() {
        let db = test_db();
        let conn = db.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='documents')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists);
    }

    #[test]
    fn get_missing_returns_none() {
        let db = test_db();
        assert!(db.get(&season()).unwrap().is_none());
    }

    #[test]
    fn set_then_get() {
        let db = test_db();
        let mut batch = WriteBatch::new();
        batch.set(season(), json!({"gp": 0}));
        assert_eq!(db.commit(batch).unwrap(), 1);
        assert_eq!(db.get(&season()).unwrap(), Some(json!({"gp": 0})));
    }

    #[test]
    fn ops_in_one_batch_see_earlier_ops() {
        let db = test_db();
        let mut batch = WriteBatch::new();
        batch
            .set(season(), json!({"gp": 1, "name": "S9"}))
            .fold(season(), |current| {
                let gp = current.and_then(|d| d["gp"].as_u64()).unwrap_or(0);
                Ok(json!({"gp": gp + 2}))
            })
            .merge(season(), json!({"current_week": 3}));
        db.commit(batch).unwrap();
        assert_eq!(
            db.get(&season()).unwrap(),
            Some(json!({"gp": 3, "name": "S9", "current_week": 3}))
        );
    }

    #[test]
    fn failed_op_rolls_back_whole_batch() {
        let db = test_db();
        let other = DocPath::new("seasons", "S10");
        let mut batch = WriteBatch::new();
        batch
            .set(other.clone(), json!({"gp": 0}))
            .fold(season(), |_| {
                Err(StoreError::Fold {
                    path: "seasons/S9".into(),
                    message: "gp is not numeric".into(),
                })
            });
        assert!(db.commit(batch).is_err());
        assert!(db.get(&other).unwrap().is_none());
    }

    #[test]
    fn fold_runs_against_committed_state() {
        let db = test_db();
        let mut seed = WriteBatch::new();
        seed.set(season(), json!({"gp": 4}));
        db.commit(seed).unwrap();

        let mut batch = WriteBatch::new();
        batch.fold(season(), |current| {
            let gp = current.and_then(|d| d["gp"].as_u64()).unwrap_or(0);
            Ok(json!({"gp": gp * 2}))
        });
        db.commit(batch).unwrap();
        assert_eq!(db.get(&season()).unwrap(), Some(json!({"gp": 8})));
    }

    #[test]
    fn query_filters_by_fields() {
        let db = test_db();
        let mut batch = WriteBatch::new();
        batch
            .set(DocPath::new("lineups", "a"), json!({"date": "3/15/2025", "started": true}))
            .set(DocPath::new("lineups", "b"), json!({"date": "3/15/2025", "started": false}))
            .set(DocPath::new("lineups", "c"), json!({"date": "3/16/2025", "started": true}))
            .set(DocPath::new("other", "d"), json!({"date": "3/15/2025", "started": true}));
        db.commit(batch).unwrap();

        let docs = db
            .query("lineups", &[("date", json!("3/15/2025")), ("started", json!(true))])
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), "a");
        assert_eq!(db.count("lineups").unwrap(), 3);
    }
}
