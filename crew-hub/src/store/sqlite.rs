//! SQLite-backed JSON document store
//!
//! One `documents` table holds every collection as `(collection, id, data)`
//! rows with the payload stored as JSON text. Each mutation broadcasts a
//! [`ChangeNotice`] on an internal channel, the change-notification
//! primitive the roster synchronizer watches.

use super::{
    ChangeNotice, RawDocument, RosterSource, GROUPS_COLLECTION, IN_QUERY_LIMIT, USERS_COLLECTION,
};
use crate::error::{Error, Result};
use crew_common::model::Member;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    id          TEXT NOT NULL,
    data        TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (collection, id)
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
";

/// Counts reported by a bulk clear
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ClearSummary {
    pub users_cleared: u64,
    pub groups_cleared: u64,
}

/// Shared handle to the SQLite document store
///
/// Cheap to clone: the pool and the change channel are both shared.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<ChangeNotice>,
}

impl SqliteStore {
    /// Open (creating if missing) the store at the given path.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!("Document store opened at {}", path.display());
        Self::with_pool(pool).await
    }

    /// Open an in-memory store (tests, ephemeral runs).
    ///
    /// Single connection: each SQLite `:memory:` connection is its own
    /// database, so the pool must not open a second one.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        let (changes, _) = broadcast::channel(64);
        Ok(Self { pool, changes })
    }

    fn notify(&self, collection: &str) {
        // No subscribers is fine (e.g. admin tooling without a live roster)
        let _ = self.changes.send(ChangeNotice {
            collection: collection.to_string(),
        });
    }

    /// Create a document with a store-assigned uuid id.
    pub async fn create_document(
        &self,
        collection: &str,
        data: &serde_json::Value,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.put_document(collection, &id, data).await?;
        Ok(id)
    }

    /// Insert or replace a document at a known id.
    pub async fn put_document(
        &self,
        collection: &str,
        id: &str,
        data: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)
             ON CONFLICT (collection, id)
             DO UPDATE SET data = excluded.data, updated_at = datetime('now')",
        )
        .bind(collection)
        .bind(id)
        .bind(data.to_string())
        .execute(&self.pool)
        .await?;
        self.notify(collection);
        Ok(())
    }

    /// Point lookup by id. `Ok(None)` when the document does not exist.
    pub async fn get_document(&self, collection: &str, id: &str) -> Result<Option<RawDocument>> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT id, data FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(id, data)| parse_document(collection, id, &data)))
    }

    /// Delete one document. Returns whether it existed.
    pub async fn delete_document(&self, collection: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            self.notify(collection);
        }
        Ok(deleted)
    }

    /// Full collection read in insertion order.
    pub async fn list_collection(&self, collection: &str) -> Result<Vec<RawDocument>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT id, data FROM documents WHERE collection = ? ORDER BY rowid",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, data)| parse_document(collection, id, &data))
            .collect())
    }

    /// Batched `in`-style lookup on a top-level document field.
    ///
    /// Enforces [`IN_QUERY_LIMIT`] per call, like the hosted stores this
    /// models; callers chunk larger id sets.
    pub async fn query_field_in(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
    ) -> Result<Vec<RawDocument>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        if values.len() > IN_QUERY_LIMIT {
            return Err(Error::InvalidInput(format!(
                "in-query limited to {} values, got {}",
                IN_QUERY_LIMIT,
                values.len()
            )));
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        qb.push(" AND json_extract(data, ");
        qb.push_bind(format!("$.{field}"));
        qb.push(") IN (");
        let mut separated = qb.separated(", ");
        for value in values {
            separated.push_bind(value.clone());
        }
        separated.push_unseparated(")");
        qb.push(" ORDER BY rowid");

        let rows: Vec<(String, String)> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, data)| parse_document(collection, id, &data))
            .collect())
    }

    /// Delete every document in a collection, returning the count removed.
    pub async fn clear_collection(&self, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(collection)
            .execute(&self.pool)
            .await?;
        let cleared = result.rows_affected();
        info!("Cleared {} documents from {}", cleared, collection);
        self.notify(collection);
        Ok(cleared)
    }

    /// Clear users and study groups (the bulk-delete admin operation).
    pub async fn clear_all(&self) -> Result<ClearSummary> {
        let users_cleared = self.clear_collection(USERS_COLLECTION).await?;
        let groups_cleared = self.clear_collection(GROUPS_COLLECTION).await?;
        Ok(ClearSummary {
            users_cleared,
            groups_cleared,
        })
    }
}

impl RosterSource for SqliteStore {
    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeNotice> {
        self.changes.subscribe()
    }

    async fn list_groups(&self) -> Result<Vec<RawDocument>> {
        self.list_collection(GROUPS_COLLECTION).await
    }

    async fn members_by_ids(&self, ids: Vec<String>) -> Result<Vec<Member>> {
        let docs = self.query_field_in(USERS_COLLECTION, "id", &ids).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| Member::from_document(&doc.id, &doc.data))
            .collect())
    }
}

/// Parse one stored row; corrupt JSON is skipped with a warning rather than
/// failing the whole read.
fn parse_document(collection: &str, id: String, data: &str) -> Option<RawDocument> {
    match serde_json::from_str(data) {
        Ok(data) => Some(RawDocument { id, data }),
        Err(e) => {
            warn!(collection, id, error = %e, "skipping corrupt document");
            debug!("corrupt payload: {}", data);
            None
        }
    }
}
