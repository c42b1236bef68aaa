//! Append-only processing audit log

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub entity_key: String,
    pub media_kind: String,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        entity_key: &str,
        media_kind: &str,
        action: &str,
        detail: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processing_history (entity_key, media_kind, action, detail, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entity_key)
        .bind(media_kind)
        .bind(action)
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: i64) -> Result<Vec<HistoryEntry>> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, entity_key, media_kind, action, detail, created_at
            FROM processing_history
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn for_entity(&self, entity_key: &str, limit: i64) -> Result<Vec<HistoryEntry>> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, entity_key, media_kind, action, detail, created_at
            FROM processing_history
            WHERE entity_key = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(entity_key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_append_only_ordering() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = db.history();

        repo.append("movie:tt1", "movie", "Download", "import-history:import")
            .await
            .unwrap();
        repo.append("movie:tt1", "movie", "Upgrade", "release:digital")
            .await
            .unwrap();
        repo.append("movie:tt2", "movie", "Download", "release:theatrical")
            .await
            .unwrap();

        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].entity_key, "movie:tt2");

        let for_one = repo.for_entity("movie:tt1", 10).await.unwrap();
        assert_eq!(for_one.len(), 2);
        assert_eq!(for_one[0].action, "Upgrade");
    }
}
