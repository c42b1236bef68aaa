//! Movie date-record repository

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::services::provenance::{DateRecord, Provenance};

/// Movie row: one canonical date record per title
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MovieRecord {
    pub imdb_id: String,
    pub date_added: Option<DateTime<Utc>>,
    pub date_source: String,
    pub release_date: Option<DateTime<Utc>>,
    pub path: Option<String>,
    pub has_video: bool,
    pub updated_at: DateTime<Utc>,
}

impl MovieRecord {
    pub fn to_date_record(&self) -> DateRecord {
        DateRecord {
            date: self.date_added,
            source: Provenance::parse(&self.date_source),
            secondary_date: self.release_date,
        }
    }
}

pub struct MovieRepository {
    pool: SqlitePool,
}

impl MovieRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, imdb_id: &str) -> Result<Option<MovieRecord>> {
        let record = sqlx::query_as::<_, MovieRecord>(
            r#"
            SELECT imdb_id, date_added, date_source, release_date, path, has_video, updated_at
            FROM movies
            WHERE imdb_id = $1
            "#,
        )
        .bind(imdb_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Current date record for a title, if one has been persisted
    pub async fn get_record(&self, imdb_id: &str) -> Result<Option<DateRecord>> {
        Ok(self.get(imdb_id).await?.map(|r| r.to_date_record()))
    }

    pub async fn upsert(
        &self,
        imdb_id: &str,
        record: &DateRecord,
        path: &Path,
        has_video: bool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO movies (imdb_id, date_added, date_source, release_date, path, has_video, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (imdb_id) DO UPDATE SET
                date_added = excluded.date_added,
                date_source = excluded.date_source,
                release_date = excluded.release_date,
                path = excluded.path,
                has_video = excluded.has_video,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(imdb_id)
        .bind(record.date)
        .bind(record.source.to_string())
        .bind(record.secondary_date)
        .bind(path.to_string_lossy().into_owned())
        .bind(has_video)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<MovieRecord>> {
        let records = sqlx::query_as::<_, MovieRecord>(
            r#"
            SELECT imdb_id, date_added, date_source, release_date, path, has_video, updated_at
            FROM movies
            ORDER BY imdb_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::services::provenance::ProvenanceKind;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_upsert_and_round_trip() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = db.movies();

        let record = DateRecord::new(
            Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap(),
            Provenance::with_detail(ProvenanceKind::ImportHistory, "/downloads/x"),
        )
        .with_secondary(Some(Utc.with_ymd_and_hms(2021, 11, 5, 0, 0, 0).unwrap()));

        repo.upsert("tt0113277", &record, Path::new("/movies/Heat (1995)"), true)
            .await
            .unwrap();
        let loaded = repo.get("tt0113277").await.unwrap().unwrap();
        assert_eq!(loaded.to_date_record(), record);
        assert!(loaded.has_video);

        // second upsert replaces, never duplicates
        let newer = DateRecord::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Provenance::new(ProvenanceKind::DigitalRelease),
        );
        repo.upsert("tt0113277", &newer, Path::new("/movies/Heat (1995)"), true)
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.get_record("tt0113277").await.unwrap().unwrap(), newer);
    }

    #[tokio::test]
    async fn test_terminal_record_persists() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = db.movies();

        repo.upsert("tt0000404", &DateRecord::unresolved(), Path::new("/movies/x"), false)
            .await
            .unwrap();
        let loaded = repo.get_record("tt0000404").await.unwrap().unwrap();
        assert_eq!(loaded.date, None);
        assert_eq!(loaded.source.kind, ProvenanceKind::NoValidDateSource);
    }
}
