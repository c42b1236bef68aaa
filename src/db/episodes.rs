//! Episode date-record repository

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::services::provenance::{DateRecord, Provenance};

/// Episode row, keyed by series id plus season/episode numbers
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EpisodeRecord {
    pub series_id: String,
    pub season: i64,
    pub episode: i64,
    pub date_added: Option<DateTime<Utc>>,
    pub date_source: String,
    pub air_date: Option<DateTime<Utc>>,
    pub video_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl EpisodeRecord {
    pub fn to_date_record(&self) -> DateRecord {
        DateRecord {
            date: self.date_added,
            source: Provenance::parse(&self.date_source),
            secondary_date: self.air_date,
        }
    }
}

pub struct EpisodeRepository {
    pool: SqlitePool,
}

impl EpisodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_record(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<Option<DateRecord>> {
        let record = sqlx::query_as::<_, EpisodeRecord>(
            r#"
            SELECT series_id, season, episode, date_added, date_source, air_date, video_path, updated_at
            FROM episodes
            WHERE series_id = $1 AND season = $2 AND episode = $3
            "#,
        )
        .bind(series_id)
        .bind(season as i64)
        .bind(episode as i64)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(|r| r.to_date_record()))
    }

    pub async fn upsert(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
        record: &DateRecord,
        video_path: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO episodes (series_id, season, episode, date_added, date_source, air_date, video_path, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (series_id, season, episode) DO UPDATE SET
                date_added = excluded.date_added,
                date_source = excluded.date_source,
                air_date = excluded.air_date,
                video_path = excluded.video_path,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(series_id)
        .bind(season as i64)
        .bind(episode as i64)
        .bind(record.date)
        .bind(record.source.to_string())
        .bind(record.secondary_date)
        .bind(video_path)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_series(&self, series_id: &str) -> Result<Vec<EpisodeRecord>> {
        let records = sqlx::query_as::<_, EpisodeRecord>(
            r#"
            SELECT series_id, season, episode, date_added, date_source, air_date, video_path, updated_at
            FROM episodes
            WHERE series_id = $1
            ORDER BY season, episode
            "#,
        )
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM episodes")
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
    async fn test_episode_keying() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = db.episodes();

        let record = DateRecord::new(
            Utc.with_ymd_and_hms(2021, 10, 3, 2, 0, 0).unwrap(),
            Provenance::new(ProvenanceKind::AirDate),
        );
        repo.upsert("tt0389564", 2, 7, &record, Some("/tv/show/S02E07.mkv"))
            .await
            .unwrap();
        repo.upsert("tt0389564", 2, 8, &record, Some("/tv/show/S02E08.mkv"))
            .await
            .unwrap();

        assert_eq!(
            repo.get_record("tt0389564", 2, 7).await.unwrap(),
            Some(record.clone())
        );
        assert_eq!(repo.get_record("tt0389564", 2, 9).await.unwrap(), None);
        assert_eq!(repo.list_for_series("tt0389564").await.unwrap().len(), 2);

        // same key upserts in place
        repo.upsert("tt0389564", 2, 7, &record, None).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
