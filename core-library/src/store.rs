//! Durable store for cached catalogue entities
//!
//! The response cache writes every recognized show and artist here in
//! addition to its memory and disk tiers. Rows are addressed by the
//! upper-case UUID string (see [`cache_key`](crate::models::cache_key));
//! artists can also be looked up by their integer id.

use crate::error::Result;
use crate::models::{ArtistWithCounts, ShowWithSources};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, SqlitePool};
use tracing::{debug, instrument};

/// Durable store interface used by the response cache
#[async_trait]
pub trait RelistenStore: Send + Sync {
    /// Insert or overwrite a show, keyed by its UUID.
    async fn cache_show(&self, show: &ShowWithSources) -> Result<()>;

    /// Insert or overwrite every artist in one transaction.
    ///
    /// Either all artists are written or none are.
    async fn cache_artists(&self, artists: &[ArtistWithCounts]) -> Result<()>;

    /// Find an artist by its server-side integer id
    ///
    /// # Returns
    /// - `Ok(Some(artist))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn artist_by_id(&self, id: i64) -> Result<Option<ArtistWithCounts>>;

    /// Find an artist by UUID string (any letter case).
    async fn artist_by_uuid(&self, uuid: &str) -> Result<Option<ArtistWithCounts>>;

    /// Find a show by UUID string (any letter case).
    async fn show_by_uuid(&self, uuid: &str) -> Result<Option<ShowWithSources>>;

    /// Every stored artist, ordered by sort name.
    async fn all_artists(&self) -> Result<Vec<ArtistWithCounts>>;

    /// Stored shows of one artist, ordered by date.
    async fn shows_for_artist(&self, artist_uuid: &str) -> Result<Vec<ShowWithSources>>;
}

fn normalize_key(uuid: &str) -> String {
    uuid.trim().to_uppercase()
}

/// SQLite implementation of [`RelistenStore`]
#[derive(Clone)]
pub struct SqliteRelistenStore {
    pool: SqlitePool,
}

impl SqliteRelistenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn upsert_artist<'e, E>(executor: E, artist: &ArtistWithCounts, now: i64) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let payload = serde_json::to_string(artist)?;

        query(
            r#"
            INSERT INTO artists (uuid, id, name, slug, sort_name, payload, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(uuid) DO UPDATE SET
                id = excluded.id,
                name = excluded.name,
                slug = excluded.slug,
                sort_name = excluded.sort_name,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(artist.cache_key())
        .bind(artist.id)
        .bind(&artist.name)
        .bind(&artist.slug)
        .bind(&artist.sort_name)
        .bind(payload)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(())
    }

    fn decode<T: serde::de::DeserializeOwned>(payload: &str) -> Result<T> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[async_trait]
impl RelistenStore for SqliteRelistenStore {
    #[instrument(skip(self, show), fields(uuid = %show.cache_key()))]
    async fn cache_show(&self, show: &ShowWithSources) -> Result<()> {
        let payload = serde_json::to_string(show)?;

        query(
            r#"
            INSERT INTO shows (uuid, id, artist_uuid, display_date, source_count, payload, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(uuid) DO UPDATE SET
                id = excluded.id,
                artist_uuid = excluded.artist_uuid,
                display_date = excluded.display_date,
                source_count = excluded.source_count,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(show.cache_key())
        .bind(show.show.id)
        .bind(crate::models::cache_key(&show.show.artist_uuid))
        .bind(&show.show.display_date)
        .bind(show.sources.len() as i64)
        .bind(payload)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!(sources = show.sources.len(), "Stored show");
        Ok(())
    }

    #[instrument(skip(self, artists), fields(count = artists.len()))]
    async fn cache_artists(&self, artists: &[ArtistWithCounts]) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        for artist in artists {
            Self::upsert_artist(&mut *tx, artist, now).await?;
        }
        tx.commit().await?;

        debug!("Stored artists");
        Ok(())
    }

    async fn artist_by_id(&self, id: i64) -> Result<Option<ArtistWithCounts>> {
        let row: Option<(String,)> = query_as(
            "SELECT payload FROM artists WHERE id = ? ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(payload,)| Self::decode(&payload)).transpose()
    }

    async fn artist_by_uuid(&self, uuid: &str) -> Result<Option<ArtistWithCounts>> {
        let row: Option<(String,)> = query_as("SELECT payload FROM artists WHERE uuid = ?")
            .bind(normalize_key(uuid))
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(payload,)| Self::decode(&payload)).transpose()
    }

    async fn show_by_uuid(&self, uuid: &str) -> Result<Option<ShowWithSources>> {
        let row: Option<(String,)> = query_as("SELECT payload FROM shows WHERE uuid = ?")
            .bind(normalize_key(uuid))
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(payload,)| Self::decode(&payload)).transpose()
    }

    async fn all_artists(&self) -> Result<Vec<ArtistWithCounts>> {
        let rows: Vec<(String,)> = query_as(
            "SELECT payload FROM artists ORDER BY COALESCE(sort_name, name) COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|(payload,)| Self::decode(payload))
            .collect()
    }

    async fn shows_for_artist(&self, artist_uuid: &str) -> Result<Vec<ShowWithSources>> {
        let rows: Vec<(String,)> = query_as(
            "SELECT payload FROM shows WHERE artist_uuid = ? ORDER BY display_date",
        )
        .bind(normalize_key(artist_uuid))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|(payload,)| Self::decode(payload))
            .collect()
    }
}
