//! Repository for the `music` table.

use sqlx::PgPool;
use soundvault_core::types::DbId;

use crate::models::music::{
    CreateMusic, Music, MusicDetail, MusicDetailRow, MusicUrls, UpdateMusic,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, artist, category_id, category_type_id, duration, \
    release_date, description, file_url, thumbnail_url, user_id, created_at, updated_at";

/// Expanded select: the type join also requires the type to belong to the
/// record's category, so a mismatched type resolves to NULL.
const DETAIL_SELECT: &str = "SELECT m.id, m.title, m.artist, m.category_id, \
        m.category_type_id, m.duration, m.release_date, m.description, m.file_url, \
        m.thumbnail_url, m.user_id, m.created_at, m.updated_at, \
        c.id AS cat_id, c.name AS cat_name, \
        ct.id AS type_id, ct.name AS type_name, ct.description AS type_description \
    FROM music m \
    LEFT JOIN categories c ON c.id = m.category_id \
    LEFT JOIN category_types ct ON ct.id = m.category_type_id AND ct.category_id = m.category_id";

/// Provides CRUD operations for music records.
pub struct MusicRepo;

impl MusicRepo {
    /// Insert a new record, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMusic) -> Result<Music, sqlx::Error> {
        let query = format!(
            "INSERT INTO music \
                (title, artist, category_id, category_type_id, duration, release_date, \
                 description, file_url, thumbnail_url, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Music>(&query)
            .bind(&input.title)
            .bind(&input.artist)
            .bind(input.category_id)
            .bind(input.category_type_id)
            .bind(input.duration)
            .bind(input.release_date)
            .bind(&input.description)
            .bind(&input.file_url)
            .bind(&input.thumbnail_url)
            .bind(input.user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a record by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Music>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM music WHERE id = $1");
        sqlx::query_as::<_, Music>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a record by ID with its category and type resolved.
    pub async fn find_detail_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MusicDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE m.id = $1");
        let row = sqlx::query_as::<_, MusicDetailRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(MusicDetail::from))
    }

    /// List every record, most recently created first, expanded.
    pub async fn list_detailed(pool: &PgPool) -> Result<Vec<MusicDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} ORDER BY m.created_at DESC, m.id DESC");
        let rows = sqlx::query_as::<_, MusicDetailRow>(&query)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(MusicDetail::from).collect())
    }

    /// List the records of one category, most recently created first, expanded.
    pub async fn list_detailed_by_category(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Vec<MusicDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} WHERE m.category_id = $1 ORDER BY m.created_at DESC, m.id DESC"
        );
        let rows = sqlx::query_as::<_, MusicDetailRow>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(MusicDetail::from).collect())
    }

    /// Update a record. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMusic,
    ) -> Result<Option<Music>, sqlx::Error> {
        let query = format!(
            "UPDATE music SET \
                title = COALESCE($2, title), \
                artist = COALESCE($3, artist), \
                category_id = COALESCE($4, category_id), \
                category_type_id = COALESCE($5, category_type_id), \
                duration = COALESCE($6, duration), \
                release_date = COALESCE($7, release_date), \
                description = CASE WHEN $8 THEN $9 ELSE description END, \
                file_url = COALESCE($10, file_url), \
                thumbnail_url = COALESCE($11, thumbnail_url) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Music>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.artist)
            .bind(input.category_id)
            .bind(input.category_type_id)
            .bind(input.duration)
            .bind(input.release_date)
            .bind(input.description.is_some())
            .bind(input.description.clone().flatten())
            .bind(&input.file_url)
            .bind(&input.thumbnail_url)
            .fetch_optional(pool)
            .await
    }

    /// Delete a record, returning the removed row so its files can be
    /// cleaned up. Returns `None` if no row with the given `id` exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Music>, sqlx::Error> {
        let query = format!("DELETE FROM music WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Music>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Records whose file or thumbnail URL contains `host`, in id order.
    pub async fn list_urls_containing(
        pool: &PgPool,
        host: &str,
    ) -> Result<Vec<MusicUrls>, sqlx::Error> {
        sqlx::query_as::<_, MusicUrls>(
            "SELECT id, file_url, thumbnail_url FROM music \
             WHERE strpos(file_url, $1) > 0 OR strpos(thumbnail_url, $1) > 0 \
             ORDER BY id",
        )
        .bind(host)
        .fetch_all(pool)
        .await
    }

    /// Overwrite the URL columns that are `Some`. Returns `true` if the row
    /// exists.
    pub async fn update_urls(
        pool: &PgPool,
        id: DbId,
        file_url: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE music SET \
                file_url = COALESCE($2, file_url), \
                thumbnail_url = COALESCE($3, thumbnail_url) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(file_url)
        .bind(thumbnail_url)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
