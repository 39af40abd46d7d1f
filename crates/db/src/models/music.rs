//! Music record model, expanded views, and DTOs.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use soundvault_core::types::{DbId, Timestamp};

/// A row from the `music` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Music {
    pub id: DbId,
    pub title: String,
    pub artist: String,
    pub category_id: Option<DbId>,
    pub category_type_id: Option<DbId>,
    /// Length in seconds.
    pub duration: f64,
    pub release_date: NaiveDate,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub user_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Category fields embedded in an expanded music record.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: DbId,
    pub name: String,
}

/// Category-type fields embedded in an expanded music record.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTypeSummary {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
}

/// A music record with its category and type resolved.
///
/// `category` is `None` when the referenced category no longer exists;
/// `category_type` is `None` unless the type belongs to that category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicDetail {
    #[serde(flatten)]
    pub music: Music,
    pub category: Option<CategorySummary>,
    pub category_type: Option<CategoryTypeSummary>,
}

/// Flat join row backing [`MusicDetail`].
#[derive(Debug, Clone, FromRow)]
pub struct MusicDetailRow {
    #[sqlx(flatten)]
    pub music: Music,
    pub cat_id: Option<DbId>,
    pub cat_name: Option<String>,
    pub type_id: Option<DbId>,
    pub type_name: Option<String>,
    pub type_description: Option<String>,
}

impl From<MusicDetailRow> for MusicDetail {
    fn from(row: MusicDetailRow) -> Self {
        let category = match (row.cat_id, row.cat_name) {
            (Some(id), Some(name)) => Some(CategorySummary { id, name }),
            _ => None,
        };
        let category_type = match (row.type_id, row.type_name) {
            (Some(id), Some(name)) => Some(CategoryTypeSummary {
                id,
                name,
                description: row.type_description,
            }),
            _ => None,
        };
        Self {
            music: row.music,
            category,
            category_type,
        }
    }
}

/// DTO for inserting a validated music record.
#[derive(Debug, Clone)]
pub struct CreateMusic {
    pub title: String,
    pub artist: String,
    pub category_id: DbId,
    pub category_type_id: DbId,
    pub duration: f64,
    pub release_date: NaiveDate,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub user_id: Option<DbId>,
}

/// Partial update. `None` leaves a column untouched.
///
/// `description` distinguishes "not supplied" (`None`) from "clear it"
/// (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct UpdateMusic {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub category_id: Option<DbId>,
    pub category_type_id: Option<DbId>,
    pub duration: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub description: Option<Option<String>>,
    pub file_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// The URL columns of a record, used by the URL migration scan.
#[derive(Debug, Clone, FromRow)]
pub struct MusicUrls {
    pub id: DbId,
    pub file_url: Option<String>,
    pub thumbnail_url: Option<String>,
}
