//! Category and category-type models.
//!
//! A category owns a list of types; music records reference both by id.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use soundvault_core::types::{DbId, Timestamp};

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `category_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryType {
    pub id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A category together with the types it owns.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithTypes {
    #[serde(flatten)]
    pub category: Category,
    pub types: Vec<CategoryType>,
}

/// DTO for creating a category and its types in one step.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub types: Vec<CreateCategoryType>,
}

/// DTO for one type entry inside [`CreateCategory`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryType {
    pub name: String,
    pub description: Option<String>,
}
