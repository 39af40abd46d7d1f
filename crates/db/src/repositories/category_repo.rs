//! Repository for the `categories` and `category_types` tables.

use std::collections::HashMap;

use sqlx::PgPool;
use soundvault_core::types::DbId;

use crate::models::category::{Category, CategoryType, CategoryWithTypes, CreateCategory};

/// Column list for the `categories` table.
const COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Column list for the `category_types` table.
const TYPE_COLUMNS: &str = "id, category_id, name, description, created_at, updated_at";

/// Provides CRUD operations for categories and their nested types.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a category and all of its types in a single transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCategory,
    ) -> Result<CategoryWithTypes, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let category = sqlx::query_as::<_, Category>(&insert_query)
            .bind(input.name.trim())
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        let type_query = format!(
            "INSERT INTO category_types (category_id, name, description) \
             VALUES ($1, $2, $3) RETURNING {TYPE_COLUMNS}"
        );
        let mut types = Vec::with_capacity(input.types.len());
        for t in &input.types {
            let row = sqlx::query_as::<_, CategoryType>(&type_query)
                .bind(category.id)
                .bind(t.name.trim())
                .bind(&t.description)
                .fetch_one(&mut *tx)
                .await?;
            types.push(row);
        }

        tx.commit().await?;
        Ok(CategoryWithTypes { category, types })
    }

    /// Find a category by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a category by ID, enriched with its types.
    pub async fn find_with_types(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CategoryWithTypes>, sqlx::Error> {
        let Some(category) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let types = Self::list_types(pool, id).await?;
        Ok(Some(CategoryWithTypes { category, types }))
    }

    /// List all categories by name, each with its types.
    pub async fn list_with_types(pool: &PgPool) -> Result<Vec<CategoryWithTypes>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY name");
        let categories = sqlx::query_as::<_, Category>(&query).fetch_all(pool).await?;

        let type_query =
            format!("SELECT {TYPE_COLUMNS} FROM category_types ORDER BY category_id, id");
        let all_types = sqlx::query_as::<_, CategoryType>(&type_query)
            .fetch_all(pool)
            .await?;

        let mut by_category: HashMap<DbId, Vec<CategoryType>> = HashMap::new();
        for t in all_types {
            by_category.entry(t.category_id).or_default().push(t);
        }

        Ok(categories
            .into_iter()
            .map(|category| {
                let types = by_category.remove(&category.id).unwrap_or_default();
                CategoryWithTypes { category, types }
            })
            .collect())
    }

    /// List the types owned by a category, in insertion order.
    pub async fn list_types(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Vec<CategoryType>, sqlx::Error> {
        let query = format!(
            "SELECT {TYPE_COLUMNS} FROM category_types WHERE category_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, CategoryType>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await
    }

    /// IDs of the types owned by a category.
    pub async fn list_type_ids(pool: &PgPool, category_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM category_types WHERE category_id = $1 ORDER BY id",
        )
        .bind(category_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a category and its types. Music rows keep existing with the
    /// references set to NULL. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
