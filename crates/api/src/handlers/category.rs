//! Handlers for the `/categories` resource.
//!
//! Categories own a list of types; music records reference one of each.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use soundvault_core::error::CoreError;
use soundvault_core::music::parse_id;
use soundvault_db::models::category::CreateCategory;
use soundvault_db::repositories::CategoryRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Reject blank names and duplicate type names within one category.
fn validate_create(input: &CreateCategory) -> Result<(), CoreError> {
    let mut errors = Vec::new();
    if input.name.trim().is_empty() {
        errors.push("name must not be blank".to_string());
    }

    let mut seen = HashSet::new();
    for (idx, t) in input.types.iter().enumerate() {
        let name = t.name.trim();
        if name.is_empty() {
            errors.push(format!("types[{idx}].name must not be blank"));
        } else if !seen.insert(name.to_lowercase()) {
            errors.push(format!("types[{idx}].name '{name}' is duplicated"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}

/// GET /api/categories
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let categories = CategoryRepo::list_with_types(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id("id", &id)?;
    let category = CategoryRepo::find_with_types(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;
    Ok(Json(DataResponse { data: category }))
}

/// POST /api/categories
///
/// Create a category together with its types.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateCategory>,
) -> AppResult<impl IntoResponse> {
    validate_create(&input)?;
    let category = CategoryRepo::create(&state.pool, &input).await?;
    tracing::info!(
        category_id = category.category.id,
        types = category.types.len(),
        user_id = admin.user_id,
        "Category created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// DELETE /api/categories/{id}
///
/// Music in the category is kept and lists with a null category.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id("id", &id)?;
    if !CategoryRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }));
    }
    tracing::info!(category_id = id, user_id = admin.user_id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
