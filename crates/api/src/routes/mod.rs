pub mod category;
pub mod health;
pub mod music;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /music                              list (public)
/// /music/{id}                         get (public), update, delete (admin)
/// /music/category/{category_id}       list by category (public)
/// /music/create                       create (admin, multipart)
/// /music/upload                       upload a single file (admin, multipart)
/// /music/update-urls                  rewrite stored base URLs (admin)
///
/// /categories                         list (public), create (admin)
/// /categories/{id}                    get (public), delete (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/music", music::router())
        .nest("/categories", category::router())
}
