//! Route definitions for the `/music` resource.
//!
//! ```text
//! GET    /                        list
//! GET    /category/{category_id}  list_by_category
//! POST   /create                  create
//! POST   /upload                  upload
//! POST   /update-urls             update_urls
//! GET    /{id}                    get_by_id
//! PUT    /{id}                    update
//! DELETE /{id}                    delete
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::music;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(music::list))
        .route("/category/{category_id}", get(music::list_by_category))
        .route("/create", post(music::create))
        .route("/upload", post(music::upload))
        .route("/update-urls", post(music::update_urls))
        .route(
            "/{id}",
            get(music::get_by_id)
                .put(music::update)
                .delete(music::delete),
        )
}
