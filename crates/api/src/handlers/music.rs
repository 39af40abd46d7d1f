//! Handlers for the `/music` resource.
//!
//! Create, update, and delete keep a record and its asset files consistent.
//! Ordering rule: files are written before the record that references them,
//! and old files are deleted only after the record change has committed. A
//! crash therefore leaves at worst an orphaned file, never a record pointing
//! at a missing one.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use soundvault_core::assets::{AssetStore, DeleteOutcome, StoredAsset};
use soundvault_core::error::CoreError;
use soundvault_core::music::{
    check_required, ensure_type_belongs, parse_duration, parse_id, parse_release_date,
    FieldErrors, FIELD_ARTIST, FIELD_CATEGORY, FIELD_CATEGORY_TYPE, FIELD_DESCRIPTION,
    FIELD_DURATION, FIELD_FILE, FIELD_FILE_URL, FIELD_RELEASE_DATE, FIELD_THUMBNAIL_URL,
    FIELD_TITLE,
};
use soundvault_core::text::clean_description;
use soundvault_core::types::DbId;
use soundvault_db::models::music::{CreateMusic, MusicDetail, UpdateMusic};
use soundvault_db::repositories::{CategoryRepo, MusicRepo};

use crate::error::{AppError, AppResult};
use crate::form::{MusicForm, UploadedFile};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::url_migration;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Which slot an upload-only request stored.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Audio,
    Thumbnail,
}

/// Response body for `POST /music/upload`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub kind: UploadKind,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an id taken from the URL path.
fn path_id(field: &str, raw: &str) -> AppResult<DbId> {
    Ok(parse_id(field, raw)?)
}

async fn load_detail(state: &AppState, id: DbId) -> AppResult<MusicDetail> {
    MusicRepo::find_detail_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Music",
            id,
        }))
}

async fn store_upload(assets: &AssetStore, upload: &UploadedFile) -> AppResult<StoredAsset> {
    let asset = assets.store(upload.file_name.as_deref(), &upload.bytes).await?;
    tracing::debug!(filename = %asset.filename, bytes = upload.bytes.len(), "Stored asset");
    Ok(asset)
}

/// Best-effort removal of the file behind `url`. Never fails; anything that
/// leaves a file behind is logged so orphans can be swept later.
async fn remove_asset(assets: &AssetStore, url: &str, music_id: Option<DbId>) -> DeleteOutcome {
    match assets.delete_url(url).await {
        Ok(DeleteOutcome::Deleted) => {
            tracing::debug!(url, ?music_id, "Deleted asset");
            DeleteOutcome::Deleted
        }
        Ok(DeleteOutcome::Missing) => {
            tracing::debug!(url, ?music_id, "Asset already absent");
            DeleteOutcome::Missing
        }
        Ok(DeleteOutcome::Rejected) => {
            tracing::warn!(
                url,
                ?music_id,
                "Stored URL is not a safe asset name, skipping deletion (file may be orphaned)"
            );
            DeleteOutcome::Rejected
        }
        Err(e) => {
            tracing::warn!(url, ?music_id, error = %e, "Failed to delete asset (file may be orphaned)");
            DeleteOutcome::Rejected
        }
    }
}

/// Remove files written for a request that did not complete.
async fn discard_uploads(assets: &AssetStore, uploads: &[Option<&StoredAsset>]) {
    for asset in uploads.iter().flatten() {
        remove_asset(assets, &asset.url, None).await;
    }
}

/// Validated text fields of a create request.
struct CreateFields {
    title: String,
    artist: String,
    category_id: DbId,
    category_type_id: DbId,
    duration: f64,
    release_date: chrono::NaiveDate,
    description: Option<String>,
}

/// Check presence of every required field, then the format of every value.
fn validate_create_form(form: &MusicForm) -> AppResult<CreateFields> {
    check_required(|field| form.has(field))?;

    let mut errors = FieldErrors::new();
    let category_id = errors.check(parse_id(FIELD_CATEGORY, form.text(FIELD_CATEGORY).unwrap_or("")));
    let category_type_id = errors.check(parse_id(
        FIELD_CATEGORY_TYPE,
        form.text(FIELD_CATEGORY_TYPE).unwrap_or(""),
    ));
    let duration = errors.check(parse_duration(form.text(FIELD_DURATION).unwrap_or("")));
    let release_date =
        errors.check(parse_release_date(form.text(FIELD_RELEASE_DATE).unwrap_or("")));
    let description = match form.text(FIELD_DESCRIPTION) {
        Some(raw) => errors.check(clean_description(raw)).flatten(),
        None => None,
    };

    errors.finish()?;

    let (Some(category_id), Some(category_type_id), Some(duration), Some(release_date)) =
        (category_id, category_type_id, duration, release_date)
    else {
        return Err(AppError::InternalError(
            "validated music fields unexpectedly absent".into(),
        ));
    };

    Ok(CreateFields {
        title: form.non_blank(FIELD_TITLE).unwrap_or_default().to_string(),
        artist: form.non_blank(FIELD_ARTIST).unwrap_or_default().to_string(),
        category_id,
        category_type_id,
        duration,
        release_date,
        description,
    })
}

/// Build a partial update from whichever fields were supplied.
///
/// Blank text fields count as not supplied, except `description`, where a
/// blank value clears the stored description. Any malformed value fails the
/// whole update.
fn build_update(form: &MusicForm) -> AppResult<UpdateMusic> {
    let mut errors = FieldErrors::new();
    let mut changes = UpdateMusic {
        title: form.non_blank(FIELD_TITLE).map(str::to_string),
        artist: form.non_blank(FIELD_ARTIST).map(str::to_string),
        file_url: form.non_blank(FIELD_FILE_URL).map(str::to_string),
        thumbnail_url: form.non_blank(FIELD_THUMBNAIL_URL).map(str::to_string),
        ..Default::default()
    };

    if let Some(raw) = form.non_blank(FIELD_CATEGORY) {
        changes.category_id = errors.check(parse_id(FIELD_CATEGORY, raw));
    }
    if let Some(raw) = form.non_blank(FIELD_CATEGORY_TYPE) {
        changes.category_type_id = errors.check(parse_id(FIELD_CATEGORY_TYPE, raw));
    }
    if let Some(raw) = form.non_blank(FIELD_DURATION) {
        changes.duration = errors.check(parse_duration(raw));
    }
    if let Some(raw) = form.non_blank(FIELD_RELEASE_DATE) {
        changes.release_date = errors.check(parse_release_date(raw));
    }
    if let Some(raw) = form.text(FIELD_DESCRIPTION) {
        changes.description = errors.check(clean_description(raw));
    }

    errors.finish()?;
    Ok(changes)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/music
///
/// List every record with its category and type expanded.
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let music = MusicRepo::list_detailed(&state.pool).await?;
    Ok(Json(DataResponse { data: music }))
}

/// GET /api/music/category/{category_id}
///
/// 400 for a malformed id, 404 when the category has no music.
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let category_id = path_id("categoryId", &category_id)?;
    let music = MusicRepo::list_detailed_by_category(&state.pool, category_id).await?;
    if music.is_empty() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Music for category",
            id: category_id,
        }));
    }
    Ok(Json(DataResponse { data: music }))
}

/// GET /api/music/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = path_id("id", &id)?;
    let music = load_detail(&state, id).await?;
    Ok(Json(DataResponse { data: music }))
}

/// POST /api/music/create
///
/// Multipart form with `title`, `artist`, `category`, `categoryType`,
/// `duration`, `releaseDate`, `file` (required) and `description`,
/// `thumbnail` (optional). Files are only written once the form validates.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MusicForm::read(multipart).await?;
    let fields = validate_create_form(&form)?;

    let type_ids = match CategoryRepo::find_by_id(&state.pool, fields.category_id).await? {
        Some(_) => CategoryRepo::list_type_ids(&state.pool, fields.category_id).await?,
        None => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "{FIELD_CATEGORY} {} does not exist",
                fields.category_id
            ))))
        }
    };
    ensure_type_belongs(fields.category_id, fields.category_type_id, &type_ids)?;

    let file = form
        .file
        .take()
        .ok_or_else(|| CoreError::MissingFields(vec![FIELD_FILE.to_string()]))?;
    let audio = store_upload(&state.assets, &file).await?;
    let thumbnail = match form.thumbnail.take() {
        Some(upload) => match store_upload(&state.assets, &upload).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                discard_uploads(&state.assets, &[Some(&audio)]).await;
                return Err(e);
            }
        },
        None => None,
    };

    let input = CreateMusic {
        title: fields.title,
        artist: fields.artist,
        category_id: fields.category_id,
        category_type_id: fields.category_type_id,
        duration: fields.duration,
        release_date: fields.release_date,
        description: fields.description,
        file_url: Some(audio.url.clone()),
        thumbnail_url: thumbnail.as_ref().map(|t| t.url.clone()),
        user_id: Some(admin.user_id),
    };

    let music = match MusicRepo::create(&state.pool, &input).await {
        Ok(music) => music,
        Err(e) => {
            discard_uploads(&state.assets, &[Some(&audio), thumbnail.as_ref()]).await;
            return Err(e.into());
        }
    };

    tracing::info!(music_id = music.id, user_id = admin.user_id, "Music record created");

    let detail = load_detail(&state, music.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// PUT /api/music/{id}
///
/// Partial update from a multipart form. `fileUrl` / `thumbnailUrl` text
/// fields overwrite the stored URL without touching any file. An uploaded
/// `file` / `thumbnail` replaces the stored one and the previous file is
/// deleted once the record update has committed.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let id = path_id("id", &id)?;
    let existing = MusicRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Music",
            id,
        }))?;

    let mut form = MusicForm::read(multipart).await?;
    let mut changes = build_update(&form)?;

    let new_audio = match form.file.take() {
        Some(upload) => Some(store_upload(&state.assets, &upload).await?),
        None => None,
    };
    let new_thumbnail = match form.thumbnail.take() {
        Some(upload) => match store_upload(&state.assets, &upload).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                discard_uploads(&state.assets, &[new_audio.as_ref()]).await;
                return Err(e);
            }
        },
        None => None,
    };

    // An upload wins over a raw URL for the same slot.
    if let Some(asset) = &new_audio {
        changes.file_url = Some(asset.url.clone());
    }
    if let Some(asset) = &new_thumbnail {
        changes.thumbnail_url = Some(asset.url.clone());
    }

    let updated = match MusicRepo::update(&state.pool, id, &changes).await {
        Ok(Some(music)) => music,
        Ok(None) => {
            discard_uploads(&state.assets, &[new_audio.as_ref(), new_thumbnail.as_ref()]).await;
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Music",
                id,
            }));
        }
        Err(e) => {
            discard_uploads(&state.assets, &[new_audio.as_ref(), new_thumbnail.as_ref()]).await;
            return Err(e.into());
        }
    };

    // The record now points at the new files; the old ones can go.
    if new_audio.is_some() {
        if let Some(old) = existing.file_url.as_deref() {
            if updated.file_url.as_deref() != Some(old) {
                remove_asset(&state.assets, old, Some(id)).await;
            }
        }
    }
    if new_thumbnail.is_some() {
        if let Some(old) = existing.thumbnail_url.as_deref() {
            if updated.thumbnail_url.as_deref() != Some(old) {
                remove_asset(&state.assets, old, Some(id)).await;
            }
        }
    }

    tracing::info!(music_id = id, user_id = admin.user_id, "Music record updated");

    let detail = load_detail(&state, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /api/music/{id}
///
/// Removes the record, then its audio and thumbnail files (best effort).
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = path_id("id", &id)?;
    let removed = MusicRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Music",
            id,
        }))?;

    for url in [removed.file_url.as_deref(), removed.thumbnail_url.as_deref()]
        .into_iter()
        .flatten()
    {
        remove_asset(&state.assets, url, Some(id)).await;
    }

    tracing::info!(music_id = id, user_id = admin.user_id, "Music record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/music/upload
///
/// Store a single file ahead of a create call. Accepts `file` and/or
/// `thumbnail`; when both are sent only the audio is stored.
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MusicForm::read(multipart).await?;

    let (file, kind) = match (form.file.take(), form.thumbnail.take()) {
        (Some(file), _) => (file, UploadKind::Audio),
        (None, Some(thumbnail)) => (thumbnail, UploadKind::Thumbnail),
        (None, None) => {
            return Err(AppError::BadRequest(
                "No file uploaded. Send a 'file' or 'thumbnail' field".into(),
            ))
        }
    };

    let asset = store_upload(&state.assets, &file).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UploadResponse {
                url: asset.url,
                filename: asset.filename,
                kind,
            },
        }),
    ))
}

/// POST /api/music/update-urls
///
/// Rewrite stored absolute URLs from the configured old base URL to the new
/// one. Configuration comes from startup, never from the request.
pub async fn update_urls(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<impl IntoResponse> {
    let rule = state.config.migration.rewrite_rule()?;
    tracing::info!(
        user_id = admin.user_id,
        old_base = rule.old_base(),
        new_base = rule.new_base(),
        "Starting URL migration"
    );
    let report = url_migration::run(&state.pool, &rule).await?;
    Ok(Json(DataResponse { data: report }))
}
