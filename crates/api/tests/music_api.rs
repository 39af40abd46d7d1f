mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, full_music_form, seed_category, MultipartBuilder, TestApp};
use sqlx::PgPool;

async fn create_music(app: &TestApp, form: MultipartBuilder) -> serde_json::Value {
    let response = app
        .post_multipart("/api/music/create", Some(&app.admin_token()), form)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_stores_file_and_returns_expanded_record(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Lofi", &["Chill", "Study"]).await;

    let form = full_music_form(&category, "Night Drive")
        .text("description", "<p>Late &amp; slow</p>")
        .thumbnail("cover.JPG", b"jpeg-bytes");
    let music = create_music(&app, form).await;

    assert_eq!(music["title"], "Night Drive");
    assert_eq!(music["artist"], "Test Artist");
    assert_eq!(music["duration"], 212.5);
    assert_eq!(music["releaseDate"], "2024-03-15");
    assert_eq!(music["description"], "Late & slow");
    assert_eq!(music["category"]["name"], "Lofi");
    assert_eq!(music["categoryType"]["name"], "Chill");
    assert_eq!(music["userId"], common::ADMIN_ID);

    let file_url = music["fileUrl"].as_str().unwrap();
    assert!(file_url.starts_with("/uploads/"));
    assert!(file_url.ends_with(".mp3"));
    assert_eq!(
        std::fs::read(app.path_for_url(file_url)).unwrap(),
        b"ID3-audio-bytes"
    );

    let thumbnail_url = music["thumbnailUrl"].as_str().unwrap();
    assert!(thumbnail_url.ends_with(".jpg"));
    assert!(app.path_for_url(thumbnail_url).exists());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_reports_missing_fields_in_order(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Jazz", &["Bebop"]).await;

    let form = MultipartBuilder::new()
        .text("title", "   ")
        .text("artist", "Someone")
        .text("category", &category.category.id.to_string())
        .text("categoryType", &category.types[0].id.to_string())
        .text("releaseDate", "2024-01-01")
        .audio("a.mp3", b"audio");
    let response = app
        .post_multipart("/api/music/create", Some(&app.admin_token()), form)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["missing"], serde_json::json!(["title", "duration"]));
    assert_eq!(app.stored_file_count(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_without_file_is_missing_file(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Jazz", &["Bebop"]).await;

    let form = MultipartBuilder::new()
        .text("title", "Untitled")
        .text("artist", "Someone")
        .text("category", &category.category.id.to_string())
        .text("categoryType", &category.types[0].id.to_string())
        .text("duration", "10")
        .text("releaseDate", "2024-01-01")
        // An empty file part counts as absent.
        .audio("empty.mp3", b"");
    let response = app
        .post_multipart("/api/music/create", Some(&app.admin_token()), form)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["missing"], serde_json::json!(["file"]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_description_length_boundary(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Ambient", &["Drone"]).await;

    let at_limit = "a".repeat(1000);
    let music = create_music(
        &app,
        full_music_form(&category, "Long").text("description", &at_limit),
    )
    .await;
    assert_eq!(music["description"].as_str().unwrap().chars().count(), 1000);

    let over_limit = "a".repeat(1001);
    let response = app
        .post_multipart(
            "/api/music/create",
            Some(&app.admin_token()),
            full_music_form(&category, "Too Long").text("description", &over_limit),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["errors"][0].as_str().unwrap().contains("description"));

    // Only the first record's audio is on disk.
    assert_eq!(app.stored_file_count(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_malformed_values(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Rock", &["Indie"]).await;

    let form = MultipartBuilder::new()
        .text("title", "Bad")
        .text("artist", "Band")
        .text("category", "abc")
        .text("categoryType", &category.types[0].id.to_string())
        .text("duration", "-3")
        .text("releaseDate", "15/03/2024")
        .audio("a.mp3", b"audio");
    let response = app
        .post_multipart("/api/music/create", Some(&app.admin_token()), form)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"].as_array().unwrap().len(), 3);
    assert_eq!(app.stored_file_count(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_type_from_another_category(pool: PgPool) {
    let app = TestApp::new(pool);
    let rock = seed_category(&app.pool, "Rock", &["Indie"]).await;
    let jazz = seed_category(&app.pool, "Jazz", &["Bebop"]).await;

    let form = MultipartBuilder::new()
        .text("title", "Mismatch")
        .text("artist", "Band")
        .text("category", &rock.category.id.to_string())
        .text("categoryType", &jazz.types[0].id.to_string())
        .text("duration", "100")
        .text("releaseDate", "2024-01-01")
        .audio("a.mp3", b"audio");
    let response = app
        .post_multipart("/api/music/create", Some(&app.admin_token()), form)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.stored_file_count(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_unknown_category(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Rock", &["Indie"]).await;

    let form = MultipartBuilder::new()
        .text("title", "Ghost")
        .text("artist", "Band")
        .text("category", "999999")
        .text("categoryType", &category.types[0].id.to_string())
        .text("duration", "100")
        .text("releaseDate", "2024-01-01")
        .audio("a.mp3", b"audio");
    let response = app
        .post_multipart("/api/music/create", Some(&app.admin_token()), form)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn mutations_require_admin(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Pop", &["Synth"]).await;

    let response = app
        .post_multipart("/api/music/create", None, full_music_form(&category, "x"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_multipart(
            "/api/music/create",
            Some(&app.user_token()),
            full_music_form(&category, "x"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.delete("/api/music/1", &app.user_token()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(app.stored_file_count(), 0);
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn get_by_id_and_not_found(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Folk", &["Acoustic"]).await;
    let music = create_music(&app, full_music_form(&category, "Campfire")).await;
    let id = music["id"].as_i64().unwrap();

    let response = app.get(&format!("/api/music/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["title"], "Campfire");

    let response = app.get("/api/music/424242").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = app.get("/api/music/not-a-number").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_returns_newest_first(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Soul", &["Motown"]).await;
    create_music(&app, full_music_form(&category, "First")).await;
    create_music(&app, full_music_form(&category, "Second")).await;

    let response = app.get("/api/music").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let titles: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_by_category_validates_and_filters(pool: PgPool) {
    let app = TestApp::new(pool);
    let house = seed_category(&app.pool, "House", &["Deep"]).await;
    let empty = seed_category(&app.pool, "Empty", &["Nothing"]).await;
    create_music(&app, full_music_form(&house, "Groove")).await;

    let response = app.get("/api/music/category/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .get(&format!("/api/music/category/{}", empty.category.id))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .get(&format!("/api/music/category/{}", house.category.id))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["category"]["name"], "House");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deleted_category_degrades_to_null(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Temporary", &["Gone"]).await;
    create_music(&app, full_music_form(&category, "Survivor")).await;

    let response = app
        .delete(
            &format!("/api/categories/{}", category.category.id),
            &app.admin_token(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(app.get("/api/music").await).await;
    let record = &json["data"][0];
    assert_eq!(record["title"], "Survivor");
    assert!(record["category"].is_null());
    assert!(record["categoryType"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn stored_audio_is_served_with_range_support(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Blues", &["Delta"]).await;
    let music = create_music(&app, full_music_form(&category, "Crossroads")).await;
    let file_url = music["fileUrl"].as_str().unwrap();

    let response = app.get(file_url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ID3-audio-bytes");

    let response = app.get_with_header(file_url, "range", "bytes=0-2").await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_bytes(response).await, b"ID3");
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn update_with_new_file_replaces_old_file(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Metal", &["Doom"]).await;
    let music = create_music(
        &app,
        full_music_form(&category, "Heavy").thumbnail("cover.png", b"png"),
    )
    .await;
    let id = music["id"].as_i64().unwrap();
    let old_file = app.path_for_url(music["fileUrl"].as_str().unwrap());
    let old_thumbnail = app.path_for_url(music["thumbnailUrl"].as_str().unwrap());

    let form = MultipartBuilder::new()
        .text("title", "Heavier")
        .audio("remaster.mp3", b"new-audio");
    let response = app
        .put_multipart(&format!("/api/music/{id}"), &app.admin_token(), form)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();

    assert_eq!(updated["title"], "Heavier");
    assert_eq!(updated["artist"], "Test Artist");
    assert_ne!(updated["fileUrl"], music["fileUrl"]);
    assert_eq!(updated["thumbnailUrl"], music["thumbnailUrl"]);

    assert!(!old_file.exists());
    assert!(old_thumbnail.exists());
    let new_file = app.path_for_url(updated["fileUrl"].as_str().unwrap());
    assert_eq!(std::fs::read(new_file).unwrap(), b"new-audio");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_with_raw_url_leaves_files_alone(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Reggae", &["Dub"]).await;
    let music = create_music(&app, full_music_form(&category, "Echo")).await;
    let id = music["id"].as_i64().unwrap();
    let old_file = app.path_for_url(music["fileUrl"].as_str().unwrap());

    let form = MultipartBuilder::new().text("fileUrl", "https://cdn.example.com/echo.mp3");
    let response = app
        .put_multipart(&format!("/api/music/{id}"), &app.admin_token(), form)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();

    assert_eq!(updated["fileUrl"], "https://cdn.example.com/echo.mp3");
    assert!(old_file.exists());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_clears_description_and_rejects_bad_values(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Classical", &["Baroque"]).await;
    let music = create_music(
        &app,
        full_music_form(&category, "Fugue").text("description", "Counterpoint"),
    )
    .await;
    let id = music["id"].as_i64().unwrap();
    let uri = format!("/api/music/{id}");

    let response = app
        .put_multipart(
            &uri,
            &app.admin_token(),
            MultipartBuilder::new().text("description", "  "),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["description"].is_null());

    let response = app
        .put_multipart(
            &uri,
            &app.admin_token(),
            MultipartBuilder::new()
                .text("title", "Renamed")
                .text("duration", "NaN"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The failed update changed nothing.
    let json = body_json(app.get(&uri).await).await;
    assert_eq!(json["data"]["title"], "Fugue");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_missing_record_is_404_and_stores_nothing(pool: PgPool) {
    let app = TestApp::new(pool);

    let response = app
        .put_multipart(
            "/api/music/31337",
            &app.admin_token(),
            MultipartBuilder::new().audio("a.mp3", b"audio"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.stored_file_count(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_with_unknown_category_is_400_and_discards_upload(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Trance", &["Uplifting"]).await;
    let music = create_music(&app, full_music_form(&category, "Anthem")).await;
    let id = music["id"].as_i64().unwrap();
    let uri = format!("/api/music/{id}");
    assert_eq!(app.stored_file_count(), 1);

    let form = MultipartBuilder::new()
        .text("category", "999999")
        .thumbnail("cover.png", b"png");
    let response = app.put_multipart(&uri, &app.admin_token(), form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);

    // The replacement thumbnail was removed again; the record is unchanged.
    assert_eq!(app.stored_file_count(), 1);
    let json = body_json(app.get(&uri).await).await;
    assert_eq!(json["data"]["category"]["name"], "Trance");
    assert!(json["data"]["thumbnailUrl"].is_null());
    assert!(app.path_for_url(music["fileUrl"].as_str().unwrap()).exists());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_with_new_thumbnail_replaces_old_thumbnail(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Garage", &["UK"]).await;
    let music = create_music(
        &app,
        full_music_form(&category, "Two Step").thumbnail("cover.png", b"old-png"),
    )
    .await;
    let id = music["id"].as_i64().unwrap();
    let old_thumbnail = app.path_for_url(music["thumbnailUrl"].as_str().unwrap());
    let audio = app.path_for_url(music["fileUrl"].as_str().unwrap());

    let response = app
        .put_multipart(
            &format!("/api/music/{id}"),
            &app.admin_token(),
            MultipartBuilder::new().thumbnail("fresh.webp", b"new-webp"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();

    let new_url = updated["thumbnailUrl"].as_str().unwrap();
    assert_ne!(updated["thumbnailUrl"], music["thumbnailUrl"]);
    assert!(new_url.ends_with(".webp"));
    assert_eq!(std::fs::read(app.path_for_url(new_url)).unwrap(), b"new-webp");
    assert!(!old_thumbnail.exists());
    assert!(audio.exists());
    assert_eq!(app.stored_file_count(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_replacing_unsafe_thumbnail_url_skips_cleanup(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Grime", &["Eskibeat"]).await;
    let music = create_music(&app, full_music_form(&category, "Pulse")).await;
    let id = music["id"].as_i64().unwrap();
    let uri = format!("/api/music/{id}");

    let response = app
        .put_multipart(
            &uri,
            &app.admin_token(),
            MultipartBuilder::new().text("thumbnailUrl", "/uploads/cover%20art.png"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .put_multipart(
            &uri,
            &app.admin_token(),
            MultipartBuilder::new().thumbnail("cover.jpg", b"jpeg"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();

    let new_url = updated["thumbnailUrl"].as_str().unwrap();
    assert!(new_url.starts_with("/uploads/"));
    assert_ne!(new_url, "/uploads/cover%20art.png");
    assert_eq!(std::fs::read(app.path_for_url(new_url)).unwrap(), b"jpeg");
    assert_eq!(app.stored_file_count(), 2);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_removes_record_and_files(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Funk", &["Slap"]).await;
    let music = create_music(
        &app,
        full_music_form(&category, "Bassline").thumbnail("cover.webp", b"webp"),
    )
    .await;
    let id = music["id"].as_i64().unwrap();
    assert_eq!(app.stored_file_count(), 2);

    let response = app
        .delete(&format!("/api/music/{id}"), &app.admin_token())
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.stored_file_count(), 0);

    let response = app.get(&format!("/api/music/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .delete(&format!("/api/music/{id}"), &app.admin_token())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_with_unsafe_stored_url_still_removes_record(pool: PgPool) {
    let app = TestApp::new(pool);
    let category = seed_category(&app.pool, "Noise", &["Harsh"]).await;
    let music = create_music(&app, full_music_form(&category, "Static")).await;
    let id = music["id"].as_i64().unwrap();

    let response = app
        .put_multipart(
            &format!("/api/music/{id}"),
            &app.admin_token(),
            MultipartBuilder::new().text("thumbnailUrl", "/uploads/cover%20art.png"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .delete(&format!("/api/music/{id}"), &app.admin_token())
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.stored_file_count(), 0);
}

// ---------------------------------------------------------------------------
// Upload helper
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_prefers_audio_and_requires_a_file(pool: PgPool) {
    let app = TestApp::new(pool);

    let response = app
        .post_multipart(
            "/api/music/upload",
            Some(&app.admin_token()),
            MultipartBuilder::new()
                .audio("track.flac", b"flac")
                .thumbnail("cover.png", b"png"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["kind"], "audio");
    let filename = json["data"]["filename"].as_str().unwrap();
    assert!(filename.ends_with(".flac"));
    assert_eq!(json["data"]["url"], format!("/uploads/{filename}"));
    assert_eq!(app.stored_file_count(), 1);

    let response = app
        .post_multipart(
            "/api/music/upload",
            Some(&app.admin_token()),
            MultipartBuilder::new().thumbnail("cover.png", b"png"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["kind"], "thumbnail");

    let response = app
        .post_multipart(
            "/api/music/upload",
            Some(&app.admin_token()),
            MultipartBuilder::new().text("title", "no file"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
