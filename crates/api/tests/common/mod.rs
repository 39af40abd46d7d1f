//! Shared helpers for HTTP-level integration tests.
//!
//! Requests go straight to the router via `tower::ServiceExt::oneshot`, with
//! no TCP listener. Each [`TestApp`] owns a temporary upload directory.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use soundvault_core::assets::AssetStore;
use soundvault_core::roles::ROLE_ADMIN;
use soundvault_db::models::category::{CategoryWithTypes, CreateCategory, CreateCategoryType};
use soundvault_db::repositories::CategoryRepo;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use soundvault_api::auth::jwt::JwtConfig;
use soundvault_api::config::{MigrationConfig, ServerConfig};
use soundvault_api::router::build_app_router;
use soundvault_api::state::AppState;

pub const ADMIN_ID: i64 = 7;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(upload_dir: PathBuf, migration: MigrationConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir,
        max_upload_bytes: 10 * 1024 * 1024,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            ttl_mins: 15,
        },
        migration,
    }
}

/// A database pool plus a private upload directory.
pub struct TestApp {
    pub pool: PgPool,
    pub config: ServerConfig,
    upload_dir: TempDir,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        Self::with_migration(pool, MigrationConfig::default())
    }

    pub fn with_migration(pool: PgPool, migration: MigrationConfig) -> Self {
        let upload_dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(upload_dir.path().join("uploads"), migration);
        Self {
            pool,
            config,
            upload_dir,
        }
    }

    /// A fresh router sharing this app's pool and upload directory.
    pub fn router(&self) -> Router {
        let state = AppState {
            pool: self.pool.clone(),
            config: Arc::new(self.config.clone()),
            assets: Arc::new(AssetStore::new(self.config.upload_dir.clone())),
        };
        build_app_router(state, &self.config)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    /// On-disk path for a stored `/uploads/<name>` URL.
    pub fn path_for_url(&self, url: &str) -> PathBuf {
        let name = url.rsplit('/').next().expect("url has a final segment");
        self.upload_dir().join(name)
    }

    /// Number of files currently in the upload directory.
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn admin_token(&self) -> String {
        self.config.jwt.issue(ADMIN_ID, ROLE_ADMIN).expect("token")
    }

    pub fn user_token(&self) -> String {
        self.config.jwt.issue(ADMIN_ID + 1, "user").expect("token")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_header(&self, uri: &str, name: &str, value: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header(name, value)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(
            Request::delete(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_empty(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        token: Option<&str>,
        form: MultipartBuilder,
    ) -> Response<Body> {
        self.send_multipart("POST", uri, token, form).await
    }

    pub async fn put_multipart(&self, uri: &str, token: &str, form: MultipartBuilder) -> Response<Body> {
        self.send_multipart("PUT", uri, Some(token), form).await
    }

    async fn send_multipart(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        form: MultipartBuilder,
    ) -> Response<Body> {
        let (content_type, body) = form.build();
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Minimal `multipart/form-data` encoder.
pub struct MultipartBuilder {
    boundary: &'static str,
    body: Vec<u8>,
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self {
            boundary: "soundvault-test-boundary-7MA4YWxkTrZu0gW",
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn audio(self, filename: &str, bytes: &[u8]) -> Self {
        self.file("file", filename, "audio/mpeg", bytes)
    }

    pub fn thumbnail(self, filename: &str, bytes: &[u8]) -> Self {
        self.file("thumbnail", filename, "image/jpeg", bytes)
    }

    pub fn build(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

/// Insert a category with the given type names.
pub async fn seed_category(pool: &PgPool, name: &str, types: &[&str]) -> CategoryWithTypes {
    CategoryRepo::create(
        pool,
        &CreateCategory {
            name: name.to_string(),
            description: None,
            types: types
                .iter()
                .map(|t| CreateCategoryType {
                    name: t.to_string(),
                    description: None,
                })
                .collect(),
        },
    )
    .await
    .expect("seed category")
}

/// A complete create form (text fields + audio) for the given category.
pub fn full_music_form(category: &CategoryWithTypes, title: &str) -> MultipartBuilder {
    MultipartBuilder::new()
        .text("title", title)
        .text("artist", "Test Artist")
        .text("category", &category.category.id.to_string())
        .text("categoryType", &category.types[0].id.to_string())
        .text("duration", "212.5")
        .text("releaseDate", "2024-03-15")
        .audio("song.mp3", b"ID3-audio-bytes")
}
