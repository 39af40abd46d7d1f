use std::path::PathBuf;

use soundvault_core::error::CoreError;
use soundvault_core::url_migration::BaseUrlRewrite;

use crate::auth::jwt::JwtConfig;

/// Default maximum request body size for uploads (100 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory holding uploaded assets, served at `/uploads`.
    pub upload_dir: PathBuf,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// JWT verification settings.
    pub jwt: JwtConfig,
    /// Base URLs for the asset URL migration.
    pub migration: MigrationConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `UPLOAD_DIR`           | `uploads`                  |
    /// | `MAX_UPLOAD_BYTES`     | `104857600`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
        );

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_dir,
            max_upload_bytes,
            jwt: JwtConfig::from_env(),
            migration: MigrationConfig::from_env(),
        }
    }
}

/// Old and new public base URLs for rewriting stored asset URLs.
///
/// Resolved once at startup; the migration endpoint never reads the
/// environment itself.
#[derive(Debug, Clone, Default)]
pub struct MigrationConfig {
    pub old_base_url: Option<String>,
    pub new_base_url: Option<String>,
}

impl MigrationConfig {
    /// | Env Var          | Notes                                   |
    /// |------------------|-----------------------------------------|
    /// | `OLD_BASE_URL`   | base currently stored in records        |
    /// | `NEW_BASE_URL`   | replacement base                        |
    /// | `PRODUCTION_URL` | fallback for `NEW_BASE_URL`             |
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            old_base_url: non_empty("OLD_BASE_URL"),
            new_base_url: non_empty("NEW_BASE_URL").or_else(|| non_empty("PRODUCTION_URL")),
        }
    }

    /// Build the rewrite rule, failing with a validation error if either base
    /// URL is unset.
    pub fn rewrite_rule(&self) -> Result<BaseUrlRewrite, CoreError> {
        match (&self.old_base_url, &self.new_base_url) {
            (Some(old), Some(new)) => BaseUrlRewrite::new(old, new),
            _ => Err(CoreError::Validation(
                "URL migration is not configured: set OLD_BASE_URL and NEW_BASE_URL \
                 (or PRODUCTION_URL)"
                    .into(),
            )),
        }
    }
}
