//! One-shot URL migration.
//!
//! Rewrites stored asset URLs from `OLD_BASE_URL` to `NEW_BASE_URL` (or
//! `PRODUCTION_URL`) and prints the report as JSON. Same logic as
//! `POST /api/music/update-urls`, for use from deploy scripts.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soundvault_api::config::MigrationConfig;
use soundvault_api::url_migration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soundvault_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rule = MigrationConfig::from_env()
        .rewrite_rule()
        .context("invalid migration configuration")?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = soundvault_db::create_pool(&database_url)
        .await
        .context("failed to connect to database")?;

    let report = url_migration::run(&pool, &rule)
        .await
        .context("URL migration failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
