//! Batch rewrite of stored asset URLs after a hosting change.
//!
//! Records are processed one at a time, each update awaited before the next.
//! The run is not atomic: an interrupted run leaves some records migrated,
//! and re-running finishes the rest because migrated records no longer
//! contain the old host.

use serde::Serialize;
use soundvault_core::url_migration::BaseUrlRewrite;
use soundvault_db::repositories::MusicRepo;
use soundvault_db::DbPool;

/// Outcome of one migration run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Records whose file or thumbnail URL contained the old host.
    pub scanned: u64,
    /// Records actually modified.
    pub updated: u64,
    pub old_base_url: String,
    pub new_base_url: String,
}

/// Rewrite every record whose URLs reference the old base.
pub async fn run(pool: &DbPool, rule: &BaseUrlRewrite) -> Result<MigrationReport, sqlx::Error> {
    let candidates = MusicRepo::list_urls_containing(pool, rule.old_host()).await?;

    let mut report = MigrationReport {
        scanned: candidates.len() as u64,
        updated: 0,
        old_base_url: rule.old_base().to_string(),
        new_base_url: rule.new_base().to_string(),
    };

    for record in candidates {
        let file_url = rule.rewrite_opt(record.file_url.as_deref());
        let thumbnail_url = rule.rewrite_opt(record.thumbnail_url.as_deref());
        if file_url.is_none() && thumbnail_url.is_none() {
            continue;
        }

        if MusicRepo::update_urls(pool, record.id, file_url.as_deref(), thumbnail_url.as_deref())
            .await?
        {
            report.updated += 1;
            tracing::debug!(music_id = record.id, ?file_url, ?thumbnail_url, "Rewrote URLs");
        }
    }

    tracing::info!(
        scanned = report.scanned,
        updated = report.updated,
        old_base = %report.old_base_url,
        new_base = %report.new_base_url,
        "URL migration finished"
    );
    Ok(report)
}
