//! Retention cleanup for saved output.

use crate::formats::format_from_path;
use atelier_core::{ImageToolError, ToolResult};
use chrono::{Duration as ChronoDuration, Utc};
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

/// Delete image files directly under `base` older than `retention_days`.
///
/// Returns the number of files removed. A missing `base` directory,
/// `retention_days == 0` and a window reaching past the representable
/// range all remove nothing.
pub async fn cleanup_old_files(base: &Path, retention_days: u32) -> ToolResult<usize> {
    if retention_days == 0 {
        return Ok(0);
    }

    let Some(cutoff) = ChronoDuration::try_days(i64::from(retention_days))
        .and_then(|window| Utc::now().checked_sub_signed(window))
    else {
        tracing::warn!(retention_days, "Retention window out of range, skipping cleanup");
        return Ok(0);
    };
    cleanup_before(base, SystemTime::from(cutoff)).await
}

/// Delete image files directly under `base` last modified before `cutoff`.
///
/// Only files with an image extension are candidates. Subdirectories and
/// their contents are left alone. Files that vanish or cannot be removed
/// mid-scan are logged and skipped.
pub async fn cleanup_before(base: &Path, cutoff: SystemTime) -> ToolResult<usize> {
    let mut entries = match fs::read_dir(base).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(ImageToolError::filesystem(base, e)),
    };

    let mut removed = 0usize;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ImageToolError::filesystem(base, e))?
    {
        let path = entry.path();
        if format_from_path(&path).is_none() {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !metadata.is_file() {
            continue;
        }

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(_) => continue,
        };

        if modified >= cutoff {
            continue;
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                removed += 1;
                tracing::debug!(path = %path.display(), "Removed expired file");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired file");
            }
        }
    }

    if removed > 0 {
        tracing::info!(
            directory = %base.display(),
            removed_count = removed,
            "Retention cleanup completed"
        );
    }

    Ok(removed)
}
