//! Filename conflict resolution.

use atelier_core::constants::MAX_RENAME_ATTEMPTS;
use atelier_core::{ConflictStrategy, ImageToolError, ToolResult};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Resolve the final path for `candidate` under `strategy`.
///
/// - `Overwrite` returns the candidate unchanged.
/// - `Skip` fails with `FileExists` when the candidate is taken.
/// - `AutoRename` returns the candidate if free, otherwise
///   `{stem}_{counter:03}_{epoch_ms}.{ext}` for the first free counter,
///   giving up after a bounded number of attempts.
pub async fn resolve_conflict(candidate: &Path, strategy: ConflictStrategy) -> ToolResult<PathBuf> {
    match strategy {
        ConflictStrategy::Overwrite => Ok(candidate.to_path_buf()),
        ConflictStrategy::Skip => {
            if path_exists(candidate).await? {
                return Err(ImageToolError::FileExists(candidate.to_path_buf()));
            }
            Ok(candidate.to_path_buf())
        }
        ConflictStrategy::AutoRename => {
            if !path_exists(candidate).await? {
                return Ok(candidate.to_path_buf());
            }

            for counter in 1..=MAX_RENAME_ATTEMPTS {
                let renamed = renamed_candidate(candidate, counter, Utc::now().timestamp_millis());
                if !path_exists(&renamed).await? {
                    tracing::debug!(
                        original = %candidate.display(),
                        renamed = %renamed.display(),
                        attempts = counter,
                        "Resolved filename conflict"
                    );
                    return Ok(renamed);
                }
            }

            Err(ImageToolError::filesystem(
                candidate,
                format!(
                    "no free filename after {} rename attempts",
                    MAX_RENAME_ATTEMPTS
                ),
            ))
        }
    }
}

fn renamed_candidate(candidate: &Path, counter: u32, epoch_ms: i64) -> PathBuf {
    let stem = candidate
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let name = match candidate.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{:03}_{}.{}", stem, counter, epoch_ms, ext),
        None => format!("{}_{:03}_{}", stem, counter, epoch_ms),
    };
    candidate.with_file_name(name)
}

async fn path_exists(path: &Path) -> ToolResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| ImageToolError::filesystem(path, e))
}
