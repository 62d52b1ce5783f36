//! Output directory resolution.

use atelier_core::{AspectRatio, ImageToolError, OrganizeBy, Quality, ToolResult};
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Labels the organize-by modes draw on.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryContext {
    pub now: DateTime<Utc>,
    pub aspect_ratio: Option<AspectRatio>,
    pub quality: Option<Quality>,
}

impl DirectoryContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            aspect_ratio: None,
            quality: None,
        }
    }
}

/// Map a base directory and organize-by mode to the concrete target directory.
///
/// Pure path computation; call [`ensure_directory`] before writing.
pub fn resolve_directory(
    base: &Path,
    organize_by: OrganizeBy,
    context: &DirectoryContext,
) -> ToolResult<PathBuf> {
    validate_base_directory(base)?;

    let dir = match organize_by {
        OrganizeBy::None => base.to_path_buf(),
        OrganizeBy::Date => base.join(context.now.format("%Y-%m-%d").to_string()),
        OrganizeBy::DimensionRatio => {
            let ratio = context.aspect_ratio.ok_or_else(|| {
                ImageToolError::InvalidOption(
                    "organizeBy=dimensionRatio requires an aspect ratio".to_string(),
                )
            })?;
            base.join(ratio.label())
        }
        OrganizeBy::Quality => {
            let quality = context.quality.ok_or_else(|| {
                ImageToolError::InvalidOption(
                    "organizeBy=quality requires a quality setting".to_string(),
                )
            })?;
            base.join(quality.label())
        }
    };

    Ok(dir)
}

/// Reject base directories that climb with `..` segments.
pub fn validate_base_directory(base: &Path) -> ToolResult<()> {
    if base.as_os_str().is_empty() {
        return Err(ImageToolError::Validation(
            "Output directory must not be empty".to_string(),
        ));
    }
    if base.components().any(|c| c == Component::ParentDir) {
        return Err(ImageToolError::Validation(format!(
            "Output directory must not contain '..': {}",
            base.display()
        )));
    }
    Ok(())
}

/// Create `path` and any missing parents.
pub async fn ensure_directory(path: &Path) -> ToolResult<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| ImageToolError::Directory {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    tracing::debug!(path = %path.display(), "Output directory ready");
    Ok(())
}
