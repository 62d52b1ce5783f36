use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::options::{ConflictStrategy, NamingStrategy, OrganizeBy};

/// Output-shaping intent for a single save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutputRequest {
    pub save: bool,
    /// Base directory; the configured default applies when `None`.
    pub output_directory: Option<PathBuf>,
    /// Caller-supplied filename; bypasses the naming strategy.
    pub filename: Option<String>,
    /// Prefix for the `custom` and `timestamp` strategies.
    pub prefix: Option<String>,
    pub naming_strategy: NamingStrategy,
    pub organize_by: OrganizeBy,
    pub conflict_strategy: ConflictStrategy,
}

impl Default for FileOutputRequest {
    fn default() -> Self {
        Self {
            save: true,
            output_directory: None,
            filename: None,
            prefix: None,
            naming_strategy: NamingStrategy::default(),
            organize_by: OrganizeBy::default(),
            conflict_strategy: ConflictStrategy::default(),
        }
    }
}

/// Result of a successful persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedImage {
    pub local_path: PathBuf,
    pub filename: String,
    pub directory: PathBuf,
    pub size_bytes: u64,
    pub format: String,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Structured result of a generate or edit call.
///
/// `inline_data` is only present when its estimated serialized cost stays
/// under the configured ceiling; otherwise `warnings` explains the omission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_image: Option<SavedImage>,
    pub metadata: ImageMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
    pub estimated_tokens: u64,
    pub warnings: Vec<String>,
}
