use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::output::SavedImage;
use crate::constants::DEFAULT_BATCH_CONCURRENCY;

/// Policy applied when a batch item fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ErrorHandling {
    /// Stop scheduling new chunks once a chunk reports a failure
    FailFast,
    /// Record failures and keep going
    #[default]
    ContinueOnError,
    /// Keep going, then re-run failed items once
    RetryFailed,
}

/// Execution settings for the batch orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    pub parallel: bool,
    pub max_concurrent: usize,
    pub error_handling: ErrorHandling,
    /// Courtesy pause between chunks.
    pub chunk_delay: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            max_concurrent: DEFAULT_BATCH_CONCURRENCY,
            error_handling: ErrorHandling::default(),
            chunk_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub index: usize,
    pub original_ref: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_image: Option<SavedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Aggregate of a batch run. `succeeded + failed == total == items.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItemResult>,
    pub timing_ms: u64,
}

impl BatchResult {
    /// Build the aggregate from per-item results, deriving the counts.
    pub fn from_items(batch_id: Uuid, items: Vec<BatchItemResult>, timing_ms: u64) -> Self {
        let succeeded = items.iter().filter(|item| item.success).count();
        Self {
            batch_id,
            total: items.len(),
            succeeded,
            failed: items.len() - succeeded,
            items,
            timing_ms,
        }
    }
}
