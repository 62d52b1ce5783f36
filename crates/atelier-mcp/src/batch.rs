//! Batch orchestration.
//!
//! Items are processed in sequential chunks of `max_concurrent`; every item in
//! a chunk runs concurrently and the next chunk starts only once the whole
//! chunk has settled. Item failures are recorded as data and never abort the
//! batch unless the `failFast` policy asks for it.

use atelier_core::constants::{MAX_BATCH_CONCURRENCY, MIN_BATCH_CONCURRENCY};
use atelier_core::{
    BatchItemResult, BatchResult, BatchSettings, ErrorHandling, ErrorMetadata, ImageToolError,
    LogLevel, SavedImage, ToolResult,
};
use futures::future::join_all;
use std::future::Future;
use std::time::Instant;
use uuid::Uuid;

/// What a successful item produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchItemOutput {
    pub saved_image: Option<SavedImage>,
    pub remote_url: Option<String>,
}

pub struct BatchOrchestrator {
    settings: BatchSettings,
}

impl BatchOrchestrator {
    /// Validate settings up front so nothing runs with an invalid configuration.
    pub fn new(settings: BatchSettings) -> ToolResult<Self> {
        if !(MIN_BATCH_CONCURRENCY..=MAX_BATCH_CONCURRENCY).contains(&settings.max_concurrent) {
            return Err(ImageToolError::BatchProcessing(format!(
                "maxConcurrent must be between {} and {}, got {}",
                MIN_BATCH_CONCURRENCY, MAX_BATCH_CONCURRENCY, settings.max_concurrent
            )));
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    fn chunk_size(&self) -> usize {
        if self.settings.parallel {
            self.settings.max_concurrent
        } else {
            1
        }
    }

    /// Run `operation` over every item and aggregate the outcome.
    ///
    /// `reference` produces the human-readable reference recorded per item.
    #[tracing::instrument(skip_all, fields(item_count = items.len(), batch_id = tracing::field::Empty))]
    pub async fn run<I, R, F, Fut>(
        &self,
        items: Vec<I>,
        reference: R,
        operation: F,
    ) -> ToolResult<BatchResult>
    where
        I: Clone,
        R: Fn(&I) -> String,
        F: Fn(usize, I) -> Fut,
        Fut: Future<Output = ToolResult<BatchItemOutput>>,
    {
        if items.is_empty() {
            return Err(ImageToolError::BatchProcessing(
                "A batch needs at least one image".to_string(),
            ));
        }

        let batch_id = Uuid::new_v4();
        tracing::Span::current().record("batch_id", tracing::field::display(batch_id));

        let start = Instant::now();
        let chunk_size = self.chunk_size();
        let indices: Vec<usize> = (0..items.len()).collect();
        let mut results: Vec<Option<BatchItemResult>> = vec![None; items.len()];

        tracing::info!(
            chunk_size = chunk_size,
            error_handling = ?self.settings.error_handling,
            "Batch started"
        );

        let mut halted = false;
        for (chunk_index, chunk) in indices.chunks(chunk_size).enumerate() {
            if chunk_index > 0 {
                self.pause().await;
            }

            let chunk_failed = self
                .run_chunk(chunk, &items, &reference, &operation, &mut results)
                .await;

            if chunk_failed && self.settings.error_handling == ErrorHandling::FailFast {
                tracing::warn!(chunk = chunk_index, "Batch halted after failed chunk");
                halted = true;
                break;
            }
        }

        if halted {
            for (index, slot) in results.iter_mut().enumerate() {
                if slot.is_none() {
                    *slot = Some(skipped(index, reference(&items[index])));
                }
            }
        }

        if self.settings.error_handling == ErrorHandling::RetryFailed {
            let failed: Vec<usize> = results
                .iter()
                .flatten()
                .filter(|item| !item.success)
                .map(|item| item.index)
                .collect();

            if !failed.is_empty() {
                tracing::info!(retry_count = failed.len(), "Retrying failed batch items");
                for chunk in failed.chunks(chunk_size) {
                    self.pause().await;
                    self.run_chunk(chunk, &items, &reference, &operation, &mut results)
                        .await;
                }
            }
        }

        let item_results: Vec<BatchItemResult> = results
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| skipped(index, reference(&items[index])))
            })
            .collect();

        let result =
            BatchResult::from_items(batch_id, item_results, start.elapsed().as_millis() as u64);

        tracing::info!(
            total = result.total,
            succeeded = result.succeeded,
            failed = result.failed,
            timing_ms = result.timing_ms,
            "Batch completed"
        );

        Ok(result)
    }

    /// Run one chunk concurrently, storing results by index. Returns whether any item failed.
    async fn run_chunk<I, R, F, Fut>(
        &self,
        chunk: &[usize],
        items: &[I],
        reference: &R,
        operation: &F,
        results: &mut [Option<BatchItemResult>],
    ) -> bool
    where
        I: Clone,
        R: Fn(&I) -> String,
        F: Fn(usize, I) -> Fut,
        Fut: Future<Output = ToolResult<BatchItemOutput>>,
    {
        let outcomes = join_all(chunk.iter().map(|&index| {
            let original_ref = reference(&items[index]);
            run_item(index, original_ref, operation(index, items[index].clone()))
        }))
        .await;

        let mut any_failed = false;
        for outcome in outcomes {
            any_failed |= !outcome.success;
            let index = outcome.index;
            results[index] = Some(outcome);
        }
        any_failed
    }

    async fn pause(&self) {
        if !self.settings.chunk_delay.is_zero() {
            tokio::time::sleep(self.settings.chunk_delay).await;
        }
    }
}

async fn run_item<Fut>(index: usize, original_ref: String, work: Fut) -> BatchItemResult
where
    Fut: Future<Output = ToolResult<BatchItemOutput>>,
{
    let start = Instant::now();
    let outcome = work.await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(output) => BatchItemResult {
            index,
            original_ref,
            success: true,
            saved_image: output.saved_image,
            remote_url: output.remote_url,
            error: None,
            duration_ms,
        },
        Err(e) => {
            match e.log_level() {
                LogLevel::Debug => {
                    tracing::debug!(index = index, source = %original_ref, error = %e, "Batch item failed")
                }
                LogLevel::Warn => {
                    tracing::warn!(index = index, source = %original_ref, error = %e, "Batch item failed")
                }
                LogLevel::Error => {
                    tracing::error!(index = index, source = %original_ref, error = %e, "Batch item failed")
                }
            }
            BatchItemResult {
                index,
                original_ref,
                success: false,
                saved_image: None,
                remote_url: None,
                error: Some(e.to_string()),
                duration_ms,
            }
        }
    }
}

fn skipped(index: usize, original_ref: String) -> BatchItemResult {
    BatchItemResult {
        index,
        original_ref,
        success: false,
        saved_image: None,
        remote_url: None,
        error: Some("skipped: batch halted by failFast after an earlier failure".to_string()),
        duration_ms: 0,
    }
}
