//! batch_edit_images integration tests.
//!
//! Run with: `cargo test -p atelier-mcp --test batch_test`

mod helpers;

use atelier_core::{ErrorCategory, ErrorMetadata, ImageInput};
use atelier_mcp::tools::BatchEditImagesRequest;
use helpers::{create_png, file_names, service, FakeImageApi, FAILING_SOURCE};
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn request(value: serde_json::Value) -> BatchEditImagesRequest {
    serde_json::from_value(value).unwrap()
}

/// Five local inputs; items 2 and 4 (1-based) are rejected by the fake API.
fn five_inputs(dir: &Path) -> Vec<serde_json::Value> {
    (1..=5)
        .map(|n| {
            let path = dir.join(format!("photo{}.png", n));
            if n == 2 || n == 4 {
                std::fs::write(&path, FAILING_SOURCE).unwrap();
            } else {
                std::fs::write(&path, create_png(16, 16)).unwrap();
            }
            serde_json::to_value(ImageInput::Local(path.display().to_string())).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_batch_partial_failure_isolation() {
    let inputs = tempdir().unwrap();
    let output = tempdir().unwrap();
    let service = service(output.path(), Arc::new(FakeImageApi::new(create_png(16, 16))));

    let result = service
        .batch_edit(request(json!({
            "images": five_inputs(inputs.path()),
            "editPrompt": "convert to black and white"
        })))
        .await
        .unwrap();

    assert_eq!(result.total, 5);
    assert_eq!(result.succeeded, 3);
    assert_eq!(result.failed, 2);
    assert_eq!(result.items.len(), 5);

    let flags: Vec<bool> = result.items.iter().map(|i| i.success).collect();
    assert_eq!(flags, vec![true, false, true, false, true]);

    for item in result.items.iter().filter(|i| i.success) {
        let saved = item.saved_image.as_ref().unwrap();
        assert!(saved.local_path.is_file());
        assert!(saved.filename.starts_with("batch_"));
    }
    for item in result.items.iter().filter(|i| !i.success) {
        assert!(item.error.as_deref().unwrap().contains("image rejected"));
        assert!(item.original_ref.contains("photo"));
    }
    assert_eq!(file_names(output.path()).len(), 3);
}

#[tokio::test]
async fn test_batch_invalid_concurrency_rejected_before_processing() {
    let inputs = tempdir().unwrap();
    let output = tempdir().unwrap();
    let api = Arc::new(FakeImageApi::new(create_png(16, 16)));
    let service = service(output.path(), api.clone());

    for bad in [0, 11, -3] {
        let err = service
            .batch_edit(request(json!({
                "images": five_inputs(inputs.path()),
                "editPrompt": "sepia tone",
                "batchSettings": { "maxConcurrent": bad }
            })))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::BatchProcessing);
    }

    assert_eq!(api.call_count(), 0);
    assert!(file_names(output.path()).is_empty());
}

#[tokio::test]
async fn test_batch_custom_naming_unique_under_concurrency() {
    let inputs = tempdir().unwrap();
    let output = tempdir().unwrap();
    let service = service(output.path(), Arc::new(FakeImageApi::new(create_png(16, 16))));

    let images: Vec<serde_json::Value> = (0..6)
        .map(|n| {
            let path = inputs.path().join(format!("img{}.png", n));
            std::fs::write(&path, create_png(16, 16)).unwrap();
            serde_json::to_value(ImageInput::Local(path.display().to_string())).unwrap()
        })
        .collect();

    let result = service
        .batch_edit(request(json!({
            "images": images,
            "editPrompt": "add snow",
            "namingStrategy": "custom",
            "filenamePrefix": "winter",
            "batchSettings": { "maxConcurrent": 6 }
        })))
        .await
        .unwrap();

    assert_eq!(result.succeeded, 6);
    let names: HashSet<String> = result
        .items
        .iter()
        .map(|i| i.saved_image.as_ref().unwrap().filename.clone())
        .collect();
    let expected: HashSet<String> = (1..=6).map(|n| format!("winter_{:03}.png", n)).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_batch_fail_fast_reports_skipped_items() {
    let inputs = tempdir().unwrap();
    let output = tempdir().unwrap();
    let service = service(output.path(), Arc::new(FakeImageApi::new(create_png(16, 16))));

    let result = service
        .batch_edit(request(json!({
            "images": five_inputs(inputs.path()),
            "editPrompt": "invert colors",
            "batchSettings": { "maxConcurrent": 2, "errorHandling": "failFast" }
        })))
        .await
        .unwrap();

    assert_eq!(result.total, 5);
    assert_eq!(result.succeeded + result.failed, 5);
    assert_eq!(result.succeeded, 1);
    assert!(result.items[4].error.as_deref().unwrap().starts_with("skipped"));
}

#[tokio::test]
async fn test_batch_requires_english_prompt() {
    let inputs = tempdir().unwrap();
    let output = tempdir().unwrap();
    let service = service(output.path(), Arc::new(FakeImageApi::new(create_png(16, 16))));

    let err = service
        .batch_edit(request(json!({
            "images": five_inputs(inputs.path()),
            "editPrompt": "   "
        })))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
}
