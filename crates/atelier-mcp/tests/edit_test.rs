//! edit_image integration tests.
//!
//! Run with: `cargo test -p atelier-mcp --test edit_test`

mod helpers;

use atelier_core::{ErrorCategory, ErrorMetadata, ImageToolError};
use atelier_mcp::tools::EditImageRequest;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use helpers::{create_png, file_names, is_timestamp_png_name, service, FakeImageApi};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

fn request(value: serde_json::Value) -> EditImageRequest {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_edit_local_image() {
    let inputs = tempdir().unwrap();
    let source = inputs.path().join("cat.png");
    std::fs::write(&source, create_png(30, 20)).unwrap();

    let output = tempdir().unwrap();
    let api = Arc::new(FakeImageApi::new(create_png(12, 6)));
    let service = service(output.path(), api.clone());

    let envelope = service
        .edit(request(json!({
            "sourceImage": { "kind": "local", "value": source.display().to_string() },
            "editPrompt": "replace the background with a beach",
            "editKind": "backgroundChange",
            "strength": 0.5
        })))
        .await
        .unwrap();

    let saved = envelope.saved_image.clone().unwrap();
    assert!(is_timestamp_png_name(&saved.filename, "edited"), "{}", saved.filename);
    assert_eq!((envelope.metadata.width, envelope.metadata.height), (12, 6));

    let prompts = api.prompts.lock().unwrap();
    assert!(prompts[0].starts_with("Replace the background"));
    assert!(prompts[0].contains("Edit strength: 0.50"));
}

#[tokio::test]
async fn test_edit_inline_source_with_dimension_ratio_directory() {
    let output = tempdir().unwrap();
    let service = service(output.path(), Arc::new(FakeImageApi::new(create_png(10, 10))));
    let inline = format!("data:image/png;base64,{}", STANDARD.encode(create_png(40, 10)));

    let envelope = service
        .edit(request(json!({
            "sourceImage": { "kind": "inline", "value": inline },
            "editPrompt": "make it look like a watercolor",
            "organizeBy": "dimensionRatio"
        })))
        .await
        .unwrap();

    let saved = envelope.saved_image.unwrap();
    assert_eq!(saved.directory, output.path().join("landscape"));
}

#[tokio::test]
async fn test_edit_rejects_traversal_before_any_io() {
    let output = tempdir().unwrap();
    let api = Arc::new(FakeImageApi::new(create_png(8, 8)));
    let service = service(output.path(), api.clone());

    let err = service
        .edit(request(json!({
            "sourceImage": { "kind": "local", "value": "../../etc/secret.png" },
            "editPrompt": "remove the watermark"
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, ImageToolError::InvalidInput(_)));
    assert_eq!(err.category(), ErrorCategory::InputLoad);
    assert_eq!(api.call_count(), 0);
    assert!(file_names(output.path()).is_empty());
}

#[tokio::test]
async fn test_edit_rejects_out_of_range_strength() {
    let output = tempdir().unwrap();
    let api = Arc::new(FakeImageApi::new(create_png(8, 8)));
    let service = service(output.path(), api.clone());

    let err = service
        .edit(request(json!({
            "sourceImage": { "kind": "url", "value": "https://example.com/a.png" },
            "editPrompt": "brighten",
            "strength": 1.5
        })))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn test_edit_missing_local_file() {
    let output = tempdir().unwrap();
    let service = service(output.path(), Arc::new(FakeImageApi::new(create_png(8, 8))));

    let err = service
        .edit(request(json!({
            "sourceImage": {
                "kind": "local",
                "value": output.path().join("missing.png").display().to_string()
            },
            "editPrompt": "add a hat"
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, ImageToolError::NotFound(_)));
}

#[tokio::test]
async fn test_edit_inline_response_when_requested() {
    let inputs = tempdir().unwrap();
    let source = inputs.path().join("dog.jpg");
    std::fs::write(&source, create_png(8, 8)).unwrap();

    let output = tempdir().unwrap();
    let edited = create_png(8, 8);
    let service = service(output.path(), Arc::new(FakeImageApi::new(edited.clone())));

    let envelope = service
        .edit(request(json!({
            "sourceImage": { "kind": "local", "value": source.display().to_string() },
            "editPrompt": "add sunglasses",
            "includeInlineBytes": true,
            "save": false
        })))
        .await
        .unwrap();

    assert!(envelope.file_path.is_none());
    assert_eq!(envelope.inline_data, Some(STANDARD.encode(&edited)));
    assert_eq!(envelope.metadata.size_bytes, Some(edited.len() as u64));
}
