//! Structured error rendering for tool responses.

use atelier_core::{ErrorCategory, ErrorMetadata, ImageToolError, LogLevel};
use rmcp::model::{ErrorCode, ErrorData};
use std::borrow::Cow;

const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// Example arguments shown alongside validation errors.
pub fn usage_example(tool: &str) -> Option<serde_json::Value> {
    let example = match tool {
        "generate_image" => serde_json::json!({
            "prompt": "a red cube on a white table",
            "aspectRatio": "square",
            "outputFormat": "png",
            "save": true,
            "namingStrategy": "timestamp"
        }),
        "edit_image" => serde_json::json!({
            "sourceImage": { "kind": "local", "value": "photos/cat.png" },
            "editPrompt": "replace the background with a sunny beach",
            "editKind": "backgroundChange",
            "strength": 0.8
        }),
        "batch_edit_images" => serde_json::json!({
            "images": [
                { "kind": "url", "value": "https://example.com/a.png" },
                { "kind": "local", "value": "photos/b.jpg" }
            ],
            "editPrompt": "convert to a watercolor painting",
            "editKind": "styleTransfer",
            "batchSettings": { "maxConcurrent": 3, "errorHandling": "continueOnError" }
        }),
        _ => return None,
    };
    Some(example)
}

/// Structured payload: category, message, suggestion and, for validation
/// errors, a usage example.
pub fn error_payload(err: &ImageToolError, tool: &str) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "category": err.category().as_str(),
        "code": err.error_code(),
        "message": err.to_string(),
        "suggestion": err.suggested_action(),
        "retryable": err.is_retryable(),
    });

    if err.category() == ErrorCategory::Validation {
        if let Some(example) = usage_example(tool) {
            payload["usageExample"] = example;
        }
    }

    payload
}

/// Convert a tool failure into protocol error data, logging it at the
/// variant's level.
pub fn render_error(err: &ImageToolError, tool: &str) -> ErrorData {
    log_error(err, tool);

    let code = match err.category() {
        ErrorCategory::Validation | ErrorCategory::BatchProcessing => INVALID_PARAMS,
        _ => INTERNAL_ERROR,
    };

    ErrorData {
        code: ErrorCode(code),
        message: Cow::from(format!(
            "{}: {}. Suggestion: {}",
            err.category(),
            err,
            err.suggested_action()
        )),
        data: Some(error_payload(err, tool)),
    }
}

fn log_error(err: &ImageToolError, tool: &str) {
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(tool = tool, error_code = code, error = %err, "Tool call failed"),
        LogLevel::Warn => tracing::warn!(tool = tool, error_code = code, error = %err, "Tool call failed"),
        LogLevel::Error => tracing::error!(tool = tool, error_code = code, error = %err, "Tool call failed"),
    }
}
