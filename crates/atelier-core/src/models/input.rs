use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Source image for edit and batch operations.
///
/// Serialized as `{"kind": "url" | "inline" | "local", "value": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ImageInput {
    /// Remote http(s) URL
    Url(String),
    /// Base64 image data, optionally prefixed with a `data:` URL header
    Inline(String),
    /// Relative or absolute local path without `..` segments
    Local(String),
}

impl ImageInput {
    pub fn kind(&self) -> &'static str {
        match self {
            ImageInput::Url(_) => "url",
            ImageInput::Inline(_) => "inline",
            ImageInput::Local(_) => "local",
        }
    }

    /// Short human-readable reference used in logs and batch results.
    ///
    /// Inline payloads are summarized by length instead of echoed.
    pub fn reference(&self) -> String {
        match self {
            ImageInput::Url(url) => url.clone(),
            ImageInput::Local(path) => path.clone(),
            ImageInput::Inline(data) => format!("inline:{} chars", data.len()),
        }
    }
}
