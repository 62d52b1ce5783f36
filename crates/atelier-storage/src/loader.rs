//! Source image loading for edit and batch operations.

use crate::formats::{decode_base64_strict, decoded_len_estimate, mime_from_path, split_data_url};
use atelier_core::constants::{ALLOWED_INPUT_EXTENSIONS, MAX_INPUT_IMAGE_BYTES};
use atelier_core::{ImageInput, ImageToolError, ToolResult};
use reqwest::Client;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Bytes of a loaded source image.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub data: Vec<u8>,
    /// Declared or inferred media type, when known
    pub mime_type: Option<String>,
    /// Best-effort filename for multipart uploads
    pub filename: String,
}

/// Loads [`ImageInput`]s into memory, enforcing the input size ceiling and
/// path-safety rules. Never writes.
#[derive(Clone, Debug)]
pub struct ImageInputLoader {
    client: Client,
    max_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl ImageInputLoader {
    pub fn new(timeout: Duration) -> ToolResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageToolError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_bytes: MAX_INPUT_IMAGE_BYTES,
            allowed_extensions: ALLOWED_INPUT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub async fn load(&self, input: &ImageInput) -> ToolResult<LoadedImage> {
        let start = std::time::Instant::now();

        let loaded = match input {
            ImageInput::Url(url) => self.load_url(url).await?,
            ImageInput::Inline(data) => self.load_inline(data)?,
            ImageInput::Local(path) => self.load_local(path).await?,
        };

        tracing::info!(
            kind = input.kind(),
            source = %input.reference(),
            size_bytes = loaded.data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Loaded source image"
        );

        Ok(loaded)
    }

    async fn load_url(&self, url: &str) -> ToolResult<LoadedImage> {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|_| ImageToolError::InvalidInput(format!("Invalid URL format: {}", url)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ImageToolError::InvalidInput(
                "Only HTTP and HTTPS URLs are allowed".to_string(),
            ));
        }

        let mut response = self.client.get(parsed.clone()).send().await.map_err(|e| {
            tracing::warn!(error = %e, url = %url, "Failed to fetch source image");
            ImageToolError::InvalidInput(format!("Failed to fetch {}: {}", url, e))
        })?;

        if !response.status().is_success() {
            return Err(ImageToolError::InvalidInput(format!(
                "URL returned status code: {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("")
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        if !content_type.starts_with("image/") {
            return Err(ImageToolError::UnsupportedFormat(format!(
                "URL did not return an image (content-type: {:?})",
                content_type
            )));
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes {
                return Err(ImageToolError::TooLarge {
                    size: declared,
                    max: self.max_bytes,
                });
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageToolError::InvalidInput(format!("Failed to read body: {}", e)))?
        {
            let size = (data.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                return Err(ImageToolError::TooLarge {
                    size,
                    max: self.max_bytes,
                });
            }
            data.extend_from_slice(&chunk);
        }

        let filename = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "image".to_string());

        Ok(LoadedImage {
            data,
            mime_type: Some(content_type),
            filename,
        })
    }

    fn load_inline(&self, data: &str) -> ToolResult<LoadedImage> {
        let (mime_type, payload) = split_data_url(data);

        if let Some(mime) = &mime_type {
            if !mime.starts_with("image/") {
                return Err(ImageToolError::UnsupportedFormat(format!(
                    "Inline data is not an image: {}",
                    mime
                )));
            }
        }

        // Reject obviously oversized payloads before spending time decoding.
        let estimate = decoded_len_estimate(payload);
        if estimate > self.max_bytes {
            return Err(ImageToolError::TooLarge {
                size: estimate,
                max: self.max_bytes,
            });
        }

        let bytes = decode_base64_strict(payload)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(ImageToolError::TooLarge {
                size: bytes.len() as u64,
                max: self.max_bytes,
            });
        }

        Ok(LoadedImage {
            data: bytes,
            mime_type,
            filename: "image".to_string(),
        })
    }

    async fn load_local(&self, raw: &str) -> ToolResult<LoadedImage> {
        let path = normalize_local_path(raw)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| {
                ImageToolError::UnsupportedFormat(format!("File has no extension: {}", raw))
            })?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ImageToolError::UnsupportedFormat(format!(
                "Invalid file extension: {} (allowed: {:?})",
                extension, self.allowed_extensions
            )));
        }

        let metadata = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ImageToolError::NotFound(path.display().to_string())
            } else {
                ImageToolError::InvalidInput(format!("Cannot access {}: {}", path.display(), e))
            }
        })?;

        if !metadata.is_file() {
            return Err(ImageToolError::NotFound(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        if metadata.len() > self.max_bytes {
            return Err(ImageToolError::TooLarge {
                size: metadata.len(),
                max: self.max_bytes,
            });
        }

        let data = fs::read(&path).await.map_err(|e| {
            ImageToolError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        Ok(LoadedImage {
            data,
            mime_type: mime_from_path(&path).map(str::to_string),
            filename,
        })
    }
}

/// Normalize a local path, rejecting any parent-directory traversal.
///
/// `.` segments are dropped; `..` anywhere in the path is an error, even when
/// it would resolve back inside the starting directory.
pub fn normalize_local_path(raw: &str) -> ToolResult<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ImageToolError::InvalidInput(
            "Local path must not be empty".to_string(),
        ));
    }

    let path = Path::new(trimmed);
    let has_traversal = path.components().any(|c| c == Component::ParentDir)
        || trimmed.split(['/', '\\']).any(|segment| segment == "..");
    if has_traversal {
        return Err(ImageToolError::InvalidInput(format!(
            "Path traversal is not allowed: {}",
            raw
        )));
    }

    Ok(path
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect())
}
