//! Persisting generated images to the local filesystem.
//!
//! A save resolves the target directory, picks a filename, reserves the final
//! path according to the conflict strategy and then streams the image into it.
//! Remote sources are downloaded with a byte ceiling enforced while streaming
//! and retried with backoff on network-class failures. A failed save never
//! leaves a partial file behind.

use crate::conflict::resolve_conflict;
use crate::formats::{decode_base64_strict, format_from_mime, format_from_path, split_data_url};
use crate::naming::{sanitize_filename, NamingContext, NamingEngine};
use crate::organizer::{ensure_directory, resolve_directory, DirectoryContext};
use crate::retry::RetryPolicy;
use atelier_core::constants::MAX_RENAME_ATTEMPTS;
use atelier_core::{
    AspectRatio, Config, ConflictStrategy, ErrorMetadata, FileOutputRequest, ImageToolError,
    OutputFormat, Quality, SavedImage, ToolResult,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Where the image bytes come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// http(s) URL returned by the upstream API
    Remote(String),
    /// Base64 payload, optionally with a `data:` header
    Inline(String),
    /// Already-decoded bytes
    Bytes {
        data: Vec<u8>,
        mime_type: Option<String>,
    },
}

impl ImageSource {
    pub fn reference(&self) -> String {
        match self {
            ImageSource::Remote(url) => url.clone(),
            ImageSource::Inline(data) => format!("inline:{} chars", data.len()),
            ImageSource::Bytes { data, .. } => format!("bytes:{}", data.len()),
        }
    }
}

/// Per-save inputs that shape the directory and filename.
#[derive(Debug, Clone)]
pub struct SaveContext {
    /// Prompt text for the `content` and `hash` strategies
    pub prompt: Option<String>,
    pub format: OutputFormat,
    pub aspect_ratio: Option<AspectRatio>,
    pub quality: Option<Quality>,
    /// Prefix used by the `timestamp` strategy when the request has none
    pub default_prefix: Option<String>,
    pub now: DateTime<Utc>,
}

impl SaveContext {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            prompt: None,
            format,
            aspect_ratio: None,
            quality: None,
            default_prefix: None,
            now: Utc::now(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = Some(prefix.into());
        self
    }
}

/// Writes images to disk under the configured output policy.
#[derive(Clone, Debug)]
pub struct FilePersister {
    client: Client,
    default_output_dir: PathBuf,
    max_file_size_bytes: u64,
    enabled: bool,
    retry: RetryPolicy,
    naming: Arc<NamingEngine>,
}

impl FilePersister {
    pub fn new(config: &Config, naming: Arc<NamingEngine>) -> ToolResult<Self> {
        let client = Client::builder()
            .timeout(config.download_timeout())
            .build()
            .map_err(|e| ImageToolError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            default_output_dir: config.default_output_dir.clone(),
            max_file_size_bytes: config.max_file_size_bytes,
            enabled: config.file_output_enabled,
            retry: RetryPolicy::from_config(config),
            naming,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size_bytes: u64) -> Self {
        self.max_file_size_bytes = max_file_size_bytes;
        self
    }

    pub fn with_default_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_output_dir = dir.into();
        self
    }

    pub fn default_output_dir(&self) -> &Path {
        &self.default_output_dir
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Persist `source` according to `request`.
    ///
    /// Returns `Ok(None)` without touching the filesystem when the request
    /// opts out of saving or file output is disabled.
    #[tracing::instrument(skip(self, source, request, context), fields(source = %source.reference()))]
    pub async fn save(
        &self,
        source: &ImageSource,
        request: &FileOutputRequest,
        context: &SaveContext,
    ) -> ToolResult<Option<SavedImage>> {
        if !request.save || !self.enabled {
            return Ok(None);
        }

        let start = std::time::Instant::now();

        let base = request
            .output_directory
            .clone()
            .unwrap_or_else(|| self.default_output_dir.clone());
        let directory_context = DirectoryContext {
            now: context.now,
            aspect_ratio: context.aspect_ratio,
            quality: context.quality,
        };
        let directory = resolve_directory(&base, request.organize_by, &directory_context)?;
        let filename = self.choose_filename(request, context)?;

        ensure_directory(&directory).await?;

        let candidate = directory.join(&filename);
        let (path, mut file) = open_target(&candidate, request.conflict_strategy).await?;

        let (size_bytes, mime_type) = match self.write_source(source, &mut file, &path).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                discard_partial(&path).await;
                return Err(e);
            }
        };

        let format = mime_type
            .as_deref()
            .and_then(format_from_mime)
            .or_else(|| format_from_path(&path))
            .unwrap_or(context.format.as_str())
            .to_string();

        let final_filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename.as_str())
            .to_string();

        tracing::info!(
            path = %path.display(),
            size_bytes = size_bytes,
            format = %format,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image saved to local storage"
        );

        Ok(Some(SavedImage {
            local_path: path,
            filename: final_filename,
            directory,
            size_bytes,
            format,
            saved_at: Utc::now(),
        }))
    }

    fn choose_filename(
        &self,
        request: &FileOutputRequest,
        context: &SaveContext,
    ) -> ToolResult<String> {
        let extension = context.format.extension();

        if let Some(name) = request.filename.as_deref().filter(|n| !n.trim().is_empty()) {
            return sanitize_filename(name, extension);
        }

        let mut naming = NamingContext::new(context.now);
        if let Some(prompt) = context.prompt.as_deref() {
            naming = naming.with_content(prompt);
        }
        if let Some(prefix) = request
            .prefix
            .as_deref()
            .or(context.default_prefix.as_deref())
        {
            naming = naming.with_prefix(prefix);
        }

        self.naming
            .generate_filename(request.naming_strategy, &naming, extension)
    }

    async fn write_source(
        &self,
        source: &ImageSource,
        file: &mut File,
        path: &Path,
    ) -> ToolResult<(u64, Option<String>)> {
        let result = match source {
            ImageSource::Remote(url) => self.download_with_retry(url, file, path).await?,
            ImageSource::Inline(encoded) => {
                let (mime_type, payload) = split_data_url(encoded);
                let data = decode_base64_strict(payload)?;
                self.write_bytes(&data, file, path).await?;
                (data.len() as u64, mime_type)
            }
            ImageSource::Bytes { data, mime_type } => {
                self.write_bytes(data, file, path).await?;
                (data.len() as u64, mime_type.clone())
            }
        };

        file.flush()
            .await
            .map_err(|e| ImageToolError::filesystem(path, e))?;
        file.sync_all()
            .await
            .map_err(|e| ImageToolError::filesystem(path, e))?;

        Ok(result)
    }

    async fn write_bytes(&self, data: &[u8], file: &mut File, path: &Path) -> ToolResult<()> {
        let attempted = data.len() as u64;
        if attempted > self.max_file_size_bytes {
            return Err(ImageToolError::DiskSpace {
                attempted,
                max: self.max_file_size_bytes,
            });
        }
        file.write_all(data)
            .await
            .map_err(|e| ImageToolError::filesystem(path, e))
    }

    async fn download_with_retry(
        &self,
        url: &str,
        file: &mut File,
        path: &Path,
    ) -> ToolResult<(u64, Option<String>)> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            // Each attempt starts from an empty file.
            file.set_len(0)
                .await
                .map_err(|e| ImageToolError::filesystem(path, e))?;
            file.seek(SeekFrom::Start(0))
                .await
                .map_err(|e| ImageToolError::filesystem(path, e))?;

            match self.download_once(url, file, path).await {
                Ok(written) => return Ok(written),
                Err(e) if self.retry.should_retry(&e, attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        url = %url,
                        attempt = attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(ImageToolError::Download {
                        source_ref: url.to_string(),
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn download_once(
        &self,
        url: &str,
        file: &mut File,
        path: &Path,
    ) -> ToolResult<(u64, Option<String>)> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageToolError::Network(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ImageToolError::Network(format!(
                "Server returned {} for {}",
                status, url
            )));
        }
        if !status.is_success() {
            return Err(ImageToolError::InvalidInput(format!(
                "Download of {} returned status {}",
                url, status
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_lowercase())
            .filter(|ct| !ct.is_empty());

        if let Some(ct) = &mime_type {
            if !ct.starts_with("image/") {
                return Err(ImageToolError::UnsupportedFormat(format!(
                    "Expected an image from {}, got {}",
                    url, ct
                )));
            }
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_file_size_bytes {
                return Err(ImageToolError::DiskSpace {
                    attempted: declared,
                    max: self.max_file_size_bytes,
                });
            }
        }

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageToolError::Network(format!("Reading {} failed: {}", url, e)))?
        {
            written += chunk.len() as u64;
            if written > self.max_file_size_bytes {
                return Err(ImageToolError::DiskSpace {
                    attempted: written,
                    max: self.max_file_size_bytes,
                });
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| ImageToolError::filesystem(path, e))?;
        }

        Ok((written, mime_type))
    }
}

/// Open the final target path, reserving it atomically unless overwriting.
///
/// Another writer can claim an auto-renamed path between the existence check
/// and the open; `create_new` catches that and the next candidate is tried.
async fn open_target(candidate: &Path, strategy: ConflictStrategy) -> ToolResult<(PathBuf, File)> {
    for _ in 0..=MAX_RENAME_ATTEMPTS {
        let path = resolve_conflict(candidate, strategy).await?;

        let mut options = OpenOptions::new();
        options.write(true);
        if strategy == ConflictStrategy::Overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        match options.open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if strategy == ConflictStrategy::Skip {
                    return Err(ImageToolError::FileExists(path));
                }
                tracing::debug!(path = %path.display(), "Target claimed concurrently, retrying");
            }
            Err(e) => return Err(ImageToolError::filesystem(&path, e)),
        }
    }

    Err(ImageToolError::filesystem(
        candidate,
        "could not reserve a free filename",
    ))
}

async fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{NamingStrategy, OrganizeBy};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::collections::HashSet;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::tempdir;

    fn persister(dir: &Path) -> FilePersister {
        let config = Config {
            default_output_dir: dir.to_path_buf(),
            ..Config::default()
        };
        FilePersister::new(&config, Arc::new(NamingEngine::new()))
            .unwrap()
            .with_retry_policy(RetryPolicy::new(
                3,
                Duration::ZERO,
                crate::retry::Backoff::Linear,
            ))
    }

    fn bytes(data: &[u8]) -> ImageSource {
        ImageSource::Bytes {
            data: data.to_vec(),
            mime_type: Some("image/png".to_string()),
        }
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_save_disabled_performs_no_io() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("never-created");
        let request = FileOutputRequest {
            save: false,
            output_directory: Some(out.clone()),
            ..FileOutputRequest::default()
        };

        let saved = persister(dir.path())
            .save(&bytes(b"png"), &request, &SaveContext::new(OutputFormat::Png))
            .await
            .unwrap();
        assert!(saved.is_none());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_saves_bytes_with_timestamp_name() {
        let dir = tempdir().unwrap();
        let saved = persister(dir.path())
            .save(
                &bytes(b"pngdata"),
                &FileOutputRequest::default(),
                &SaveContext::new(OutputFormat::Png).with_prompt("a red fox"),
            )
            .await
            .unwrap()
            .unwrap();

        assert!(saved.filename.starts_with("image_"));
        assert!(saved.filename.ends_with(".png"));
        assert_eq!(saved.size_bytes, 7);
        assert_eq!(saved.format, "png");
        assert_eq!(std::fs::read(&saved.local_path).unwrap(), b"pngdata");
    }

    #[tokio::test]
    async fn test_inline_source_decoded() {
        let dir = tempdir().unwrap();
        let source = ImageSource::Inline(format!(
            "data:image/webp;base64,{}",
            STANDARD.encode(b"webpdata")
        ));
        let request = FileOutputRequest {
            filename: Some("result".to_string()),
            ..FileOutputRequest::default()
        };

        let saved = persister(dir.path())
            .save(&source, &request, &SaveContext::new(OutputFormat::Webp))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.filename, "result.webp");
        assert_eq!(saved.format, "webp");
        assert_eq!(std::fs::read(&saved.local_path).unwrap(), b"webpdata");
    }

    #[tokio::test]
    async fn test_size_ceiling_removes_partial_file() {
        let dir = tempdir().unwrap();
        let request = FileOutputRequest {
            filename: Some("big.png".to_string()),
            ..FileOutputRequest::default()
        };

        let err = persister(dir.path())
            .with_max_file_size(16)
            .save(&bytes(&[0u8; 64]), &request, &SaveContext::new(OutputFormat::Png))
            .await
            .unwrap_err();

        assert!(matches!(err, ImageToolError::DiskSpace { attempted: 64, max: 16 }));
        assert!(!dir.path().join("big.png").exists());
    }

    #[tokio::test]
    async fn test_remote_size_ceiling_removes_partial_file() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(vec![9u8; 2048])
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let err = persister(dir.path())
            .with_max_file_size(1024)
            .save(
                &ImageSource::Remote(format!("{}/big.png", server.url())),
                &FileOutputRequest::default(),
                &SaveContext::new(OutputFormat::Png),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ImageToolError::DiskSpace { max: 1024, .. }));
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_chunked_download_aborted_mid_transfer() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/stream.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_chunked_body(|w| {
                for _ in 0..8 {
                    w.write_all(&[9u8; 512])?;
                }
                Ok(())
            })
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let err = persister(dir.path())
            .with_max_file_size(1024)
            .save(
                &ImageSource::Remote(format!("{}/stream.png", server.url())),
                &FileOutputRequest::default(),
                &SaveContext::new(OutputFormat::Png),
            )
            .await
            .unwrap_err();

        match err {
            ImageToolError::DiskSpace { attempted, max } => {
                assert_eq!(max, 1024);
                assert!(attempted > 1024);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_retry_after_server_error_keeps_only_final_body() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("GET", "/flaky.png")
            .with_status(503)
            .with_body("try again later")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/flaky.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"final-png")
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let saved = persister(dir.path())
            .save(
                &ImageSource::Remote(format!("{}/flaky.png", server.url())),
                &FileOutputRequest::default(),
                &SaveContext::new(OutputFormat::Png),
            )
            .await
            .unwrap()
            .unwrap();

        unavailable.assert_async().await;
        ok.assert_async().await;
        assert_eq!(saved.size_bytes, 9);
        assert_eq!(std::fs::read(&saved.local_path).unwrap(), b"final-png");
        assert_eq!(file_count(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_remote_download_streams_to_disk() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/img.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(b"jpegdata")
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let saved = persister(dir.path())
            .save(
                &ImageSource::Remote(format!("{}/img.jpg", server.url())),
                &FileOutputRequest::default(),
                &SaveContext::new(OutputFormat::Jpeg),
            )
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(saved.format, "jpeg");
        assert_eq!(saved.size_bytes, 8);
        assert!(saved.filename.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_server_errors_retried_until_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky.png")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let url = format!("{}/flaky.png", server.url());
        let err = persister(dir.path())
            .save(
                &ImageSource::Remote(url.clone()),
                &FileOutputRequest::default(),
                &SaveContext::new(OutputFormat::Png),
            )
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            ImageToolError::Download {
                source_ref,
                attempts,
                ..
            } => {
                assert_eq!(source_ref, url);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_client_errors_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/gone.png")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let err = persister(dir.path())
            .save(
                &ImageSource::Remote(format!("{}/gone.png", server.url())),
                &FileOutputRequest::default(),
                &SaveContext::new(OutputFormat::Png),
            )
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ImageToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_non_image_content_type_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html/>")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let err = persister(dir.path())
            .save(
                &ImageSource::Remote(format!("{}/page", server.url())),
                &FileOutputRequest::default(),
                &SaveContext::new(OutputFormat::Png),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ImageToolError::UnsupportedFormat(_)));
        assert_eq!(file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_auto_rename_never_overwrites() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("photo.png"), b"original").unwrap();
        let request = FileOutputRequest {
            filename: Some("photo.png".to_string()),
            ..FileOutputRequest::default()
        };

        let saved = persister(dir.path())
            .save(&bytes(b"new"), &request, &SaveContext::new(OutputFormat::Png))
            .await
            .unwrap()
            .unwrap();

        assert_ne!(saved.filename, "photo.png");
        assert!(saved.filename.starts_with("photo_001_"));
        assert_eq!(std::fs::read(dir.path().join("photo.png")).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_skip_and_overwrite_strategies() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("photo.png"), b"original").unwrap();
        let persister = persister(dir.path());

        let skip = FileOutputRequest {
            filename: Some("photo.png".to_string()),
            conflict_strategy: ConflictStrategy::Skip,
            ..FileOutputRequest::default()
        };
        let err = persister
            .save(&bytes(b"new"), &skip, &SaveContext::new(OutputFormat::Png))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageToolError::FileExists(_)));
        assert_eq!(std::fs::read(dir.path().join("photo.png")).unwrap(), b"original");

        let overwrite = FileOutputRequest {
            conflict_strategy: ConflictStrategy::Overwrite,
            ..skip
        };
        persister
            .save(&bytes(b"new"), &overwrite, &SaveContext::new(OutputFormat::Png))
            .await
            .unwrap();
        assert_eq!(std::fs::read(dir.path().join("photo.png")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_traversal_rejected_before_any_write() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("out");

        let bad_dir = FileOutputRequest {
            output_directory: Some(base.join("../escape")),
            ..FileOutputRequest::default()
        };
        let err = persister(&base)
            .save(&bytes(b"x"), &bad_dir, &SaveContext::new(OutputFormat::Png))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageToolError::Validation(_)));

        let bad_name = FileOutputRequest {
            filename: Some("../escape.png".to_string()),
            ..FileOutputRequest::default()
        };
        let err = persister(&base)
            .save(&bytes(b"x"), &bad_name, &SaveContext::new(OutputFormat::Png))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageToolError::Validation(_)));

        assert!(!base.exists());
        assert!(!dir.path().join("escape").exists());
    }

    #[tokio::test]
    async fn test_organize_by_date_creates_subdirectory() {
        let dir = tempdir().unwrap();
        let request = FileOutputRequest {
            organize_by: OrganizeBy::Date,
            ..FileOutputRequest::default()
        };
        let context = SaveContext::new(OutputFormat::Png);
        let expected = dir.path().join(context.now.format("%Y-%m-%d").to_string());

        let saved = persister(dir.path())
            .save(&bytes(b"x"), &request, &context)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.directory, expected);
        assert!(saved.local_path.starts_with(&expected));
    }

    #[tokio::test]
    async fn test_concurrent_custom_saves_get_unique_names() {
        let dir = tempdir().unwrap();
        let persister = persister(dir.path());
        let request = FileOutputRequest {
            prefix: Some("shot".to_string()),
            naming_strategy: NamingStrategy::Custom,
            ..FileOutputRequest::default()
        };
        let context = SaveContext::new(OutputFormat::Png);
        let source = bytes(b"x");

        let saves = (0..8).map(|_| persister.save(&source, &request, &context));
        let results = futures::future::join_all(saves).await;

        let names: HashSet<String> = results
            .into_iter()
            .map(|r| r.unwrap().unwrap().filename)
            .collect();
        assert_eq!(names.len(), 8);
        assert!(names.contains("shot_001.png"));
        assert!(names.contains("shot_008.png"));
    }
}
