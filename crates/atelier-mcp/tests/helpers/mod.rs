//! Test helpers: fake upstream API, isolated configuration and image fixtures.
//!
//! Run from workspace root: `cargo test -p atelier-mcp`.

#![allow(dead_code)]

use async_trait::async_trait;
use atelier_api_client::{EditRequest, GenerationRequest, ImageApi, UpstreamImage};
use atelier_core::{Config, ImageToolError, ToolResult};
use atelier_mcp::ImageToolService;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Source bytes that make the fake edit endpoint fail.
pub const FAILING_SOURCE: &[u8] = b"fail";

/// In-memory stand-in for the upstream image API.
///
/// Answers with `output` as base64 unless built with [`FakeImageApi::url_only`].
/// Edits of images whose bytes equal [`FAILING_SOURCE`] fail with an
/// upstream error.
pub struct FakeImageApi {
    pub output: Vec<u8>,
    pub remote_url: Option<String>,
    pub inline: bool,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeImageApi {
    pub fn new(output: Vec<u8>) -> Self {
        Self {
            output,
            remote_url: None,
            inline: true,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_remote_url(mut self, url: &str) -> Self {
        self.remote_url = Some(url.to_string());
        self
    }

    /// Answer with the remote URL only, as URL-returning models do.
    pub fn url_only(mut self, url: &str) -> Self {
        self.remote_url = Some(url.to_string());
        self.inline = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, prompt: &str) -> UpstreamImage {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        UpstreamImage {
            url: self.remote_url.clone(),
            b64_json: self.inline.then(|| STANDARD.encode(&self.output)),
            revised_prompt: Some(format!("revised: {}", prompt)),
        }
    }
}

#[async_trait]
impl ImageApi for FakeImageApi {
    async fn generate(&self, request: &GenerationRequest) -> ToolResult<UpstreamImage> {
        Ok(self.respond(&request.prompt))
    }

    async fn edit(&self, request: &EditRequest) -> ToolResult<UpstreamImage> {
        if request.image == FAILING_SOURCE {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return Err(ImageToolError::UpstreamApi {
                status: Some(400),
                message: "image rejected".to_string(),
            });
        }
        Ok(self.respond(&request.prompt))
    }
}

/// Configuration writing into `output_dir` with no artificial delays.
pub fn test_config(output_dir: &Path) -> Config {
    Config {
        api_key: "test-key".to_string(),
        default_output_dir: output_dir.to_path_buf(),
        batch_chunk_delay_ms: 0,
        retry_base_delay_ms: 0,
        ..Config::default()
    }
}

pub fn service(output_dir: &Path, api: Arc<FakeImageApi>) -> ImageToolService {
    ImageToolService::new(&test_config(output_dir), api).unwrap()
}

/// Encoded PNG of the given size.
pub fn create_png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// `image_{YYYYMMDD}_{HHMMSS}_{6 hex}.png`
pub fn is_timestamp_png_name(filename: &str, prefix: &str) -> bool {
    let Some(rest) = filename
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix('_'))
        .and_then(|r| r.strip_suffix(".png"))
    else {
        return false;
    };

    let parts: Vec<&str> = rest.split('_').collect();
    parts.len() == 3
        && parts[0].len() == 8
        && parts[0].chars().all(|c| c.is_ascii_digit())
        && parts[1].len() == 6
        && parts[1].chars().all(|c| c.is_ascii_digit())
        && parts[2].len() == 6
        && parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
