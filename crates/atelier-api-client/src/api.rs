//! Image generation and editing endpoints.

use crate::ImageApiClient;
use async_trait::async_trait;
use atelier_core::{ImageToolError, OutputFormat, Quality, ToolResult};
use serde::{Deserialize, Serialize};

/// One image returned by the upstream API: a remote URL, inline base64, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamImage {
    pub url: Option<String>,
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Pixel size such as `1024x1024`
    pub size: String,
    pub quality: Quality,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub prompt: String,
    pub image: Vec<u8>,
    pub image_filename: String,
    pub image_mime_type: Option<String>,
    pub output_format: OutputFormat,
}

/// Upstream image operations.
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> ToolResult<UpstreamImage>;

    async fn edit(&self, request: &EditRequest) -> ToolResult<UpstreamImage>;
}

#[derive(Debug, Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
    output_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<UpstreamImage>,
}

impl ImagesResponse {
    fn into_first(self) -> ToolResult<UpstreamImage> {
        let image = self.data.into_iter().next().ok_or_else(|| ImageToolError::UpstreamApi {
            status: None,
            message: "Response contained no images".to_string(),
        })?;

        if image.url.is_none() && image.b64_json.is_none() {
            return Err(ImageToolError::UpstreamApi {
                status: None,
                message: "Response image has neither url nor b64_json".to_string(),
            });
        }
        Ok(image)
    }
}

#[async_trait]
impl ImageApi for ImageApiClient {
    async fn generate(&self, request: &GenerationRequest) -> ToolResult<UpstreamImage> {
        let body = GenerationBody {
            model: self.model(),
            prompt: &request.prompt,
            n: 1,
            size: &request.size,
            quality: request.quality.label(),
            output_format: request.output_format.as_str(),
        };

        let start = std::time::Instant::now();
        let response: ImagesResponse = self.post_json("/images/generations", &body).await?;

        tracing::info!(
            model = %self.model(),
            size = %request.size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image generated"
        );

        response.into_first()
    }

    async fn edit(&self, request: &EditRequest) -> ToolResult<UpstreamImage> {
        let mut part = reqwest::multipart::Part::bytes(request.image.clone())
            .file_name(request.image_filename.clone());
        if let Some(mime) = request.image_mime_type.as_deref() {
            part = part.mime_str(mime).map_err(|e| {
                ImageToolError::InvalidInput(format!("Invalid image media type {}: {}", mime, e))
            })?;
        }

        let form = reqwest::multipart::Form::new()
            .text("model", self.model().to_string())
            .text("prompt", request.prompt.clone())
            .text("n", "1")
            .text("output_format", request.output_format.as_str().to_string())
            .part("image", part);

        let start = std::time::Instant::now();
        let response: ImagesResponse = self.post_multipart("/images/edits", form).await?;

        tracing::info!(
            model = %self.model(),
            input_bytes = request.image.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image edited"
        );

        response.into_first()
    }
}
