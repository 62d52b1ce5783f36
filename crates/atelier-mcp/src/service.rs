//! Tool operations: generate, edit and batch edit.
//!
//! Each operation validates its arguments, calls the upstream API, persists
//! the result through the storage layer and shapes the response through the
//! size governor.

use crate::batch::{BatchItemOutput, BatchOrchestrator};
use crate::governor::ResponseGovernor;
use crate::tools::{BatchEditImagesRequest, EditImageRequest, GenerateImageRequest};
use atelier_api_client::{EditRequest, GenerationRequest, ImageApi, UpstreamImage};
use atelier_core::constants::DEFAULT_BATCH_CONCURRENCY;
use atelier_core::{
    AspectRatio, BatchResult, BatchSettings, Config, EditKind, ErrorCategory, ErrorMetadata,
    FileOutputRequest, ImageInput, ImageMetadata, ImageToolError, OutputFormat, ResponseEnvelope,
    SavedImage, ToolResult,
};
use atelier_storage::formats::{decode_base64_strict, probe_dimensions, split_data_url};
use atelier_storage::{
    FilePersister, ImageInputLoader, ImageSource, LoadedImage, NamingEngine, SaveContext,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_STRENGTH: f64 = 0.8;
const EDIT_PREFIX: &str = "edited_";
const BATCH_PREFIX: &str = "batch_";

/// Reject empty text and text that is mostly non-Latin script.
///
/// At least half of the alphabetic characters must be ASCII letters.
pub fn validate_english_text<'a>(text: &'a str, field: &str) -> ToolResult<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ImageToolError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }

    let alphabetic = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    let ascii = trimmed.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if alphabetic > 0 && ascii * 2 < alphabetic {
        return Err(ImageToolError::Validation(format!(
            "{} must be written in English",
            field
        )));
    }

    Ok(trimmed)
}

pub fn validate_strength(strength: Option<f64>) -> ToolResult<f64> {
    let strength = strength.unwrap_or(DEFAULT_STRENGTH);
    if !strength.is_finite() || !(0.0..=1.0).contains(&strength) {
        return Err(ImageToolError::Validation(format!(
            "strength must be between 0 and 1, got {}",
            strength
        )));
    }
    Ok(strength)
}

/// Upstream prompt for an edit: the edit kind's instruction, the caller's
/// text and the strength/composition hints.
pub fn compose_edit_prompt(
    kind: EditKind,
    edit_prompt: &str,
    strength: f64,
    preserve_composition: bool,
) -> String {
    let composition = if preserve_composition {
        "Preserve the original composition and framing."
    } else {
        "The composition may change."
    };
    format!(
        "{}. {} Edit strength: {:.2}. {}",
        kind.instruction(),
        edit_prompt,
        strength,
        composition
    )
}

/// Aspect-ratio label closest to the given pixel dimensions.
pub fn classify_aspect(width: u32, height: u32) -> AspectRatio {
    match width.cmp(&height) {
        std::cmp::Ordering::Equal => AspectRatio::Square,
        std::cmp::Ordering::Greater => AspectRatio::Landscape,
        std::cmp::Ordering::Less => AspectRatio::Portrait,
    }
}

/// Shared edit parameters for single and batch edits.
#[derive(Debug, Clone)]
struct EditPlan {
    edit_prompt: String,
    upstream_prompt: String,
    output_format: OutputFormat,
    file_request: FileOutputRequest,
}

/// Outcome of persisting one upstream image.
struct Persisted {
    saved: Option<SavedImage>,
    warnings: Vec<String>,
}

pub struct ImageToolService {
    api: Arc<dyn ImageApi>,
    loader: ImageInputLoader,
    persister: FilePersister,
    governor: ResponseGovernor,
    chunk_delay: Duration,
}

impl ImageToolService {
    pub fn new(config: &Config, api: Arc<dyn ImageApi>) -> ToolResult<Self> {
        let naming = Arc::new(NamingEngine::new());
        Ok(Self {
            api,
            loader: ImageInputLoader::new(config.download_timeout())?,
            persister: FilePersister::new(config, naming)?,
            governor: ResponseGovernor::from_config(config),
            chunk_delay: config.batch_chunk_delay(),
        })
    }

    #[tracing::instrument(skip(self, req), fields(aspect_ratio = tracing::field::Empty, save = tracing::field::Empty))]
    pub async fn generate(&self, req: GenerateImageRequest) -> ToolResult<ResponseEnvelope> {
        let prompt = validate_english_text(&req.prompt, "prompt")?.to_string();
        let aspect_ratio = req.aspect_ratio.unwrap_or_default();
        let quality = req.quality.unwrap_or_default();
        let output_format = req.output_format.unwrap_or_default();
        let file_request = req.output.to_file_request(None);

        let span = tracing::Span::current();
        span.record("aspect_ratio", aspect_ratio.label());
        span.record("save", file_request.save);

        let upstream = self
            .api
            .generate(&GenerationRequest {
                prompt: prompt.clone(),
                size: aspect_ratio.size_param(),
                quality,
                output_format,
            })
            .await?;

        let context = SaveContext::new(output_format)
            .with_prompt(prompt)
            .with_aspect_ratio(aspect_ratio)
            .with_quality(quality);
        let persisted = self.persist(&upstream, &file_request, &context).await?;

        let (width, height) = aspect_ratio.dimensions();
        self.build_envelope(
            upstream,
            persisted,
            output_format,
            req.include_inline_bytes.unwrap_or(false),
            Some((width, height)),
            None,
        )
        .await
    }

    #[tracing::instrument(skip(self, req), fields(source = %req.source_image.reference()))]
    pub async fn edit(&self, req: EditImageRequest) -> ToolResult<ResponseEnvelope> {
        let plan = self.plan_edit(
            &req.edit_prompt,
            req.edit_kind,
            req.strength,
            req.preserve_composition,
            req.output_format,
            req.output.to_file_request(Some(EDIT_PREFIX)),
        )?;

        let source = self.loader.load(&req.source_image).await?;
        let source_dimensions = probe_dimensions(&source.data);

        let upstream = self.call_edit(&plan, &source).await?;
        let context = self.edit_context(&plan, source_dimensions);
        let persisted = self.persist(&upstream, &plan.file_request, &context).await?;

        self.build_envelope(
            upstream,
            persisted,
            plan.output_format,
            req.include_inline_bytes.unwrap_or(false),
            None,
            source_dimensions,
        )
        .await
    }

    #[tracing::instrument(skip(self, req), fields(image_count = req.images.len()))]
    pub async fn batch_edit(&self, req: BatchEditImagesRequest) -> ToolResult<BatchResult> {
        let params = req.batch_settings.clone().unwrap_or_default();
        let max_concurrent = params
            .max_concurrent
            .map(|n| usize::try_from(n).unwrap_or(0))
            .unwrap_or(DEFAULT_BATCH_CONCURRENCY);
        let orchestrator = BatchOrchestrator::new(BatchSettings {
            parallel: params.parallel.unwrap_or(true),
            max_concurrent,
            error_handling: params.error_handling.unwrap_or_default(),
            chunk_delay: self.chunk_delay,
        })?;

        let plan = self.plan_edit(
            &req.edit_prompt,
            req.edit_kind,
            req.strength,
            req.preserve_composition,
            req.output_format,
            req.output.to_file_request(Some(BATCH_PREFIX)),
        )?;

        let plan = &plan;
        orchestrator
            .run(req.images, ImageInput::reference, |_, input| async move {
                self.edit_batch_item(plan, input).await
            })
            .await
    }

    async fn edit_batch_item(
        &self,
        plan: &EditPlan,
        input: ImageInput,
    ) -> ToolResult<BatchItemOutput> {
        let source = self.loader.load(&input).await?;
        let source_dimensions = probe_dimensions(&source.data);

        let upstream = self.call_edit(plan, &source).await?;

        // Persistence failures are item failures here; there is no response to degrade.
        let context = self.edit_context(plan, source_dimensions);
        let saved = match self.source_for(&upstream) {
            Some(image_source) => {
                self.persister
                    .save(&image_source, &plan.file_request, &context)
                    .await?
            }
            None => None,
        };

        Ok(BatchItemOutput {
            saved_image: saved,
            remote_url: upstream.url,
        })
    }

    fn plan_edit(
        &self,
        edit_prompt: &str,
        edit_kind: Option<EditKind>,
        strength: Option<f64>,
        preserve_composition: Option<bool>,
        output_format: Option<OutputFormat>,
        file_request: FileOutputRequest,
    ) -> ToolResult<EditPlan> {
        let edit_prompt = validate_english_text(edit_prompt, "editPrompt")?.to_string();
        let strength = validate_strength(strength)?;
        let upstream_prompt = compose_edit_prompt(
            edit_kind.unwrap_or_default(),
            &edit_prompt,
            strength,
            preserve_composition.unwrap_or(true),
        );

        Ok(EditPlan {
            edit_prompt,
            upstream_prompt,
            output_format: output_format.unwrap_or_default(),
            file_request,
        })
    }

    async fn call_edit(&self, plan: &EditPlan, source: &LoadedImage) -> ToolResult<UpstreamImage> {
        self.api
            .edit(&EditRequest {
                prompt: plan.upstream_prompt.clone(),
                image: source.data.clone(),
                image_filename: source.filename.clone(),
                image_mime_type: source.mime_type.clone(),
                output_format: plan.output_format,
            })
            .await
    }

    fn edit_context(&self, plan: &EditPlan, source_dimensions: Option<(u32, u32)>) -> SaveContext {
        let mut context =
            SaveContext::new(plan.output_format).with_prompt(plan.edit_prompt.clone());
        if let Some((width, height)) = source_dimensions {
            context = context.with_aspect_ratio(classify_aspect(width, height));
        }
        context
    }

    fn source_for(&self, upstream: &UpstreamImage) -> Option<ImageSource> {
        if let Some(b64) = &upstream.b64_json {
            Some(ImageSource::Inline(b64.clone()))
        } else {
            upstream.url.clone().map(ImageSource::Remote)
        }
    }

    /// Persist the upstream image.
    ///
    /// A failure to save inline data is downgraded to a warning since the
    /// caller still gets a usable result. Invalid output options and remote
    /// download failures propagate.
    async fn persist(
        &self,
        upstream: &UpstreamImage,
        request: &FileOutputRequest,
        context: &SaveContext,
    ) -> ToolResult<Persisted> {
        let Some(source) = self.source_for(upstream) else {
            return Ok(Persisted {
                saved: None,
                warnings: Vec::new(),
            });
        };

        match self.persister.save(&source, request, context).await {
            Ok(saved) => Ok(Persisted {
                saved,
                warnings: Vec::new(),
            }),
            Err(e)
                if matches!(source, ImageSource::Inline(_))
                    && e.category() != ErrorCategory::Validation =>
            {
                tracing::warn!(error = %e, "Failed to save inline image, returning without a local copy");
                Ok(Persisted {
                    saved: None,
                    warnings: vec![format!("Image was not saved locally: {}", e)],
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Raw output bytes when they are available without a network round trip.
    ///
    /// Upstream base64 is decoded in memory; the saved file is read back only
    /// when `read_saved` is set.
    async fn local_bytes(
        &self,
        upstream: &UpstreamImage,
        saved: Option<&SavedImage>,
        read_saved: bool,
    ) -> Option<Vec<u8>> {
        if let Some(b64) = &upstream.b64_json {
            let (_, payload) = split_data_url(b64);
            return decode_base64_strict(payload).ok();
        }
        match saved {
            Some(saved) if read_saved => tokio::fs::read(&saved.local_path).await.ok(),
            _ => None,
        }
    }

    async fn build_envelope(
        &self,
        upstream: UpstreamImage,
        persisted: Persisted,
        output_format: OutputFormat,
        include_inline: bool,
        known_dimensions: Option<(u32, u32)>,
        source_dimensions: Option<(u32, u32)>,
    ) -> ToolResult<ResponseEnvelope> {
        let Persisted { saved, mut warnings } = persisted;

        let read_saved = include_inline || known_dimensions.is_none();
        let mut bytes = self
            .local_bytes(&upstream, saved.as_ref(), read_saved)
            .await;
        if include_inline && bytes.is_none() {
            if let Some(url) = &upstream.url {
                match self.loader.load(&ImageInput::Url(url.clone())).await {
                    Ok(loaded) => bytes = Some(loaded.data),
                    Err(e) => warnings.push(format!("Inline image data unavailable: {}", e)),
                }
            }
        }

        let (width, height) = known_dimensions
            .or_else(|| bytes.as_deref().and_then(probe_dimensions))
            .or(source_dimensions)
            .unwrap_or((0, 0));

        let size_bytes = saved
            .as_ref()
            .map(|s| s.size_bytes)
            .or_else(|| bytes.as_ref().map(|b| b.len() as u64));

        let byte_len = bytes.as_ref().map(|b| b.len() as u64).unwrap_or(0);
        let decision = self
            .governor
            .should_inline_bytes(byte_len, include_inline && bytes.is_some());
        if let Some(warning) = decision.warning {
            warnings.push(warning);
        }

        let inline_data = match bytes {
            Some(data) if decision.include => Some(STANDARD.encode(data)),
            _ => None,
        };

        let format = saved
            .as_ref()
            .map(|s| s.format.clone())
            .unwrap_or_else(|| output_format.as_str().to_string());

        if saved.is_none() && upstream.url.is_none() && inline_data.is_none() {
            warnings.push(
                "Image was neither saved nor embedded: enable saving or set includeInlineBytes \
                 to keep the result."
                    .to_string(),
            );
        }

        Ok(ResponseEnvelope {
            file_path: saved.as_ref().map(|s| s.local_path.display().to_string()),
            remote_url: upstream.url,
            metadata: ImageMetadata {
                width,
                height,
                format,
                size_bytes,
                created_at: Utc::now(),
            },
            saved_image: saved,
            inline_data,
            revised_prompt: upstream.revised_prompt,
            estimated_tokens: decision.estimated_cost,
            warnings,
        })
    }
}
