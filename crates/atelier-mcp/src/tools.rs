//! MCP tool request types with JSON Schema for AI parameter generation

use atelier_core::{
    AspectRatio, ConflictStrategy, EditKind, ErrorHandling, FileOutputRequest, ImageInput,
    NamingStrategy, OrganizeBy, OutputFormat, Quality,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::PathBuf;

/// File output options shared by all three tools.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    #[schemars(description = "Save the image to disk (default true)")]
    pub save: Option<bool>,
    #[schemars(description = "Base output directory (default ./generated_images)")]
    pub output_directory: Option<String>,
    #[schemars(description = "Explicit filename; the extension is forced to the output format")]
    pub filename: Option<String>,
    #[schemars(description = "Prefix for the timestamp and custom naming strategies")]
    pub filename_prefix: Option<String>,
    #[schemars(description = "Filename strategy: timestamp (default), content, custom or hash")]
    pub naming_strategy: Option<NamingStrategy>,
    #[schemars(description = "Subdirectory mode: none (default), date, dimensionRatio or quality")]
    pub organize_by: Option<OrganizeBy>,
    #[schemars(description = "What to do when the file exists: autoRename (default), overwrite or skip")]
    pub conflict_strategy: Option<ConflictStrategy>,
}

impl OutputOptions {
    pub fn to_file_request(&self, default_prefix: Option<&str>) -> FileOutputRequest {
        FileOutputRequest {
            save: self.save.unwrap_or(true),
            output_directory: self.output_directory.as_ref().map(PathBuf::from),
            filename: self.filename.clone(),
            prefix: self
                .filename_prefix
                .clone()
                .or_else(|| default_prefix.map(str::to_string)),
            naming_strategy: self.naming_strategy.unwrap_or_default(),
            organize_by: self.organize_by.unwrap_or_default(),
            conflict_strategy: self.conflict_strategy.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[schemars(description = "English description of the image to generate")]
    pub prompt: String,
    #[schemars(description = "square (1024x1024, default), landscape (1536x1024) or portrait (1024x1536)")]
    pub aspect_ratio: Option<AspectRatio>,
    #[schemars(description = "auto (default), low, medium or high")]
    pub quality: Option<Quality>,
    #[schemars(description = "png (default), jpeg or webp")]
    pub output_format: Option<OutputFormat>,
    #[schemars(description = "Embed base64 image data in the response when it fits (default false)")]
    pub include_inline_bytes: Option<bool>,
    #[serde(flatten)]
    pub output: OutputOptions,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditImageRequest {
    #[schemars(description = "Image to edit: {\"kind\": \"url\" | \"inline\" | \"local\", \"value\": \"...\"}")]
    pub source_image: ImageInput,
    #[schemars(description = "English description of the edit")]
    pub edit_prompt: String,
    #[schemars(description = "inpaint, outpaint, styleTransfer, objectRemoval, backgroundChange or variation (default)")]
    pub edit_kind: Option<EditKind>,
    #[schemars(description = "Edit strength between 0 and 1 (default 0.8)")]
    pub strength: Option<f64>,
    #[schemars(description = "Keep the original composition (default true)")]
    pub preserve_composition: Option<bool>,
    #[schemars(description = "png (default), jpeg or webp")]
    pub output_format: Option<OutputFormat>,
    #[schemars(description = "Embed base64 image data in the response when it fits (default false)")]
    pub include_inline_bytes: Option<bool>,
    #[serde(flatten)]
    pub output: OutputOptions,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSettingsParams {
    #[schemars(description = "Process items of a chunk concurrently (default true)")]
    pub parallel: Option<bool>,
    #[schemars(description = "Chunk size, between 1 and 10 (default 3)")]
    pub max_concurrent: Option<i64>,
    #[schemars(description = "failFast, continueOnError (default) or retryFailed")]
    pub error_handling: Option<ErrorHandling>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchEditImagesRequest {
    #[schemars(description = "Images to edit, each {\"kind\": ..., \"value\": ...}")]
    pub images: Vec<ImageInput>,
    #[schemars(description = "English description of the edit applied to every image")]
    pub edit_prompt: String,
    pub edit_kind: Option<EditKind>,
    #[schemars(description = "Edit strength between 0 and 1 (default 0.8)")]
    pub strength: Option<f64>,
    pub preserve_composition: Option<bool>,
    pub output_format: Option<OutputFormat>,
    pub batch_settings: Option<BatchSettingsParams>,
    #[serde(flatten)]
    pub output: OutputOptions,
}
