//! Filename generation.
//!
//! Four strategies are supported:
//!
//! - `timestamp`: `{prefix}_{YYYYMMDD}_{HHMMSS}_{6 hex}` with `prefix` defaulting to `image`
//! - `content`: sanitized prompt text followed by `_{YYYYMMDD}_{HHMMSS}`
//! - `custom`: `{prefix}_{sequence:03}`, sequence counted per prefix for the engine's lifetime
//! - `hash`: first 8 hex characters of a SHA-256 over the content (or the timestamp)
//!
//! All strategies are deterministic for a fixed content string and clock, except
//! `custom`, which is monotonic per prefix.

use atelier_core::constants::MAX_CONTENT_FILENAME_LENGTH;
use atelier_core::{ImageToolError, NamingStrategy, ToolResult};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

const DEFAULT_PREFIX: &str = "image";
const MAX_FILENAME_LENGTH: usize = 255;

/// Inputs available to a naming strategy.
#[derive(Debug, Clone, Copy)]
pub struct NamingContext<'a> {
    /// Prompt or other content the name may be derived from
    pub content: Option<&'a str>,
    /// Caller prefix for `custom` (required) and `timestamp` (optional)
    pub prefix: Option<&'a str>,
    /// Reference time; pass a fixed value for reproducible names
    pub now: DateTime<Utc>,
}

impl<'a> NamingContext<'a> {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            content: None,
            prefix: None,
            now,
        }
    }

    pub fn with_content(mut self, content: &'a str) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = Some(prefix);
        self
    }
}

/// Filename generator owning the per-prefix sequence counters.
///
/// Share one instance (behind an `Arc`) across concurrent saves so `custom`
/// sequence numbers never repeat.
#[derive(Debug)]
pub struct NamingEngine {
    counters: Mutex<HashMap<String, u32>>,
    max_content_length: usize,
}

impl Default for NamingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingEngine {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            max_content_length: MAX_CONTENT_FILENAME_LENGTH,
        }
    }

    /// Override the maximum filename length used by the `content` strategy.
    pub fn with_max_content_length(mut self, max_content_length: usize) -> Self {
        self.max_content_length = max_content_length;
        self
    }

    /// Generate `{name}.{extension}` for the given strategy.
    pub fn generate_filename(
        &self,
        strategy: NamingStrategy,
        context: &NamingContext<'_>,
        extension: &str,
    ) -> ToolResult<String> {
        let extension = sanitize_extension(extension)?;
        let stamp = context.now.format("%Y%m%d_%H%M%S").to_string();

        let stem = match strategy {
            NamingStrategy::Timestamp => {
                let prefix = context
                    .prefix
                    .and_then(sanitize_component)
                    .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
                let digest_source = context.content.unwrap_or(stamp.as_str());
                format!("{}_{}_{}", prefix, stamp, &sha256_hex(digest_source)[..6])
            }
            NamingStrategy::Content => {
                let content = context
                    .content
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| {
                        ImageToolError::InvalidOption(
                            "The content naming strategy requires prompt text".to_string(),
                        )
                    })?;

                let suffix = format!("_{}", stamp);
                let budget = self
                    .max_content_length
                    .saturating_sub(suffix.len() + extension.len() + 1)
                    .max(1);

                let mut slug = slugify(content);
                if slug.len() > budget {
                    slug.truncate(budget);
                    slug = slug.trim_end_matches('_').to_string();
                }
                if slug.is_empty() {
                    slug = DEFAULT_PREFIX.to_string();
                }
                format!("{}{}", slug, suffix)
            }
            NamingStrategy::Custom => {
                let prefix = context
                    .prefix
                    .and_then(sanitize_component)
                    .ok_or_else(|| {
                        ImageToolError::InvalidOption(
                            "The custom naming strategy requires a filename prefix".to_string(),
                        )
                    })?;
                let sequence = self.next_sequence(&prefix);
                format!("{}_{:03}", prefix, sequence)
            }
            NamingStrategy::Hash => {
                let source = context
                    .content
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| context.now.to_rfc3339());
                sha256_hex(&source)[..8].to_string()
            }
        };

        Ok(format!("{}.{}", stem, extension))
    }

    /// Increment and return the sequence number for `prefix` as one step.
    ///
    /// Sequences start at 1 and are scoped to this engine instance.
    pub fn next_sequence(&self, prefix: &str) -> u32 {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// Lowercase `[a-z0-9_]` slug with whitespace and punctuation collapsed to single underscores.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_separator = true; // Prevents leading underscore

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_separator = false;
        } else if (ch.is_whitespace() || ch == '_' || ch == '-') && !last_was_separator {
            slug.push('_');
            last_was_separator = true;
        }
    }

    slug.trim_end_matches('_').to_string()
}

/// Strip path separators and `..` from a user-supplied name component.
///
/// Keeps `[A-Za-z0-9_-]`, trims separator characters at both ends, and returns
/// `None` when nothing usable remains.
pub fn sanitize_component(input: &str) -> Option<String> {
    let cleaned: String = input
        .replace("..", "")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '_' || c == '-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sanitize a caller-supplied filename and force the output extension.
///
/// Rejects names containing path separators or `..`; other unsafe characters
/// are replaced with `_`. Any extension the caller typed is replaced by
/// `extension`.
pub fn sanitize_filename(filename: &str, extension: &str) -> ToolResult<String> {
    let extension = sanitize_extension(extension)?;

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ImageToolError::Validation(format!(
            "Filename must not contain path separators or '..': {}",
            filename
        )));
    }

    let trimmed = filename.trim();
    let stem = match trimmed.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_image_extension(ext) => stem,
        _ => trimmed,
    };

    let sanitized: String = stem
        .chars()
        .take(MAX_FILENAME_LENGTH - extension.len() - 1)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.trim_matches('.');
    if sanitized.trim_matches('_').is_empty() {
        return Err(ImageToolError::Validation(format!(
            "Filename has no usable characters: {}",
            filename
        )));
    }

    Ok(format!("{}.{}", sanitized, extension))
}

fn is_image_extension(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp"
    )
}

fn sanitize_extension(extension: &str) -> ToolResult<String> {
    let cleaned: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if cleaned.is_empty() {
        return Err(ImageToolError::InvalidOption(format!(
            "Invalid file extension: {:?}",
            extension
        )));
    }
    Ok(cleaned)
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
