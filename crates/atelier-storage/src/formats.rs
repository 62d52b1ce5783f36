//! Media type helpers shared by the loader and the persister.

use atelier_core::{ImageToolError, ToolResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;

/// Short format name for an image media type (`image/jpeg` -> `jpeg`).
pub fn format_from_mime(mime: &str) -> Option<&'static str> {
    let normalized = mime.split(';').next().unwrap_or("").trim().to_lowercase();
    match normalized.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpeg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/bmp" => Some("bmp"),
        _ => None,
    }
}

/// Short format name derived from a file extension.
pub fn format_from_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpeg"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        "bmp" => Some("bmp"),
        _ => None,
    }
}

pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    match format_from_path(path)? {
        "png" => Some("image/png"),
        "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Split an optional `data:<mime>;base64,` header from a base64 payload.
///
/// Returns the declared media type (if any) and the bare payload.
pub fn split_data_url(data: &str) -> (Option<String>, &str) {
    let trimmed = data.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            let mime = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_lowercase());
            return (mime, payload);
        }
    }
    (None, trimmed)
}

/// Decoded length of a base64 payload, ignoring line-wrapping whitespace.
pub fn decoded_len_estimate(payload: &str) -> u64 {
    let significant = payload.bytes().filter(|b| !b.is_ascii_whitespace());
    let mut len = 0u64;
    let mut padding = 0u64;
    for byte in significant {
        len += 1;
        if byte == b'=' {
            padding += 1;
        } else {
            padding = 0;
        }
    }
    let partial = match len % 4 {
        2 => 1,
        3 => 2,
        _ => 0,
    };
    ((len / 4) * 3 + partial).saturating_sub(padding)
}

/// Decode base64 after checking the payload only uses the standard alphabet.
///
/// ASCII whitespace (line wrapping) is ignored; anything else outside
/// `A-Z a-z 0-9 + / =` is rejected before decoding.
pub fn decode_base64_strict(payload: &str) -> ToolResult<Vec<u8>> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if compact.is_empty() {
        return Err(ImageToolError::InvalidInput(
            "Inline image data is empty".to_string(),
        ));
    }

    if let Some(bad) = compact
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '+' || *c == '/' || *c == '='))
    {
        return Err(ImageToolError::InvalidInput(format!(
            "Inline image data contains a non-base64 character: {:?}",
            bad
        )));
    }

    Ok(STANDARD.decode(compact.as_bytes())?)
}

/// Read image dimensions from encoded bytes without decoding pixels.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;
    reader.into_dimensions().ok()
}
