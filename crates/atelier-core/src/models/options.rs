//! Enumerated tool options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape,
    Portrait,
}

impl AspectRatio {
    /// Pixel dimensions requested from the upstream API.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1024, 1024),
            AspectRatio::Landscape => (1536, 1024),
            AspectRatio::Portrait => (1024, 1536),
        }
    }

    /// Upstream `size` parameter, e.g. `1536x1024`.
    pub fn size_param(&self) -> String {
        let (w, h) = self.dimensions();
        format!("{}x{}", w, h)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Square => "square",
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Auto,
    Low,
    Medium,
    High,
}

impl Quality {
    pub fn label(&self) -> &'static str {
        match self {
            Quality::Auto => "auto",
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }

    /// Upstream `output_format` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Algorithm used to derive a filename when none is supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NamingStrategy {
    /// `image_{YYYYMMDD}_{HHMMSS}_{6 hex}`
    #[default]
    Timestamp,
    /// Sanitized prompt text followed by a timestamp suffix
    Content,
    /// `{prefix}_{sequence:03}` with a per-prefix counter
    Custom,
    /// First 8 hex characters of a content hash
    Hash,
}

/// Subdirectory policy applied under the base output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OrganizeBy {
    #[default]
    None,
    Date,
    #[serde(alias = "dimension-ratio", alias = "aspectRatio")]
    DimensionRatio,
    Quality,
}

/// What to do when the computed path already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ConflictStrategy {
    Overwrite,
    Skip,
    #[default]
    #[serde(alias = "auto-rename")]
    AutoRename,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum EditKind {
    Inpaint,
    Outpaint,
    StyleTransfer,
    ObjectRemoval,
    BackgroundChange,
    #[default]
    Variation,
}

impl EditKind {
    /// Instruction preamble sent ahead of the caller's edit prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            EditKind::Inpaint => "Fill in or repaint the indicated region of the image",
            EditKind::Outpaint => "Extend the image beyond its current borders",
            EditKind::StyleTransfer => "Re-render the image in a new artistic style",
            EditKind::ObjectRemoval => "Remove the described object and fill the gap naturally",
            EditKind::BackgroundChange => "Replace the background while keeping the subject intact",
            EditKind::Variation => "Create a variation of the image",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EditKind::Inpaint => "inpaint",
            EditKind::Outpaint => "outpaint",
            EditKind::StyleTransfer => "styleTransfer",
            EditKind::ObjectRemoval => "objectRemoval",
            EditKind::BackgroundChange => "backgroundChange",
            EditKind::Variation => "variation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_dimensions() {
        assert_eq!(AspectRatio::Square.dimensions(), (1024, 1024));
        assert_eq!(AspectRatio::Landscape.size_param(), "1536x1024");
        assert_eq!(AspectRatio::Portrait.label(), "portrait");
    }

    #[test]
    fn test_organize_by_accepts_hyphenated_alias() {
        let parsed: OrganizeBy = serde_json::from_str("\"dimension-ratio\"").unwrap();
        assert_eq!(parsed, OrganizeBy::DimensionRatio);
        let parsed: OrganizeBy = serde_json::from_str("\"dimensionRatio\"").unwrap();
        assert_eq!(parsed, OrganizeBy::DimensionRatio);
    }

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Jpeg.as_str(), "jpeg");
        assert_eq!(OutputFormat::default().mime_type(), "image/png");
    }

    #[test]
    fn test_edit_kind_parses_camel_case() {
        let parsed: EditKind = serde_json::from_str("\"styleTransfer\"").unwrap();
        assert_eq!(parsed, EditKind::StyleTransfer);
    }
}
