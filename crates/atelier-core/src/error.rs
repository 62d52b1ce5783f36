//! Error types module
//!
//! All failures produced by the loader, naming engine, directory organizer,
//! conflict resolver, persister and batch orchestrator are unified under
//! `ImageToolError`. Each variant self-describes through `ErrorMetadata` so the
//! MCP layer can render a category, a suggestion and a log level without
//! matching on variants itself.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use std::path::PathBuf;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like size limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Coarse error family shown to protocol clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    InputLoad,
    Download,
    Network,
    DiskSpace,
    FileSystem,
    BatchProcessing,
    UpstreamApi,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "ValidationError",
            ErrorCategory::InputLoad => "InputLoadError",
            ErrorCategory::Download => "DownloadError",
            ErrorCategory::Network => "NetworkError",
            ErrorCategory::DiskSpace => "DiskSpaceError",
            ErrorCategory::FileSystem => "FileSystemError",
            ErrorCategory::BatchProcessing => "BatchProcessingError",
            ErrorCategory::UpstreamApi => "UpstreamApiError",
            ErrorCategory::Internal => "InternalError",
        }
    }
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Metadata describing how an error should be presented and handled.
pub trait ErrorMetadata {
    /// Error family for the structured response
    fn category(&self) -> ErrorCategory;

    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether the failed operation may succeed if attempted again
    fn is_retryable(&self) -> bool;

    /// Suggested action for the caller
    fn suggested_action(&self) -> &'static str;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageToolError {
    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Download of {source_ref} failed after {attempts} attempt(s): {message}")]
    Download {
        source_ref: String,
        attempts: u32,
        message: String,
    },

    #[error("Size limit exceeded during transfer: {attempted} bytes attempted, {max} bytes allowed")]
    DiskSpace { attempted: u64, max: u64 },

    #[error("Failed to prepare directory {}: {message}", .path.display())]
    Directory { path: PathBuf, message: String },

    #[error("File already exists: {}", .0.display())]
    FileExists(PathBuf),

    #[error("Filesystem error at {}: {message}", .path.display())]
    FileSystem { path: PathBuf, message: String },

    #[error("Batch processing error: {0}")]
    BatchProcessing(String),

    #[error("Upstream API error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    UpstreamApi { status: Option<u16>, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for image tool operations
pub type ToolResult<T> = Result<T, ImageToolError>;

impl ImageToolError {
    /// Filesystem error carrying the attempted path.
    pub fn filesystem(path: impl Into<PathBuf>, err: impl Display) -> Self {
        ImageToolError::FileSystem {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<io::Error> for ImageToolError {
    fn from(err: io::Error) -> Self {
        ImageToolError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for ImageToolError {
    fn from(err: serde_json::Error) -> Self {
        ImageToolError::Internal(format!("JSON error: {}", err))
    }
}

impl From<base64::DecodeError> for ImageToolError {
    fn from(err: base64::DecodeError) -> Self {
        ImageToolError::InvalidInput(format!("Invalid base64 data: {}", err))
    }
}

/// Static metadata for each variant: (category, error_code, retryable, suggested_action, log_level).
fn static_metadata(
    err: &ImageToolError,
) -> (ErrorCategory, &'static str, bool, &'static str, LogLevel) {
    match err {
        ImageToolError::Validation(_) => (
            ErrorCategory::Validation,
            "INVALID_ARGUMENT",
            false,
            "Check the tool arguments against the usage example and try again",
            LogLevel::Debug,
        ),
        ImageToolError::InvalidOption(_) => (
            ErrorCategory::Validation,
            "INVALID_OPTION",
            false,
            "Supply the input required by the selected naming strategy or organization mode",
            LogLevel::Debug,
        ),
        ImageToolError::InvalidInput(_) => (
            ErrorCategory::InputLoad,
            "INVALID_INPUT",
            false,
            "Provide a valid http(s) URL, base64 image data, or a relative local path without '..'",
            LogLevel::Debug,
        ),
        ImageToolError::TooLarge { .. } => (
            ErrorCategory::InputLoad,
            "FILE_TOO_LARGE",
            false,
            "Resize or compress the image below the size limit",
            LogLevel::Warn,
        ),
        ImageToolError::NotFound(_) => (
            ErrorCategory::InputLoad,
            "NOT_FOUND",
            false,
            "Verify that the file exists and is a regular file",
            LogLevel::Debug,
        ),
        ImageToolError::UnsupportedFormat(_) => (
            ErrorCategory::InputLoad,
            "UNSUPPORTED_FORMAT",
            false,
            "Use a PNG, JPEG, WebP, GIF or BMP image",
            LogLevel::Debug,
        ),
        ImageToolError::Network(_) => (
            ErrorCategory::Network,
            "NETWORK_ERROR",
            true,
            "Check network connectivity and retry after a short delay",
            LogLevel::Warn,
        ),
        ImageToolError::Download { .. } => (
            ErrorCategory::Download,
            "DOWNLOAD_FAILED",
            false,
            "The remote image could not be fetched; retry later or request inline bytes",
            LogLevel::Error,
        ),
        ImageToolError::DiskSpace { .. } => (
            ErrorCategory::DiskSpace,
            "SIZE_LIMIT_EXCEEDED",
            false,
            "Raise MAX_FILE_SIZE_MB or request a smaller output format",
            LogLevel::Warn,
        ),
        ImageToolError::Directory { .. } => (
            ErrorCategory::FileSystem,
            "DIRECTORY_ERROR",
            false,
            "Check that the output directory is writable",
            LogLevel::Error,
        ),
        ImageToolError::FileExists(_) => (
            ErrorCategory::FileSystem,
            "FILE_EXISTS",
            false,
            "Choose another filename or use the autoRename conflict strategy",
            LogLevel::Debug,
        ),
        ImageToolError::FileSystem { .. } => (
            ErrorCategory::FileSystem,
            "FILESYSTEM_ERROR",
            false,
            "Check permissions and free space in the output directory",
            LogLevel::Error,
        ),
        ImageToolError::BatchProcessing(_) => (
            ErrorCategory::BatchProcessing,
            "BATCH_PROCESSING_ERROR",
            false,
            "Use a maxConcurrent value between 1 and 10 and at least one image",
            LogLevel::Debug,
        ),
        ImageToolError::UpstreamApi { .. } => (
            ErrorCategory::UpstreamApi,
            "UPSTREAM_API_ERROR",
            false,
            "Check the API key and request parameters; retry if the service was unavailable",
            LogLevel::Error,
        ),
        ImageToolError::Internal(_) => (
            ErrorCategory::Internal,
            "INTERNAL_ERROR",
            false,
            "Retry the request; report the error if it persists",
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for ImageToolError {
    fn category(&self) -> ErrorCategory {
        static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        static_metadata(self).1
    }

    fn is_retryable(&self) -> bool {
        static_metadata(self).2
    }

    fn suggested_action(&self) -> &'static str {
        static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        static_metadata(self).4
    }
}
