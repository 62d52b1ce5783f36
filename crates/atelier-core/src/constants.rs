//! Limits and defaults shared across crates.

/// Ceiling for any image accepted as edit input (decoded bytes).
pub const MAX_INPUT_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Raster formats accepted from local paths.
pub const ALLOWED_INPUT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

pub const DEFAULT_OUTPUT_DIR: &str = "./generated_images";

/// Batch concurrency bounds.
pub const MIN_BATCH_CONCURRENCY: usize = 1;
pub const MAX_BATCH_CONCURRENCY: usize = 10;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

/// Upper bound on auto-rename attempts before giving up.
pub const MAX_RENAME_ATTEMPTS: u32 = 100;

/// Longest filename produced by the content naming strategy, extension included.
pub const MAX_CONTENT_FILENAME_LENGTH: usize = 100;
