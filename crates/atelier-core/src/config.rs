//! Configuration module
//!
//! Environment-driven configuration for the upstream API client, the file output
//! pipeline and the response size governor. `.env` files are honoured through
//! `dotenvy`; every value has a documented default except the API credential.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_OUTPUT_DIR;

const API_BASE_URL: &str = "https://api.openai.com/v1";
const IMAGE_MODEL: &str = "gpt-image-1";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const DOWNLOAD_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 1000;
const MAX_FILE_SIZE_MB: u64 = 50;
const FILE_RETENTION_DAYS: u32 = 30;
const INLINE_WARNING_TOKENS: u64 = 15_000;
const INLINE_MAX_TOKENS: u64 = 25_000;
const BATCH_CHUNK_DELAY_MS: u64 = 1000;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    // Upstream image API
    pub api_key: String,
    pub api_base_url: String,
    pub image_model: String,
    pub request_timeout_secs: u64,
    // Downloads
    pub download_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    // File output
    pub default_output_dir: PathBuf,
    pub max_file_size_bytes: u64,
    pub file_output_enabled: bool,
    /// Age in days after which saved files are removed at startup. 0 = disabled.
    pub file_retention_days: u32,
    // Response size governor
    pub inline_warning_tokens: u64,
    pub inline_max_tokens: u64,
    // Batch processing
    pub batch_chunk_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: API_BASE_URL.to_string(),
            image_model: IMAGE_MODEL.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            download_timeout_secs: DOWNLOAD_TIMEOUT_SECS,
            max_retries: MAX_RETRIES,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
            default_output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            file_output_enabled: true,
            file_retention_days: FILE_RETENTION_DAYS,
            inline_warning_tokens: INLINE_WARNING_TOKENS,
            inline_max_tokens: INLINE_MAX_TOKENS,
            batch_chunk_delay_ms: BATCH_CHUNK_DELAY_MS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_key = env::var("IMAGE_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| anyhow::anyhow!("IMAGE_API_KEY (or OPENAI_API_KEY) must be set"))?;

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let config = Config {
            api_key,
            api_base_url: env::var("IMAGE_API_BASE_URL")
                .unwrap_or_else(|_| API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            image_model: env::var("IMAGE_MODEL").unwrap_or_else(|_| IMAGE_MODEL.to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            download_timeout_secs: env::var("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| DOWNLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_TIMEOUT_SECS),
            max_retries: env::var("MAX_RETRIES")
                .unwrap_or_else(|_| MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(MAX_RETRIES),
            retry_base_delay_ms: env::var("RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| RETRY_BASE_DELAY_MS.to_string())
                .parse()
                .unwrap_or(RETRY_BASE_DELAY_MS),
            default_output_dir: env::var("DEFAULT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            file_output_enabled: env::var("ENABLE_FILE_OUTPUT")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            file_retention_days: env::var("FILE_RETENTION_DAYS")
                .unwrap_or_else(|_| FILE_RETENTION_DAYS.to_string())
                .parse()
                .unwrap_or(FILE_RETENTION_DAYS),
            inline_warning_tokens: env::var("INLINE_WARNING_TOKENS")
                .unwrap_or_else(|_| INLINE_WARNING_TOKENS.to_string())
                .parse()
                .unwrap_or(INLINE_WARNING_TOKENS),
            inline_max_tokens: env::var("INLINE_MAX_TOKENS")
                .unwrap_or_else(|_| INLINE_MAX_TOKENS.to_string())
                .parse()
                .unwrap_or(INLINE_MAX_TOKENS),
            batch_chunk_delay_ms: env::var("BATCH_CHUNK_DELAY_MS")
                .unwrap_or_else(|_| BATCH_CHUNK_DELAY_MS.to_string())
                .parse()
                .unwrap_or(BATCH_CHUNK_DELAY_MS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("IMAGE_API_KEY must not be empty"));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "IMAGE_API_BASE_URL must be an http(s) URL, got {}",
                self.api_base_url
            ));
        }

        if self.request_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "REQUEST_TIMEOUT_SECS and DOWNLOAD_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than zero"));
        }

        if self.inline_warning_tokens >= self.inline_max_tokens {
            return Err(anyhow::anyhow!(
                "INLINE_WARNING_TOKENS ({}) must be lower than INLINE_MAX_TOKENS ({})",
                self.inline_warning_tokens,
                self.inline_max_tokens
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn batch_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.batch_chunk_delay_ms)
    }
}
