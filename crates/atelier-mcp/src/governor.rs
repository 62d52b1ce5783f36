//! Response size governor.
//!
//! Estimates how many protocol tokens a response would cost if image bytes were
//! embedded as base64, and refuses to embed them above a hard ceiling.

use atelier_core::Config;

/// Fixed cost of the envelope and metadata.
pub const ENVELOPE_OVERHEAD_TOKENS: u64 = 200;

/// Average base64 characters per token.
const CHARS_PER_TOKEN: u64 = 4;

/// Structural/escaping inflation applied to the inline estimate, in percent.
const INFLATION_PERCENT: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineDecision {
    pub include: bool,
    pub estimated_cost: u64,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseGovernor {
    warning_tokens: u64,
    max_tokens: u64,
}

impl ResponseGovernor {
    pub fn new(warning_tokens: u64, max_tokens: u64) -> Self {
        Self {
            warning_tokens,
            max_tokens,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.inline_warning_tokens, config.inline_max_tokens)
    }

    pub fn max_tokens(&self) -> u64 {
        self.max_tokens
    }

    /// Token estimate for embedding `byte_len` raw bytes as base64.
    pub fn estimate_inline_tokens(byte_len: u64) -> u64 {
        let base64_len = byte_len.div_ceil(3) * 4;
        (base64_len * INFLATION_PERCENT).div_ceil(CHARS_PER_TOKEN * 100)
    }

    /// Decide whether `byte_len` bytes may be embedded in the response.
    ///
    /// When inlining was not requested only the envelope overhead is counted.
    pub fn should_inline_bytes(&self, byte_len: u64, requested: bool) -> InlineDecision {
        if !requested {
            return InlineDecision {
                include: false,
                estimated_cost: ENVELOPE_OVERHEAD_TOKENS,
                warning: None,
            };
        }

        let estimated_cost = ENVELOPE_OVERHEAD_TOKENS + Self::estimate_inline_tokens(byte_len);

        if estimated_cost >= self.max_tokens {
            return InlineDecision {
                include: false,
                estimated_cost,
                warning: Some(format!(
                    "Inline image data omitted: estimated {} tokens does not fit under the {} token limit. \
                     Use filePath or remoteUrl to access the image.",
                    estimated_cost, self.max_tokens
                )),
            };
        }

        let warning = (estimated_cost > self.warning_tokens).then(|| {
            format!(
                "Inline image data is large (estimated {} tokens); consider saving to a file instead.",
                estimated_cost
            )
        });

        InlineDecision {
            include: true,
            estimated_cost,
            warning,
        }
    }
}

impl Default for ResponseGovernor {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
