//! Atelier Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! the storage layer, the upstream API client and the MCP server.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorCategory, ErrorMetadata, ImageToolError, LogLevel, ToolResult};
pub use models::*;
