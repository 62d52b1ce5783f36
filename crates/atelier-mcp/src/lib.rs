//! Atelier MCP Server
//!
//! Model Context Protocol server that exposes image generation, editing and
//! batch editing as tools for AI assistants, with local file output and a
//! response size governor.

pub mod batch;
pub mod governor;
pub mod render;
pub mod server;
pub mod service;
pub mod tools;

pub use atelier_api_client::{ImageApi, ImageApiClient};
pub use batch::{BatchItemOutput, BatchOrchestrator};
pub use governor::{InlineDecision, ResponseGovernor};
pub use server::ImageToolServer;
pub use service::ImageToolService;
