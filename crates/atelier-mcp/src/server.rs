//! MCP server using rmcp SDK
//!
//! Exposes image generation, editing and batch editing as MCP tools over stdio.

use crate::render::render_error;
use crate::service::ImageToolService;
use crate::tools::*;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

fn text_content(s: impl Into<String>) -> Content {
    Content {
        raw: RawContent::Text(RawTextContent { text: s.into() }),
        annotations: None,
    }
}

fn json_result<T: Serialize>(body: &T) -> Result<CallToolResult, ErrorData> {
    let text = serde_json::to_string_pretty(body).map_err(|e| ErrorData {
        code: ErrorCode(-32603),
        message: Cow::from(e.to_string()),
        data: None,
    })?;
    Ok(CallToolResult::success(vec![text_content(text)]))
}

#[derive(Clone)]
pub struct ImageToolServer {
    service: Arc<ImageToolService>,
    tool_router: ToolRouter<ImageToolServer>,
}

#[tool_router]
impl ImageToolServer {
    pub fn new(service: ImageToolService) -> Self {
        Self {
            service: Arc::new(service),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Generate an image from an English prompt. Saves it to disk by default and returns the file path and metadata; base64 data is embedded only when requested and small enough"
    )]
    async fn generate_image(
        &self,
        Parameters(req): Parameters<GenerateImageRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let envelope = self
            .service
            .generate(req)
            .await
            .map_err(|e| render_error(&e, "generate_image"))?;
        json_result(&envelope)
    }

    #[tool(
        description = "Edit an image given as a URL, base64 data or local path (inpaint, outpaint, styleTransfer, objectRemoval, backgroundChange, variation)"
    )]
    async fn edit_image(
        &self,
        Parameters(req): Parameters<EditImageRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let envelope = self
            .service
            .edit(req)
            .await
            .map_err(|e| render_error(&e, "edit_image"))?;
        json_result(&envelope)
    }

    #[tool(
        description = "Apply one edit to many images with bounded concurrency. Individual failures are reported per item and do not stop the batch"
    )]
    async fn batch_edit_images(
        &self,
        Parameters(req): Parameters<BatchEditImagesRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self
            .service
            .batch_edit(req)
            .await
            .map_err(|e| render_error(&e, "batch_edit_images"))?;
        json_result(&result)
    }
}

#[tool_handler]
impl ServerHandler for ImageToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "atelier-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "Atelier MCP: generate, edit and batch edit images. Results are saved under \
                 DEFAULT_OUTPUT_DIR; set IMAGE_API_KEY to authenticate with the image API."
                    .to_string(),
            ),
        }
    }
}
