//! MCP (Model Context Protocol) server for the element inspector
//!
//! Each rmcp tool forwards to the matching tool in the session's
//! [`ToolRegistry`](crate::tools::ToolRegistry).

pub mod handler;
pub use handler::InspectorServer;

use crate::error::BrowserError;
use crate::tools::{
    ToolContext, ToolResult as InternalToolResult, detect::DetectFrameworkParams, inspect::InspectParams,
    navigate::NavigateParams, screenshot::ScreenshotParams,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    tool, tool_router,
};
use serde_json::Value;

/// Convert internal ToolResult to MCP CallToolResult
fn convert_result(result: InternalToolResult) -> Result<CallToolResult, McpError> {
    if result.success {
        let text = if let Some(data) = result.data {
            serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string())
        } else {
            "Success".to_string()
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    } else {
        let error_msg = result.error.unwrap_or_else(|| "Unknown error".to_string());
        Err(McpError::internal_error(error_msg, None))
    }
}

/// Image content from a `data:image/png;base64,…` URL
fn image_content(data_url: &str) -> Option<Content> {
    let (header, data) = data_url.split_once(',')?;
    let mime_type = header.strip_prefix("data:")?.strip_suffix(";base64")?;
    Some(Content::image(data.to_string(), mime_type.to_string()))
}

/// The report as text, followed by the screenshot when one was taken
fn convert_inspect_result(result: InternalToolResult) -> Result<CallToolResult, McpError> {
    if !result.success {
        return convert_result(result);
    }

    let data = result.data.unwrap_or(Value::Null);
    let markdown = data
        .get("markdown")
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::internal_error("Inspect returned no report", None))?;

    let mut contents = vec![Content::text(markdown)];
    if let Some(image) = data.get("screenshot").and_then(Value::as_str).and_then(image_content) {
        contents.push(image);
    }
    if let Some(error) = data.get("screenshot_error").and_then(Value::as_str) {
        contents.push(Content::text(format!("Screenshot failed: {}", error)));
    }
    Ok(CallToolResult::success(contents))
}

impl InspectorServer {
    fn run_tool(&self, name: &str, params: Value) -> Result<InternalToolResult, McpError> {
        let session = self.session();
        let mut context = ToolContext::new(&session);

        session.tool_registry().execute(name, params, &mut context).map_err(|e| match e {
            BrowserError::InvalidArgument(_) | BrowserError::InvalidSelector { .. } => {
                McpError::invalid_params(e.to_string(), None)
            }
            _ => McpError::internal_error(e.to_string(), None),
        })
    }
}

fn to_params<T: serde::Serialize>(params: &T) -> Result<Value, McpError> {
    serde_json::to_value(params).map_err(|e| McpError::invalid_params(e.to_string(), None))
}

#[tool_router]
impl InspectorServer {
    /// Navigate to a URL
    #[tool(description = "Navigate the inspected browser tab to a URL")]
    fn browser_navigate(&self, params: Parameters<NavigateParams>) -> Result<CallToolResult, McpError> {
        let result = self.run_tool("navigate", to_params(&params.0)?)?;
        convert_result(result)
    }

    /// Pick an element and report it
    #[tool(
        description = "Pick an element by CSS selector or index and return a Markdown report with its selector, \
                       attributes, text, React/Vue component props and state, plus an optional highlighted screenshot"
    )]
    fn inspect_element(&self, params: Parameters<InspectParams>) -> Result<CallToolResult, McpError> {
        if params.0.selector.is_none() && params.0.index.is_none() {
            return Err(McpError::invalid_params("Either selector or index must be provided", None));
        }

        let result = self.run_tool("inspect", to_params(&params.0)?)?;
        convert_inspect_result(result)
    }

    /// Report the page's UI framework
    #[tool(description = "Detect whether the current page uses React or Vue and which meta-framework hosts it")]
    fn detect_framework(&self, params: Parameters<DetectFrameworkParams>) -> Result<CallToolResult, McpError> {
        let result = self.run_tool("detect_framework", to_params(&params.0)?)?;
        convert_result(result)
    }

    /// Take a screenshot of the page
    #[tool(description = "Capture the visible viewport, optionally outlining the element matching a CSS selector")]
    fn browser_screenshot(&self, params: Parameters<ScreenshotParams>) -> Result<CallToolResult, McpError> {
        let result = self.run_tool("screenshot", to_params(&params.0)?)?;
        if !result.success {
            return convert_result(result);
        }

        let image = result
            .data
            .as_ref()
            .and_then(|data| data.get("data_url"))
            .and_then(Value::as_str)
            .and_then(image_content)
            .ok_or_else(|| McpError::internal_error("Screenshot returned no image", None))?;
        Ok(CallToolResult::success(vec![image]))
    }
}
