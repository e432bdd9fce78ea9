use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the screenshot tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScreenshotParams {
    /// Outline the element matching this CSS selector
    #[serde(default)]
    pub highlight: Option<String>,
}

/// Captures the visible viewport as a PNG data URL
#[derive(Default)]
pub struct ScreenshotTool;

impl Tool for ScreenshotTool {
    type Params = ScreenshotParams;

    fn name(&self) -> &str {
        "screenshot"
    }

    fn execute_typed(&self, params: ScreenshotParams, context: &mut ToolContext) -> Result<ToolResult> {
        let data_url = match &params.highlight {
            Some(selector) => {
                let inspection = context.session.inspect(&crate::browser::PickTarget::css(selector.clone()))?;
                context.session.capture_highlighted(&inspection)?
            }
            None => context.session.capture_screenshot()?,
        };

        Ok(ToolResult::success_with(serde_json::json!({
            "data_url": data_url,
            "highlighted": params.highlight,
        })))
    }
}
