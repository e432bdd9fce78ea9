use crate::error::Result;
use crate::tools::utils::normalize_url;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the navigate tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NavigateParams {
    /// URL of the page to inspect; `localhost:3000` style hosts get `http://`
    pub url: String,

    /// Wait for navigation to complete (default: true)
    #[serde(default = "default_wait")]
    pub wait_for_load: bool,
}

fn default_wait() -> bool {
    true
}

/// Opens the page to inspect in the active tab
#[derive(Default)]
pub struct NavigateTool;

impl Tool for NavigateTool {
    type Params = NavigateParams;

    fn name(&self) -> &str {
        "navigate"
    }

    fn execute_typed(&self, params: NavigateParams, context: &mut ToolContext) -> Result<ToolResult> {
        let url = normalize_url(&params.url);

        context.session.navigate(&url)?;
        if params.wait_for_load {
            context.session.wait_for_navigation()?;
        }
        context.invalidate();
        log::info!("Navigated to {}", url);

        Ok(ToolResult::success_with(serde_json::json!({
            "original_url": params.url,
            "url": url,
            "waited": params.wait_for_load
        })))
    }
}
