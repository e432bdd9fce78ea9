use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for framework detection (no parameters needed)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectFrameworkParams {}

/// Reports the UI framework and meta-framework of the active page
#[derive(Default)]
pub struct DetectFrameworkTool;

impl Tool for DetectFrameworkTool {
    type Params = DetectFrameworkParams;

    fn name(&self) -> &str {
        "detect_framework"
    }

    fn execute_typed(&self, _params: DetectFrameworkParams, context: &mut ToolContext) -> Result<ToolResult> {
        let snapshot = context.get_snapshot()?;
        let signal = snapshot.detect_framework();

        Ok(ToolResult::success_with(serde_json::json!({
            "url": snapshot.url,
            "framework": signal.and_then(|s| s.base),
            "metaFramework": signal.and_then(|s| s.meta),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_tool_metadata() {
        let tool = DetectFrameworkTool;
        assert_eq!(tool.name(), "detect_framework");
        assert!(tool.parameters_schema().is_object());
    }

    #[test]
    fn test_params_accept_empty_object() {
        let params: std::result::Result<DetectFrameworkParams, _> = serde_json::from_value(serde_json::json!({}));
        assert!(params.is_ok());
    }
}
