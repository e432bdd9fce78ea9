use crate::browser::PickTarget;
use crate::error::{BrowserError, Result};
use crate::inspector::{CaptureState, Inspector};
use crate::protocol::CaptureResponse;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the inspect tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InspectParams {
    /// CSS selector of the element to pick
    #[serde(default)]
    pub selector: Option<String>,

    /// Position of the element in `document.querySelectorAll('*')`
    #[serde(default)]
    pub index: Option<usize>,

    /// What should change about the element; becomes the report's first section
    #[serde(default)]
    pub instruction: String,

    /// Attach a viewport capture with the element outlined
    #[serde(default)]
    pub screenshot: bool,
}

impl InspectParams {
    pub fn target(&self) -> Result<PickTarget> {
        match (&self.selector, self.index) {
            (Some(selector), None) => Ok(PickTarget::css(selector.clone())),
            (None, Some(index)) => Ok(PickTarget::index(index)),
            (Some(_), Some(_)) => Err(BrowserError::InvalidArgument(
                "Provide either selector or index, not both".to_string(),
            )),
            (None, None) => Err(BrowserError::InvalidArgument(
                "Either selector or index must be provided".to_string(),
            )),
        }
    }
}

/// Picks an element and composes the Markdown report for it
#[derive(Default)]
pub struct InspectTool;

impl Tool for InspectTool {
    type Params = InspectParams;

    fn name(&self) -> &str {
        "inspect"
    }

    fn execute_typed(&self, params: InspectParams, context: &mut ToolContext) -> Result<ToolResult> {
        let target = params.target()?;
        let inspection = context.session.inspect(&target)?;

        let mut inspector = Inspector::for_inspection(&inspection);
        if params.screenshot {
            inspector.capture_with(|| CaptureResponse::from(context.session.capture_highlighted(&inspection)));
        }

        let markdown = inspector.compose(&params.instruction).ok_or_else(|| BrowserError::ToolExecutionFailed {
            tool: "inspect".to_string(),
            reason: "Nothing picked".to_string(),
        })?;

        let mut data = serde_json::json!({
            "markdown": markdown,
            "inspection": inspection,
        });
        match inspector.capture_state() {
            CaptureState::Ready(url) => data["screenshot"] = serde_json::json!(url),
            CaptureState::Failed(error) => data["screenshot_error"] = serde_json::json!(error),
            CaptureState::Idle | CaptureState::Capturing => {}
        }

        Ok(ToolResult::success_with(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_selector_or_index() {
        let by_selector: InspectParams = serde_json::from_value(serde_json::json!({"selector": "#buy"})).unwrap();
        assert_eq!(by_selector.target().unwrap(), PickTarget::css("#buy"));
        assert!(by_selector.instruction.is_empty());
        assert!(!by_selector.screenshot);

        let by_index: InspectParams = serde_json::from_value(serde_json::json!({"index": 4})).unwrap();
        assert_eq!(by_index.target().unwrap(), PickTarget::index(4));
    }

    #[test]
    fn test_target_requires_exactly_one() {
        assert!(InspectParams::default().target().is_err());

        let both = InspectParams {
            selector: Some("a".into()),
            index: Some(1),
            ..Default::default()
        };
        assert!(matches!(both.target(), Err(BrowserError::InvalidArgument(_))));
    }

    #[test]
    fn test_inspect_tool_metadata() {
        assert_eq!(InspectTool.name(), "inspect");
        assert!(InspectTool.parameters_schema().is_object());
    }
}
