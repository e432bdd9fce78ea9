//! Messages exchanged between the inspector, the page and the capture service.

use crate::framework::{ComponentNode, FrameworkSignal};
use serde::{Deserialize, Serialize};

/// Requests addressed to the inspector or the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InspectorMessage {
    /// Switch pick mode on or off
    #[serde(rename = "PICK_CON_TOGGLE")]
    Toggle,
    /// Ask the page for framework and component data of the element at `selector`
    #[serde(rename = "PICK_CON_COLLECT")]
    Collect { selector: String },
    /// Ask for a capture of the visible viewport
    #[serde(rename = "PICK_CON_CAPTURE")]
    Capture,
}

/// The page's answer to [`InspectorMessage::Collect`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "PICK_CON_RESULT")]
pub struct CollectResult {
    pub framework: Option<FrameworkSignal>,
    pub component: Option<ComponentNode>,
}

/// Outcome of a viewport capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub success: bool,
    #[serde(rename = "dataUrl", default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureResponse {
    pub fn captured(data_url: impl Into<String>) -> Self {
        Self {
            success: true,
            data_url: Some(data_url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            data_url: None,
            error: Some(error.to_string()),
        }
    }
}

impl<E: ToString> From<std::result::Result<String, E>> for CaptureResponse {
    fn from(result: std::result::Result<String, E>) -> Self {
        match result {
            Ok(data_url) => Self::captured(data_url),
            Err(e) => Self::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{BaseFramework, Origin};
    use serde_json::json;

    #[test]
    fn test_message_wire_names() {
        assert_eq!(
            serde_json::to_value(InspectorMessage::Toggle).unwrap(),
            json!({"type": "PICK_CON_TOGGLE"})
        );

        let collect: InspectorMessage =
            serde_json::from_value(json!({"type": "PICK_CON_COLLECT", "selector": "#app > div"})).unwrap();
        assert_eq!(
            collect,
            InspectorMessage::Collect {
                selector: "#app > div".into()
            }
        );
    }

    #[test]
    fn test_collect_result_shape() {
        let result = CollectResult {
            framework: Some(FrameworkSignal {
                base: Some(BaseFramework::Vue),
                meta: None,
            }),
            component: Some(ComponentNode {
                origin: Origin::Vue,
                hierarchy: vec!["App".into()],
                props: None,
                state: None,
            }),
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "PICK_CON_RESULT",
                "framework": {"framework": "Vue", "metaFramework": null},
                "component": {"framework": "vue", "hierarchy": ["App"]}
            })
        );
    }

    #[test]
    fn test_capture_response() {
        let ok = CaptureResponse::captured("data:image/png;base64,AAAA");
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"success": true, "dataUrl": "data:image/png;base64,AAAA"})
        );

        let failed: CaptureResponse = serde_json::from_value(json!({"success": false, "error": "no tab"})).unwrap();
        assert_eq!(failed, CaptureResponse::failed("no tab"));

        let from_result: CaptureResponse = Err::<String, _>("denied").into();
        assert!(!from_result.success);
    }
}
