//! Inspector tools
//!
//! Each tool takes typed, schema-described parameters and returns a
//! [`ToolResult`] with JSON data, so the same operations can be driven from
//! the MCP server, the CLI or library code.

pub mod detect;
pub mod inspect;
pub mod navigate;
pub mod screenshot;
pub mod utils;

pub use detect::DetectFrameworkTool;
pub use inspect::InspectTool;
pub use navigate::NavigateTool;
pub use screenshot::ScreenshotTool;

use crate::browser::{BrowserSession, PageSnapshot};
use crate::error::{BrowserError, Result};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Outcome of one tool execution
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn success_with(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// What a tool can reach while it runs
pub struct ToolContext<'a> {
    pub session: &'a BrowserSession,

    /// Target-less snapshot, taken on first use
    snapshot: Option<PageSnapshot>,
}

impl<'a> ToolContext<'a> {
    pub fn new(session: &'a BrowserSession) -> Self {
        Self { session, snapshot: None }
    }

    /// Snapshot of the active page, cached for the lifetime of the context
    pub fn get_snapshot(&mut self) -> Result<&PageSnapshot> {
        if self.snapshot.is_none() {
            self.snapshot = Some(self.session.snapshot(None)?);
        }
        self.snapshot
            .as_ref()
            .ok_or_else(|| BrowserError::SnapshotFailed("Snapshot cache is empty".to_string()))
    }

    /// Drop the cached snapshot after the page changed
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }
}

/// A typed inspector operation
pub trait Tool: Send + Sync {
    type Params: DeserializeOwned + JsonSchema;

    fn name(&self) -> &str;

    fn execute_typed(&self, params: Self::Params, context: &mut ToolContext) -> Result<ToolResult>;

    /// JSON schema of [`Tool::Params`]
    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(Self::Params)).unwrap_or(Value::Null)
    }

    /// Decode JSON parameters and run the tool
    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let params = serde_json::from_value(params).map_err(|e| BrowserError::InvalidArgument(format!(
            "Invalid parameters for '{}': {}",
            self.name(),
            e
        )))?;
        self.execute_typed(params, context)
    }
}

/// Object-safe view of a [`Tool`]
trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult>;
}

impl<T: Tool> DynTool for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn parameters_schema(&self) -> Value {
        Tool::parameters_schema(self)
    }

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        Tool::execute(self, params, context)
    }
}

/// Tools by name, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn DynTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every inspector tool
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(NavigateTool);
        registry.register(InspectTool);
        registry.register(DetectFrameworkTool);
        registry.register(ScreenshotTool);
        registry
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(Tool::name(&tool).to_string(), Box::new(tool));
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn schema(&self, name: &str) -> Option<Value> {
        self.tools.get(name).map(|tool| tool.parameters_schema())
    }

    pub fn execute(&self, name: &str, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let tool = self.tools.get(name).ok_or_else(|| BrowserError::ToolExecutionFailed {
            tool: name.to_string(),
            reason: "Unknown tool".to_string(),
        })?;
        log::debug!("Executing tool '{}'", name);
        tool.execute(params, context)
    }
}
