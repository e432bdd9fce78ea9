use crate::browser::{BrowserSession, LaunchOptions};
use crate::error;
use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{ServerCapabilities, ServerInfo},
    tool_handler,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// MCP server exposing the element inspector over one browser session
#[derive(Clone)]
pub struct InspectorServer {
    session: Arc<Mutex<BrowserSession>>,
    pub(super) tool_router: ToolRouter<Self>,
}

impl InspectorServer {
    /// Launch a browser with default options and serve it
    pub fn new() -> error::Result<Self> {
        Self::with_options(LaunchOptions::default())
    }

    pub fn with_options(options: LaunchOptions) -> error::Result<Self> {
        Ok(Self::with_session(BrowserSession::launch(options)?))
    }

    /// Serve an already launched or connected session
    pub fn with_session(session: BrowserSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    pub(super) fn session(&self) -> MutexGuard<'_, BrowserSession> {
        // A panicked tool call leaves the session itself usable
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[tool_handler]
impl ServerHandler for InspectorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Inspect elements of the page open in Chrome. Navigate with browser_navigate, then call \
                 inspect_element with a CSS selector and an instruction to get a Markdown report of the \
                 element, its React or Vue component and an optional highlighted screenshot."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
