//! # pick-context
//!
//! Pick a DOM element in a Chrome page and turn it into context for an AI
//! coding assistant: a unique CSS selector, the element's attributes and
//! text, the React or Vue component that rendered it (with props and state),
//! and optionally a screenshot with the element outlined. The result is a
//! Markdown report.
//!
//! ## MCP Server
//!
//! The MCP server exposes the inspector to AI agents:
//!
//! ```bash
//! # Run headless browser
//! cargo run --bin mcp-server
//!
//! # Run with visible browser (useful for debugging)
//! cargo run --bin mcp-server -- --headed
//! ```
//!
//! ## Command line
//!
//! ```bash
//! cargo run --bin pick-context -- --url https://example.com --selector h1 \
//!     --instruction "make the heading smaller" --copy
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use pick_context::{BrowserSession, LaunchOptions, PickTarget};
//!
//! # fn main() -> pick_context::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://example.com")?;
//!
//! let inspection = session.inspect(&PickTarget::css("h1"))?;
//! println!("{}", inspection.report("make the heading smaller"));
//! # Ok(())
//! # }
//! ```
//!
//! The pure parts work without a browser: [`generate_selector`] over a
//! [`DomTree`], [`SafeSerializer`] over an exported [`inspect::Heap`],
//! [`detect_framework`] over any [`framework::PageProbe`] and
//! [`compose_report`].
//!
//! ## Module Overview
//!
//! - [`browser`]: Browser session, page snapshots and inspections
//! - [`dom`]: Element tree, selector generation and element descriptors
//! - [`inspect`]: Exported object graphs and the safe serializer
//! - [`framework`]: Framework detection and React/Vue component collectors
//! - [`report`]: Markdown report composition
//! - [`inspector`]: Pick and capture state for one inspection
//! - [`protocol`]: Messages exchanged while picking
//! - [`screenshot`]: Viewport captures and element highlighting
//! - [`clipboard`]: Copying the report with its screenshot
//! - [`tools`]: Inspector tools (navigate, inspect, detect_framework, screenshot)
//! - [`error`]: Error types and result aliases
//! - [`mcp`]: Model Context Protocol server (requires `mcp-handler` feature)

pub mod browser;
pub mod clipboard;
pub mod dom;
pub mod error;
pub mod framework;
pub mod inspect;
pub mod inspector;
pub mod protocol;
pub mod report;
pub mod screenshot;
pub mod tools;

#[cfg(feature = "mcp-handler")]
pub mod mcp;

pub use browser::{BrowserSession, ConnectionOptions, Inspection, LaunchOptions, PageSnapshot, PickTarget};
pub use dom::{BoundingBox, DomTree, ElementDescriptor, ElementNode, generate_selector};
pub use error::{BrowserError, Result};
pub use framework::{ComponentNode, FrameworkSignal, collect_component, detect_framework};
pub use inspect::{SafeSerializer, SerializeOptions, SerializedValue};
pub use report::{ReportInput, compose_report};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};

#[cfg(feature = "mcp-handler")]
pub use mcp::InspectorServer;
#[cfg(feature = "mcp-handler")]
pub use rmcp::ServiceExt;
