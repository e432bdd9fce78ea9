//! Copying the report to the system clipboard.
//!
//! With a screenshot, the report is written as HTML (the Markdown in a
//! `<pre>` block followed by the image) with the Markdown as plain-text
//! alternative, so rich editors get the picture and terminals get the text.
//! When that write fails, or there is no screenshot, only the text is copied.

use crate::error::Result;
use serde::Serialize;

#[cfg(feature = "clipboard")]
use crate::error::BrowserError;

/// A clipboard the report can be written to
pub trait ClipboardSink {
    /// Write rich HTML together with its plain-text alternative
    fn write_html(&mut self, html: &str, alt_text: &str) -> Result<()>;

    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// What ended up on the clipboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyOutcome {
    pub success: bool,
    pub message: String,
}

impl CopyOutcome {
    fn copied(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Copy `markdown`, with `image_data_url` attached when given
pub fn copy_report(sink: &mut dyn ClipboardSink, markdown: &str, image_data_url: Option<&str>) -> CopyOutcome {
    if let Some(data_url) = image_data_url {
        match sink.write_html(&report_html(markdown, data_url), markdown) {
            Ok(()) => return CopyOutcome::copied("Copied report with screenshot"),
            Err(e) => log::warn!("Rich clipboard write failed, falling back to text: {}", e),
        }
    }

    match sink.write_text(markdown) {
        Ok(()) if image_data_url.is_some() => CopyOutcome::copied("Copied report without screenshot"),
        Ok(()) => CopyOutcome::copied("Copied report"),
        Err(e) => {
            log::error!("Clipboard write failed: {}", e);
            CopyOutcome::failed(format!("Copy failed: {}", e))
        }
    }
}

fn report_html(markdown: &str, data_url: &str) -> String {
    format!(
        "<pre>{}</pre>\n<img src=\"{}\" alt=\"Screenshot of the selected element\">",
        escape_html(markdown),
        escape_html(data_url)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The system clipboard
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let clipboard = arboard::Clipboard::new().map_err(|e| BrowserError::ClipboardFailed(e.to_string()))?;
        Ok(Self { clipboard })
    }
}

#[cfg(feature = "clipboard")]
impl ClipboardSink for SystemClipboard {
    fn write_html(&mut self, html: &str, alt_text: &str) -> Result<()> {
        self.clipboard
            .set_html(html, Some(alt_text))
            .map_err(|e| BrowserError::ClipboardFailed(e.to_string()))
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.clipboard
            .set_text(text)
            .map_err(|e| BrowserError::ClipboardFailed(e.to_string()))
    }
}
