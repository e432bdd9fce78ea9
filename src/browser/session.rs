use crate::{browser::{config::{ConnectionOptions, LaunchOptions},
                      snapshot::{Inspection, PageSnapshot, PickTarget, SnapshotOptions}},
            error::{BrowserError, Result},
            framework::FrameworkSignal,
            screenshot,
            tools::{ToolContext, ToolRegistry}};
use headless_chrome::{Browser, Tab, protocol::cdp::Page::CaptureScreenshotFormatOption};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Export budgets for page snapshots
    snapshot_options: SnapshotOptions,

    /// Tool registry for executing inspector tools
    tool_registry: ToolRegistry,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Pages should not see an automation-controlled browser
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Keep the browser alive between picks
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        browser.new_tab().map_err(|e| BrowserError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::info!("Launched browser (headless: {})", options.headless);
        Ok(Self::with_browser(browser))
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url.clone(), Duration::from_millis(options.timeout))
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        log::info!("Connected to browser at {}", options.ws_url);
        Ok(Self::with_browser(browser))
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    fn with_browser(browser: Browser) -> Self {
        Self {
            browser,
            snapshot_options: SnapshotOptions::default(),
            tool_registry: ToolRegistry::with_defaults(),
        }
    }

    /// Replace the snapshot export budgets
    pub fn set_snapshot_options(&mut self, options: SnapshotOptions) {
        self.snapshot_options = options;
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        // Visible and focused first, then merely visible
        for check in [
            "document.visibilityState === 'visible' && document.hasFocus()",
            "document.visibilityState === 'visible'",
        ] {
            for tab in &tabs {
                match tab.evaluate(check, false) {
                    Ok(remote_object) => {
                        if remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                    Err(e) => log::debug!("Failed to check tab status: {}", e),
                }
            }
        }

        // A freshly connected headless browser may report no visible tab
        tabs.into_iter()
            .next()
            .ok_or_else(|| BrowserError::TabOperationFailed("No active tab found".to_string()))
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate to a URL using the active tab
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab()?
            .navigate_to(url)
            .map_err(|e| BrowserError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| BrowserError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Snapshot the active page, optionally around a picked element
    pub fn snapshot(&self, target: Option<&PickTarget>) -> Result<PageSnapshot> {
        let script = PageSnapshot::script(target, &self.snapshot_options)?;

        let result = self
            .tab()?
            .evaluate(&script, false)
            .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to execute snapshot script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| BrowserError::SnapshotFailed("No value returned from snapshot script".to_string()))?;

        // The script returns a JSON string
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| BrowserError::SnapshotFailed(format!("Failed to get JSON string: {}", e)))?;

        let snapshot = PageSnapshot::from_json(&json_str)?;
        log::debug!(
            "Snapshot of {}: {} elements, {} objects",
            snapshot.url,
            snapshot.dom.count_elements(),
            snapshot.heap.len()
        );
        Ok(snapshot)
    }

    /// Pick an element and describe it, its framework and its component
    pub fn inspect(&self, target: &PickTarget) -> Result<Inspection> {
        self.snapshot(Some(target))?.inspect()
    }

    /// Detect the framework of the active page
    pub fn detect_framework(&self) -> Result<Option<FrameworkSignal>> {
        Ok(self.snapshot(None)?.detect_framework())
    }

    /// Capture the visible viewport as PNG bytes
    pub fn capture_png(&self) -> Result<Vec<u8>> {
        self.tab()?
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))
    }

    /// Capture the visible viewport as a `data:image/png;base64,…` URL
    pub fn capture_screenshot(&self) -> Result<String> {
        Ok(screenshot::to_data_url(&self.capture_png()?))
    }

    /// Capture the viewport with the inspected element outlined
    pub fn capture_highlighted(&self, inspection: &Inspection) -> Result<String> {
        let png = self.capture_png()?;
        let png = match inspection.bounding_box {
            Some(rect) => screenshot::highlight(&png, rect, inspection.device_pixel_ratio)?,
            None => png,
        };
        Ok(screenshot::to_data_url(&png))
    }

    /// Get the tool registry
    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    /// Execute a tool by name
    pub fn execute_tool(&self, name: &str, params: serde_json::Value) -> Result<crate::tools::ToolResult> {
        let mut context = ToolContext::new(self);
        self.tool_registry.execute(name, params, &mut context)
    }

    /// Close the browser
    pub fn close(&self) -> Result<()> {
        // headless_chrome closes the process when Browser is dropped; closing
        // the tabs ends the session right away
        let tabs = self.get_tabs()?;
        for tab in tabs {
            let _ = tab.close(false);
        }
        Ok(())
    }
}
