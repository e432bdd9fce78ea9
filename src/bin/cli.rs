//! pick-context
//!
//! Opens a page, picks one element and prints the Markdown report for it.

use anyhow::{Context, bail};
use clap::{ArgGroup, Parser};
use pick_context::browser::{BrowserSession, ConnectionOptions, LaunchOptions, PickTarget, SnapshotOptions};
use pick_context::clipboard::{SystemClipboard, copy_report};
use pick_context::inspector::{CaptureState, Inspector};
use pick_context::protocol::CaptureResponse;
use pick_context::screenshot;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pick-context")]
#[command(version)]
#[command(about = "Turn a DOM element into context for an AI coding assistant", long_about = None)]
#[command(group(ArgGroup::new("target").required(true).args(["selector", "index"])))]
struct Cli {
    /// Page to open before picking (default: the active tab as it is)
    #[arg(long, short = 'u', value_name = "URL")]
    url: Option<String>,

    /// CSS selector of the element to pick
    #[arg(long, short = 's')]
    selector: Option<String>,

    /// Position of the element in `document.querySelectorAll('*')`
    #[arg(long, short = 'i')]
    index: Option<usize>,

    /// What should change about the element
    #[arg(long, short = 'm', default_value = "")]
    instruction: String,

    /// Write a highlighted viewport capture to this PNG file
    #[arg(long, value_name = "PATH")]
    screenshot: Option<PathBuf>,

    /// Copy the report (and screenshot) to the clipboard
    #[arg(long)]
    copy: bool,

    /// Print the structured inspection as JSON instead of Markdown
    #[arg(long)]
    json: bool,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// WebSocket endpoint URL of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Objects exported from the picked element before the rest are cut off
    #[arg(long, default_value_t = SnapshotOptions::default().max_objects)]
    max_objects: usize,

    /// Elements exported with their children
    #[arg(long, default_value_t = SnapshotOptions::default().max_dom_nodes)]
    max_dom_nodes: usize,
}

impl Cli {
    fn target(&self) -> anyhow::Result<PickTarget> {
        match (&self.selector, self.index) {
            (Some(selector), _) => Ok(PickTarget::css(selector.clone())),
            (None, Some(index)) => Ok(PickTarget::index(index)),
            (None, None) => bail!("either --selector or --index is required"),
        }
    }

    fn session(&self) -> anyhow::Result<BrowserSession> {
        let mut session = match self.ws_endpoint {
            Some(ref endpoint) => BrowserSession::connect(ConnectionOptions::new(endpoint))?,
            None => BrowserSession::launch(LaunchOptions::new().headless(!self.headed))?,
        };
        session.set_snapshot_options(self.snapshot_options());
        Ok(session)
    }

    fn snapshot_options(&self) -> SnapshotOptions {
        SnapshotOptions::new()
            .max_objects(self.max_objects)
            .max_dom_nodes(self.max_dom_nodes)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let target = cli.target()?;

    let session = cli.session().context("Failed to start browser")?;
    if let Some(ref url) = cli.url {
        session.navigate(url)?;
        session.wait_for_navigation()?;
    }

    let inspection = session.inspect(&target)?;
    log::info!("Picked {} on {}", inspection.element.selector, inspection.url);

    let mut inspector = Inspector::for_inspection(&inspection);
    if cli.screenshot.is_some() || cli.copy {
        inspector.capture_with(|| CaptureResponse::from(session.capture_highlighted(&inspection)));
    }

    if let Some(ref path) = cli.screenshot {
        match inspector.capture_state() {
            CaptureState::Ready(data_url) => {
                std::fs::write(path, screenshot::decode_data_url(data_url)?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Screenshot saved to {}", path.display());
            }
            CaptureState::Failed(error) => eprintln!("Screenshot failed: {}", error),
            CaptureState::Idle | CaptureState::Capturing => {}
        }
    }

    let markdown = inspector
        .compose(&cli.instruction)
        .context("No element was picked")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        println!("{}", markdown);
    }

    if cli.copy {
        let mut clipboard = SystemClipboard::new()?;
        let outcome = copy_report(&mut clipboard, &markdown, inspector.capture_state().data_url());
        eprintln!("{}", outcome.message);
        if !outcome.success {
            std::process::exit(1);
        }
    }

    Ok(())
}
