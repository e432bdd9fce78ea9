//! Browser session management and page snapshots

pub mod config;
pub mod session;
pub mod snapshot;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;
pub use snapshot::{Inspection, PageSnapshot, PickTarget, SnapshotOptions};
