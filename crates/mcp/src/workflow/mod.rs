//! Multi-step operations that sit between the tool handlers and the API
//! client: launch-and-wait with polling, stopping analyses, and handing URLs
//! to the desktop browser.

mod browser;
mod errors;
mod launch;

pub use browser::{BrowserOpener, SystemBrowserOpener, opener_command};
pub use errors::{BrowserError, WorkflowError};
pub use launch::{
    DEFAULT_MAX_WAIT_SECS, LaunchOutcome, LaunchRequest, LaunchResult, MAX_POLL_INTERVAL, Workflows, missing_required_parameters,
};
