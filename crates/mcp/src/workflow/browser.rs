//! Opening URLs in the host's default browser.

use std::process::Stdio;

use tokio::process::Command;

use tracing::info;

use crate::workflow::errors::BrowserError;

/// Hands a URL to something that can display it.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), BrowserError>;
}

/// Opens URLs with the platform's launcher command without waiting for it.
///
/// Must be called from within a tokio runtime, which reaps the launcher once
/// it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowserOpener;

const NO_ARGS: &[&str] = &[];
const WINDOWS_START_ARGS: &[&str] = &["/c", "start", ""];

/// Launcher program and leading arguments for `os`, as named by
/// `std::env::consts::OS`.
pub fn opener_command(os: &str) -> Option<(&'static str, &'static [&'static str])> {
    match os {
        "macos" => Some(("open", NO_ARGS)),
        "linux" | "freebsd" | "openbsd" | "netbsd" => Some(("xdg-open", NO_ARGS)),
        "windows" => Some(("cmd", WINDOWS_START_ARGS)),
        _ => None,
    }
}

impl BrowserOpener for SystemBrowserOpener {
    fn open(&self, url: &str) -> Result<(), BrowserError> {
        let os = std::env::consts::OS;
        let (program, args) = opener_command(os).ok_or(BrowserError::UnsupportedPlatform { os })?;

        info!(url, program, "opening url in browser");
        spawn_detached(program, args, url)
    }
}

/// Start `program args... url` and return without waiting for it.
fn spawn_detached(program: &'static str, args: &[&str], url: &str) -> Result<(), BrowserError> {
    // stdout is the tool transport; the child must not write to it.
    let child = Command::new(program)
        .args(args)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| BrowserError::Spawn { command: program, source })?;
    // Dropping the handle leaves reaping to the runtime's orphan queue.
    drop(child);
    Ok(())
}
