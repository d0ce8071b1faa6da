//! Open URLs with the platform's default browser

use std::process::Stdio;

use tokio::process::Command;

use super::UrlOpener;
use crate::Result;

/// Hands URLs to `xdg-open`, `open` or `start`
///
/// Must be called from within the tokio runtime, which reaps the child.
pub struct SystemOpener;

impl SystemOpener {
    fn command(url: &str) -> Command {
        #[cfg(target_os = "windows")]
        {
            let mut cmd = Command::new("cmd");
            // Empty title argument so `start` doesn't treat the URL as one
            cmd.args(["/C", "start", "", url]);
            cmd
        }
        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        tracing::info!(url, "opening in browser");
        Self::command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}
