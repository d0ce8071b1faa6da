//! Native and web application launching

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{AppLauncher, LaunchOutcome, UrlOpener};
use crate::Result;

/// Launches applications by alias
///
/// Web aliases open in the browser. Desktop aliases map to an executable or
/// application name; anything else is launched as spoken.
pub struct SystemLauncher {
    desktop: BTreeMap<String, String>,
    web: BTreeMap<String, String>,
    opener: Arc<dyn UrlOpener>,
}

/// What a spoken application name refers to
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    Web(&'a str),
    Desktop(&'a str),
}

impl SystemLauncher {
    /// Create a launcher over the given alias tables (keys lowercase)
    #[must_use]
    pub fn new(
        desktop: BTreeMap<String, String>,
        web: BTreeMap<String, String>,
        opener: Arc<dyn UrlOpener>,
    ) -> Self {
        Self {
            desktop,
            web,
            opener,
        }
    }

    fn target<'a>(&'a self, name: &'a str) -> Target<'a> {
        let key = name.trim().to_lowercase();
        if let Some(url) = self.web.get(&key) {
            return Target::Web(url);
        }
        self.desktop
            .get(&key)
            .map_or_else(|| Target::Desktop(name.trim()), |path| Target::Desktop(path))
    }

    #[cfg(target_os = "windows")]
    fn start(program: &str) -> Result<LaunchOutcome> {
        let status = std::process::Command::new("cmd")
            .args(["/C", "start", "", program])
            .status()?;
        Ok(if status.success() {
            LaunchOutcome::Launched
        } else {
            LaunchOutcome::NotFound
        })
    }

    #[cfg(target_os = "macos")]
    fn start(program: &str) -> Result<LaunchOutcome> {
        let status = std::process::Command::new("open")
            .args(["-a", program])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;
        Ok(if status.success() {
            LaunchOutcome::Launched
        } else {
            LaunchOutcome::NotFound
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    fn start(program: &str) -> Result<LaunchOutcome> {
        let Ok(path) = which::which(program) else {
            tracing::debug!(program, "executable not found on PATH");
            return Ok(LaunchOutcome::NotFound);
        };

        tokio::process::Command::new(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;
        Ok(LaunchOutcome::Launched)
    }
}

impl AppLauncher for SystemLauncher {
    fn launch(&self, name: &str) -> Result<LaunchOutcome> {
        match self.target(name) {
            Target::Web(url) => {
                self.opener.open(url)?;
                Ok(LaunchOutcome::OpenedInBrowser)
            }
            Target::Desktop(program) => {
                tracing::info!(name, program, "launching application");
                Self::start(program)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl UrlOpener for Recorder {
        fn open(&self, url: &str) -> Result<()> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn launcher(opener: Arc<Recorder>) -> SystemLauncher {
        SystemLauncher::new(
            BTreeMap::from([("calculator".to_string(), "gnome-calculator".to_string())]),
            BTreeMap::from([("gmail".to_string(), "https://mail.google.com".to_string())]),
            opener,
        )
    }

    #[test]
    fn test_targets() {
        let launcher = launcher(Arc::new(Recorder::default()));
        assert_eq!(launcher.target("Gmail"), Target::Web("https://mail.google.com"));
        assert_eq!(launcher.target("calculator"), Target::Desktop("gnome-calculator"));
        assert_eq!(launcher.target(" blender "), Target::Desktop("blender"));
    }

    #[test]
    fn test_web_alias_opens_browser() {
        let opener = Arc::new(Recorder::default());
        let launcher = launcher(Arc::clone(&opener));

        assert_eq!(launcher.launch("gmail").unwrap(), LaunchOutcome::OpenedInBrowser);
        assert_eq!(*opener.0.lock().unwrap(), vec!["https://mail.google.com"]);
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    #[test]
    fn test_unknown_executable_not_found() {
        let launcher = launcher(Arc::new(Recorder::default()));
        assert_eq!(
            launcher.launch("definitely-not-an-installed-program-xyz").unwrap(),
            LaunchOutcome::NotFound
        );
    }
}
