//! System output volume through the platform mixer

#[cfg(unix)]
use std::process::Command;

use super::{VolumeChange, VolumeControl};
use crate::{Error, Result};

/// Percentage step for up/down on Linux and macOS
#[cfg(unix)]
const STEP_PERCENT: u8 = 10;

/// Drives `pactl` on Linux and `osascript` on macOS
pub struct SystemVolume;

/// Program and arguments for a volume change on this platform
#[cfg(target_os = "macos")]
fn mixer_command(change: VolumeChange) -> (&'static str, Vec<String>) {
    let script = match change {
        VolumeChange::Up => format!(
            "set volume output volume ((output volume of (get volume settings)) + {STEP_PERCENT})"
        ),
        VolumeChange::Down => format!(
            "set volume output volume ((output volume of (get volume settings)) - {STEP_PERCENT})"
        ),
        VolumeChange::Mute => "set volume output muted true".to_string(),
    };
    ("osascript", vec!["-e".to_string(), script])
}

#[cfg(all(unix, not(target_os = "macos")))]
fn mixer_command(change: VolumeChange) -> (&'static str, Vec<String>) {
    let args = match change {
        VolumeChange::Up => vec![
            "set-sink-volume".to_string(),
            "@DEFAULT_SINK@".to_string(),
            format!("+{STEP_PERCENT}%"),
        ],
        VolumeChange::Down => vec![
            "set-sink-volume".to_string(),
            "@DEFAULT_SINK@".to_string(),
            format!("-{STEP_PERCENT}%"),
        ],
        VolumeChange::Mute => vec![
            "set-sink-mute".to_string(),
            "@DEFAULT_SINK@".to_string(),
            "toggle".to_string(),
        ],
    };
    ("pactl", args)
}

#[cfg(not(unix))]
impl VolumeControl for SystemVolume {
    fn adjust(&self, change: VolumeChange) -> Result<()> {
        tracing::debug!(?change, "volume change requested");
        Err(Error::Volume(
            "volume control is not supported on this platform".to_string(),
        ))
    }
}

#[cfg(unix)]
impl VolumeControl for SystemVolume {
    fn adjust(&self, change: VolumeChange) -> Result<()> {
        let (program, args) = mixer_command(change);

        let output = Command::new(program).args(&args).output().map_err(|e| {
            Error::Volume(format!("failed to run {program}: {e}"))
        })?;

        if !output.status.success() {
            return Err(Error::Volume(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        tracing::info!(?change, "volume adjusted");
        Ok(())
    }
}

#[cfg(all(test, unix, not(target_os = "macos")))]
mod tests {
    use super::*;

    #[test]
    fn test_pactl_arguments() {
        let (program, args) = mixer_command(VolumeChange::Down);
        assert_eq!(program, "pactl");
        assert_eq!(args, vec!["set-sink-volume", "@DEFAULT_SINK@", "-10%"]);

        let (_, args) = mixer_command(VolumeChange::Mute);
        assert_eq!(args.last().map(String::as_str), Some("toggle"));
    }
}
