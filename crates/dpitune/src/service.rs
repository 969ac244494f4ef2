//! Proxy service controller
//!
//! Owns the single systemd unit all trials share. Every trial takes the
//! controller, rewrites the unit with its candidate setting, restarts it,
//! and releases it before the next trial starts. A start failure is never
//! fatal to the run; stop is best-effort cleanup.

use anyhow::{Context, Result};
use dpitune_common::model::ServiceState;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How many times readiness is polled after a restart.
const READY_POLL_ATTEMPTS: u32 = 10;

/// Delay between readiness polls.
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Render the unit file for one candidate setting.
///
/// The ExecStart line is the proxy contract: the binary listens on
/// `127.0.0.1:<port>` and the setting string is appended verbatim.
pub fn render_unit(binary: &str, port: u16, setting: &str) -> String {
    format!(
        "[Unit]\n\
         Description=dpitune managed DPI bypass proxy\n\
         After=network.target\n\
         \n\
         [Service]\n\
         ExecStart={binary} --ip 127.0.0.1 --port {port} {setting}\n\
         Restart=on-failure\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n"
    )
}

pub struct ServiceController {
    unit_name: String,
    binary: String,
    unit_dir: PathBuf,
    state: ServiceState,
}

impl ServiceController {
    pub fn new(unit_name: impl Into<String>, binary: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            binary: binary.into(),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            state: ServiceState::Stopped,
        }
    }

    /// Override the unit directory (tests write to a temp dir).
    pub fn with_unit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.unit_dir = dir.into();
        self
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    fn unit_file(&self) -> PathBuf {
        self.unit_dir.join(format!("{}.service", self.unit_name))
    }

    fn write_unit(&self, port: u16, setting: &str) -> Result<()> {
        let path = self.unit_file();
        std::fs::write(&path, render_unit(&self.binary, port, setting))
            .with_context(|| format!("Failed to write unit file {}", path.display()))
    }

    fn systemctl(&self, args: &[&str]) -> Result<bool> {
        let output = Command::new("systemctl")
            .args(args)
            .output()
            .context("Failed to run systemctl")?;
        if !output.status.success() {
            debug!(
                "systemctl {} exited {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.status.success())
    }

    /// Bring the proxy up with one candidate setting and poll readiness.
    ///
    /// Returns `Active` once `systemctl is-active` reports the unit up, or
    /// `Failed` after the polling window closes. The caller skips the trial
    /// on `Failed`; only environment-level problems (unit file unwritable)
    /// surface as `Err`.
    pub async fn start(&mut self, setting: &str, port: u16) -> Result<ServiceState> {
        self.state = ServiceState::Starting;
        self.write_unit(port, setting)?;

        if !self.systemctl(&["daemon-reload"])? {
            warn!("daemon-reload failed before starting {}", self.unit_name);
        }
        if !self.systemctl(&["restart", &format!("{}.service", self.unit_name)])? {
            warn!("Failed to restart {} with setting '{}'", self.unit_name, setting);
            self.state = ServiceState::Failed;
            return Ok(self.state);
        }

        for attempt in 1..=READY_POLL_ATTEMPTS {
            if self.systemctl(&["is-active", "--quiet", &format!("{}.service", self.unit_name)])? {
                debug!("{} active after {} poll(s)", self.unit_name, attempt);
                self.state = ServiceState::Active;
                return Ok(self.state);
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        warn!(
            "{} did not become active within {}s",
            self.unit_name,
            READY_POLL_ATTEMPTS * READY_POLL_INTERVAL.as_secs() as u32
        );
        self.state = ServiceState::Failed;
        Ok(self.state)
    }

    /// Stop the proxy. Idempotent; "unit not running" is not an error.
    pub async fn stop(&mut self) {
        match self.systemctl(&["stop", &format!("{}.service", self.unit_name)]) {
            Ok(true) => debug!("{} stopped", self.unit_name),
            Ok(false) => debug!("{} was not running", self.unit_name),
            Err(e) => warn!("Failed to stop {}: {}", self.unit_name, e),
        }
        self.state = ServiceState::Stopped;
    }

    /// Persist the chosen setting and enable the unit permanently.
    pub async fn install(&mut self, setting: &str, port: u16) -> Result<()> {
        self.write_unit(port, setting)?;
        if !self.systemctl(&["daemon-reload"])? {
            warn!("daemon-reload failed while installing {}", self.unit_name);
        }
        if !self.systemctl(&["enable", "--now", &format!("{}.service", self.unit_name)])? {
            anyhow::bail!("Failed to enable {}.service", self.unit_name);
        }
        info!(
            "Installed {}.service with setting '{}' on port {}",
            self.unit_name, setting, port
        );
        self.state = ServiceState::Active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_templates_the_start_command() {
        let unit = render_unit("/usr/bin/ciadpi", 8080, "--split 2 --disorder");
        assert!(unit.contains("ExecStart=/usr/bin/ciadpi --ip 127.0.0.1 --port 8080 --split 2 --disorder"));
        assert!(unit.contains("Restart=on-failure"));
        assert!(unit.contains("WantedBy=multi-user.target"));
    }

    #[test]
    fn controller_starts_stopped() {
        let ctl = ServiceController::new("dpitune-proxy", "ciadpi");
        assert_eq!(ctl.state(), ServiceState::Stopped);
        assert_eq!(
            ctl.unit_file(),
            PathBuf::from("/etc/systemd/system/dpitune-proxy.service")
        );
    }

    #[test]
    fn write_unit_refreshes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = ServiceController::new("dpitune-proxy", "ciadpi").with_unit_dir(dir.path());
        ctl.write_unit(8080, "--first").unwrap();
        ctl.write_unit(9090, "--second").unwrap();
        let written = std::fs::read_to_string(ctl.unit_file()).unwrap();
        assert!(written.contains("--port 9090 --second"));
        assert!(!written.contains("--first"));
    }
}
