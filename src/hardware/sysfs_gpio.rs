//! Relay output driven through the sysfs GPIO interface
//!
//! Lifecycle:
//!
//! 1. [`SysfsGpioRelay::open`] exports the line if it is not already
//!    exported and configures it as an output. Failure here is fatal for
//!    the process; the controller must not run without its relay.
//! 2. [`Actuator::set`] writes `0`/`1` to the `value` attribute.
//! 3. [`Actuator::close`] unexports the line again.

use crate::error::{ClimateError, Result};
use crate::hardware::Actuator;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Attempts to configure `direction` after export. udev may need a moment
/// to fix up permissions on the freshly created line directory.
const DIRECTION_ATTEMPTS: u32 = 10;
const DIRECTION_RETRY_DELAY: Duration = Duration::from_millis(50);

/// A GPIO line configured as relay output
#[derive(Debug)]
pub struct SysfsGpioRelay {
    base_dir: PathBuf,
    line: u32,
    active_low: bool,
    exported_by_us: bool,
    open: bool,
}

impl SysfsGpioRelay {
    /// Acquire `line` below `base_dir` (normally `/sys/class/gpio`).
    pub async fn open(base_dir: impl Into<PathBuf>, line: u32, active_low: bool) -> Result<Self> {
        let base_dir = base_dir.into();
        let line_dir = base_dir.join(format!("gpio{line}"));

        let exported_by_us = if tokio::fs::metadata(&line_dir).await.is_ok() {
            debug!("GPIO line {} already exported", line);
            false
        } else {
            write_attr(&base_dir.join("export"), &line.to_string())
                .await
                .map_err(|e| ClimateError::hardware(format!("exporting GPIO {line}: {e}")))?;
            true
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match write_attr(&line_dir.join("direction"), "out").await {
                Ok(()) => break,
                Err(e) if attempt < DIRECTION_ATTEMPTS => {
                    trace!("GPIO {} direction not writable yet: {}", line, e);
                    tokio::time::sleep(DIRECTION_RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(ClimateError::hardware(format!(
                        "configuring GPIO {line} as output: {e}"
                    )));
                }
            }
        }

        info!(line, active_low, "Relay GPIO line acquired");

        Ok(Self {
            base_dir,
            line,
            active_low,
            exported_by_us,
            open: true,
        })
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    fn line_dir(&self) -> PathBuf {
        self.base_dir.join(format!("gpio{}", self.line))
    }
}

#[async_trait]
impl Actuator for SysfsGpioRelay {
    async fn set(&mut self, active: bool) -> Result<()> {
        if !self.open {
            return Err(ClimateError::actuator(format!(
                "GPIO {} is closed",
                self.line
            )));
        }

        let level = active != self.active_low;
        write_attr(&self.line_dir().join("value"), if level { "1" } else { "0" })
            .await
            .map_err(|e| ClimateError::actuator(format!("writing GPIO {}: {}", self.line, e)))
    }

    async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        if self.exported_by_us {
            write_attr(&self.base_dir.join("unexport"), &self.line.to_string())
                .await
                .map_err(|e| {
                    ClimateError::hardware(format!("unexporting GPIO {}: {}", self.line, e))
                })?;
        }

        info!(line = self.line, "Relay GPIO line released");
        Ok(())
    }
}

async fn write_attr(path: &Path, value: &str) -> std::io::Result<()> {
    tokio::fs::write(path, value).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A fake sysfs tree with the line already exported.
    fn exported_line(line: u32) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let line_dir = dir.path().join(format!("gpio{line}"));
        std::fs::create_dir(&line_dir).unwrap();
        std::fs::write(line_dir.join("direction"), "in").unwrap();
        std::fs::write(line_dir.join("value"), "0").unwrap();
        dir
    }

    fn read(dir: &TempDir, attr: &str) -> String {
        std::fs::read_to_string(dir.path().join(attr)).unwrap()
    }

    #[tokio::test]
    async fn test_open_configures_output_and_set_writes_value() {
        let sysfs = exported_line(4);
        let mut relay = SysfsGpioRelay::open(sysfs.path(), 4, false).await.unwrap();

        assert_eq!(read(&sysfs, "gpio4/direction"), "out");

        relay.set(true).await.unwrap();
        assert_eq!(read(&sysfs, "gpio4/value"), "1");

        relay.set(false).await.unwrap();
        assert_eq!(read(&sysfs, "gpio4/value"), "0");
    }

    #[tokio::test]
    async fn test_active_low_inverts_level() {
        let sysfs = exported_line(17);
        let mut relay = SysfsGpioRelay::open(sysfs.path(), 17, true).await.unwrap();

        relay.set(true).await.unwrap();
        assert_eq!(read(&sysfs, "gpio17/value"), "0");
    }

    #[tokio::test]
    async fn test_open_fails_without_gpio_tree() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-class");

        let err = SysfsGpioRelay::open(&missing, 4, false).await.unwrap_err();
        assert!(matches!(err, ClimateError::Hardware(_)));
    }

    #[tokio::test]
    async fn test_closed_line_rejects_commands() {
        let sysfs = exported_line(4);
        let mut relay = SysfsGpioRelay::open(sysfs.path(), 4, false).await.unwrap();

        relay.close().await.unwrap();
        // Pre-exported lines are left exported.
        assert!(!sysfs.path().join("unexport").exists());

        assert!(matches!(
            relay.set(true).await.unwrap_err(),
            ClimateError::Actuator(_)
        ));
    }
}
