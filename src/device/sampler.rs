//! Pump state sampling
//!
//! `DeviceStateSampler` reads one digital input through an injected
//! [`InputLine`]. On the Raspberry Pi the line is a sysfs GPIO value file;
//! off target a [`ScriptedLine`] stands in with a deterministic sequence.

use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use super::status::{DeviceStatus, Level};

/// Capability: read the current level of a single digital input
pub trait InputLine: Send + Sync {
    /// Line name for logging
    fn name(&self) -> &str;

    fn read_level(&self) -> Result<Level>;
}

/// How long to wait for udev to create the pin files after an export
const EXPORT_POLL_ATTEMPTS: u32 = 20;
const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(50);

fn wait_for_file(path: &Path) -> bool {
    for attempt in 0..EXPORT_POLL_ATTEMPTS {
        if path.exists() {
            return true;
        }
        debug!(path = %path.display(), attempt, "Waiting for GPIO sysfs file");
        thread::sleep(EXPORT_POLL_INTERVAL);
    }
    path.exists()
}

/// GPIO line exposed through the sysfs interface (`<root>/gpio<N>/value`)
#[derive(Debug)]
pub struct SysfsLine {
    name: String,
    value_path: PathBuf,
}

impl SysfsLine {
    /// Open the pin as an input, exporting it first if the kernel has not
    pub fn open(root: impl AsRef<Path>, pin: u32) -> Result<Self> {
        let root = root.as_ref();
        let pin_dir = root.join(format!("gpio{}", pin));

        if !pin_dir.exists() {
            info!(pin, root = %root.display(), "Exporting GPIO pin");
            fs::write(root.join("export"), pin.to_string())
                .with_context(|| format!("failed to export GPIO {}", pin))?;
        }

        let direction = pin_dir.join("direction");
        if !wait_for_file(&direction) {
            return Err(anyhow!("GPIO {} has no {} after export", pin, direction.display()));
        }
        fs::write(&direction, "in").with_context(|| format!("failed to set GPIO {} as input", pin))?;

        Ok(Self {
            name: format!("gpio{}", pin),
            value_path: pin_dir.join("value"),
        })
    }
}

impl InputLine for SysfsLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_level(&self) -> Result<Level> {
        let raw = fs::read_to_string(&self.value_path)
            .with_context(|| format!("failed to read {}", self.value_path.display()))?;
        Level::from_raw(&raw).ok_or_else(|| anyhow!("unexpected GPIO value {:?}", raw.trim()))
    }
}

/// Deterministic stand-in for a GPIO line
///
/// Returns the scripted levels in order, then keeps repeating the last one.
pub struct ScriptedLine {
    levels: Mutex<VecDeque<Level>>,
    last: Mutex<Level>,
}

impl ScriptedLine {
    pub fn new(levels: impl IntoIterator<Item = Level>) -> Self {
        let levels: VecDeque<Level> = levels.into_iter().collect();
        // an empty script reads as an idle pump
        let first = levels.front().copied().unwrap_or(Level::High);
        Self {
            levels: Mutex::new(levels),
            last: Mutex::new(first),
        }
    }

    /// Line that always reads the same level
    pub fn fixed(level: Level) -> Self {
        Self::new([level])
    }
}

impl InputLine for ScriptedLine {
    fn name(&self) -> &str {
        "stub"
    }

    fn read_level(&self) -> Result<Level> {
        let mut levels = self.levels.lock().map_err(|_| anyhow!("stub line poisoned"))?;
        let mut last = self.last.lock().map_err(|_| anyhow!("stub line poisoned"))?;
        if let Some(level) = levels.pop_front() {
            *last = level;
        }
        Ok(*last)
    }
}

/// Maps the raw level of one input line to a [`DeviceStatus`]
pub struct DeviceStateSampler {
    line: Box<dyn InputLine>,
}

impl DeviceStateSampler {
    pub fn new(line: Box<dyn InputLine>) -> Self {
        Self { line }
    }

    pub fn sample(&self) -> Result<DeviceStatus> {
        let level = self.line.read_level()?;
        let status = DeviceStatus::from_level(level);
        debug!(line = self.line.name(), ?level, %status, "Sampled input line");
        Ok(status)
    }
}
