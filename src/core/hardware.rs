//! Pin and feedback capabilities, plus their Linux implementations.
//!
//! The core only sees [`PinIo`] and [`FeedbackSink`]. [`SysfsGpio`] drives
//! lines exported under `/sys/class/gpio`; [`LogFeedback`] renders feedback
//! events as log lines.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{Result, SentinelError};
use super::model::{FeedbackEvent, PinId};

/// Digital pin access.
pub trait PinIo {
    fn read_digital(&mut self, pin: PinId) -> bool;
    fn write_digital(&mut self, pin: PinId, high: bool);
}

/// Receiver for symbolic feedback events (sound, light, display...).
pub trait FeedbackSink {
    fn emit(&mut self, event: FeedbackEvent);
}

/// GPIO lines through the sysfs interface.
pub struct SysfsGpio {
    root: PathBuf,
    active_low: bool,
}

impl SysfsGpio {
    /// Open the sysfs tree and make sure every line in `pins` is exported.
    pub fn open(root: impl Into<PathBuf>, active_low: bool, pins: &[PinId]) -> Result<Self> {
        let gpio = Self {
            root: root.into(),
            active_low,
        };
        for pin in pins {
            let value = gpio.value_path(*pin);
            if !value.exists() {
                return Err(SentinelError::module(
                    "gpio",
                    format!("{pin} is not exported ({} missing)", value.display()),
                ));
            }
        }
        log::info!(
            "GPIO ready: {} lines under {}",
            pins.len(),
            gpio.root.display()
        );
        Ok(gpio)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, pin: PinId) -> PathBuf {
        self.root.join(format!("gpio{}", pin.0)).join("value")
    }
}

impl PinIo for SysfsGpio {
    /// Returns the logical "pressed" level. Read failures count as released.
    fn read_digital(&mut self, pin: PinId) -> bool {
        let path = self.value_path(pin);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let high = content.trim() == "1";
                high != self.active_low
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", pin, e);
                false
            }
        }
    }

    /// Outputs are written as given; `active_low` applies to inputs only.
    fn write_digital(&mut self, pin: PinId, high: bool) {
        let path = self.value_path(pin);
        if let Err(e) = fs::write(&path, if high { "1" } else { "0" }) {
            log::warn!("Failed to write {}: {}", pin, e);
        }
    }
}

/// Feedback rendered as log lines.
#[derive(Debug, Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn emit(&mut self, event: FeedbackEvent) {
        match event {
            FeedbackEvent::Disconnected | FeedbackEvent::Confused => {
                log::warn!("feedback: {}", event.name());
            }
            _ => log::info!("feedback: {}", event.name()),
        }
    }
}
