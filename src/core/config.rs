use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::alerts::model::{TriggerId, TriggerTiming};
use super::alerts::override_window::OverrideTiming;
use super::error::{Result, SentinelError};
use super::model::PinId;

/// Remote alert endpoint. Fixed for the process lifetime.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub base_path: String,
    #[serde(default = "default_tls")]
    pub tls: bool,
}

fn default_port() -> u16 {
    443
}

fn default_tls() -> bool {
    true
}

/// One monitored input with its indicator outputs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TriggerSettings {
    pub id: TriggerId,
    pub input_pin: PinId,
    pub success_pin: PinId,
    pub error_pin: PinId,
    pub alert_threshold_ms: u64,
    pub retrigger_interval_ms: u64,
}

impl TriggerSettings {
    pub fn timing(&self) -> TriggerTiming {
        TriggerTiming {
            alert_threshold: Duration::from_millis(self.alert_threshold_ms),
            retrigger_interval: Duration::from_millis(self.retrigger_interval_ms),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OverrideSettings {
    pub button_pin: PinId,
    pub indicator_pin: PinId,
    pub long_press_ms: u64,
    pub grace_ms: u64,
    pub window_ms: u64,
}

impl OverrideSettings {
    pub fn timing(&self) -> OverrideTiming {
        OverrideTiming {
            long_press_limit: Duration::from_millis(self.long_press_ms),
            grace: Duration::from_millis(self.grace_ms),
            override_length: Duration::from_millis(self.window_ms),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GpioSettings {
    pub root: PathBuf,
    /// Inputs read "pressed" when the line is low (pull-up wiring).
    #[serde(default)]
    pub active_low: bool,
}

/// Device settings, loaded once at startup.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: EndpointSettings,
    /// Evaluated in this order every tick.
    pub triggers: Vec<TriggerSettings>,
    pub override_button: OverrideSettings,
    pub health_interval_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
    pub gpio: GpioSettings,
}

fn default_tick_ms() -> u64 {
    50
}

fn default_io_timeout_ms() -> u64 {
    10_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: EndpointSettings {
                host: "alerts.example.com".to_string(),
                port: default_port(),
                base_path: "/api/alert".to_string(),
                tls: true,
            },
            triggers: vec![
                TriggerSettings {
                    id: TriggerId::new("left"),
                    input_pin: PinId(17),
                    success_pin: PinId(5),
                    error_pin: PinId(6),
                    alert_threshold_ms: 10_000,
                    retrigger_interval_ms: 9_000,
                },
                TriggerSettings {
                    id: TriggerId::new("right"),
                    input_pin: PinId(27),
                    success_pin: PinId(13),
                    error_pin: PinId(19),
                    alert_threshold_ms: 10_000,
                    retrigger_interval_ms: 9_000,
                },
            ],
            override_button: OverrideSettings {
                button_pin: PinId(22),
                indicator_pin: PinId(26),
                long_press_ms: 3_000,
                grace_ms: 2_000,
                window_ms: 600_000,
            },
            health_interval_ms: 900_000,
            tick_ms: default_tick_ms(),
            io_timeout_ms: default_io_timeout_ms(),
            gpio: GpioSettings {
                root: PathBuf::from("/sys/class/gpio"),
                active_low: true,
            },
        }
    }
}

impl Settings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Every line the device reads or drives.
    pub fn all_pins(&self) -> Vec<PinId> {
        let mut pins = Vec::new();
        for trigger in &self.triggers {
            pins.extend([trigger.input_pin, trigger.success_pin, trigger.error_pin]);
        }
        pins.push(self.override_button.button_pin);
        pins.push(self.override_button.indicator_pin);
        pins
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.host.trim().is_empty() {
            return Err(SentinelError::invalid("endpoint.host is empty"));
        }
        if !self.endpoint.base_path.starts_with('/') {
            return Err(SentinelError::invalid(format!(
                "endpoint.base_path {:?} must start with '/'",
                self.endpoint.base_path
            )));
        }
        if self.triggers.is_empty() {
            return Err(SentinelError::invalid("no triggers configured"));
        }

        let mut seen = HashSet::new();
        for trigger in &self.triggers {
            if !trigger.id.is_url_safe() {
                return Err(SentinelError::invalid(format!(
                    "trigger id {:?} must be 1-64 chars of [A-Za-z0-9_-]",
                    trigger.id.as_str()
                )));
            }
            if !seen.insert(trigger.id.clone()) {
                return Err(SentinelError::invalid(format!(
                    "duplicate trigger id {}",
                    trigger.id
                )));
            }
            if trigger.alert_threshold_ms == 0 || trigger.retrigger_interval_ms == 0 {
                return Err(SentinelError::invalid(format!(
                    "trigger {} has a zero duration",
                    trigger.id
                )));
            }
            check_clock_span(
                &format!("trigger {} alert_threshold_ms", trigger.id),
                trigger.alert_threshold_ms,
            )?;
            check_clock_span(
                &format!("trigger {} retrigger_interval_ms", trigger.id),
                trigger.retrigger_interval_ms,
            )?;
        }

        let ovr = &self.override_button;
        let durations = [
            ("override_button.long_press_ms", ovr.long_press_ms),
            ("override_button.window_ms", ovr.window_ms),
            ("health_interval_ms", self.health_interval_ms),
            ("tick_ms", self.tick_ms),
            ("io_timeout_ms", self.io_timeout_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(SentinelError::invalid(format!("{name} must be non-zero")));
            }
        }

        check_clock_span("override_button.window_ms", ovr.window_ms)?;
        check_clock_span("health_interval_ms", self.health_interval_ms)?;
        check_clock_span(
            "override_button.long_press_ms + grace_ms",
            ovr.long_press_ms.saturating_add(ovr.grace_ms),
        )?;
        Ok(())
    }
}

/// Elapsed time is measured on a wrapping `u32` millisecond counter, so a
/// span of `u32::MAX` ms or more can never be observed.
fn check_clock_span(name: &str, value_ms: u64) -> Result<()> {
    if value_ms >= u64::from(u32::MAX) {
        return Err(SentinelError::invalid(format!(
            "{name} must be below {} ms",
            u32::MAX
        )));
    }
    Ok(())
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join("settings.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load and validate settings. A missing file yields the defaults and
    /// writes them out for editing; a malformed file is an error.
    pub fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            let settings = Settings::default();
            log::info!(
                "No settings at {}, writing defaults",
                self.config_path.display()
            );
            if let Err(e) = self.save(&settings) {
                log::warn!("Could not write default settings: {e}");
            }
            return Ok(settings);
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| SentinelError::io(&self.config_path, e))?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|e| SentinelError::ConfigParse {
                path: self.config_path.clone(),
                details: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| SentinelError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(settings).map_err(|e| {
            SentinelError::ConfigParse {
                path: self.config_path.clone(),
                details: e.to_string(),
            }
        })?;
        fs::write(&self.config_path, content).map_err(|e| SentinelError::io(&self.config_path, e))
    }
}
