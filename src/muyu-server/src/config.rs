// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for muyu-server.
//!
//! Config is loaded from the `[muyu-server]` section of `muyu.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./muyu.toml`
//! 3. `~/.config/muyu/muyu.toml`
//! 4. `/etc/muyu/muyu.toml`

use std::time::Duration;

use serde::{Deserialize, Serialize};

use muyu_app::ConfigFile;
use muyu_core::{Classification, EffectProfile, PhaseTimings};

/// Top-level server configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Link to the controller board
    pub link: LinkConfig,
    /// Phase durations and loop cadence
    pub timing: TimingConfig,
    /// Expression sensing
    pub sensing: SensingConfig,
    /// Event queue between the listener and the control loop
    pub queue: QueueConfig,
    /// Auxiliary effects per expression
    pub effects: EffectProfile,
    /// Startup and shutdown behavior
    pub behavior: BehaviorConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// How to reach the controller board.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Link type: "serial", "tcp" or "dummy"
    #[serde(rename = "type")]
    pub link_type: Option<String>,
    /// Serial port path (for serial links)
    pub port: Option<String>,
    /// Baud rate (for serial links)
    pub baud: Option<u32>,
    /// Host address (for TCP links)
    pub host: Option<String>,
    /// TCP port (for TCP links)
    pub tcp_port: Option<u16>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            link_type: None,
            port: None,
            baud: Some(115_200),
            host: None,
            tcp_port: None,
        }
    }
}

/// Phase durations and loop cadence, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub sensing_ms: u64,
    pub acting_ms: u64,
    pub cooling_ms: u64,
    /// Control-loop tick
    pub tick_ms: u64,
    /// Pause between listener polls when the link is quiet
    pub listener_poll_ms: u64,
    /// Interval of progress messages while a performance runs
    pub progress_log_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sensing_ms: 3000,
            acting_ms: 10_000,
            cooling_ms: 2000,
            tick_ms: 100,
            listener_poll_ms: 10,
            progress_log_ms: 2000,
        }
    }
}

/// Which expression sampler feeds the sensing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerKind {
    /// No camera: every cycle ends on the fallback.
    #[default]
    #[serde(rename = "none")]
    NoFace,
    /// Replay `[sensing].script` in every window.
    #[serde(rename = "scripted")]
    Scripted,
}

/// Expression sensing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensingConfig {
    /// Expression used when a window produced no classification
    pub fallback: Classification,
    pub sampler: SamplerKind,
    /// Per-frame verdicts for the scripted sampler ("happy", "sad",
    /// "surprised" or "none")
    pub script: Vec<String>,
    /// Minimum spacing between sampled frames
    pub frame_ms: u64,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            fallback: Classification::Happy,
            sampler: SamplerKind::NoFace,
            script: Vec::new(),
            frame_ms: 30,
        }
    }
}

impl SensingConfig {
    /// Parse the scripted verdicts.
    pub fn parsed_script(&self) -> Result<Vec<Option<Classification>>, String> {
        self.script
            .iter()
            .map(|entry| match entry.trim().to_ascii_lowercase().as_str() {
                "none" | "" => Ok(None),
                other => other
                    .parse::<Classification>()
                    .map(Some)
                    .map_err(|e| format!("[sensing].script: {}", e)),
            })
            .collect()
    }
}

/// Event queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of undelivered events; newer events are dropped
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Startup and shutdown behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Ask the board for a simulated strike once the link is open
    pub self_test_on_start: bool,
    /// Switch every effect off before closing the link
    pub stop_all_on_shutdown: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            self_test_on_start: false,
            stop_all_on_shutdown: true,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;
        validate_link(&self.link)?;
        validate_timing(&self.timing, self.sensing.frame_ms)?;

        if self.queue.capacity == 0 {
            return Err("[queue].capacity must be > 0".to_string());
        }
        if self.sensing.sampler == SamplerKind::Scripted && self.sensing.script.is_empty() {
            return Err("[sensing].script must not be empty for the scripted sampler".to_string());
        }
        self.sensing.parsed_script()?;
        Ok(())
    }

    pub fn phase_timings(&self) -> PhaseTimings {
        PhaseTimings {
            sensing: Duration::from_millis(self.timing.sensing_ms),
            acting: Duration::from_millis(self.timing.acting_ms),
            cooling: Duration::from_millis(self.timing.cooling_ms),
            tick: Duration::from_millis(self.timing.tick_ms),
            frame_interval: Duration::from_millis(self.sensing.frame_ms),
        }
    }

    /// Generate an example configuration wrapped under the `[muyu-server]`
    /// section header, suitable for use in a combined `muyu.toml` file.
    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "muyu-server")]
            inner: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            link: LinkConfig {
                link_type: Some("serial".to_string()),
                port: Some("/dev/ttyUSB0".to_string()),
                baud: Some(115_200),
                host: None,
                tcp_port: None,
            },
            ..ServerConfig::default()
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

fn validate_link(link: &LinkConfig) -> Result<(), String> {
    let serial_fields_set = link.port.is_some();
    let tcp_fields_set = link.host.is_some() || link.tcp_port.is_some();

    if link.link_type.is_none() && !serial_fields_set && !tcp_fields_set {
        return Ok(());
    }

    match link.link_type.as_deref().unwrap_or("serial") {
        "serial" => {
            if link.port.as_deref().unwrap_or("").trim().is_empty() {
                return Err(
                    "[link].port must be set for serial links ([link].type='serial')".to_string(),
                );
            }
            if link.baud.unwrap_or(0) == 0 {
                return Err(
                    "[link].baud must be > 0 for serial links ([link].type='serial')".to_string(),
                );
            }
        }
        "tcp" => {
            if link.host.as_deref().unwrap_or("").trim().is_empty() {
                return Err("[link].host must be set for tcp links ([link].type='tcp')".to_string());
            }
            if link.tcp_port.unwrap_or(0) == 0 {
                return Err(
                    "[link].tcp_port must be > 0 for tcp links ([link].type='tcp')".to_string(),
                );
            }
        }
        "dummy" => {}
        other => {
            return Err(format!(
                "[link].type '{}' is invalid (expected 'serial', 'tcp', or 'dummy')",
                other
            ))
        }
    }
    Ok(())
}

fn validate_timing(timing: &TimingConfig, frame_ms: u64) -> Result<(), String> {
    for (key, value) in [
        ("sensing_ms", timing.sensing_ms),
        ("acting_ms", timing.acting_ms),
        ("cooling_ms", timing.cooling_ms),
        ("tick_ms", timing.tick_ms),
        ("listener_poll_ms", timing.listener_poll_ms),
        ("progress_log_ms", timing.progress_log_ms),
    ] {
        if value == 0 {
            return Err(format!("[timing].{} must be > 0", key));
        }
    }
    let shortest = timing
        .sensing_ms
        .min(timing.acting_ms)
        .min(timing.cooling_ms);
    if timing.tick_ms >= shortest {
        return Err(format!(
            "[timing].tick_ms ({}) must be shorter than every phase duration (shortest is {} ms)",
            timing.tick_ms, shortest
        ));
    }
    if timing.listener_poll_ms > 100 {
        return Err("[timing].listener_poll_ms must be <= 100".to_string());
    }
    if frame_ms == 0 {
        return Err("[sensing].frame_ms must be > 0".to_string());
    }
    Ok(())
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "muyu-server"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.link.baud, Some(115_200));
        assert_eq!(config.timing.sensing_ms, 3000);
        assert_eq!(config.timing.acting_ms, 10_000);
        assert_eq!(config.timing.cooling_ms, 2000);
        assert_eq!(config.timing.tick_ms, 100);
        assert_eq!(config.sensing.fallback, Classification::Happy);
        assert_eq!(config.sensing.sampler, SamplerKind::NoFace);
        assert_eq!(config.queue.capacity, 64);
        assert!(!config.effects.has_extras());
        assert!(!config.behavior.self_test_on_start);
        assert!(config.behavior.stop_all_on_shutdown);
        assert!(config.validate().is_ok());
        assert_eq!(config.phase_timings(), PhaseTimings::default());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[link]
type = "serial"
port = "/dev/ttyUSB0"
"#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.link.port, Some("/dev/ttyUSB0".to_string()));
        assert_eq!(config.link.baud, Some(115_200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[general]
log_level = "debug"

[link]
type = "tcp"
host = "192.168.4.1"
tcp_port = 23

[timing]
sensing_ms = 2000
acting_ms = 8000
cooling_ms = 1000
tick_ms = 50
listener_poll_ms = 20

[sensing]
fallback = "surprised"
sampler = "scripted"
script = ["sad", "none", "Sad"]
frame_ms = 40

[queue]
capacity = 8

[effects.sad]
motor_pwm = 120

[effects.surprised.random]
speed = 200
brightness = 255

[behavior]
self_test_on_start = true
stop_all_on_shutdown = false
"#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.log_level.as_deref(), Some("debug"));
        assert_eq!(config.link.host.as_deref(), Some("192.168.4.1"));
        assert_eq!(config.link.tcp_port, Some(23));
        assert_eq!(config.timing.tick_ms, 50);
        assert_eq!(config.sensing.fallback, Classification::Surprised);
        assert_eq!(config.sensing.sampler, SamplerKind::Scripted);
        assert_eq!(
            config.sensing.parsed_script().unwrap(),
            vec![Some(Classification::Sad), None, Some(Classification::Sad)]
        );
        assert_eq!(config.queue.capacity, 8);
        assert_eq!(config.effects.sad.motor_pwm, Some(120));
        assert_eq!(
            config.effects.surprised.random.map(|r| r.brightness),
            Some(255)
        );
        assert!(config.behavior.self_test_on_start);
        assert!(!config.behavior.stop_all_on_shutdown);
        assert_eq!(
            config.phase_timings().frame_interval,
            Duration::from_millis(40)
        );
    }

    #[test]
    fn test_example_combined_toml_parses() {
        let example = ServerConfig::example_combined_toml();
        let table: toml::Table = toml::from_str(&example).unwrap();
        let section = toml::to_string(table.get("muyu-server").unwrap()).unwrap();
        let config: ServerConfig = toml::from_str(&section).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.link.port.as_deref(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn test_validate_rejects_bad_link() {
        let mut config = ServerConfig::default();
        config.link.link_type = Some("serial".to_string());
        assert!(config.validate().unwrap_err().contains("[link].port"));

        config.link.link_type = Some("tcp".to_string());
        config.link.host = Some("board.local".to_string());
        assert!(config.validate().unwrap_err().contains("[link].tcp_port"));

        config.link.link_type = Some("bluetooth".to_string());
        assert!(config.validate().unwrap_err().contains("invalid"));

        config.link = LinkConfig {
            link_type: Some("dummy".to_string()),
            ..LinkConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_timing() {
        let mut config = ServerConfig::default();
        config.timing.acting_ms = 0;
        assert!(config.validate().unwrap_err().contains("acting_ms"));

        let mut config = ServerConfig::default();
        config.timing.tick_ms = 2000;
        assert!(config.validate().unwrap_err().contains("tick_ms"));

        let mut config = ServerConfig::default();
        config.timing.listener_poll_ms = 250;
        assert!(config.validate().unwrap_err().contains("listener_poll_ms"));

        let mut config = ServerConfig::default();
        config.sensing.frame_ms = 0;
        assert!(config.validate().unwrap_err().contains("frame_ms"));
    }

    #[test]
    fn test_validate_rejects_bad_sensing() {
        let mut config = ServerConfig::default();
        config.sensing.sampler = SamplerKind::Scripted;
        assert!(config.validate().unwrap_err().contains("[sensing].script"));

        config.sensing.script = vec!["happy".to_string(), "angry".to_string()];
        assert!(config.validate().unwrap_err().contains("angry"));

        let mut config = ServerConfig::default();
        config.queue.capacity = 0;
        assert!(config.validate().unwrap_err().contains("[queue].capacity"));
    }

    #[test]
    fn test_log_level_matches_logging_parser() {
        let mut config = ServerConfig::default();
        for level in ["WARN", " debug ", "Error"] {
            config.general.log_level = Some(level.to_string());
            assert!(config.validate().is_ok(), "{} should be accepted", level);
            assert_eq!(
                muyu_app::parse_level(Some(level)).to_string().to_ascii_lowercase(),
                level.trim().to_ascii_lowercase()
            );
        }

        config.general.log_level = Some("loud".to_string());
        assert!(config.validate().unwrap_err().contains("[general].log_level"));
    }

    #[test]
    fn test_unknown_fallback_fails_to_parse() {
        let result = toml::from_str::<ServerConfig>("[sensing]\nfallback = \"bored\"\n");
        assert!(result.is_err());
    }
}
