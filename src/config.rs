// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Configuration file handling.
//!
//! Zones, curves and channel assignments are read from TOML once at startup
//! and validated into a [`Chassis`]. Nothing here is reloaded at runtime.
//! Default path: `/etc/fanctl/ipmi.toml`

use crate::actuator::{DEFAULT_RAW_PREFIX, FanEncoding};
use crate::channel::ChannelMap;
use crate::control::{Chassis, ControlLaw, Zone};
use crate::curve::{self, FanCurve};
use crate::error::ConfigError;
use crate::pid::PidGains;
use crate::sensor::SensorSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/fanctl/ipmi.toml";

/// Default tick period in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Default lowest duty any monitored channel is commanded to.
pub const DEFAULT_MIN_DUTY_FLOOR: u8 = 10;

/// Default number of healthy ticks before leaving fail-safe.
pub const DEFAULT_RECOVERY_TICKS: u32 = 3;

/// Default timeout for a single sensor read or fan write, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Loop settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Paths to the vendor tools.
    #[serde(default)]
    pub tools: ToolPaths,

    /// Raw fan command layout.
    #[serde(default)]
    pub actuator: ActuatorConfig,

    /// Named fan curves.
    #[serde(default)]
    pub curves: Vec<FanCurve>,

    /// Thermal zones.
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,

    /// Physical fan channels, in the order the raw command expects them.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

/// Loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// Tick period, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Lowest duty a zone-driven channel is ever commanded to.
    #[serde(default = "default_min_duty_floor")]
    pub min_duty_floor: u8,

    /// Consecutive healthy ticks required to leave fail-safe.
    #[serde(default = "default_recovery_ticks")]
    pub recovery_ticks: u32,

    /// Duty commanded on every channel at shutdown.
    #[serde(default = "default_full_duty")]
    pub exit_duty: u8,

    /// Timeout for each external tool call, in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Start the first tick at the top of a wall-clock second.
    #[serde(default = "default_true")]
    pub align_to_second: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            min_duty_floor: DEFAULT_MIN_DUTY_FLOOR,
            recovery_ticks: DEFAULT_RECOVERY_TICKS,
            exit_duty: 100,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            align_to_second: true,
        }
    }
}

impl DaemonConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Locations of the external tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolPaths {
    #[serde(default = "default_ipmitool")]
    pub ipmitool: PathBuf,

    #[serde(default = "default_smartctl")]
    pub smartctl: PathBuf,

    #[serde(default = "default_nvidia_smi")]
    pub nvidia_smi: PathBuf,

    #[serde(default = "default_sensors")]
    pub sensors: PathBuf,

    /// Interface flags placed before every ipmitool subcommand,
    /// e.g. `["-I", "lanplus", "-H", "10.0.0.5", "-U", "admin", "-P", "..."]`.
    #[serde(default)]
    pub ipmitool_args: Vec<String>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ipmitool: default_ipmitool(),
            smartctl: default_smartctl(),
            nvidia_smi: default_nvidia_smi(),
            sensors: default_sensors(),
            ipmitool_args: Vec::new(),
        }
    }
}

/// Raw fan command layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActuatorConfig {
    /// How each channel's duty is scaled into a byte.
    #[serde(default)]
    pub encoding: FanEncoding,

    /// Bytes sent after `raw`, before the channel bytes.
    #[serde(default = "default_raw_prefix")]
    pub raw_prefix: Vec<String>,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            encoding: FanEncoding::default(),
            raw_prefix: default_raw_prefix(),
        }
    }
}

/// One thermal zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneConfig {
    /// Zone identifier, e.g. "cpu" or "drives".
    pub id: String,

    /// How often the zone's sensors are read.
    pub poll_interval_secs: u64,

    /// Readings above this force every channel to full speed.
    pub safety_ceiling: f64,

    /// Once over the ceiling, the zone must drop this far below it to clear.
    #[serde(default)]
    pub ceiling_hysteresis: f64,

    /// Maximum age of a last-known-good reading before it stops counting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stale_secs: Option<u64>,

    /// Curve or PID.
    pub control: ZoneControl,

    /// Sensors whose hottest reading represents the zone.
    pub sensors: Vec<SensorSpec>,
}

/// How a zone's temperature becomes a duty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode")]
pub enum ZoneControl {
    /// Interpolate a named curve.
    #[serde(rename = "curve")]
    Curve {
        /// Name of the curve (must match a curve in `Config::curves`)
        curve: String,
    },

    /// Feedback toward a setpoint.
    #[serde(rename = "pid")]
    Pid(PidGains),
}

/// One physical fan channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    /// Header name, for logs.
    pub name: String,

    /// Zone driving this channel. Omit for unmonitored channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Duty held on a channel with no zone.
    #[serde(default = "default_full_duty")]
    pub fixed_duty: u8,
}

impl ChannelConfig {
    fn driven_by(name: &str, zone: &str) -> Self {
        Self {
            name: name.to_string(),
            zone: Some(zone.to_string()),
            fixed_duty: 100,
        }
    }

    fn unmonitored(name: &str) -> Self {
        Self {
            name: name.to_string(),
            zone: None,
            fixed_duty: 100,
        }
    }
}

impl Default for Config {
    /// ASRock Rack layout: CPU and board via the BMC, four SATA drives via
    /// smartctl, eight raw channel bytes.
    fn default() -> Self {
        let drives = ["/dev/sda", "/dev/sdb", "/dev/sdc", "/dev/sdd"]
            .into_iter()
            .map(|device| SensorSpec::Smartctl {
                device: device.to_string(),
            })
            .collect();

        Self {
            daemon: DaemonConfig::default(),
            tools: ToolPaths::default(),
            actuator: ActuatorConfig::default(),
            curves: vec![
                curve::default_cpu_curve(),
                curve::default_drive_curve(),
                curve::default_gpu_curve(),
            ],
            zones: vec![
                ZoneConfig {
                    id: "cpu".to_string(),
                    poll_interval_secs: 1,
                    safety_ceiling: 85.0,
                    ceiling_hysteresis: 10.0,
                    max_stale_secs: Some(30),
                    control: ZoneControl::Curve {
                        curve: "cpu".to_string(),
                    },
                    sensors: vec![SensorSpec::Ipmi {
                        name: "CPU Temp".to_string(),
                    }],
                },
                ZoneConfig {
                    id: "board".to_string(),
                    poll_interval_secs: 1,
                    safety_ceiling: 60.0,
                    ceiling_hysteresis: 5.0,
                    max_stale_secs: Some(30),
                    control: ZoneControl::Pid(PidGains {
                        kp: 2.5,
                        ki: 1.5,
                        kd: 0.1,
                        setpoint: 35.0,
                        integral_limit: Some(60.0),
                    }),
                    sensors: vec![SensorSpec::Ipmi {
                        name: "MB Temp".to_string(),
                    }],
                },
                ZoneConfig {
                    id: "drives".to_string(),
                    poll_interval_secs: 120,
                    safety_ceiling: 55.0,
                    ceiling_hysteresis: 3.0,
                    max_stale_secs: Some(600),
                    control: ZoneControl::Curve {
                        curve: "drives".to_string(),
                    },
                    sensors: drives,
                },
            ],
            channels: vec![
                ChannelConfig::driven_by("CPU_FAN1", "cpu"),
                ChannelConfig::unmonitored("CPU_FAN2"),
                ChannelConfig::driven_by("REAR_FAN1", "board"),
                ChannelConfig::unmonitored("REAR_FAN2"),
                ChannelConfig::driven_by("FRNT_FAN1", "board"),
                ChannelConfig::driven_by("FRNT_FAN2", "drives"),
                ChannelConfig::driven_by("FRNT_FAN3", "drives"),
                ChannelConfig::unmonitored("FRNT_FAN4"),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate everything and build the runtime description of the chassis.
    pub fn build_chassis(&self) -> Result<Chassis, ConfigError> {
        let d = &self.daemon;
        if d.tick_ms == 0 {
            return Err(out_of_range("daemon.tick_ms", d.tick_ms, "> 0"));
        }
        if d.min_duty_floor > 100 {
            return Err(out_of_range("daemon.min_duty_floor", d.min_duty_floor, "0-100"));
        }
        if d.exit_duty > 100 {
            return Err(out_of_range("daemon.exit_duty", d.exit_duty, "0-100"));
        }
        if d.recovery_ticks == 0 {
            return Err(out_of_range("daemon.recovery_ticks", d.recovery_ticks, ">= 1"));
        }
        if d.read_timeout_ms == 0 {
            return Err(out_of_range("daemon.read_timeout_ms", d.read_timeout_ms, "> 0"));
        }
        for byte in &self.actuator.raw_prefix {
            if parse_hex_byte(byte).is_none() {
                return Err(out_of_range("actuator.raw_prefix", byte, "hex bytes like 0x3a"));
            }
        }

        let mut curve_names = HashSet::new();
        for c in &self.curves {
            c.validate().map_err(|reason| ConfigError::InvalidCurve {
                curve: c.name.clone(),
                reason,
            })?;
            if !curve_names.insert(c.name.as_str()) {
                return Err(ConfigError::DuplicateCurve(c.name.clone()));
            }
        }

        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        let mut zones = Vec::with_capacity(self.zones.len());
        let mut zone_ids = HashSet::new();
        for z in &self.zones {
            if !zone_ids.insert(z.id.as_str()) {
                return Err(ConfigError::DuplicateZone(z.id.clone()));
            }
            zones.push(self.build_zone(z)?);
        }

        let ids: Vec<&str> = self.zones.iter().map(|z| z.id.as_str()).collect();
        let channels = ChannelMap::from_config(&self.channels, &ids)?;
        for id in &ids {
            if !channels.is_zone_driven(id) {
                log::warn!("Zone '{id}' is not assigned to any channel");
            }
        }

        Ok(Chassis {
            zones,
            channels,
            min_duty_floor: d.min_duty_floor,
            recovery_ticks: d.recovery_ticks,
        })
    }

    fn build_zone(&self, z: &ZoneConfig) -> Result<Zone, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidZone {
            zone: z.id.clone(),
            reason: reason.to_string(),
        };
        if z.sensors.is_empty() {
            return Err(invalid("at least one sensor is required"));
        }
        if z.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs must be > 0"));
        }
        if !z.safety_ceiling.is_finite() {
            return Err(invalid("safety_ceiling must be a finite temperature"));
        }
        if !z.ceiling_hysteresis.is_finite() || z.ceiling_hysteresis < 0.0 {
            return Err(invalid("ceiling_hysteresis must be >= 0"));
        }
        if z.max_stale_secs == Some(0) {
            return Err(invalid("max_stale_secs must be > 0"));
        }

        let law = match &z.control {
            ZoneControl::Curve { curve } => {
                let found = self
                    .curves
                    .iter()
                    .find(|c| &c.name == curve)
                    .ok_or_else(|| ConfigError::UnknownCurve {
                        zone: z.id.clone(),
                        curve: curve.clone(),
                    })?;
                if let Some(top) = found.top_temp() {
                    if z.safety_ceiling <= top {
                        log::warn!(
                            "Zone '{}': safety ceiling {:.1}C is not above the top of curve '{curve}' ({top:.1}C)",
                            z.id,
                            z.safety_ceiling
                        );
                    }
                }
                ControlLaw::Curve(found.clone())
            }
            ZoneControl::Pid(gains) => {
                gains.validate().map_err(|reason| invalid(&reason))?;
                if z.safety_ceiling <= gains.setpoint {
                    return Err(invalid("safety_ceiling must be above the PID setpoint"));
                }
                ControlLaw::Pid(*gains)
            }
        };

        Ok(Zone {
            id: z.id.clone(),
            poll_interval: Duration::from_secs(z.poll_interval_secs),
            safety_ceiling: z.safety_ceiling,
            ceiling_hysteresis: z.ceiling_hysteresis,
            max_stale: z.max_stale_secs.map(Duration::from_secs),
            law,
            sensors: z.sensors.clone(),
        })
    }

    /// Every tool the configured sensors and the actuator will invoke must exist.
    pub fn check_tools(&self) -> Result<(), ConfigError> {
        let t = &self.tools;
        let mut required = vec![("ipmitool", &t.ipmitool)];
        for sensor in self.zones.iter().flat_map(|z| &z.sensors) {
            match sensor {
                SensorSpec::Smartctl { .. } => required.push(("smartctl", &t.smartctl)),
                SensorSpec::NvidiaSmi { .. } => required.push(("nvidia-smi", &t.nvidia_smi)),
                SensorSpec::LmSensors { .. } => required.push(("sensors", &t.sensors)),
                SensorSpec::Ipmi { .. } | SensorSpec::Hwmon { .. } => {}
            }
        }
        for (tool, path) in required {
            if !path.exists() {
                return Err(ConfigError::MissingTool {
                    tool,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load / Save
// ---------------------------------------------------------------------------

/// Load config from a TOML file. A missing file is an error: the channel
/// layout is board specific and never guessed.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&contents)?;

    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Save config to a TOML file, creating parent directories if needed.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let io_err = |source: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents).map_err(io_err)?;
    log::info!("Saved config to {}", path.display());
    Ok(())
}

/// Resolve the config file path from CLI arg or default.
pub fn resolve_config_path(cli_path: Option<&str>) -> PathBuf {
    cli_path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_hex_byte(s: &str) -> Option<u8> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    u8::from_str_radix(digits, 16).ok()
}

fn out_of_range(field: &'static str, value: impl ToString, expected: &'static str) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        value: value.to_string(),
        expected,
    }
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

fn default_min_duty_floor() -> u8 {
    DEFAULT_MIN_DUTY_FLOOR
}

fn default_recovery_ticks() -> u32 {
    DEFAULT_RECOVERY_TICKS
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_full_duty() -> u8 {
    100
}

fn default_true() -> bool {
    true
}

fn default_ipmitool() -> PathBuf {
    PathBuf::from("/usr/bin/ipmitool")
}

fn default_smartctl() -> PathBuf {
    PathBuf::from("/usr/sbin/smartctl")
}

fn default_nvidia_smi() -> PathBuf {
    PathBuf::from("/usr/bin/nvidia-smi")
}

fn default_sensors() -> PathBuf {
    PathBuf::from("/usr/bin/sensors")
}

fn default_raw_prefix() -> Vec<String> {
    DEFAULT_RAW_PREFIX.map(String::from).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelDrive;

    const MINIMAL: &str = r#"
[daemon]
min_duty_floor = 15

[[curves]]
name = "cpu"
points = [
    { temp_c = 40.0, duty = 20 },
    { temp_c = 60.0, duty = 50 },
    { temp_c = 80.0, duty = 100 },
]

[[zones]]
id = "cpu"
poll_interval_secs = 2
safety_ceiling = 90.0
control = { mode = "curve", curve = "cpu" }
sensors = [{ source = "ipmi", name = "CPU Temp" }]

[[zones]]
id = "board"
poll_interval_secs = 5
safety_ceiling = 60.0
control = { mode = "pid", kp = 4.0, ki = 0.0, kd = 0.0, setpoint = 35.0 }
sensors = [{ source = "ipmi", name = "MB Temp" }]

[[channels]]
name = "CPU_FAN1"
zone = "cpu"

[[channels]]
name = "FRNT_FAN1"
zone = "board"

[[channels]]
name = "FRNT_FAN4"
fixed_duty = 60
"#;

    fn minimal() -> Config {
        toml::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn parses_and_fills_defaults() {
        let cfg = minimal();
        assert_eq!(cfg.daemon.min_duty_floor, 15);
        assert_eq!(cfg.daemon.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(cfg.daemon.recovery_ticks, DEFAULT_RECOVERY_TICKS);
        assert_eq!(cfg.actuator.encoding, FanEncoding::SixtyFourths);
        assert_eq!(cfg.actuator.raw_prefix, vec!["0x3a", "0x01"]);
        assert_eq!(cfg.channels[0].fixed_duty, 100);
        assert!(matches!(cfg.zones[1].control, ZoneControl::Pid(g) if g.kp == 4.0));
    }

    #[test]
    fn builds_chassis() {
        let chassis = minimal().build_chassis().unwrap();
        assert_eq!(chassis.zones.len(), 2);
        assert_eq!(chassis.zones[0].poll_interval, Duration::from_secs(2));
        assert_eq!(chassis.min_duty_floor, 15);
        assert_eq!(chassis.channels.len(), 3);
        assert_eq!(chassis.channels.get(1).map(|c| &c.drive), Some(&ChannelDrive::Zone(1)));
        assert_eq!(chassis.channels.get(2).map(|c| &c.drive), Some(&ChannelDrive::Fixed(60)));
    }

    #[test]
    fn default_config_is_valid() {
        let chassis = Config::default().build_chassis().unwrap();
        assert_eq!(chassis.channels.len(), 8);
        assert_eq!(chassis.zones[2].sensors.len(), 4);
    }

    #[test]
    fn rejects_non_monotonic_curve() {
        let mut cfg = minimal();
        cfg.curves[0].points[2].duty = 30;
        let err = cfg.build_chassis().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCurve { .. }), "{err}");
    }

    #[test]
    fn rejects_unknown_curve() {
        let mut cfg = minimal();
        cfg.zones[0].control = ZoneControl::Curve {
            curve: "missing".to_string(),
        };
        assert!(matches!(
            cfg.build_chassis(),
            Err(ConfigError::UnknownCurve { .. })
        ));
    }

    #[test]
    fn rejects_channel_with_unknown_zone() {
        let mut cfg = minimal();
        cfg.channels[0].zone = Some("gpu".to_string());
        assert!(matches!(
            cfg.build_chassis(),
            Err(ConfigError::UnknownZone { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_zone() {
        let mut cfg = minimal();
        let dup = cfg.zones[0].clone();
        cfg.zones.push(dup);
        assert!(matches!(
            cfg.build_chassis(),
            Err(ConfigError::DuplicateZone(id)) if id == "cpu"
        ));
    }

    #[test]
    fn rejects_zone_without_sensors() {
        let mut cfg = minimal();
        cfg.zones[1].sensors.clear();
        assert!(matches!(
            cfg.build_chassis(),
            Err(ConfigError::InvalidZone { .. })
        ));
    }

    #[test]
    fn rejects_floor_above_100() {
        let mut cfg = minimal();
        cfg.daemon.min_duty_floor = 101;
        assert!(matches!(
            cfg.build_chassis(),
            Err(ConfigError::OutOfRange { field: "daemon.min_duty_floor", .. })
        ));
    }

    #[test]
    fn rejects_bad_raw_prefix() {
        let mut cfg = minimal();
        cfg.actuator.raw_prefix = vec!["3a".to_string()];
        assert!(cfg.build_chassis().is_err());
        cfg.actuator.raw_prefix = vec!["0x3A".to_string(), "0x01".to_string()];
        assert!(cfg.build_chassis().is_ok());
        assert_eq!(parse_hex_byte("0x3a"), Some(0x3a));
        assert_eq!(parse_hex_byte("0x100"), None);
    }

    #[test]
    fn rejects_empty_channels() {
        let mut cfg = minimal();
        cfg.channels.clear();
        assert!(matches!(cfg.build_chassis(), Err(ConfigError::NoChannels)));
    }

    #[test]
    fn missing_tool_is_reported() {
        let mut cfg = minimal();
        cfg.tools.ipmitool = PathBuf::from("/nonexistent/ipmitool");
        assert!(matches!(
            cfg.check_tools(),
            Err(ConfigError::MissingTool { tool: "ipmitool", .. })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etc/fanctl/ipmi.toml");
        save_config(&path, &Config::default()).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[[zones]]\nid = 3\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }
}
