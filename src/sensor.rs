// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Temperature acquisition.
//!
//! A zone lists one or more [`SensorSpec`]s. A [`SensorSource`] turns a spec
//! into a temperature or a [`ReadError`]; the control loop reduces a zone's
//! members to a single value with [`read_zone`].

pub mod parse;

use crate::config::ToolPaths;
use crate::error::{ReadError, ToolError};
use crate::exec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// Where a single temperature comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "source")]
pub enum SensorSpec {
    /// A row of `ipmitool sdr type Temperature`, e.g. "CPU Temp".
    #[serde(rename = "ipmi")]
    Ipmi { name: String },

    /// Drive temperature from `smartctl -A`.
    #[serde(rename = "smartctl")]
    Smartctl { device: String },

    /// GPU core temperature from `nvidia-smi`.
    #[serde(rename = "nvidia-smi")]
    NvidiaSmi {
        #[serde(default)]
        index: u32,
    },

    /// A feature of an lm-sensors chip, read via `sensors -j`.
    #[serde(rename = "lm-sensors")]
    LmSensors { chip: String, feature: String },

    /// A hwmon `tempN_input` file in millidegrees C.
    #[serde(rename = "hwmon")]
    Hwmon { path: PathBuf },
}

impl fmt::Display for SensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorSpec::Ipmi { name } => write!(f, "ipmi:{name}"),
            SensorSpec::Smartctl { device } => write!(f, "smartctl:{device}"),
            SensorSpec::NvidiaSmi { index } => write!(f, "nvidia-smi:{index}"),
            SensorSpec::LmSensors { chip, feature } => write!(f, "lm-sensors:{chip}/{feature}"),
            SensorSpec::Hwmon { path } => write!(f, "hwmon:{}", path.display()),
        }
    }
}

/// Supplies temperatures for individual sensors.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Read one sensor in degrees Celsius.
    async fn read(&self, sensor: &SensorSpec) -> Result<f64, ReadError>;
}

/// Read every member of a zone and reduce to the hottest successful reading.
///
/// Failed members are logged and left out. The zone only fails when every
/// member fails.
pub async fn read_zone(
    source: &dyn SensorSource,
    zone_id: &str,
    members: &[SensorSpec],
) -> Result<f64, ReadError> {
    let mut results = Vec::with_capacity(members.len());
    for sensor in members {
        let result = source.read(sensor).await;
        match &result {
            Ok(t) => log::trace!("{zone_id}: {sensor} = {t:.1}C"),
            Err(e) => log::warn!("{zone_id}: read failed: {e}"),
        }
        results.push(result);
    }
    hottest(results)
}

/// Maximum of the successful readings.
pub fn hottest(results: Vec<Result<f64, ReadError>>) -> Result<f64, ReadError> {
    if results.is_empty() {
        return Err(ReadError::NoMembers);
    }
    let count = results.len();
    results
        .into_iter()
        .filter_map(Result::ok)
        .filter(|t| t.is_finite())
        .reduce(f64::max)
        .ok_or(ReadError::AllMembersFailed { count })
}

// ---------------------------------------------------------------------------
// Command-backed source
// ---------------------------------------------------------------------------

/// Reads sensors by invoking the vendor tools configured in [`ToolPaths`].
#[derive(Debug, Clone)]
pub struct CommandSensorSource {
    tools: ToolPaths,
    timeout: Duration,
}

impl CommandSensorSource {
    pub fn new(tools: ToolPaths, timeout: Duration) -> Self {
        Self { tools, timeout }
    }
}

#[async_trait]
impl SensorSource for CommandSensorSource {
    async fn read(&self, sensor: &SensorSpec) -> Result<f64, ReadError> {
        let label = sensor.to_string();
        match sensor {
            SensorSpec::Ipmi { name } => {
                let mut args = self.tools.ipmitool_args.clone();
                args.extend(["sdr", "type", "Temperature"].map(String::from));
                let out =
                    exec::run_tool(&self.tools.ipmitool, args.as_slice(), self.timeout).await?;
                parse::ipmi_sdr_temperature(&out, name).map_err(|e| e.for_sensor(&label))
            }
            SensorSpec::Smartctl { device } => {
                let out = exec::run_tool_accepting(
                    &self.tools.smartctl,
                    &["-A", device.as_str()],
                    self.timeout,
                    smartctl_output_usable,
                )
                .await?;
                parse::smartctl_temperature(&out).map_err(|e| e.for_sensor(&label))
            }
            SensorSpec::NvidiaSmi { index } => {
                let index = index.to_string();
                let args = [
                    "--query-gpu=temperature.gpu",
                    "--format=csv,noheader,nounits",
                    "-i",
                    index.as_str(),
                ];
                let out = exec::run_tool(&self.tools.nvidia_smi, &args, self.timeout).await?;
                parse::nvidia_smi_temperature(&out).map_err(|e| e.for_sensor(&label))
            }
            SensorSpec::LmSensors { chip, feature } => {
                let out =
                    exec::run_tool(&self.tools.sensors, &["-j", chip.as_str()], self.timeout)
                        .await?;
                parse::lm_sensors_temperature(&out, chip, feature)
                    .map_err(|e| e.for_sensor(&label))
            }
            SensorSpec::Hwmon { path } => {
                let contents = tokio::time::timeout(self.timeout, tokio::fs::read_to_string(path))
                    .await
                    .map_err(|_| ToolError::Timeout {
                        tool: label.clone(),
                        timeout: self.timeout,
                    })?
                    .map_err(|source| ReadError::Io {
                        sensor: label.clone(),
                        source,
                    })?;
                parse::hwmon_millidegrees(&contents).map_err(|e| e.for_sensor(&label))
            }
        }
    }
}

/// smartctl's exit code is a bitmask. Bits 0-1 mean the command line or the
/// device open failed; the higher bits flag drive health history while the
/// attribute table is still printed.
fn smartctl_output_usable(status: &ExitStatus) -> bool {
    status.code().is_some_and(|code| code & 0x03 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    struct Canned(HashMap<SensorSpec, Option<f64>>);

    #[async_trait]
    impl SensorSource for Canned {
        async fn read(&self, sensor: &SensorSpec) -> Result<f64, ReadError> {
            self.0
                .get(sensor)
                .copied()
                .flatten()
                .ok_or_else(|| ReadError::NoValue {
                    sensor: sensor.to_string(),
                })
        }
    }

    fn drive(dev: &str) -> SensorSpec {
        SensorSpec::Smartctl {
            device: dev.to_string(),
        }
    }

    #[tokio::test]
    async fn zone_takes_hottest_successful_member() {
        let source = Canned(HashMap::from([
            (drive("/dev/sda"), Some(30.0)),
            (drive("/dev/sdb"), None),
            (drive("/dev/sdc"), Some(42.0)),
            (drive("/dev/sdd"), None),
        ]));
        let members = ["/dev/sda", "/dev/sdb", "/dev/sdc", "/dev/sdd"].map(drive);
        let t = read_zone(&source, "drives", &members).await.unwrap();
        assert_eq!(t, 42.0);
    }

    #[tokio::test]
    async fn zone_fails_when_every_member_fails() {
        let source = Canned(HashMap::from([
            (drive("/dev/sda"), None),
            (drive("/dev/sdb"), None),
        ]));
        let members = ["/dev/sda", "/dev/sdb"].map(drive);
        let err = read_zone(&source, "drives", &members).await.unwrap_err();
        assert!(matches!(err, ReadError::AllMembersFailed { count: 2 }));
    }

    #[test]
    fn empty_zone_is_a_failure() {
        assert!(matches!(hottest(Vec::new()), Err(ReadError::NoMembers)));
    }

    #[test]
    fn spec_parses_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            sensors: Vec<SensorSpec>,
        }
        let w: Wrapper = toml::from_str(
            r#"
            sensors = [
                { source = "ipmi", name = "CPU Temp" },
                { source = "smartctl", device = "/dev/sda" },
                { source = "nvidia-smi" },
                { source = "lm-sensors", chip = "nvme-pci-0100", feature = "Composite" },
                { source = "hwmon", path = "/sys/class/hwmon/hwmon2/temp1_input" },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(w.sensors.len(), 5);
        assert_eq!(w.sensors[2], SensorSpec::NvidiaSmi { index: 0 });
        assert_eq!(w.sensors[0].to_string(), "ipmi:CPU Temp");
    }

    #[tokio::test]
    async fn hwmon_file_is_read_in_millidegrees() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "41500").unwrap();
        let source = CommandSensorSource::new(ToolPaths::default(), Duration::from_secs(1));
        let t = source
            .read(&SensorSpec::Hwmon {
                path: file.path().to_path_buf(),
            })
            .await
            .unwrap();
        assert_eq!(t, 41.5);
    }

    fn fake_smartctl(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("smartctl");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn smartctl_health_bits_still_yield_temperature() {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolPaths {
            smartctl: fake_smartctl(
                dir.path(),
                "echo '194 Temperature_Celsius     0x0022   037   045   000    Old_age   Always       -       37'\nexit 64",
            ),
            ..ToolPaths::default()
        };
        let source = CommandSensorSource::new(tools, Duration::from_secs(5));
        assert_eq!(source.read(&drive("/dev/sda")).await.unwrap(), 37.0);
    }

    #[tokio::test]
    async fn smartctl_open_failure_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolPaths {
            smartctl: fake_smartctl(dir.path(), "echo 'Smartctl open device: /dev/sdz failed'\nexit 2"),
            ..ToolPaths::default()
        };
        let source = CommandSensorSource::new(tools, Duration::from_secs(5));
        let err = source.read(&drive("/dev/sdz")).await.unwrap_err();
        assert!(matches!(err, ReadError::Tool(ToolError::Failed { .. })));
    }

    #[test]
    fn smartctl_exit_bits() {
        use std::os::unix::process::ExitStatusExt;
        // wait(2) status: exit code in the high byte
        let exited = |code: i32| ExitStatus::from_raw(code << 8);
        assert!(smartctl_output_usable(&exited(0)));
        assert!(smartctl_output_usable(&exited(64)));
        assert!(smartctl_output_usable(&exited(4 | 32)));
        assert!(!smartctl_output_usable(&exited(1)));
        assert!(!smartctl_output_usable(&exited(2 | 64)));
    }

    #[tokio::test]
    async fn missing_tool_is_a_read_failure() {
        let tools = ToolPaths {
            smartctl: PathBuf::from("/nonexistent/smartctl"),
            ..ToolPaths::default()
        };
        let source = CommandSensorSource::new(tools, Duration::from_secs(1));
        let err = source.read(&drive("/dev/sda")).await.unwrap_err();
        assert!(matches!(err, ReadError::Tool(_)));
    }
}
