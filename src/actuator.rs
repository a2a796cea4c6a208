// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Fan actuation through the BMC.
//!
//! A duty vector holds one percentage per physical channel. It is encoded
//! into the board's native scale and written as a single
//! `ipmitool raw <prefix> <b0> <b1> ...` command.

use crate::config::ToolPaths;
use crate::error::ActuationError;
use crate::exec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OEM netfn/command for setting fan duty on ASRock Rack boards.
pub const DEFAULT_RAW_PREFIX: [&str; 2] = ["0x3a", "0x01"];

/// Native scale the BMC expects for each channel byte.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FanEncoding {
    /// 0-100% as 0x00-0x64.
    Percent,
    /// 0-100% as 0-64 sixty-fourths.
    #[default]
    SixtyFourths,
    /// 0-100% as 0x00-0xff.
    Byte,
}

impl FanEncoding {
    /// Largest raw value, corresponding to 100%.
    pub const fn full_scale(self) -> u8 {
        match self {
            FanEncoding::Percent => 100,
            FanEncoding::SixtyFourths => 64,
            FanEncoding::Byte => 255,
        }
    }

    /// Convert a duty percentage to the native value. Duties above 100 saturate.
    pub fn encode(self, duty: u8) -> u8 {
        let duty = duty.min(100) as u32;
        let full = self.full_scale() as u32;
        ((duty * full + 50) / 100) as u8
    }

    /// Convert a native value back to a duty percentage.
    pub fn decode(self, raw: u8) -> u8 {
        let full = self.full_scale() as u32;
        let raw = (raw as u32).min(full);
        ((raw * 100 + full / 2) / full) as u8
    }

    /// Hex byte arguments for `ipmitool raw`.
    pub fn encode_args(self, duties: &[u8]) -> Vec<String> {
        duties
            .iter()
            .map(|&d| format!("0x{:02x}", self.encode(d)))
            .collect()
    }
}

/// Accepts a full duty vector and applies it to the hardware.
#[async_trait]
pub trait FanActuator: Send + Sync {
    /// Apply one duty (0-100) per channel, in channel order.
    async fn apply(&self, duties: &[u8]) -> Result<(), ActuationError>;
}

/// Writes duty vectors with `ipmitool raw`.
#[derive(Debug, Clone)]
pub struct IpmiRawActuator {
    tools: ToolPaths,
    prefix: Vec<String>,
    encoding: FanEncoding,
    channels: usize,
    timeout: Duration,
}

impl IpmiRawActuator {
    pub fn new(
        tools: ToolPaths,
        prefix: Vec<String>,
        encoding: FanEncoding,
        channels: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            tools,
            prefix,
            encoding,
            channels,
            timeout,
        }
    }

    /// Full argument list passed to ipmitool for `duties`.
    pub fn command_args(&self, duties: &[u8]) -> Result<Vec<String>, ActuationError> {
        if duties.len() != self.channels {
            return Err(ActuationError::ChannelCount {
                expected: self.channels,
                actual: duties.len(),
            });
        }
        let mut args = self.tools.ipmitool_args.clone();
        args.push("raw".to_string());
        args.extend(self.prefix.iter().cloned());
        args.extend(self.encoding.encode_args(duties));
        Ok(args)
    }
}

#[async_trait]
impl FanActuator for IpmiRawActuator {
    async fn apply(&self, duties: &[u8]) -> Result<(), ActuationError> {
        let args = self.command_args(duties)?;
        log::debug!("Executing: ipmitool {}", args.join(" "));
        exec::run_tool(&self.tools.ipmitool, args.as_slice(), self.timeout).await?;
        Ok(())
    }
}

/// Logs the raw command instead of running it.
#[derive(Debug, Clone)]
pub struct DryRunActuator {
    inner: IpmiRawActuator,
}

impl DryRunActuator {
    pub fn new(inner: IpmiRawActuator) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl FanActuator for DryRunActuator {
    async fn apply(&self, duties: &[u8]) -> Result<(), ActuationError> {
        let args = self.inner.command_args(duties)?;
        log::info!("[dry-run] ipmitool {}", args.join(" "));
        Ok(())
    }
}
