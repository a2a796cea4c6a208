// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Error types shared across the controller.
//!
//! Read and actuation failures are recoverable at runtime. Configuration
//! errors are fatal and only occur before the first tick.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to run an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} did not finish within {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
}

/// A sensor or zone could not produce a temperature.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("{sensor}: no value reported")]
    NoValue { sensor: String },

    #[error("{sensor}: malformed output ({detail})")]
    Malformed { sensor: String, detail: String },

    #[error("{sensor}: {source}")]
    Io {
        sensor: String,
        #[source]
        source: io::Error,
    },

    #[error("zone has no sensors")]
    NoMembers,

    #[error("all {count} sensor(s) failed")]
    AllMembersFailed { count: usize },

    #[error("read task failed: {0}")]
    TaskFailed(String),
}

/// A duty vector was not applied to the hardware.
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("expected {expected} channel duties, got {actual}")]
    ChannelCount { expected: usize, actual: usize },
}

/// Invalid or unusable configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path} not found")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("curve '{curve}': {reason}")]
    InvalidCurve { curve: String, reason: String },

    #[error("duplicate curve name '{0}'")]
    DuplicateCurve(String),

    #[error("zone '{zone}' references unknown curve '{curve}'")]
    UnknownCurve { zone: String, curve: String },

    #[error("duplicate zone id '{0}'")]
    DuplicateZone(String),

    #[error("zone '{zone}': {reason}")]
    InvalidZone { zone: String, reason: String },

    #[error("channel '{channel}' references unknown zone '{zone}'")]
    UnknownZone { channel: String, zone: String },

    #[error("duplicate channel name '{0}'")]
    DuplicateChannel(String),

    #[error("channel '{channel}': fixed duty {duty} is above 100")]
    InvalidFixedDuty { channel: String, duty: u8 },

    #[error("no fan channels configured")]
    NoChannels,

    #[error("no zones configured")]
    NoZones,

    #[error("{field} = {value} is out of range ({expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("required tool {tool} not found at {path}")]
    MissingTool { tool: &'static str, path: PathBuf },
}
