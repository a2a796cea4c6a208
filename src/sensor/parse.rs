// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Parsers for vendor tool output.
//!
//! Each parser takes the raw text a tool printed and returns degrees C. None
//! of them touch the process table, so they are tested against captured
//! output.

use crate::error::ReadError;

/// Why a tool's output did not yield a temperature.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The tool ran but had nothing for this sensor.
    NoValue,
    /// The output did not look like what the tool normally prints.
    Malformed(String),
}

impl ParseError {
    pub fn for_sensor(self, sensor: &str) -> ReadError {
        let sensor = sensor.to_string();
        match self {
            ParseError::NoValue => ReadError::NoValue { sensor },
            ParseError::Malformed(detail) => ReadError::Malformed { sensor, detail },
        }
    }
}

// ---------------------------------------------------------------------------
// ipmitool
// ---------------------------------------------------------------------------

/// Find `name` in `ipmitool sdr type Temperature` output.
///
/// ```text
/// CPU Temp         | 30h | ok  |  3.1 | 45 degrees C
/// ```
///
/// Rows in `ipmitool sensor` layout (`CPU Temp | 45.000 | degrees C | ok`)
/// are accepted as well.
pub fn ipmi_sdr_temperature(output: &str, name: &str) -> Result<f64, ParseError> {
    let row = output
        .lines()
        .map(|line| line.split('|').map(str::trim).collect::<Vec<_>>())
        .find(|fields| fields.len() >= 2 && fields[0].eq_ignore_ascii_case(name))
        .ok_or(ParseError::NoValue)?;

    for (i, field) in row.iter().enumerate().skip(1) {
        let Some(value) = field.strip_suffix("degrees C") else {
            continue;
        };
        let value = value.trim();
        let value = if value.is_empty() { row[i - 1] } else { value };
        return parse_number(value);
    }

    // "No Reading", "na", "disabled"
    Err(ParseError::NoValue)
}

// ---------------------------------------------------------------------------
// smartctl
// ---------------------------------------------------------------------------

/// Extract the drive temperature from `smartctl -A` output.
///
/// Tried in order: attribute 194 raw value, attribute 190 raw value,
/// `Temperature Sensor 1:`, `Current Drive Temperature:` (SAS) and
/// `Temperature:` (NVMe).
pub fn smartctl_temperature(output: &str) -> Result<f64, ParseError> {
    for id in ["194", "190"] {
        let raw = output
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .find(|cols| cols.len() >= 10 && cols[0] == id)
            .map(|cols| cols[9].to_string());
        if let Some(raw) = raw {
            return parse_number(&raw);
        }
    }

    for label in [
        "Temperature Sensor 1:",
        "Current Drive Temperature:",
        "Temperature:",
    ] {
        let value = output
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix(label))
            .and_then(|rest| rest.split_whitespace().next());
        if let Some(value) = value {
            return parse_number(value);
        }
    }

    Err(ParseError::NoValue)
}

// ---------------------------------------------------------------------------
// nvidia-smi
// ---------------------------------------------------------------------------

/// Parse `nvidia-smi --query-gpu=temperature.gpu --format=csv,noheader,nounits`.
pub fn nvidia_smi_temperature(output: &str) -> Result<f64, ParseError> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(ParseError::NoValue)?;
    if line.contains("N/A") || line.contains("Not Supported") {
        return Err(ParseError::NoValue);
    }
    parse_number(line)
}

// ---------------------------------------------------------------------------
// lm-sensors
// ---------------------------------------------------------------------------

/// Read the first `temp*_input` of `feature` from `sensors -j` JSON.
///
/// When the output holds exactly one chip it is used regardless of its key,
/// since `sensors -j <chip>` accepts wildcards.
pub fn lm_sensors_temperature(output: &str, chip: &str, feature: &str) -> Result<f64, ParseError> {
    let root: serde_json::Value =
        serde_json::from_str(output).map_err(|e| ParseError::Malformed(e.to_string()))?;
    let chips = root
        .as_object()
        .ok_or_else(|| ParseError::Malformed("expected a JSON object".to_string()))?;

    let chip_obj = match chips.get(chip) {
        Some(obj) => obj,
        None if chips.len() == 1 => chips.values().next().ok_or(ParseError::NoValue)?,
        None => return Err(ParseError::NoValue),
    };

    let readings = chip_obj
        .get(feature)
        .and_then(|f| f.as_object())
        .ok_or(ParseError::NoValue)?;

    readings
        .iter()
        .filter(|(key, _)| key.starts_with("temp") && key.ends_with("_input"))
        .find_map(|(_, v)| v.as_f64())
        .ok_or(ParseError::NoValue)
}

// ---------------------------------------------------------------------------
// hwmon
// ---------------------------------------------------------------------------

/// Parse a hwmon `tempN_input` file (millidegrees C).
pub fn hwmon_millidegrees(contents: &str) -> Result<f64, ParseError> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err(ParseError::NoValue);
    }
    trimmed
        .parse::<i64>()
        .map(|millic| millic as f64 / 1000.0)
        .map_err(|e| ParseError::Malformed(format!("'{trimmed}': {e}")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_number(s: &str) -> Result<f64, ParseError> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(ParseError::Malformed(format!("non-finite value {v}"))),
        Err(_) => Err(ParseError::Malformed(format!("'{s}' is not a number"))),
    }
}
