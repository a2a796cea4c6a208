// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Zone-to-channel assignment.
//!
//! Each physical channel follows exactly one zone or holds a fixed duty.
//! Channel order matches the byte order of the raw fan command.

use crate::config::ChannelConfig;
use crate::error::ConfigError;
use std::collections::HashSet;

/// What drives a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDrive {
    /// Index into the chassis zone list.
    Zone(usize),
    /// Constant duty for unmonitored headers.
    Fixed(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub drive: ChannelDrive,
}

/// Ordered list of channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    channels: Vec<Channel>,
    zone_ids: Vec<String>,
}

impl ChannelMap {
    /// Resolve channel zone names against `zone_ids`.
    pub fn from_config(channels: &[ChannelConfig], zone_ids: &[&str]) -> Result<Self, ConfigError> {
        if channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }

        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(channels.len());
        for c in channels {
            if !seen.insert(c.name.as_str()) {
                return Err(ConfigError::DuplicateChannel(c.name.clone()));
            }
            let drive = match &c.zone {
                Some(zone) => {
                    let idx = zone_ids.iter().position(|id| *id == zone.as_str()).ok_or_else(|| {
                        ConfigError::UnknownZone {
                            channel: c.name.clone(),
                            zone: zone.clone(),
                        }
                    })?;
                    ChannelDrive::Zone(idx)
                }
                None => {
                    if c.fixed_duty > 100 {
                        return Err(ConfigError::InvalidFixedDuty {
                            channel: c.name.clone(),
                            duty: c.fixed_duty,
                        });
                    }
                    ChannelDrive::Fixed(c.fixed_duty)
                }
            };
            resolved.push(Channel {
                name: c.name.clone(),
                drive,
            });
        }

        Ok(Self {
            channels: resolved,
            zone_ids: zone_ids.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Whether any channel follows the zone with this id.
    pub fn is_zone_driven(&self, zone_id: &str) -> bool {
        let Some(idx) = self.zone_ids.iter().position(|id| id == zone_id) else {
            return false;
        };
        self.channels
            .iter()
            .any(|c| c.drive == ChannelDrive::Zone(idx))
    }

    /// Build the per-channel duty vector from per-zone duties.
    ///
    /// A zone without a duty drives its channels to 100%.
    pub fn duty_vector(&self, zone_duties: &[Option<u8>]) -> Vec<u8> {
        self.channels
            .iter()
            .map(|c| match c.drive {
                ChannelDrive::Zone(idx) => zone_duties.get(idx).copied().flatten().unwrap_or(100),
                ChannelDrive::Fixed(duty) => duty,
            })
            .collect()
    }

    /// Same duty on every channel.
    pub fn uniform(&self, duty: u8) -> Vec<u8> {
        vec![duty.min(100); self.channels.len()]
    }

    /// Channel names in command order, for logs.
    pub fn describe(&self, duties: &[u8]) -> String {
        self.channels
            .iter()
            .zip(duties)
            .map(|(c, d)| format!("{}={d}%", c.name))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
