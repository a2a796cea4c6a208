// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Closed-loop chassis fan control.
//!
//! Temperatures are sampled per thermal zone, mapped to fan duty cycles with
//! either a piecewise-linear curve or a PID loop, routed to physical fan
//! channels and written to the BMC as a single raw command.

pub mod actuator;
pub mod channel;
pub mod config;
pub mod control;
pub mod curve;
pub mod error;
pub mod exec;
pub mod pid;
pub mod sensor;
