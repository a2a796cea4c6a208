// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! The control loop.
//!
//! Each tick:
//! 1. polls the zones whose interval has elapsed, one task per zone, and
//!    joins every result before going further;
//! 2. folds the readings into [`ControllerState`], falling back to
//!    last-known-good values and latching over-ceiling zones;
//! 3. moves between [`Mode::Normal`] and [`Mode::Override`];
//! 4. computes one duty per channel and hands it to the actuator when it
//!    changed, or on every tick while in override.
//!
//! Steps 2-4 are synchronous and take `now` explicitly, so the state machine
//! is tested without sleeping or spawning processes.

use crate::actuator::FanActuator;
use crate::channel::ChannelMap;
use crate::curve::FanCurve;
use crate::error::{ActuationError, ReadError};
use crate::pid::{self, PidGains, PidState};
use crate::sensor::{self, SensorSource, SensorSpec};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

// ---------------------------------------------------------------------------
// Static description
// ---------------------------------------------------------------------------

/// How a zone turns temperature into duty.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlLaw {
    Curve(FanCurve),
    Pid(PidGains),
}

/// A validated thermal zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: String,
    pub poll_interval: Duration,
    pub safety_ceiling: f64,
    pub ceiling_hysteresis: f64,
    pub max_stale: Option<Duration>,
    pub law: ControlLaw,
    pub sensors: Vec<SensorSpec>,
}

/// Everything the loop needs to know about the machine. Built once from
/// configuration and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Chassis {
    pub zones: Vec<Zone>,
    pub channels: ChannelMap,
    pub min_duty_floor: u8,
    pub recovery_ticks: u32,
}

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Duties follow curves and PID loops.
    Normal,
    /// Fail-safe: every channel at 100%.
    Override,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => f.write_str("normal"),
            Mode::Override => f.write_str("override"),
        }
    }
}

/// Reason the loop is (or would be) in override.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    NoReading { zone: String },
    OverCeiling { zone: String, temp_c: f64, ceiling: f64 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::NoReading { zone } => write!(f, "{zone}: no valid reading"),
            Fault::OverCeiling {
                zone,
                temp_c,
                ceiling,
            } => write!(f, "{zone}: {temp_c:.1}C over safety ceiling {ceiling:.1}C"),
        }
    }
}

/// Outcome of polling one zone this tick.
#[derive(Debug)]
pub enum Observation {
    /// Interval has not elapsed; nothing was read.
    NotDue,
    Fresh(f64),
    Failed(ReadError),
}

/// Per-zone memory.
#[derive(Debug, Clone, Default)]
pub struct ZoneState {
    /// Most recent successful reading.
    pub last_good: Option<f64>,
    /// When `last_good` was taken. Drives the poll cadence.
    pub last_read: Option<Instant>,
    /// Latched while the zone sits above its ceiling.
    pub over_ceiling: bool,
    pub pid: PidState,
    /// Duty computed for this zone on the latest normal tick.
    pub duty: Option<u8>,
}

impl ZoneState {
    fn valid_reading(&self, zone: &Zone, now: Instant) -> Option<f64> {
        let temp = self.last_good?;
        match (zone.max_stale, self.last_read) {
            (Some(limit), Some(at)) if now.saturating_duration_since(at) > limit => None,
            _ => Some(temp),
        }
    }

    fn is_due(&self, zone: &Zone, now: Instant) -> bool {
        match self.last_read {
            Some(at) => now.saturating_duration_since(at) >= zone.poll_interval,
            None => true,
        }
    }
}

/// What a tick decided, before actuation.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub mode: Mode,
    /// Previous mode, when this tick changed it.
    pub transition: Option<Mode>,
    /// One duty per channel.
    pub duties: Vec<u8>,
    pub faults: Vec<Fault>,
    /// Temperature each zone was judged on.
    pub zone_temps: Vec<Option<f64>>,
}

/// All mutable controller state. Owned by the loop, lives for the process.
#[derive(Debug, Clone)]
pub struct ControllerState {
    zones: Vec<ZoneState>,
    mode: Mode,
    healthy_ticks: u32,
    last_commanded: Option<Vec<u8>>,
}

impl ControllerState {
    pub fn new(chassis: &Chassis) -> Self {
        Self {
            zones: vec![ZoneState::default(); chassis.zones.len()],
            mode: Mode::Normal,
            healthy_ticks: 0,
            last_commanded: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn zone(&self, index: usize) -> Option<&ZoneState> {
        self.zones.get(index)
    }

    /// Vector the hardware last accepted.
    pub fn last_commanded(&self) -> Option<&[u8]> {
        self.last_commanded.as_deref()
    }

    /// Indices of zones whose poll interval has elapsed. A zone that has
    /// never been read successfully is always due.
    pub fn due_zones(&self, chassis: &Chassis, now: Instant) -> Vec<usize> {
        chassis
            .zones
            .iter()
            .zip(&self.zones)
            .enumerate()
            .filter(|(_, (zone, st))| st.is_due(zone, now))
            .map(|(i, _)| i)
            .collect()
    }

    /// Fold one tick's observations into the state and decide the duty vector.
    ///
    /// `observations` holds one entry per zone, in chassis order.
    pub fn evaluate(
        &mut self,
        chassis: &Chassis,
        observations: Vec<Observation>,
        now: Instant,
    ) -> Decision {
        let mut faults = Vec::new();
        let mut zone_temps = Vec::with_capacity(chassis.zones.len());
        let mut sampled = vec![false; chassis.zones.len()];

        let mut observations = observations.into_iter();
        for (i, (zone, st)) in chassis.zones.iter().zip(&mut self.zones).enumerate() {
            match observations.next().unwrap_or(Observation::NotDue) {
                Observation::NotDue => {}
                Observation::Fresh(t) => {
                    log::debug!("{}: {t:.1}C", zone.id);
                    st.last_good = Some(t);
                    st.last_read = Some(now);
                    sampled[i] = true;
                }
                Observation::Failed(e) => match st.last_good {
                    Some(t) => log::warn!("{}: {e}; holding last reading {t:.1}C", zone.id),
                    None => log::warn!("{}: {e}; no previous reading", zone.id),
                },
            }

            let temp = st.valid_reading(zone, now);
            match temp {
                None => faults.push(Fault::NoReading {
                    zone: zone.id.clone(),
                }),
                Some(t) => {
                    if t > zone.safety_ceiling {
                        st.over_ceiling = true;
                    } else if st.over_ceiling && t < zone.safety_ceiling - zone.ceiling_hysteresis
                    {
                        st.over_ceiling = false;
                    }
                    if st.over_ceiling {
                        faults.push(Fault::OverCeiling {
                            zone: zone.id.clone(),
                            temp_c: t,
                            ceiling: zone.safety_ceiling,
                        });
                    }
                }
            }
            zone_temps.push(temp);
        }

        let previous = self.mode;
        self.advance_mode(chassis, faults.is_empty());

        let duties = match self.mode {
            Mode::Override => chassis.channels.uniform(100),
            Mode::Normal => {
                let zone_duties = self.zone_duties(chassis, &zone_temps, &sampled, now);
                chassis.channels.duty_vector(&zone_duties)
            }
        };

        Decision {
            mode: self.mode,
            transition: (previous != self.mode).then_some(previous),
            duties,
            faults,
            zone_temps,
        }
    }

    /// Whether `duties` should be sent to the hardware.
    pub fn should_command(&self, duties: &[u8]) -> bool {
        self.mode == Mode::Override || self.last_commanded.as_deref() != Some(duties)
    }

    /// Remember a vector the hardware accepted.
    pub fn record_commanded(&mut self, duties: Vec<u8>) {
        self.last_commanded = Some(duties);
    }

    fn advance_mode(&mut self, chassis: &Chassis, healthy: bool) {
        match (self.mode, healthy) {
            (Mode::Normal, false) => {
                self.mode = Mode::Override;
                self.healthy_ticks = 0;
                for st in &mut self.zones {
                    st.pid = PidState::default();
                    st.duty = None;
                }
            }
            (Mode::Override, false) => self.healthy_ticks = 0,
            (Mode::Override, true) => {
                self.healthy_ticks += 1;
                if self.healthy_ticks >= chassis.recovery_ticks {
                    self.mode = Mode::Normal;
                    self.healthy_ticks = 0;
                }
            }
            (Mode::Normal, true) => {}
        }
    }

    fn zone_duties(
        &mut self,
        chassis: &Chassis,
        temps: &[Option<f64>],
        sampled: &[bool],
        now: Instant,
    ) -> Vec<Option<u8>> {
        let floor = chassis.min_duty_floor;
        chassis
            .zones
            .iter()
            .zip(&mut self.zones)
            .enumerate()
            .map(|(i, (zone, st))| {
                let temp = temps[i]?;
                let duty = match &zone.law {
                    ControlLaw::Curve(curve) => curve.interpolate(temp).clamp(floor.min(100), 100),
                    ControlLaw::Pid(gains) => match st.duty {
                        Some(duty) if !sampled[i] => duty,
                        _ => {
                            let step = gains.update(&st.pid, temp, now, floor);
                            st.pid = step.state;
                            pid::correction_to_duty(step.correction, floor)
                        }
                    },
                };
                st.duty = Some(duty);
                Some(duty)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Loop driver
// ---------------------------------------------------------------------------

/// What happened to the duty vector this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actuation {
    /// Unchanged from the last accepted vector.
    Skipped,
    Applied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub decision: Decision,
    pub actuation: Actuation,
    /// Zones read this tick.
    pub polled: Vec<usize>,
}

/// Owns the controller state and the two external collaborators.
pub struct ControlLoop {
    chassis: Chassis,
    state: ControllerState,
    source: Arc<dyn SensorSource>,
    actuator: Box<dyn FanActuator>,
}

impl ControlLoop {
    pub fn new(
        chassis: Chassis,
        source: Arc<dyn SensorSource>,
        actuator: Box<dyn FanActuator>,
    ) -> Self {
        let state = ControllerState::new(&chassis);
        Self {
            chassis,
            state,
            source,
            actuator,
        }
    }

    pub fn chassis(&self) -> &Chassis {
        &self.chassis
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Run one full read-compute-actuate cycle as of `now`.
    pub async fn tick(&mut self, now: Instant) -> TickReport {
        let polled = self.state.due_zones(&self.chassis, now);
        let observations = self.poll(&polled).await;
        let decision = self.state.evaluate(&self.chassis, observations, now);

        match decision.transition {
            Some(Mode::Normal) => {
                let reasons: Vec<String> = decision.faults.iter().map(|f| f.to_string()).collect();
                log::warn!("Fail-safe override, all fans 100%: {}", reasons.join("; "));
            }
            Some(Mode::Override) => {
                log::info!("All zones healthy, leaving fail-safe override");
            }
            None => {}
        }

        let actuation = self.actuate(&decision).await;
        TickReport {
            decision,
            actuation,
            polled,
        }
    }

    /// Command every channel to `duty`. Used on shutdown.
    pub async fn shutdown(&mut self, duty: u8) -> Result<(), ActuationError> {
        let duties = self.chassis.channels.uniform(duty);
        self.actuator.apply(&duties).await?;
        log::info!("Fans set to {}% for shutdown", duty.min(100));
        self.state.record_commanded(duties);
        Ok(())
    }

    async fn poll(&self, due: &[usize]) -> Vec<Observation> {
        let mut observations: Vec<Observation> = self
            .chassis
            .zones
            .iter()
            .map(|_| Observation::NotDue)
            .collect();

        let mut reads = JoinSet::new();
        for &i in due {
            let zone = &self.chassis.zones[i];
            observations[i] = Observation::Failed(ReadError::TaskFailed(format!(
                "{}: read task did not complete",
                zone.id
            )));
            let source = Arc::clone(&self.source);
            let id = zone.id.clone();
            let sensors = zone.sensors.clone();
            reads.spawn(async move { (i, sensor::read_zone(source.as_ref(), &id, &sensors).await) });
        }

        while let Some(joined) = reads.join_next().await {
            match joined {
                Ok((i, Ok(t))) => observations[i] = Observation::Fresh(t),
                Ok((i, Err(e))) => observations[i] = Observation::Failed(e),
                Err(e) => log::error!("Zone read task failed: {e}"),
            }
        }
        observations
    }

    async fn actuate(&mut self, decision: &Decision) -> Actuation {
        if !self.state.should_command(&decision.duties) {
            return Actuation::Skipped;
        }

        match self.actuator.apply(&decision.duties).await {
            Ok(()) => {
                let changed = self.state.last_commanded() != Some(decision.duties.as_slice());
                if changed {
                    log::info!(
                        "[{}] {} ({})",
                        decision.mode,
                        self.chassis.channels.describe(&decision.duties),
                        self.describe_temps(&decision.zone_temps)
                    );
                }
                self.state.record_commanded(decision.duties.clone());
                Actuation::Applied
            }
            Err(e) => {
                log::warn!("Fan command failed, hardware keeps previous setting: {e}");
                Actuation::Failed(e.to_string())
            }
        }
    }

    fn describe_temps(&self, temps: &[Option<f64>]) -> String {
        self.chassis
            .zones
            .iter()
            .zip(temps)
            .map(|(z, t)| match t {
                Some(t) => format!("{} {t:.1}C", z.id),
                None => format!("{} --", z.id),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
