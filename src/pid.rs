// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! PID feedback control for a thermal zone.
//!
//! Sign convention: `error = setpoint - measurement` and
//! `correction = kp*error + ki*integral + kd*derivative`. A zone running
//! hotter than its setpoint therefore produces a negative correction, and the
//! commanded duty is the negated correction clamped to `[floor, 100]`. Hotter
//! always means more fan.
//!
//! [`PidGains::update`] is a pure function: it takes the previous
//! [`PidState`] and returns the next one alongside the correction.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Tuning for one PID zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Target temperature in degrees Celsius
    pub setpoint: f64,
    /// Hard bound on the magnitude of the accumulated integral term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
}

/// Accumulated controller memory between updates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    pub integral: f64,
    pub prev_error: Option<f64>,
    pub prev_time: Option<Instant>,
}

/// Result of a single PID update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidStep {
    pub state: PidState,
    pub correction: f64,
}

impl PidGains {
    pub fn validate(&self) -> Result<(), String> {
        let all = [self.kp, self.ki, self.kd, self.setpoint];
        if all.iter().any(|v| !v.is_finite()) {
            return Err("gains and setpoint must be finite".to_string());
        }
        if self.kp < 0.0 || self.ki < 0.0 || self.kd < 0.0 {
            return Err("gains must not be negative".to_string());
        }
        if let Some(limit) = self.integral_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err("integral_limit must be positive".to_string());
            }
        }
        Ok(())
    }

    /// Compute the next correction for `measurement` taken at `now`.
    ///
    /// The first update after a reset has no elapsed time: it contributes
    /// neither integral nor derivative. Integration is frozen while the
    /// resulting duty sits at a bound and the error pushes further into it.
    pub fn update(&self, state: &PidState, measurement: f64, now: Instant, floor: u8) -> PidStep {
        let error = self.setpoint - measurement;
        let dt = state
            .prev_time
            .map(|t| now.saturating_duration_since(t).as_secs_f64())
            .unwrap_or(0.0);

        let derivative = match state.prev_error {
            Some(prev) if dt > 0.0 => (error - prev) / dt,
            _ => 0.0,
        };

        let mut integral = state.integral + error * dt;
        if let Some(limit) = self.integral_limit {
            integral = integral.clamp(-limit, limit);
        }

        let mut correction = self.output(error, integral, derivative);
        let raw_duty = -correction;
        let saturated_high = raw_duty > 100.0 && error < 0.0;
        let saturated_low = raw_duty < floor as f64 && error > 0.0;
        if saturated_high || saturated_low {
            integral = state.integral;
            correction = self.output(error, integral, derivative);
        }

        PidStep {
            state: PidState {
                integral,
                prev_error: Some(error),
                prev_time: Some(now),
            },
            correction,
        }
    }

    fn output(&self, error: f64, integral: f64, derivative: f64) -> f64 {
        self.kp * error + self.ki * integral + self.kd * derivative
    }
}

/// Convert a correction into a commanded duty within `[floor, 100]`.
pub fn correction_to_duty(correction: f64, floor: u8) -> u8 {
    if correction.is_nan() {
        return 100;
    }
    (-correction).round().clamp(floor.min(100) as f64, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn gains(kp: f64, ki: f64, kd: f64, setpoint: f64) -> PidGains {
        PidGains {
            kp,
            ki,
            kd,
            setpoint,
            integral_limit: None,
        }
    }

    #[test]
    fn proportional_only_is_time_independent() {
        let pid = gains(4.0, 0.0, 0.0, 55.0);
        let step = pid.update(&PidState::default(), 59.0, Instant::now(), 10);
        assert_eq!(step.correction, -16.0);
        assert_eq!(correction_to_duty(step.correction, 10), 16);
    }

    #[test]
    fn first_update_has_no_derivative_or_integral() {
        let pid = gains(1.0, 5.0, 100.0, 50.0);
        let step = pid.update(&PidState::default(), 60.0, Instant::now(), 0);
        assert_eq!(step.correction, -10.0);
        assert_eq!(step.state.integral, 0.0);
        assert_eq!(step.state.prev_error, Some(-10.0));
    }

    #[test]
    fn integral_and_derivative_use_elapsed_seconds() {
        let pid = gains(1.0, 0.5, 2.0, 50.0);
        let t0 = Instant::now();
        let first = pid.update(&PidState::default(), 52.0, t0, 0);
        let second = pid.update(&first.state, 54.0, t0 + Duration::from_secs(2), 0);

        // error -4, integral -4*2 = -8, derivative (-4 - -2)/2 = -1
        assert_eq!(second.state.integral, -8.0);
        assert_eq!(second.correction, -4.0 + 0.5 * -8.0 + 2.0 * -1.0);
    }

    #[test]
    fn hotter_means_more_cooling() {
        let pid = gains(4.0, 0.0, 0.0, 55.0);
        let now = Instant::now();
        let mut prev = 0;
        for temp in 50..90 {
            let step = pid.update(&PidState::default(), temp as f64, now, 10);
            let duty = correction_to_duty(step.correction, 10);
            assert!(duty >= prev);
            prev = duty;
        }
        assert_eq!(prev, 100);
    }

    #[test]
    fn integral_freezes_while_saturated_high() {
        let pid = gains(10.0, 1.0, 0.0, 40.0);
        let t0 = Instant::now();
        let mut state = pid.update(&PidState::default(), 80.0, t0, 10).state;
        for i in 1..=10 {
            state = pid
                .update(&state, 80.0, t0 + Duration::from_secs(i), 10)
                .state;
        }
        assert_eq!(state.integral, 0.0);
    }

    #[test]
    fn integral_freezes_while_saturated_at_floor() {
        let pid = gains(1.0, 1.0, 0.0, 50.0);
        let t0 = Instant::now();
        let mut state = pid.update(&PidState::default(), 30.0, t0, 20).state;
        for i in 1..=5 {
            state = pid
                .update(&state, 30.0, t0 + Duration::from_secs(i), 20)
                .state;
        }
        assert_eq!(state.integral, 0.0);
    }

    #[test]
    fn integral_limit_bounds_accumulation() {
        let mut pid = gains(0.1, 0.1, 0.0, 50.0);
        pid.integral_limit = Some(20.0);
        let t0 = Instant::now();
        let mut state = pid.update(&PidState::default(), 55.0, t0, 0).state;
        for i in 1..=100 {
            state = pid
                .update(&state, 55.0, t0 + Duration::from_secs(i), 0)
                .state;
        }
        assert_eq!(state.integral, -20.0);
    }

    #[test]
    fn duty_clamps_to_floor_and_full() {
        assert_eq!(correction_to_duty(5.0, 10), 10);
        assert_eq!(correction_to_duty(-250.0, 10), 100);
        assert_eq!(correction_to_duty(-42.4, 10), 42);
        assert_eq!(correction_to_duty(f64::NAN, 10), 100);
    }

    #[test]
    fn negative_gains_are_rejected() {
        assert!(gains(-1.0, 0.0, 0.0, 50.0).validate().is_err());
        assert!(gains(1.0, 0.0, 0.0, f64::INFINITY).validate().is_err());
        assert!(gains(1.0, 0.5, 0.1, 50.0).validate().is_ok());
    }
}
