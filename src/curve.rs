// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Fan curve definitions and interpolation.
//!
//! A curve maps temperature readings to fan duty percentages (0-100).
//! Points are linearly interpolated between defined thresholds. Above the
//! hottest point the curve always answers 100%.

use serde::{Deserialize, Serialize};

/// A single point on a fan curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CurvePoint {
    /// Temperature in degrees Celsius
    pub temp_c: f64,
    /// Duty cycle percentage (0-100)
    pub duty: u8,
}

impl CurvePoint {
    pub const fn new(temp_c: f64, duty: u8) -> Self {
        Self { temp_c, duty }
    }
}

/// A named fan curve with an ordered list of temperature-to-duty points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FanCurve {
    /// Unique name for this curve
    pub name: String,
    /// Points sorted by ascending temperature.
    /// Must have at least 2 points.
    pub points: Vec<CurvePoint>,
}

impl FanCurve {
    /// Create a new fan curve. Points are sorted by temperature automatically.
    pub fn new(name: impl Into<String>, mut points: Vec<CurvePoint>) -> Self {
        points.sort_by(|a, b| a.temp_c.total_cmp(&b.temp_c));
        Self {
            name: name.into(),
            points,
        }
    }

    /// Interpolate the duty percentage for a given temperature.
    ///
    /// - Below the lowest point: returns the lowest point's duty
    /// - Above the highest point: returns 100
    /// - Between two points: linear interpolation, rounded to the nearest percent
    pub fn interpolate(&self, temp_c: f64) -> u8 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 100;
        };
        if temp_c.is_nan() || temp_c > last.temp_c {
            return 100;
        }
        if temp_c <= first.temp_c {
            return first.duty;
        }

        for window in self.points.windows(2) {
            let lo = &window[0];
            let hi = &window[1];

            if temp_c >= lo.temp_c && temp_c <= hi.temp_c {
                let range_t = hi.temp_c - lo.temp_c;
                if range_t == 0.0 {
                    return hi.duty;
                }
                let frac = (temp_c - lo.temp_c) / range_t;
                let duty_f = lo.duty as f64 + frac * (hi.duty as f64 - lo.duty as f64);
                return duty_f.round().clamp(0.0, 100.0) as u8;
            }
        }

        last.duty
    }

    /// Validate the curve: at least 2 points, strictly increasing
    /// temperatures, duties within 0-100 and never decreasing.
    pub fn validate(&self) -> Result<(), String> {
        if self.points.len() < 2 {
            return Err("curve must have at least 2 points".to_string());
        }
        for (i, p) in self.points.iter().enumerate() {
            if !p.temp_c.is_finite() {
                return Err(format!("point {i} has a non-finite temperature"));
            }
            if p.duty > 100 {
                return Err(format!("point {i} has duty {} above 100", p.duty));
            }
            if i == 0 {
                continue;
            }
            let prev = &self.points[i - 1];
            if p.temp_c <= prev.temp_c {
                return Err(format!(
                    "points must have strictly increasing temperatures (point {i})"
                ));
            }
            if p.duty < prev.duty {
                return Err(format!(
                    "duty must not decrease as temperature rises (point {i})"
                ));
            }
        }
        Ok(())
    }

    /// Temperature of the hottest point.
    pub fn top_temp(&self) -> Option<f64> {
        self.points.last().map(|p| p.temp_c)
    }
}

/// CPU curve: 25% idle, full speed at 80C.
pub fn default_cpu_curve() -> FanCurve {
    FanCurve::new(
        "cpu",
        vec![
            CurvePoint::new(40.0, 25),
            CurvePoint::new(60.0, 50),
            CurvePoint::new(80.0, 100),
        ],
    )
}

/// Drive curve: spinning disks are happiest below 40C, so ramp early.
pub fn default_drive_curve() -> FanCurve {
    FanCurve::new(
        "drives",
        vec![
            CurvePoint::new(20.0, 15),
            CurvePoint::new(37.0, 35),
            CurvePoint::new(45.0, 50),
            CurvePoint::new(50.0, 100),
        ],
    )
}

/// GPU curve.
pub fn default_gpu_curve() -> FanCurve {
    FanCurve::new(
        "gpu",
        vec![
            CurvePoint::new(50.0, 25),
            CurvePoint::new(60.0, 50),
            CurvePoint::new(70.0, 100),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_curve() -> FanCurve {
        FanCurve::new(
            "test",
            vec![
                CurvePoint::new(40.0, 20),
                CurvePoint::new(60.0, 50),
                CurvePoint::new(80.0, 100),
            ],
        )
    }

    #[test]
    fn test_interpolation_below_range() {
        assert_eq!(reference_curve().interpolate(30.0), 20);
    }

    #[test]
    fn test_interpolation_above_range() {
        assert_eq!(reference_curve().interpolate(90.0), 100);
    }

    #[test]
    fn test_above_range_is_full_even_when_top_point_is_not() {
        let curve = FanCurve::new(
            "quiet",
            vec![CurvePoint::new(30.0, 10), CurvePoint::new(60.0, 70)],
        );
        assert_eq!(curve.interpolate(60.0), 70);
        assert_eq!(curve.interpolate(60.5), 100);
    }

    #[test]
    fn test_interpolation_midpoint() {
        assert_eq!(reference_curve().interpolate(50.0), 35);
    }

    #[test]
    fn test_interpolation_exact_point() {
        assert_eq!(reference_curve().interpolate(60.0), 50);
    }

    #[test]
    fn test_nan_fails_toward_cooling() {
        assert_eq!(reference_curve().interpolate(f64::NAN), 100);
    }

    #[test]
    fn test_interpolation_is_monotonic() {
        for curve in [
            reference_curve(),
            default_cpu_curve(),
            default_drive_curve(),
            default_gpu_curve(),
        ] {
            let mut prev = 0;
            let mut t = -10.0;
            while t <= 110.0 {
                let duty = curve.interpolate(t);
                assert!(duty >= prev, "{} not monotonic at {t}", curve.name);
                prev = duty;
                t += 0.25;
            }
        }
    }

    #[test]
    fn test_points_are_sorted_on_construction() {
        let curve = FanCurve::new(
            "unsorted",
            vec![CurvePoint::new(80.0, 100), CurvePoint::new(40.0, 20)],
        );
        assert_eq!(curve.points[0].temp_c, 40.0);
        assert!(curve.validate().is_ok());
    }

    #[test]
    fn test_validation_too_few_points() {
        let curve = FanCurve::new("bad", vec![CurvePoint::new(50.0, 50)]);
        assert!(curve.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_decreasing_duty() {
        let curve = FanCurve::new(
            "bad",
            vec![CurvePoint::new(40.0, 60), CurvePoint::new(60.0, 30)],
        );
        let err = curve.validate().unwrap_err();
        assert!(err.contains("decrease"));
    }

    #[test]
    fn test_validation_rejects_duplicate_temperatures() {
        let curve = FanCurve::new(
            "bad",
            vec![CurvePoint::new(40.0, 20), CurvePoint::new(40.0, 30)],
        );
        assert!(curve.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_duty_above_100() {
        let curve = FanCurve::new(
            "bad",
            vec![CurvePoint::new(40.0, 20), CurvePoint::new(60.0, 120)],
        );
        assert!(curve.validate().is_err());
    }
}
