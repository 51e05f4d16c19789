// Movella FC - Range Saturation
//
// Out-of-range values are pinned to the range limit, never rejected.

use crate::config::*;
use crate::events::{SensorReading, Vec3};

/// Physical limits applied to a reading before it leaves the cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationLimits {
    /// Symmetric limit for each acceleration axis (m/s^2).
    pub acceleration: f32,
    /// Symmetric limit for each angular-rate axis (rad/s).
    pub angular_rate: f32,
    /// Symmetric limit for each magnetic-field axis.
    pub magnetic_field: f32,
    pub pressure_min: f32,
    pub pressure_max: f32,
}

impl SaturationLimits {
    pub const DEFAULT: Self = Self {
        acceleration: ACC_RANGE,
        angular_rate: GYRO_RANGE,
        magnetic_field: MAG_RANGE,
        pressure_min: BARO_MIN,
        pressure_max: BARO_MAX,
    };

    /// Return a copy of `reading` with every bounded channel clamped.
    /// Temperature and the liveness flag pass through untouched.
    pub fn apply(&self, reading: &SensorReading) -> SensorReading {
        SensorReading {
            acceleration: saturate_vec(reading.acceleration, self.acceleration),
            angular_rate: saturate_vec(reading.angular_rate, self.angular_rate),
            magnetic_field: saturate_vec(reading.magnetic_field, self.magnetic_field),
            pressure: clamp_range(reading.pressure, self.pressure_min, self.pressure_max),
            ..*reading
        }
    }
}

impl Default for SaturationLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pin `value` to `+-limit`, keeping its sign.
pub fn saturate(value: f32, limit: f32) -> f32 {
    if value.abs() > limit {
        limit.copysign(value)
    } else {
        value
    }
}

pub fn saturate_vec(v: Vec3, limit: f32) -> Vec3 {
    v.map(|axis| saturate(axis, limit))
}

pub fn clamp_range(value: f32, min: f32, max: f32) -> f32 {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}
