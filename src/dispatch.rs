// Movella FC - Event Dispatcher
//
// Writes decoded events into the sensor cache. Runs on the read task's stack
// from inside the decoder, so it only ever makes a zero-wait attempt on the
// cache lock; a busy lock drops the event and the next one will land.

use crate::cache::SensorCache;
use crate::config::DEG_PER_RAD;
use crate::events::{Channel, EventSink, Payload, SensorEvent, SensorReading, Vec3};

/// A validated, single-channel write into the cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Update {
    Acceleration(Vec3),
    AngularRate(Vec3),
    MagneticField(Vec3),
    Orientation(Vec3),
    Pressure(f32),
    Temperature(f32),
}

impl Update {
    /// Returns `None` for unknown channels and for payloads whose shape does
    /// not match the channel.
    pub fn from_event(event: SensorEvent) -> Option<Self> {
        let update = match (event.channel, event.payload) {
            (Channel::Acceleration, Payload::F32x3(v)) => Self::Acceleration(v.into()),
            (Channel::RateOfTurn, Payload::F32x3(v)) => Self::AngularRate(v.into()),
            (Channel::MagneticField, Payload::F32x3(v)) => Self::MagneticField(v.into()),
            (Channel::Quaternion, Payload::F32x4(q)) => {
                let euler = quaternion_to_euler_rad(q);
                Self::Orientation(Vec3::from(euler).map(|rad| rad * DEG_PER_RAD))
            }
            (Channel::Pressure, Payload::U32(pa)) => Self::Pressure(pa as f32),
            (Channel::Temperature, Payload::F32(t)) => Self::Temperature(t),
            _ => return None,
        };
        Some(update)
    }

    pub fn apply(self, reading: &mut SensorReading) {
        match self {
            Self::Acceleration(v) => reading.acceleration = v,
            Self::AngularRate(v) => reading.angular_rate = v,
            Self::MagneticField(v) => reading.magnetic_field = v,
            Self::Orientation(v) => reading.orientation = v,
            Self::Pressure(pa) => reading.pressure = pa,
            Self::Temperature(t) => reading.temperature = t,
        }
    }
}

/// Euler angles (roll, pitch, yaw) in radians.
///
/// Always zero for now: the conversion routine has not been specified for
/// this airframe.
// TODO: replace with the shared attitude-math conversion once its axis
// convention is agreed with the estimator.
fn quaternion_to_euler_rad(_q: [f32; 4]) -> [f32; 3] {
    [0.0; 3]
}

impl EventSink for SensorCache {
    fn on_event(&self, event: SensorEvent) {
        let Some(update) = Update::from_event(event) else {
            return;
        };
        self.try_update(|reading| update.apply(reading));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_millis(5);

    fn cache() -> SensorCache {
        let cache = SensorCache::new();
        cache.initialize().unwrap();
        cache
    }

    #[test]
    fn vector_channels_are_stored_verbatim() {
        let cache = cache();
        cache.on_event(SensorEvent::new(Channel::Acceleration, Payload::F32x3([0.1, -9.8, 0.3])));
        cache.on_event(SensorEvent::new(Channel::RateOfTurn, Payload::F32x3([1.0, 2.0, 3.0])));
        cache.on_event(SensorEvent::new(Channel::MagneticField, Payload::F32x3([0.2, 0.0, -0.4])));

        let raw = cache.snapshot(TIMEOUT).unwrap();
        assert_eq!(raw.acceleration, Vec3::new(0.1, -9.8, 0.3));
        assert_eq!(raw.angular_rate, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(raw.magnetic_field, Vec3::new(0.2, 0.0, -0.4));
    }

    #[test]
    fn scalar_channels_are_converted() {
        let cache = cache();
        cache.on_event(SensorEvent::new(Channel::Pressure, Payload::U32(101_325)));
        cache.on_event(SensorEvent::new(Channel::Temperature, Payload::F32(23.5)));

        let raw = cache.snapshot(TIMEOUT).unwrap();
        assert_eq!(raw.pressure, 101_325.0);
        assert_eq!(raw.temperature, 23.5);
    }

    #[test]
    fn mismatched_payloads_are_discarded() {
        let cache = cache();
        cache.on_event(SensorEvent::new(Channel::Acceleration, Payload::F32(1.0)));
        cache.on_event(SensorEvent::new(Channel::Pressure, Payload::F32(90_000.0)));
        cache.on_event(SensorEvent::new(Channel::Temperature, Payload::U32(20)));
        cache.on_event(SensorEvent::new(Channel::Quaternion, Payload::F32x3([1.0, 0.0, 0.0])));

        assert_eq!(cache.snapshot(TIMEOUT).unwrap(), SensorReading::default());
    }

    #[test]
    fn unknown_channels_are_ignored() {
        let cache = cache();
        cache.on_event(SensorEvent::new(Channel::Other(0xE020), Payload::U32(7)));
        assert_eq!(cache.snapshot(TIMEOUT).unwrap(), SensorReading::default());
    }

    #[test]
    fn quaternion_yields_zero_orientation() {
        let cache = cache();
        cache.try_update(|r| r.orientation = Vec3::new(1.0, 2.0, 3.0));
        cache.on_event(SensorEvent::new(
            Channel::Quaternion,
            Payload::F32x4([0.7071, 0.0, 0.7071, 0.0]),
        ));

        assert_eq!(cache.snapshot(TIMEOUT).unwrap().orientation, Vec3::ZERO);
    }

    #[test]
    fn later_events_overwrite_only_their_channel() {
        let cache = cache();
        cache.on_event(SensorEvent::new(Channel::Acceleration, Payload::F32x3([1.0, 1.0, 1.0])));
        cache.on_event(SensorEvent::new(Channel::Temperature, Payload::F32(30.0)));
        cache.on_event(SensorEvent::new(Channel::Acceleration, Payload::F32x3([2.0, 2.0, 2.0])));

        let raw = cache.snapshot(TIMEOUT).unwrap();
        assert_eq!(raw.acceleration, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(raw.temperature, 30.0);
    }
}
