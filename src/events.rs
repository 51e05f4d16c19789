// Movella FC - Sensor Events & Data Types

// ---------------------------------------------------------------------------
// Sensor reading (the cached record handed to consumers)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// Latest value of every channel reported by the MTi.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    /// m/s^2
    pub acceleration: Vec3,
    /// rad/s
    pub angular_rate: Vec3,
    /// Normalized, nominally within +-1
    pub magnetic_field: Vec3,
    /// Euler angles in degrees. Always zero until quaternion conversion
    /// lands (see `dispatch`).
    pub orientation: Vec3,
    /// Pa
    pub pressure: f32,
    /// deg C
    pub temperature: f32,
    /// The last receive cycle failed or returned a malformed length.
    pub is_dead: bool,
}

// ---------------------------------------------------------------------------
// Decoded events (decoder -> dispatcher)
// ---------------------------------------------------------------------------

/// Physical channel tag attached to each decoded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Acceleration,
    RateOfTurn,
    MagneticField,
    Quaternion,
    Pressure,
    Temperature,
    /// Any data identifier the cache does not track.
    Other(u16),
}

/// Typed payload as delivered by the decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    F32x3([f32; 3]),
    F32x4([f32; 4]),
    F32(f32),
    U32(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    pub channel: Channel,
    pub payload: Payload,
}

impl SensorEvent {
    pub const fn new(channel: Channel, payload: Payload) -> Self {
        Self { channel, payload }
    }
}

/// Receiver for decoded events. The decoder calls it zero or more times per
/// parsed buffer, on the caller's stack. Implementations must never block.
pub trait EventSink {
    fn on_event(&self, event: SensorEvent);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn on_event(&self, event: SensorEvent) {
        (**self).on_event(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn on_event(&self, event: SensorEvent) {
        (**self).on_event(event)
    }
}

// ---------------------------------------------------------------------------
// Decoder contract
// ---------------------------------------------------------------------------

/// Turns raw link bytes into [`SensorEvent`]s. Framing state may be kept
/// between calls; `parse` reports every complete sample to `sink`.
pub trait Decoder {
    fn parse(&mut self, buf: &[u8], sink: &dyn EventSink);
}
