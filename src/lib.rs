// Movella FC - Sensor Acquisition Core
//
// Ingests the Movella MTi telemetry stream over UART, decodes it into
// physical-unit readings, and serves the latest reading to concurrent
// consumers with bounded waits:
//
//   UART -> xbus decoder -> dispatcher -> SensorCache <- get_reading <- consumers
//
// The read task also drives the cache's liveness flag from receive outcomes.

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod saturation;
pub mod tasks;
pub mod transport;
pub mod xbus;

pub use cache::SensorCache;
pub use error::{Error, Result};
pub use events::{Channel, Decoder, EventSink, Payload, SensorEvent, SensorReading, Vec3};
pub use saturation::SaturationLimits;
pub use tasks::sensor::{CycleOutcome, ReadTask};
pub use transport::Transport;
