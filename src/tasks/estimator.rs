// Movella FC - Estimator Feed Task
//
// Stand-in consumer for the state estimator: pulls a saturated snapshot from
// the sensor cache every period and logs a summary about once a second.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cache::SensorCache;
use crate::config::*;
use crate::error::Error;
use crate::events::SensorReading;

/// Running totals for the consumer side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub readings: u32,
    pub dead_readings: u32,
    pub timeouts: u32,
    pub other_failures: u32,
}

impl FeedStats {
    /// Take one reading and account for the outcome.
    pub fn poll(&mut self, cache: &SensorCache, timeout: Duration) -> Option<SensorReading> {
        match cache.get_reading(timeout) {
            Ok(reading) => {
                self.readings += 1;
                if reading.is_dead {
                    self.dead_readings += 1;
                }
                Some(reading)
            }
            Err(Error::Timeout) => {
                self.timeouts += 1;
                None
            }
            Err(e) => {
                self.other_failures += 1;
                log::warn!("Sensor read failed: {}", e);
                None
            }
        }
    }
}

pub fn estimator_task(cache: Arc<SensorCache>) {
    log::info!("Estimator feed task started");

    let mut stats = FeedStats::default();
    let mut last: Option<SensorReading> = None;
    let mut tick: u32 = 0;

    loop {
        let tick_start = Instant::now();

        if let Some(reading) = stats.poll(&cache, ESTIMATOR_READ_TIMEOUT) {
            last = Some(reading);
        }

        tick = tick.wrapping_add(1);
        if tick % ESTIMATOR_LOG_EVERY == 0 {
            match last {
                Some(r) => log::info!(
                    "acc=({:.2},{:.2},{:.2}) gyr=({:.3},{:.3},{:.3}) p={:.0}Pa t={:.1}C dead={} [ok={} timeouts={}]",
                    r.acceleration.x,
                    r.acceleration.y,
                    r.acceleration.z,
                    r.angular_rate.x,
                    r.angular_rate.y,
                    r.angular_rate.z,
                    r.pressure,
                    r.temperature,
                    r.is_dead,
                    stats.readings,
                    stats.timeouts,
                ),
                None => log::warn!("No Movella reading yet ({:?})", stats),
            }
        }

        // Sleep for the remainder of the period.
        let elapsed = tick_start.elapsed();
        if elapsed < ESTIMATOR_PERIOD {
            thread::sleep(ESTIMATOR_PERIOD - elapsed);
        }
    }
}
