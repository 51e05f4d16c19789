// Movella FC - Shared Sensor Cache
//
// One writer (the Movella read task, through the dispatcher) and any number
// of readers. The record itself sits behind a mutex; the liveness flag lives
// beside it as a relaxed atomic so the receive loop never touches the lock
// just to report link state.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::events::SensorReading;
use crate::saturation::SaturationLimits;

pub struct SensorCache {
    /// Allocated by `initialize()`. Raw values as last written; saturation is
    /// only ever applied to copies.
    data: OnceLock<Mutex<SensorReading>>,
    /// Written by the read task without the lock. A reader may see it a cycle
    /// late.
    is_dead: AtomicBool,
    /// Events discarded because the lock was busy.
    dropped_updates: AtomicU32,
    limits: SaturationLimits,
}

impl SensorCache {
    pub const fn new() -> Self {
        Self::with_limits(SaturationLimits::DEFAULT)
    }

    pub const fn with_limits(limits: SaturationLimits) -> Self {
        Self {
            data: OnceLock::new(),
            is_dead: AtomicBool::new(false),
            dropped_updates: AtomicU32::new(0),
            limits,
        }
    }

    /// Allocate the cache lock with every channel zeroed. Calling it again
    /// once initialized is a no-op.
    ///
    /// Lock construction cannot fail here, so `Error::LockAllocationFailure`
    /// is never returned by this implementation.
    pub fn initialize(&self) -> Result<()> {
        if self.data.get().is_some() {
            return Ok(());
        }
        self.data.get_or_init(|| {
            log::info!("Movella sensor cache initialised");
            Mutex::new(SensorReading::default())
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.data.get().is_some()
    }

    pub fn limits(&self) -> &SaturationLimits {
        &self.limits
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead.load(Ordering::Relaxed)
    }

    /// Store the liveness flag and return its previous value.
    pub fn set_dead(&self, dead: bool) -> bool {
        self.is_dead.swap(dead, Ordering::Relaxed)
    }

    pub fn dropped_updates(&self) -> u32 {
        self.dropped_updates.load(Ordering::Relaxed)
    }

    /// Apply `update` only if the lock is free right now. Returns `false` when
    /// the update was dropped (lock busy or cache not initialised).
    pub(crate) fn try_update(&self, update: impl FnOnce(&mut SensorReading)) -> bool {
        let Some(lock) = self.data.get() else {
            return false;
        };
        match lock.try_lock() {
            Some(mut reading) => {
                update(&mut reading);
                true
            }
            None => {
                self.dropped_updates.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Copy the raw record out under the lock, waiting at most `timeout`.
    /// Nothing is returned on timeout.
    pub fn snapshot(&self, timeout: Duration) -> Result<SensorReading> {
        let lock = self.data.get().ok_or(Error::NotInitialized)?;
        let mut reading = {
            let guard = lock.try_lock_for(timeout).ok_or(Error::Timeout)?;
            *guard
        };
        reading.is_dead = self.is_dead();
        Ok(reading)
    }

    /// Latest reading with every bounded channel saturated.
    pub fn get_reading(&self, timeout: Duration) -> Result<SensorReading> {
        let raw = self.snapshot(timeout)?;
        Ok(self.limits.apply(&raw))
    }

    /// Out-parameter form of [`get_reading`](Self::get_reading). `out` is
    /// only written on success; a missing destination is rejected before
    /// anything else is checked.
    pub fn read_into(&self, out: Option<&mut SensorReading>, timeout: Duration) -> Result<()> {
        let out = out.ok_or(Error::InvalidParameter)?;
        *out = self.get_reading(timeout)?;
        Ok(())
    }
}

impl Default for SensorCache {
    fn default() -> Self {
        Self::new()
    }
}
