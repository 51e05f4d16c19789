// Movella FC - Hardware & System Configuration
// Target: ESP32 flight computer with a Movella MTi-630 on a dedicated UART.

use std::time::Duration;

// ---------------------------------------------------------------------------
// UART link to the MTi (UART1: GPIO17 TX -> MTi RX, GPIO16 RX <- MTi TX)
// ---------------------------------------------------------------------------
pub const MOVELLA_BAUD_RATE: u32 = 921_600;

/// Receive buffer capacity. A cycle that fills it completely is treated as
/// malformed (the read was truncated).
pub const UART_MAX_LEN: usize = 256;

/// Outputs arrive every 5 ms; allow some leeway before declaring a cycle lost.
pub const UART_RX_TIMEOUT: Duration = Duration::from_millis(10);
pub const UART_TX_TIMEOUT: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes) & Priorities
// ---------------------------------------------------------------------------
pub const STACK_MOVELLA: usize = 4096;
pub const STACK_ESTIMATOR: usize = 4096;

pub const PRIORITY_MOVELLA: u8 = 20;
pub const PRIORITY_ESTIMATOR: u8 = 10;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
/// Hold-off after power-up before the MTi is talked to. Starting the UART
/// reader too early froze the processor on power cycle.
pub const BOOT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Pause after each configuration request so the MTi can switch states.
pub const CONFIG_STEP_DELAY: Duration = Duration::from_millis(100);

pub const ESTIMATOR_PERIOD: Duration = Duration::from_millis(10);
pub const ESTIMATOR_READ_TIMEOUT: Duration = Duration::from_millis(5);
pub const ESTIMATOR_LOG_EVERY: u32 = 100; // ~1 Hz summary

// ---------------------------------------------------------------------------
// Sensor ranges
//
// These depend on the range registers of the MTi. They are fixed here and
// must be kept in step with the device configuration.
// ---------------------------------------------------------------------------
pub const STANDARD_GRAVITY: f32 = 9.81;
pub const DEG_PER_RAD: f32 = 180.0 / core::f32::consts::PI;
pub const RAD_PER_DEG: f32 = core::f32::consts::PI / 180.0;

pub const ACC_RANGE: f32 = 10.0 * STANDARD_GRAVITY; // m/s^2
pub const GYRO_RANGE: f32 = 2000.0 * RAD_PER_DEG; // rad/s
pub const MAG_RANGE: f32 = 1.0; // normalized, should never exceed 1

// Wider than the MTi-630 barometer range: readings past the datasheet range
// pass through instead of being pinned.
pub const BARO_MAX: f32 = 110_000.0; // Pa, conservative sea-level max
pub const BARO_MIN: f32 = 6_000.0; // Pa, ~60 000 ft apogee

// ---------------------------------------------------------------------------
// MTi output configuration (only used when `configure` is requested; units
// are normally configured once with the vendor tool)
// ---------------------------------------------------------------------------
pub const OUTPUT_CONFIG: [OutputConfig; 7] = [
    OutputConfig::new(crate::xbus::XDI_QUATERNION, 200), // 5 ms
    OutputConfig::new(crate::xbus::XDI_ACCELERATION, 200), // 5 ms
    OutputConfig::new(crate::xbus::XDI_RATE_OF_TURN, 200), // 5 ms
    OutputConfig::new(crate::xbus::XDI_MAGNETIC_FIELD, 100), // 10 ms
    OutputConfig::new(crate::xbus::XDI_TEMPERATURE, 5), // 200 ms
    OutputConfig::new(crate::xbus::XDI_BARO_PRESSURE, 40), // 25 ms
    OutputConfig::new(crate::xbus::XDI_STATUS_WORD, 0xFFFF), // every frame
];

/// One entry of the MTi `SetOutputConfiguration` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub data_id: u16,
    pub frequency: u16,
}

impl OutputConfig {
    pub const fn new(data_id: u16, frequency: u16) -> Self {
        Self { data_id, frequency }
    }
}
