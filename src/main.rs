// Movella FC - Firmware Entry Point
//
// Boot sequence:
//   1. Initialise logging and the sensor cache.
//   2. Bring up UART1 to the Movella MTi.
//   3. Hold off for the MTi to settle after power-up.
//   4. Optionally push the output configuration (`configure-outputs` feature).
//   5. Spawn the Movella read task and the estimator feed task.

#[cfg(target_os = "espidf")]
mod drivers;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::gpio::AnyIOPin;
    use esp_idf_hal::prelude::*;
    use esp_idf_hal::task::thread::ThreadSpawnConfiguration;
    use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};

    use movella_fc::config::*;
    use movella_fc::tasks;
    use movella_fc::xbus::XbusDecoder;
    use movella_fc::{ReadTask, SensorCache};

    use crate::drivers::uart::UartTransport;

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Movella FC firmware starting...");

    // ---- Shared state -----------------------------------------------------
    // One cache for the whole process, handed to every task that needs it.
    let cache = Arc::new(SensorCache::new());
    cache.initialize()?;

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    let uart_config = UartConfig::new().baudrate(MOVELLA_BAUD_RATE.Hz());
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17, // TX -> MTi RX
        peripherals.pins.gpio16, // RX <- MTi TX
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;

    // The MTi must not be read before it is ready; doing so froze the
    // processor on power cycle.
    thread::sleep(BOOT_SETTLE_DELAY);

    let mut read_task = ReadTask::new(
        Arc::clone(&cache),
        UartTransport::new(uart),
        XbusDecoder::new(),
    );

    if cfg!(feature = "configure-outputs") {
        if let Err(e) = read_task.configure(&OUTPUT_CONFIG) {
            // Keep going with whatever the unit is already set up for.
            log::error!("Movella configuration failed: {:#}", e);
        }
    }

    // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) ---------------

    // Movella read task - highest priority, it is the only source of freshness.
    ThreadSpawnConfiguration {
        name: Some(b"movella\0"),
        stack_size: STACK_MOVELLA,
        priority: PRIORITY_MOVELLA,
        ..Default::default()
    }
    .set()?;
    thread::Builder::new()
        .name("movella".into())
        .stack_size(STACK_MOVELLA)
        .spawn(move || read_task.run())?;

    // Estimator feed task
    ThreadSpawnConfiguration {
        name: Some(b"estimator\0"),
        stack_size: STACK_ESTIMATOR,
        priority: PRIORITY_ESTIMATOR,
        ..Default::default()
    }
    .set()?;
    let estimator_cache = Arc::clone(&cache);
    thread::Builder::new()
        .name("estimator".into())
        .stack_size(STACK_ESTIMATOR)
        .spawn(move || tasks::estimator::estimator_task(estimator_cache))?;

    ThreadSpawnConfiguration::default().set()?;
    log::info!("Boot complete - entering normal operation");

    // Main thread has nothing left to do - park it forever.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("movella-fc only runs on the ESP-IDF target; host builds are for tests")
}
