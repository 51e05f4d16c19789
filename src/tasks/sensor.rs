// Movella FC - Sensor Read Task
//
// Owns the UART -> decoder -> cache pipeline and is the only thing that makes
// the cache fresh. Each cycle is one bounded receive: a usable chunk is
// decoded and marks the link alive, anything else marks it dead. There is no
// backoff; the receive timeout is the only throttle, and no cycle is fatal.

use std::sync::Arc;
use std::thread;

use anyhow::Context;

use crate::cache::SensorCache;
use crate::config::*;
use crate::events::Decoder;
use crate::transport::Transport;
use crate::xbus;

/// Result of a single receive cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// `n` bytes were handed to the decoder.
    Received(usize),
    /// Timeout, transport error, empty read, or a read that filled the buffer.
    Lost,
}

pub struct ReadTask<T, D> {
    cache: Arc<SensorCache>,
    transport: T,
    decoder: D,
    // Allocated once up front so the task stack stays small.
    rx_buffer: Box<[u8; UART_MAX_LEN]>,
    configured: bool,
}

impl<T: Transport, D: Decoder> ReadTask<T, D> {
    pub fn new(cache: Arc<SensorCache>, transport: T, decoder: D) -> Self {
        Self {
            cache,
            transport,
            decoder,
            rx_buffer: Box::new([0u8; UART_MAX_LEN]),
            configured: false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Push an output configuration to the MTi: enter config mode, set the
    /// outputs, return to measurement mode. Units are normally configured
    /// once with the vendor tool, so the firmware only does this on request.
    pub fn configure(&mut self, outputs: &[OutputConfig]) -> anyhow::Result<()> {
        log::info!("Configuring Movella outputs ({} entries)", outputs.len());

        self.send(&xbus::goto_config()).context("GoToConfig")?;
        thread::sleep(CONFIG_STEP_DELAY);

        self.send(&xbus::set_output_configuration(outputs))
            .context("SetOutputConfiguration")?;
        thread::sleep(CONFIG_STEP_DELAY);

        self.send(&xbus::goto_measurement()).context("GoToMeasurement")?;
        thread::sleep(CONFIG_STEP_DELAY);

        self.configured = true;
        log::info!("Movella configured");
        Ok(())
    }

    fn send(&mut self, msg: &[u8]) -> anyhow::Result<()> {
        self.transport.send(msg, UART_TX_TIMEOUT)
    }

    /// Run one receive cycle and update the liveness flag.
    pub fn poll_once(&mut self) -> CycleOutcome {
        let outcome = match self.transport.receive(&mut self.rx_buffer[..], UART_RX_TIMEOUT) {
            Ok(len) if len > 0 && len < UART_MAX_LEN => {
                self.decoder.parse(&self.rx_buffer[..len], &*self.cache);
                CycleOutcome::Received(len)
            }
            Ok(len) => {
                log::debug!("Movella receive returned {} bytes", len);
                CycleOutcome::Lost
            }
            Err(e) => {
                log::debug!("Movella receive failed: {}", e);
                CycleOutcome::Lost
            }
        };

        // Written without the cache lock; readers tolerate a stale flag.
        let dead = outcome == CycleOutcome::Lost;
        match (self.cache.set_dead(dead), dead) {
            (false, true) => log::warn!("Movella link lost"),
            (true, false) => log::info!("Movella link restored"),
            _ => {}
        }

        outcome
    }

    /// Receive forever. Link loss only ever shows up through the cache's
    /// liveness flag.
    pub fn run(mut self) -> ! {
        log::info!("Movella task started");
        loop {
            self.poll_once();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    use crate::events::{EventSink, SensorEvent};

    /// Each queued entry is the outcome of one `receive` call.
    #[derive(Default)]
    struct Script {
        rx: VecDeque<anyhow::Result<Vec<u8>>>,
        oversize: bool,
        tx: Vec<Vec<u8>>,
    }

    impl Transport for Script {
        fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> anyhow::Result<usize> {
            if self.oversize {
                return Ok(buf.len());
            }
            match self.rx.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }

        fn send(&mut self, data: &[u8], _timeout: Duration) -> anyhow::Result<()> {
            self.tx.push(data.to_vec());
            Ok(())
        }
    }

    /// Counts the bytes it was handed.
    #[derive(Default)]
    struct Tally(usize);

    impl Decoder for Tally {
        fn parse(&mut self, buf: &[u8], _sink: &dyn EventSink) {
            self.0 += buf.len();
        }
    }

    fn task(script: Script) -> ReadTask<Script, Tally> {
        let cache = Arc::new(SensorCache::new());
        cache.initialize().unwrap();
        ReadTask::new(cache, script, Tally::default())
    }

    #[test]
    fn good_read_is_decoded_and_marks_alive() {
        let mut script = Script::default();
        script.rx.push_back(Ok(vec![1, 2, 3]));
        let mut task = task(script);
        task.cache.set_dead(true);

        assert_eq!(task.poll_once(), CycleOutcome::Received(3));
        assert_eq!(task.decoder().0, 3);
        assert!(!task.cache.is_dead());
    }

    #[test]
    fn empty_read_marks_dead() {
        let mut task = task(Script::default());
        assert_eq!(task.poll_once(), CycleOutcome::Lost);
        assert!(task.cache.is_dead());
        assert_eq!(task.decoder().0, 0);
    }

    #[test]
    fn transport_error_marks_dead() {
        let mut script = Script::default();
        script.rx.push_back(Err(anyhow::anyhow!("uart timeout")));
        let mut task = task(script);

        assert_eq!(task.poll_once(), CycleOutcome::Lost);
        assert!(task.cache.is_dead());
    }

    #[test]
    fn full_buffer_read_is_treated_as_malformed() {
        let mut task = task(Script {
            oversize: true,
            ..Default::default()
        });
        assert_eq!(task.poll_once(), CycleOutcome::Lost);
        assert!(task.cache.is_dead());
        assert_eq!(task.decoder().0, 0);
    }

    #[test]
    fn configure_sends_the_mode_sequence() {
        let mut task = task(Script::default());
        let outputs = [OutputConfig::new(xbus::XDI_ACCELERATION, 200)];

        task.configure(&outputs).unwrap();

        assert!(task.is_configured());
        assert_eq!(
            task.transport.tx,
            vec![
                xbus::goto_config(),
                xbus::set_output_configuration(&outputs),
                xbus::goto_measurement(),
            ]
        );
    }

    #[test]
    fn failed_send_leaves_task_unconfigured() {
        struct Broken;
        impl Transport for Broken {
            fn receive(&mut self, _: &mut [u8], _: Duration) -> anyhow::Result<usize> {
                Ok(0)
            }
            fn send(&mut self, _: &[u8], _: Duration) -> anyhow::Result<()> {
                anyhow::bail!("tx fifo full")
            }
        }

        let mut task = ReadTask::new(Arc::new(SensorCache::new()), Broken, Tally::default());
        let err = task.configure(&OUTPUT_CONFIG).unwrap_err();
        assert!(format!("{:#}", err).contains("GoToConfig"));
        assert!(!task.is_configured());
    }

    #[test]
    fn events_reach_the_cache_through_the_dispatcher() {
        struct OneTemp;
        impl Decoder for OneTemp {
            fn parse(&mut self, _: &[u8], sink: &dyn EventSink) {
                sink.on_event(SensorEvent::new(
                    crate::events::Channel::Temperature,
                    crate::events::Payload::F32(25.0),
                ));
            }
        }

        let cache = Arc::new(SensorCache::new());
        cache.initialize().unwrap();
        let mut script = Script::default();
        script.rx.push_back(Ok(vec![0xFA]));
        let mut task = ReadTask::new(Arc::clone(&cache), script, OneTemp);

        task.poll_once();
        let reading = cache.get_reading(Duration::from_millis(5)).unwrap();
        assert_eq!(reading.temperature, 25.0);
        assert!(!reading.is_dead);
    }
}
