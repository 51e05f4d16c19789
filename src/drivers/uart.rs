// Movella FC - UART Transport
//
// ESP-IDF UART driver behind the `Transport` contract.

use std::time::Duration;

use esp_idf_hal::delay::TickType;
use esp_idf_hal::uart::UartDriver;

use movella_fc::Transport;

pub struct UartTransport {
    uart: UartDriver<'static>,
}

impl UartTransport {
    pub fn new(uart: UartDriver<'static>) -> Self {
        Self { uart }
    }
}

impl Transport for UartTransport {
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> anyhow::Result<usize> {
        Ok(self.uart.read(buf, TickType::from(timeout).ticks())?)
    }

    fn send(&mut self, data: &[u8], timeout: Duration) -> anyhow::Result<()> {
        let mut written = 0;
        while written < data.len() {
            written += self.uart.write(&data[written..])?;
        }
        self.uart.wait_tx_done(TickType::from(timeout).ticks())?;
        Ok(())
    }
}
