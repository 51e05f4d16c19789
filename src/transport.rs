// Movella FC - Serial Transport Contract
//
// Byte-level I/O with the MTi. The firmware backs this with the ESP-IDF UART
// driver; tests use scripted in-memory links.

use std::time::Duration;

pub trait Transport {
    /// Read whatever arrives within `timeout` into `buf`. `Ok(0)` and `Err`
    /// both mean the cycle produced nothing.
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> anyhow::Result<usize>;

    /// Write all of `data`, waiting at most `timeout` for it to drain.
    fn send(&mut self, data: &[u8], timeout: Duration) -> anyhow::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> anyhow::Result<usize> {
        (**self).receive(buf, timeout)
    }

    fn send(&mut self, data: &[u8], timeout: Duration) -> anyhow::Result<()> {
        (**self).send(data, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> anyhow::Result<usize> {
        (**self).receive(buf, timeout)
    }

    fn send(&mut self, data: &[u8], timeout: Duration) -> anyhow::Result<()> {
        (**self).send(data, timeout)
    }
}
