//! Xbus framing for the Movella (Xsens) MTi
//!
//! Message format: [0xFA] [BID] [MID] [LEN | 0xFF LEN_H LEN_L] [DATA] [CHECKSUM]
//!
//! The checksum is chosen so that every byte after the preamble, checksum
//! included, sums to zero (mod 256). Measurement data arrives as `MTData2`
//! messages: a run of `[ID_H ID_L] [SIZE] [DATA]` packets with big-endian
//! fields.
//!
//! This module provides:
//! - `XbusDecoder`: streaming [`Decoder`] that survives frames split across reads
//! - `encode` and the request builders used by the configure sequence

use crate::config::OutputConfig;
use crate::events::{Channel, Decoder, EventSink, Payload, SensorEvent};

pub const PREAMBLE: u8 = 0xFA;
pub const BUS_ID_MASTER: u8 = 0xFF;
const EXTENDED_LENGTH: u8 = 0xFF;

pub const MID_GOTO_MEASUREMENT: u8 = 0x10;
pub const MID_GOTO_CONFIG: u8 = 0x30;
pub const MID_MTDATA2: u8 = 0x36;
pub const MID_ERROR: u8 = 0x42;
pub const MID_SET_OUTPUT_CONFIGURATION: u8 = 0xC0;

// Data identifiers, format bits cleared.
pub const XDI_TEMPERATURE: u16 = 0x0810;
pub const XDI_QUATERNION: u16 = 0x2010;
pub const XDI_BARO_PRESSURE: u16 = 0x3010;
pub const XDI_ACCELERATION: u16 = 0x4020;
pub const XDI_RATE_OF_TURN: u16 = 0x8020;
pub const XDI_MAGNETIC_FIELD: u16 = 0xC020;
pub const XDI_STATUS_WORD: u16 = 0xE020;

const XDI_TYPE_MASK: u16 = 0xFFF0;
const XDI_PRECISION_MASK: u16 = 0x0003; // 0 = float32

/// Largest payload accepted before the frame is considered garbage.
pub const MAX_PAYLOAD_LEN: usize = 2048;
const MAX_BUFFER_LEN: usize = 2 * (MAX_PAYLOAD_LEN + 7);

/// Build a complete Xbus message addressed to the device.
pub fn encode(mid: u8, payload: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(payload.len() + 7);
    msg.push(PREAMBLE);
    msg.push(BUS_ID_MASTER);
    msg.push(mid);
    if payload.len() < EXTENDED_LENGTH as usize {
        msg.push(payload.len() as u8);
    } else {
        msg.push(EXTENDED_LENGTH);
        msg.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    }
    msg.extend_from_slice(payload);
    let sum = msg[1..].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    msg.push(0u8.wrapping_sub(sum));
    msg
}

pub fn goto_config() -> Vec<u8> {
    encode(MID_GOTO_CONFIG, &[])
}

pub fn goto_measurement() -> Vec<u8> {
    encode(MID_GOTO_MEASUREMENT, &[])
}

pub fn set_output_configuration(outputs: &[OutputConfig]) -> Vec<u8> {
    let payload: Vec<u8> = outputs
        .iter()
        .flat_map(|o| {
            let [id_h, id_l] = o.data_id.to_be_bytes();
            let [f_h, f_l] = o.frequency.to_be_bytes();
            [id_h, id_l, f_h, f_l]
        })
        .collect();
    encode(MID_SET_OUTPUT_CONFIGURATION, &payload)
}

/// Framing counters, for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u32,
    pub bad_checksums: u32,
    pub discarded_bytes: u32,
}

/// Streaming MTi message parser.
#[derive(Debug, Default)]
pub struct XbusDecoder {
    buffer: Vec<u8>,
    stats: FrameStats,
}

impl XbusDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_BUFFER_LEN),
            stats: FrameStats::default(),
        }
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn discard(&mut self, n: usize) {
        self.buffer.drain(..n);
        self.stats.discarded_bytes = self.stats.discarded_bytes.wrapping_add(n as u32);
    }

    /// Pull every complete frame out of the buffer.
    fn drain_frames(&mut self, sink: &dyn EventSink) {
        loop {
            let Some(start) = self.buffer.iter().position(|&b| b == PREAMBLE) else {
                let n = self.buffer.len();
                self.discard(n);
                return;
            };
            if start > 0 {
                self.discard(start);
            }

            // [FA] [BID] [MID] [LEN]
            if self.buffer.len() < 4 {
                return;
            }
            let (header_len, payload_len) = if self.buffer[3] == EXTENDED_LENGTH {
                if self.buffer.len() < 6 {
                    return;
                }
                (6, u16::from_be_bytes([self.buffer[4], self.buffer[5]]) as usize)
            } else {
                (4, self.buffer[3] as usize)
            };

            if payload_len > MAX_PAYLOAD_LEN {
                // Not a real header; resync on the next preamble.
                self.discard(1);
                continue;
            }

            let total = header_len + payload_len + 1;
            if self.buffer.len() < total {
                return;
            }

            let sum = self.buffer[1..total]
                .iter()
                .fold(0u8, |acc, b| acc.wrapping_add(*b));
            if sum != 0 {
                log::debug!("Xbus checksum mismatch (MID=0x{:02X})", self.buffer[2]);
                self.stats.bad_checksums = self.stats.bad_checksums.wrapping_add(1);
                self.discard(1);
                continue;
            }

            self.stats.frames = self.stats.frames.wrapping_add(1);
            let mid = self.buffer[2];
            let payload = &self.buffer[header_len..header_len + payload_len];
            handle_message(mid, payload, sink);
            self.buffer.drain(..total);
        }
    }
}

impl Decoder for XbusDecoder {
    fn parse(&mut self, buf: &[u8], sink: &dyn EventSink) {
        if self.buffer.len() + buf.len() > MAX_BUFFER_LEN {
            // Nothing sensible accumulated this much; start over.
            let n = self.buffer.len();
            self.discard(n);
        }
        self.buffer.extend_from_slice(buf);
        self.drain_frames(sink);
    }
}

fn handle_message(mid: u8, payload: &[u8], sink: &dyn EventSink) {
    match mid {
        MID_MTDATA2 => parse_mtdata2(payload, sink),
        MID_ERROR => {
            log::warn!("MTi reported error code 0x{:02X}", payload.first().copied().unwrap_or(0));
        }
        _ => log::debug!("Xbus message MID=0x{:02X} len={}", mid, payload.len()),
    }
}

fn parse_mtdata2(mut payload: &[u8], sink: &dyn EventSink) {
    while payload.len() >= 3 {
        let id = u16::from_be_bytes([payload[0], payload[1]]);
        let size = payload[2] as usize;
        let Some(data) = payload.get(3..3 + size) else {
            log::debug!("Truncated MTData2 packet 0x{:04X}", id);
            return;
        };
        if let Some(event) = decode_packet(id, data) {
            sink.on_event(event);
        }
        payload = &payload[3 + size..];
    }
}

fn decode_packet(id: u16, data: &[u8]) -> Option<SensorEvent> {
    let channel = match id & XDI_TYPE_MASK {
        XDI_ACCELERATION => Channel::Acceleration,
        XDI_RATE_OF_TURN => Channel::RateOfTurn,
        XDI_MAGNETIC_FIELD => Channel::MagneticField,
        XDI_QUATERNION => Channel::Quaternion,
        XDI_TEMPERATURE => Channel::Temperature,
        XDI_BARO_PRESSURE => Channel::Pressure,
        _ => Channel::Other(id),
    };

    let payload = match channel {
        Channel::Pressure | Channel::Other(_) if data.len() == 4 => Payload::U32(be_u32(data)),
        Channel::Other(_) => return None,
        // Only single-precision floats are decoded.
        _ if id & XDI_PRECISION_MASK != 0 => return None,
        _ => float_payload(data)?,
    };
    Some(SensorEvent::new(channel, payload))
}

fn float_payload(data: &[u8]) -> Option<Payload> {
    let f = |i: usize| f32::from_bits(be_u32(&data[i * 4..i * 4 + 4]));
    match data.len() {
        4 => Some(Payload::F32(f(0))),
        12 => Some(Payload::F32x3([f(0), f(1), f(2)])),
        16 => Some(Payload::F32x4([f(0), f(1), f(2), f(3)])),
        _ => None,
    }
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}
