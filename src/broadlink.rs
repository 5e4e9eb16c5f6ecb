/*
 * Implements encoding/decoding of payloads sent to a broadlink IR device
 * Payload format from: https://github.com/mjg59/python-broadlink/blob/master/protocol.md
 */
use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::remote::TransmitData;

// Broadlink expects on/off pairs, a frame ending on a mark gets this gap appended
const TRAILING_GAP: Duration = Duration::from_millis(100);

trait BroadlinkDuration {
    fn to_broadlink(self) -> u16;
    fn from_broadlink(broadlink_pulse: u16) -> Self;
}

impl BroadlinkDuration for Duration {
    // Units of 2^-15 s, µs * 269 / 8192 is close enough
    fn to_broadlink(self) -> u16 {
        (self.as_micros() as f64 * 269.0 / 8192.0).round() as u16
    }

    fn from_broadlink(broadlink_pulse: u16) -> Self {
        Self::from_nanos((broadlink_pulse as f64 * 8192000.0 / 269.0).round() as _)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transport {
    Ir = 0x26,
    Rf433 = 0xb2,
    Rf315 = 0xd7,
}

/*
Offset	Contents
0x00	0x26 = IR, 0xb2 for RF 433Mhz, 0xd7 for RF 315Mhz
0x01	repeat count, (0 = no repeat, 1 send twice, .....)
0x02-0x03	Length of the following data in little endian
0x04 ....	Pulse lengths in 2^-15 s units, values above 255 are 0x00 followed by a big endian u16
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recording {
    pub repeat_count: u8,
    pub transport: Transport,
    // On-off pulse durations
    pub pulses: Vec<Duration>,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid transport type: {0:#04x}")]
    InvalidTransport(u8),
    #[error("recording is truncated")]
    Truncated,
}

impl Recording {
    pub fn new_ir(mut pulses: Vec<Duration>) -> Self {
        if pulses.len() % 2 != 0 {
            pulses.push(TRAILING_GAP);
        }

        Self {
            repeat_count: 0,
            transport: Transport::Ir,
            pulses,
        }
    }

    /// Formats as `+mark -space ...` in microseconds
    pub fn to_raw_format(&self) -> String {
        self.pulses
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let sign = if i % 2 == 0 { '+' } else { '-' };
                format!("{}{}", sign, p.as_micros())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut pulses_buf = BytesMut::new();
        for pulse in &self.pulses {
            match pulse.to_broadlink() {
                pulse @ 1..=255 => pulses_buf.put_u8(pulse as u8),
                pulse => {
                    pulses_buf.put_u8(0);
                    pulses_buf.put_u16(pulse);
                }
            }
        }

        let mut b = BytesMut::with_capacity(4 + pulses_buf.len());
        b.put_u8(self.transport as u8);
        b.put_u8(self.repeat_count);
        b.put_u16_le(pulses_buf.len() as _);
        b.put(pulses_buf);
        b.freeze()
    }

    pub fn from_bytes(mut buf: Bytes) -> Result<Self, ParseError> {
        if buf.remaining() < 4 {
            return Err(ParseError::Truncated);
        }

        let transport = match buf.get_u8() {
            0x26 => Transport::Ir,
            0xb2 => Transport::Rf433,
            0xd7 => Transport::Rf315,
            x => return Err(ParseError::InvalidTransport(x)),
        };

        let repeat_count = buf.get_u8();
        let length = buf.get_u16_le() as usize;
        if buf.remaining() < length {
            return Err(ParseError::Truncated);
        }
        let mut data = buf.split_to(length);

        let mut pulses = Vec::with_capacity(length);
        while data.has_remaining() {
            let value = match data.get_u8() {
                0 if data.remaining() >= 2 => data.get_u16(),
                // A lone zero at the end is padding
                0 => break,
                value => value as u16,
            };
            pulses.push(Duration::from_broadlink(value));
        }

        Ok(Recording::new_ir(pulses).with_repeat_count(repeat_count).with_transport(transport))
    }

    fn with_repeat_count(mut self, repeat_count: u8) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }
}

impl From<TransmitData> for Recording {
    fn from(data: TransmitData) -> Self {
        Recording::new_ir(data.pulses)
    }
}
