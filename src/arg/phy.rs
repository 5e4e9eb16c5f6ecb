use std::time::Duration;

use log::trace;
use thiserror::Error;

use super::packet::{Packet, STATE_LENGTH};
use crate::remote::{Receiver, Transmitter};

pub const CARRIER_FREQUENCY: u32 = 38000;

pub const HEADER_MARK: Duration = Duration::from_micros(8328);
pub const HEADER_SPACE: Duration = Duration::from_micros(4176);
pub const BIT_MARK: Duration = Duration::from_micros(515);
pub const ONE_SPACE: Duration = Duration::from_micros(1592);
pub const ZERO_SPACE: Duration = Duration::from_micros(523);

// Header pair, one pair per bit and a single footer mark
pub const FRAME_PULSES: usize = 2 + STATE_LENGTH * 8 * 2 + 1;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum PhyError {
    #[error("invalid header")]
    HeaderMismatch,
    #[error("invalid pulses for byte {byte} bit {bit}")]
    BitMismatch { byte: usize, bit: usize },
    #[error("invalid footer")]
    FooterMismatch,
}

/// Bit timings of a frame: header, 15 bytes sent LSB first, footer mark
pub struct Phy;

impl Phy {
    pub fn encode(packet: &Packet, transmitter: &mut impl Transmitter) {
        transmitter.set_carrier_frequency(CARRIER_FREQUENCY);

        transmitter.mark(HEADER_MARK);
        transmitter.space(HEADER_SPACE);

        for &byte in packet.0.iter() {
            for bit in 0..8 {
                transmitter.mark(BIT_MARK);
                transmitter.space(if byte & (1 << bit) != 0 {
                    ONE_SPACE
                } else {
                    ZERO_SPACE
                });
            }
        }

        transmitter.mark(BIT_MARK);
    }

    /// Reads a single frame, failing on the first pulse that doesn't fit
    pub fn decode(receiver: &mut impl Receiver) -> Result<Packet, PhyError> {
        if !receiver.expect_item(HEADER_MARK, HEADER_SPACE) {
            return Err(PhyError::HeaderMismatch);
        }

        let mut packet = Packet([0; STATE_LENGTH]);
        for (i, byte) in packet.0.iter_mut().enumerate() {
            for bit in 0..8 {
                if receiver.expect_item(BIT_MARK, ONE_SPACE) {
                    *byte |= 1 << bit;
                } else if !receiver.expect_item(BIT_MARK, ZERO_SPACE) {
                    return Err(PhyError::BitMismatch { byte: i, bit });
                }
            }
            trace!("Byte {} {:02X}", i, *byte);
        }

        if !receiver.expect_mark(BIT_MARK) {
            return Err(PhyError::FooterMismatch);
        }

        Ok(packet)
    }
}

#[cfg(test)]
mod test {
    use hex_literal::hex;

    use super::*;
    use crate::remote::{ReceiveData, TransmitData};

    const PACKET: Packet = Packet(hex!("56 74 00 00 21 00 00 00 00 00 00 00 00 00 19"));

    fn encode(packet: &Packet) -> Vec<Duration> {
        let mut data = TransmitData::new();
        Phy::encode(packet, &mut data);
        assert_eq!(data.carrier_frequency, Some(CARRIER_FREQUENCY));
        data.pulses
    }

    #[test]
    fn test_encode() {
        let pulses = encode(&PACKET);
        assert_eq!(pulses.len(), FRAME_PULSES);
        assert_eq!(pulses[0], HEADER_MARK);
        assert_eq!(pulses[1], HEADER_SPACE);

        // 0x56 LSB first: 0 1 1 0 1 0 1 0
        let spaces: Vec<_> = pulses[2..18].iter().skip(1).step_by(2).copied().collect();
        assert_eq!(
            spaces,
            [0, 1, 1, 0, 1, 0, 1, 0].map(|b| if b == 1 { ONE_SPACE } else { ZERO_SPACE })
        );
        assert!(pulses[2..].iter().step_by(2).all(|&d| d == BIT_MARK));
        assert_eq!(*pulses.last().unwrap(), BIT_MARK);
    }

    #[test]
    fn test_decode() {
        let pulses = encode(&PACKET);
        let mut receiver = ReceiveData::new(&pulses);
        assert_eq!(Phy::decode(&mut receiver), Ok(PACKET));
        assert_eq!(receiver.position(), FRAME_PULSES);
    }

    #[test]
    fn test_decode_with_jitter() {
        // Receivers typically stretch marks and shorten spaces
        let pulses: Vec<_> = encode(&PACKET)
            .into_iter()
            .enumerate()
            .map(|(i, d)| if i % 2 == 0 { d + d / 10 } else { d - d / 10 })
            .collect();
        assert_eq!(Phy::decode(&mut ReceiveData::new(&pulses)), Ok(PACKET));
    }

    #[test]
    fn test_decode_errors() {
        let pulses = encode(&PACKET);

        let mut bad_header = pulses.clone();
        bad_header[1] = Duration::from_micros(2000);
        assert_eq!(
            Phy::decode(&mut ReceiveData::new(&bad_header)),
            Err(PhyError::HeaderMismatch)
        );

        // Byte 3 bit 5
        let mut bad_bit = pulses.clone();
        bad_bit[2 + (3 * 8 + 5) * 2 + 1] = Duration::from_micros(1000);
        assert_eq!(
            Phy::decode(&mut ReceiveData::new(&bad_bit)),
            Err(PhyError::BitMismatch { byte: 3, bit: 5 })
        );

        let mut bad_footer = pulses.clone();
        bad_footer[FRAME_PULSES - 1] = Duration::from_micros(1000);
        assert_eq!(
            Phy::decode(&mut ReceiveData::new(&bad_footer)),
            Err(PhyError::FooterMismatch)
        );

        let truncated = &pulses[..FRAME_PULSES - 1];
        assert_eq!(
            Phy::decode(&mut ReceiveData::new(truncated)),
            Err(PhyError::FooterMismatch)
        );

        let truncated = &pulses[..100];
        assert!(matches!(
            Phy::decode(&mut ReceiveData::new(truncated)),
            Err(PhyError::BitMismatch { .. })
        ));
    }
}
