//! ARG air conditioners controlled by the KKG26A-C1 remote

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};
use thiserror::Error;

use crate::remote::{Receiver, Transmitter};

pub mod climate;
pub mod packet;
pub mod phy;

pub use climate::{ArgClimate, ClimateTraits, StateSink};
pub use packet::{Packet, PacketError};
pub use phy::{Phy, PhyError};

pub const TEMP_MIN: f32 = 16.0;
pub const TEMP_MAX: f32 = 32.0;
pub const TEMP_STEP: f32 = 1.0;

// The complete state exchanged with the unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermostatState {
    pub mode: Mode,

    // Target temperature in Celsius, whole degrees between TEMP_MIN and TEMP_MAX
    pub target_temperature: f32,

    pub fan: Fan,

    pub swing: Swing,
}

impl Default for ThermostatState {
    fn default() -> Self {
        Self {
            mode: Mode::Off,
            target_temperature: 24.0,
            fan: Fan::Auto,
            swing: Swing::Off,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Auto,
    Cool,
    Dry,
    Heat,
    FanOnly,
    Off,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Fan {
    Auto,
    Low,
    Medium,
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Swing {
    Off,
    Vertical,
    Horizontal,
    Both,
}

impl Swing {
    pub fn vertical(self) -> bool {
        matches!(self, Swing::Vertical | Swing::Both)
    }

    pub fn horizontal(self) -> bool {
        matches!(self, Swing::Horizontal | Swing::Both)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("framing error: {0}")]
    Phy(#[from] PhyError),
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),
}

/// Builds the payload for `state` and queues it on `transmitter` as a pulse train.
///
/// The target temperature must already be clamped to the supported range.
pub fn encode(state: &ThermostatState, transmitter: &mut impl Transmitter) -> Packet {
    let packet = Packet::from_state(state);
    trace!("Sending: {}", packet);
    Phy::encode(&packet, transmitter);
    packet
}

/// Parses one frame from `receiver` and applies it on top of `previous`.
///
/// Nothing is returned unless the whole frame is valid.
pub fn decode(
    receiver: &mut impl Receiver,
    previous: &ThermostatState,
) -> Result<ThermostatState, DecodeError> {
    let packet = Phy::decode(receiver).map_err(|e| {
        debug!("{}", e);
        e
    })?;
    packet.validate().map_err(|e| {
        debug!("{}", e);
        e
    })?;
    trace!("Received: {}", packet);

    let state = packet.apply(previous);
    debug!("Decoded state: {:?}", state);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::remote::{ReceiveData, TransmitData};

    fn transmit(state: &ThermostatState) -> TransmitData {
        let mut data = TransmitData::new();
        encode(state, &mut data);
        data
    }

    #[test]
    fn test_round_trip_all_states() {
        let previous = ThermostatState::default();

        for mode in Mode::iter().filter(|&m| m != Mode::Off) {
            for fan in Fan::iter() {
                for swing in Swing::iter() {
                    for temperature in 16..=32 {
                        let state = ThermostatState {
                            mode,
                            target_temperature: temperature as f32,
                            fan,
                            swing,
                        };
                        let data = transmit(&state);
                        let decoded = decode(&mut ReceiveData::new(&data.pulses), &previous)
                            .unwrap_or_else(|e| panic!("{:?}: {}", state, e));
                        assert_eq!(decoded, state);
                    }
                }
            }
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let state = ThermostatState {
            mode: Mode::Heat,
            target_temperature: 21.0,
            fan: Fan::Low,
            swing: Swing::Vertical,
        };
        assert_eq!(transmit(&state), transmit(&state));
    }

    #[test]
    fn test_power_off_round_trip() {
        let off = ThermostatState {
            mode: Mode::Off,
            target_temperature: 20.0,
            fan: Fan::Auto,
            swing: Swing::Both,
        };
        let data = transmit(&off);
        let previous = ThermostatState {
            mode: Mode::Cool,
            ..off
        };

        let decoded = decode(&mut ReceiveData::new(&data.pulses), &previous).unwrap();
        assert_eq!(decoded.mode, Mode::Off);
        assert_eq!(decoded.target_temperature, 20.0);
        // Swing bits are read independently of the power-off flag
        assert_eq!(decoded.swing, Swing::Both);
    }

    #[test]
    fn test_single_corrupted_pulse_is_rejected() {
        let state = ThermostatState {
            mode: Mode::Cool,
            target_temperature: 24.0,
            fan: Fan::High,
            swing: Swing::Horizontal,
        };
        let data = transmit(&state);

        for i in 0..data.pulses.len() {
            let mut pulses = data.pulses.clone();
            // Swap one and zero spaces, stretch everything else out of tolerance
            pulses[i] = match pulses[i].as_micros() {
                1592 => Duration::from_micros(523),
                523 => Duration::from_micros(1592),
                _ => pulses[i] * 3,
            };

            let result = decode(&mut ReceiveData::new(&pulses), &state);
            assert!(result.is_err(), "pulse {} corrupted but frame accepted", i);
        }
    }

    fn transmit_packet(packet: &Packet) -> Vec<Duration> {
        let mut data = TransmitData::new();
        Phy::encode(packet, &mut data);
        data.pulses
    }

    #[test]
    fn test_tampered_checksum() {
        let mut packet = Packet::from_state(&ThermostatState::default());
        let checksum = packet.checksum();
        packet.0[Packet::LENGTH - 1] = checksum.wrapping_add(1);

        let result = decode(
            &mut ReceiveData::new(&transmit_packet(&packet)),
            &ThermostatState::default(),
        );
        assert_eq!(
            result,
            Err(DecodeError::Packet(PacketError::ChecksumMismatch {
                expected: checksum,
                actual: checksum.wrapping_add(1),
            }))
        );
    }

    #[test]
    fn test_unknown_mode_nibble_keeps_previous_mode() {
        let mut packet = Packet::from_state(&ThermostatState {
            mode: Mode::Cool,
            target_temperature: 27.0,
            fan: Fan::Low,
            swing: Swing::Horizontal,
        });
        packet.0[4] = 0x60 | (packet.0[4] & 0x0F);
        packet.apply_checksum();

        let previous = ThermostatState {
            mode: Mode::Heat,
            target_temperature: 18.0,
            fan: Fan::High,
            swing: Swing::Off,
        };
        let decoded = decode(&mut ReceiveData::new(&transmit_packet(&packet)), &previous).unwrap();
        assert_eq!(
            decoded,
            ThermostatState {
                mode: Mode::Heat,
                target_temperature: 27.0,
                fan: Fan::Low,
                swing: Swing::Horizontal,
            }
        );
    }

    #[test]
    fn test_footer_mismatch_publishes_nothing() {
        let data = transmit(&ThermostatState::default());
        let mut pulses = data.pulses.clone();
        *pulses.last_mut().unwrap() = Duration::from_micros(2000);

        let result = decode(&mut ReceiveData::new(&pulses), &ThermostatState::default());
        assert_eq!(result, Err(DecodeError::Phy(PhyError::FooterMismatch)));
    }
}
