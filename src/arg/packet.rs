use std::fmt;

use thiserror::Error;

use super::{Fan, Mode, Swing, ThermostatState};

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketError {
    #[error("unexpected header byte {0:#04x}")]
    HeaderByteMismatch(u8),

    #[error("checksum mismatch: computed {expected:#04x}, received {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

pub const STATE_LENGTH: usize = 15;

/// The 15 byte message exchanged with the remote
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Packet(pub [u8; STATE_LENGTH]);

impl Packet {
    pub const LENGTH: usize = STATE_LENGTH;

    const HEADER: u8 = 0x56;
    const TEMPERATURE_SHIFT: u8 = 0x5C;

    const TEMPERATURE_BYTE: usize = 1;
    const MODE_FAN_BYTE: usize = 4;
    const FLAGS_BYTE: usize = 5;
    const EXTRA_BYTE: usize = 6;
    const CHECKSUM_BYTE: usize = Packet::LENGTH - 1;

    // Modes, high nibble of MODE_FAN_BYTE
    const MODE_MASK: u8 = 0b1111_0000;
    const MODE_AUTO: u8 = 0b0100_0000;
    const MODE_COOL: u8 = 0b0010_0000;
    const MODE_DRY: u8 = 0b0011_0000;
    const MODE_HEAT: u8 = 0b0001_0000;
    const MODE_FAN_ONLY: u8 = 0b0101_0000;

    // Fans, low nibble of MODE_FAN_BYTE
    const FAN_MASK: u8 = 0b0000_1111;
    const FAN_AUTO: u8 = 0b0000_0000;
    const FAN_HIGH: u8 = 0b0000_0001;
    const FAN_MEDIUM: u8 = 0b0000_0011;
    const FAN_LOW: u8 = 0b0000_0010;

    // FLAGS_BYTE
    const SWING_MASK: u8 = 0b0000_0011;
    const SWING_VERTICAL: u8 = 0b0000_0010;
    const SWING_HORIZONTAL: u8 = 0b0000_0001;
    const POWER_OFF: u8 = 0b1100_0000;

    // EXTRA_BYTE, auxiliary heating
    const AUX_HEAT: u8 = 0b0100_0000;

    pub fn new() -> Self {
        let mut p = Packet([0; Packet::LENGTH]);
        p.0[0] = Packet::HEADER;
        p
    }

    pub fn from_state(state: &ThermostatState) -> Self {
        let mut packet = Packet::new();
        packet.set_temperature(state.target_temperature);
        packet.set_fan(state.fan);
        packet.set_mode(state.mode);
        packet.set_swing(state.swing);
        packet.apply_checksum();
        packet
    }

    pub fn header(&self) -> u8 {
        self.0[0]
    }

    pub fn checksum(&self) -> u8 {
        self.0[Packet::CHECKSUM_BYTE]
    }

    pub fn temperature(&self) -> f32 {
        (i16::from(self.0[Packet::TEMPERATURE_BYTE]) - i16::from(Packet::TEMPERATURE_SHIFT)) as f32
    }

    /// `temperature` is expected to be clamped to TEMP_MIN..=TEMP_MAX already
    pub fn set_temperature(&mut self, temperature: f32) {
        let temperature = temperature.round() as u8;
        self.0[Packet::TEMPERATURE_BYTE] = temperature.wrapping_add(Packet::TEMPERATURE_SHIFT);
    }

    /// Byte 5 holds nothing but the power-off bits, swing bits aside
    pub fn power_off(&self) -> bool {
        self.0[Packet::FLAGS_BYTE] & !Packet::SWING_MASK == Packet::POWER_OFF
    }

    /// Returns None when the mode bits don't match any known mode
    pub fn mode(&self) -> Option<Mode> {
        if self.power_off() {
            return Some(Mode::Off);
        }

        match self.0[Packet::MODE_FAN_BYTE] & Packet::MODE_MASK {
            Packet::MODE_HEAT => Some(Mode::Heat),
            Packet::MODE_COOL => Some(Mode::Cool),
            Packet::MODE_DRY => Some(Mode::Dry),
            Packet::MODE_FAN_ONLY => Some(Mode::FanOnly),
            Packet::MODE_AUTO => Some(Mode::Auto),
            _ => None,
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        match mode {
            Mode::Auto => self.0[Packet::MODE_FAN_BYTE] |= Packet::MODE_AUTO,
            Mode::Heat => {
                self.0[Packet::MODE_FAN_BYTE] |= Packet::MODE_HEAT;
                self.0[Packet::EXTRA_BYTE] |= Packet::AUX_HEAT;
            }
            Mode::Cool => self.0[Packet::MODE_FAN_BYTE] |= Packet::MODE_COOL,
            Mode::Dry => self.0[Packet::MODE_FAN_BYTE] |= Packet::MODE_DRY,
            Mode::FanOnly => self.0[Packet::MODE_FAN_BYTE] |= Packet::MODE_FAN_ONLY,
            Mode::Off => self.0[Packet::FLAGS_BYTE] |= Packet::POWER_OFF,
        }
    }

    pub fn aux_heat(&self) -> bool {
        self.0[Packet::EXTRA_BYTE] & Packet::AUX_HEAT != 0
    }

    pub fn fan(&self) -> Fan {
        match self.0[Packet::MODE_FAN_BYTE] & Packet::FAN_MASK {
            Packet::FAN_HIGH => Fan::High,
            Packet::FAN_MEDIUM => Fan::Medium,
            Packet::FAN_LOW => Fan::Low,
            _ => Fan::Auto,
        }
    }

    pub fn set_fan(&mut self, fan: Fan) {
        self.0[Packet::MODE_FAN_BYTE] |= match fan {
            Fan::High => Packet::FAN_HIGH,
            Fan::Medium => Packet::FAN_MEDIUM,
            Fan::Low => Packet::FAN_LOW,
            Fan::Auto => Packet::FAN_AUTO,
        };
    }

    pub fn swing(&self) -> Swing {
        let swing = self.0[Packet::FLAGS_BYTE] & Packet::SWING_MASK;
        match (
            swing & Packet::SWING_VERTICAL != 0,
            swing & Packet::SWING_HORIZONTAL != 0,
        ) {
            (true, true) => Swing::Both,
            (true, false) => Swing::Vertical,
            (false, true) => Swing::Horizontal,
            (false, false) => Swing::Off,
        }
    }

    pub fn set_swing(&mut self, swing: Swing) {
        if swing.vertical() {
            self.0[Packet::FLAGS_BYTE] |= Packet::SWING_VERTICAL;
        }
        if swing.horizontal() {
            self.0[Packet::FLAGS_BYTE] |= Packet::SWING_HORIZONTAL;
        }
    }

    /// Sum of both nibbles of every byte but the last one
    pub fn compute_checksum(&self) -> u8 {
        self.0[..Packet::CHECKSUM_BYTE]
            .iter()
            .fold(0u8, |sum, &b| sum.wrapping_add(b & 0x0F).wrapping_add(b >> 4))
    }

    pub fn apply_checksum(&mut self) {
        self.0[Packet::CHECKSUM_BYTE] = self.compute_checksum();
    }

    pub fn validate(&self) -> Result<(), PacketError> {
        if self.header() != Packet::HEADER {
            return Err(PacketError::HeaderByteMismatch(self.header()));
        }

        let expected = self.compute_checksum();
        if expected != self.checksum() {
            return Err(PacketError::ChecksumMismatch {
                expected,
                actual: self.checksum(),
            });
        }

        Ok(())
    }

    /// Applies the packet on top of a previously known state.
    ///
    /// An unrecognized mode keeps the previous one, every other field is
    /// always overwritten.
    pub fn apply(&self, previous: &ThermostatState) -> ThermostatState {
        ThermostatState {
            mode: self.mode().unwrap_or(previous.mode),
            target_temperature: self.temperature(),
            fan: self.fan(),
            swing: self.swing(),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.0.chunks(4).enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{}", hex::encode_upper(chunk))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet({})", hex::encode(self.0))
    }
}
