pub mod arg;
pub mod broadlink;
pub mod modem;
pub mod remote;
pub mod smartir;

pub use arg::{decode, encode, DecodeError, Fan, Mode, Swing, ThermostatState};
