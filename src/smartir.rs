use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
    arg::{self, Fan, Mode, Swing, ThermostatState, TEMP_MAX, TEMP_MIN},
    broadlink::Recording,
    modem::{create_codec, CodecError, CodecType},
    remote::TransmitData,
};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CodeFile {
    pub manufacturer: String,
    pub supported_models: Vec<String>,
    pub supported_controller: String,
    pub commands_encoding: String,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub precision: f32,
    pub operation_modes: Vec<String>,
    pub fan_modes: Vec<String>,
    pub commands: serde_json::Value,
}

/// Builds a SmartIR code file from all possible states.
///
/// Commands are nested as mode -> fan -> temperature, with a single `off` entry.
pub fn code_file() -> Result<CodeFile, CodecError> {
    let mut commands = serde_json::Map::new();

    for mode in Mode::iter().filter(|&m| m != Mode::Off) {
        let mut mode_map = serde_json::Map::new();

        for fan in Fan::iter() {
            let mut fan_map = serde_json::Map::new();

            for temperature in TEMP_MIN as u8..=TEMP_MAX as u8 {
                let state = ThermostatState {
                    mode,
                    target_temperature: temperature as f32,
                    fan,
                    swing: Swing::Off,
                };
                fan_map.insert(temperature.to_string(), encode_state(&state)?.into());
            }

            mode_map.insert(fan.as_ref().to_owned(), fan_map.into());
        }

        commands.insert(mode.as_ref().to_owned(), mode_map.into());
    }

    let off = ThermostatState {
        mode: Mode::Off,
        ..ThermostatState::default()
    };
    commands.insert(Mode::Off.as_ref().to_owned(), encode_state(&off)?.into());

    Ok(CodeFile {
        manufacturer: "ARG".into(),
        supported_models: vec!["KKG26A-C1".into()],
        supported_controller: "Broadlink".into(),
        commands_encoding: "Base64".into(),
        min_temperature: TEMP_MIN,
        max_temperature: TEMP_MAX,
        precision: arg::TEMP_STEP,
        operation_modes: Mode::iter()
            .filter(|&m| m != Mode::Off)
            .map(|m| m.as_ref().to_owned())
            .collect(),
        fan_modes: Fan::iter().map(|f| f.as_ref().to_owned()).collect(),
        commands: commands.into(),
    })
}

fn encode_state(state: &ThermostatState) -> Result<String, CodecError> {
    let mut data = TransmitData::new();
    arg::encode(state, &mut data);
    create_codec(CodecType::Base64).encode(&Recording::from(data))
}
