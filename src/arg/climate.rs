use log::{debug, warn};

use super::{decode, encode, Fan, Mode, Swing, ThermostatState, TEMP_MAX, TEMP_MIN, TEMP_STEP};
use crate::remote::{Receiver, Transmitter};

/// Receives every state successfully decoded from the remote
pub trait StateSink {
    fn publish_state(&mut self, state: &ThermostatState);
}

impl<F: FnMut(&ThermostatState)> StateSink for F {
    fn publish_state(&mut self, state: &ThermostatState) {
        self(state)
    }
}

/// What the unit supports, as advertised to a host
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateTraits {
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub temperature_step: f32,
    pub supports_cool: bool,
    pub supports_heat: bool,
    pub modes: Vec<Mode>,
    pub fan_modes: Vec<Fan>,
    pub swing_modes: Vec<Swing>,
}

/// Keeps the last known state of an ARG unit and wires it to an IR transmitter,
/// an IR receiver and a state sink
pub struct ArgClimate<S> {
    state: ThermostatState,
    sink: S,
}

impl<S> ArgClimate<S> {
    pub fn traits() -> ClimateTraits {
        ClimateTraits {
            min_temperature: TEMP_MIN,
            max_temperature: TEMP_MAX,
            temperature_step: TEMP_STEP,
            supports_cool: true,
            supports_heat: true,
            modes: vec![
                Mode::Off,
                Mode::Auto,
                Mode::Cool,
                Mode::Heat,
                Mode::Dry,
                Mode::FanOnly,
            ],
            fan_modes: vec![Fan::Auto, Fan::Low, Fan::Medium, Fan::High],
            swing_modes: vec![Swing::Off, Swing::Vertical, Swing::Horizontal, Swing::Both],
        }
    }
}

impl<S: StateSink> ArgClimate<S> {
    pub fn new(state: ThermostatState, sink: S) -> Self {
        Self { state, sink }
    }

    pub fn state(&self) -> &ThermostatState {
        &self.state
    }

    /// Stores a new target state and sends it to the unit
    pub fn control<T: Transmitter>(
        &mut self,
        state: ThermostatState,
        transmitter: &mut T,
    ) -> Result<(), T::Error> {
        self.state = state;
        self.transmit_state(transmitter)
    }

    pub fn transmit_state<T: Transmitter>(&self, transmitter: &mut T) -> Result<(), T::Error> {
        let state = ThermostatState {
            target_temperature: clamp_temperature(self.state.target_temperature),
            ..self.state
        };
        encode(&state, transmitter);
        transmitter.perform()
    }

    /// Returns false when the pulses aren't a valid frame, in which case the
    /// state is left untouched
    pub fn on_receive(&mut self, receiver: &mut impl Receiver) -> bool {
        match decode(receiver, &self.state) {
            Ok(state) => {
                self.state = state;
                self.sink.publish_state(&self.state);
                true
            }
            Err(e) => {
                debug!("Not an ARG frame: {}", e);
                false
            }
        }
    }
}

/// Clamps to the supported range; NaN falls back to the minimum
pub fn clamp_temperature(temperature: f32) -> f32 {
    if temperature.is_nan() {
        warn!("Target temperature is not a number, using {}", TEMP_MIN);
        return TEMP_MIN;
    }
    temperature.clamp(TEMP_MIN, TEMP_MAX)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use super::*;
    use crate::remote::{ReceiveData, TransmitData};

    type Published = Rc<RefCell<Vec<ThermostatState>>>;

    fn recorder() -> (ArgClimate<impl FnMut(&ThermostatState)>, Published) {
        let published: Published = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let published = published.clone();
            move |state: &ThermostatState| published.borrow_mut().push(*state)
        };
        (ArgClimate::new(ThermostatState::default(), sink), published)
    }

    #[test]
    fn test_transmit_clamps_temperature() {
        let (mut climate, _) = recorder();
        let mut data = TransmitData::new();
        climate
            .control(
                ThermostatState {
                    mode: Mode::Cool,
                    target_temperature: 40.0,
                    fan: Fan::Auto,
                    swing: Swing::Off,
                },
                &mut data,
            )
            .unwrap();

        // The stored target is kept as requested, only the sent one is clamped
        assert_eq!(climate.state().target_temperature, 40.0);

        let (mut receiver_climate, published) = recorder();
        assert!(receiver_climate.on_receive(&mut ReceiveData::new(&data.pulses)));
        assert_eq!(receiver_climate.state().target_temperature, 32.0);
        assert_eq!(published.borrow().len(), 1);
    }

    #[test]
    fn test_receive_publishes_once() {
        let (mut sender, _) = recorder();
        let state = ThermostatState {
            mode: Mode::Heat,
            target_temperature: 22.0,
            fan: Fan::Medium,
            swing: Swing::Both,
        };
        let mut data = TransmitData::new();
        sender.control(state, &mut data).unwrap();

        let (mut climate, published) = recorder();
        assert!(climate.on_receive(&mut ReceiveData::new(&data.pulses)));
        assert_eq!(*climate.state(), state);
        assert_eq!(*published.borrow(), vec![state]);
    }

    #[test]
    fn test_invalid_frame_leaves_state_untouched() {
        let mut data = TransmitData::new();
        let (sender, _) = recorder();
        sender.transmit_state(&mut data).unwrap();
        let last = data.pulses.len() - 1;
        data.pulses[last] = Duration::from_micros(5000);

        let (mut climate, published) = recorder();
        let before = *climate.state();
        assert!(!climate.on_receive(&mut ReceiveData::new(&data.pulses)));
        assert_eq!(*climate.state(), before);
        assert!(published.borrow().is_empty());
    }

    #[test]
    fn test_clamp_temperature() {
        assert_eq!(clamp_temperature(10.0), 16.0);
        assert_eq!(clamp_temperature(24.0), 24.0);
        assert_eq!(clamp_temperature(33.5), 32.0);
        assert_eq!(clamp_temperature(f32::NAN), 16.0);
    }

    #[test]
    fn test_traits() {
        let traits = ArgClimate::<()>::traits();
        assert_eq!(traits.min_temperature, 16.0);
        assert_eq!(traits.max_temperature, 32.0);
        assert_eq!(traits.fan_modes.len(), 4);
        assert_eq!(traits.swing_modes.len(), 4);
    }
}
