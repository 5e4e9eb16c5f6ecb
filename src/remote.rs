//! Mark/space transmit and receive primitives with tolerant duration matching

use std::time::Duration;

/// Default tolerance used when matching received durations, in percent
pub const DEFAULT_TOLERANCE: u32 = 25;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Rule {
    pub duration: Duration,
    pub tolerance: Duration,
}

impl Rule {
    pub fn new(duration: Duration) -> Self {
        Self::with_tolerance(duration, DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(duration: Duration, percent: u32) -> Self {
        Self {
            duration,
            tolerance: duration * percent / 100,
        }
    }

    pub fn matches(&self, duration: Duration) -> bool {
        let diff = self
            .duration
            .checked_sub(duration)
            .unwrap_or_else(|| duration - self.duration);
        diff <= self.tolerance
    }
}

/// Sink for an outgoing pulse train
pub trait Transmitter {
    type Error;

    fn set_carrier_frequency(&mut self, hz: u32);
    fn mark(&mut self, duration: Duration);
    fn space(&mut self, duration: Duration);

    /// Emits everything queued since the last call
    fn perform(&mut self) -> Result<(), Self::Error>;
}

/// Source of a received pulse train.
///
/// A failed expectation must not consume anything, so callers can try several
/// alternatives at the same position.
pub trait Receiver {
    fn expect_item(&mut self, mark: Duration, space: Duration) -> bool;
    fn expect_mark(&mut self, mark: Duration) -> bool;
}

/// Collects a pulse train in memory, alternating mark and space durations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransmitData {
    pub carrier_frequency: Option<u32>,
    pub pulses: Vec<Duration>,
}

impl TransmitData {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, duration: Duration, is_mark: bool) {
        // Consecutive items of the same kind are merged into one pulse
        if self.pulses.len() % 2 == usize::from(is_mark) {
            if let Some(last) = self.pulses.last_mut() {
                *last += duration;
                return;
            }
        }
        if self.pulses.is_empty() && !is_mark {
            return;
        }
        self.pulses.push(duration);
    }
}

impl Transmitter for TransmitData {
    type Error = std::convert::Infallible;

    fn set_carrier_frequency(&mut self, hz: u32) {
        self.carrier_frequency = Some(hz);
    }

    fn mark(&mut self, duration: Duration) {
        self.push(duration, true);
    }

    fn space(&mut self, duration: Duration) {
        self.push(duration, false);
    }

    fn perform(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walks a recorded pulse train, marks at even indices and spaces at odd ones
#[derive(Debug, Clone)]
pub struct ReceiveData<'a> {
    pulses: &'a [Duration],
    index: usize,
    tolerance: u32,
}

impl<'a> ReceiveData<'a> {
    pub fn new(pulses: &'a [Duration]) -> Self {
        Self::with_tolerance(pulses, DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(pulses: &'a [Duration], tolerance: u32) -> Self {
        Self {
            pulses,
            index: 0,
            tolerance,
        }
    }

    pub fn position(&self) -> usize {
        self.index
    }

    fn peek_matches(&self, offset: usize, expected: Duration) -> bool {
        self.pulses
            .get(self.index + offset)
            .map(|&d| Rule::with_tolerance(expected, self.tolerance).matches(d))
            .unwrap_or(false)
    }
}

impl Receiver for ReceiveData<'_> {
    fn expect_item(&mut self, mark: Duration, space: Duration) -> bool {
        if self.index % 2 != 0 || !self.peek_matches(0, mark) || !self.peek_matches(1, space) {
            return false;
        }
        self.index += 2;
        true
    }

    fn expect_mark(&mut self, mark: Duration) -> bool {
        if self.index % 2 != 0 || !self.peek_matches(0, mark) {
            return false;
        }
        self.index += 1;
        true
    }
}
