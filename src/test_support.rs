//! Host-only `Hal` test double. Not part of the public API — this is the
//! one "hardware" the crate's own test suite runs against, standing in
//! for the real peripheral set the way a simulated bus stands in for a
//! physical one.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use embassy_time::Duration;

use crate::hal::{Hal, Role, Timer, TxGroup, UartRx, UartTx};

#[derive(Debug, Default)]
pub struct SimTimer {
    pub running: bool,
    pub armed_for: Option<Duration>,
}

impl Timer for SimTimer {
    fn start(&mut self, duration: Duration) {
        self.running = true;
        self.armed_for = Some(duration);
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// One TX group's byte sink. Wraps a plain `Vec<u8>` so it can carry a
/// real `embedded_hal_nb::serial::Write` impl — tests still read it as a
/// byte buffer via `Deref`.
#[derive(Debug, Default)]
pub struct ByteSink(pub Vec<u8>);

impl Deref for ByteSink {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl DerefMut for ByteSink {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }
}

impl<const N: usize> PartialEq<[u8; N]> for ByteSink {
    fn eq(&self, other: &[u8; N]) -> bool {
        self.0 == *other
    }
}

impl embedded_hal_nb::serial::ErrorType for ByteSink {
    type Error = crate::Error;
}

impl embedded_hal_nb::serial::Write<u8> for ByteSink {
    fn write(&mut self, word: u8) -> nb::Result<(), crate::Error> {
        self.0.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), crate::Error> {
        Ok(())
    }
}

/// In-memory peripheral double. Tests preload `rx` with wire bytes and
/// inspect `tx_014`/`tx_23` for what the module under test emitted.
pub struct SimHal {
    pub rx: VecDeque<u8>,
    pub tx_014: ByteSink,
    pub tx_23: ByteSink,

    pub quiesced: bool,
    pub unloaded_with: Option<Role>,
    pub loaded_with: Option<Role>,
    pub settled: bool,
    pub attach_all: bool,
    pub led: bool,
    pub servo_id_pattern: u8,
    pub timer: SimTimer,

    /// Queue of (port, is_end) events child_listen/child_response poll.
    pub child_events: VecDeque<(u8, bool)>,
}

impl SimHal {
    pub fn new() -> Self {
        SimHal {
            rx: VecDeque::new(),
            tx_014: ByteSink::default(),
            tx_23: ByteSink::default(),
            quiesced: false,
            unloaded_with: None,
            loaded_with: None,
            settled: false,
            attach_all: false,
            led: false,
            servo_id_pattern: 0,
            timer: SimTimer::default(),
            child_events: VecDeque::new(),
        }
    }

    pub fn push_wire_bytes(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl embedded_hal_nb::serial::ErrorType for SimHal {
    type Error = crate::Error;
}

impl embedded_hal_nb::serial::Read<u8> for SimHal {
    fn read(&mut self) -> nb::Result<u8, crate::Error> {
        self.rx.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

impl UartRx for SimHal {
    fn peek_byte(&mut self) -> nb::Result<u8, crate::Error> {
        self.rx.front().copied().ok_or(nb::Error::WouldBlock)
    }
}

impl UartTx for SimHal {
    type Writer = ByteSink;

    fn tx_mut(&mut self, group: TxGroup) -> &mut ByteSink {
        match group {
            TxGroup::Tx014 => &mut self.tx_014,
            TxGroup::Tx23 => &mut self.tx_23,
        }
    }
}

impl Hal for SimHal {
    type Timer = SimTimer;

    fn quiesce_pins(&mut self) {
        self.quiesced = true;
    }

    fn unload(&mut self, role: Role) {
        self.unloaded_with = Some(role);
    }

    fn load(&mut self, role: Role) {
        self.loaded_with = Some(role);
    }

    fn timer(&mut self, _role: Role) -> &mut Self::Timer {
        &mut self.timer
    }

    fn settle(&mut self) {
        self.settled = true;
    }

    fn attach_pins(&mut self, configured: bool) {
        self.attach_all = configured;
    }

    fn set_led(&mut self, on: bool) {
        self.led = on;
    }

    fn set_servo_id_pattern(&mut self, pattern: u8) {
        self.servo_id_pattern = pattern;
    }

    fn poll_child_hello(&mut self) -> Option<u8> {
        if let Some((port, is_end)) = self.child_events.front().copied() {
            if !is_end {
                self.child_events.pop_front();
                return Some(port);
            }
        }
        None
    }

    fn poll_child_end(&mut self, child: u8) -> bool {
        if let Some(&(port, is_end)) = self.child_events.front() {
            if is_end && port == child {
                self.child_events.pop_front();
                return true;
            }
        }
        false
    }
}
