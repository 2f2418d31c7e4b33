//! # Peripheral collaborator interface
//!
//! The UART peripheral driver, the hardware-reconfiguration primitives,
//! GPIO bit-bang, and timer start/stop are captured here as a small
//! trait set, expressed as `embedded_hal`-style trait bounds rather than
//! concrete peripheral types. [`Role`] is the sum type the port-role
//! controller (`crate::role`) drives these traits with.

use embassy_time::Duration;
use embedded_hal::digital::OutputPin;

/// The six mutually exclusive UART configurations the MCU's single UART
/// peripheral can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Cold-start sentinel: no peripheral is loaded yet. `switch_to` on
    /// this role tears down *every* known role blindly (the one-time
    /// cold-start path).
    None,
    Wait,
    MyResponse,
    Resp1,
    Resp2,
    Resp3,
    Resp4,
    HelloListen,
    ServoInit,
}

impl Role {
    /// `Resp1..Resp4` corresponding to a detected child port letter.
    pub fn for_child(child: u8) -> Option<Role> {
        match child {
            b'A' => Some(Role::Resp1),
            b'B' => Some(Role::Resp2),
            b'C' => Some(Role::Resp3),
            b'D' => Some(Role::Resp4),
            _ => None,
        }
    }

    /// Whether this role arms a timeout timer on entry. Every role but
    /// the cold-start sentinel and `Wait` has one: `MyResponse` arms its
    /// setup timer, receive-like roles arm theirs; `Wait` listens for the
    /// next frame with no bound on how long that may take.
    pub fn needs_timer(self) -> bool {
        !matches!(self, Role::None | Role::Wait)
    }
}

/// Which of the two transmit groups a frame goes out on. `MyResponse`
/// always drives both, so a parent sees the reply regardless of which
/// port it owns it from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxGroup {
    /// Ports 0, 1, 4.
    Tx014,
    /// Ports 2, 3.
    Tx23,
}

/// Non-blocking byte-oriented access to whichever UART role is currently
/// loaded. Peek is non-destructive (`cReadChar`) and has no equivalent in
/// `embedded-hal-nb`'s serial traits, so it stays a method of its own;
/// destructive read forwards to [`embedded_hal_nb::serial::Read`], which
/// is the supertrait bound here rather than a hand-rolled duplicate.
/// Both are `nb`-style: `Err(nb::Error::WouldBlock)` means "nothing yet",
/// never a hard failure.
pub trait UartRx: embedded_hal_nb::serial::Read<u8, Error = crate::Error> {
    fn peek_byte(&mut self) -> nb::Result<u8, crate::Error>;

    fn read_byte(&mut self) -> nb::Result<u8, crate::Error> {
        embedded_hal_nb::serial::Read::read(self)
    }
}

/// Non-blocking byte-oriented transmit on one TX group. Each group's
/// underlying writer is an [`embedded_hal_nb::serial::Write`]; `put_byte`
/// and `tx_complete` are thin forwards onto `write`/`flush` rather than a
/// parallel API.
pub trait UartTx {
    /// Concrete writer backing both TX groups.
    type Writer: embedded_hal_nb::serial::Write<u8, Error = crate::Error>;

    /// Borrow the writer for one TX group.
    fn tx_mut(&mut self, group: TxGroup) -> &mut Self::Writer;

    fn put_byte(&mut self, group: TxGroup, byte: u8) -> nb::Result<(), crate::Error> {
        embedded_hal_nb::serial::Write::write(self.tx_mut(group), byte)
    }

    /// `Ok(())` once the writer reports flushed; `Err(WouldBlock)` while
    /// bytes are still draining out of the peripheral.
    fn tx_complete(&mut self, group: TxGroup) -> bool {
        matches!(embedded_hal_nb::serial::Write::flush(self.tx_mut(group)), Ok(()))
    }
}

/// One hardware timer, armed by the port-role controller for a fixed
/// [`Duration`] and polled by callers via [`crate::timeout::Timeout`].
pub trait Timer {
    fn start(&mut self, duration: Duration);
    fn stop(&mut self);
}

/// The five shared-bus pins the port-role controller quiesces/attaches as
/// a unit, plus the per-role `load`/`unload` primitives.
pub trait Hal: UartRx + UartTx {
    /// Per-role timer, selected by the caller (`crate::role`) — one
    /// logical timer per role.
    type Timer: Timer;

    /// Drive all five shared-bus pins high and detach them from the
    /// global bus. Must be called before any peripheral is torn down.
    fn quiesce_pins(&mut self);

    /// Tear down the peripheral configuration associated with `role`.
    /// Called with `role == Role::None` exactly once, at cold start, to
    /// blindly tear down every known role.
    fn unload(&mut self, role: Role);

    /// Install the peripheral configuration for `role` and start its
    /// receiver(s)/transmitter(s) with no parity.
    fn load(&mut self, role: Role);

    /// Borrow the timer associated with `role`. Roles with no associated
    /// timer (`Role::None`) are never passed here.
    fn timer(&mut self, role: Role) -> &mut Self::Timer;

    /// Block for one settlement period (the single timeout period used
    /// before `MyResponse` may emit its first byte).
    fn settle(&mut self);

    /// Attach all five shared-bus pins (when `configured`) or only pin 0
    /// (when not), completing the handover the quiesce step started.
    fn attach_pins(&mut self, configured: bool);

    /// Configured-status LED, active low.
    fn set_led(&mut self, on: bool);

    /// Servo-ID display: drives whichever six-value bit pattern
    /// [`crate::gpio::servo_id_pattern`] maps a logical ID to. Diagnostic
    /// only; IDs with no mapped pattern never reach this method.
    fn set_servo_id_pattern(&mut self, pattern: u8);

    /// Only meaningful in `Role::HelloListen`: has a START byte been seen
    /// on one of the four `HELLO_1..4` receivers? Returns the
    /// corresponding port letter the first time it fires.
    fn poll_child_hello(&mut self) -> Option<u8>;

    /// Only meaningful in `Role::Resp1..Resp4`: has an END byte been seen
    /// on the specific child receiver matching `child`?
    fn poll_child_end(&mut self, child: u8) -> bool;
}

/// Convenience no-op so downstream code can name `impl OutputPin` without
/// this crate depending on a concrete pin type; re-exported for HAL
/// implementers wiring up `quiesce_pins`/`attach_pins` from individual
/// `OutputPin`s.
pub fn drive_high<P: OutputPin>(pin: &mut P) {
    let _ = pin.set_high();
}
