//! # Wire constants and compile-time configuration
//!
//! Every magic number the module protocol and the servo sub-protocol rely
//! on lives here as a named constant, plus the small [`Config`] struct
//! carrying the handful of knobs a specific deployment may want to flip.

/// This module's identity before the master assigns a real one.
pub const DEFAULT_ID: u8 = 251;
/// Fixed identity of the root/master node.
pub const MASTER_ID: u8 = 0;
/// Destination meaning "every module on the bus".
pub const BROADCAST_ID: u8 = 254;
/// Lowest valid assigned ID.
pub const MIN_ASSIGNED_ID: u8 = 1;
/// Highest valid assigned ID.
pub const MAX_ASSIGNED_ID: u8 = 250;

/// Module-frame start byte, repeated twice on the wire.
pub const FRAME_START: u8 = 0xF8;
/// Module-frame end byte, repeated twice on the wire.
pub const FRAME_END: u8 = 0x55;

/// Servo-frame start byte, repeated twice on the wire.
pub const SERVO_START: u8 = 0xFF;
/// Broadcast ID on the servo sub-bus (vendor convention).
pub const SERVO_BROADCAST_ID: u8 = 0xFE;

/// EEPROM address of the servo's ID register.
pub const SERVO_ADDR_ID: u8 = 3;
/// EEPROM address of the servo's status-return-level register.
pub const SERVO_ADDR_STATUS_RETURN_LEVEL: u8 = 16;

/// Status-return level this firmware insists on: reply only to READ.
pub const STATUS_RET_LEVEL: u8 = 1;

/// Bounded retry budget shared by every servo-coupling exchange.
pub const SERVO_COMM_ATTEMPTS: u8 = 10;

/// Shared timeout period armed on every role transition that needs one
/// (`Role::needs_timer`): long enough for a full eight-byte module frame
/// or a six/eight-byte servo command to cross the wire at the deployment
/// baud rate, short enough that a silent port is noticed promptly.
pub const ROLE_TIMEOUT: embassy_time::Duration = embassy_time::Duration::from_millis(50);

/// Deployment knobs. Both recovery hooks default to disabled and are
/// only consulted when the `recovery-hooks` feature is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Broadcast a servo RESET to widen the response window after
    /// [`SERVO_COMM_ATTEMPTS`] failed discovery pings.
    pub enable_servo_reset_recovery: bool,
    /// Force the status-return level with a WRITE instead of only polling
    /// for it, once Phase B of servo coupling exhausts its retry budget.
    pub enable_status_return_write_recovery: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            enable_servo_reset_recovery: false,
            enable_status_return_write_recovery: false,
        }
    }
}
