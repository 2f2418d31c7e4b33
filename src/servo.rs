//! # Servo coupler (C4)
//!
//! Finds the locally attached smart servo's factory ID via broadcast
//! ping, then pins its status-return level so it only talks back on
//! READ. Both phases are bounded in their inner retry budget
//! (`SERVO_COMM_ATTEMPTS`) but unbounded in outer iterations: a module
//! without a servo attached is not expected to ever leave this
//! procedure. That is intentional for embedded bring-up — a
//! safety-critical deployment would add a hard ceiling and a fault LED,
//! which this crate does not attempt to guess at.

use crate::cmd::servo::{ping_cmd, read_cmd, reset_cmd, write_cmd, ServoReader, ServoReply};
use crate::config::{SERVO_ADDR_ID, SERVO_ADDR_STATUS_RETURN_LEVEL, SERVO_BROADCAST_ID, SERVO_COMM_ATTEMPTS, STATUS_RET_LEVEL};
use crate::hal::{Hal, Role};
use crate::{Module, UNKNOWN_SERVO_ID};

impl<H: Hal> Module<H> {
    /// Run both coupling phases to completion, then enter `Wait`.
    /// Blocks the caller — this is meant to run once, at power-up,
    /// before the main loop starts.
    pub fn couple_servo(&mut self) {
        if self.servo_id == UNKNOWN_SERVO_ID {
            self.discover_servo_id();
        }
        self.pin_status_return_level();
        self.switch_to(Role::Wait);
    }

    /// Phase A: discover the attached servo's factory ID via broadcast
    /// PING, retrying up to [`SERVO_COMM_ATTEMPTS`] times per outer
    /// attempt. Unbounded in outer attempts by design.
    fn discover_servo_id(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::debug!("servo: discovering id");
        loop {
            for _ in 0..SERVO_COMM_ATTEMPTS {
                if let Some(reply) = self.send_servo_cmd(&ping_cmd(SERVO_BROADCAST_ID)) {
                    if reply.error == 0 && reply.src <= 253 {
                        self.servo_id = reply.src;
                        #[cfg(feature = "defmt")]
                        defmt::debug!("servo: found id={}", reply.src);
                        return;
                    }
                }
            }
            // Retry budget exhausted for this attempt. The reference
            // source has a RESET-broadcast recovery hook here, disabled
            // by default; expose it only behind the feature flag.
            #[cfg(feature = "recovery-hooks")]
            if self.config.enable_servo_reset_recovery {
                self.send_servo_cmd(&reset_cmd(SERVO_BROADCAST_ID));
            }
        }
    }

    /// Phase B: pin the servo's status-return level to
    /// [`STATUS_RET_LEVEL`] (reply only to READs), retrying up to
    /// [`SERVO_COMM_ATTEMPTS`] times per outer attempt. Unbounded in
    /// outer attempts by design.
    fn pin_status_return_level(&mut self) {
        loop {
            for _ in 0..SERVO_COMM_ATTEMPTS {
                let cmd = read_cmd(self.servo_id, SERVO_ADDR_STATUS_RETURN_LEVEL);
                if let Some(reply) = self.send_servo_cmd(&cmd) {
                    if reply.error == 0 && reply.param == STATUS_RET_LEVEL {
                        #[cfg(feature = "defmt")]
                        defmt::debug!("servo: status-return level pinned");
                        return;
                    }
                }
            }
            #[cfg(feature = "recovery-hooks")]
            if self.config.enable_status_return_write_recovery {
                let cmd = write_cmd(self.servo_id, SERVO_ADDR_STATUS_RETURN_LEVEL, STATUS_RET_LEVEL);
                self.send_servo_cmd(&cmd);
            }
        }
    }

    /// Invoked from `crate::routing` when the master assigns an ID that
    /// differs from the servo's current ID: rewrite the servo's EEPROM
    /// ID to match, then confirm via broadcast ping before returning to
    /// `Wait`.
    pub(crate) fn reid_servo(&mut self) {
        while self.id != self.servo_id {
            let write = write_cmd(self.servo_id, SERVO_ADDR_ID, self.id);
            self.transmit_servo_cmd(&write);

            let mut confirmed = false;
            for _ in 0..SERVO_COMM_ATTEMPTS {
                if let Some(reply) = self.send_servo_cmd(&ping_cmd(SERVO_BROADCAST_ID)) {
                    if reply.error == 0 && reply.src == self.id {
                        self.servo_id = self.id;
                        confirmed = true;
                        break;
                    }
                }
            }
            if confirmed {
                break;
            }
        }
        self.switch_to(Role::Wait);
    }

    /// Emit one servo command without waiting for a reply (used for the
    /// re-ID procedure's WRITE, which the vendor servo does not ack).
    fn transmit_servo_cmd(&mut self, cmd: &[u8]) {
        self.switch_to(Role::MyResponse);
        self.emit_on_both_groups(cmd);
    }

    /// Emit one servo command and listen for its reply: `MyResponse` to
    /// transmit, then `ServoInit` to receive, bounded by the armed
    /// timeout timer (`ServoInit` arms its timer on entry). Returns
    /// `None` on timeout.
    fn send_servo_cmd(&mut self, cmd: &[u8]) -> Option<ServoReply> {
        self.switch_to(Role::MyResponse);
        self.emit_on_both_groups(cmd);
        self.switch_to(Role::ServoInit);

        let hal = &mut self.hal;
        let mut reader = ServoReader::new();
        crate::timeout::wait_until(&self.timeout, || {
            while let Ok(byte) = hal.read_byte() {
                if let Some(reply) = reader.push(byte) {
                    return Some(reply);
                }
            }
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_support::SimHal;

    fn reply_bytes(src: u8, len: u8, error: u8, param: u8) -> [u8; 7] {
        [0xFF, 0xFF, src, len, error, param, 0]
    }

    #[test]
    fn discovers_servo_id_from_ping_reply() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.hal.push_wire_bytes(&reply_bytes(7, 2, 0, 0));
        module.discover_servo_id();
        assert_eq!(module.servo_id, 7);
    }

    #[test]
    fn pins_status_return_level_on_matching_reply() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.servo_id = 7;
        module.hal.push_wire_bytes(&reply_bytes(7, 2, 0, STATUS_RET_LEVEL));
        module.pin_status_return_level();
        // Reaching here without looping forever is the assertion: the
        // matching reply must have been accepted.
    }

    #[test]
    fn reid_writes_then_confirms_with_ping() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.id = 3;
        module.servo_id = 1;
        // WRITE is fire-and-forget; only the subsequent broadcast PING
        // gets a reply queued up.
        module.hal.push_wire_bytes(&reply_bytes(3, 2, 0, 0));
        module.reid_servo();
        assert_eq!(module.servo_id, 3);
        assert_eq!(module.state(), Role::Wait);
    }
}
