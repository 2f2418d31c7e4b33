//! # Discovery/routing state machine (C5)
//!
//! The top-level loop: interpret one frame arriving while `STATE == Wait`,
//! then act — respond, forward to a child, or reconfigure. This is the
//! largest piece of the module's behavior: a flat dispatch over a small
//! set of top-level commands, each a short, self-contained function.

use crate::cmd::frame::{FrameType, ModuleFrame};
use crate::config::{BROADCAST_ID, DEFAULT_ID, MASTER_ID, MAX_ASSIGNED_ID, MIN_ASSIGNED_ID};
use crate::hal::{Hal, Role};
use crate::Module;

impl<H: Hal> Module<H> {
    /// Drain whatever bytes are available from the peripheral and feed
    /// them to the frame reader; dispatch at most one complete frame per
    /// call. A no-op outside `Role::Wait` — frames are only meaningful
    /// to this state machine while listening for the master.
    pub fn poll(&mut self) {
        if self.state != Role::Wait {
            return;
        }
        while let Ok(byte) = self.hal.read_byte() {
            if let Some(frame) = self.frame_reader.push(byte) {
                self.handle_frame(frame);
                return;
            }
        }
    }

    /// Dispatch table, evaluated in order of frame type then condition.
    fn handle_frame(&mut self, frame: ModuleFrame) {
        match frame.kind {
            FrameType::Hello => self.handle_hello(),
            FrameType::Ping => self.handle_ping(frame.dst),
            FrameType::IdAssign => self.handle_id_assign(frame.dst, frame.param),
            FrameType::ClearConfig => self.handle_clear_config(frame.dst),
            // ID_ASSIGN_OK and CONFIG_CLEARED are replies a slave emits,
            // never one it acts on; falls into the table's "anything
            // else" row.
            FrameType::IdAssignOk | FrameType::ConfigCleared => {}
        }
    }

    fn handle_hello(&mut self) {
        if !self.configured {
            self.say_hello();
        } else if self.child == 0 {
            if self.child_listen() {
                self.say_hello();
            }
        } else {
            self.child_response();
        }
    }

    fn handle_ping(&mut self, dst: u8) {
        if dst == self.id {
            self.ping_response();
        } else if dst > self.id {
            self.child_response();
        }
    }

    fn handle_id_assign(&mut self, dst: u8, param: u8) {
        if dst == self.id && (MIN_ASSIGNED_ID..=MAX_ASSIGNED_ID).contains(&param) {
            self.id = param;
            self.configured = true;
            self.assigned_id();
            if self.id != self.servo_id {
                self.reid_servo();
            }
        } else if dst > self.id {
            self.child_response();
        }
    }

    fn handle_clear_config(&mut self, dst: u8) {
        if dst == self.id {
            self.config_cleared();
            self.clear();
        } else if dst == BROADCAST_ID || dst <= self.id {
            self.clear();
        }
    }

    /// `HELLO` reply: own ID as source, param carries the known child
    /// letter (`0` until one has been detected).
    fn say_hello(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::trace!("routing: say_hello child={}", self.child);
        let frame = ModuleFrame::new(self.id, MASTER_ID, FrameType::Hello, self.child);
        self.send_response(frame);
    }

    /// `PING` reply addressed to this module.
    fn ping_response(&mut self) {
        let frame = ModuleFrame::new(self.id, MASTER_ID, FrameType::Ping, 0);
        self.send_response(frame);
    }

    /// Acknowledge a just-accepted `ID_ASSIGN` with `ID_ASSIGN_OK`, using
    /// the *new* ID as source (the assignment already happened by the
    /// time this is called).
    fn assigned_id(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::debug!("routing: id assigned id={}", self.id);
        let frame = ModuleFrame::new(self.id, MASTER_ID, FrameType::IdAssignOk, 0);
        self.send_response(frame);
    }

    /// Acknowledge a targeted `CLEAR_CONFIG` with `CONFIG_CLEARED`, using
    /// the *current* (pre-clear) ID as source.
    fn config_cleared(&mut self) {
        let frame = ModuleFrame::new(self.id, MASTER_ID, FrameType::ConfigCleared, 0);
        self.send_response(frame);
    }

    /// Enter `MyResponse`, emit one frame on both TX groups, return to
    /// `Wait`.
    fn send_response(&mut self, frame: ModuleFrame) {
        self.switch_to(Role::MyResponse);
        self.emit_on_both_groups(&frame.encode());
        self.switch_to(Role::Wait);
    }

    /// Probe all four downstream ports for a hello. Sets `CHILD` and
    /// returns `true` if one answered before the `HELLO` timer elapsed.
    fn child_listen(&mut self) -> bool {
        self.switch_to(Role::HelloListen);
        let hal = &mut self.hal;
        let heard = crate::timeout::wait_until(&self.timeout, || hal.poll_child_hello());
        self.switch_to(Role::Wait);
        match heard {
            Some(port) => {
                self.child = port;
                true
            }
            None => false,
        }
    }

    /// Listen on the child port already known from a prior hello, until
    /// its END byte is observed or the channel's timer elapses. Only
    /// signals "a child responded" — the child's own transmission is
    /// what propagates upstream on the shared bus, not anything this
    /// function forwards itself.
    fn child_response(&mut self) {
        let child = self.child;
        let Some(role) = Role::for_child(child) else {
            return;
        };
        self.switch_to(role);
        let hal = &mut self.hal;
        crate::timeout::wait_until(&self.timeout, || {
            if hal.poll_child_end(child) {
                Some(())
            } else {
                None
            }
        });
        self.hal.timer(role).stop();
        self.switch_to(Role::Wait);
    }

    /// `CLEAR_CONFIG`'s effect: back to the unassigned default. Leaves
    /// `SERVO_ID` untouched.
    fn clear(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::debug!("routing: clear config");
        self.id = DEFAULT_ID;
        self.configured = false;
        self.child = 0;
        self.hal.set_led(false);
    }
}
