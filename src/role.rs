//! # Port-role controller (C2)
//!
//! `switch_to` is the crate's one hardware-reconfiguration primitive:
//! every role transition — including the very first one out of cold
//! start — flows through the same quiesce → unload → load → arm →
//! settle → publish sequence. No component is allowed to reach into the
//! peripheral set directly; they all go through this.

use crate::hal::{Hal, Role};
use crate::Module;

impl<H: Hal> Module<H> {
    /// Reconfigure the single UART peripheral to `role`, guaranteeing a
    /// clean handover: pins quiesced, the previous role's peripheral set
    /// torn down, the new one loaded and armed, and (for `MyResponse`
    /// only) a settlement delay before any byte may be emitted.
    ///
    /// Never call this from within an ISR — nothing here does, since the
    /// whole crate runs on the main-loop side of that boundary.
    pub fn switch_to(&mut self, role: Role) {
        // 1. Quiesce: drive the shared-bus pins high and detach them
        // before anything is torn down, so a half-reconfigured peer
        // never samples a spurious start bit on this module's pins.
        self.hal.quiesce_pins();

        // 2. Unload: tear down whatever was loaded. `STATE == None` is
        // the one-time cold-start path and tears down every known role
        // blindly rather than just one.
        self.hal.unload(self.state);

        // 3. Load: install the new role's peripheral configuration and
        // start its receiver(s)/transmitter(s) with no parity.
        self.hal.load(role);

        // 4. Arm the role's timeout timer, if it has one.
        if role.needs_timer() {
            self.hal.timer(role).start(crate::config::ROLE_TIMEOUT);
        }

        // 5. Settle: only `MyResponse` waits out a full timeout period
        // before any byte may leave this module, giving peers time to
        // finish their own handover first.
        if role == Role::MyResponse {
            self.hal.settle();
        }

        // 6. Publish: commit the new role, then reattach the bus and
        // update the configured-status LED/servo-ID display to match.
        self.state = role;
        self.hal.attach_pins(self.configured);
        self.hal.set_led(self.configured);
        if self.configured {
            if let Some(pattern) = crate::gpio::servo_id_pattern(self.id) {
                self.hal.set_servo_id_pattern(pattern);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SimHal;
    use crate::config::Config;

    #[test]
    fn switch_to_publishes_role_and_quiesces_first() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.switch_to(Role::Wait);
        assert_eq!(module.state(), Role::Wait);
        assert!(module.hal.quiesced, "quiesce_pins must run on every transition");
    }

    #[test]
    fn cold_start_unloads_with_state_none() {
        let mut module = Module::new(SimHal::new(), Config::default());
        assert_eq!(module.state(), Role::None);
        module.switch_to(Role::Wait);
        assert_eq!(module.hal.unloaded_with, Some(Role::None));
    }

    #[test]
    fn my_response_settles_before_publish() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.switch_to(Role::MyResponse);
        assert!(module.hal.settled, "MyResponse must settle before transmitting");
    }

    #[test]
    fn bus_attach_follows_configured_flag() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.switch_to(Role::Wait);
        assert_eq!(module.hal.attach_all, false);
        module.configured = true;
        module.switch_to(Role::Wait);
        assert_eq!(module.hal.attach_all, true);
    }

    #[test]
    fn wait_does_not_arm_a_timer() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.switch_to(Role::Wait);
        assert!(!module.hal.timer.running, "Wait has no bound on how long it may listen");
    }

    #[test]
    fn my_response_arms_its_timer() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.switch_to(Role::MyResponse);
        assert!(module.hal.timer.running);
    }

    #[test]
    fn publish_maps_id_through_servo_id_pattern() {
        let mut module = Module::new(SimHal::new(), Config::default());
        module.configured = true;
        module.id = 3;
        module.switch_to(Role::Wait);
        assert_eq!(module.hal.servo_id_pattern, crate::gpio::servo_id_pattern(3).unwrap());
    }
}
