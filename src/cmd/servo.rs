//! # Servo (vendor AX-12+ compatible) frame encoding/decoding
//!
//! Command direction: `0xFF 0xFF id len instr [addr] [val] checksum`.
//! Reply direction: `0xFF 0xFF src len error param checksum` — the codec
//! only consumes the first five payload bytes on receive and does not
//! validate the checksum (the attached servo is a trusted peer).

use crate::config::SERVO_START;

/// Servo instruction codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoInstr {
    Ping = 1,
    Read = 2,
    Write = 3,
    Reset = 6,
}

/// `checksum = 255 - ((id + len + instr + addr + val) mod 256)`.
///
/// `addr`/`val` are `0` for instructions that omit them (PING, RESET),
/// matching the vendor's own checksum definition over the full 5-byte
/// field regardless of which fields are meaningful.
pub fn checksum(id: u8, len: u8, instr: u8, addr: u8, val: u8) -> u8 {
    let sum = (id as u32) + (len as u32) + (instr as u32) + (addr as u32) + (val as u32);
    255u8.wrapping_sub((sum % 256) as u8)
}

/// Build a PING command (`len = 2`).
pub fn ping_cmd(id: u8) -> [u8; 6] {
    let len = 2;
    let instr = ServoInstr::Ping as u8;
    let c = checksum(id, len, instr, 0, 0);
    [SERVO_START, SERVO_START, id, len, instr, c]
}

/// Build a RESET command (`len = 2`).
pub fn reset_cmd(id: u8) -> [u8; 6] {
    let len = 2;
    let instr = ServoInstr::Reset as u8;
    let c = checksum(id, len, instr, 0, 0);
    [SERVO_START, SERVO_START, id, len, instr, c]
}

/// Build a READ command (`len = 4`): read one byte at `addr`.
pub fn read_cmd(id: u8, addr: u8) -> [u8; 8] {
    let len = 4;
    let instr = ServoInstr::Read as u8;
    let val = 1u8; // number of bytes to read
    let c = checksum(id, len, instr, addr, val);
    [SERVO_START, SERVO_START, id, len, instr, addr, val, c]
}

/// Build a WRITE command (`len = 4`): write `val` at `addr`.
pub fn write_cmd(id: u8, addr: u8, val: u8) -> [u8; 8] {
    let len = 4;
    let instr = ServoInstr::Write as u8;
    let c = checksum(id, len, instr, addr, val);
    [SERVO_START, SERVO_START, id, len, instr, addr, val, c]
}

/// A decoded servo reply: `src, len, error, param`. Like [`super::frame::ModuleFrame`],
/// there is no buffering — a fresh reply overwrites the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoReply {
    pub src: u8,
    pub len: u8,
    pub error: u8,
    pub param: u8,
}

impl ServoReply {
    /// Decode a reply from its first five payload bytes following the
    /// doubled start marker, i.e. `src, len, error, param, checksum`. The
    /// checksum byte is consumed but not checked.
    pub fn decode_payload(payload: [u8; 5]) -> Self {
        ServoReply {
            src: payload[0],
            len: payload[1],
            error: payload[2],
            param: payload[3],
        }
    }
}

/// Incremental reader for servo replies, mirroring [`super::frame::FrameReader`]'s
/// shape but for the servo wire form (single doubled start marker, no end
/// marker — the frame is exactly five payload bytes long after the marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServoReader {
    state: ServoReaderState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServoReaderState {
    Idle,
    SawOneStart,
    Armed { filled: u8, payload: [u8; 5] },
}

impl Default for ServoReaderState {
    fn default() -> Self {
        ServoReaderState::Idle
    }
}

impl ServoReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) -> Option<ServoReply> {
        match self.state {
            ServoReaderState::Idle => {
                if byte == SERVO_START {
                    self.state = ServoReaderState::SawOneStart;
                }
                None
            }
            ServoReaderState::SawOneStart => {
                if byte == SERVO_START {
                    self.state = ServoReaderState::Armed { filled: 0, payload: [0; 5] };
                } else {
                    self.state = ServoReaderState::Idle;
                }
                None
            }
            ServoReaderState::Armed { mut filled, mut payload } => {
                payload[filled as usize] = byte;
                filled += 1;
                if filled < 5 {
                    self.state = ServoReaderState::Armed { filled, payload };
                    None
                } else {
                    self.state = ServoReaderState::Idle;
                    Some(ServoReply::decode_payload(payload))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_law() {
        // WRITE id=1 addr=3 val=3.
        assert_eq!(checksum(1, 4, ServoInstr::Write as u8, 3, 3), 241);
    }

    #[test]
    fn write_cmd_matches_reid_scenario() {
        let cmd = write_cmd(1, 3, 3);
        assert_eq!(cmd, [0xFF, 0xFF, 1, 4, 3, 3, 3, 241]);
    }

    #[test]
    fn reader_decodes_ping_reply() {
        let mut reader = ServoReader::new();
        let bytes = [0xFF, 0xFF, 3, 2, 0, 0, 0];
        let mut got = None;
        for b in bytes {
            if let Some(r) = reader.push(b) {
                got = Some(r);
            }
        }
        let reply = got.expect("reply decoded");
        assert_eq!(reply, ServoReply { src: 3, len: 2, error: 0, param: 0 });
    }

    use proptest::prelude::*;

    proptest! {
        /// `checksum` is defined so the five command fields plus the
        /// checksum byte itself always sum to 255 mod 256, for any
        /// servo-command tuple.
        #[test]
        fn checksum_law_holds(
            id in any::<u8>(),
            len in any::<u8>(),
            instr in any::<u8>(),
            addr in any::<u8>(),
            val in any::<u8>(),
        ) {
            let c = checksum(id, len, instr, addr, val);
            let sum = id as u32 + len as u32 + instr as u32 + addr as u32 + val as u32 + c as u32;
            prop_assert_eq!(sum % 256, 255);
        }

        /// `write_cmd`'s trailing checksum byte always matches `checksum`
        /// computed over the same fields, for any `(id, addr, val)`.
        #[test]
        fn write_cmd_checksum_matches(id in any::<u8>(), addr in any::<u8>(), val in any::<u8>()) {
            let cmd = write_cmd(id, addr, val);
            let expected = checksum(id, 4, ServoInstr::Write as u8, addr, val);
            prop_assert_eq!(cmd[7], expected);
        }
    }
}
