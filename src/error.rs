//! # Error type
//!
//! A single flat enum: cheap to construct, `Copy`, and free of any
//! payload that would force an allocator.

/// Everything that can go wrong while running the module state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A byte arrived that does not belong to the frame being assembled;
    /// the frame is dropped and the reader stays in its current role.
    Framing,
    /// An armed timer elapsed before the awaited event.
    Timeout,
    /// The servo replied with a non-zero error byte; treated like no
    /// reply at all (the retry budget is not charged differently).
    ServoError,
    /// A frame was well-formed but semantically invalid, e.g. an
    /// `ID_ASSIGN` whose param falls outside `1..=250`.
    ProtocolMismatch,
    /// The underlying peripheral driver reported a fault.
    Hal,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::Framing => "framing error",
            Error::Timeout => "timed out waiting for a frame",
            Error::ServoError => "servo reported a non-zero error byte",
            Error::ProtocolMismatch => "protocol mismatch",
            Error::Hal => "peripheral driver fault",
        };
        f.write_str(msg)
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for Error {}

impl embedded_hal_nb::serial::Error for Error {
    fn kind(&self) -> embedded_hal_nb::serial::ErrorKind {
        match self {
            Error::Framing => embedded_hal_nb::serial::ErrorKind::FrameFormat,
            _ => embedded_hal_nb::serial::ErrorKind::Other,
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
