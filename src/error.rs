//! Error type shared by every module of the crate.

use derive_more::{Display, Error};

/// Errors surfaced by fixture mapping, pin allocation and hardware hand-off.
///
/// Per-pixel and per-event problems during ingestion are *not* errors: they are
/// logged and skipped. Only conditions the caller must act on end up here.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The pin number is outside the pin table.
    #[display("pin {pin} is outside the pin table")]
    PinOutOfRange {
        /// Requested pin.
        pin: u8,
    },
    /// The pin is already owned by someone else.
    #[display("pin {pin} is owned by {owner}")]
    PinOwned {
        /// Requested pin.
        pin: u8,
        /// Current owner tag.
        owner: &'static str,
    },
    /// The pin has no owner, so there is nothing to extend.
    #[display("pin {pin} is not allocated")]
    PinNotAllocated {
        /// Requested pin.
        pin: u8,
    },
    /// Two pins claim overlapping physical ranges.
    #[display("pins {first} and {second} claim overlapping LED ranges")]
    PinRangesOverlap {
        /// Pin with the lower start LED.
        first: u8,
        /// Pin whose range starts inside `first`'s range.
        second: u8,
    },
    /// A pin range ends past the physical buffer.
    #[display("pin {pin} range ends past the LED buffer")]
    PinRangeBeyondBuffer {
        /// Offending pin.
        pin: u8,
    },
    /// A `"start-end"` details string could not be parsed.
    #[display("malformed pin details")]
    FormatError,
    /// The coordinate source failed before the stream completed.
    #[display("fixture source failed: {reason}")]
    SourceFailed {
        /// Short description from the source.
        reason: &'static str,
    },
    /// The hardware driver rejected a write.
    #[display("LED driver failed on pin {pin}")]
    Driver {
        /// Pin whose writer failed.
        pin: u8,
    },
    /// An index fell outside a fixed-capacity table.
    #[display("index out of bounds")]
    IndexOutOfBounds,
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;
