//! GPIO pin ownership: which physical LED run each output pin drives.
//!
//! During mapping every `PinBoundary(pin)` event claims the physical indexes seen
//! since the previous boundary for `pin`. Claims by the same owner merge (the range
//! only ever grows); claims by a different owner are refused.
//!
//! ```
//! use fixture_kit::pins::{PinRange, PinTable};
//!
//! let mut pins = PinTable::new();
//! pins.allocate(2, "Leds", PinRange::new(0, 9))?;
//! pins.extend(2, PinRange::new(10, 19))?;
//! assert_eq!(pins.get(2).map(|pin| pin.range), Some(PinRange::new(0, 19)));
//! assert_eq!(pins.get(2).map(|pin| pin.range.details()).as_deref(), Some("0-19"));
//! # Ok::<(), fixture_kit::Error>(())
//! ```

use core::fmt::Write;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::MAX_PINS;
use crate::{Error, Result};

/// Inclusive range of physical LED indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinRange {
    /// First LED.
    pub start: u16,
    /// Last LED (inclusive).
    pub end: u16,
}

impl PinRange {
    /// Range `start..=end`.
    #[must_use]
    pub const fn new(start: u16, end: u16) -> Self {
        assert!(start <= end, "pin range start must not exceed end");
        Self { start, end }
    }

    /// Number of LEDs in the range.
    #[must_use]
    pub const fn len(&self) -> u16 {
        self.end - self.start + 1
    }

    /// Smallest range covering both.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            start: if self.start < other.start { self.start } else { other.start },
            end: if self.end > other.end { self.end } else { other.end },
        }
    }

    /// Render as `"start-end"`.
    #[must_use]
    pub fn details(&self) -> heapless::String<12> {
        let mut details = heapless::String::new();
        // "65535-65535" is 11 bytes, so this cannot run out of room.
        let _ = write!(details, "{}-{}", self.start, self.end);
        details
    }

    /// Parse a `"start-end"` string.
    ///
    /// # Errors
    ///
    /// [`Error::FormatError`] when either number is missing or malformed, or `start > end`.
    pub fn parse_details(details: &str) -> Result<Self> {
        let (start, end) = details.split_once('-').ok_or(Error::FormatError)?;
        let start = start.trim().parse::<u16>().map_err(|_| Error::FormatError)?;
        let end = end.trim().parse::<u16>().map_err(|_| Error::FormatError)?;
        if start > end {
            return Err(Error::FormatError);
        }
        Ok(Self { start, end })
    }
}

/// One owned pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinObject {
    /// Owner tag.
    pub owner: &'static str,
    /// LEDs driven by this pin.
    pub range: PinRange,
}

/// Hand-off record for the hardware driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SortedPin {
    /// GPIO number.
    pub pin: u8,
    /// First physical LED driven by the pin.
    pub start_led: u16,
    /// Number of LEDs driven by the pin.
    pub nr_of_leds: u16,
}

impl SortedPin {
    /// One past the last LED of the run.
    #[must_use]
    pub const fn end_led(&self) -> usize {
        self.start_led as usize + self.nr_of_leds as usize
    }
}

/// Pin ownership table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinTable {
    pins: [Option<PinObject>; MAX_PINS],
}

impl PinTable {
    /// All pins free.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pins: [None; MAX_PINS],
        }
    }

    /// Claim `pin` for `owner`. A second claim by the same owner merges the ranges.
    ///
    /// # Errors
    ///
    /// [`Error::PinOutOfRange`] for an unknown pin, [`Error::PinOwned`] when another
    /// owner holds the pin (the table is left unchanged).
    pub fn allocate(&mut self, pin: u8, owner: &'static str, range: PinRange) -> Result<()> {
        let slot = self.slot_mut(pin)?;
        match slot {
            Some(current) if current.owner != owner => Err(Error::PinOwned {
                pin,
                owner: current.owner,
            }),
            Some(current) => {
                current.range = current.range.merge(range);
                debug!("pins: extend {} to {}", pin, current.range.details());
                Ok(())
            }
            None => {
                *slot = Some(PinObject { owner, range });
                debug!("pins: allocate {} for {} as {}", pin, owner, range.details());
                Ok(())
            }
        }
    }

    /// Grow an owned pin's range.
    ///
    /// # Errors
    ///
    /// [`Error::PinOutOfRange`] for an unknown pin, [`Error::PinNotAllocated`] when
    /// nobody owns it.
    pub fn extend(&mut self, pin: u8, range: PinRange) -> Result<()> {
        let current = self
            .slot_mut(pin)?
            .as_mut()
            .ok_or(Error::PinNotAllocated { pin })?;
        current.range = current.range.merge(range);
        Ok(())
    }

    /// Release `pin` if `owner` holds it.
    pub fn deallocate(&mut self, pin: u8, owner: &str) {
        match self.pins.get_mut(usize::from(pin)) {
            Some(slot) if slot.is_some_and(|current| current.owner == owner) => *slot = None,
            Some(_) => {}
            None => warn!("pins: deallocate of unknown pin {pin}"),
        }
    }

    /// Release every pin held by `owner`.
    pub fn deallocate_all(&mut self, owner: &str) {
        for slot in &mut self.pins {
            if slot.is_some_and(|current| current.owner == owner) {
                *slot = None;
            }
        }
    }

    /// `true` when `owner` holds `pin`.
    #[must_use]
    pub fn is_owner(&self, pin: u8, owner: &str) -> bool {
        self.get(pin).is_some_and(|current| current.owner == owner)
    }

    /// The owned pin, if any.
    #[must_use]
    pub fn get(&self, pin: u8) -> Option<&PinObject> {
        self.pins.get(usize::from(pin)).and_then(Option::as_ref)
    }

    /// Pins held by `owner`, ascending by start LED.
    #[must_use]
    pub fn sorted_pins(&self, owner: &str) -> heapless::Vec<SortedPin, MAX_PINS> {
        let mut sorted: heapless::Vec<SortedPin, MAX_PINS> = self
            .pins
            .iter()
            .zip(0u8..)
            .filter_map(|(slot, pin)| {
                slot.filter(|current| current.owner == owner)
                    .map(|current| SortedPin {
                        pin,
                        start_led: current.range.start,
                        nr_of_leds: current.range.len(),
                    })
            })
            .collect();
        sorted.sort_unstable_by_key(|pin| (pin.start_led, pin.pin));
        sorted
    }

    fn slot_mut(&mut self, pin: u8) -> Result<&mut Option<PinObject>> {
        self.pins
            .get_mut(usize::from(pin))
            .ok_or(Error::PinOutOfRange { pin })
    }
}

impl Default for PinTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{PinRange, PinTable};
    use alloc::vec::Vec;
    use crate::Error;

    #[test]
    fn same_owner_merges_never_shrinks() {
        let mut pins = PinTable::new();
        pins.allocate(5, "Leds", PinRange::new(10, 19)).expect("allocation must succeed");
        pins.allocate(5, "Leds", PinRange::new(12, 14)).expect("allocation must succeed");
        assert_eq!(pins.get(5).expect("pin 5 must be owned").range, PinRange::new(10, 19));
        pins.allocate(5, "Leds", PinRange::new(0, 3)).expect("allocation must succeed");
        assert_eq!(pins.get(5).expect("pin 5 must be owned").range, PinRange::new(0, 19));
    }

    #[test]
    fn other_owner_is_refused() {
        let mut pins = PinTable::new();
        pins.allocate(5, "Servo", PinRange::new(0, 0)).expect("allocation must succeed");
        assert_eq!(
            pins.allocate(5, "Leds", PinRange::new(0, 9)),
            Err(Error::PinOwned { pin: 5, owner: "Servo" })
        );
        assert!(pins.is_owner(5, "Servo"));
    }

    #[test]
    fn extend_requires_allocation() {
        let mut pins = PinTable::new();
        assert_eq!(
            pins.extend(3, PinRange::new(0, 1)),
            Err(Error::PinNotAllocated { pin: 3 })
        );
        assert_eq!(
            pins.extend(200, PinRange::new(0, 1)),
            Err(Error::PinOutOfRange { pin: 200 })
        );
    }

    #[test]
    fn deallocate_all_only_touches_owner() {
        let mut pins = PinTable::new();
        pins.allocate(1, "Leds", PinRange::new(0, 7)).expect("allocation must succeed");
        pins.allocate(2, "Button", PinRange::new(0, 0)).expect("allocation must succeed");
        pins.deallocate_all("Leds");
        assert!(pins.get(1).is_none());
        assert!(pins.is_owner(2, "Button"));
    }

    #[test]
    fn details_round_trip_and_reject_garbage() {
        assert_eq!(PinRange::new(8, 15).details().as_str(), "8-15");
        assert_eq!(PinRange::parse_details("8-15"), Ok(PinRange::new(8, 15)));
        assert_eq!(PinRange::parse_details("8"), Err(Error::FormatError));
        assert_eq!(PinRange::parse_details("9-x"), Err(Error::FormatError));
        assert_eq!(PinRange::parse_details("9-3"), Err(Error::FormatError));
    }

    #[test]
    fn sorted_by_start_led() {
        let mut pins = PinTable::new();
        pins.allocate(7, "Leds", PinRange::new(16, 23)).expect("allocation must succeed");
        pins.allocate(3, "Leds", PinRange::new(0, 7)).expect("allocation must succeed");
        pins.allocate(9, "Leds", PinRange::new(8, 15)).expect("allocation must succeed");
        let sorted = pins.sorted_pins("Leds");
        let order: Vec<u8> = sorted.iter().map(|pin| pin.pin).collect();
        assert_eq!(order, [3, 9, 7]);
        assert!(sorted.iter().all(|pin| pin.nr_of_leds == 8));
    }
}
