//! Colors and the hand-off to LED hardware.
//!
//! The fixture never touches hardware. After every mapping cycle it calls
//! [`LedDriver::init`] once with the sorted pin table, and every frame it calls
//! [`LedDriver::show`] with the physical buffer. [`PinStrips`] implements the
//! contract over one [`SmartLedsWrite`] writer per pin; [`FrameCapture`] keeps the
//! last frame in memory for previews and tests.
//!
//! # Example: drive two strips from one fixture
//!
//! ```
//! use core::convert::Infallible;
//! use fixture_kit::led_strip::{LedDriver, PinStrips, RGB8, SmartLedsWrite, colors};
//! use fixture_kit::pins::SortedPin;
//!
//! #[derive(Default)]
//! struct Recorder(Vec<RGB8>);
//!
//! impl SmartLedsWrite for Recorder {
//!     type Error = Infallible;
//!     type Color = RGB8;
//!
//!     fn write<T, I>(&mut self, iterator: T) -> Result<(), Infallible>
//!     where
//!         T: IntoIterator<Item = I>,
//!         I: Into<RGB8>,
//!     {
//!         self.0 = iterator.into_iter().map(Into::into).collect();
//!         Ok(())
//!     }
//! }
//!
//! let mut strips = PinStrips::new();
//! strips.add(2, Recorder::default())?;
//! strips.add(3, Recorder::default())?;
//!
//! let pins = [
//!     SortedPin { pin: 2, start_led: 0, nr_of_leds: 2 },
//!     SortedPin { pin: 3, start_led: 2, nr_of_leds: 1 },
//! ];
//! strips.init(&pins)?;
//! strips.show(&[colors::RED, colors::RED, colors::BLUE], &pins)?;
//! assert_eq!(strips.writer(3).map(|recorder| recorder.0.clone()), Some(vec![colors::BLUE]));
//! # Ok::<(), fixture_kit::Error>(())
//! ```

use alloc::vec::Vec;

use itertools::Itertools;
use log::{debug, warn};

use crate::config::MAX_PINS;
use crate::pins::SortedPin;
use crate::{Error, Result};

/// Predefined RGB color constants from the `smart_leds` crate.
///
/// Common colors include `RED`, `GREEN`, `BLUE`, `YELLOW`, `WHITE`, `BLACK`, `CYAN`, `MAGENTA`, `ORANGE`, `PURPLE`.
#[doc(inline)]
pub use smart_leds::colors;

/// 8-bit-per-channel RGB color from `embedded_graphics`.
#[doc(inline)]
pub use embedded_graphics::pixelcolor::Rgb888;

/// RGB color type of the physical buffer.
pub use smart_leds::RGB8;

/// Writer trait implemented by LED strip backends.
pub use smart_leds::SmartLedsWrite;

use embedded_graphics::prelude::RgbColor;
use smart_leds::hsv::{Hsv, hsv2rgb};

/// Convert colors to [`RGB8`] for the physical buffer.
///
/// # Example
///
/// ```rust
/// use fixture_kit::led_strip::{Rgb888, ToRgb8, RGB8};
///
/// let rgb8 = RGB8::new(16, 32, 48).to_rgb8();
/// let rgb888 = Rgb888::new(16, 32, 48);
/// let converted = rgb888.to_rgb8();
///
/// assert_eq!(rgb8, converted);
/// ```
pub trait ToRgb8 {
    /// Convert this color to [`RGB8`].
    #[must_use]
    fn to_rgb8(self) -> RGB8;
}

impl ToRgb8 for RGB8 {
    #[inline(always)]
    fn to_rgb8(self) -> RGB8 {
        self
    }
}

impl ToRgb8 for Rgb888 {
    #[inline(always)]
    fn to_rgb8(self) -> RGB8 {
        RGB8::new(self.r(), self.g(), self.b())
    }
}

/// Convert colors to [`Rgb888`] for embedded-graphics rendering.
pub trait ToRgb888 {
    /// Convert this color to [`Rgb888`].
    #[must_use]
    fn to_rgb888(self) -> Rgb888;
}

impl ToRgb888 for RGB8 {
    #[inline(always)]
    fn to_rgb888(self) -> Rgb888 {
        Rgb888::new(self.r, self.g, self.b)
    }
}

impl ToRgb888 for Rgb888 {
    #[inline(always)]
    fn to_rgb888(self) -> Rgb888 {
        self
    }
}

/// Linear blend: `amount_of_second = 0` gives `first`, `255` gives `second`.
#[must_use]
pub const fn blend(first: RGB8, second: RGB8, amount_of_second: u8) -> RGB8 {
    RGB8::new(
        blend_channel(first.r, second.r, amount_of_second),
        blend_channel(first.g, second.g, amount_of_second),
        blend_channel(first.b, second.b, amount_of_second),
    )
}

const fn blend_channel(first: u8, second: u8, amount_of_second: u8) -> u8 {
    let amount = amount_of_second as u16;
    ((first as u16 * (255 - amount) + second as u16 * amount) / 255) as u8
}

/// Scale every channel by `scale / 256` (with `255` leaving the color unchanged).
#[must_use]
pub const fn scale8(color: RGB8, scale: u8) -> RGB8 {
    RGB8::new(
        scale_channel(color.r, scale),
        scale_channel(color.g, scale),
        scale_channel(color.b, scale),
    )
}

const fn scale_channel(channel: u8, scale: u8) -> u8 {
    ((channel as u16 * (scale as u16 + 1)) >> 8) as u8
}

/// Rainbow color for a hue, at the saturation and brightness used by `fill_rainbow`.
#[must_use]
pub fn rainbow(hue: u8) -> RGB8 {
    hsv2rgb(Hsv {
        hue,
        sat: 240,
        val: 255,
    })
}

/// Hardware contract: transmit a physical buffer split into per-pin runs.
pub trait LedDriver {
    /// Called once per mapping cycle with the pin table sorted by start LED.
    ///
    /// # Errors
    ///
    /// Returns an error when the pin table cannot be driven, for example when two
    /// runs overlap.
    fn init(&mut self, pins: &[SortedPin]) -> Result<()>;

    /// Transmit one frame.
    ///
    /// # Errors
    ///
    /// Returns an error when a pin run does not fit the buffer or a writer fails.
    fn show(&mut self, leds: &[RGB8], pins: &[SortedPin]) -> Result<()>;
}

/// Check a sorted pin table: runs must not overlap and must end inside the buffer.
///
/// Conflicts are reported, never resolved.
///
/// # Errors
///
/// [`Error::PinRangesOverlap`] for the first overlapping pair,
/// [`Error::PinRangeBeyondBuffer`] for the first run past `buffer_len`.
pub fn validate_pin_table(pins: &[SortedPin], buffer_len: usize) -> Result<()> {
    for (first, second) in pins.iter().tuple_windows() {
        if usize::from(second.start_led) < first.end_led() {
            return Err(Error::PinRangesOverlap {
                first: first.pin,
                second: second.pin,
            });
        }
    }
    if let Some(pin) = pins.iter().find(|pin| pin.end_led() > buffer_len) {
        return Err(Error::PinRangeBeyondBuffer { pin: pin.pin });
    }
    Ok(())
}

/// [`LedDriver`] over one [`SmartLedsWrite`] writer per GPIO pin.
pub struct PinStrips<W> {
    writers: heapless::Vec<(u8, W), MAX_PINS>,
}

impl<W> PinStrips<W> {
    /// No writers yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            writers: heapless::Vec::new(),
        }
    }

    /// Register the writer for `pin`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`Error::PinOutOfRange`] when `pin` is not a valid pin number.
    pub fn add(&mut self, pin: u8, writer: W) -> Result<()> {
        if usize::from(pin) >= MAX_PINS {
            return Err(Error::PinOutOfRange { pin });
        }
        if let Some(slot) = self.writer_mut(pin) {
            *slot = writer;
            return Ok(());
        }
        self.writers
            .push((pin, writer))
            .map_err(|_| Error::IndexOutOfBounds)
    }

    /// The writer registered for `pin`.
    #[must_use]
    pub fn writer(&self, pin: u8) -> Option<&W> {
        self.writers
            .iter()
            .find(|(writer_pin, _)| *writer_pin == pin)
            .map(|(_, writer)| writer)
    }

    fn writer_mut(&mut self, pin: u8) -> Option<&mut W> {
        self.writers
            .iter_mut()
            .find(|(writer_pin, _)| *writer_pin == pin)
            .map(|(_, writer)| writer)
    }
}

impl<W> Default for PinStrips<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: SmartLedsWrite<Color = RGB8>> LedDriver for PinStrips<W> {
    fn init(&mut self, pins: &[SortedPin]) -> Result<()> {
        validate_pin_table(pins, usize::MAX)?;
        for pin in pins {
            if self.writer(pin.pin).is_none() {
                warn!("PinStrips::init: no writer for pin {}", pin.pin);
            } else {
                debug!(
                    "PinStrips::init: pin {} drives {} LEDs from {}",
                    pin.pin, pin.nr_of_leds, pin.start_led
                );
            }
        }
        Ok(())
    }

    fn show(&mut self, leds: &[RGB8], pins: &[SortedPin]) -> Result<()> {
        for pin in pins {
            let Some(run) = leds.get(usize::from(pin.start_led)..pin.end_led()) else {
                return Err(Error::PinRangeBeyondBuffer { pin: pin.pin });
            };
            if let Some(writer) = self.writer_mut(pin.pin) {
                writer
                    .write(run.iter().copied())
                    .map_err(|_| Error::Driver { pin: pin.pin })?;
            }
        }
        Ok(())
    }
}

/// [`LedDriver`] that keeps the last frame and pin table in memory.
#[derive(Clone, Debug, Default)]
pub struct FrameCapture {
    frame: Vec<RGB8>,
    pins: Vec<SortedPin>,
    init_count: u32,
    show_count: u32,
}

impl FrameCapture {
    /// Last frame passed to [`LedDriver::show`].
    #[must_use]
    pub fn frame(&self) -> &[RGB8] {
        &self.frame
    }

    /// Pin table passed to the last [`LedDriver::init`].
    #[must_use]
    pub fn pins(&self) -> &[SortedPin] {
        &self.pins
    }

    /// Number of `init` calls so far.
    #[must_use]
    pub const fn init_count(&self) -> u32 {
        self.init_count
    }

    /// Number of `show` calls so far.
    #[must_use]
    pub const fn show_count(&self) -> u32 {
        self.show_count
    }
}

impl LedDriver for FrameCapture {
    fn init(&mut self, pins: &[SortedPin]) -> Result<()> {
        self.pins.clear();
        self.pins.extend_from_slice(pins);
        self.init_count += 1;
        Ok(())
    }

    fn show(&mut self, leds: &[RGB8], _pins: &[SortedPin]) -> Result<()> {
        self.frame.clear();
        self.frame.extend_from_slice(leds);
        self.show_count += 1;
        Ok(())
    }
}
