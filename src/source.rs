//! Coordinate sources: replayable streams of LED positions and pin boundaries.
//!
//! A [`FixtureSource`] is replayed twice per mapping cycle, once to measure the
//! fixture and once to allocate it, so both replays must produce the same events.
//! Positions are in fixture units multiplied by [`FixtureMeta::factor`] (for
//! example millimetres with a factor of 10 for a centimetre grid).
//!
//! Built-in sources:
//! - [`Events`]: an explicit event list
//! - [`Strip`]: a straight line of LEDs
//! - [`Panel`]: a 2D panel wired as described by a [`PanelLayout`]
//! - [`Cuboid`]: a 3D block of LEDs, wired plane by plane
//! - [`FixtureDefinition`]: a `serde` description with per-pin LED groups
//!
//! ```
//! use fixture_kit::source::{FixtureEvent, FixtureSource, Strip};
//!
//! let mut strip = Strip::new(3).with_pin(2);
//! let mut events = Vec::new();
//! strip.replay(&mut |event| events.push(event))?;
//! assert_eq!(events.len(), 4);
//! assert_eq!(events.last(), Some(&FixtureEvent::PinBoundary(2)));
//! # Ok::<(), fixture_kit::Error>(())
//! ```

use alloc::vec::Vec;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{Coord3D, Result};

mod layout;

pub use layout::PanelLayout;

/// One event of a coordinate stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixtureEvent {
    /// The next physical LED sits at this position.
    Pixel(Coord3D),
    /// The LEDs since the previous boundary are driven by this GPIO pin.
    PinBoundary(u8),
}

/// How a fixture's LEDs are drawn in previews.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixtureMeta {
    /// Position units per fixture unit; also the sub-region scale.
    pub factor: u8,
    /// LED size for previews.
    pub led_size: u8,
    /// LED shape for previews.
    pub shape: u8,
}

impl FixtureMeta {
    /// Factor 1, LED size 4, shape 0.
    pub const DEFAULT: Self = Self {
        factor: 1,
        led_size: 4,
        shape: 0,
    };

    /// Same metadata with another factor.
    #[must_use]
    pub const fn with_factor(mut self, factor: u8) -> Self {
        assert!(factor > 0, "factor must be positive");
        self.factor = factor;
        self
    }
}

impl Default for FixtureMeta {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A replayable stream of fixture events.
pub trait FixtureSource {
    /// Emit every event of the fixture, in wiring order.
    ///
    /// # Errors
    ///
    /// Any error aborts the mapping cycle; the previous mapping stays in place.
    fn replay(&mut self, emit: &mut dyn FnMut(FixtureEvent)) -> Result<()>;

    /// Preview metadata and position scale.
    fn meta(&self) -> FixtureMeta {
        FixtureMeta::DEFAULT
    }
}

/// An explicit list of events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Events {
    events: Vec<FixtureEvent>,
    meta: FixtureMeta,
}

impl Events {
    /// Events with default metadata.
    #[must_use]
    pub fn new(events: Vec<FixtureEvent>) -> Self {
        Self {
            events,
            meta: FixtureMeta::DEFAULT,
        }
    }

    /// Replace the metadata.
    #[must_use]
    pub const fn with_meta(mut self, meta: FixtureMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl FromIterator<FixtureEvent> for Events {
    fn from_iter<I: IntoIterator<Item = FixtureEvent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FixtureSource for Events {
    fn replay(&mut self, emit: &mut dyn FnMut(FixtureEvent)) -> Result<()> {
        for event in &self.events {
            emit(*event);
        }
        Ok(())
    }

    fn meta(&self) -> FixtureMeta {
        self.meta
    }
}

/// A straight strip along the x axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strip {
    len: u16,
    pin: Option<u8>,
    meta: FixtureMeta,
}

impl Strip {
    /// `len` LEDs, one fixture unit apart, no pin.
    #[must_use]
    pub const fn new(len: u16) -> Self {
        Self {
            len,
            pin: None,
            meta: FixtureMeta::DEFAULT,
        }
    }

    /// Drive the whole strip from `pin`.
    #[must_use]
    pub const fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Space LEDs `factor` position units apart.
    #[must_use]
    pub const fn with_factor(mut self, factor: u8) -> Self {
        self.meta = self.meta.with_factor(factor);
        self
    }
}

impl FixtureSource for Strip {
    fn replay(&mut self, emit: &mut dyn FnMut(FixtureEvent)) -> Result<()> {
        let factor = i32::from(self.meta.factor);
        for x_index in 0..i32::from(self.len) {
            emit(FixtureEvent::Pixel(Coord3D::new(x_index * factor, 0, 0)));
        }
        if let Some(pin) = self.pin {
            emit(FixtureEvent::PinBoundary(pin));
        }
        Ok(())
    }

    fn meta(&self) -> FixtureMeta {
        self.meta
    }
}

/// A flat panel in the `z = 0` plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Panel {
    layout: PanelLayout,
    pin: Option<u8>,
    meta: FixtureMeta,
}

impl Panel {
    /// Panel wired as `layout`, no pin.
    #[must_use]
    pub fn new(layout: PanelLayout) -> Self {
        Self {
            layout,
            pin: None,
            meta: FixtureMeta::DEFAULT,
        }
    }

    /// Drive the whole panel from `pin`.
    #[must_use]
    pub fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Space LEDs `factor` position units apart.
    #[must_use]
    pub fn with_factor(mut self, factor: u8) -> Self {
        self.meta = self.meta.with_factor(factor);
        self
    }

    /// The panel's wiring.
    #[must_use]
    pub const fn layout(&self) -> &PanelLayout {
        &self.layout
    }
}

impl FixtureSource for Panel {
    fn replay(&mut self, emit: &mut dyn FnMut(FixtureEvent)) -> Result<()> {
        let factor = i32::from(self.meta.factor);
        for &(column, row) in self.layout.index_to_xy() {
            emit(FixtureEvent::Pixel(
                Coord3D::new(i32::from(column), i32::from(row), 0) * factor,
            ));
        }
        if let Some(pin) = self.pin {
            emit(FixtureEvent::PinBoundary(pin));
        }
        Ok(())
    }

    fn meta(&self) -> FixtureMeta {
        self.meta
    }
}

/// A solid block of LEDs: `depth` serpentine panels stacked along z.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cuboid {
    size: Coord3D,
    pin: Option<u8>,
    meta: FixtureMeta,
}

impl Cuboid {
    /// Block of `width × height × depth` LEDs, no pin.
    #[must_use]
    pub const fn new(width: u16, height: u16, depth: u16) -> Self {
        assert!(width > 0 && height > 0 && depth > 0, "cuboid sides must be positive");
        Self {
            size: Coord3D::new(width as i32, height as i32, depth as i32),
            pin: None,
            meta: FixtureMeta::DEFAULT,
        }
    }

    /// Drive the whole block from `pin`.
    #[must_use]
    pub const fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Space LEDs `factor` position units apart.
    #[must_use]
    pub const fn with_factor(mut self, factor: u8) -> Self {
        self.meta = self.meta.with_factor(factor);
        self
    }
}

impl FixtureSource for Cuboid {
    fn replay(&mut self, emit: &mut dyn FnMut(FixtureEvent)) -> Result<()> {
        let factor = i32::from(self.meta.factor);
        for z_index in 0..self.size.z {
            for y_index in 0..self.size.y {
                for step in 0..self.size.x {
                    let x_index = if y_index % 2 == 0 { step } else { self.size.x - 1 - step };
                    emit(FixtureEvent::Pixel(
                        Coord3D::new(x_index, y_index, z_index) * factor,
                    ));
                }
            }
        }
        if let Some(pin) = self.pin {
            emit(FixtureEvent::PinBoundary(pin));
        }
        Ok(())
    }

    fn meta(&self) -> FixtureMeta {
        self.meta
    }
}

/// One pin's worth of LED positions in a [`FixtureDefinition`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinGroup {
    /// GPIO pin driving the group, if any.
    pub pin: Option<u8>,
    /// Positions as `[x]`, `[x, y]` or `[x, y, z]`; missing axes are 0.
    pub leds: Vec<heapless::Vec<u16, 3>>,
}

/// Data-only fixture description.
///
/// ```
/// use fixture_kit::source::FixtureDefinition;
///
/// let definition: FixtureDefinition = serde_json::from_str(
///     r#"{ "factor": 10, "ledSize": 5, "groups": [
///          { "pin": 2, "leds": [[0], [10], [20]] },
///          { "pin": 3, "leds": [[30], [40]] } ] }"#,
/// )?;
/// assert_eq!(definition.led_count(), 5);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixtureDefinition {
    /// Position units per fixture unit.
    pub factor: u8,
    /// LED size for previews.
    pub led_size: u8,
    /// LED shape for previews.
    pub shape: u8,
    /// LED groups in wiring order.
    pub groups: Vec<PinGroup>,
}

impl FixtureDefinition {
    /// Total number of LED positions.
    #[must_use]
    pub fn led_count(&self) -> usize {
        self.groups.iter().map(|group| group.leds.len()).sum()
    }
}

impl Default for FixtureDefinition {
    fn default() -> Self {
        Self {
            factor: FixtureMeta::DEFAULT.factor,
            led_size: FixtureMeta::DEFAULT.led_size,
            shape: FixtureMeta::DEFAULT.shape,
            groups: Vec::new(),
        }
    }
}

impl FixtureSource for FixtureDefinition {
    fn replay(&mut self, emit: &mut dyn FnMut(FixtureEvent)) -> Result<()> {
        for group in &self.groups {
            for position in &group.leds {
                let axis = |axis: usize| position.get(axis).copied().map_or(0, i32::from);
                if position.is_empty() {
                    warn!("FixtureDefinition: empty LED position skipped");
                    continue;
                }
                emit(FixtureEvent::Pixel(Coord3D::new(axis(0), axis(1), axis(2))));
            }
            if let Some(pin) = group.pin {
                emit(FixtureEvent::PinBoundary(pin));
            }
        }
        Ok(())
    }

    fn meta(&self) -> FixtureMeta {
        FixtureMeta {
            factor: self.factor.max(1),
            led_size: self.led_size,
            shape: self.shape,
        }
    }
}

/// Side of the fallback panel.
pub const DEFAULT_PANEL_SIDE: u16 = 16;

/// The safe fallback geometry: a 16×16 row-major panel without pins.
#[must_use]
pub fn default_panel() -> Panel {
    Panel::new(PanelLayout::row_major(DEFAULT_PANEL_SIDE, DEFAULT_PANEL_SIDE))
}
