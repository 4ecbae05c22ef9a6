//! The fixture: physical LEDs, their positions, and the layers that address them.
//!
//! Mapping replays a [`FixtureSource`] twice. Pass 1 measures the bounding box and
//! the LED count. Pass 2 assigns physical indexes in stream order, claims pin runs,
//! and builds every pending layer's mapping table. Pass 2 works on staged copies
//! that replace the live tables only when the stream completes, so a failing source
//! leaves the previous mapping untouched.
//!
//! ```
//! use fixture_kit::Coord3D;
//! use fixture_kit::fixture::Fixture;
//! use fixture_kit::layer::{LedsLayer, PhysMap};
//! use fixture_kit::led_strip::FrameCapture;
//! use fixture_kit::projection::Projection;
//! use fixture_kit::source::Strip;
//!
//! let mut fixture = Fixture::default();
//! fixture.add_layer(
//!     LedsLayer::new(Projection::Default)
//!         .with_region(Coord3D::new(5, 0, 0), Coord3D::new(9, 0, 0)),
//! );
//! let report = fixture.map(&mut Strip::new(10).with_pin(2), &mut FrameCapture::default())?;
//!
//! assert_eq!(report.fix_size, Coord3D::new(10, 1, 1));
//! assert_eq!(report.layers[0].size, Coord3D::new(5, 1, 1));
//! let layer = fixture.layer_settings(0).expect("layer 0 exists");
//! assert_eq!(layer.mapping_table()[0], PhysMap::OnePixel(5));
//! assert_eq!(report.sorted_pins[0].nr_of_leds, 10);
//! # Ok::<(), fixture_kit::Error>(())
//! ```

use alloc::vec::Vec;

use embassy_time::Instant;
use log::{debug, info, trace, warn};

use crate::config::{FixtureConfig, MAX_PINS};
use crate::layer::{Layer, LayerReport, LedsLayer, MapGeometry, PhysicalLeds, Placement};
use crate::led_strip::{LedDriver, RGB8, validate_pin_table};
use crate::pins::{PinRange, PinTable, SortedPin};
use crate::schedule::{MappingStatus, RemapScheduler};
use crate::source::{FixtureEvent, FixtureMeta, FixtureSource, default_panel};
use crate::{Coord3D, Error, Result};

/// Physical LEDs plus the layers drawn onto them.
pub struct Fixture {
    config: FixtureConfig,
    physical: PhysicalLeds,
    fix_size: Coord3D,
    nr_of_leds: u32,
    layers: Vec<LedsLayer>,
    pins: PinTable,
    sorted_pins: heapless::Vec<SortedPin, MAX_PINS>,
    scheduler: RemapScheduler,
    positions: Vec<Coord3D>,
    meta: FixtureMeta,
}

/// Outcome of one mapping cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingReport {
    /// Bounding box in fixture units.
    pub fix_size: Coord3D,
    /// LEDs in the stream, including those past the capacity.
    pub nr_of_leds: u32,
    /// LEDs that received a physical index.
    pub mapped_leds: u32,
    /// LEDs skipped because the physical buffer was full.
    pub overflow_pixels: u32,
    /// Projected indexes dropped for being out of range.
    pub rejected_indexes: u32,
    /// One entry per layer rebuilt in this cycle.
    pub layers: Vec<LayerReport>,
    /// Pin table handed to the driver.
    pub sorted_pins: heapless::Vec<SortedPin, MAX_PINS>,
    /// Problem found in the pin table, if any. The driver still receives it.
    pub pin_table_error: Option<Error>,
    /// [`Fixture::mapping_fingerprint`] after the cycle.
    pub fingerprint: u32,
}

impl Fixture {
    /// Empty fixture with no layers; nothing is mapped until [`Self::map`].
    #[must_use]
    pub fn new(config: FixtureConfig) -> Self {
        Self {
            physical: PhysicalLeds::new(usize::from(config.max_leds), config.global_blend),
            fix_size: Coord3D::ZERO,
            nr_of_leds: 0,
            layers: Vec::new(),
            pins: PinTable::new(),
            sorted_pins: heapless::Vec::new(),
            scheduler: RemapScheduler::new(config.remap_interval()),
            positions: Vec::new(),
            meta: FixtureMeta::DEFAULT,
            config,
        }
    }

    /// Append a layer; it is built at the next mapping cycle. Returns its index.
    pub fn add_layer(&mut self, layer: LedsLayer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    /// Pixel access to layer `index`.
    #[must_use]
    pub fn layer(&mut self, index: usize) -> Option<Layer<'_>> {
        let layer_count = self.layers.len();
        self.layers
            .get_mut(index)
            .map(|leds_layer| Layer::new(leds_layer, &mut self.physical, layer_count))
    }

    /// Settings and tables of layer `index`.
    #[must_use]
    pub fn layer_settings(&self, index: usize) -> Option<&LedsLayer> {
        self.layers.get(index)
    }

    /// Mutable settings of layer `index`. Changing the projection or region marks
    /// the layer for the next mapping cycle.
    pub fn layer_settings_mut(&mut self, index: usize) -> Option<&mut LedsLayer> {
        self.layers.get_mut(index)
    }

    /// Every layer, in drawing order.
    #[must_use]
    pub fn layers(&self) -> &[LedsLayer] {
        &self.layers
    }

    /// Rebuild every layer from `source` now, then hand the pin table to `driver`.
    ///
    /// # Errors
    ///
    /// The source's error when the stream fails (the previous mapping is kept), or
    /// the driver's error from [`LedDriver::init`] (the new mapping is kept).
    pub fn map(
        &mut self,
        source: &mut dyn FixtureSource,
        driver: &mut dyn LedDriver,
    ) -> Result<MappingReport> {
        for layer in &mut self.layers {
            layer.mark_for_mapping();
        }
        self.run_mapping(source, driver)
    }

    /// [`Self::map`], falling back to [`default_panel`] when it fails.
    ///
    /// # Errors
    ///
    /// Only when mapping the default panel fails too.
    pub fn map_or_default(
        &mut self,
        source: &mut dyn FixtureSource,
        driver: &mut dyn LedDriver,
    ) -> Result<MappingReport> {
        match self.map(source, driver) {
            Ok(report) => Ok(report),
            Err(error) => {
                warn!("Fixture::map: {error}; falling back to the default panel");
                self.map(&mut default_panel(), driver)
            }
        }
    }

    /// Latch a full remap for the next due [`Self::poll`].
    pub fn request_remap(&mut self) {
        for layer in &mut self.layers {
            layer.mark_for_mapping();
        }
        self.scheduler.request();
    }

    /// Latch a remap of layer `index` only.
    pub fn trigger_mapping(&mut self, index: usize) {
        match self.layers.get_mut(index) {
            Some(layer) => {
                layer.mark_for_mapping();
                self.scheduler.request();
            }
            None => warn!("Fixture::trigger_mapping: no layer {index}"),
        }
    }

    /// Run a latched remap if the debounce interval has elapsed.
    ///
    /// Returns `Ok(None)` when nothing was due.
    ///
    /// # Errors
    ///
    /// As [`Self::map`]. No retry: a new request is needed after a failure.
    pub fn poll(
        &mut self,
        now: Instant,
        source: &mut dyn FixtureSource,
        driver: &mut dyn LedDriver,
    ) -> Result<Option<MappingReport>> {
        if !self.begin_remap(now) {
            return Ok(None);
        }
        self.finish_remap(source, driver).map(Some)
    }

    /// First half of [`Self::poll`]: start a due cycle and suppress [`Self::show`].
    ///
    /// Returns `false` when nothing was due. A caller that fetches the new fixture
    /// asynchronously calls [`Self::finish_remap`] once it has the source.
    pub fn begin_remap(&mut self, now: Instant) -> bool {
        if !self.scheduler.is_due(now) {
            return false;
        }
        self.scheduler.begin(now);
        true
    }

    /// Second half of [`Self::poll`]: map `source` and re-enable [`Self::show`].
    ///
    /// # Errors
    ///
    /// As [`Self::map`]. The cycle ends either way.
    pub fn finish_remap(
        &mut self,
        source: &mut dyn FixtureSource,
        driver: &mut dyn LedDriver,
    ) -> Result<MappingReport> {
        let result = self.run_mapping(source, driver);
        self.scheduler.finish();
        result
    }

    /// Send the physical buffer to `driver`.
    ///
    /// Returns `Ok(false)` without touching the driver while a remap is in progress.
    /// [`Self::poll`] runs a whole cycle before returning, so this only happens
    /// between [`Self::begin_remap`] and [`Self::finish_remap`].
    ///
    /// # Errors
    ///
    /// The driver's error.
    pub fn show(&mut self, driver: &mut dyn LedDriver) -> Result<bool> {
        if !self.scheduler.show_allowed() {
            trace!("Fixture::show: suppressed while mapping");
            return Ok(false);
        }
        driver.show(self.physical.active(), &self.sorted_pins)?;
        Ok(true)
    }

    /// Mark physical LED `index` for blending. Returns `false` past the flag vector.
    pub fn set_blend_flag(&mut self, index: usize, blend_pixel: bool) -> bool {
        self.physical.set_blend_flag(index, blend_pixel)
    }

    /// Amount of the previous value kept by blended writes.
    pub const fn set_global_blend(&mut self, global_blend: u8) {
        self.config.global_blend = global_blend;
        self.physical.set_global_blend(global_blend);
    }

    /// Runtime configuration.
    #[must_use]
    pub const fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Bounding box in fixture units.
    #[must_use]
    pub const fn fix_size(&self) -> Coord3D {
        self.fix_size
    }

    /// LEDs in the last mapped stream (may exceed the capacity).
    #[must_use]
    pub const fn nr_of_leds(&self) -> u32 {
        self.nr_of_leds
    }

    /// Physical buffer of the mapped LEDs.
    #[must_use]
    pub fn leds(&self) -> &[RGB8] {
        self.physical.active()
    }

    /// Position of every mapped LED, by physical index, in source units.
    #[must_use]
    pub fn positions(&self) -> &[Coord3D] {
        &self.positions
    }

    /// Metadata of the last mapped source.
    #[must_use]
    pub const fn meta(&self) -> FixtureMeta {
        self.meta
    }

    /// Pin ownership table.
    #[must_use]
    pub const fn pins(&self) -> &PinTable {
        &self.pins
    }

    /// Pin table handed to the driver by the last mapping cycle.
    #[must_use]
    pub fn sorted_pins(&self) -> &[SortedPin] {
        &self.sorted_pins
    }

    /// Remap state.
    #[must_use]
    pub const fn status(&self) -> MappingStatus {
        self.scheduler.status()
    }

    /// CRC-32 over the fixture size, every layer's tables, and the pin table.
    ///
    /// Equal fingerprints after two mappings of the same source mean the
    /// mapping is reproducible.
    #[must_use]
    pub fn mapping_fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for value in [self.fix_size.x, self.fix_size.y, self.fix_size.z] {
            hasher.update(&value.to_le_bytes());
        }
        hasher.update(&self.nr_of_leds.to_le_bytes());
        for layer in &self.layers {
            layer.hash_into(&mut hasher);
        }
        for pin in &self.sorted_pins {
            hasher.update(&[pin.pin]);
            hasher.update(&pin.start_led.to_le_bytes());
            hasher.update(&pin.nr_of_leds.to_le_bytes());
        }
        hasher.finalize()
    }

    fn run_mapping(
        &mut self,
        source: &mut dyn FixtureSource,
        driver: &mut dyn LedDriver,
    ) -> Result<MappingReport> {
        let meta = source.meta();
        let scale = i32::from(meta.factor.max(1));
        let capacity = self.config.max_leds;

        let mut measure = Measure::default();
        source
            .replay(&mut |event| measure.observe(event))
            .inspect_err(|error| warn!("Fixture::map: pass 1 aborted: {error}"))?;
        let fix_size = (measure.max / scale).saturating_add(Coord3D::ONE);
        if measure.nr_of_leds > u32::from(capacity) {
            warn!(
                "Fixture::map: {} LEDs exceed the capacity of {}",
                measure.nr_of_leds, capacity
            );
        }
        debug!(
            "Fixture::map: pass 1 size {} with {} LEDs",
            fix_size, measure.nr_of_leds
        );

        let mut allocation = Allocation::new(
            &self.layers,
            &self.pins,
            MapGeometry {
                fix_size,
                scale,
                max_virtual_leds: self.config.max_virtual_leds,
            },
            capacity,
            self.config.pin_owner,
        );
        source
            .replay(&mut |event| allocation.observe(event))
            .inspect_err(|error| warn!("Fixture::map: pass 2 aborted: {error}"))?;
        if allocation.overflow_pixels > 0 {
            warn!(
                "Fixture::map: {} LEDs past the capacity of {} skipped",
                allocation.overflow_pixels, capacity
            );
        }
        if allocation.rejected_indexes > 0 {
            warn!(
                "Fixture::map: {} projected indexes out of range",
                allocation.rejected_indexes
            );
        }

        // Commit.
        for (layer, staged) in self.layers.iter_mut().zip(allocation.staged) {
            if let Some(staged) = staged {
                *layer = staged;
            }
        }
        self.pins = allocation.pins;
        self.positions = allocation.positions;
        self.fix_size = fix_size;
        self.nr_of_leds = measure.nr_of_leds;
        self.meta = meta;
        self.physical.clear();
        self.physical.set_active(measure.nr_of_leds as usize);
        let span = self.physical.active().len();
        self.physical.grow_blend_flags(span);

        let mut layer_reports = Vec::new();
        for (index, layer) in self.layers.iter_mut().enumerate() {
            if !layer.needs_mapping() {
                continue;
            }
            let mut report = layer.finalize(
                fix_size,
                measure.nr_of_leds,
                span,
                self.config.max_virtual_leds,
            );
            report.layer = index;
            report.log(layer.projection());
            layer_reports.push(report);
        }

        self.sorted_pins = self.pins.sorted_pins(self.config.pin_owner);
        let pin_table_error = validate_pin_table(&self.sorted_pins, span).err();
        if let Some(error) = pin_table_error {
            warn!("Fixture::map: {error}");
        }
        driver.init(&self.sorted_pins)?;

        let fingerprint = self.mapping_fingerprint();
        info!(
            "Fixture::map: {} -> {} LEDs ({} mapped), {} pins, fingerprint {:08x}",
            fix_size,
            measure.nr_of_leds,
            span,
            self.sorted_pins.len(),
            fingerprint
        );

        Ok(MappingReport {
            fix_size,
            nr_of_leds: measure.nr_of_leds,
            mapped_leds: u32::try_from(span).unwrap_or(u32::MAX),
            overflow_pixels: allocation.overflow_pixels,
            rejected_indexes: allocation.rejected_indexes,
            layers: layer_reports,
            sorted_pins: self.sorted_pins.clone(),
            pin_table_error,
            fingerprint,
        })
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new(FixtureConfig::new())
    }
}

/// Pass 1 accumulator.
#[derive(Default)]
struct Measure {
    max: Coord3D,
    nr_of_leds: u32,
}

impl Measure {
    fn observe(&mut self, event: FixtureEvent) {
        if let FixtureEvent::Pixel(pixel) = event {
            self.max = self.max.maximum(pixel);
            self.nr_of_leds += 1;
        }
    }
}

/// Pass 2 cursors and staged results.
struct Allocation {
    geometry: MapGeometry,
    capacity: u16,
    owner: &'static str,
    staged: Vec<Option<LedsLayer>>,
    pins: PinTable,
    positions: Vec<Coord3D>,
    index_p: u32,
    prev_index_p: u32,
    overflow_pixels: u32,
    rejected_indexes: u32,
}

impl Allocation {
    fn new(
        layers: &[LedsLayer],
        pins: &PinTable,
        geometry: MapGeometry,
        capacity: u16,
        owner: &'static str,
    ) -> Self {
        let mut pins = pins.clone();
        pins.deallocate_all(owner);
        Self {
            geometry,
            capacity,
            owner,
            staged: layers
                .iter()
                .map(|layer| layer.needs_mapping().then(|| layer.staged()))
                .collect(),
            pins,
            positions: Vec::new(),
            index_p: 0,
            prev_index_p: 0,
            overflow_pixels: 0,
            rejected_indexes: 0,
        }
    }

    fn observe(&mut self, event: FixtureEvent) {
        match event {
            FixtureEvent::Pixel(pixel) => self.pixel(pixel),
            FixtureEvent::PinBoundary(pin) => self.pin_boundary(pin),
        }
    }

    fn pixel(&mut self, pixel: Coord3D) {
        let index_p = self.index_p;
        self.index_p += 1;

        let Some(index_p) = u16::try_from(index_p)
            .ok()
            .filter(|index_p| *index_p < self.capacity)
        else {
            debug!("Fixture::map: LED {index_p} at {pixel} past capacity");
            self.overflow_pixels += 1;
            return;
        };

        self.positions.push(pixel);
        for layer in self.staged.iter_mut().flatten() {
            if layer.place(pixel, index_p, &self.geometry) == Placement::Rejected {
                self.rejected_indexes += 1;
            }
        }
    }

    fn pin_boundary(&mut self, pin: u8) {
        let start = self.prev_index_p;
        let end = self.index_p;
        self.prev_index_p = self.index_p;

        if start == end {
            debug!("Fixture::map: pin {pin} closes an empty group");
            return;
        }
        if start >= u32::from(self.capacity) {
            warn!("Fixture::map: pin {pin} starts at {start}, past capacity");
            return;
        }
        let last = (end - 1).min(u32::from(self.capacity) - 1);
        // Both bounds are below the u16 capacity here.
        let range = PinRange::new(start as u16, last as u16);
        if let Err(error) = self.pins.allocate(pin, self.owner, range) {
            warn!("Fixture::map: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Fixture;
    use crate::Coord3D;
    use crate::config::FixtureConfig;
    use crate::layer::LedsLayer;
    use crate::led_strip::{FrameCapture, colors};
    use crate::projection::Projection;
    use crate::source::{FixtureEvent, Strip};

    #[test]
    fn none_layer_spans_the_fixture() {
        let mut fixture = Fixture::default();
        fixture.add_layer(LedsLayer::new(Projection::None));
        let report = fixture
            .map(&mut Strip::new(6), &mut FrameCapture::default())
            .expect("mapping must succeed");
        assert_eq!(report.layers[0].size, Coord3D::new(6, 1, 1));
        assert_eq!(report.layers[0].nr_of_leds, 6);
        assert!(fixture.layers()[0].mapping_table().is_empty());
    }

    #[test]
    fn overflow_keeps_stream_order() {
        let mut fixture = Fixture::new(FixtureConfig::new().with_max_leds(4));
        fixture.add_layer(LedsLayer::new(Projection::Default));
        let mut events: crate::source::Events = (0..6)
            .map(|x| FixtureEvent::Pixel(Coord3D::new(x, 0, 0)))
            .collect();
        let report = fixture
            .map(&mut events, &mut FrameCapture::default())
            .expect("mapping must succeed");
        assert_eq!(report.overflow_pixels, 2);
        assert_eq!(fixture.leds().len(), 4);
        assert_eq!(fixture.positions().len(), 4);
    }

    #[test]
    fn blended_pixels_mix_with_the_previous_value() {
        let mut fixture = Fixture::new(FixtureConfig::new().with_global_blend(255));
        fixture.add_layer(LedsLayer::new(Projection::Default));
        fixture
            .map(&mut Strip::new(3), &mut FrameCapture::default())
            .expect("mapping must succeed");
        assert!(fixture.set_blend_flag(1, true));

        let mut layer = fixture.layer(0).expect("layer 0 exists");
        layer.set_pixel_color(0, colors::RED);
        layer.set_pixel_color(1, colors::RED);
        assert_eq!(fixture.leds()[0], colors::RED);
        assert_eq!(fixture.leds()[1], colors::BLACK);
    }
}
