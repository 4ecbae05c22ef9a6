//! Layers: independently addressed rendering surfaces over one physical buffer.
//!
//! A [`LedsLayer`] holds a layer's settings (projection, sub-region, midpoint) and
//! the mapping table built for it by [`Fixture::map`](crate::fixture::Fixture::map).
//! Effects draw through a [`Layer`], a short-lived view that borrows the layer and
//! the fixture's physical buffer together:
//!
//! ```
//! use fixture_kit::Coord3D;
//! use fixture_kit::fixture::Fixture;
//! use fixture_kit::layer::LedsLayer;
//! use fixture_kit::led_strip::{FrameCapture, colors};
//! use fixture_kit::projection::Projection;
//! use fixture_kit::source::{Panel, PanelLayout};
//!
//! let mut fixture = Fixture::default();
//! fixture.add_layer(LedsLayer::new(Projection::Default));
//! let mut panel = Panel::new(PanelLayout::serpentine_row_major(4, 4));
//! fixture.map(&mut panel, &mut FrameCapture::default())?;
//!
//! let mut layer = fixture.layer(0).expect("layer 0 exists");
//! assert_eq!(layer.size(), Coord3D::new(4, 4, 1));
//! layer.set_pixel_color_at(Coord3D::new(0, 1, 0), colors::GREEN);
//! // Row 1 runs right-to-left on a serpentine panel, so (0, 1) is LED 7.
//! assert_eq!(fixture.leds()[7], colors::GREEN);
//! # Ok::<(), fixture_kit::Error>(())
//! ```
//!
//! Layers also implement `embedded-graphics`'s [`DrawTarget`], drawing in the
//! `z = 0` plane of their logical space.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::Pixel;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::Rgb888;
use log::{debug, info, trace, warn};

use crate::Coord3D;
use crate::led_strip::{RGB8, ToRgb8, blend, rainbow, scale8};
use crate::projection::{Projection, ProjectionContext, linear_index};

mod phys_map;

pub use phys_map::PhysMap;

const BLACK: RGB8 = RGB8::new(0, 0, 0);

/// Settings and mapping tables of one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedsLayer {
    projection: Projection,
    start_pos: Coord3D,
    end_pos: Coord3D,
    mid_pos: Coord3D,
    size: Coord3D,
    nr_of_leds: u32,
    projection_dimension: u8,
    do_map: bool,
    mapping_table: Vec<PhysMap>,
    mapping_table_indexes: Vec<Vec<u16>>,
    scatter: Scatter,
}

impl LedsLayer {
    /// Layer covering the whole fixture, waiting for its first mapping.
    #[must_use]
    pub const fn new(projection: Projection) -> Self {
        Self {
            projection,
            start_pos: Coord3D::ZERO,
            end_pos: Coord3D::splat(u16::MAX as i32),
            mid_pos: Coord3D::ZERO,
            size: Coord3D::ZERO,
            nr_of_leds: 0,
            projection_dimension: 0,
            do_map: true,
            mapping_table: Vec::new(),
            mapping_table_indexes: Vec::new(),
            scatter: Scatter::IDENTITY,
        }
    }

    /// Restrict the layer to the inclusive box `start..=end`, in fixture units.
    ///
    /// Both corners are clamped to the fixture when mapping.
    #[must_use]
    pub fn with_region(mut self, start: Coord3D, end: Coord3D) -> Self {
        self.set_region(start, end);
        self
    }

    /// Set the point radial projections measure from, in fixture units.
    #[must_use]
    pub fn with_midpoint(mut self, midpoint: Coord3D) -> Self {
        self.mid_pos = midpoint;
        self
    }

    /// Change the sub-region; takes effect at the next mapping cycle.
    pub fn set_region(&mut self, start: Coord3D, end: Coord3D) {
        assert!(start.all_le(end), "layer region start must not exceed end");
        self.start_pos = start;
        self.end_pos = end;
        self.do_map = true;
    }

    /// Change the projection; takes effect at the next mapping cycle.
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.do_map = true;
    }

    /// The layer's projection.
    #[must_use]
    pub const fn projection(&self) -> Projection {
        self.projection
    }

    /// Logical size (the fixture size for table-less projections).
    #[must_use]
    pub const fn size(&self) -> Coord3D {
        self.size
    }

    /// Number of logical LEDs.
    #[must_use]
    pub const fn nr_of_leds(&self) -> u32 {
        self.nr_of_leds
    }

    /// Number of sub-region axes longer than one LED.
    #[must_use]
    pub const fn projection_dimension(&self) -> u8 {
        self.projection_dimension
    }

    /// `true` until the next mapping cycle rebuilds this layer.
    #[must_use]
    pub const fn needs_mapping(&self) -> bool {
        self.do_map
    }

    /// Logical index to physical target(s).
    #[must_use]
    pub fn mapping_table(&self) -> &[PhysMap] {
        &self.mapping_table
    }

    /// Physical index lists referenced by [`PhysMap::ManyPixels`] entries.
    #[must_use]
    pub fn mapping_groups(&self) -> &[Vec<u16>] {
        &self.mapping_table_indexes
    }

    pub(crate) fn mark_for_mapping(&mut self) {
        self.do_map = true;
    }

    /// Copy of the settings with empty tables, ready for pass 2.
    pub(crate) fn staged(&self) -> Self {
        Self {
            start_pos: self.start_pos,
            end_pos: self.end_pos,
            mid_pos: self.mid_pos,
            ..Self::new(self.projection)
        }
    }

    /// Offer physical LED `index_p` at `pixel` to this layer (pass 2).
    pub(crate) fn place(&mut self, pixel: Coord3D, index_p: u16, geometry: &MapGeometry) -> Placement {
        if !self.projection.uses_table() {
            return Placement::Outside;
        }

        let last = geometry.fix_size - Coord3D::ONE;
        let start = self.start_pos.minimum(last) * geometry.scale;
        let end = self.end_pos.minimum(last) * geometry.scale;
        let midpoint = self.mid_pos.minimum(last);
        if !pixel.within(start, end) {
            return Placement::Outside;
        }

        let region_size = (end - start) / geometry.scale + Coord3D::ONE;
        self.projection_dimension = region_size.dimensions();

        let projected = self.projection.setup(&ProjectionContext {
            layer_size: self.size,
            region_size,
            pixel: (pixel - start) / geometry.scale,
            midpoint,
        });
        if projected.size != self.size {
            self.size = projected.size;
            let wanted = projected.size.volume().min(u32::from(geometry.max_virtual_leds)) as usize;
            self.mapping_table
                .reserve(wanted.saturating_sub(self.mapping_table.len()));
        }

        let Some(index) = projected.index else {
            return Placement::NotParticipating;
        };
        if index >= projected.size.volume() || index >= u32::from(geometry.max_virtual_leds) {
            debug!(
                "LedsLayer::place: logical index {} too high (size {}, max {}) for physical {} at {}",
                index, projected.size, geometry.max_virtual_leds, index_p, pixel
            );
            return Placement::Rejected;
        }

        // Below `max_virtual_leds`, so it fits.
        let slot = index as usize;
        if slot >= self.mapping_table.len() {
            self.mapping_table.resize(slot + 1, PhysMap::default());
        }
        self.mapping_table[slot].add_physical(index_p, &mut self.mapping_table_indexes);
        trace!("LedsLayer::place: physical {index_p} at {pixel} -> logical {index}");
        Placement::Placed
    }

    /// Close pass 2: size the table and summarize it.
    pub(crate) fn finalize(
        &mut self,
        fix_size: Coord3D,
        fixture_leds: u32,
        physical_span: usize,
        max_virtual_leds: u16,
    ) -> LayerReport {
        let mut report = LayerReport::default();

        if self.projection.uses_table() {
            let volume = self.size.volume();
            let capped = volume.min(u32::from(max_virtual_leds));
            if capped < volume {
                warn!(
                    "LedsLayer::finalize: logical volume {volume} capped at {max_virtual_leds}"
                );
            }
            if self.mapping_table.len() < capped as usize {
                debug!(
                    "LedsLayer::finalize: padding table from {} to {}",
                    self.mapping_table.len(),
                    capped
                );
                self.mapping_table.resize(capped as usize, PhysMap::default());
            }
            self.nr_of_leds = u32::try_from(self.mapping_table.len()).unwrap_or(u32::MAX);

            for entry in &self.mapping_table {
                report.logical += 1;
                match entry {
                    PhysMap::Color(_) => report.color += 1,
                    PhysMap::OnePixel(_) => report.one_pixel += 1,
                    PhysMap::ManyPixels(group) => {
                        report.many_pixel_members += self
                            .mapping_table_indexes
                            .get(usize::from(*group))
                            .map_or(0, |members| members.len() as u32);
                    }
                }
            }
            report.many_pixel_groups = self.mapping_table_indexes.len() as u32;
        } else {
            self.size = fix_size;
            self.nr_of_leds = fixture_leds;
            self.projection_dimension = fix_size.dimensions();
            self.mapping_table.clear();
            self.mapping_table_indexes.clear();
            if matches!(self.projection, Projection::Random) {
                self.scatter = Scatter::new(physical_span);
            }
        }

        report.size = self.size;
        report.nr_of_leds = self.nr_of_leds;
        self.do_map = false;
        report
    }

    pub(crate) fn hash_into(&self, hasher: &mut crc32fast::Hasher) {
        for value in [self.size.x, self.size.y, self.size.z] {
            hasher.update(&value.to_le_bytes());
        }
        hasher.update(&self.nr_of_leds.to_le_bytes());
        for entry in &self.mapping_table {
            hasher.update(&[entry.tag()]);
            hasher.update(&entry.value().to_le_bytes());
        }
        for group in &self.mapping_table_indexes {
            hasher.update(&(group.len() as u32).to_le_bytes());
            for index_p in group {
                hasher.update(&index_p.to_le_bytes());
            }
        }
    }
}

impl Default for LedsLayer {
    fn default() -> Self {
        Self::new(Projection::Default)
    }
}

/// Fixture geometry shared by every layer during pass 2.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MapGeometry {
    pub(crate) fix_size: Coord3D,
    pub(crate) scale: i32,
    pub(crate) max_virtual_leds: u16,
}

/// Outcome of offering one physical LED to a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Outside,
    NotParticipating,
    Rejected,
    Placed,
}

/// Per-layer summary of a mapping cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerReport {
    /// Position of the layer in the fixture.
    pub layer: usize,
    /// Logical size.
    pub size: Coord3D,
    /// Number of logical LEDs.
    pub nr_of_leds: u32,
    /// Table entries.
    pub logical: u32,
    /// Entries backed by exactly one physical LED.
    pub one_pixel: u32,
    /// Entries backed by several physical LEDs.
    pub many_pixel_groups: u32,
    /// Physical LEDs reached through many-pixel entries.
    pub many_pixel_members: u32,
    /// Entries with no physical LED.
    pub color: u32,
}

impl LayerReport {
    pub(crate) fn log(&self, projection: Projection) {
        info!(
            "Fixture::map: layer {} ({}) {} -> {} (v:{} p:{} pm:{} of {} c:{})",
            self.layer,
            projection.name(),
            self.size,
            self.nr_of_leds,
            self.logical,
            self.one_pixel,
            self.many_pixel_members,
            self.many_pixel_groups,
            self.color
        );
    }
}

/// Permutation used by [`Projection::Random`]: `i -> i·stride mod span`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Scatter {
    stride: usize,
    span: usize,
}

impl Scatter {
    const IDENTITY: Self = Self { stride: 1, span: 0 };

    fn new(span: usize) -> Self {
        if span < 3 {
            return Self { stride: 1, span };
        }
        let mut stride = (span * 5 / 8).max(2);
        while gcd(stride, span) != 1 {
            stride += 1;
        }
        Self { stride, span }
    }

    fn apply(self, index: usize) -> usize {
        if index < self.span {
            (index * self.stride) % self.span
        } else {
            index
        }
    }
}

const fn gcd(mut first: usize, mut second: usize) -> usize {
    while second != 0 {
        let remainder = first % second;
        first = second;
        second = remainder;
    }
    first
}

/// The fixture's physical color buffer plus per-pixel blend flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PhysicalLeds {
    leds: Vec<RGB8>,
    blend_flags: Vec<u32>,
    blend_len: usize,
    global_blend: u8,
    active: usize,
}

impl PhysicalLeds {
    pub(crate) fn new(capacity: usize, global_blend: u8) -> Self {
        Self {
            leds: vec![BLACK; capacity],
            blend_flags: Vec::new(),
            blend_len: 0,
            global_blend,
            active: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.leds.len()
    }

    /// LEDs of the current fixture (never more than the capacity).
    pub(crate) fn active(&self) -> &[RGB8] {
        &self.leds[..self.active]
    }

    pub(crate) fn all(&self) -> &[RGB8] {
        &self.leds
    }

    pub(crate) fn set_active(&mut self, active: usize) {
        self.active = active.min(self.leds.len());
    }

    pub(crate) fn clear(&mut self) {
        self.leds.fill(BLACK);
    }

    /// Grow the blend-flag vector to `len` flags; it never shrinks.
    pub(crate) fn grow_blend_flags(&mut self, len: usize) {
        if len > self.blend_len {
            self.blend_len = len;
            self.blend_flags.resize(len.div_ceil(32), 0);
        }
    }

    pub(crate) fn blend_flag(&self, index: usize) -> bool {
        index < self.blend_len
            && self
                .blend_flags
                .get(index / 32)
                .is_some_and(|word| word & (1 << (index % 32)) != 0)
    }

    pub(crate) fn set_blend_flag(&mut self, index: usize, blend_pixel: bool) -> bool {
        if index >= self.blend_len {
            return false;
        }
        let Some(word) = self.blend_flags.get_mut(index / 32) else {
            return false;
        };
        if blend_pixel {
            *word |= 1 << (index % 32);
        } else {
            *word &= !(1 << (index % 32));
        }
        true
    }

    pub(crate) const fn set_global_blend(&mut self, global_blend: u8) {
        self.global_blend = global_blend;
    }

    fn write(&mut self, index: usize, color: RGB8) {
        let blend_pixel = self.blend_flag(index);
        let global_blend = self.global_blend;
        if let Some(slot) = self.leds.get_mut(index) {
            *slot = if blend_pixel {
                blend(color, *slot, global_blend)
            } else {
                color
            };
        }
    }

    fn read(&self, index: usize) -> Option<RGB8> {
        self.leds.get(index).copied()
    }
}

/// Pixel access to one layer, borrowed from its [`Fixture`](crate::fixture::Fixture).
pub struct Layer<'a> {
    leds_layer: &'a mut LedsLayer,
    physical: &'a mut PhysicalLeds,
    layer_count: usize,
}

impl<'a> Layer<'a> {
    pub(crate) fn new(
        leds_layer: &'a mut LedsLayer,
        physical: &'a mut PhysicalLeds,
        layer_count: usize,
    ) -> Self {
        Self {
            leds_layer,
            physical,
            layer_count,
        }
    }

    /// Logical size.
    #[must_use]
    pub const fn size(&self) -> Coord3D {
        self.leds_layer.size
    }

    /// Number of logical LEDs.
    #[must_use]
    pub const fn nr_of_leds(&self) -> u32 {
        self.leds_layer.nr_of_leds
    }

    /// Number of sub-region axes longer than one LED.
    #[must_use]
    pub const fn projection_dimension(&self) -> u8 {
        self.leds_layer.projection_dimension
    }

    /// Logical index of a logical position, or `None` outside the layer.
    #[must_use]
    pub fn xyz(&self, position: Coord3D) -> Option<u16> {
        linear_index(position, self.leds_layer.size).and_then(|index| u16::try_from(index).ok())
    }

    /// Write one logical LED.
    ///
    /// Mapped entries write their physical LED(s), blending where the pixel's blend
    /// flag is set. Unmapped entries remember the color. Indexes past the table but
    /// inside the physical buffer write straight through.
    pub fn set_pixel_color(&mut self, index: u16, color: RGB8) {
        let slot = usize::from(index);
        let layer = &mut *self.leds_layer;
        match layer.mapping_table.get_mut(slot) {
            Some(entry) => match *entry {
                PhysMap::Color(_) => *entry = PhysMap::Color(PhysMap::pack(color)),
                PhysMap::OnePixel(index_p) => self.physical.write(usize::from(index_p), color),
                PhysMap::ManyPixels(group) => {
                    if let Some(members) = layer.mapping_table_indexes.get(usize::from(group)) {
                        for index_p in members {
                            self.physical.write(usize::from(*index_p), color);
                        }
                    }
                }
            },
            None if slot < self.physical.capacity() => {
                let target = layer.scatter.apply(slot);
                self.physical.write(target, color);
            }
            None => debug!(
                "Layer::set_pixel_color: index {} >= capacity {}",
                index,
                self.physical.capacity()
            ),
        }
    }

    /// Read one logical LED; the first member answers for a many-pixel entry.
    #[must_use]
    pub fn get_pixel_color(&self, index: u16) -> RGB8 {
        let slot = usize::from(index);
        let layer = &*self.leds_layer;
        let color = match layer.mapping_table.get(slot) {
            Some(PhysMap::Color(packed)) => Some(PhysMap::unpack(*packed)),
            Some(PhysMap::OnePixel(index_p)) => self.physical.read(usize::from(*index_p)),
            Some(PhysMap::ManyPixels(group)) => layer
                .mapping_table_indexes
                .get(usize::from(*group))
                .and_then(|members| members.first())
                .and_then(|index_p| self.physical.read(usize::from(*index_p))),
            None => self.physical.read(layer.scatter.apply(slot)),
        };
        color.unwrap_or_else(|| {
            debug!(
                "Layer::get_pixel_color: index {} >= capacity {}",
                index,
                self.physical.capacity()
            );
            BLACK
        })
    }

    /// Mix `color` into the current value. `amount` is the share of the current
    /// value kept: 0 writes `color`, 255 leaves the LED as it was.
    pub fn blend_pixel_color(&mut self, index: u16, color: RGB8, amount: u8) {
        let current = self.get_pixel_color(index);
        self.set_pixel_color(index, blend(color, current, amount));
    }

    /// Write the LED at a logical position; positions outside the layer are ignored.
    pub fn set_pixel_color_at(&mut self, position: Coord3D, color: RGB8) {
        if let Some(index) = self.xyz(position) {
            self.set_pixel_color(index, color);
        }
    }

    /// Read the LED at a logical position; black outside the layer.
    #[must_use]
    pub fn get_pixel_color_at(&self, position: Coord3D) -> RGB8 {
        self.xyz(position)
            .map_or(BLACK, |index| self.get_pixel_color(index))
    }

    /// Paint every LED of the layer.
    pub fn fill_solid(&mut self, color: RGB8) {
        if self.whole_buffer() {
            let active = self.physical.active;
            self.physical.leds[..active].fill(color);
        } else {
            for index in self.logical_indexes() {
                self.set_pixel_color(index, color);
            }
        }
    }

    /// Rainbow across the layer starting at `initial_hue`, stepping `delta_hue` per LED.
    pub fn fill_rainbow(&mut self, initial_hue: u8, delta_hue: u8) {
        let mut hue = initial_hue;
        if self.whole_buffer() {
            let active = self.physical.active;
            for led in &mut self.physical.leds[..active] {
                *led = rainbow(hue);
                hue = hue.wrapping_add(delta_hue);
            }
        } else {
            for index in self.logical_indexes() {
                self.set_pixel_color(index, rainbow(hue));
                hue = hue.wrapping_add(delta_hue);
            }
        }
    }

    /// Dim every LED of the layer by `fade_by / 256`.
    pub fn fade_to_black_by(&mut self, fade_by: u8) {
        let keep = 255 - fade_by;
        if self.whole_buffer() {
            let active = self.physical.active;
            for led in &mut self.physical.leds[..active] {
                *led = scale8(*led, keep);
            }
        } else {
            for index in self.logical_indexes() {
                let color = self.get_pixel_color(index);
                self.set_pixel_color(index, scale8(color, keep));
            }
        }
    }

    fn whole_buffer(&self) -> bool {
        !self.leds_layer.projection.uses_table() || self.layer_count == 1
    }

    fn logical_indexes(&self) -> impl Iterator<Item = u16> + use<> {
        let len = u16::try_from(self.leds_layer.mapping_table.len()).unwrap_or(u16::MAX);
        0..len
    }
}

impl OriginDimensions for Layer<'_> {
    fn size(&self) -> Size {
        let size = self.leds_layer.size;
        Size::new(size.x.max(0) as u32, size.y.max(0) as u32)
    }
}

impl DrawTarget for Layer<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.set_pixel_color_at(Coord3D::from(coord), color.to_rgb8());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Scatter, gcd};
    use alloc::vec;

    #[test]
    fn scatter_is_a_permutation() {
        for span in [3, 10, 16, 256, 1000] {
            let scatter = Scatter::new(span);
            assert_eq!(gcd(scatter.stride, span), 1);
            let mut seen = vec![false; span];
            for index in 0..span {
                let target = scatter.apply(index);
                assert!(!seen[target], "span {span} hits {target} twice");
                seen[target] = true;
            }
        }
    }

    #[test]
    fn scatter_leaves_indexes_past_the_span_alone() {
        let scatter = Scatter::new(10);
        assert_eq!(scatter.apply(10), 10);
        assert_eq!(scatter.apply(4000), 4000);
    }
}
