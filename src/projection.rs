//! Projections: how a physical position inside a layer's sub-region becomes a
//! logical index.
//!
//! [`Projection`] is a closed, `Copy` enum. [`Projection::None`] and
//! [`Projection::Random`] bypass the mapping table entirely; [`Projection::Default`]
//! is the identity mapping; [`Projection::Custom`] dispatches to any `'static`
//! implementation of [`Project`], including the geometric ones in [`builtin`].
//!
//! A projection is consulted once per physical pixel during mapping and must be a
//! pure function of its [`ProjectionContext`], so remapping the same fixture always
//! produces the same tables.

use core::fmt;

use log::warn;

use crate::Coord3D;

pub mod builtin;

/// Inputs handed to [`Project::setup`] for one physical pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProjectionContext {
    /// Logical size produced by the previous pixel of this cycle (`ZERO` on the first).
    pub layer_size: Coord3D,
    /// Size of the layer's sub-region, in fixture units.
    pub region_size: Coord3D,
    /// Position of the pixel relative to the sub-region start.
    pub pixel: Coord3D,
    /// Layer midpoint, clamped to the fixture.
    pub midpoint: Coord3D,
}

/// Result of [`Project::setup`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Projected {
    /// Logical size of the layer.
    pub size: Coord3D,
    /// Logical index of this pixel, or `None` when the pixel does not take part.
    ///
    /// Indexes past `size.volume()` or the virtual LED capacity are rejected by the
    /// caller, so an implementation may return any value here.
    pub index: Option<u32>,
}

/// A geometric projection usable as [`Projection::Custom`].
///
/// Implementations take `&self` only and must not keep state between calls.
pub trait Project: Sync {
    /// Display name, used by [`Projection::name`] and in logs.
    fn name(&self) -> &'static str;

    /// Compute the logical size and the logical index of one physical pixel.
    fn setup(&self, context: &ProjectionContext) -> Projected;
}

/// How a layer turns physical positions into logical indexes.
#[derive(Clone, Copy, Default)]
pub enum Projection {
    /// No table: logical index = physical index.
    None,
    /// No table: logical indexes are scattered over the physical buffer.
    Random,
    /// Identity: the logical space is the sub-region, indexed row-major.
    #[default]
    Default,
    /// A user-supplied or built-in geometric projection.
    Custom(&'static dyn Project),
}

/// Projections selectable by index, in index order.
const SELECTABLE: [Projection; 8] = [
    Projection::None,
    Projection::Random,
    Projection::Default,
    Projection::Custom(&builtin::Reverse),
    Projection::Custom(&builtin::Mirror),
    Projection::Custom(&builtin::Transpose),
    Projection::Custom(&builtin::Multiply),
    Projection::Custom(&builtin::DistanceFromPoint),
];

impl Projection {
    /// Number of projections reachable through [`Projection::from_index`].
    pub const COUNT: usize = SELECTABLE.len();

    /// Select a projection by its position in the selection list.
    ///
    /// Out-of-range indexes fall back to [`Projection::Default`].
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        SELECTABLE.get(index).copied().unwrap_or_else(|| {
            warn!("Projection::from_index: projection {index} not found, switching to Default");
            Self::Default
        })
    }

    /// Names of the selectable projections, in index order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        SELECTABLE.iter().map(Self::name)
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Random => "Random",
            Self::Default => "Default",
            Self::Custom(project) => project.name(),
        }
    }

    /// `true` when the layer is addressed through a mapping table.
    #[must_use]
    pub const fn uses_table(&self) -> bool {
        matches!(self, Self::Default | Self::Custom(_))
    }

    /// Run the projection for one pixel. Table-less projections never place pixels.
    #[must_use]
    pub fn setup(&self, context: &ProjectionContext) -> Projected {
        match self {
            Self::None | Self::Random => Projected {
                size: context.region_size,
                index: None,
            },
            Self::Default => Projected {
                size: context.region_size,
                index: linear_index(context.pixel, context.region_size),
            },
            Self::Custom(project) => project.setup(context),
        }
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None)
            | (Self::Random, Self::Random)
            | (Self::Default, Self::Default) => true,
            (Self::Custom(first), Self::Custom(second)) => first.name() == second.name(),
            _ => false,
        }
    }
}

impl Eq for Projection {}

/// Row-major index of `pixel` inside a box of `size`: `x + y·w + z·w·h`.
///
/// Returns `None` when the pixel lies outside the box. Indexes past `u32::MAX`
/// saturate.
#[must_use]
pub fn linear_index(pixel: Coord3D, size: Coord3D) -> Option<u32> {
    if !pixel.within(Coord3D::ZERO, size - Coord3D::ONE) {
        return None;
    }
    let index = i64::from(pixel.x)
        + i64::from(pixel.y) * i64::from(size.x)
        + i64::from(pixel.z) * i64::from(size.x) * i64::from(size.y);
    Some(u32::try_from(index).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::{Projection, ProjectionContext, linear_index};
    use crate::Coord3D;

    fn context(pixel: Coord3D, region_size: Coord3D) -> ProjectionContext {
        ProjectionContext {
            layer_size: Coord3D::ZERO,
            region_size,
            pixel,
            midpoint: Coord3D::ZERO,
        }
    }

    #[test]
    fn linear_index_is_row_major() {
        let size = Coord3D::new(4, 3, 2);
        assert_eq!(linear_index(Coord3D::new(0, 0, 0), size), Some(0));
        assert_eq!(linear_index(Coord3D::new(3, 0, 0), size), Some(3));
        assert_eq!(linear_index(Coord3D::new(0, 1, 0), size), Some(4));
        assert_eq!(linear_index(Coord3D::new(3, 2, 1), size), Some(23));
        assert_eq!(linear_index(Coord3D::new(4, 0, 0), size), None);
    }

    #[test]
    fn default_projection_sizes_to_region() {
        let projected =
            Projection::Default.setup(&context(Coord3D::new(2, 1, 0), Coord3D::new(5, 5, 1)));
        assert_eq!(projected.size, Coord3D::new(5, 5, 1));
        assert_eq!(projected.index, Some(7));
    }

    #[test]
    fn table_less_projections_never_place() {
        let region = Coord3D::new(5, 1, 1);
        assert_eq!(Projection::None.setup(&context(Coord3D::ZERO, region)).index, None);
        assert_eq!(Projection::Random.setup(&context(Coord3D::ZERO, region)).index, None);
        assert!(!Projection::Random.uses_table());
        assert!(Projection::Default.uses_table());
    }

    #[test]
    fn selection_by_index_falls_back_to_default() {
        assert_eq!(Projection::from_index(0), Projection::None);
        assert_eq!(Projection::from_index(2), Projection::Default);
        assert_eq!(Projection::from_index(4).name(), "Mirror");
        assert_eq!(Projection::from_index(Projection::COUNT), Projection::Default);
        assert_eq!(Projection::names().count(), Projection::COUNT);
    }
}
