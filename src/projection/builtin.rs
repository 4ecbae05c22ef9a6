//! Geometric projections shipped with the crate, usable as [`Projection::Custom`].
//!
//! ```
//! use fixture_kit::projection::{Projection, builtin::Mirror};
//!
//! let mirrored = Projection::Custom(&Mirror);
//! assert_eq!(mirrored.name(), "Mirror");
//! ```
//!
//! [`Projection::Custom`]: super::Projection::Custom

use super::{Project, Projected, ProjectionContext, linear_index};
use crate::Coord3D;

/// Walks the x axis backwards: the last LED of the region is logical index 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reverse;

impl Project for Reverse {
    fn name(&self) -> &'static str {
        "Reverse"
    }

    fn setup(&self, context: &ProjectionContext) -> Projected {
        let size = context.region_size;
        let mut pixel = context.pixel;
        pixel.x = size.x - 1 - pixel.x;
        Projected {
            size,
            index: linear_index(pixel, size),
        }
    }
}

/// Folds every axis longer than one LED in half, so both halves show the same content.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mirror;

impl Project for Mirror {
    fn name(&self) -> &'static str {
        "Mirror"
    }

    fn setup(&self, context: &ProjectionContext) -> Projected {
        let region = context.region_size;
        let size = halve(region);
        let pixel = Coord3D::new(
            fold(context.pixel.x, region.x, size.x),
            fold(context.pixel.y, region.y, size.y),
            fold(context.pixel.z, region.z, size.z),
        );
        Projected {
            size,
            index: linear_index(pixel, size),
        }
    }
}

/// Swaps the x and y axes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Transpose;

impl Project for Transpose {
    fn name(&self) -> &'static str {
        "Transpose"
    }

    fn setup(&self, context: &ProjectionContext) -> Projected {
        let region = context.region_size;
        let size = Coord3D::new(region.y, region.x, region.z);
        let pixel = Coord3D::new(context.pixel.y, context.pixel.x, context.pixel.z);
        Projected {
            size,
            index: linear_index(pixel, size),
        }
    }
}

/// Repeats a half-size logical space as a 2×2 tile in the x/y plane.
#[derive(Clone, Copy, Debug, Default)]
pub struct Multiply;

impl Project for Multiply {
    fn name(&self) -> &'static str {
        "Multiply"
    }

    fn setup(&self, context: &ProjectionContext) -> Projected {
        let region = context.region_size;
        let size = Coord3D::new(
            (region.x + 1) / 2,
            (region.y + 1) / 2,
            region.z,
        );
        let pixel = Coord3D::new(
            context.pixel.x % size.x.max(1),
            context.pixel.y % size.y.max(1),
            context.pixel.z,
        );
        Projected {
            size,
            index: linear_index(pixel, size),
        }
    }
}

/// Collapses the region into a 1D logical strip ordered by distance from the midpoint.
///
/// Logical index `d` addresses every LED whose (rounded-down) distance to the
/// midpoint is `d`, so effects drawn on the strip radiate outwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistanceFromPoint;

impl Project for DistanceFromPoint {
    fn name(&self) -> &'static str {
        "DistanceFromPoint"
    }

    fn setup(&self, context: &ProjectionContext) -> Projected {
        let last = context.region_size - Coord3D::ONE;
        let midpoint = context.midpoint.minimum(last).maximum(Coord3D::ZERO);

        let mut farthest = 0;
        for corner_bits in 0..8 {
            let corner = Coord3D::new(
                if corner_bits & 1 == 0 { 0 } else { last.x },
                if corner_bits & 2 == 0 { 0 } else { last.y },
                if corner_bits & 4 == 0 { 0 } else { last.z },
            );
            farthest = farthest.max(corner.distance(midpoint));
        }

        let length = i32::try_from(farthest).unwrap_or(i32::MAX - 1) + 1;
        Projected {
            size: Coord3D::new(length, 1, 1),
            index: Some(context.pixel.distance(midpoint)),
        }
    }
}

const fn halve(region: Coord3D) -> Coord3D {
    Coord3D::new(
        (region.x + 1) / 2,
        (region.y + 1) / 2,
        (region.z + 1) / 2,
    )
}

const fn fold(position: i32, region: i32, half: i32) -> i32 {
    if position >= half { region - 1 - position } else { position }
}
