//! Integer 3D coordinates, the currency of fixture mapping.
//!
//! A [`Coord3D`] is used both as a position (a physical LED in fixture space, or a
//! pixel inside a layer's logical space) and as a size (a bounding box, a logical
//! volume).
//!
//! Comparisons are *all-components* predicates, not lexicographic ordering:
//! `a.all_le(b)` holds only when `a.x <= b.x`, `a.y <= b.y` and `a.z <= b.z`.
//! For that reason `Coord3D` does not implement [`PartialOrd`].
//!
//! ```
//! use fixture_kit::Coord3D;
//!
//! let start = Coord3D::new(0, 0, 0);
//! let end = Coord3D::new(9, 4, 0);
//! assert!(Coord3D::new(3, 2, 0).within(start, end));
//! assert!(!Coord3D::new(3, 5, 0).within(start, end));
//! assert_eq!((end - start) + Coord3D::ONE, Coord3D::new(10, 5, 1));
//! ```

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

use embedded_graphics::prelude::Point;
use serde::{Deserialize, Serialize};

/// Signed integer 3-vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Coord3D {
    /// X component.
    pub x: i32,
    /// Y component.
    pub y: i32,
    /// Z component.
    pub z: i32,
}

impl Coord3D {
    /// `{0, 0, 0}`.
    pub const ZERO: Self = Self::new(0, 0, 0);
    /// `{1, 1, 1}`; added to a bounding-box maximum to turn it into a size.
    pub const ONE: Self = Self::new(1, 1, 1);

    /// Create a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Same value on all three axes.
    #[must_use]
    pub const fn splat(value: i32) -> Self {
        Self::new(value, value, value)
    }

    /// Component-wise minimum.
    #[must_use]
    pub const fn minimum(self, other: Self) -> Self {
        Self::new(
            if self.x < other.x { self.x } else { other.x },
            if self.y < other.y { self.y } else { other.y },
            if self.z < other.z { self.z } else { other.z },
        )
    }

    /// Component-wise maximum.
    #[must_use]
    pub const fn maximum(self, other: Self) -> Self {
        Self::new(
            if self.x > other.x { self.x } else { other.x },
            if self.y > other.y { self.y } else { other.y },
            if self.z > other.z { self.z } else { other.z },
        )
    }

    /// `true` when every component is `<=` the matching component of `other`.
    #[must_use]
    pub const fn all_le(self, other: Self) -> bool {
        self.x <= other.x && self.y <= other.y && self.z <= other.z
    }

    /// `true` when every component is `>=` the matching component of `other`.
    #[must_use]
    pub const fn all_ge(self, other: Self) -> bool {
        self.x >= other.x && self.y >= other.y && self.z >= other.z
    }

    /// Inclusive box test: `start <= self <= end` on all axes.
    #[must_use]
    pub const fn within(self, start: Self, end: Self) -> bool {
        self.all_ge(start) && self.all_le(end)
    }

    /// Number of cells in a box of this size. Negative components count as zero.
    #[must_use]
    pub const fn volume(self) -> u32 {
        if self.x <= 0 || self.y <= 0 || self.z <= 0 {
            return 0;
        }
        (self.x as u32)
            .saturating_mul(self.y as u32)
            .saturating_mul(self.z as u32)
    }

    /// Number of axes longer than one cell (0 for a point, 3 for a volume).
    #[must_use]
    pub const fn dimensions(self) -> u8 {
        (self.x > 1) as u8 + (self.y > 1) as u8 + (self.z > 1) as u8
    }

    /// Euclidean distance, rounded down.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        let delta_x = self.x.abs_diff(other.x) as u128;
        let delta_y = self.y.abs_diff(other.y) as u128;
        let delta_z = self.z.abs_diff(other.z) as u128;
        let root = (delta_x * delta_x + delta_y * delta_y + delta_z * delta_z).isqrt();
        if root > u32::MAX as u128 {
            u32::MAX
        } else {
            root as u32
        }
    }

    /// Component-wise addition clamped to the `i32` range.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self::new(
            self.x.saturating_add(other.x),
            self.y.saturating_add(other.y),
            self.z.saturating_add(other.z),
        )
    }
}

impl fmt::Display for Coord3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl Add for Coord3D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Coord3D {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Coord3D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Coord3D {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for Coord3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

impl Mul<i32> for Coord3D {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<i32> for Coord3D {
    type Output = Self;

    /// Component-wise division, truncating toward zero.
    fn div(self, rhs: i32) -> Self {
        assert!(rhs != 0, "Coord3D division by zero");
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl From<(i32, i32, i32)> for Coord3D {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[u16; 3]> for Coord3D {
    fn from([x, y, z]: [u16; 3]) -> Self {
        Self::new(i32::from(x), i32::from(y), i32::from(z))
    }
}

/// An `embedded-graphics` point lies in the `z = 0` plane.
impl From<Point> for Coord3D {
    fn from(point: Point) -> Self {
        Self::new(point.x, point.y, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::Coord3D;

    #[test]
    fn comparisons_require_every_axis() {
        let small = Coord3D::new(1, 5, 1);
        let large = Coord3D::new(2, 2, 2);
        assert!(!small.all_le(large));
        assert!(!large.all_ge(small));
        assert!(Coord3D::new(1, 1, 1).all_le(large));
    }

    #[test]
    fn minimum_and_maximum_clamp_per_axis() {
        let first = Coord3D::new(1, 9, -3);
        let second = Coord3D::new(4, 2, 0);
        assert_eq!(first.minimum(second), Coord3D::new(1, 2, -3));
        assert_eq!(first.maximum(second), Coord3D::new(4, 9, 0));
    }

    #[test]
    fn volume_and_dimensions() {
        assert_eq!(Coord3D::new(10, 1, 1).volume(), 10);
        assert_eq!(Coord3D::new(10, 1, 1).dimensions(), 1);
        assert_eq!(Coord3D::new(4, 4, 4).dimensions(), 3);
        assert_eq!(Coord3D::new(0, 4, 4).volume(), 0);
        assert_eq!(Coord3D::new(-1, 4, 4).volume(), 0);
    }

    #[test]
    fn distance_rounds_down() {
        assert_eq!(Coord3D::ZERO.distance(Coord3D::new(3, 4, 0)), 5);
        assert_eq!(Coord3D::ZERO.distance(Coord3D::new(1, 1, 1)), 1);
        assert_eq!(Coord3D::new(2, 2, 2).distance(Coord3D::new(2, 2, 2)), 0);
    }

    #[test]
    fn arithmetic_is_component_wise() {
        let pixel = Coord3D::new(35, 12, 0);
        let start = Coord3D::new(10, 10, 0);
        assert_eq!((pixel - start) / 10, Coord3D::new(2, 0, 0));
        assert_eq!(start * 10, Coord3D::new(100, 100, 0));
        assert_eq!(start * Coord3D::new(1, 2, 3), Coord3D::new(10, 20, 0));
    }

    #[test]
    fn extremes_do_not_overflow() {
        let far = Coord3D::splat(i32::MAX);
        assert_eq!(far.saturating_add(Coord3D::ONE), far);
        assert_eq!(Coord3D::splat(i32::MIN).distance(far), u32::MAX);
    }
}
