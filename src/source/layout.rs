//! Panel geometry and wiring: which `(x, y)` cell each LED of a strip lights.
//!
//! See [`PanelLayout`] for linear strips, serpentine panels, rotations, flips, and
//! concatenation.

use alloc::vec;
use alloc::vec::Vec;

/// Description of a rectangular panel's wiring order.
///
/// `PanelLayout` maps the linear order of LEDs on a NeoPixel-style (WS2812) strip
/// to `(x, y)` cells. Coordinates use a screen-style convention: `(0, 0)` is the
/// top-left corner, `x` increases to the right, and `y` increases downward.
///
/// Most users start with one of the constructors, then apply transforms
/// ([`Self::rotate_cw`], [`Self::flip_h`], [`Self::concat_v`], etc.) if needed.
/// For unusual wiring, list `(x, y)` for each LED in wiring order with [`PanelLayout::new`].
///
/// Every layout is validated on construction: coordinates must be in bounds and
/// every cell must appear exactly once.
///
/// ```
/// use fixture_kit::source::PanelLayout;
///
/// let rotated = PanelLayout::serpentine_column_major(3, 2).rotate_cw();
/// let expected = PanelLayout::new(2, 3, vec![(1, 0), (0, 0), (0, 1), (1, 1), (1, 2), (0, 2)]);
/// assert_eq!(rotated, expected);
/// ```
///
/// ```text
/// Serpentine 3×2 rotated to 2×3:
///
///   Before:              After:
///     LED0  LED3  LED4     LED1  LED0
///     LED1  LED2  LED5     LED2  LED3
///                          LED5  LED4
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelLayout {
    width: u16,
    height: u16,
    map: Vec<(u16, u16)>,
}

impl PanelLayout {
    /// Layout from an explicit wiring list.
    ///
    /// # Panics
    ///
    /// When a cell is out of bounds, listed twice, or missing.
    #[must_use]
    pub fn new(width: u16, height: u16, map: Vec<(u16, u16)>) -> Self {
        assert!(width > 0 && height > 0, "width and height must be positive");
        let cell_count = usize::from(width) * usize::from(height);
        assert!(cell_count == map.len(), "width*height must equal the LED count");

        let mut seen = vec![false; cell_count];
        for &(column, row) in &map {
            assert!(column < width, "column out of bounds");
            assert!(row < height, "row out of bounds");
            let cell = usize::from(row) * usize::from(width) + usize::from(column);
            assert!(!seen[cell], "duplicate (col,row) in mapping");
            seen[cell] = true;
        }

        Self { width, height, map }
    }

    /// Wiring order to `(x, y)`.
    #[must_use]
    pub fn index_to_xy(&self) -> &[(u16, u16)] {
        &self.map
    }

    /// Row-major cell number to wiring index.
    #[must_use]
    pub fn xy_to_index(&self) -> Vec<u16> {
        let mut mapping = vec![0u16; self.map.len()];
        for (led_index, &(column, row)) in (0u16..).zip(&self.map) {
            mapping[usize::from(row) * usize::from(self.width) + usize::from(column)] = led_index;
        }
        mapping
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of LEDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `false` for every valid layout.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Single-row strip, left to right.
    ///
    /// ```text
    /// LED0  LED1  LED2  LED3  LED4  LED5
    /// ```
    #[must_use]
    pub fn linear_h(len: u16) -> Self {
        Self::new(len, 1, (0..len).map(|x_index| (x_index, 0)).collect())
    }

    /// Single-column strip, top to bottom.
    #[must_use]
    pub fn linear_v(len: u16) -> Self {
        Self::new(1, len, (0..len).map(|y_index| (0, y_index)).collect())
    }

    /// Every row left to right, rows top to bottom.
    ///
    /// ```text
    ///   LED0  LED1  LED2
    ///   LED3  LED4  LED5
    /// ```
    #[must_use]
    pub fn row_major(width: u16, height: u16) -> Self {
        let map = (0..height)
            .flat_map(|y_index| (0..width).map(move |x_index| (x_index, y_index)))
            .collect();
        Self::new(width, height, map)
    }

    /// Strip snakes across rows.
    ///
    /// ```text
    ///   LED0  LED1  LED2
    ///   LED5  LED4  LED3
    /// ```
    #[must_use]
    pub fn serpentine_row_major(width: u16, height: u16) -> Self {
        let map = (0..height)
            .flat_map(|y_index| {
                (0..width).map(move |step| {
                    let x_index = if y_index % 2 == 0 { step } else { width - 1 - step };
                    (x_index, y_index)
                })
            })
            .collect();
        Self::new(width, height, map)
    }

    /// Strip snakes down columns.
    ///
    /// ```text
    ///   LED0  LED3  LED4
    ///   LED1  LED2  LED5
    /// ```
    #[must_use]
    pub fn serpentine_column_major(width: u16, height: u16) -> Self {
        let map = (0..width)
            .flat_map(|x_index| {
                (0..height).map(move |step| {
                    // Even column: top-to-bottom; odd column: bottom-to-top
                    let y_index = if x_index % 2 == 0 { step } else { height - 1 - step };
                    (x_index, y_index)
                })
            })
            .collect();
        Self::new(width, height, map)
    }

    /// Rotate 90° clockwise (dims swap).
    #[must_use]
    pub fn rotate_cw(&self) -> Self {
        let map = self
            .map
            .iter()
            .map(|&(column, row)| (self.height - 1 - row, column))
            .collect();
        Self::new(self.height, self.width, map)
    }

    /// Rotate 180°.
    #[must_use]
    pub fn rotate_180(&self) -> Self {
        self.rotate_cw().rotate_cw()
    }

    /// Rotate 90° counter-clockwise.
    #[must_use]
    pub fn rotate_ccw(&self) -> Self {
        self.rotate_cw().rotate_cw().rotate_cw()
    }

    /// Mirror columns.
    ///
    /// ```text
    /// Before (serpentine): After:
    ///   LED0  LED3  LED4      LED4  LED3  LED0
    ///   LED1  LED2  LED5      LED5  LED2  LED1
    /// ```
    #[must_use]
    pub fn flip_h(&self) -> Self {
        let map = self
            .map
            .iter()
            .map(|&(column, row)| (self.width - 1 - column, row))
            .collect();
        Self::new(self.width, self.height, map)
    }

    /// Mirror rows.
    #[must_use]
    pub fn flip_v(&self) -> Self {
        self.rotate_cw().flip_h().rotate_ccw()
    }

    /// Wire `right` after `self`, placed to its right. Heights must match.
    ///
    /// ```text
    /// Left (3×2):    Right (3×2):     Combined (6×2):
    ///   0  3  4        6  9 10          0  3  4  6  9 10
    ///   1  2  5        7  8 11          1  2  5  7  8 11
    /// ```
    #[must_use]
    pub fn concat_h(&self, right: &Self) -> Self {
        assert!(self.height == right.height, "concat_h requires equal heights");
        let map = self
            .map
            .iter()
            .copied()
            .chain(
                right
                    .map
                    .iter()
                    .map(|&(column, row)| (column + self.width, row)),
            )
            .collect();
        Self::new(self.width + right.width, self.height, map)
    }

    /// Wire `bottom` after `self`, placed below it. Widths must match.
    #[must_use]
    pub fn concat_v(&self, bottom: &Self) -> Self {
        assert!(self.width == bottom.width, "concat_v requires equal widths");
        let map = self
            .map
            .iter()
            .copied()
            .chain(
                bottom
                    .map
                    .iter()
                    .map(|&(column, row)| (column, row + self.height)),
            )
            .collect();
        Self::new(self.width, self.height + bottom.height, map)
    }
}

#[cfg(test)]
mod tests {
    use super::PanelLayout;

    #[test]
    fn xy_to_index_inverts_wiring() {
        let layout = PanelLayout::serpentine_row_major(3, 2);
        assert_eq!(layout.xy_to_index(), [0, 1, 2, 5, 4, 3]);
    }

    #[test]
    fn rotate_ccw_undoes_rotate_cw() {
        let layout = PanelLayout::serpentine_column_major(4, 3);
        assert_eq!(layout.rotate_cw().rotate_ccw(), layout);
        assert_eq!(layout.rotate_180().rotate_180(), layout);
    }
}
