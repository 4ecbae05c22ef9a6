//! One entry of a layer's mapping table.

use alloc::vec;
use alloc::vec::Vec;

use smart_leds::RGB8;

/// What a logical index resolves to.
///
/// Entries start as [`PhysMap::Color`] and are promoted one way during a mapping
/// cycle: `Color -> OnePixel -> ManyPixels`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhysMap {
    /// No physical LED; remembers the last color written, packed as r5/g5/b4.
    Color(u16),
    /// Exactly one physical LED.
    OnePixel(u16),
    /// Several physical LEDs, listed in group `n` of the layer's group table.
    ManyPixels(u16),
}

impl Default for PhysMap {
    fn default() -> Self {
        Self::Color(0)
    }
}

impl PhysMap {
    /// Pack a color into 14 bits (r5/g5/b4), rounding to the nearest step.
    #[must_use]
    pub const fn pack(color: RGB8) -> u16 {
        let red = color.r.saturating_add(3) >> 3;
        let green = color.g.saturating_add(3) >> 3;
        let blue = color.b.saturating_add(7) >> 4;
        ((red as u16) << 9) + ((green as u16) << 4) + blue as u16
    }

    /// Expand a packed color back to 8 bits per channel.
    #[must_use]
    pub const fn unpack(packed: u16) -> RGB8 {
        RGB8::new(
            (((packed >> 9) & 0x1F) << 3) as u8,
            (((packed >> 4) & 0x1F) << 3) as u8,
            ((packed & 0x0F) << 4) as u8,
        )
    }

    /// Attach physical LED `index_p` to this entry, promoting it as needed.
    ///
    /// A `OnePixel` entry moves both indexes into a new group appended to `groups`.
    pub fn add_physical(&mut self, index_p: u16, groups: &mut Vec<Vec<u16>>) {
        match *self {
            Self::Color(_) => *self = Self::OnePixel(index_p),
            Self::OnePixel(previous) => {
                let group = u16::try_from(groups.len()).unwrap_or(u16::MAX);
                groups.push(vec![previous, index_p]);
                *self = Self::ManyPixels(group);
            }
            Self::ManyPixels(group) => {
                if let Some(members) = groups.get_mut(usize::from(group)) {
                    members.push(index_p);
                }
            }
        }
    }

    /// Stable one-byte tag, used when fingerprinting tables.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Color(_) => 0,
            Self::OnePixel(_) => 1,
            Self::ManyPixels(_) => 2,
        }
    }

    /// Payload of the entry (packed color, physical index or group number).
    #[must_use]
    pub const fn value(&self) -> u16 {
        match *self {
            Self::Color(value) | Self::OnePixel(value) | Self::ManyPixels(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PhysMap;
    use alloc::vec::Vec;
    use smart_leds::RGB8;

    #[test]
    fn packing_rounds_and_saturates() {
        let packed = PhysMap::pack(RGB8::new(255, 255, 255));
        assert_eq!(PhysMap::unpack(packed), RGB8::new(248, 248, 240));
        assert_eq!(PhysMap::unpack(PhysMap::pack(RGB8::new(0, 0, 0))), RGB8::new(0, 0, 0));
        assert_eq!(
            PhysMap::unpack(PhysMap::pack(RGB8::new(69, 6, 9))),
            RGB8::new(72, 8, 16)
        );
    }

    #[test]
    fn promotion_moves_both_indexes_into_a_group() {
        let mut groups = Vec::new();
        let mut entry = PhysMap::default();

        entry.add_physical(4, &mut groups);
        assert_eq!(entry, PhysMap::OnePixel(4));

        entry.add_physical(7, &mut groups);
        assert_eq!(entry, PhysMap::ManyPixels(0));

        entry.add_physical(9, &mut groups);
        assert_eq!(groups, [[4, 7, 9]]);
    }
}
