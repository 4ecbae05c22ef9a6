//! Byte-exact preview packets for a remote viewer.
//!
//! Two packet kinds, each split so no packet exceeds `package_size` bytes:
//!
//! - **Geometry** (type 1) describes where every mapped LED sits. Sent after a
//!   mapping cycle.
//! - **Pixels** (type 2) carries the current colors, 1 to 3 bytes per LED.
//!
//! Packets go to a caller-supplied sink, typically a websocket.
//!
//! ```
//! use fixture_kit::led_strip::colors;
//! use fixture_kit::preview::{PixelEncoding, write_pixels};
//!
//! let mut packets = Vec::new();
//! let sent = write_pixels(
//!     &[colors::RED, colors::BLUE],
//!     [0, 0, 0],
//!     PixelEncoding::Rgb888,
//!     64,
//!     &mut |packet| packets.push(packet.to_vec()),
//! );
//! assert_eq!(sent, 1);
//! assert_eq!(packets[0], [2, 0, 0, 0, 3, 255, 0, 0, 0, 0, 255]);
//! ```

use alloc::vec::Vec;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::Coord3D;
use crate::fixture::Fixture;
use crate::led_strip::RGB8;

/// Geometry packet type byte.
pub const GEOMETRY_PACKET: u8 = 1;

/// Pixel packet type byte.
pub const PIXELS_PACKET: u8 = 2;

/// Geometry header length.
pub const GEOMETRY_HEADER_LEN: usize = 16;

/// Pixel header length.
pub const PIXELS_HEADER_LEN: usize = 5;

/// `[1]` of a packet that continues the previous one.
pub const CONTINUATION: u8 = 0xFF;

/// Bytes per pixel in a pixel packet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelEncoding {
    /// One byte: `rrrgggbb`.
    Rgb332,
    /// Two bytes: `rrrrrggg gggbbbbb`.
    Rgb565,
    /// Three bytes: raw red, green, blue.
    #[default]
    Rgb888,
}

impl PixelEncoding {
    /// Value of header byte `[4]`.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> u8 {
        match self {
            Self::Rgb332 => 1,
            Self::Rgb565 => 2,
            Self::Rgb888 => 3,
        }
    }

    /// Encoding for a bytes-per-pixel value, if there is one.
    #[must_use]
    pub const fn from_bytes_per_pixel(bytes_per_pixel: u8) -> Option<Self> {
        match bytes_per_pixel {
            1 => Some(Self::Rgb332),
            2 => Some(Self::Rgb565),
            3 => Some(Self::Rgb888),
            _ => None,
        }
    }

    fn encode(self, color: RGB8, packet: &mut Vec<u8>) {
        match self {
            Self::Rgb332 => {
                packet.push((color.r & 0xE0) | ((color.g & 0xE0) >> 3) | (color.b >> 6));
            }
            Self::Rgb565 => {
                packet.push((color.r & 0xF8) | (color.g >> 5));
                packet.push(((color.g & 0x1C) << 3) | (color.b >> 3));
            }
            Self::Rgb888 => packet.extend_from_slice(&[color.r, color.g, color.b]),
        }
    }
}

/// Send the geometry of `fixture` as one or more type-1 packets. Returns the
/// number of packets sent.
///
/// Header: `[0]=1`, `[1..7]` size x/y/z (big-endian u16), `[7..9]` LED count,
/// `[9]` LED size, `[10]` shape, `[11]` factor, `[12..14]` first unused byte of
/// this packet, `[14..16]` zero. Each LED then takes one or two bytes per axis
/// longer than one: two when `size × factor > 255`.
///
/// Continuation packets repeat the header with `[1]=0xFF` and `[2..4]` set to
/// the physical index of their first LED.
///
/// # Panics
///
/// When `package_size` cannot hold the header plus one LED.
pub fn write_geometry(
    fixture: &Fixture,
    package_size: usize,
    sink: &mut dyn FnMut(&[u8]),
) -> usize {
    let fix_size = fixture.fix_size();
    let meta = fixture.meta();
    let widths = [fix_size.x, fix_size.y, fix_size.z].map(|size| axis_width(size, meta.factor));
    let pixel_len: usize = widths.iter().map(|width| usize::from(*width)).sum();
    assert!(
        package_size >= GEOMETRY_HEADER_LEN + pixel_len,
        "package_size too small for one LED"
    );

    let positions = fixture.positions();
    let mut header = [0u8; GEOMETRY_HEADER_LEN];
    header[0] = GEOMETRY_PACKET;
    header[1..3].copy_from_slice(&clamp_u16(fix_size.x).to_be_bytes());
    header[3..5].copy_from_slice(&clamp_u16(fix_size.y).to_be_bytes());
    header[5..7].copy_from_slice(&clamp_u16(fix_size.z).to_be_bytes());
    header[7..9].copy_from_slice(&(positions.len().min(usize::from(u16::MAX)) as u16).to_be_bytes());
    header[9] = meta.led_size;
    header[10] = meta.shape;
    header[11] = meta.factor;

    let mut packet = Vec::with_capacity(package_size);
    packet.extend_from_slice(&header);
    let mut sent = 0;

    for (index_p, position) in (0u16..).zip(positions) {
        if packet.len() + pixel_len > package_size {
            send_geometry(&mut packet, sink);
            sent += 1;
            packet.clear();
            packet.extend_from_slice(&header);
            packet[1] = CONTINUATION;
            packet[2..4].copy_from_slice(&index_p.to_be_bytes());
        }
        push_position(&mut packet, *position, widths);
    }
    send_geometry(&mut packet, sink);
    sent += 1;

    debug!(
        "preview: geometry of {} LEDs in {} packets",
        positions.len(),
        sent
    );
    sent
}

/// Send `leds` as one or more type-2 packets. Returns the number of packets sent.
///
/// Header: `[0]=2`, `[1..4]` viewer orientation, `[4]` bytes per pixel.
/// Continuation packets carry `[1]=0xFF` and `[2..4]` set to the index of their
/// first LED (big-endian).
///
/// # Panics
///
/// When `package_size` cannot hold the header plus one LED.
pub fn write_pixels(
    leds: &[RGB8],
    orientation: [u8; 3],
    encoding: PixelEncoding,
    package_size: usize,
    sink: &mut dyn FnMut(&[u8]),
) -> usize {
    let bytes_per_pixel = usize::from(encoding.bytes_per_pixel());
    assert!(
        package_size >= PIXELS_HEADER_LEN + bytes_per_pixel,
        "package_size too small for one LED"
    );

    let mut packet = Vec::with_capacity(package_size);
    packet.push(PIXELS_PACKET);
    packet.extend_from_slice(&orientation);
    packet.push(encoding.bytes_per_pixel());
    let mut sent = 0;

    for (index_p, color) in (0u16..).zip(leds) {
        if packet.len() + bytes_per_pixel > package_size {
            sink(&packet);
            sent += 1;
            packet.clear();
            packet.push(PIXELS_PACKET);
            packet.push(CONTINUATION);
            packet.extend_from_slice(&index_p.to_be_bytes());
            packet.push(encoding.bytes_per_pixel());
        }
        encoding.encode(*color, &mut packet);
    }
    sink(&packet);
    sent + 1
}

const fn axis_width(size: i32, factor: u8) -> u8 {
    if size <= 1 {
        0
    } else if size * factor as i32 > 255 {
        2
    } else {
        1
    }
}

fn clamp_u16(value: i32) -> u16 {
    u16::try_from(value.max(0)).unwrap_or(u16::MAX)
}

fn push_position(packet: &mut Vec<u8>, position: Coord3D, widths: [u8; 3]) {
    for (value, width) in [position.x, position.y, position.z].into_iter().zip(widths) {
        let [high, low] = clamp_u16(value).to_be_bytes();
        match width {
            0 => {}
            1 => packet.push(low),
            _ => packet.extend_from_slice(&[high, low]),
        }
    }
}

fn send_geometry(packet: &mut [u8], sink: &mut dyn FnMut(&[u8])) {
    let end = u16::try_from(packet.len()).unwrap_or(u16::MAX);
    packet[12..14].copy_from_slice(&end.to_be_bytes());
    sink(packet);
}
