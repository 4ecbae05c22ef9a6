#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Byte layout of the geometry and pixel preview packets.

use fixture_kit::fixture::Fixture;
use fixture_kit::layer::LedsLayer;
use fixture_kit::led_strip::{FrameCapture, RGB8, colors};
use fixture_kit::preview::{PixelEncoding, write_geometry, write_pixels};
use fixture_kit::projection::Projection;
use fixture_kit::source::{FixtureSource, Panel, PanelLayout, Strip};

fn mapped(source: &mut dyn FixtureSource) -> Fixture {
    let mut fixture = Fixture::default();
    fixture.add_layer(LedsLayer::new(Projection::Default));
    fixture
        .map(source, &mut FrameCapture::default())
        .expect("mapping must succeed");
    fixture
}

fn collect(write: impl FnOnce(&mut dyn FnMut(&[u8])) -> usize) -> Vec<Vec<u8>> {
    let mut packets = Vec::new();
    let sent = write(&mut |packet: &[u8]| packets.push(packet.to_vec()));
    assert_eq!(sent, packets.len());
    packets
}

#[test]
fn panel_geometry_fits_one_packet() {
    let fixture = mapped(&mut Panel::new(PanelLayout::serpentine_row_major(4, 4)));
    let packets = collect(|sink| write_geometry(&fixture, 5120, sink));

    assert_eq!(packets.len(), 1);
    let packet = &packets[0];
    assert_eq!(
        packet[..16],
        [1, 0, 4, 0, 4, 0, 1, 0, 16, 4, 0, 1, 0, 48, 0, 0]
    );
    assert_eq!(packet.len(), 48);
    // LED 4 starts the right-to-left second row.
    assert_eq!(packet[16 + 4 * 2..16 + 5 * 2], [3, 1]);
}

#[test]
fn geometry_continues_with_the_next_index() {
    let fixture = mapped(&mut Strip::new(100));
    let packets = collect(|sink| write_geometry(&fixture, 26, sink));

    assert_eq!(packets.len(), 10);
    assert!(packets.iter().all(|packet| packet.len() == 26));
    assert_eq!(packets[0][1..4], [0, 100, 0]);
    assert_eq!(packets[1][..4], [1, 0xFF, 0, 10]);
    assert_eq!(packets[1][12..14], [0, 26]);
    assert_eq!(packets[9][16], 90);
}

#[test]
fn wide_axes_use_two_bytes() {
    let fixture = mapped(&mut Strip::new(30).with_factor(10));
    let packets = collect(|sink| write_geometry(&fixture, 5120, sink));

    let packet = &packets[0];
    assert_eq!(packet[11], 10);
    assert_eq!(packet.len(), 16 + 30 * 2);
    // LED 29 sits at x = 290.
    assert_eq!(packet[16 + 29 * 2..], [1, 34]);
}

#[test]
fn pixels_split_on_whole_leds() {
    let leds = [colors::RED; 10];
    let packets =
        collect(|sink| write_pixels(&leds, [1, 2, 3], PixelEncoding::Rgb888, 14, sink));

    assert_eq!(packets.len(), 4);
    assert_eq!(packets[0][..5], [2, 1, 2, 3, 3]);
    assert_eq!(packets[1][..5], [2, 0xFF, 0, 3, 3]);
    assert_eq!(packets[3][..5], [2, 0xFF, 0, 9, 3]);
    assert_eq!(packets[3].len(), 8);
}

#[test]
fn compact_encodings_keep_the_high_bits() {
    let leds = [RGB8::new(0xFF, 0xFF, 0xFF), RGB8::new(0x80, 0x40, 0x20)];

    let one_byte = collect(|sink| write_pixels(&leds, [0; 3], PixelEncoding::Rgb332, 5120, sink));
    assert_eq!(one_byte[0][4..], [1, 0xFF, 0x80 | 0x08]);

    let two_bytes = collect(|sink| write_pixels(&leds, [0; 3], PixelEncoding::Rgb565, 5120, sink));
    assert_eq!(two_bytes[0][4..], [2, 0xFF, 0xFF, 0x82, 0x04]);
}
