#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Pixel access through layers: projections, fills, fades and drawing.

use embedded_graphics::prelude::*;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use fixture_kit::Coord3D;
use fixture_kit::config::FixtureConfig;
use fixture_kit::fixture::Fixture;
use fixture_kit::layer::{LedsLayer, PhysMap};
use fixture_kit::led_strip::{FrameCapture, RGB8, colors, rainbow};
use fixture_kit::projection::Projection;
use fixture_kit::projection::builtin::{DistanceFromPoint, Mirror, Reverse, Transpose};
use fixture_kit::source::{Cuboid, FixtureSource, Panel, PanelLayout, Strip};

fn mapped(layers: &[LedsLayer], source: &mut dyn FixtureSource) -> Fixture {
    mapped_with(FixtureConfig::new(), layers, source)
}

fn mapped_with(
    config: FixtureConfig,
    layers: &[LedsLayer],
    source: &mut dyn FixtureSource,
) -> Fixture {
    let mut fixture = Fixture::new(config);
    for layer in layers {
        fixture.add_layer(layer.clone());
    }
    fixture
        .map(source, &mut FrameCapture::default())
        .expect("mapping must succeed");
    fixture
}

#[test]
fn fade_scales_every_led() {
    let start = RGB8::new(200, 100, 2);
    for layer_count in [1, 2] {
        let layers = vec![LedsLayer::new(Projection::Default); layer_count];
        let mut fixture = mapped(&layers, &mut Strip::new(4));

        let mut layer = fixture.layer(0).expect("layer 0 exists");
        layer.fill_solid(start);
        layer.fade_to_black_by(128);
        assert!(
            fixture.leds().iter().all(|led| *led == RGB8::new(100, 50, 1)),
            "{layer_count} layers"
        );
    }
}

#[test]
fn rainbow_steps_the_hue_per_led() {
    let mut fixture = mapped(&[LedsLayer::new(Projection::Default)], &mut Strip::new(8));
    fixture.layer(0).expect("layer 0 exists").fill_rainbow(10, 16);

    for (index, led) in (0u8..).zip(fixture.leds()) {
        assert_eq!(*led, rainbow(10 + index * 16));
    }
}

#[test]
fn rectangles_draw_in_logical_space() {
    let mut fixture = mapped(
        &[LedsLayer::new(Projection::Default)],
        &mut Panel::new(PanelLayout::serpentine_row_major(8, 8)),
    );
    let mut layer = fixture.layer(0).expect("layer 0 exists");
    assert_eq!(layer.size(), Coord3D::new(8, 8, 1));
    assert_eq!(layer.projection_dimension(), 2);

    Rectangle::new(Point::new(1, 1), Size::new(2, 2))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
        .draw(&mut layer)
        .expect("drawing must succeed");

    assert_eq!(layer.get_pixel_color_at(Coord3D::new(1, 1, 0)), colors::RED);
    assert_eq!(layer.get_pixel_color_at(Coord3D::new(2, 2, 0)), colors::RED);
    assert_eq!(layer.get_pixel_color_at(Coord3D::new(0, 0, 0)), colors::BLACK);
    // (1, 1) sits on the right-to-left row: LED 8 + 6.
    assert_eq!(fixture.leds()[14], colors::RED);
}

#[test]
fn positions_outside_the_layer_are_ignored() {
    let mut fixture = mapped(
        &[LedsLayer::new(Projection::Default)],
        &mut Panel::new(PanelLayout::row_major(4, 4)),
    );
    let mut layer = fixture.layer(0).expect("layer 0 exists");
    assert_eq!(layer.xyz(Coord3D::new(4, 0, 0)), None);
    assert_eq!(layer.xyz(Coord3D::new(3, 3, 0)), Some(15));

    layer.set_pixel_color_at(Coord3D::new(4, 0, 0), colors::RED);
    layer.set_pixel_color_at(Coord3D::new(-1, 0, 0), colors::RED);
    assert!(fixture.leds().iter().all(|led| *led == colors::BLACK));
}

#[test]
fn indexes_past_the_table_write_through() {
    let mut fixture = mapped_with(
        FixtureConfig::new().with_max_leds(16),
        &[
            LedsLayer::new(Projection::None),
            LedsLayer::new(Projection::Default)
                .with_region(Coord3D::new(0, 0, 0), Coord3D::new(1, 0, 0)),
        ],
        &mut Strip::new(10),
    );
    let mut layer = fixture.layer(1).expect("layer 1 exists");
    assert_eq!(layer.nr_of_leds(), 2);

    layer.set_pixel_color(7, colors::RED);
    assert_eq!(layer.get_pixel_color(7), colors::RED);
    layer.set_pixel_color(100, colors::RED);
    assert_eq!(layer.get_pixel_color(100), colors::BLACK);
    assert_eq!(fixture.leds()[7], colors::RED);
}

#[test]
fn blend_pixel_color_amount_keeps_the_current_value() {
    let mut fixture = mapped(&[LedsLayer::new(Projection::Default)], &mut Strip::new(2));
    let mut layer = fixture.layer(0).expect("layer 0 exists");
    layer.set_pixel_color(0, colors::RED);

    layer.blend_pixel_color(0, colors::BLUE, 255);
    assert_eq!(layer.get_pixel_color(0), colors::RED);
    layer.blend_pixel_color(0, colors::BLUE, 0);
    assert_eq!(layer.get_pixel_color(0), colors::BLUE);
    layer.blend_pixel_color(0, colors::RED, 51);
    assert_eq!(layer.get_pixel_color(0), RGB8::new(204, 0, 51));
}

#[test]
fn random_scatters_but_covers_every_led() {
    let mut fixture = mapped(&[LedsLayer::new(Projection::Random)], &mut Strip::new(10));
    let mut layer = fixture.layer(0).expect("layer 0 exists");
    assert_eq!(layer.nr_of_leds(), 10);
    for index in 0..10u8 {
        layer.set_pixel_color(u16::from(index), RGB8::new(index + 1, 0, 0));
    }

    let mut reds: Vec<u8> = fixture.leds().iter().map(|led| led.r).collect();
    assert_ne!(reds, (1..=10).collect::<Vec<u8>>());
    reds.sort_unstable();
    assert_eq!(reds, (1..=10).collect::<Vec<u8>>());
}

#[test]
fn reverse_runs_backwards() {
    let fixture = mapped(
        &[LedsLayer::new(Projection::Custom(&Reverse))],
        &mut Strip::new(4),
    );
    assert_eq!(
        fixture.layers()[0].mapping_table(),
        [
            PhysMap::OnePixel(3),
            PhysMap::OnePixel(2),
            PhysMap::OnePixel(1),
            PhysMap::OnePixel(0)
        ]
    );
}

#[test]
fn transpose_swaps_rows_and_columns() {
    let fixture = mapped(
        &[LedsLayer::new(Projection::Custom(&Transpose))],
        &mut Panel::new(PanelLayout::row_major(3, 2)),
    );
    let layer = &fixture.layers()[0];
    assert_eq!(layer.size(), Coord3D::new(2, 3, 1));
    // Physical LED 2 sits at (2, 0), logical (0, 2).
    assert_eq!(layer.mapping_table()[4], PhysMap::OnePixel(2));
}

#[test]
fn mirror_drives_both_halves() {
    let mut fixture = mapped(
        &[LedsLayer::new(Projection::Custom(&Mirror))],
        &mut Strip::new(6),
    );
    assert_eq!(fixture.layers()[0].size(), Coord3D::new(3, 1, 1));
    assert_eq!(
        fixture.layers()[0].mapping_groups(),
        [vec![2, 3], vec![1, 4], vec![0, 5]]
    );

    fixture
        .layer(0)
        .expect("layer 0 exists")
        .set_pixel_color(0, colors::RED);
    assert_eq!(fixture.leds()[0], colors::RED);
    assert_eq!(fixture.leds()[5], colors::RED);
    assert_eq!(fixture.leds()[2], colors::BLACK);
}

#[test]
fn distance_from_point_radiates_from_the_midpoint() {
    let fixture = mapped(
        &[LedsLayer::new(Projection::Custom(&DistanceFromPoint))
            .with_midpoint(Coord3D::new(2, 0, 0))],
        &mut Strip::new(5),
    );
    let layer = &fixture.layers()[0];
    assert_eq!(layer.size(), Coord3D::new(3, 1, 1));
    assert_eq!(
        layer.mapping_table(),
        [
            PhysMap::OnePixel(2),
            PhysMap::ManyPixels(0),
            PhysMap::ManyPixels(1)
        ]
    );
    assert_eq!(layer.mapping_groups(), [vec![1, 3], vec![0, 4]]);
}

#[test]
fn cuboid_is_three_dimensional() {
    let mut fixture = mapped(&[LedsLayer::new(Projection::Default)], &mut Cuboid::new(2, 3, 4));
    let layer = fixture.layer(0).expect("layer 0 exists");
    assert_eq!(layer.size(), Coord3D::new(2, 3, 4));
    assert_eq!(layer.projection_dimension(), 3);
    assert_eq!(layer.nr_of_leds(), 24);
}
