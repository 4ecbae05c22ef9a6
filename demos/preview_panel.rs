//! Map a 12×8 panel, draw two layers on it, and write the previews a viewer would get.
//!
//! Run with `RUST_LOG=info cargo run --bin demo_preview_panel [output.png]`.

use std::error::Error;
use std::path::PathBuf;

use embedded_graphics::{
    prelude::*,
    primitives::{Line, PrimitiveStyle},
};
use fixture_kit::{
    Coord3D,
    config::FixtureConfig,
    fixture::Fixture,
    layer::LedsLayer,
    led_strip::{FrameCapture, ToRgb888, colors},
    preview::{PixelEncoding, write_geometry, write_pixels},
    projection::{Projection, builtin::DistanceFromPoint},
    source::{Panel, PanelLayout},
    to_png::write_fixture_png,
};
use log::info;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let output_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| std::env::temp_dir().join("fixture_kit_panel.png"), PathBuf::from);

    // Two 12x4 panels stacked vertically to make a 12x8 display, one pin.
    let panel_12x4 = PanelLayout::serpentine_column_major(12, 4);
    let mut panel = Panel::new(panel_12x4.concat_v(&panel_12x4)).with_pin(4);

    let config = FixtureConfig::new().with_global_blend(96);
    let mut fixture = Fixture::new(config);
    let graphics = fixture.add_layer(LedsLayer::new(Projection::Default));
    let ripple = fixture.add_layer(
        LedsLayer::new(Projection::Custom(&DistanceFromPoint))
            .with_midpoint(Coord3D::new(6, 4, 0)),
    );

    let mut driver = FrameCapture::default();
    let report = fixture.map(&mut panel, &mut driver)?;
    info!(
        "mapped {} LEDs on {} pins, fingerprint {:08x}",
        report.mapped_leds,
        report.sorted_pins.len(),
        report.fingerprint
    );

    if let Some(mut layer) = fixture.layer(graphics) {
        let line_style = PrimitiveStyle::with_stroke(colors::RED.to_rgb888(), 1);
        Line::new(Point::new(0, 0), Point::new(11, 7))
            .into_styled(line_style)
            .draw(&mut layer)?;
        Line::new(Point::new(0, 7), Point::new(11, 0))
            .into_styled(line_style)
            .draw(&mut layer)?;
    }

    // The ripple layer mixes into whatever the graphics layer left behind.
    for index in 0..fixture.leds().len() {
        fixture.set_blend_flag(index, true);
    }
    if let Some(mut layer) = fixture.layer(ripple) {
        layer.fill_rainbow(0, 24);
    }
    fixture.show(&mut driver)?;

    write_fixture_png(&fixture, &output_path, 480)?;

    let package_size = fixture.config().package_size;
    let mut bytes = 0;
    let geometry_packets =
        write_geometry(&fixture, package_size, &mut |packet| bytes += packet.len());
    let pixel_packets = write_pixels(
        driver.frame(),
        [0, 0, 0],
        PixelEncoding::Rgb565,
        package_size,
        &mut |packet| bytes += packet.len(),
    );
    info!("preview: {geometry_packets} geometry + {pixel_packets} pixel packets, {bytes} bytes");
    Ok(())
}
