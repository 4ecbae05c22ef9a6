#![cfg(feature = "host")]
#![allow(missing_docs)]
//! PNG previews of mapped fixtures.

use std::error::Error;
use std::fs::File;

use fixture_kit::fixture::Fixture;
use fixture_kit::layer::LedsLayer;
use fixture_kit::led_strip::{FrameCapture, colors};
use fixture_kit::projection::Projection;
use fixture_kit::source::{Panel, PanelLayout, Strip};
use fixture_kit::to_png::{write_fixture_png, write_frames_apng};

fn png_size(path: &std::path::Path) -> Result<(u32, u32), Box<dyn Error>> {
    let reader = png::Decoder::new(File::open(path)?).read_info()?;
    let info = reader.info();
    Ok((info.width, info.height))
}

#[test]
fn panel_png_fits_the_requested_size() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::default();
    fixture.add_layer(LedsLayer::new(Projection::Default));
    fixture.map(
        &mut Panel::new(PanelLayout::serpentine_row_major(8, 4)),
        &mut FrameCapture::default(),
    )?;
    fixture
        .layer(0)
        .expect("layer 0 exists")
        .fill_rainbow(0, 8);

    let directory = tempfile::tempdir()?;
    let path = directory.path().join("nested").join("panel.png");
    write_fixture_png(&fixture, &path, 256)?;

    let (width, height) = png_size(&path)?;
    assert!(width <= 256 && height <= 256);
    assert!(width > height, "8×4 panel renders wider than tall");
    Ok(())
}

#[test]
fn strip_frames_make_an_apng() -> Result<(), Box<dyn Error>> {
    let mut fixture = Fixture::default();
    fixture.add_layer(LedsLayer::new(Projection::Default));
    fixture.map(&mut Strip::new(6), &mut FrameCapture::default())?;

    let frames: Vec<_> = (0..3)
        .map(|step| {
            let mut frame = vec![colors::BLACK; 6];
            frame[step * 2] = colors::WHITE;
            frame
        })
        .collect();

    let directory = tempfile::tempdir()?;
    let path = directory.path().join("strip.png");
    write_frames_apng(&fixture, &frames, &path, 120, 100)?;

    let (width, height) = png_size(&path)?;
    assert!(width <= 120 && height <= 120);
    assert!(width > height);
    Ok(())
}
