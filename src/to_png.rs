#![cfg(feature = "host")]
//! PNG previews of a fixture: every mapped LED drawn as a soft disc at its
//! position, projected onto the x/y plane.

use crate::fixture::Fixture;
use crate::led_strip::RGB8;
use log::info;
use png::{BitDepth, ColorType, Encoder, ScaledFloat};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PREVIEW_INVERSE_GAMMA: f32 = 2.2;

/// Render the fixture's current colors into a PNG sized to the requested maximum dimension.
pub fn write_fixture_png(
    fixture: &Fixture,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    write_fixture_png_with_gamma(fixture, output_path, target_max_dimension, PREVIEW_INVERSE_GAMMA)
}

/// Render the fixture's current colors into a PNG with a custom preview inverse gamma.
pub fn write_fixture_png_with_gamma(
    fixture: &Fixture,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
    preview_inverse_gamma: f32,
) -> Result<(), Box<dyn Error>> {
    assert!(preview_inverse_gamma > 0.0, "preview_inverse_gamma must be positive");
    let output_path = output_path.as_ref();
    let cells = Cells::of(fixture);
    let cell_size = select_cell_size(cells.width, cells.height, target_max_dimension);
    let (width, height, pixels) =
        fixture_pixels(&cells, fixture.leds(), cell_size, preview_inverse_gamma);

    create_parent(output_path)?;
    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    info!("wrote PNG to {}", output_path.display());
    Ok(())
}

/// Render a sequence of physical buffers of `fixture` into a looping APNG.
///
/// Each frame is indexed like [`Fixture::leds`]; missing LEDs render black.
pub fn write_frames_apng(
    fixture: &Fixture,
    frames: &[Vec<RGB8>],
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
    frame_delay_ms: u32,
) -> Result<(), Box<dyn Error>> {
    assert!(!frames.is_empty(), "frames must not be empty");
    assert!(frame_delay_ms > 0, "frame_delay_ms must be positive");
    let output_path = output_path.as_ref();
    let cells = Cells::of(fixture);
    let cell_size = select_cell_size(cells.width, cells.height, target_max_dimension);
    let frame_count = u32::try_from(frames.len())?;
    let delay_num = u16::try_from(frame_delay_ms)?;
    let delay_den = 1000u16;

    let rendered: Vec<(u32, u32, Vec<u8>)> = frames
        .iter()
        .map(|frame| fixture_pixels(&cells, frame, cell_size, PREVIEW_INVERSE_GAMMA))
        .collect();
    let (width, height) = (rendered[0].0, rendered[0].1);

    create_parent(output_path)?;
    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    encoder.set_animated(frame_count, 0)?;
    let mut writer = encoder.write_header()?;
    for (_, _, frame_pixels) in rendered {
        writer.set_frame_delay(delay_num, delay_den)?;
        writer.write_image_data(&frame_pixels)?;
    }
    writer.finish()?;
    info!("wrote APNG to {}", output_path.display());
    Ok(())
}

/// Grid cell of every mapped LED, in fixture units.
struct Cells {
    width: u32,
    height: u32,
    cells: Vec<(u32, u32)>,
}

impl Cells {
    fn of(fixture: &Fixture) -> Self {
        let factor = i32::from(fixture.meta().factor.max(1));
        let fix_size = fixture.fix_size();
        let width = fix_size.x.max(1) as u32;
        let height = fix_size.y.max(1) as u32;
        let cells = fixture
            .positions()
            .iter()
            .map(|position| {
                let column = (position.x / factor).clamp(0, width as i32 - 1) as u32;
                let row = (position.y / factor).clamp(0, height as i32 - 1) as u32;
                (column, row)
            })
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }
}

fn create_parent(output_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn select_cell_size(grid_width: u32, grid_height: u32, target_max_dimension: u32) -> u32 {
    assert!(target_max_dimension > 0, "target_max_dimension must be positive");
    let mut cell_size = target_max_dimension;
    while cell_size > 4 {
        let led_radius = led_radius(cell_size);
        let output_width = grid_width * cell_size + led_radius * 2;
        let output_height = grid_height * cell_size + led_radius * 2;
        if output_width.max(output_height) <= target_max_dimension {
            break;
        }
        cell_size -= 1;
    }
    cell_size.max(4)
}

const fn led_radius(cell_size: u32) -> u32 {
    let led_margin = if cell_size / 8 > 1 { cell_size / 8 } else { 1 };
    (cell_size - led_margin * 2) / 2
}

fn fixture_pixels(
    cells: &Cells,
    colors: &[RGB8],
    cell_size: u32,
    preview_inverse_gamma: f32,
) -> (u32, u32, Vec<u8>) {
    let led_radius = led_radius(cell_size);
    assert!(led_radius > 0, "led_radius must be positive");
    let fade_width = (led_radius / 3).max(1);

    let border = led_radius;
    let width = cells.width * cell_size + border * 2;
    let height = cells.height * cell_size + border * 2;
    let mut bytes = vec![0u8; (width * height * 3 * 2) as usize];
    let center = (cell_size - 1) as i32 / 2;
    let led_radius_f = led_radius as f32;
    let inner_radius_f = led_radius.saturating_sub(fade_width) as f32;
    let radius_sq = (led_radius as i32) * (led_radius as i32);

    for (&(column, row), color) in cells.cells.iter().zip(colors) {
        let cell_origin_x = column * cell_size;
        let cell_origin_y = row * cell_size;
        let [red, green, blue] =
            [color.r, color.g, color.b].map(|channel| inverse_gamma_to_linear(channel, preview_inverse_gamma));

        for local_y in 0..cell_size {
            let delta_y = local_y as i32 - center;
            for local_x in 0..cell_size {
                let delta_x = local_x as i32 - center;
                let distance_sq = delta_x * delta_x + delta_y * delta_y;
                if distance_sq > radius_sq {
                    continue;
                }
                let distance = (distance_sq as f32).sqrt();
                let intensity = if distance <= inner_radius_f {
                    1.0
                } else {
                    let fade_span = led_radius_f - inner_radius_f;
                    (1.0 - (distance - inner_radius_f) / fade_span).max(0.0)
                };
                let x = border + cell_origin_x + local_x;
                let y = border + cell_origin_y + local_y;
                let pixel_index = ((y * width + x) * 3 * 2) as usize;
                for (offset, channel) in [red, green, blue].into_iter().enumerate() {
                    let value = linear_to_u16(channel * intensity).to_be_bytes();
                    bytes[pixel_index + offset * 2..pixel_index + offset * 2 + 2]
                        .copy_from_slice(&value);
                }
            }
        }
    }

    (width, height, bytes)
}

fn inverse_gamma_to_linear(channel: u8, preview_inverse_gamma: f32) -> f32 {
    let normalized = f32::from(channel) / 255.0;
    normalized.powf(preview_inverse_gamma)
}

fn linear_to_u16(value: f32) -> u16 {
    let clamped = value.clamp(0.0, 1.0);
    (clamped * 65535.0).round() as u16
}
