#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Pin tables handed to drivers, and the per-pin strip driver.

use core::convert::Infallible;

use fixture_kit::fixture::Fixture;
use fixture_kit::layer::LedsLayer;
use fixture_kit::led_strip::{LedDriver, PinStrips, RGB8, SmartLedsWrite, colors, validate_pin_table};
use fixture_kit::pins::{PinRange, PinTable, SortedPin};
use fixture_kit::projection::Projection;
use fixture_kit::source::{Events, FixtureEvent};
use fixture_kit::{Coord3D, Error};

#[derive(Default)]
struct Recorder {
    frames: Vec<Vec<RGB8>>,
}

impl SmartLedsWrite for Recorder {
    type Error = Infallible;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.frames.push(iterator.into_iter().map(Into::into).collect());
        Ok(())
    }
}

fn sorted(pin: u8, start_led: u16, nr_of_leds: u16) -> SortedPin {
    SortedPin {
        pin,
        start_led,
        nr_of_leds,
    }
}

#[test]
fn overlapping_runs_are_reported() {
    let pins = [sorted(1, 0, 10), sorted(2, 8, 4)];
    assert_eq!(
        validate_pin_table(&pins, 100),
        Err(Error::PinRangesOverlap { first: 1, second: 2 })
    );
}

#[test]
fn runs_past_the_buffer_are_reported() {
    let pins = [sorted(1, 0, 10), sorted(2, 10, 10)];
    assert_eq!(validate_pin_table(&pins, 20), Ok(()));
    assert_eq!(
        validate_pin_table(&pins, 19),
        Err(Error::PinRangeBeyondBuffer { pin: 2 })
    );
}

#[test]
fn pin_table_sorts_by_start_led() {
    let mut table = PinTable::new();
    table
        .allocate(9, "Leds", PinRange::new(10, 19))
        .expect("allocation must succeed");
    table
        .allocate(4, "Leds", PinRange::new(0, 9))
        .expect("allocation must succeed");
    table
        .allocate(6, "Button", PinRange::new(0, 0))
        .expect("allocation must succeed");

    assert_eq!(
        table.sorted_pins("Leds").as_slice(),
        [sorted(4, 0, 10), sorted(9, 10, 10)]
    );
}

#[test]
fn pin_strips_split_the_frame_per_pin() {
    let mut events: Events = pixels(0..2)
        .chain([FixtureEvent::PinBoundary(12)])
        .chain(pixels(2..6))
        .chain([FixtureEvent::PinBoundary(13)])
        .collect();

    let mut fixture = Fixture::default();
    fixture.add_layer(LedsLayer::new(Projection::Default));
    let mut strips = PinStrips::new();
    strips.add(12, Recorder::default()).expect("pin 12 is valid");
    strips.add(13, Recorder::default()).expect("pin 13 is valid");

    fixture.map(&mut events, &mut strips).expect("mapping must succeed");
    fixture
        .layer(0)
        .expect("layer 0 exists")
        .set_pixel_color(2, colors::RED);
    assert!(fixture.show(&mut strips).expect("show must succeed"));

    let first = &strips.writer(12).expect("writer for pin 12").frames;
    let second = &strips.writer(13).expect("writer for pin 13").frames;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].len(), 2);
    assert_eq!(second[0].len(), 4);
    assert_eq!(second[0][0], colors::RED);
}

#[test]
fn pin_strips_reject_unknown_pins() {
    let mut strips: PinStrips<Recorder> = PinStrips::new();
    assert_eq!(
        strips.add(60, Recorder::default()),
        Err(Error::PinOutOfRange { pin: 60 })
    );
    assert_eq!(
        strips.init(&[sorted(1, 0, 4), sorted(2, 2, 4)]),
        Err(Error::PinRangesOverlap { first: 1, second: 2 })
    );
    assert_eq!(
        strips.show(&[RGB8::default(); 3], &[sorted(1, 0, 4)]),
        Err(Error::PinRangeBeyondBuffer { pin: 1 })
    );
}

fn pixels(range: core::ops::Range<i32>) -> impl Iterator<Item = FixtureEvent> {
    range.map(|x| FixtureEvent::Pixel(Coord3D::new(x, 0, 0)))
}
