#![cfg(feature = "host")]
#![allow(missing_docs)]
use fixture_kit::led_strip::{RGB8, Rgb888, ToRgb8, ToRgb888, blend, rainbow, scale8};

#[test]
fn rgb888_to_rgb8_matches_rgb8() {
    let rgb8_color = RGB8::new(16, 32, 48);
    let rgb888_color = Rgb888::new(16, 32, 48);

    let converted = rgb888_color.to_rgb8();

    assert_eq!(rgb8_color, converted);
}

#[test]
fn rgb8_to_rgb888_matches_rgb888() {
    let rgb8_color = RGB8::new(16, 32, 48);
    let rgb888_color = Rgb888::new(16, 32, 48);

    let converted = rgb8_color.to_rgb888();

    assert_eq!(rgb888_color, converted);
}

#[test]
fn blend_weights_the_second_color() {
    let first = RGB8::new(255, 0, 100);
    let second = RGB8::new(0, 255, 100);

    assert_eq!(blend(first, second, 0), first);
    assert_eq!(blend(first, second, 255), second);
    assert_eq!(blend(first, second, 51), RGB8::new(204, 51, 100));
}

#[test]
fn scale8_keeps_full_scale_and_halves() {
    let color = RGB8::new(200, 100, 2);

    assert_eq!(scale8(color, 255), color);
    assert_eq!(scale8(color, 127), RGB8::new(100, 50, 1));
    assert_eq!(scale8(color, 0), RGB8::new(0, 0, 0));
}

#[test]
fn rainbow_starts_at_red() {
    let red = rainbow(0);

    assert!(red.r > red.g && red.r > red.b);
}
