//! Map coordinate-described LED fixtures onto layered logical pixel spaces.
//!
//! A [`Fixture`](fixture::Fixture) ingests an ordered stream of 3D LED positions,
//! optionally grouped into GPIO pin runs, from a [`FixtureSource`](source::FixtureSource).
//! It then lets any number of [`LedsLayer`](layer::LedsLayer)s address those LEDs
//! through their own logical coordinate spaces. Every frame, the layers composite
//! into one physical color buffer that is handed to an
//! [`LedDriver`](led_strip::LedDriver).
//!
//! ```
//! use fixture_kit::fixture::Fixture;
//! use fixture_kit::layer::LedsLayer;
//! use fixture_kit::led_strip::{FrameCapture, colors};
//! use fixture_kit::projection::Projection;
//! use fixture_kit::source::Strip;
//!
//! let mut fixture = Fixture::default();
//! fixture.add_layer(LedsLayer::new(Projection::Default));
//!
//! let mut driver = FrameCapture::default();
//! let report = fixture.map(&mut Strip::new(10), &mut driver)?;
//! assert_eq!(report.nr_of_leds, 10);
//!
//! if let Some(mut layer) = fixture.layer(0) {
//!     layer.set_pixel_color(3, colors::RED);
//! }
//! fixture.show(&mut driver)?;
//! assert_eq!(driver.frame()[3], colors::RED);
//! # Ok::<(), fixture_kit::Error>(())
//! ```
//!
//! # Glossary
//!
//! - **Physical index:** an actual LED, addressed `0..capacity` in wiring order.
//! - **Logical index:** an address in a layer's own coordinate space, independent of wiring.
//! - **Layer:** an independently addressed rendering surface with its own sub-region and
//!   projection, composited onto the shared physical buffer.
//! - **Projection:** maps a physical position inside a layer's sub-region to a logical index
//!   and declares the size of the logical space.
//! - **Pass 1 / pass 2:** the measure-then-allocate replay of a coordinate stream.
#![cfg_attr(not(feature = "host"), no_std)]

extern crate alloc;

pub mod config;
pub mod coord3d;
mod error;
pub mod fixture;
pub mod layer;
pub mod led_strip;
pub mod pins;
pub mod preview;
pub mod projection;
pub mod schedule;
pub mod source;
#[cfg(feature = "host")]
pub mod to_png;

// Re-export error types and result (used throughout)
pub use crate::coord3d::Coord3D;
pub use crate::error::{Error, Result};
