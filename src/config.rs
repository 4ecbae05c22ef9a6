//! Capacity constants and runtime knobs for a [`Fixture`](crate::fixture::Fixture).
//!
//! [`FixtureConfig`] is a `const` builder, so a firmware image can keep its
//! configuration in a `const` item and a host tool can load the same values with
//! `serde`:
//!
//! ```
//! use fixture_kit::config::{FixtureConfig, NUM_LEDS_MAX};
//!
//! const CONFIG: FixtureConfig = FixtureConfig::new()
//!     .with_max_leds(1024)
//!     .with_global_blend(128);
//!
//! assert_eq!(CONFIG.max_leds, 1024);
//! assert!(CONFIG.max_leds <= NUM_LEDS_MAX);
//! ```

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Default physical LED capacity.
pub const NUM_LEDS_MAX: u16 = 8192;

/// Default cap on a layer's logical index space.
pub const NUM_VLEDS_MAX: u16 = 16384;

/// Number of entries in the pin table (GPIO 0..=48).
pub const MAX_PINS: usize = 49;

/// Largest preview packet, header included.
pub const PACKAGE_SIZE: usize = 5120;

/// Debounce interval between two mapping cycles.
pub const REMAP_INTERVAL: Duration = Duration::from_secs(1);

/// Owner tag used for pins claimed by fixture ingestion.
pub const LEDS_OWNER: &str = "Leds";

/// Runtime configuration of a fixture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct FixtureConfig {
    /// Physical buffer capacity. Pixels past this index are skipped during mapping.
    pub max_leds: u16,
    /// Upper bound for logical indexes produced by projections.
    pub max_virtual_leds: u16,
    /// Amount of the previous frame kept when a pixel's blend flag is set (0 = overwrite).
    pub global_blend: u8,
    /// Minimum time between mapping cycles, in milliseconds.
    pub remap_interval_ms: u32,
    /// Preview packet ceiling in bytes.
    pub package_size: usize,
    /// Owner tag for pins claimed by ingestion.
    #[serde(skip)]
    pub pin_owner: &'static str,
}

impl FixtureConfig {
    /// Defaults: [`NUM_LEDS_MAX`], [`NUM_VLEDS_MAX`], no blending, 1 s remap
    /// interval, [`PACKAGE_SIZE`] packets, pins owned by [`LEDS_OWNER`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_leds: NUM_LEDS_MAX,
            max_virtual_leds: NUM_VLEDS_MAX,
            global_blend: 0,
            remap_interval_ms: REMAP_INTERVAL.as_millis() as u32,
            package_size: PACKAGE_SIZE,
            pin_owner: LEDS_OWNER,
        }
    }

    /// Set the physical capacity.
    #[must_use]
    pub const fn with_max_leds(mut self, max_leds: u16) -> Self {
        assert!(max_leds > 0, "max_leds must be positive");
        self.max_leds = max_leds;
        self
    }

    /// Set the logical index cap.
    #[must_use]
    pub const fn with_max_virtual_leds(mut self, max_virtual_leds: u16) -> Self {
        assert!(max_virtual_leds > 0, "max_virtual_leds must be positive");
        self.max_virtual_leds = max_virtual_leds;
        self
    }

    /// Set the blend amount applied where a pixel's blend flag is set.
    #[must_use]
    pub const fn with_global_blend(mut self, global_blend: u8) -> Self {
        self.global_blend = global_blend;
        self
    }

    /// Set the debounce interval between mapping cycles.
    #[must_use]
    pub const fn with_remap_interval_ms(mut self, remap_interval_ms: u32) -> Self {
        self.remap_interval_ms = remap_interval_ms;
        self
    }

    /// Set the preview packet ceiling.
    #[must_use]
    pub const fn with_package_size(mut self, package_size: usize) -> Self {
        // Room for a geometry header plus one 3-axis, 2-byte coordinate.
        assert!(package_size >= 32, "package_size must be at least 32 bytes");
        self.package_size = package_size;
        self
    }

    /// Set the owner tag for pins claimed by ingestion.
    #[must_use]
    pub const fn with_pin_owner(mut self, pin_owner: &'static str) -> Self {
        self.pin_owner = pin_owner;
        self
    }

    /// Debounce interval as a [`Duration`].
    #[must_use]
    pub const fn remap_interval(&self) -> Duration {
        Duration::from_millis(self.remap_interval_ms as u64)
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self::new()
    }
}
