//! Debounced remap trigger.
//!
//! Remap requests are latched and coalesced: at most one mapping cycle runs per
//! interval, however many requests arrive in between. A request that arrives while
//! a cycle is in progress is deferred to the next cycle, never interleaved.
//!
//! Time is supplied by the caller, so the same code runs under an embassy executor
//! (`Instant::now()`) and in host tests (`Instant::from_millis`).
//!
//! ```
//! use embassy_time::{Duration, Instant};
//! use fixture_kit::schedule::{MappingStatus, RemapScheduler};
//!
//! let mut scheduler = RemapScheduler::new(Duration::from_secs(1));
//! scheduler.request();
//! assert!(scheduler.is_due(Instant::from_millis(0)));
//! scheduler.begin(Instant::from_millis(0));
//! scheduler.finish();
//!
//! scheduler.request();
//! assert!(!scheduler.is_due(Instant::from_millis(400)));
//! assert!(scheduler.is_due(Instant::from_millis(1000)));
//! assert_eq!(scheduler.status(), MappingStatus::Requested);
//! ```

use embassy_time::{Duration, Instant};
use log::debug;

/// Where the mapping cycle stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MappingStatus {
    /// Nothing to do.
    #[default]
    Idle,
    /// A remap is latched and waits for the interval to elapse.
    Requested,
    /// A remap is running; hardware output is suppressed.
    InProgress,
}

/// Latch plus debounce interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemapScheduler {
    status: MappingStatus,
    last_run: Option<Instant>,
    interval: Duration,
    deferred: bool,
}

impl RemapScheduler {
    /// Idle scheduler that runs at most once per `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            status: MappingStatus::Idle,
            last_run: None,
            interval,
            deferred: false,
        }
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> MappingStatus {
        self.status
    }

    /// Latch a remap. While a cycle runs the request is deferred to the next one.
    pub fn request(&mut self) {
        match self.status {
            MappingStatus::Idle => self.status = MappingStatus::Requested,
            MappingStatus::Requested => {}
            MappingStatus::InProgress => {
                debug!("RemapScheduler: request deferred until the running cycle ends");
                self.deferred = true;
            }
        }
    }

    /// `true` when a request is latched and the interval since the last run has elapsed.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.status == MappingStatus::Requested
            && self
                .last_run
                .is_none_or(|last_run| now.saturating_duration_since(last_run) >= self.interval)
    }

    /// Enter [`MappingStatus::InProgress`].
    pub fn begin(&mut self, now: Instant) {
        self.status = MappingStatus::InProgress;
        self.last_run = Some(now);
    }

    /// Leave [`MappingStatus::InProgress`], re-latching a deferred request.
    pub fn finish(&mut self) {
        self.status = if self.deferred {
            MappingStatus::Requested
        } else {
            MappingStatus::Idle
        };
        self.deferred = false;
    }

    /// `false` while a cycle is in progress.
    #[must_use]
    pub fn show_allowed(&self) -> bool {
        self.status != MappingStatus::InProgress
    }
}
