//! Fluent interface for configuring progress meters.
//!
//! [`Settings`] is the plain-data configuration of one meter: description, total,
//! throttle thresholds and whether the final line stays on screen. [`ProgressBuilder`]
//! layers a clock on top and produces a [`ProgressController`] once a sink is supplied.
//!
//! The sink is always an explicit argument to [`ProgressBuilder::build`]; the controller
//! has no notion of a process-wide default stream.
//!
//! # Example
//!
//! ```
//! use tqdm::{ProgressBuilder, io::SharedBuffer};
//!
//! let out = SharedBuffer::new();
//! let mut meter = ProgressBuilder::new()
//!     .desc("download")
//!     .total(3u64)
//!     .leave(true)
//!     .build(out.clone());
//!
//! meter.start().unwrap();
//! assert!(out.contents().starts_with("\rdownload: |----------| 0/3"));
//! ```

use std::time::Duration;

use compact_str::{CompactString, format_compact};

use crate::{
    clock::{Clock, SystemClock, duration_from_secs},
    progress::ProgressController,
};

/// Default minimum number of steps between redraws.
pub const DEFAULT_MIN_ITERS: u64 = 1;

/// Default minimum wall-clock time between redraws.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Immutable configuration of a single meter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    /// Label rendered as `"<desc>: "` before every line.
    pub desc: Option<CompactString>,
    /// Expected number of items. `None` renders the unbounded meter.
    pub total: Option<u64>,
    /// Keep the final meter on screen instead of erasing it.
    pub leave: bool,
    /// Minimum step delta before a redraw is considered. Values below 1 act as 1.
    pub min_iters: u64,
    /// Minimum time between redraws.
    pub min_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            desc: None,
            total: None,
            leave: false,
            min_iters: DEFAULT_MIN_ITERS,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

impl Settings {
    /// The text printed before every meter: `"<desc>: "`, or empty.
    #[must_use]
    pub fn prefix(&self) -> CompactString {
        self.desc
            .as_ref()
            .map_or_else(CompactString::default, |desc| format_compact!("{desc}: "))
    }

    /// `min_iters`, clamped to at least 1.
    #[must_use]
    pub fn effective_min_iters(&self) -> u64 {
        self.min_iters.max(1)
    }
}

/// A builder for [`ProgressController`] instances.
#[derive(Clone, Debug, Default)]
pub struct ProgressBuilder<C = SystemClock> {
    settings: Settings,
    clock: C,
}

impl ProgressBuilder {
    /// Starts from the default [`Settings`] and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C> ProgressBuilder<C> {
    /// Replaces all settings at once.
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the description shown before the meter.
    #[must_use]
    pub fn desc(mut self, desc: impl Into<CompactString>) -> Self {
        self.settings.desc = Some(desc.into());
        self
    }

    /// Sets the expected number of items, overriding any detected size.
    #[must_use]
    pub fn total(mut self, total: impl Into<u64>) -> Self {
        self.settings.total = Some(total.into());
        self
    }

    /// Sets the total only when nothing was set explicitly.
    #[must_use]
    pub(crate) fn total_or(mut self, detected: impl FnOnce() -> Option<u64>) -> Self {
        if self.settings.total.is_none() {
            self.settings.total = detected();
        }
        self
    }

    /// Whether the final meter stays on screen.
    #[must_use]
    pub const fn leave(mut self, leave: bool) -> Self {
        self.settings.leave = leave;
        self
    }

    /// Minimum number of steps between redraws.
    #[must_use]
    pub const fn min_iters(mut self, min_iters: u64) -> Self {
        self.settings.min_iters = min_iters;
        self
    }

    /// Minimum time between redraws.
    #[must_use]
    pub const fn min_interval(mut self, min_interval: Duration) -> Self {
        self.settings.min_interval = min_interval;
        self
    }

    /// Minimum time between redraws, in seconds.
    ///
    /// Negative and NaN values act as zero; values too large for a [`Duration`]
    /// (including infinity) act as [`Duration::MAX`], i.e. no redraw after `start`.
    #[must_use]
    pub fn min_interval_secs(self, secs: f64) -> Self {
        self.min_interval(duration_from_secs(secs))
    }

    /// Swaps the time source, typically for a [`ManualClock`](crate::clock::ManualClock)
    /// in tests.
    #[must_use]
    pub fn clock<C2: Clock>(self, clock: C2) -> ProgressBuilder<C2> {
        ProgressBuilder {
            settings: self.settings,
            clock,
        }
    }

    /// The settings accumulated so far.
    #[must_use]
    pub const fn current_settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds an idle controller writing to `sink`.
    #[must_use]
    pub fn build<W>(self, sink: W) -> ProgressController<W, C> {
        ProgressController::new(self.settings, sink, self.clock)
    }
}
