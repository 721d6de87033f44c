//! Iterator adapters that draw a meter while the loop runs.
//!
//! This module provides the [`ProgressIteratorExt`] trait, which adds helper methods to
//! any Rust [`Iterator`]. Wrapping never changes what the loop sees: the same items, in
//! the same order, and the same number of them.
//!
//! # Lifecycle
//!
//! * The first call to `next()` starts the meter and draws the zero-progress line.
//! * An item is counted when the consumer asks for the following one, i.e. after the
//!   loop body has processed it.
//! * Exhausting the source finishes the meter.
//! * Dropping the adapter mid-pass (an early `break`, a `?`, a panic in the loop body)
//!   also finishes the meter. The item in flight at that moment is not counted.
//!
//! # Total Detection
//!
//! Unless a total is given explicitly, the adapters look at [`Iterator::size_hint`]: an
//! exact hint (lower bound equals upper bound) is the total. The `*_counted` variants
//! additionally fall back to counting a clone of a [`Clone`] source. Anything else
//! leaves the total unknown and the meter renders without a bar.
//!
//! # Example
//!
//! ```
//! use tqdm::{ProgressBuilder, ProgressIteratorExt as _, io::SharedBuffer};
//!
//! let out = SharedBuffer::new();
//! let doubled: Vec<_> = vec![1, 2, 3]
//!     .into_iter()
//!     .tqdm_with(ProgressBuilder::new().desc("double").leave(true), out.clone())
//!     .map(|x| x * 2)
//!     .collect();
//!
//! assert_eq!(doubled, [2, 4, 6]);
//! assert!(out.contents().contains("double: |##########| 3/3 100%"));
//! assert!(out.contents().ends_with('\n'));
//! ```

use std::io::{self, Stderr, Write};

use tracing::{debug, warn};

use crate::{
    builder::ProgressBuilder,
    clock::{Clock, SystemClock},
    error::{ProgressError, Result},
    progress::{Phase, ProgressController},
};

/// Detects the total from an exact [`Iterator::size_hint`].
#[must_use]
pub fn detect_total<I: Iterator>(iter: &I) -> Option<u64> {
    match iter.size_hint() {
        (lower, Some(upper)) if lower == upper => u64::try_from(upper).ok(),
        _ => None,
    }
}

/// Like [`detect_total`], falling back to counting a clone of the source.
///
/// Sources that report themselves as unbounded (`(usize::MAX, None)`) are not counted.
/// Any other source is traversed to the end, so it must be finite: an endless iterator
/// with an inexact hint, such as `(0u64..).filter(..)` reporting `(0, None)`, never
/// returns from the count.
#[must_use]
pub fn detect_total_counted<I: Iterator + Clone>(iter: &I) -> Option<u64> {
    if let Some(total) = detect_total(iter) {
        return Some(total);
    }
    if iter.size_hint() == (usize::MAX, None) {
        debug!("source is unbounded, total unknown");
        return None;
    }

    let counted = u64::try_from(iter.clone().count()).ok();
    debug!(total = ?counted, "counted source to find total");
    counted
}

/// An iterator adapter that drives a [`ProgressController`] around its source.
pub struct Tqdm<I, W: Write, C: Clock = SystemClock> {
    iter: I,
    controller: ProgressController<W, C>,
    // An item was handed out and has not been counted yet.
    pending: bool,
    // Set on the first sink failure; no further hooks run.
    halted: bool,
    error: Option<ProgressError>,
}

impl<I, W: Write, C: Clock> Tqdm<I, W, C> {
    /// Wraps `iter` with an idle controller.
    ///
    /// Note: This is usually constructed via [`ProgressIteratorExt`] methods.
    pub const fn new(iter: I, controller: ProgressController<W, C>) -> Self {
        Self {
            iter,
            controller,
            pending: false,
            halted: false,
            error: None,
        }
    }

    /// The controller behind this adapter.
    #[must_use]
    pub const fn controller(&self) -> &ProgressController<W, C> {
        &self.controller
    }

    /// Takes the sink error that stopped rendering, if any.
    ///
    /// `Iterator::next` cannot report failures, so the first one is kept here. Once an
    /// error has occurred the meter stays frozen but items keep flowing.
    pub fn take_error(&mut self) -> Option<ProgressError> {
        self.error.take()
    }

    fn record(&mut self, outcome: Result<()>) {
        if let Err(err) = outcome {
            warn!(%err, "progress output failed, meter disabled");
            self.halted = true;
            self.error.get_or_insert(err);
        }
    }
}

impl<I: Iterator, W: Write, C: Clock> Tqdm<I, W, C> {
    /// Runs the whole pass, calling `f` on every item.
    ///
    /// Unlike a plain `for` loop, a sink failure ends the pass and is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Sink`] as soon as writing progress fails.
    pub fn run<F: FnMut(I::Item)>(mut self, mut f: F) -> Result<()> {
        while let Some(item) = self.next() {
            if let Some(err) = self.error.take() {
                return Err(err);
            }
            f(item);
        }
        self.error.take().map_or(Ok(()), Err)
    }
}

impl<I: Iterator, W: Write, C: Clock> Iterator for Tqdm<I, W, C> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.halted {
            match self.controller.phase() {
                Phase::Idle => {
                    let outcome = self.controller.start();
                    self.record(outcome);
                }
                Phase::Running if self.pending => {
                    let outcome = self.controller.step();
                    self.record(outcome);
                }
                Phase::Running | Phase::Finished => {}
            }
        }
        self.pending = false;

        let item = self.iter.next();

        if item.is_some() {
            self.pending = true;
        } else if !self.halted && self.controller.phase() == Phase::Running {
            let outcome = self.controller.finish();
            self.record(outcome);
        }

        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<I, W: Write, C: Clock> Drop for Tqdm<I, W, C> {
    fn drop(&mut self) {
        if self.halted || self.controller.phase() != Phase::Running {
            return;
        }
        if let Err(err) = self.controller.finish() {
            debug!(%err, "failed to finish progress on drop");
        }
    }
}

/// Extension trait to attach a progress meter to any Iterator.
pub trait ProgressIteratorExt: Iterator + Sized {
    /// Wraps the iterator with default settings, drawing to standard error.
    fn tqdm(self) -> Tqdm<Self, Stderr> {
        self.tqdm_with(ProgressBuilder::new(), io::stderr())
    }

    /// Wraps the iterator with default settings, drawing to `sink`.
    fn tqdm_to<W: Write>(self, sink: W) -> Tqdm<Self, W> {
        self.tqdm_with(ProgressBuilder::new(), sink)
    }

    /// Wraps the iterator with custom settings, drawing to `sink`.
    ///
    /// A total set on the builder wins over the detected size.
    fn tqdm_with<W: Write, C: Clock>(self, builder: ProgressBuilder<C>, sink: W) -> Tqdm<Self, W, C> {
        let builder = builder.total_or(|| detect_total(&self));
        Tqdm::new(self, builder.build(sink))
    }

    /// Like [`tqdm`](Self::tqdm), counting a clone of the source when its size is not
    /// known up front.
    ///
    /// The clone is run to completion, so the source must be finite; see
    /// [`detect_total_counted`].
    fn tqdm_counted(self) -> Tqdm<Self, Stderr>
    where
        Self: Clone,
    {
        self.tqdm_counted_with(ProgressBuilder::new(), io::stderr())
    }

    /// Like [`tqdm_with`](Self::tqdm_with), counting a clone of the source when its size
    /// is not known up front.
    ///
    /// The clone is run to completion, so the source must be finite; see
    /// [`detect_total_counted`].
    fn tqdm_counted_with<W: Write, C: Clock>(
        self,
        builder: ProgressBuilder<C>,
        sink: W,
    ) -> Tqdm<Self, W, C>
    where
        Self: Clone,
    {
        let builder = builder.total_or(|| detect_total_counted(&self));
        Tqdm::new(self, builder.build(sink))
    }
}

impl<I: Iterator> ProgressIteratorExt for I {}
