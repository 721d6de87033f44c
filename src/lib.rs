//! # `tqdm`
//!
//! Throttled, in-place textual progress meters for any iterator.
//!
//! Wrap a loop's source and every step is accompanied by a live status line written to
//! a sink of your choice, redrawn in place with carriage returns:
//!
//! ```text
//! files: |#####-----| 5/10  50% [elapsed: 00:10 left: 00:10,  0.50 iters/sec]
//! ```
//!
//! The iteration itself is untouched: same items, same order, same count. Redraws are
//! throttled by both a step count and a wall-clock interval, so the cost per item is
//! usually a single integer comparison.
//!
//! ## Modules
//!
//! * [`format`]: Pure meter rendering (`format_interval`, `format_meter`).
//! * [`printer`]: [`StatusPrinter`], which overwrites one line in place.
//! * [`progress`]: The [`ProgressController`] state machine and its throttle.
//! * [`builder`]: [`Settings`] and the fluent [`ProgressBuilder`].
//! * [`iter`]: The [`Tqdm`] adapter and [`ProgressIteratorExt`].
//! * [`clock`]: Time sources, including a [`ManualClock`](clock::ManualClock) for tests.
//! * [`io`]: [`SharedBuffer`](io::SharedBuffer), an inspectable in-memory sink.
//! * [`error`]: [`ProgressError`].
//!
//! ## Example
//!
//! ```no_run
//! use tqdm::ProgressIteratorExt as _;
//!
//! for _ in (0..1000).tqdm() {
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod clock;
pub mod error;
pub mod format;
pub mod io;
pub mod iter;
pub mod printer;
pub mod progress;

pub use builder::{ProgressBuilder, Settings};
pub use error::{ProgressError, Result};
pub use format::{BAR_WIDTH, format_interval, format_meter};
pub use iter::{ProgressIteratorExt, Tqdm};
pub use printer::StatusPrinter;
pub use progress::{Phase, ProgressController};
