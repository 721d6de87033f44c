//! The throttled progress state machine.
//!
//! A [`ProgressController`] walks a single, linear lifecycle:
//!
//! ```text
//! Idle --start--> Running --step*--> Running --finish--> Finished
//! ```
//!
//! # Throttling
//!
//! `step` is on the hot path of the wrapped loop, so it checks in two stages. First the
//! counter: fewer than `min_iters` steps since the last redraw means nothing else happens,
//! not even a clock read. Only then is the clock consulted, and a redraw happens when at
//! least `min_interval` has passed since the previous one.
//!
//! # Misuse
//!
//! Calling hooks out of order is reported as an error rather than ignored: `step` or
//! `finish` before `start` yields [`ProgressError::NotStarted`], a second `start` yields
//! [`ProgressError::AlreadyStarted`], and anything after `finish` yields
//! [`ProgressError::AlreadyFinished`]. A rejected call writes nothing.

use std::io::Write;

use compact_str::CompactString;
use tracing::{debug, trace};
use web_time::Instant;

use crate::{
    builder::Settings,
    clock::Clock,
    error::{ProgressError, Result},
    format::format_meter,
    printer::StatusPrinter,
};

/// Where a controller is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Constructed, `start` not yet called.
    #[default]
    Idle,
    /// Between `start` and `finish`.
    Running,
    /// `finish` has run. Terminal.
    Finished,
}

/// Counters and timestamps of one pass. Only exists while running.
#[derive(Clone, Copy, Debug)]
struct Tally {
    n: u64,
    start: Instant,
    last_print: Instant,
    last_print_n: u64,
}

#[derive(Clone, Copy, Debug)]
enum State {
    Idle,
    Running(Tally),
    Finished { n: u64 },
}

/// Drives one meter through start, steps and finish.
pub struct ProgressController<W, C> {
    settings: Settings,
    prefix: CompactString,
    min_iters: u64,
    printer: StatusPrinter<W>,
    clock: C,
    state: State,
}

impl<W, C> std::fmt::Debug for ProgressController<W, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressController")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<W, C> ProgressController<W, C> {
    /// Creates an idle controller. See also [`ProgressBuilder`](crate::ProgressBuilder).
    pub fn new(settings: Settings, sink: W, clock: C) -> Self {
        Self {
            prefix: settings.prefix(),
            min_iters: settings.effective_min_iters(),
            settings,
            printer: StatusPrinter::new(sink),
            clock,
            state: State::Idle,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Running(_) => Phase::Running,
            State::Finished { .. } => Phase::Finished,
        }
    }

    /// Items processed so far (0 before `start`).
    #[must_use]
    pub const fn n(&self) -> u64 {
        match self.state {
            State::Idle => 0,
            State::Running(tally) => tally.n,
            State::Finished { n } => n,
        }
    }

    /// Count at the most recent redraw, while running.
    #[must_use]
    pub const fn last_print_n(&self) -> Option<u64> {
        match self.state {
            State::Running(tally) => Some(tally.last_print_n),
            _ => None,
        }
    }

    /// The expected total, if known.
    #[must_use]
    pub const fn total(&self) -> Option<u64> {
        self.settings.total
    }

    /// The configuration this controller was built with.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Borrows the sink.
    #[must_use]
    pub const fn sink(&self) -> &W {
        self.printer.sink()
    }

    /// Consumes the controller and returns the sink.
    pub fn into_sink(self) -> W {
        self.printer.into_sink()
    }
}

impl<W: Write, C: Clock> ProgressController<W, C> {
    /// Starts the pass and draws the zero-progress meter.
    ///
    /// # Errors
    ///
    /// [`ProgressError::AlreadyStarted`] or [`ProgressError::AlreadyFinished`] on misuse;
    /// [`ProgressError::Sink`] if the first draw fails (the pass is still running).
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            State::Idle => {}
            State::Running(_) => return Err(ProgressError::AlreadyStarted),
            State::Finished { .. } => return Err(ProgressError::AlreadyFinished),
        }

        let now = self.clock.now();
        self.state = State::Running(Tally {
            n: 0,
            start: now,
            last_print: now,
            last_print_n: 0,
        });
        debug!(total = ?self.settings.total, prefix = %self.prefix, "progress started");

        self.render(0, 0.0)
    }

    /// Records one processed item, redrawing if the throttle allows.
    ///
    /// # Errors
    ///
    /// [`ProgressError::NotStarted`] or [`ProgressError::AlreadyFinished`] on misuse;
    /// [`ProgressError::Sink`] if a redraw fails.
    pub fn step(&mut self) -> Result<()> {
        let tally = match &mut self.state {
            State::Running(tally) => tally,
            State::Idle => return Err(ProgressError::NotStarted),
            State::Finished { .. } => return Err(ProgressError::AlreadyFinished),
        };

        tally.n += 1;
        if tally.n - tally.last_print_n < self.min_iters {
            return Ok(());
        }

        let now = self.clock.now();
        if now.saturating_duration_since(tally.last_print) < self.settings.min_interval {
            return Ok(());
        }

        tally.last_print_n = tally.n;
        tally.last_print = now;
        let (n, elapsed) = (tally.n, now.saturating_duration_since(tally.start));

        self.render(n, elapsed.as_secs_f64())
    }

    /// Ends the pass.
    ///
    /// Without `leave`, the meter is erased and the cursor left at column 0 with no
    /// newline. With `leave`, a stale meter is redrawn at the final count, then a single
    /// newline is written.
    ///
    /// The controller is `Finished` afterwards even if writing fails.
    ///
    /// # Errors
    ///
    /// [`ProgressError::NotStarted`] or [`ProgressError::AlreadyFinished`] on misuse;
    /// [`ProgressError::Sink`] if the final writes fail.
    pub fn finish(&mut self) -> Result<()> {
        let tally = match self.state {
            State::Running(tally) => tally,
            State::Idle => return Err(ProgressError::NotStarted),
            State::Finished { .. } => return Err(ProgressError::AlreadyFinished),
        };
        self.state = State::Finished { n: tally.n };
        debug!(n = tally.n, leave = self.settings.leave, "progress finished");

        if !self.settings.leave {
            self.printer.print_status("")?;
            self.printer.write_raw("\r")?;
            return Ok(());
        }

        if tally.last_print_n < tally.n {
            let elapsed = self.clock.now().saturating_duration_since(tally.start);
            self.render(tally.n, elapsed.as_secs_f64())?;
        }
        self.printer.write_raw("\n")?;
        Ok(())
    }

    fn render(&mut self, n: u64, elapsed: f64) -> Result<()> {
        let meter = format_meter(n, self.settings.total, elapsed);
        trace!(n, elapsed, "progress redraw");

        let mut line = self.prefix.clone();
        line.push_str(&meter);
        self.printer.print_status(&line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{io, time::Duration};

    use crate::{
        ProgressBuilder, ProgressError,
        clock::ManualClock,
        io::SharedBuffer,
        progress::{Phase, ProgressController},
    };

    fn meter(
        builder: ProgressBuilder,
    ) -> (ProgressController<SharedBuffer, ManualClock>, SharedBuffer, ManualClock) {
        let out = SharedBuffer::new();
        let clock = ManualClock::new();
        let controller = builder.clock(clock.clone()).build(out.clone());
        (controller, out, clock)
    }

    /// Start Draws Zero
    /// `start` immediately prints the prefixed zero-progress meter.
    #[test]
    fn test_start_prints_zero_meter() {
        let (mut p, out, _) = meter(ProgressBuilder::new().desc("job").total(10u64));

        p.start().unwrap();

        assert_eq!(p.phase(), Phase::Running);
        assert_eq!(
            out.contents(),
            "\rjob: |----------| 0/10   0% [elapsed: 00:00 left: ?, ? iters/sec]\r"
        );
    }

    /// Two-Stage Throttle
    /// Four quick steps under `min_iters` never redraw; the fifth, a second later, does.
    #[test]
    fn test_throttle_iters_then_interval() {
        let (mut p, out, clock) = meter(
            ProgressBuilder::new()
                .total(10u64)
                .min_iters(5)
                .min_interval(Duration::from_secs(1)),
        );
        p.start().unwrap();
        let after_start = out.len();

        for _ in 0..4 {
            p.step().unwrap();
        }
        assert_eq!(out.len(), after_start, "no redraw below min_iters");

        clock.advance(Duration::from_secs(1));
        p.step().unwrap();
        assert_eq!(p.last_print_n(), Some(5));
        assert_eq!(
            out.last_status().as_deref(),
            Some("|#####-----| 5/10  50% [elapsed: 00:01 left: 00:01,  5.00 iters/sec]")
        );
    }

    /// Interval Gate
    /// Enough steps but too little time means no redraw.
    #[test]
    fn test_throttle_interval_blocks() {
        let (mut p, out, clock) = meter(ProgressBuilder::new().min_interval_secs(0.5));
        p.start().unwrap();
        let after_start = out.len();

        clock.advance(Duration::from_millis(499));
        p.step().unwrap();
        assert_eq!(out.len(), after_start);
        assert_eq!(p.last_print_n(), Some(0));

        clock.advance(Duration::from_millis(1));
        p.step().unwrap();
        assert_eq!(p.last_print_n(), Some(2));
        assert_eq!(
            out.last_status().as_deref(),
            Some("2 [elapsed: 00:00,  4.00 iters/sec]")
        );
    }

    /// Erase On Finish
    /// Without `leave`, the output ends in a line clear and never contains a newline.
    #[test]
    fn test_finish_erases() {
        let (mut p, out, clock) = meter(ProgressBuilder::new().total(3u64).min_interval(Duration::ZERO));
        p.start().unwrap();
        for _ in 0..3 {
            clock.advance_secs(1.0);
            p.step().unwrap();
        }
        p.finish().unwrap();

        let written = out.contents();
        let last_line_len = "|##########| 3/3 100% [elapsed: 00:03 left: 00:00,  1.00 iters/sec]".len();
        let clear = format!("\r{}\r\r", " ".repeat(last_line_len));
        assert!(written.ends_with(&clear), "{written:?}");
        assert!(!written.contains('\n'));
        assert_eq!(p.phase(), Phase::Finished);
        assert_eq!(p.n(), 3);
    }

    /// Leave Refreshes Stale Meter
    /// A throttled final step is still shown, followed by exactly one newline.
    #[test]
    fn test_finish_leave_redraws_stale() {
        let (mut p, out, clock) = meter(
            ProgressBuilder::new()
                .desc("d")
                .total(4u64)
                .leave(true)
                .min_interval(Duration::from_secs(60)),
        );
        p.start().unwrap();
        for _ in 0..4 {
            p.step().unwrap();
        }
        assert_eq!(p.last_print_n(), Some(0));

        clock.advance_secs(2.0);
        p.finish().unwrap();

        let written = out.contents();
        assert!(written.ends_with("\r\n"), "{written:?}");
        assert_eq!(written.matches('\n').count(), 1);
        assert_eq!(
            out.last_status().as_deref(),
            Some("d: |##########| 4/4 100% [elapsed: 00:02 left: 00:00,  2.00 iters/sec]")
        );
    }

    /// Leave Without Stale Meter
    /// An up-to-date meter is not drawn twice.
    #[test]
    fn test_finish_leave_fresh() {
        let (mut p, out, clock) = meter(ProgressBuilder::new().leave(true).min_interval(Duration::ZERO));
        p.start().unwrap();
        clock.advance_secs(1.0);
        p.step().unwrap();
        let before = out.contents();

        p.finish().unwrap();

        assert_eq!(out.contents(), format!("{before}\n"));
    }

    /// Unbounded Interval
    /// An infinite interval keeps every step quiet; `leave` still shows the final count.
    #[test]
    fn test_infinite_interval_never_redraws() {
        let (mut p, out, clock) = meter(
            ProgressBuilder::new()
                .total(3u64)
                .leave(true)
                .min_interval_secs(f64::INFINITY),
        );
        assert_eq!(p.settings().min_interval, Duration::MAX);
        assert_eq!(p.settings().total, Some(3));

        p.start().unwrap();
        let after_start = out.len();
        for _ in 0..3 {
            clock.advance_secs(3600.0);
            p.step().unwrap();
        }
        assert_eq!(out.len(), after_start);
        assert_eq!(p.last_print_n(), Some(0));

        p.finish().unwrap();
        assert!(out.contents().contains("3/3 100%"));
        assert!(out.contents().ends_with('\n'));
    }

    /// Misuse
    /// Out-of-order calls are rejected and write nothing.
    #[test]
    fn test_misuse_is_rejected() {
        let (mut p, out, _) = meter(ProgressBuilder::new());

        assert!(matches!(p.step(), Err(ProgressError::NotStarted)));
        assert!(matches!(p.finish(), Err(ProgressError::NotStarted)));
        assert!(out.is_empty());

        p.start().unwrap();
        assert!(matches!(p.start(), Err(ProgressError::AlreadyStarted)));

        p.finish().unwrap();
        let len = out.len();
        assert!(matches!(p.finish(), Err(ProgressError::AlreadyFinished)));
        assert!(matches!(p.step(), Err(ProgressError::AlreadyFinished)));
        assert!(matches!(p.start(), Err(ProgressError::AlreadyFinished)));
        assert_eq!(out.len(), len);
    }

    struct FailAfter {
        remaining: usize,
    }

    impl io::Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::other("disk full"));
            }
            self.remaining -= 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Sink Failure Propagates
    #[test]
    fn test_sink_error_propagates() {
        let mut p = ProgressBuilder::new()
            .min_interval(Duration::ZERO)
            .build(FailAfter { remaining: 0 });

        let err = p.start().unwrap_err();
        assert!(matches!(err, ProgressError::Sink(_)));
        assert_eq!(p.phase(), Phase::Running);

        assert!(matches!(p.finish(), Err(ProgressError::Sink(_))));
        assert_eq!(p.phase(), Phase::Finished);
    }

    /// Overrun
    /// Stepping past the total switches to the unbounded meter.
    #[test]
    fn test_overrun_renders_unbounded() {
        let (mut p, out, clock) = meter(ProgressBuilder::new().total(1u64).min_interval(Duration::ZERO));
        p.start().unwrap();
        clock.advance_secs(1.0);
        p.step().unwrap();
        p.step().unwrap();

        assert_eq!(
            out.last_status().as_deref(),
            Some("2 [elapsed: 00:01,  2.00 iters/sec]")
        );
    }
}
