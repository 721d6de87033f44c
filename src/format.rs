//! Pure rendering of progress meters.
//!
//! Nothing here touches a clock or a sink. Callers hand in a counter, an optional
//! total and the elapsed seconds, and get back the text of one status line:
//!
//! * Bounded: `|#####-----| 5/10  50% [elapsed: 00:10 left: 00:10,  0.50 iters/sec]`
//! * Unbounded: `3 [elapsed: 00:01,  3.00 iters/sec]`

use compact_str::{CompactString, format_compact};

/// Number of cells in the bounded bar.
pub const BAR_WIDTH: u64 = 10;

const FILLED: char = '#';
const EMPTY: char = '-';

/// Formats a number of seconds as `MM:SS`, or `H:MM:SS` once an hour has passed.
///
/// Fractional seconds are truncated. Negative and NaN inputs render as `00:00`.
///
/// ```
/// use tqdm::format::format_interval;
///
/// assert_eq!(format_interval(65.9), "01:05");
/// assert_eq!(format_interval(3661.0), "1:01:01");
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn format_interval(seconds: f64) -> CompactString {
    // `as` saturates: NaN and negatives become 0.
    let total = seconds as u64;
    let (mins, secs) = (total / 60, total % 60);
    let (hours, mins) = (mins / 60, mins % 60);

    if hours > 0 {
        format_compact!("{hours}:{mins:02}:{secs:02}")
    } else {
        format_compact!("{mins:02}:{secs:02}")
    }
}

/// Renders the meter for `n` processed items out of an optional `total`.
///
/// A count past the total (overrun) falls back to the unbounded rendering, since the
/// bar cannot show more than 100%.
///
/// ```
/// use tqdm::format::format_meter;
///
/// assert_eq!(
///     format_meter(0, Some(10), 0.0),
///     "|----------| 0/10   0% [elapsed: 00:00 left: ?, ? iters/sec]"
/// );
/// assert_eq!(format_meter(3, None, 1.0), "3 [elapsed: 00:01,  3.00 iters/sec]");
/// ```
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_meter(n: u64, total: Option<u64>, elapsed: f64) -> CompactString {
    let total = total.filter(|&total| n <= total);
    let elapsed = if elapsed.is_nan() { 0.0 } else { elapsed.max(0.0) };

    let elapsed_str = format_interval(elapsed);
    let rate = if elapsed > 0.0 {
        format_compact!("{:5.2}", n as f64 / elapsed)
    } else {
        CompactString::from("?")
    };

    let Some(total) = total else {
        return format_compact!("{n} [elapsed: {elapsed_str}, {rate} iters/sec]");
    };

    let filled = filled_cells(n, total);
    let mut bar = CompactString::with_capacity(BAR_WIDTH as usize);
    bar.extend((0..BAR_WIDTH).map(|cell| if cell < filled { FILLED } else { EMPTY }));

    let percentage = percentage(n, total);

    let left = if n > 0 {
        format_interval(elapsed / n as f64 * (total - n) as f64)
    } else {
        CompactString::from("?")
    };

    format_compact!(
        "|{bar}| {n}/{total} {percentage:>3}% [elapsed: {elapsed_str} left: {left}, {rate} iters/sec]"
    )
}

/// Completed fraction of `total`, in `[0, 1]` whenever `n <= total`.
///
/// An empty job (`total == 0`) counts as complete.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn fraction(n: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        n as f64 / total as f64
    }
}

/// `floor(fraction * BAR_WIDTH)`, computed exactly.
#[allow(clippy::cast_possible_truncation)]
fn filled_cells(n: u64, total: u64) -> u64 {
    if total == 0 {
        return BAR_WIDTH;
    }
    (u128::from(n) * u128::from(BAR_WIDTH) / u128::from(total)).min(u128::from(BAR_WIDTH)) as u64
}

/// `floor(fraction * 100)`, computed exactly.
#[allow(clippy::cast_possible_truncation)]
fn percentage(n: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (u128::from(n) * 100 / u128::from(total)).min(100) as u64
}
