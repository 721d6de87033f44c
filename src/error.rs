//! Error types for progress rendering.
//!
//! Only two things can go wrong while a meter is live: the sink refuses a write, or
//! the lifecycle hooks are called out of order. Failures while probing a source for
//! its size never reach this type; detection degrades to an unknown total instead.

use std::io;

/// Errors surfaced by [`ProgressController`](crate::ProgressController) and the
/// iterator adapter.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Writing or flushing the output sink failed.
    #[error("failed to write progress to sink: {0}")]
    Sink(#[from] io::Error),

    /// `step` or `finish` was called before `start`.
    #[error("progress meter has not been started")]
    NotStarted,

    /// `start` was called on a meter that is already running.
    #[error("progress meter is already running")]
    AlreadyStarted,

    /// The meter has finished; controllers are single-pass.
    #[error("progress meter has already finished")]
    AlreadyFinished,
}

impl ProgressError {
    /// Returns `true` for lifecycle misuse, as opposed to an I/O failure.
    #[must_use]
    pub const fn is_misuse(&self) -> bool {
        !matches!(self, Self::Sink(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ProgressError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::io;

    use super::ProgressError;

    /// Error Classification
    /// Sink failures are not misuse; lifecycle errors are.
    #[test]
    fn test_misuse_classification() {
        let sink: ProgressError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert!(!sink.is_misuse());
        assert!(ProgressError::NotStarted.is_misuse());
        assert!(ProgressError::AlreadyStarted.is_misuse());
        assert!(ProgressError::AlreadyFinished.is_misuse());
        assert!(sink.to_string().contains("closed"));
    }
}
