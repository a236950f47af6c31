//! Ambient error type for the small set of eagerly-validated, non-hot-path
//! calls (buffer construction). The insertion engine itself never returns
//! `Result` — see [`crate::push::PushOutcome`].

use thiserror::Error;

/// Things that can go wrong setting up an [`crate::Buffer`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SBufferError {
    /// `size` must be strictly positive.
    #[error("buffer size must be > 0, got {0}")]
    NonPositiveSize(i32),

    /// `z_near` must be strictly positive.
    #[error("z_near must be > 0, got {0}")]
    NonPositiveZNear(f32),

    /// `max_depth` must allow at least one descent frame.
    #[error("max_depth must be >= 1, got {0}")]
    ZeroMaxDepth(usize),
}
