#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive span of token indexes covered by a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Interval {
    start: i64,
    stop: i64,
}

impl Interval {
    /// Sentinel for a node whose bounds were never set.
    pub const INVALID: Self = Self { start: -1, stop: -2 };

    #[must_use]
    pub const fn new(start: i64, stop: i64) -> Self {
        Self { start, stop }
    }

    /// Span covering a single token.
    #[must_use]
    pub const fn point(index: i64) -> Self {
        Self {
            start: index,
            stop: index,
        }
    }

    #[must_use]
    pub const fn start(self) -> i64 {
        self.start
    }

    #[must_use]
    pub const fn stop(self) -> i64 {
        self.stop
    }

    /// Number of tokens covered; zero for the invalid sentinel.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn len(self) -> usize {
        if self.stop < self.start {
            0
        } else {
            (self.stop - self.start + 1) as usize
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.stop)
    }
}
