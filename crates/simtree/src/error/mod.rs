//! Recognition-failure records.
//!
//! This layer does not raise parse errors; it records and transports them.
//! A [`RecognitionError`] is attached to a rule node by the external
//! error-recovery logic when a rule aborts abnormally; its absence means
//! the rule completed normally.
//!
//! When the `diagnostics` feature is enabled, errors integrate with
//! [`miette`] for rich reporting.

use crate::tree::Interval;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Why a rule invocation aborted instead of completing.
///
/// Records are plain values so the same failure can live on the rule node
/// that aborted and in a driver-side error list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum RecognitionError {
    #[error("no viable alternative at '{offending}' (tokens {span})")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(recognizer::no_viable_alternative))
    )]
    NoViableAlternative { span: Interval, offending: String },

    #[error("mismatched input '{offending}' (tokens {span})")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(recognizer::input_mismatch)))]
    InputMismatch {
        span: Interval,
        offending: String,
        expected: Vec<String>,
    },

    #[error("predicate failed: {predicate}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(recognizer::failed_predicate)))]
    FailedPredicate { span: Interval, predicate: String },
}

impl RecognitionError {
    /// Token-index span the failure covers.
    #[must_use]
    pub const fn span(&self) -> Interval {
        match self {
            Self::NoViableAlternative { span, .. }
            | Self::InputMismatch { span, .. }
            | Self::FailedPredicate { span, .. } => *span,
        }
    }
}
