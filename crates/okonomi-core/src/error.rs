//! # Error Types — Malformed Input
//!
//! Errors raised while constructing the value types of this crate. Every
//! variant describes input that can never be repaired automatically: the
//! caller supplied an inverted period, overlapping schedule periods, or an
//! out-of-range payout percentage.

use chrono::NaiveDate;
use thiserror::Error;

/// Malformed schedule input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum YtelseError {
    /// A period whose `fom` lies after its `tom`.
    #[error("inverted period: fom {fom} is after tom {tom}")]
    InvertedPeriode {
        /// Requested start date.
        fom: NaiveDate,
        /// Requested end date.
        tom: NaiveDate,
    },

    /// Two schedule periods share at least one day.
    #[error("overlapping periods: {forrige} overlaps {neste}")]
    OverlappingPerioder {
        /// The earlier period, rendered as `fom..=tom`.
        forrige: String,
        /// The later period, rendered as `fom..=tom`.
        neste: String,
    },

    /// Utbetalingsgrad outside `0..=100`.
    #[error("utbetalingsgrad must be within 0..=100, got {0}")]
    InvalidUtbetalingsgrad(u32),
}
