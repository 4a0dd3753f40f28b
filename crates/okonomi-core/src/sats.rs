//! # Sats — Typed Payment Rates
//!
//! A closed set of rate kinds. Every consumer matches exhaustively, so a
//! new kind cannot be added without revisiting amount calculation and
//! change detection.
//!
//! - `Dagsats` pays per weekday (Monday–Friday) inside a period.
//! - `Dag7` pays per calendar day.
//! - `Engang` pays its value once for the whole period.

use serde::{Deserialize, Serialize};

use crate::error::YtelseError;
use crate::periode::Periode;

/// A typed rate. Equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "verdi", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sats {
    /// Paid for each weekday.
    Dagsats(u64),
    /// Paid for each calendar day.
    Dag7(u64),
    /// Paid once for the whole period.
    Engang(u64),
}

impl Sats {
    /// The nominal rate value.
    pub fn verdi(&self) -> u64 {
        match self {
            Sats::Dagsats(v) | Sats::Dag7(v) | Sats::Engang(v) => *v,
        }
    }

    /// Whether this is a one-time amount.
    pub fn er_engang(&self) -> bool {
        matches!(self, Sats::Engang(_))
    }

    /// The wire name of the rate kind.
    pub fn type_navn(&self) -> &'static str {
        match self {
            Sats::Dagsats(_) => "DAGSATS",
            Sats::Dag7(_) => "DAG7",
            Sats::Engang(_) => "ENGANG",
        }
    }

    /// Amount this rate pays over `periode`, saturating on overflow.
    pub fn beregn_belop(&self, periode: &Periode) -> u64 {
        match self {
            Sats::Dagsats(v) => v.saturating_mul(periode.antall_virkedager()),
            Sats::Dag7(v) => v.saturating_mul(periode.antall_dager()),
            Sats::Engang(v) => *v,
        }
    }
}

impl std::fmt::Display for Sats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.type_navn(), self.verdi())
    }
}

/// Payout percentage applied on top of a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Utbetalingsgrad(u32);

impl Utbetalingsgrad {
    /// Full payout.
    pub const FULL: Utbetalingsgrad = Utbetalingsgrad(100);

    /// Create a payout percentage, rejecting values above 100.
    pub fn new(prosent: u32) -> Result<Self, YtelseError> {
        if prosent > 100 {
            return Err(YtelseError::InvalidUtbetalingsgrad(prosent));
        }
        Ok(Self(prosent))
    }

    /// The percentage.
    pub fn prosent(&self) -> u32 {
        self.0
    }

    /// Apply the percentage to `belop`, rounding down.
    pub fn anvend(&self, belop: u64) -> u64 {
        (u128::from(belop) * u128::from(self.0) / 100) as u64
    }
}

impl TryFrom<u32> for Utbetalingsgrad {
    type Error = YtelseError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Utbetalingsgrad::new(value)
    }
}

impl From<Utbetalingsgrad> for u32 {
    fn from(grad: Utbetalingsgrad) -> Self {
        grad.0
    }
}
