//! # Ytelse — Entitlement Schedule
//!
//! The target-truth payout schedule: an ordered collection of
//! [`YtelsePeriode`]s whose periods never overlap. Gaps are legal and mean
//! "no entitlement for these days" (a suspension, not a termination).
//!
//! Instances are produced by [`YtelseBuilder`], which sorts the appended
//! periods and rejects overlaps. Deserialization goes through the same
//! validation, so a malformed `Ytelse` cannot be materialised.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::YtelseError;
use crate::periode::Periode;
use crate::sats::{Sats, Utbetalingsgrad};

/// One period of entitlement at a given rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YtelsePeriode {
    periode: Periode,
    sats: Sats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utbetalingsgrad: Option<Utbetalingsgrad>,
}

impl YtelsePeriode {
    /// A period at the given rate with full payout.
    pub fn new(periode: Periode, sats: Sats) -> Self {
        Self {
            periode,
            sats,
            utbetalingsgrad: None,
        }
    }

    /// A period at the given rate and payout percentage.
    pub fn med_utbetalingsgrad(periode: Periode, sats: Sats, grad: Utbetalingsgrad) -> Self {
        Self {
            periode,
            sats,
            utbetalingsgrad: Some(grad),
        }
    }

    /// The covered period.
    pub fn periode(&self) -> Periode {
        self.periode
    }

    /// The rate.
    pub fn sats(&self) -> Sats {
        self.sats
    }

    /// The payout percentage, if one was given.
    pub fn utbetalingsgrad(&self) -> Option<Utbetalingsgrad> {
        self.utbetalingsgrad
    }

    /// Same rate and percentage over a different period.
    pub fn med_periode(&self, periode: Periode) -> Self {
        Self { periode, ..*self }
    }

    /// Amount payable for this period after the payout percentage.
    pub fn belop(&self) -> u64 {
        let brutto = self.sats.beregn_belop(&self.periode);
        match self.utbetalingsgrad {
            Some(grad) => grad.anvend(brutto),
            None => brutto,
        }
    }
}

/// An ordered, non-overlapping entitlement schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<YtelsePeriode>", into = "Vec<YtelsePeriode>")]
pub struct Ytelse {
    perioder: Vec<YtelsePeriode>,
}

impl Ytelse {
    /// Start building a schedule.
    pub fn builder() -> YtelseBuilder {
        YtelseBuilder::default()
    }

    /// The empty schedule.
    pub fn tom() -> Self {
        Self::default()
    }

    /// Whether the schedule has no periods.
    pub fn er_tom(&self) -> bool {
        self.perioder.is_empty()
    }

    /// The periods, ordered by `fom`.
    pub fn perioder(&self) -> &[YtelsePeriode] {
        &self.perioder
    }

    /// First covered date.
    pub fn forste_dato(&self) -> Option<NaiveDate> {
        self.perioder.first().map(|p| p.periode.fom())
    }

    /// Last covered date.
    pub fn siste_dato(&self) -> Option<NaiveDate> {
        self.perioder.last().map(|p| p.periode.tom())
    }

    /// Whether any period covers `dato` or a later day.
    pub fn har_verdi_pa_eller_etter(&self, dato: NaiveDate) -> bool {
        self.perioder.iter().any(|p| p.periode.tom() >= dato)
    }

    /// The periods covering `dato` or later, with a period that straddles
    /// `dato` truncated to start at it.
    pub fn perioder_fra_og_med(&self, dato: NaiveDate) -> Vec<YtelsePeriode> {
        self.perioder
            .iter()
            .filter_map(|p| p.periode.fra_og_med(dato).map(|rest| p.med_periode(rest)))
            .collect()
    }

    /// Sum of [`YtelsePeriode::belop`] over all periods, saturating.
    pub fn total_belop(&self) -> u64 {
        self.perioder
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.belop()))
    }
}

impl TryFrom<Vec<YtelsePeriode>> for Ytelse {
    type Error = YtelseError;

    fn try_from(perioder: Vec<YtelsePeriode>) -> Result<Self, Self::Error> {
        perioder
            .into_iter()
            .fold(Ytelse::builder(), YtelseBuilder::legg_til)
            .build()
    }
}

impl From<Ytelse> for Vec<YtelsePeriode> {
    fn from(ytelse: Ytelse) -> Self {
        ytelse.perioder
    }
}

/// Append-only builder for [`Ytelse`].
#[derive(Debug, Clone, Default)]
pub struct YtelseBuilder {
    perioder: Vec<YtelsePeriode>,
}

impl YtelseBuilder {
    /// Append a period.
    pub fn legg_til(mut self, periode: YtelsePeriode) -> Self {
        self.perioder.push(periode);
        self
    }

    /// Append a full-payout period.
    pub fn periode(self, periode: Periode, sats: Sats) -> Self {
        self.legg_til(YtelsePeriode::new(periode, sats))
    }

    /// Sort the periods and reject any overlap.
    pub fn build(mut self) -> Result<Ytelse, YtelseError> {
        self.perioder.sort_by_key(|p| p.periode);
        for par in self.perioder.windows(2) {
            if par[0].periode.overlapper(&par[1].periode) {
                return Err(YtelseError::OverlappingPerioder {
                    forrige: par[0].periode.to_string(),
                    neste: par[1].periode.to_string(),
                });
            }
        }
        Ok(Ytelse {
            perioder: self.perioder,
        })
    }
}
