//! # Periode — Closed Date Interval
//!
//! An inclusive `[fom, tom]` interval of calendar dates. Construction
//! rejects inverted bounds, so every `Periode` in the system satisfies
//! `fom <= tom`. Open-ended periods use [`Periode::TIDENES_ENDE`] as `tom`.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::YtelseError;

/// An inclusive date interval.
///
/// Compared by value. Ordering is by `fom`, then `tom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodeRaw")]
pub struct Periode {
    fom: NaiveDate,
    tom: NaiveDate,
}

#[derive(Deserialize)]
struct PeriodeRaw {
    fom: NaiveDate,
    tom: NaiveDate,
}

impl TryFrom<PeriodeRaw> for Periode {
    type Error = YtelseError;

    fn try_from(raw: PeriodeRaw) -> Result<Self, Self::Error> {
        Periode::new(raw.fom, raw.tom)
    }
}

impl Periode {
    /// Upper bound used for periods without a known end.
    pub const TIDENES_ENDE: NaiveDate = NaiveDate::MAX;

    /// Create a period, rejecting `fom > tom`.
    pub fn new(fom: NaiveDate, tom: NaiveDate) -> Result<Self, YtelseError> {
        if fom > tom {
            return Err(YtelseError::InvertedPeriode { fom, tom });
        }
        Ok(Self { fom, tom })
    }

    /// A single-day period.
    pub fn dag(dato: NaiveDate) -> Self {
        Self {
            fom: dato,
            tom: dato,
        }
    }

    /// An open-ended period starting at `fom`.
    pub fn fra_og_med_uten_slutt(fom: NaiveDate) -> Self {
        Self {
            fom,
            tom: Self::TIDENES_ENDE,
        }
    }

    /// First day of the period.
    pub fn fom(&self) -> NaiveDate {
        self.fom
    }

    /// Last day of the period (inclusive).
    pub fn tom(&self) -> NaiveDate {
        self.tom
    }

    /// Whether the period has no known end.
    pub fn er_apen(&self) -> bool {
        self.tom == Self::TIDENES_ENDE
    }

    /// Whether `dato` lies within the period.
    pub fn inneholder(&self, dato: NaiveDate) -> bool {
        self.fom <= dato && dato <= self.tom
    }

    /// Whether the two periods share at least one day.
    pub fn overlapper(&self, other: &Periode) -> bool {
        self.fom <= other.tom && other.fom <= self.tom
    }

    /// Number of calendar days in the period.
    pub fn antall_dager(&self) -> u64 {
        // fom <= tom is guaranteed by construction, so the difference is non-negative.
        (self.tom - self.fom).num_days().unsigned_abs() + 1
    }

    /// Number of Monday–Friday days in the period.
    pub fn antall_virkedager(&self) -> u64 {
        let dager = self.antall_dager();
        let hele_uker = dager / 7;
        let mut virkedager = hele_uker * 5;
        let rest = self
            .fom
            .checked_add_days(Days::new(hele_uker * 7))
            .map(|start| Periode {
                fom: start,
                tom: self.tom,
            });
        if let Some(rest) = rest {
            virkedager += rest.dager().filter(|d| !er_helg(*d)).count() as u64;
        }
        virkedager
    }

    /// The part of this period from `dato` onward, if any.
    pub fn fra_og_med(&self, dato: NaiveDate) -> Option<Periode> {
        if dato > self.tom {
            return None;
        }
        Some(Self {
            fom: self.fom.max(dato),
            tom: self.tom,
        })
    }

    /// The part of this period strictly before `dato`, if any.
    pub fn til_og_med_dagen_for(&self, dato: NaiveDate) -> Option<Periode> {
        if dato <= self.fom {
            return None;
        }
        let siste = dato.pred_opt()?;
        Some(Self {
            fom: self.fom,
            tom: self.tom.min(siste),
        })
    }

    /// Iterate over every day in the period.
    pub fn dager(&self) -> impl Iterator<Item = NaiveDate> {
        let tom = self.tom;
        self.fom.iter_days().take_while(move |d| *d <= tom)
    }
}

impl std::fmt::Display for Periode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.er_apen() {
            write!(f, "{}..", self.fom)
        } else {
            write!(f, "{}..={}", self.fom, self.tom)
        }
    }
}

/// Saturday or Sunday.
pub fn er_helg(dato: NaiveDate) -> bool {
    matches!(dato.weekday(), Weekday::Sat | Weekday::Sun)
}
