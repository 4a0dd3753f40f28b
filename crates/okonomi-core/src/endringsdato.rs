//! # Endringsdato — Change-Date Detection
//!
//! Compares two [`Ytelse`] schedules and finds the earliest calendar date
//! at which their effective daily payout differs.
//!
//! ## Algorithm
//!
//! Every `fom` and every `tom + 1` of both schedules is a boundary. Between
//! two consecutive boundaries neither schedule changes its covering period,
//! so each segment is decided by comparing the two covering periods. Within
//! a segment only the weekday varies, and the weekday pattern repeats every
//! seven days, so at most the first seven days of a segment are inspected.
//!
//! Each covered day projects to a comparable payout:
//!
//! - `Dagsats` on Saturday/Sunday projects to nothing when weekends are
//!   ignored, so splitting or merging a dagsats period across a weekend is
//!   not a change.
//! - `Dag7` projects literally on every day.
//! - `Engang` projects its whole period, so resizing a one-time period is
//!   a change from its first day.
//!
//! The comparison is symmetric: `finn_endringsdato(a, b) == finn_endringsdato(b, a)`.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::periode::{er_helg, Periode};
use crate::sats::{Sats, Utbetalingsgrad};
use crate::ytelse::{Ytelse, YtelsePeriode};

/// Payout a single day contributes to the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dagsverdi {
    Lopende {
        sats: Sats,
        grad: Option<Utbetalingsgrad>,
    },
    Engang {
        periode: Periode,
        sats: Sats,
        grad: Option<Utbetalingsgrad>,
    },
}

/// Pure change-date finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndringsdatoTjeneste {
    ignorer_dagsats_i_helg: bool,
}

impl EndringsdatoTjeneste {
    /// Literal comparison: dagsats on weekends counts like any other day.
    pub fn normal() -> Self {
        Self {
            ignorer_dagsats_i_helg: false,
        }
    }

    /// Weekend-neutral comparison used for reconciliation.
    pub fn ignorer_dagsats_i_helg() -> Self {
        Self {
            ignorer_dagsats_i_helg: true,
        }
    }

    /// The earliest date at which `y1` and `y2` pay differently, or `None`
    /// if they are payment-equivalent for every date.
    pub fn finn_endringsdato(&self, y1: &Ytelse, y2: &Ytelse) -> Option<NaiveDate> {
        match (y1.er_tom(), y2.er_tom()) {
            (true, true) => return None,
            (true, false) => return y2.forste_dato(),
            (false, true) => return y1.forste_dato(),
            (false, false) => {}
        }

        let grenser = grenser(y1, y2);
        let mut iter = grenser.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let neste = iter.peek().copied();
            let p1 = dekkende_periode(y1, start);
            let p2 = dekkende_periode(y2, start);
            if p1.is_none() && p2.is_none() {
                continue;
            }

            // The segment runs from this boundary up to the day before the next.
            let segment = start
                .iter_days()
                .take(7)
                .take_while(|dato| neste.map_or(true, |n| *dato < n));
            for dato in segment {
                if self.dagsverdi(p1, dato) != self.dagsverdi(p2, dato) {
                    return Some(dato);
                }
            }
        }
        None
    }

    fn dagsverdi(&self, periode: Option<&YtelsePeriode>, dato: NaiveDate) -> Option<Dagsverdi> {
        let p = periode?;
        let grad = p.utbetalingsgrad();
        match p.sats() {
            Sats::Dagsats(_) if self.ignorer_dagsats_i_helg && er_helg(dato) => None,
            sats @ (Sats::Dagsats(_) | Sats::Dag7(_)) => Some(Dagsverdi::Lopende { sats, grad }),
            sats @ Sats::Engang(_) => Some(Dagsverdi::Engang {
                periode: p.periode(),
                sats,
                grad,
            }),
        }
    }
}

impl Default for EndringsdatoTjeneste {
    fn default() -> Self {
        Self::ignorer_dagsats_i_helg()
    }
}

/// All dates at which either schedule may change its covering period.
fn grenser(y1: &Ytelse, y2: &Ytelse) -> BTreeSet<NaiveDate> {
    let mut grenser = BTreeSet::new();
    for p in y1.perioder().iter().chain(y2.perioder()) {
        grenser.insert(p.periode().fom());
        if let Some(etter) = p.periode().tom().succ_opt() {
            grenser.insert(etter);
        }
    }
    grenser
}

/// The period of `ytelse` covering `dato`, if any.
fn dekkende_periode(ytelse: &Ytelse, dato: NaiveDate) -> Option<&YtelsePeriode> {
    let perioder = ytelse.perioder();
    let idx = perioder.partition_point(|p| p.periode().fom() <= dato);
    let kandidat = perioder.get(idx.checked_sub(1)?)?;
    kandidat.periode().inneholder(dato).then_some(kandidat)
}
