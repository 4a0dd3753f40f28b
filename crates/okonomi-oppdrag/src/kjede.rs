//! # Oppdragskjede
//!
//! The already-accepted, append-only history of lines for one chain. A
//! chain is created once and only ever extended; lines are never edited
//! or removed.
//!
//! ## Integrity Invariants
//!
//! - Every line belongs to the same fagsystem.
//! - Each new line's sequence number is strictly higher than every earlier
//!   one. The single exception is a feriepenger overwrite, which repeats
//!   the current head's id.
//! - Every `ref_delytelse_id` names an earlier line of the chain.
//!
//! Lines are kept in submission order; an id → position table serves
//! lookups by id without any line holding a reference to another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use okonomi_core::{DelytelseId, FagsystemId, Ytelse, YtelseBuilder, YtelseError, YtelsePeriode};

use crate::fortsettelse::OppdragKjedeFortsettelse;
use crate::linje::OppdragLinje;
use crate::OppdragError;

/// An immutable, validated chain of oppdrag lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<OppdragLinje>", into = "Vec<OppdragLinje>")]
pub struct OppdragKjede {
    linjer: Vec<OppdragLinje>,
    indeks: BTreeMap<DelytelseId, usize>,
}

impl OppdragKjede {
    /// The empty chain of a recipient with no accepted lines.
    pub fn tom() -> Self {
        Self::default()
    }

    /// Build a chain from lines in submission order.
    pub fn fra_linjer(
        linjer: impl IntoIterator<Item = OppdragLinje>,
    ) -> Result<Self, OppdragError> {
        let mut kjede = Self::default();
        for linje in linjer {
            kjede.legg_til(linje)?;
        }
        Ok(kjede)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.linjer.len()
    }

    /// Whether the chain has no lines.
    pub fn is_empty(&self) -> bool {
        self.linjer.is_empty()
    }

    /// All lines in submission order.
    pub fn linjer(&self) -> &[OppdragLinje] {
        &self.linjer
    }

    /// The current chain head.
    pub fn siste_linje(&self) -> Option<&OppdragLinje> {
        self.linjer.last()
    }

    /// The latest line carrying `id`.
    pub fn linje(&self, id: &DelytelseId) -> Option<&OppdragLinje> {
        self.indeks.get(id).and_then(|&i| self.linjer.get(i))
    }

    /// The fagsystem of the chain, if it has any line.
    pub fn fagsystem_id(&self) -> Option<FagsystemId> {
        self.linjer.first().map(|l| l.delytelse_id.fagsystem_id())
    }

    /// Highest sequence number used by the chain.
    pub fn hoyeste_lopenummer(&self) -> Option<u64> {
        self.indeks.keys().next_back().map(DelytelseId::lopenummer)
    }

    /// The effective schedule the chain currently promises.
    ///
    /// Lines are replayed in order. An opphørslinje removes all coverage
    /// from its opphør date; a payment line replaces all coverage from its
    /// own `fom` and then adds its period.
    pub fn til_ytelse(&self) -> Result<Ytelse, YtelseError> {
        let mut perioder: Vec<YtelsePeriode> = Vec::new();
        for linje in &self.linjer {
            let fra = linje.opphor_fom_dato.unwrap_or(linje.periode.fom());
            let for_fra = |p: YtelsePeriode| {
                let rest = p.periode().til_og_med_dagen_for(fra)?;
                Some(p.med_periode(rest))
            };
            perioder = perioder.into_iter().filter_map(for_fra).collect();
            if !linje.er_opphor() {
                perioder.push(linje.ytelse_periode());
            }
        }
        perioder
            .into_iter()
            .fold(Ytelse::builder(), YtelseBuilder::legg_til)
            .build()
    }

    /// A new chain with the continuation's lines appended.
    pub fn utvid(
        &self,
        fortsettelse: &OppdragKjedeFortsettelse,
    ) -> Result<OppdragKjede, OppdragError> {
        let mut kjede = self.clone();
        for linje in fortsettelse.oppdragslinjer() {
            kjede.legg_til(linje.clone())?;
        }
        Ok(kjede)
    }

    fn legg_til(&mut self, linje: OppdragLinje) -> Result<(), OppdragError> {
        let id = linje.delytelse_id;

        if let Some(fagsystem) = self.fagsystem_id() {
            if id.fagsystem_id() != fagsystem {
                return Err(OppdragError::FagsystemMismatch {
                    forventet: fagsystem,
                    faktisk: id.fagsystem_id(),
                });
            }
        }

        if let Some(r) = linje.ref_delytelse_id {
            if !self.indeks.contains_key(&r) {
                return Err(OppdragError::BrokenChain(format!(
                    "line {id} refers to {r}, which is not an earlier line of the chain"
                )));
            }
        }

        let siste = self.siste_linje().map(|l| l.delytelse_id);
        let er_overskriving = siste == Some(id);
        if !er_overskriving {
            if self.indeks.contains_key(&id) {
                return Err(OppdragError::BrokenChain(format!(
                    "line id {id} is already used and is not the chain head"
                )));
            }
            if let Some(hoyeste) = self.hoyeste_lopenummer() {
                if id.lopenummer() <= hoyeste {
                    return Err(OppdragError::BrokenChain(format!(
                        "line id {id} does not follow the highest sequence number {hoyeste}"
                    )));
                }
            }
        } else if linje.ref_delytelse_id == Some(id) {
            return Err(OppdragError::BrokenChain(format!(
                "line {id} refers to itself"
            )));
        }

        self.indeks.insert(id, self.linjer.len());
        self.linjer.push(linje);
        Ok(())
    }
}

impl TryFrom<Vec<OppdragLinje>> for OppdragKjede {
    type Error = OppdragError;

    fn try_from(linjer: Vec<OppdragLinje>) -> Result<Self, Self::Error> {
        OppdragKjede::fra_linjer(linjer)
    }
}

impl From<OppdragKjede> for Vec<OppdragLinje> {
    fn from(kjede: OppdragKjede) -> Self {
        kjede.linjer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use okonomi_core::{Periode, Sats};

    fn dato(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn yp(fom: NaiveDate, tom: NaiveDate, sats: Sats) -> YtelsePeriode {
        YtelsePeriode::new(Periode::new(fom, tom).unwrap(), sats)
    }

    const F: FagsystemId = FagsystemId(42);

    #[test]
    fn empty_chain() {
        let kjede = OppdragKjede::tom();
        assert!(kjede.is_empty());
        assert_eq!(kjede.len(), 0);
        assert_eq!(kjede.siste_linje(), None);
        assert_eq!(kjede.hoyeste_lopenummer(), None);
        assert!(kjede.til_ytelse().unwrap().er_tom());
    }

    #[test]
    fn replay_of_payment_lines() {
        let l1 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(1, 1), dato(1, 31), Sats::Dag7(100)),
            None,
        );
        let l2 = OppdragLinje::ny(
            F.delytelse(101),
            yp(dato(2, 1), dato(2, 29), Sats::Dag7(200)),
            Some(l1.delytelse_id),
        );
        let kjede = OppdragKjede::fra_linjer([l1, l2]).unwrap();
        let ytelse = kjede.til_ytelse().unwrap();
        assert_eq!(ytelse.perioder().len(), 2);
        assert_eq!(ytelse.forste_dato(), Some(dato(1, 1)));
        assert_eq!(ytelse.siste_dato(), Some(dato(2, 29)));
        assert_eq!(kjede.hoyeste_lopenummer(), Some(101));
    }

    #[test]
    fn opphor_truncates_effective_schedule() {
        let l1 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(1, 1), dato(1, 31), Sats::Dag7(100)),
            None,
        );
        let l2 = OppdragLinje::ny(
            F.delytelse(101),
            yp(dato(2, 1), dato(2, 29), Sats::Dag7(200)),
            Some(l1.delytelse_id),
        );
        let o3 = OppdragLinje::opphor(&l2, F.delytelse(102), dato(1, 15));
        let kjede = OppdragKjede::fra_linjer([l1, l2, o3]).unwrap();
        let ytelse = kjede.til_ytelse().unwrap();
        assert_eq!(ytelse.perioder().len(), 1);
        assert_eq!(ytelse.perioder()[0].periode(), Periode::new(dato(1, 1), dato(1, 14)).unwrap());
    }

    #[test]
    fn later_line_replaces_from_its_fom() {
        let l1 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(1, 1), dato(1, 31), Sats::Dag7(100)),
            None,
        );
        let l2 = OppdragLinje::ny(
            F.delytelse(101),
            yp(dato(1, 10), dato(1, 20), Sats::Dag7(300)),
            Some(l1.delytelse_id),
        );
        let kjede = OppdragKjede::fra_linjer([l1, l2]).unwrap();
        assert!(!kjede.is_empty());
        let ytelse = kjede.til_ytelse().unwrap();
        assert_eq!(ytelse.perioder().len(), 2);
        assert_eq!(ytelse.perioder()[0].periode(), Periode::new(dato(1, 1), dato(1, 9)).unwrap());
        assert_eq!(ytelse.perioder()[1].sats(), Sats::Dag7(300));
    }

    #[test]
    fn overwrite_of_head_is_accepted() {
        let l1 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(5, 1), dato(5, 31), Sats::Engang(1000)),
            None,
        );
        let l1b = OppdragLinje::overskriv(&l1, yp(dato(5, 1), dato(5, 31), Sats::Engang(1001)));
        let kjede = OppdragKjede::fra_linjer([l1, l1b]).unwrap();
        assert_eq!(kjede.len(), 2);
        assert_eq!(kjede.linje(&F.delytelse(100)).unwrap().sats, Sats::Engang(1001));
        let ytelse = kjede.til_ytelse().unwrap();
        assert_eq!(ytelse.perioder().len(), 1);
        assert_eq!(ytelse.perioder()[0].sats(), Sats::Engang(1001));
    }

    #[test]
    fn reused_sequence_number_rejected() {
        let l1 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(1, 1), dato(1, 31), Sats::Dag7(100)),
            None,
        );
        let l2 = OppdragLinje::ny(
            F.delytelse(101),
            yp(dato(2, 1), dato(2, 29), Sats::Dag7(100)),
            Some(l1.delytelse_id),
        );
        let l3 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(3, 1), dato(3, 31), Sats::Dag7(100)),
            Some(l2.delytelse_id),
        );
        let err = OppdragKjede::fra_linjer([l1, l2, l3]).unwrap_err();
        assert!(matches!(err, OppdragError::BrokenChain(_)));
    }

    #[test]
    fn dangling_ref_rejected() {
        let l1 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(1, 1), dato(1, 31), Sats::Dag7(100)),
            Some(F.delytelse(99)),
        );
        assert!(matches!(
            OppdragKjede::fra_linjer([l1]),
            Err(OppdragError::BrokenChain(_))
        ));
    }

    #[test]
    fn foreign_fagsystem_rejected() {
        let l1 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(1, 1), dato(1, 31), Sats::Dag7(100)),
            None,
        );
        let l2 = OppdragLinje::ny(
            FagsystemId(43).delytelse(101),
            yp(dato(2, 1), dato(2, 29), Sats::Dag7(100)),
            None,
        );
        assert!(matches!(
            OppdragKjede::fra_linjer([l1, l2]),
            Err(OppdragError::FagsystemMismatch { .. })
        ));
    }

    #[test]
    fn deserialization_validates() {
        let l1 = OppdragLinje::ny(
            F.delytelse(100),
            yp(dato(1, 1), dato(1, 31), Sats::Dag7(100)),
            None,
        );
        let kjede = OppdragKjede::fra_linjer([l1.clone()]).unwrap();
        let json = serde_json::to_string(&kjede).unwrap();
        let parsed: OppdragKjede = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, kjede);

        // A repeated head id is an overwrite and therefore accepted; a dangling ref is not.
        let overskrevet = serde_json::to_string(&vec![l1.clone(), l1]).unwrap();
        assert!(serde_json::from_str::<OppdragKjede>(&overskrevet).is_ok());
        let dinglende = OppdragLinje::ny(
            F.delytelse(101),
            yp(dato(2, 1), dato(2, 29), Sats::Dag7(100)),
            Some(F.delytelse(7)),
        );
        let json = serde_json::to_string(&vec![dinglende]).unwrap();
        assert!(serde_json::from_str::<OppdragKjede>(&json).is_err());
    }
}
