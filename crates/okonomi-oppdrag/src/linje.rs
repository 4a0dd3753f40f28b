//! # Oppdragslinje
//!
//! One line of the external disbursement ledger. A line either promises
//! payment over its period at its rate, or, when `opphor_fom_dato` is set,
//! stops everything the chain previously promised from that date.
//!
//! `ref_delytelse_id` is a weak back-reference: the id of the line this one
//! follows in the chain. It is a lookup key, never an owning handle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use okonomi_core::{DelytelseId, Periode, Sats, Utbetalingsgrad, YtelsePeriode};

/// A single oppdrag line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OppdragLinje {
    /// Unique id of this line within its fagsystem.
    pub delytelse_id: DelytelseId,
    /// Period the line covers. For an opphørslinje, the restated period of
    /// the line being stopped.
    pub periode: Periode,
    /// Rate of the line.
    pub sats: Sats,
    /// Payout percentage, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utbetalingsgrad: Option<Utbetalingsgrad>,
    /// Id of the line this one follows in the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_delytelse_id: Option<DelytelseId>,
    /// When set, the line stops all earlier promises from this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opphor_fom_dato: Option<NaiveDate>,
}

impl OppdragLinje {
    /// A payment line for `ytelse_periode`, following `ref_delytelse_id`.
    pub fn ny(
        delytelse_id: DelytelseId,
        ytelse_periode: YtelsePeriode,
        ref_delytelse_id: Option<DelytelseId>,
    ) -> Self {
        Self {
            delytelse_id,
            periode: ytelse_periode.periode(),
            sats: ytelse_periode.sats(),
            utbetalingsgrad: ytelse_periode.utbetalingsgrad(),
            ref_delytelse_id,
            opphor_fom_dato: None,
        }
    }

    /// An opphørslinje restating `siste`'s period and rate, stopping
    /// payment from `opphor_fom_dato`. It follows `siste` in the chain.
    pub fn opphor(
        siste: &OppdragLinje,
        delytelse_id: DelytelseId,
        opphor_fom_dato: NaiveDate,
    ) -> Self {
        Self {
            delytelse_id,
            periode: siste.periode,
            sats: siste.sats,
            utbetalingsgrad: siste.utbetalingsgrad,
            ref_delytelse_id: Some(siste.delytelse_id),
            opphor_fom_dato: Some(opphor_fom_dato),
        }
    }

    /// A replacement of `siste` carrying new content under the same id and
    /// the same back-reference.
    pub fn overskriv(siste: &OppdragLinje, ytelse_periode: YtelsePeriode) -> Self {
        Self::ny(siste.delytelse_id, ytelse_periode, siste.ref_delytelse_id)
    }

    /// Whether this is a termination instruction.
    pub fn er_opphor(&self) -> bool {
        self.opphor_fom_dato.is_some()
    }

    /// The payout the line promises, ignoring any opphør date.
    pub fn ytelse_periode(&self) -> YtelsePeriode {
        match self.utbetalingsgrad {
            Some(grad) => YtelsePeriode::med_utbetalingsgrad(self.periode, self.sats, grad),
            None => YtelsePeriode::new(self.periode, self.sats),
        }
    }
}

impl std::fmt::Display for OppdragLinje {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.delytelse_id, self.periode, self.sats)?;
        if let Some(r) = self.ref_delytelse_id {
            write!(f, " ref={r}")?;
        }
        if let Some(d) = self.opphor_fom_dato {
            write!(f, " opphør fom {d}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use okonomi_core::FagsystemId;

    fn periode() -> Periode {
        Periode::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn opphor_restates_head_and_refers_to_it() {
        let fagsystem = FagsystemId(1);
        let grad = Utbetalingsgrad::new(80).unwrap();
        let siste = OppdragLinje::ny(
            fagsystem.delytelse(101),
            YtelsePeriode::med_utbetalingsgrad(periode(), Sats::Dag7(500), grad),
            Some(fagsystem.delytelse(100)),
        );
        let dato = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let opphor = OppdragLinje::opphor(&siste, fagsystem.delytelse(102), dato);

        assert!(opphor.er_opphor());
        assert!(!siste.er_opphor());
        assert_eq!(opphor.periode, siste.periode);
        assert_eq!(opphor.sats, siste.sats);
        assert_eq!(opphor.utbetalingsgrad, Some(grad));
        assert_eq!(opphor.ref_delytelse_id, Some(siste.delytelse_id));
        assert_eq!(opphor.opphor_fom_dato, Some(dato));
    }

    #[test]
    fn overskriv_keeps_id_and_ref() {
        let fagsystem = FagsystemId(1);
        let siste = OppdragLinje::ny(
            fagsystem.delytelse(101),
            YtelsePeriode::new(periode(), Sats::Engang(1000)),
            Some(fagsystem.delytelse(100)),
        );
        let ny = OppdragLinje::overskriv(&siste, YtelsePeriode::new(periode(), Sats::Engang(1001)));
        assert_eq!(ny.delytelse_id, siste.delytelse_id);
        assert_eq!(ny.ref_delytelse_id, siste.ref_delytelse_id);
        assert_eq!(ny.sats, Sats::Engang(1001));
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let linje = OppdragLinje::ny(
            FagsystemId(7).delytelse(100),
            YtelsePeriode::new(periode(), Sats::Dagsats(900)),
            None,
        );
        let json = serde_json::to_value(&linje).unwrap();
        assert!(json.get("ref_delytelse_id").is_none());
        assert!(json.get("opphor_fom_dato").is_none());
        assert!(json.get("utbetalingsgrad").is_none());
        let parsed: OppdragLinje = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, linje);
    }
}
