//! # Kjedefortsettelse — Reconciliation Result
//!
//! The ordered lines one reconciliation produced, plus the change date
//! they take effect from and the next free sequence number. Callers submit
//! all lines in order or none; an opphørslinje always precedes the
//! continuation lines it makes room for.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::linje::OppdragLinje;

/// The continuation of one oppdrag chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OppdragKjedeFortsettelse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endringsdato: Option<NaiveDate>,
    oppdragslinjer: Vec<OppdragLinje>,
    neste_lopenummer: u64,
}

impl OppdragKjedeFortsettelse {
    pub(crate) fn new(
        endringsdato: Option<NaiveDate>,
        oppdragslinjer: Vec<OppdragLinje>,
        neste_lopenummer: u64,
    ) -> Self {
        Self {
            endringsdato,
            oppdragslinjer,
            neste_lopenummer,
        }
    }

    /// First date the new lines change the payout.
    pub fn endringsdato(&self) -> Option<NaiveDate> {
        self.endringsdato
    }

    /// New lines in submission order.
    pub fn oppdragslinjer(&self) -> &[OppdragLinje] {
        &self.oppdragslinjer
    }

    /// Next free sequence number after the lines this continuation consumed.
    /// Saturates at `u64::MAX` when the last line took that number.
    pub fn neste_lopenummer(&self) -> u64 {
        self.neste_lopenummer
    }

    /// Whether any line terminates earlier promises.
    pub fn har_opphor(&self) -> bool {
        self.oppdragslinjer.iter().any(OppdragLinje::er_opphor)
    }
}
