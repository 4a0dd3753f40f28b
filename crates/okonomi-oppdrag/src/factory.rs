//! # Oppdragskjede Factory — Chain Reconciliation
//!
//! Given the accepted chain of one recipient and a newly computed
//! schedule, computes the minimal, chain-consistent lines that bring the
//! external ledger's effective payout in line with the schedule. History
//! is never touched: the result only appends.
//!
//! ## Decision Procedure
//!
//! 1. **No-op** — empty chain and empty schedule.
//! 2. **Genesis** — empty chain: one line per schedule period, each
//!    referring to the previous one.
//! 3. **Change** — compare the chain's effective schedule with the new one
//!    (weekend-neutral). Equivalent schedules produce nothing. Otherwise:
//!    - if the old schedule pays anything on or after the change date, an
//!      opphørslinje restating the head stops it. Its date is the change
//!      date, or the old schedule's first date when the change lies
//!      before it (insertion before chain start);
//!    - every new period from the change date on is resent, the period
//!      straddling the change date truncated to start at it.
//!
//!    An empty new schedule is the full-withdrawal case of this rule: one
//!    opphørslinje from the first date still paid.
//!
//! Feriepenger use the same procedure, except that a rate change of the
//! single live one-time line is an overwrite under the same id.
//!
//! ## Sequence Numbers
//!
//! The factory never holds a counter across calls. It receives the next
//! free sequence number and reports the next free one after the call in
//! [`OppdragKjedeFortsettelse::neste_lopenummer`]. Identical inputs always
//! give identical output.

use chrono::NaiveDate;

use okonomi_core::{DelytelseId, EndringsdatoTjeneste, FagsystemId, Ytelse, YtelsePeriode};

use crate::fortsettelse::OppdragKjedeFortsettelse;
use crate::kjede::OppdragKjede;
use crate::linje::OppdragLinje;
use crate::OppdragError;

/// Sequence number of the first line in a brand new fagsystem.
pub const FORSTE_LOPENUMMER: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mottaker {
    Ny,
    Eksisterende { siste: DelytelseId },
}

/// Reconciles one oppdrag chain against a new schedule.
#[derive(Debug, Clone)]
pub struct OppdragKjedeFactory {
    fagsystem_id: FagsystemId,
    mottaker: Mottaker,
    neste_lopenummer: u64,
    endringsdato_tjeneste: EndringsdatoTjeneste,
}

impl OppdragKjedeFactory {
    /// Factory for a recipient without any accepted line.
    pub fn lag_for_ny_mottaker(fagsystem_id: FagsystemId) -> Self {
        Self {
            fagsystem_id,
            mottaker: Mottaker::Ny,
            neste_lopenummer: FORSTE_LOPENUMMER,
            endringsdato_tjeneste: EndringsdatoTjeneste::ignorer_dagsats_i_helg(),
        }
    }

    /// Factory for a recipient whose chain currently ends at `siste`.
    pub fn lag_for_eksisterende_mottaker(siste: DelytelseId) -> Self {
        Self {
            fagsystem_id: siste.fagsystem_id(),
            mottaker: Mottaker::Eksisterende { siste },
            neste_lopenummer: siste.lopenummer().saturating_add(1),
            endringsdato_tjeneste: EndringsdatoTjeneste::ignorer_dagsats_i_helg(),
        }
    }

    /// Override the next free sequence number, e.g. when other chains of
    /// the same fagsystem already used higher numbers.
    pub fn med_neste_lopenummer(mut self, neste_lopenummer: u64) -> Self {
        self.neste_lopenummer = neste_lopenummer;
        self
    }

    /// The fagsystem lines are allocated in.
    pub fn fagsystem_id(&self) -> FagsystemId {
        self.fagsystem_id
    }

    /// The next free sequence number this factory allocates from.
    pub fn neste_lopenummer(&self) -> u64 {
        self.neste_lopenummer
    }

    /// Compute the lines that move `tidligere_oppdrag` to `ny_ytelse`.
    ///
    /// Returns `Ok(None)` when the ledger already pays what `ny_ytelse`
    /// describes.
    ///
    /// # Errors
    ///
    /// Invalid-state errors when the factory's mode or head does not match
    /// `tidligere_oppdrag`, or when the next sequence number is not above
    /// every number the chain used. Nothing is constructed on error.
    pub fn lag_oppdragskjede_for_ytelse(
        &self,
        tidligere_oppdrag: &OppdragKjede,
        ny_ytelse: &Ytelse,
    ) -> Result<Option<OppdragKjedeFortsettelse>, OppdragError> {
        self.valider(tidligere_oppdrag)?;
        self.lag_fortsettelse(tidligere_oppdrag, ny_ytelse)
    }

    /// Feriepenger variant: one-time (`Engang`) amounts only.
    ///
    /// A changed amount for the same period while the previous line is
    /// still live is sent as a single line under the previous line's id.
    /// Every other case follows [`Self::lag_oppdragskjede_for_ytelse`].
    pub fn lag_oppdragskjede_for_feriepenger(
        &self,
        tidligere_oppdrag: &OppdragKjede,
        ny_ytelse: &Ytelse,
    ) -> Result<Option<OppdragKjedeFortsettelse>, OppdragError> {
        self.valider(tidligere_oppdrag)?;
        if let Some(p) = ny_ytelse.perioder().iter().find(|p| !p.sats().er_engang()) {
            return Err(OppdragError::NotEngang {
                periode: p.periode().to_string(),
                sats: p.sats().type_navn(),
            });
        }

        let siste = tidligere_oppdrag.siste_linje();
        if let (Some(siste), [ny_periode]) = (siste, ny_ytelse.perioder()) {
            let gjeldende = tidligere_oppdrag.til_ytelse()?;
            if let [gjeldende_periode] = gjeldende.perioder() {
                let siste_er_levende =
                    !siste.er_opphor() && siste.periode == gjeldende_periode.periode();
                if siste_er_levende && gjeldende_periode.periode() == ny_periode.periode() {
                    if gjeldende_periode == ny_periode {
                        tracing::debug!(fagsystem = %self.fagsystem_id, "feriepenger unchanged");
                        return Ok(None);
                    }
                    tracing::debug!(
                        fagsystem = %self.fagsystem_id,
                        delytelse = %siste.delytelse_id,
                        "feriepenger amount changed, overwriting head line"
                    );
                    let linje = OppdragLinje::overskriv(siste, *ny_periode);
                    return Ok(Some(OppdragKjedeFortsettelse::new(
                        Some(ny_periode.periode().fom()),
                        vec![linje],
                        self.neste_lopenummer,
                    )));
                }
            }
        }

        self.lag_fortsettelse(tidligere_oppdrag, ny_ytelse)
    }

    fn valider(&self, tidligere_oppdrag: &OppdragKjede) -> Result<(), OppdragError> {
        match (self.mottaker, tidligere_oppdrag.siste_linje()) {
            (Mottaker::Ny, None) => {}
            (Mottaker::Ny, Some(siste)) => {
                return Err(OppdragError::ModeMismatch(format!(
                    "new-recipient mode used with a chain ending at {}",
                    siste.delytelse_id
                )));
            }
            (Mottaker::Eksisterende { siste }, None) => {
                return Err(OppdragError::ModeMismatch(format!(
                    "existing-recipient mode with head {siste} used with an empty chain"
                )));
            }
            (Mottaker::Eksisterende { siste }, Some(faktisk)) => {
                if faktisk.delytelse_id != siste {
                    return Err(OppdragError::HeadMismatch {
                        forventet: siste,
                        faktisk: faktisk.delytelse_id,
                    });
                }
            }
        }

        if let Some(hoyeste) = tidligere_oppdrag.hoyeste_lopenummer() {
            if self.neste_lopenummer <= hoyeste {
                return Err(OppdragError::LopenummerConflict {
                    neste: self.neste_lopenummer,
                    hoyeste,
                });
            }
        }
        Ok(())
    }

    fn lag_fortsettelse(
        &self,
        tidligere_oppdrag: &OppdragKjede,
        ny_ytelse: &Ytelse,
    ) -> Result<Option<OppdragKjedeFortsettelse>, OppdragError> {
        let mut lopenummer = Lopenummer::new(self.fagsystem_id, self.neste_lopenummer);

        let Some(siste) = tidligere_oppdrag.siste_linje() else {
            if ny_ytelse.er_tom() {
                tracing::debug!(
                    fagsystem = %self.fagsystem_id,
                    "empty chain and empty schedule, nothing to send"
                );
                return Ok(None);
            }
            let linjer = lag_linjer(ny_ytelse.perioder(), None, &mut lopenummer)?;
            tracing::debug!(
                fagsystem = %self.fagsystem_id,
                linjer = linjer.len(),
                "new oppdrag chain"
            );
            return Ok(Some(OppdragKjedeFortsettelse::new(
                ny_ytelse.forste_dato(),
                linjer,
                lopenummer.neste(),
            )));
        };

        let gjeldende = tidligere_oppdrag.til_ytelse()?;
        let Some(endringsdato) = self
            .endringsdato_tjeneste
            .finn_endringsdato(&gjeldende, ny_ytelse)
        else {
            tracing::debug!(fagsystem = %self.fagsystem_id, "schedule unchanged, nothing to send");
            return Ok(None);
        };

        let mut linjer = Vec::new();
        let mut forrige = siste.delytelse_id;
        if gjeldende.har_verdi_pa_eller_etter(endringsdato) {
            let opphorsdato = opphorsdato(&gjeldende, endringsdato);
            let opphor = OppdragLinje::opphor(siste, lopenummer.tildel()?, opphorsdato);
            forrige = opphor.delytelse_id;
            linjer.push(opphor);
        }
        let perioder = ny_ytelse.perioder_fra_og_med(endringsdato);
        linjer.extend(lag_linjer(&perioder, Some(forrige), &mut lopenummer)?);

        tracing::debug!(
            fagsystem = %self.fagsystem_id,
            endringsdato = %endringsdato,
            linjer = linjer.len(),
            "oppdrag chain continued"
        );
        Ok(Some(OppdragKjedeFortsettelse::new(
            Some(endringsdato),
            linjer,
            lopenummer.neste(),
        )))
    }
}

/// Opphør date: the change date, but never before the first date the old
/// schedule pays. A change before the chain start stops the whole chain.
fn opphorsdato(gjeldende: &Ytelse, endringsdato: NaiveDate) -> NaiveDate {
    match gjeldende.forste_dato() {
        Some(forste) => endringsdato.max(forste),
        None => endringsdato,
    }
}

/// One chained payment line per period, the first following `forrige`.
fn lag_linjer(
    perioder: &[YtelsePeriode],
    mut forrige: Option<DelytelseId>,
    lopenummer: &mut Lopenummer,
) -> Result<Vec<OppdragLinje>, OppdragError> {
    let mut linjer = Vec::with_capacity(perioder.len());
    for periode in perioder {
        let linje = OppdragLinje::ny(lopenummer.tildel()?, *periode, forrige);
        forrige = Some(linje.delytelse_id);
        linjer.push(linje);
    }
    Ok(linjer)
}

/// Per-call sequence allocation. `neste` is `None` once `u64::MAX` is
/// handed out.
#[derive(Debug)]
struct Lopenummer {
    fagsystem_id: FagsystemId,
    neste: Option<u64>,
}

impl Lopenummer {
    fn new(fagsystem_id: FagsystemId, neste: u64) -> Self {
        Self {
            fagsystem_id,
            neste: Some(neste),
        }
    }

    fn tildel(&mut self) -> Result<DelytelseId, OppdragError> {
        let Some(lopenummer) = self.neste else {
            return Err(OppdragError::LopenummerExhausted(self.fagsystem_id));
        };
        self.neste = lopenummer.checked_add(1);
        Ok(self.fagsystem_id.delytelse(lopenummer))
    }

    /// Next free number, saturating at `u64::MAX` when none is left.
    fn neste(&self) -> u64 {
        self.neste.unwrap_or(u64::MAX)
    }
}
