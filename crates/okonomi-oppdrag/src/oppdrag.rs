//! # Oppdrag — All Chains of One Fagsystem
//!
//! A fagsystem carries one chain per [`KjedeNokkel`]: klassekode,
//! betalingsmottaker and, for feriepenger, the earning year. All chains
//! share the fagsystem's sequence numbers, so a number used by one chain
//! is never handed out to another.
//!
//! [`OppdragFactory`] reconciles every chain of the old oppdrag and every
//! schedule of the new one in key order, threading one sequence counter
//! through the chains.
//!
//! Maps keyed by [`KjedeNokkel`] serialize as lists of
//! `{ "nokkel": ..., "verdi": ... }` entries.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use okonomi_core::{FagsystemId, Ytelse};

use crate::factory::{OppdragKjedeFactory, FORSTE_LOPENUMMER};
use crate::fortsettelse::OppdragKjedeFortsettelse;
use crate::kjede::OppdragKjede;
use crate::OppdragError;

// ---------------------------------------------------------------------------
// Chain keys
// ---------------------------------------------------------------------------

/// Who receives the payment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "orgnr", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Betalingsmottaker {
    /// The entitled person.
    Bruker,
    /// An employer receiving refund, by organisation number.
    Arbeidsgiver(String),
}

/// Key of one chain within a fagsystem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KjedeNokkel {
    /// Accounting class code of the payments.
    pub klassekode: String,
    /// Receiver of the payments.
    pub betalingsmottaker: Betalingsmottaker,
    /// Earning year, for feriepenger chains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feriepengeaar: Option<i32>,
}

impl KjedeNokkel {
    /// Key of a running-payment chain.
    pub fn lag(klassekode: impl Into<String>, betalingsmottaker: Betalingsmottaker) -> Self {
        Self {
            klassekode: klassekode.into(),
            betalingsmottaker,
            feriepengeaar: None,
        }
    }

    /// Key of a feriepenger chain for earning year `aar`.
    pub fn feriepenger(
        klassekode: impl Into<String>,
        betalingsmottaker: Betalingsmottaker,
        aar: i32,
    ) -> Self {
        Self {
            klassekode: klassekode.into(),
            betalingsmottaker,
            feriepengeaar: Some(aar),
        }
    }

    /// Whether the chain carries feriepenger.
    pub fn er_feriepenger(&self) -> bool {
        self.feriepengeaar.is_some()
    }
}

impl std::fmt::Display for KjedeNokkel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/", self.klassekode)?;
        match &self.betalingsmottaker {
            Betalingsmottaker::Bruker => write!(f, "bruker")?,
            Betalingsmottaker::Arbeidsgiver(orgnr) => write!(f, "arbeidsgiver:{orgnr}")?,
        }
        if let Some(aar) = self.feriepengeaar {
            write!(f, "/{aar}")?;
        }
        Ok(())
    }
}

mod nokkelliste {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::KjedeNokkel;

    #[derive(Serialize)]
    struct OppforingRef<'a, T> {
        nokkel: &'a KjedeNokkel,
        verdi: &'a T,
    }

    #[derive(Deserialize)]
    struct Oppforing<T> {
        nokkel: KjedeNokkel,
        verdi: T,
    }

    pub fn serialize<S, T>(map: &BTreeMap<KjedeNokkel, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let oppforinger = map
            .iter()
            .map(|(nokkel, verdi)| OppforingRef { nokkel, verdi });
        serializer.collect_seq(oppforinger)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<KjedeNokkel, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let liste = Vec::<Oppforing<T>>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for oppforing in liste {
            let nokkel = oppforing.nokkel.clone();
            if map.insert(oppforing.nokkel, oppforing.verdi).is_some() {
                return Err(D::Error::custom(format!("duplicate chain key {nokkel}")));
            }
        }
        Ok(map)
    }
}

// ---------------------------------------------------------------------------
// Schedules per chain
// ---------------------------------------------------------------------------

/// New schedules keyed by chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GruppertYtelse {
    #[serde(with = "nokkelliste")]
    ytelser: BTreeMap<KjedeNokkel, Ytelse>,
}

impl GruppertYtelse {
    /// No schedules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schedule of `nokkel`, replacing any earlier one.
    pub fn med_ytelse(mut self, nokkel: KjedeNokkel, ytelse: Ytelse) -> Self {
        self.ytelser.insert(nokkel, ytelse);
        self
    }

    /// Schedule of `nokkel`, if any.
    pub fn ytelse(&self, nokkel: &KjedeNokkel) -> Option<&Ytelse> {
        self.ytelser.get(nokkel)
    }

    /// All keys in order.
    pub fn nokler(&self) -> impl Iterator<Item = &KjedeNokkel> {
        self.ytelser.keys()
    }
}

// ---------------------------------------------------------------------------
// Oppdrag
// ---------------------------------------------------------------------------

/// All accepted chains of one fagsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OppdragData")]
pub struct Oppdrag {
    fagsystem_id: FagsystemId,
    #[serde(serialize_with = "nokkelliste::serialize")]
    kjeder: BTreeMap<KjedeNokkel, OppdragKjede>,
}

#[derive(Deserialize)]
struct OppdragData {
    fagsystem_id: FagsystemId,
    #[serde(with = "nokkelliste")]
    kjeder: BTreeMap<KjedeNokkel, OppdragKjede>,
}

impl TryFrom<OppdragData> for Oppdrag {
    type Error = OppdragError;

    fn try_from(data: OppdragData) -> Result<Self, Self::Error> {
        data.kjeder
            .into_iter()
            .try_fold(Oppdrag::new(data.fagsystem_id), |oppdrag, (nokkel, kjede)| {
                oppdrag.med_kjede(nokkel, kjede)
            })
    }
}

impl Oppdrag {
    /// A fagsystem without chains.
    pub fn new(fagsystem_id: FagsystemId) -> Self {
        Self {
            fagsystem_id,
            kjeder: BTreeMap::new(),
        }
    }

    /// Add or replace the chain of `nokkel`.
    ///
    /// Rejects chains of another fagsystem and chains that use a sequence
    /// number already used by a different chain.
    pub fn med_kjede(
        mut self,
        nokkel: KjedeNokkel,
        kjede: OppdragKjede,
    ) -> Result<Self, OppdragError> {
        if let Some(fagsystem) = kjede.fagsystem_id() {
            if fagsystem != self.fagsystem_id {
                return Err(OppdragError::FagsystemMismatch {
                    forventet: self.fagsystem_id,
                    faktisk: fagsystem,
                });
            }
        }
        let brukte: BTreeSet<u64> = self
            .kjeder
            .iter()
            .filter(|(n, _)| **n != nokkel)
            .flat_map(|(_, k)| k.linjer().iter().map(|l| l.delytelse_id.lopenummer()))
            .collect();
        if let Some(linje) = kjede
            .linjer()
            .iter()
            .find(|l| brukte.contains(&l.delytelse_id.lopenummer()))
        {
            return Err(OppdragError::BrokenChain(format!(
                "line {} of chain {nokkel} reuses a sequence number of another chain",
                linje.delytelse_id
            )));
        }
        self.kjeder.insert(nokkel, kjede);
        Ok(self)
    }

    /// The fagsystem.
    pub fn fagsystem_id(&self) -> FagsystemId {
        self.fagsystem_id
    }

    /// All chains in key order.
    pub fn kjeder(&self) -> &BTreeMap<KjedeNokkel, OppdragKjede> {
        &self.kjeder
    }

    /// Chain of `nokkel`, if any.
    pub fn kjede(&self, nokkel: &KjedeNokkel) -> Option<&OppdragKjede> {
        self.kjeder.get(nokkel)
    }

    /// Highest sequence number used by any chain.
    pub fn hoyeste_lopenummer(&self) -> Option<u64> {
        self.kjeder
            .values()
            .filter_map(OppdragKjede::hoyeste_lopenummer)
            .max()
    }

    /// The schedules the chains currently promise.
    pub fn til_gruppert_ytelse(&self) -> Result<GruppertYtelse, OppdragError> {
        self.kjeder
            .iter()
            .try_fold(GruppertYtelse::new(), |gruppert, (nokkel, kjede)| {
                Ok(gruppert.med_ytelse(nokkel.clone(), kjede.til_ytelse()?))
            })
    }

    /// A new oppdrag with every continuation of `endring` appended.
    pub fn utvid(&self, endring: &OppdragEndring) -> Result<Oppdrag, OppdragError> {
        if endring.fagsystem_id != self.fagsystem_id {
            return Err(OppdragError::FagsystemMismatch {
                forventet: self.fagsystem_id,
                faktisk: endring.fagsystem_id,
            });
        }
        let tom = OppdragKjede::tom();
        endring
            .kjeder
            .iter()
            .try_fold(self.clone(), |oppdrag, (nokkel, fortsettelse)| {
                let kjede = oppdrag.kjede(nokkel).unwrap_or(&tom).utvid(fortsettelse)?;
                oppdrag.med_kjede(nokkel.clone(), kjede)
            })
    }
}

/// Continuations for every chain of one fagsystem that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OppdragEndring {
    fagsystem_id: FagsystemId,
    #[serde(with = "nokkelliste")]
    kjeder: BTreeMap<KjedeNokkel, OppdragKjedeFortsettelse>,
    neste_lopenummer: u64,
}

impl OppdragEndring {
    /// The fagsystem.
    pub fn fagsystem_id(&self) -> FagsystemId {
        self.fagsystem_id
    }

    /// Continuations by chain, in key order.
    pub fn kjeder(&self) -> &BTreeMap<KjedeNokkel, OppdragKjedeFortsettelse> {
        &self.kjeder
    }

    /// Next free sequence number of the fagsystem after this change.
    pub fn neste_lopenummer(&self) -> u64 {
        self.neste_lopenummer
    }

    /// Total number of new lines across all chains.
    pub fn antall_linjer(&self) -> usize {
        self.kjeder.values().map(|f| f.oppdragslinjer().len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Reconciles all chains of one fagsystem.
#[derive(Debug, Clone)]
pub struct OppdragFactory {
    forste_lopenummer: u64,
}

impl Default for OppdragFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl OppdragFactory {
    /// A factory starting new fagsystems at [`FORSTE_LOPENUMMER`].
    pub fn new() -> Self {
        Self {
            forste_lopenummer: FORSTE_LOPENUMMER,
        }
    }

    /// A factory starting new fagsystems at `forste_lopenummer`.
    pub fn med_forste_lopenummer(forste_lopenummer: u64) -> Self {
        Self { forste_lopenummer }
    }

    /// Reconcile every chain of `tidligere` with the schedules in `ny`.
    ///
    /// Keys present only in `tidligere` are reconciled against an empty
    /// schedule. Returns `Ok(None)` when no chain changed.
    pub fn lag_oppdrag(
        &self,
        tidligere: &Oppdrag,
        ny: &GruppertYtelse,
    ) -> Result<Option<OppdragEndring>, OppdragError> {
        let fagsystem_id = tidligere.fagsystem_id();
        let mut neste = match tidligere.hoyeste_lopenummer() {
            Some(hoyeste) => hoyeste
                .checked_add(1)
                .ok_or(OppdragError::LopenummerExhausted(fagsystem_id))?,
            None => self.forste_lopenummer,
        };

        let tom_kjede = OppdragKjede::tom();
        let tom_ytelse = Ytelse::tom();
        let nokler: BTreeSet<&KjedeNokkel> = tidligere.kjeder().keys().chain(ny.nokler()).collect();

        let mut kjeder = BTreeMap::new();
        for nokkel in nokler {
            let kjede = tidligere.kjede(nokkel).unwrap_or(&tom_kjede);
            let ytelse = ny.ytelse(nokkel).unwrap_or(&tom_ytelse);
            let factory = match kjede.siste_linje().map(|l| l.delytelse_id) {
                Some(siste) => OppdragKjedeFactory::lag_for_eksisterende_mottaker(siste),
                None => OppdragKjedeFactory::lag_for_ny_mottaker(fagsystem_id),
            };
            let factory = factory.med_neste_lopenummer(neste);

            let fortsettelse = if nokkel.er_feriepenger() {
                factory.lag_oppdragskjede_for_feriepenger(kjede, ytelse)?
            } else {
                factory.lag_oppdragskjede_for_ytelse(kjede, ytelse)?
            };
            if let Some(fortsettelse) = fortsettelse {
                tracing::debug!(
                    fagsystem = %fagsystem_id,
                    kjede = %nokkel,
                    linjer = fortsettelse.oppdragslinjer().len(),
                    "chain changed"
                );
                neste = fortsettelse.neste_lopenummer();
                kjeder.insert(nokkel.clone(), fortsettelse);
            }
        }

        if kjeder.is_empty() {
            return Ok(None);
        }
        Ok(Some(OppdragEndring {
            fagsystem_id,
            kjeder,
            neste_lopenummer: neste,
        }))
    }
}
