//! # okonomi-oppdrag — Oppdrag Chain Reconciliation
//!
//! Reconciles the append-only oppdrag chains held by the external
//! disbursement ledger with a newly computed entitlement schedule:
//!
//! - **Line** ([`linje`]): one ledger line, payment or opphør, with a weak
//!   back-reference to the line it follows.
//!
//! - **Chain** ([`kjede`]): the validated, immutable history of one chain
//!   and the effective schedule it currently promises.
//!
//! - **Factory** ([`factory`]): computes the minimal chain-consistent
//!   continuation, including insertion before chain start and the
//!   feriepenger overwrite.
//!
//! - **Continuation** ([`fortsettelse`]): the ordered lines to submit, all
//!   or none.
//!
//! - **Oppdrag** ([`oppdrag`]): several chains of one fagsystem, keyed by
//!   klassekode, betalingsmottaker and feriepengeår, sharing one sequence
//!   counter.
//!
//! ## Concurrency
//!
//! Every operation is a pure, synchronous function of immutable inputs.
//! Reconciliations of different fagsystems may run concurrently with no
//! coordination; serializing reconciliations of the same fagsystem and
//! persisting the result belong to the caller.

pub mod factory;
pub mod fortsettelse;
pub mod kjede;
pub mod linje;
pub mod oppdrag;

pub use factory::{OppdragKjedeFactory, FORSTE_LOPENUMMER};
pub use fortsettelse::OppdragKjedeFortsettelse;
pub use kjede::OppdragKjede;
pub use linje::OppdragLinje;
pub use oppdrag::{
    Betalingsmottaker, GruppertYtelse, KjedeNokkel, Oppdrag, OppdragEndring, OppdragFactory,
};

use okonomi_core::{DelytelseId, FagsystemId, YtelseError};
use thiserror::Error;

/// Errors from chain construction and reconciliation.
///
/// Every error is fatal to the single call that raised it and is returned
/// before any line is constructed. Nothing is retried here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OppdragError {
    /// The supplied head id is not the chain's last line.
    #[error("chain head mismatch: expected {forventet}, chain ends at {faktisk}")]
    HeadMismatch {
        /// Head id the factory was created with.
        forventet: DelytelseId,
        /// Id of the chain's actual last line.
        faktisk: DelytelseId,
    },

    /// Factory mode does not fit the chain (e.g. existing-recipient mode
    /// with an empty chain).
    #[error("factory mode mismatch: {0}")]
    ModeMismatch(String),

    /// A line or chain belongs to another fagsystem.
    #[error("fagsystem mismatch: expected {forventet}, got {faktisk}")]
    FagsystemMismatch {
        /// The fagsystem of the chain or oppdrag.
        forventet: FagsystemId,
        /// The offending fagsystem.
        faktisk: FagsystemId,
    },

    /// The next sequence number would reuse a number already in the chain.
    #[error(
        "sequence number {neste} is not above the highest used number {hoyeste}"
    )]
    LopenummerConflict {
        /// Next sequence number supplied to the factory.
        neste: u64,
        /// Highest sequence number already used.
        hoyeste: u64,
    },

    /// No sequence numbers left in the fagsystem.
    #[error("sequence numbers exhausted for fagsystem {0}")]
    LopenummerExhausted(FagsystemId),

    /// A chain violates its append-only invariants.
    #[error("broken chain: {0}")]
    BrokenChain(String),

    /// The schedule is malformed.
    #[error("malformed schedule: {0}")]
    MalformedYtelse(#[from] YtelseError),

    /// A feriepenger schedule carries a running rate.
    #[error("feriepenger must be ENGANG, got {sats} for {periode}")]
    NotEngang {
        /// The offending period.
        periode: String,
        /// The rate kind found.
        sats: &'static str,
    },
}
