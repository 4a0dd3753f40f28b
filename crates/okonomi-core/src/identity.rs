//! # Chain Identifiers
//!
//! Newtypes for the identifiers of the external disbursement ledger. A
//! [`FagsystemId`] scopes a set of chains to one recipient/case; a
//! [`DelytelseId`] names exactly one line within it. Sequence numbers
//! (`lopenummer`) grow monotonically per fagsystem and are never reused.

use serde::{Deserialize, Serialize};

/// Identifier of one recipient's case in the external ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FagsystemId(pub u64);

impl FagsystemId {
    /// The line identifier with sequence number `lopenummer` in this fagsystem.
    pub fn delytelse(&self, lopenummer: u64) -> DelytelseId {
        DelytelseId {
            fagsystem_id: *self,
            lopenummer,
        }
    }
}

impl std::fmt::Display for FagsystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one oppdrag line: fagsystem plus sequence number.
///
/// Ordered by fagsystem, then sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DelytelseId {
    fagsystem_id: FagsystemId,
    lopenummer: u64,
}

impl DelytelseId {
    /// Create a line identifier.
    pub fn new(fagsystem_id: FagsystemId, lopenummer: u64) -> Self {
        Self {
            fagsystem_id,
            lopenummer,
        }
    }

    /// The owning fagsystem.
    pub fn fagsystem_id(&self) -> FagsystemId {
        self.fagsystem_id
    }

    /// The sequence number within the fagsystem.
    pub fn lopenummer(&self) -> u64 {
        self.lopenummer
    }
}

impl std::fmt::Display for DelytelseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.fagsystem_id, self.lopenummer)
    }
}
