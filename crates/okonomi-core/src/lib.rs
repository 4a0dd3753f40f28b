//! # okonomi-core — Value Types for Oppdrag Reconciliation
//!
//! The leaf crate of the workspace. It defines the immutable value types
//! consumed by the chain reconciliation engine in `okonomi-oppdrag`, plus
//! the pure change-date comparison between two schedules.
//!
//! ## Key Design Principles
//!
//! 1. **Validated constructors.** A `Periode` with `fom > tom`, a `Ytelse`
//!    with overlapping periods, or an `Utbetalingsgrad` above 100 cannot be
//!    constructed, neither in code nor through `serde`.
//!
//! 2. **Closed `Sats` enum.** Every consumer matches `Dagsats`, `Dag7`
//!    and `Engang` exhaustively, so the weekend rule of [`EndringsdatoTjeneste`]
//!    cannot silently skip a new kind.
//!
//! 3. **Identifiers are plain keys.** `DelytelseId` is a copyable value; a
//!    line refers to its predecessor by id, never by handle.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `okonomi-*` crates.
//! - No `unsafe` code, no I/O, no shared mutable state.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod endringsdato;
pub mod error;
pub mod identity;
pub mod periode;
pub mod sats;
pub mod ytelse;

// Re-export primary types for ergonomic imports.
pub use endringsdato::EndringsdatoTjeneste;
pub use error::YtelseError;
pub use identity::{DelytelseId, FagsystemId};
pub use periode::{er_helg, Periode};
pub use sats::{Sats, Utbetalingsgrad};
pub use ytelse::{Ytelse, YtelseBuilder, YtelsePeriode};
