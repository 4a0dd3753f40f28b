//! # okonomi-cli — Command-Line Front End
//!
//! Provides the `okonomi` binary. Chain snapshots, schedules and oppdrag are
//! read from JSON files; results are written to stdout as JSON.
//!
//! ## Subcommands
//!
//! - `okonomi kjede` — reconcile one chain against a new schedule.
//! - `okonomi endringsdato` — first date two schedules differ.
//! - `okonomi oppdrag` — reconcile every chain of one fagsystem.
//!
//! ```bash
//! okonomi kjede --kjede kjede.json --ytelse ytelse.json
//! okonomi kjede --kjede tom.json --ytelse ytelse.json --ny-mottaker 4711
//! okonomi endringsdato --forrige a.json --ny b.json --normal
//! okonomi oppdrag --oppdrag oppdrag.json --ytelser ytelser.json
//! ```
//!
//! A no-op prints `null`. Exit code is 0 on success and 1 on any error,
//! an unreadable or invalid `--config` file included.

pub mod config;
pub mod endringsdato;
pub mod kjede;
pub mod oppdrag;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Write `value` as one JSON document followed by a newline.
pub fn write_json<T: Serialize>(out: &mut dyn Write, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{json}").context("failed to write output")?;
    Ok(())
}
