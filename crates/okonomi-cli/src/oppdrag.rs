//! # `okonomi oppdrag` — Reconcile Every Chain of a Fagsystem
//!
//! Input files:
//!
//! - `--oppdrag`: `{ "fagsystem_id": 4711, "kjeder": [ { "nokkel": ..., "verdi": [lines] } ] }`
//! - `--ytelser`: `[ { "nokkel": ..., "verdi": [periods] } ]`

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use okonomi_oppdrag::{GruppertYtelse, Oppdrag, OppdragFactory};

use crate::config::OkonomiConfig;
use crate::{read_json, write_json};

/// Arguments of `okonomi oppdrag`.
#[derive(Args, Debug)]
pub struct OppdragArgs {
    /// JSON file with the fagsystem's accepted chains.
    #[arg(long)]
    pub oppdrag: PathBuf,

    /// JSON file with the new schedules per chain.
    #[arg(long)]
    pub ytelser: PathBuf,
}

/// Execute `okonomi oppdrag`.
pub fn run_oppdrag(args: &OppdragArgs, config: &OkonomiConfig, out: &mut dyn Write) -> Result<u8> {
    let oppdrag: Oppdrag = read_json(&args.oppdrag)?;
    let ytelser: GruppertYtelse = read_json(&args.ytelser)?;

    let fagsystem = oppdrag.fagsystem_id();
    let endring = OppdragFactory::med_forste_lopenummer(config.forste_lopenummer)
        .lag_oppdrag(&oppdrag, &ytelser)
        .with_context(|| format!("reconciliation of fagsystem {fagsystem} failed"))?;

    match &endring {
        Some(e) => tracing::info!(
            fagsystem = %e.fagsystem_id(),
            kjeder = e.kjeder().len(),
            linjer = e.antall_linjer(),
            neste_lopenummer = e.neste_lopenummer(),
            "oppdrag changed"
        ),
        None => tracing::info!(fagsystem = %fagsystem, "oppdrag unchanged"),
    }

    write_json(out, &endring, config.pretty)?;
    Ok(0)
}
