//! # `okonomi kjede` — Reconcile One Chain
//!
//! Reads an accepted chain (a JSON list of lines, `[]` for a recipient
//! without lines) and a new schedule, and prints the continuation.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use okonomi_core::{FagsystemId, Ytelse};
use okonomi_oppdrag::{OppdragKjede, OppdragKjedeFactory};

use crate::config::OkonomiConfig;
use crate::{read_json, write_json};

/// Arguments of `okonomi kjede`.
#[derive(Args, Debug)]
pub struct KjedeArgs {
    /// JSON file with the accepted chain.
    #[arg(long)]
    pub kjede: PathBuf,

    /// JSON file with the new schedule.
    #[arg(long)]
    pub ytelse: PathBuf,

    /// Fagsystem of a recipient without lines. Required when the chain is
    /// empty.
    #[arg(long, value_name = "FAGSYSTEM")]
    pub ny_mottaker: Option<u64>,

    /// Use the feriepenger variant (one-time amounts only).
    #[arg(long)]
    pub feriepenger: bool,
}

/// Execute `okonomi kjede`.
pub fn run_kjede(args: &KjedeArgs, config: &OkonomiConfig, out: &mut dyn Write) -> Result<u8> {
    let kjede: OppdragKjede = read_json(&args.kjede)?;
    let ytelse: Ytelse = read_json(&args.ytelse)?;

    let siste = kjede.siste_linje().map(|l| l.delytelse_id);
    let factory = match (args.ny_mottaker, siste) {
        (Some(fagsystem), _) => {
            let fagsystem = FagsystemId(fagsystem);
            OppdragKjedeFactory::lag_for_ny_mottaker(fagsystem)
                .med_neste_lopenummer(config.forste_lopenummer)
        }
        (None, Some(siste)) => OppdragKjedeFactory::lag_for_eksisterende_mottaker(siste),
        (None, None) => {
            let fil = args.kjede.display();
            bail!("{fil} holds no lines; pass --ny-mottaker <FAGSYSTEM>")
        }
    };

    let fortsettelse = if args.feriepenger {
        factory.lag_oppdragskjede_for_feriepenger(&kjede, &ytelse)
    } else {
        factory.lag_oppdragskjede_for_ytelse(&kjede, &ytelse)
    }
    .context("reconciliation failed")?;

    match &fortsettelse {
        Some(f) => tracing::info!(
            fagsystem = %factory.fagsystem_id(),
            linjer = f.oppdragslinjer().len(),
            opphor = f.har_opphor(),
            total_belop = ytelse.total_belop(),
            "chain changed"
        ),
        None => tracing::info!(fagsystem = %factory.fagsystem_id(), "chain unchanged"),
    }

    write_json(out, &fortsettelse, config.pretty)?;
    Ok(0)
}
