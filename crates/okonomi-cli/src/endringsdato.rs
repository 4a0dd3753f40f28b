//! # `okonomi endringsdato` — Compare Two Schedules

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use okonomi_core::{EndringsdatoTjeneste, Ytelse};

use crate::config::OkonomiConfig;
use crate::{read_json, write_json};

/// Arguments of `okonomi endringsdato`.
#[derive(Args, Debug)]
pub struct EndringsdatoArgs {
    /// JSON file with the earlier schedule.
    #[arg(long)]
    pub forrige: PathBuf,

    /// JSON file with the new schedule.
    #[arg(long)]
    pub ny: PathBuf,

    /// Compare dagsats on weekends like any other day.
    #[arg(long)]
    pub normal: bool,
}

/// Execute `okonomi endringsdato`. Prints the date as a JSON string, or
/// `null` when the schedules pay the same.
pub fn run_endringsdato(
    args: &EndringsdatoArgs,
    config: &OkonomiConfig,
    out: &mut dyn Write,
) -> Result<u8> {
    let forrige: Ytelse = read_json(&args.forrige)?;
    let ny: Ytelse = read_json(&args.ny)?;

    let tjeneste = if args.normal {
        EndringsdatoTjeneste::normal()
    } else {
        EndringsdatoTjeneste::ignorer_dagsats_i_helg()
    };
    let endringsdato = tjeneste.finn_endringsdato(&forrige, &ny);
    tracing::info!(endringsdato = ?endringsdato, normal = args.normal, "schedules compared");

    write_json(out, &endringsdato, config.pretty)?;
    Ok(0)
}
