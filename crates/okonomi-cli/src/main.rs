//! # okonomi CLI entry point
//!
//! Parses command-line arguments, loads configuration, initialises
//! logging and dispatches to the subcommand handlers. Results go to
//! stdout, logs to stderr. The config file is read before the subscriber
//! exists, so where it came from is logged afterwards.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use okonomi_cli::config::{ConfigKilde, LogFormat, OkonomiConfig};
use okonomi_cli::endringsdato::{run_endringsdato, EndringsdatoArgs};
use okonomi_cli::kjede::{run_kjede, KjedeArgs};
use okonomi_cli::oppdrag::{run_oppdrag, OppdragArgs};

/// Oppdrag chain reconciliation.
///
/// Computes the minimal lines that bring an append-only payment ledger in
/// line with a new entitlement schedule.
#[derive(Parser, Debug)]
#[command(name = "okonomi", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log as JSON, overriding the configured format.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile one chain against a new schedule.
    Kjede(KjedeArgs),

    /// Print the first date two schedules pay differently.
    Endringsdato(EndringsdatoArgs),

    /// Reconcile every chain of one fagsystem.
    Oppdrag(OppdragArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let lastet = OkonomiConfig::load(cli.config.as_deref());
    let json_config = matches!(&lastet, Ok((config, _)) if config.log_format == LogFormat::Json);
    init_logging(cli.verbose, cli.log_json || json_config);

    let mut stdout = std::io::stdout().lock();
    ExitCode::from(utfor(&cli.command, lastet, &mut stdout))
}

/// Run `command` and map the outcome to an exit code: the handler's code
/// on success, 1 on any error. Config errors take the same path.
fn utfor(
    command: &Commands,
    lastet: Result<(OkonomiConfig, ConfigKilde)>,
    out: &mut dyn Write,
) -> u8 {
    let resultat = lastet.and_then(|(config, kilde)| {
        kilde.logg();
        tracing::debug!(?config, "okonomi CLI starting");
        match command {
            Commands::Kjede(args) => run_kjede(args, &config, out),
            Commands::Endringsdato(args) => run_endringsdato(args, &config, out),
            Commands::Oppdrag(args) => run_oppdrag(args, &config, out),
        }
    });

    match resultat {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            1
        }
    }
}

fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
