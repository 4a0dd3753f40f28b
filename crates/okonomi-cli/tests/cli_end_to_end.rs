//! # CLI End-to-End Tests
//!
//! Runs the subcommand handlers against JSON files in a temporary
//! directory and checks the printed results.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use okonomi_cli::config::OkonomiConfig;
use okonomi_cli::endringsdato::{run_endringsdato, EndringsdatoArgs};
use okonomi_cli::kjede::{run_kjede, KjedeArgs};
use okonomi_cli::oppdrag::{run_oppdrag, OppdragArgs};
use okonomi_oppdrag::{OppdragEndring, OppdragKjede, OppdragKjedeFortsettelse};

const JANUAR: &str =
    r#"[{"periode":{"fom":"2024-01-01","tom":"2024-01-31"},"sats":{"type":"DAG7","verdi":100}}]"#;
const JANUAR_ENDRET: &str = r#"[
    {"periode":{"fom":"2024-01-01","tom":"2024-01-14"},"sats":{"type":"DAG7","verdi":100}},
    {"periode":{"fom":"2024-01-15","tom":"2024-01-31"},"sats":{"type":"DAG7","verdi":200}}
]"#;

fn skriv(dir: &Path, navn: &str, innhold: &str) -> PathBuf {
    let path = dir.join(navn);
    std::fs::write(&path, innhold).unwrap();
    path
}

fn kjede_args(kjede: PathBuf, ytelse: PathBuf, ny_mottaker: Option<u64>) -> KjedeArgs {
    KjedeArgs {
        kjede,
        ytelse,
        ny_mottaker,
        feriepenger: false,
    }
}

fn kjor_kjede(args: &KjedeArgs) -> Option<OppdragKjedeFortsettelse> {
    let mut out = Vec::new();
    let code = run_kjede(args, &OkonomiConfig::default(), &mut out).unwrap();
    assert_eq!(code, 0);
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn kjede_genesis_then_change_then_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let tom = skriv(dir.path(), "tom.json", "[]");
    let januar = skriv(dir.path(), "januar.json", JANUAR);

    let genesis = kjor_kjede(&kjede_args(tom, januar.clone(), Some(4711))).unwrap();
    assert_eq!(genesis.oppdragslinjer().len(), 1);
    let kjede = OppdragKjede::tom().utvid(&genesis).unwrap();
    let kjede_json = serde_json::to_string(&kjede).unwrap();
    let kjede_fil = skriv(dir.path(), "kjede.json", &kjede_json);

    let uendret = kjor_kjede(&kjede_args(kjede_fil.clone(), januar, None));
    assert_eq!(uendret, None);

    let endret = skriv(dir.path(), "endret.json", JANUAR_ENDRET);
    let fortsettelse = kjor_kjede(&kjede_args(kjede_fil, endret, None)).unwrap();
    assert_eq!(fortsettelse.endringsdato(), NaiveDate::from_ymd_opt(2024, 1, 15));
    assert!(fortsettelse.har_opphor());
    assert_eq!(fortsettelse.oppdragslinjer().len(), 2);
}

#[test]
fn kjede_uses_configured_first_sequence_number() {
    let dir = tempfile::tempdir().unwrap();
    let args = kjede_args(
        skriv(dir.path(), "tom.json", "[]"),
        skriv(dir.path(), "januar.json", JANUAR),
        Some(1),
    );
    let config = OkonomiConfig {
        forste_lopenummer: 1,
        ..OkonomiConfig::default()
    };
    let mut out = Vec::new();
    run_kjede(&args, &config, &mut out).unwrap();
    let f: Option<OppdragKjedeFortsettelse> = serde_json::from_slice(&out).unwrap();
    assert_eq!(f.unwrap().oppdragslinjer()[0].delytelse_id.lopenummer(), 1);
}

#[test]
fn kjede_empty_chain_without_fagsystem_fails() {
    let dir = tempfile::tempdir().unwrap();
    let args = kjede_args(
        skriv(dir.path(), "tom.json", "[]"),
        skriv(dir.path(), "januar.json", JANUAR),
        None,
    );
    let err = run_kjede(&args, &OkonomiConfig::default(), &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("--ny-mottaker"));
}

#[test]
fn kjede_rejects_overlapping_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let overlapp = r#"[
        {"periode":{"fom":"2024-01-01","tom":"2024-01-10"},"sats":{"type":"DAG7","verdi":1}},
        {"periode":{"fom":"2024-01-10","tom":"2024-01-20"},"sats":{"type":"DAG7","verdi":1}}
    ]"#;
    let args = kjede_args(
        skriv(dir.path(), "tom.json", "[]"),
        skriv(dir.path(), "overlapp.json", overlapp),
        Some(1),
    );
    assert!(run_kjede(&args, &OkonomiConfig::default(), &mut Vec::new()).is_err());
}

#[test]
fn kjede_feriepenger_rejects_running_rate() {
    let dir = tempfile::tempdir().unwrap();
    let args = KjedeArgs {
        feriepenger: true,
        ..kjede_args(
            skriv(dir.path(), "tom.json", "[]"),
            skriv(dir.path(), "januar.json", JANUAR),
            Some(1),
        )
    };
    let err = run_kjede(&args, &OkonomiConfig::default(), &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("ENGANG"));
}

#[test]
fn endringsdato_weekend_split() {
    let dir = tempfile::tempdir().unwrap();
    // 2024-01-08 is a Monday, 2024-01-15 the Monday after.
    let samlet = skriv(
        dir.path(),
        "samlet.json",
        r#"[{"periode":{"fom":"2024-01-08","tom":"2024-01-15"},
             "sats":{"type":"DAGSATS","verdi":900}}]"#,
    );
    let delt = skriv(
        dir.path(),
        "delt.json",
        r#"[
            {"periode":{"fom":"2024-01-08","tom":"2024-01-12"},
             "sats":{"type":"DAGSATS","verdi":900}},
            {"periode":{"fom":"2024-01-15","tom":"2024-01-15"},
             "sats":{"type":"DAGSATS","verdi":900}}
        ]"#,
    );
    let mut args = EndringsdatoArgs {
        forrige: samlet,
        ny: delt,
        normal: false,
    };

    let mut out = Vec::new();
    run_endringsdato(&args, &OkonomiConfig::default(), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "null\n");

    args.normal = true;
    let mut out = Vec::new();
    run_endringsdato(&args, &OkonomiConfig::default(), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "\"2024-01-13\"\n");
}

#[test]
fn oppdrag_reconciles_every_chain() {
    let dir = tempfile::tempdir().unwrap();
    let tomt = r#"{"fagsystem_id":4711,"kjeder":[]}"#;
    let oppdrag = skriv(dir.path(), "oppdrag.json", tomt);
    let ytelser = skriv(
        dir.path(),
        "ytelser.json",
        &format!(
            r#"[
                {{"nokkel":{{"klassekode":"FPATORD","betalingsmottaker":{{"type":"BRUKER"}}}},
                  "verdi":{JANUAR}}},
                {{"nokkel":{{"klassekode":"FPATFER","betalingsmottaker":{{"type":"BRUKER"}},
                             "feriepengeaar":2023}},
                  "verdi":[{{"periode":{{"fom":"2024-05-01","tom":"2024-05-31"}},
                             "sats":{{"type":"ENGANG","verdi":1000}}}}]}}
            ]"#
        ),
    );
    let args = OppdragArgs { oppdrag, ytelser };

    let mut out = Vec::new();
    run_oppdrag(&args, &OkonomiConfig::default(), &mut out).unwrap();
    let endring: Option<OppdragEndring> = serde_json::from_slice(&out).unwrap();
    let endring = endring.unwrap();
    assert_eq!(endring.kjeder().len(), 2);
    assert_eq!(endring.antall_linjer(), 2);
    assert_eq!(endring.neste_lopenummer(), 102);
}

#[test]
fn oppdrag_rejects_duplicate_keys() {
    let dir = tempfile::tempdir().unwrap();
    let tomt = r#"{"fagsystem_id":1,"kjeder":[]}"#;
    let oppdrag = skriv(dir.path(), "oppdrag.json", tomt);
    let ytelser = skriv(
        dir.path(),
        "ytelser.json",
        r#"[
            {"nokkel":{"klassekode":"A","betalingsmottaker":{"type":"BRUKER"}},"verdi":[]},
            {"nokkel":{"klassekode":"A","betalingsmottaker":{"type":"BRUKER"}},"verdi":[]}
        ]"#,
    );
    let args = OppdragArgs { oppdrag, ytelser };
    assert!(run_oppdrag(&args, &OkonomiConfig::default(), &mut Vec::new()).is_err());
}
