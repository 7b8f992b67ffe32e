//! Command-line host for the table-tennis tournament engine.
//!
//! Keeps a tournament snapshot in a JSON file, runs one engine command per
//! invocation, persists the resulting deltas and prints them as JSON.

mod commands;
mod config;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Error, anyhow, bail};
use chrono::{DateTime, Utc};
use pico_args::Arguments;
use serde::Serialize;
use tracing::{debug, info};
use tt_engine::{
    Command, EngineError, MemoryStore, Participant, StandingsScope, Tournament, TournamentEngine,
    TournamentFormat, TournamentSettings, TournamentStore,
};

use config::CliConfig;

const HELP: &str = "\
Run table-tennis tournament commands against a JSON snapshot

USAGE:
  tt_cli [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
  init --name NAME --format FMT --participants FILE
       [--best-of N] [--tables N] [--break MIN] [--group-size N]
       [--swiss-rounds N] [--force]
                           Create a new snapshot
  generate                 Generate the bracket
  score MATCH_ID [SETS]    Enter a score sheet, e.g. 11-7,9-11,11-4
  activate [--table N] MATCH_ID
                           Start a match on a table
  auto-assign              Fill free tables with ready matches
  advance                  Turn finished groups into a knockout
  next-round               Pair the next Swiss round
  reset                    Drop all matches and return to setup
  standings [--group N]    Print the standings table
  show                     Print the bracket
  import FILE              Replace the snapshot with another device's copy

OPTIONS:
  --file       PATH        Snapshot file              [default: env TT_SNAPSHOT]
  --now        TIMESTAMP   RFC 3339 time of the command [default: current time]
  --dry-run                Print deltas without saving the snapshot

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  TT_SNAPSHOT              Snapshot file path
  TT_QUALIFIERS_PER_GROUP  Entrants per group reaching the knockout [default: 2]
  TT_GROUP_POSITION_STRIDE Position offset per group number [default: 100]
  TT_PRETTY_JSON           Pretty-print JSON output [default: true]
  RUST_LOG                 Log filter
";

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let file: Option<PathBuf> = pargs.opt_value_from_str("--file")?;
    let now: DateTime<Utc> = pargs.opt_value_from_str("--now")?.unwrap_or_else(Utc::now);
    let dry_run = pargs.contains("--dry-run");
    let Some(subcommand) = pargs.subcommand()? else {
        print!("{HELP}");
        return Ok(());
    };

    logging::init();
    let config = CliConfig::from_env(file)?;
    config.validate()?;
    debug!("using snapshot {}", config.snapshot.display());
    let engine = TournamentEngine::new(config.engine.clone());

    match subcommand.as_str() {
        "init" => init(&config, pargs),
        "show" => {
            finish(pargs)?;
            show(&config, &engine)
        }
        "standings" => {
            let group: Option<i32> = pargs.opt_value_from_str("--group")?;
            finish(pargs)?;
            standings(&config, &engine, group)
        }
        "import" => {
            let source: PathBuf = pargs.free_from_str().context("import needs a FILE")?;
            finish(pargs)?;
            import(&config, &engine, &source, dry_run)
        }
        name => match commands::engine_command(name, &mut pargs)? {
            Some(command) => {
                finish(pargs)?;
                run(&config, &engine, command, now, dry_run)
            }
            None => bail!("unknown command '{name}', see --help"),
        },
    }
}

fn finish(pargs: Arguments) -> Result<(), Error> {
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }
    Ok(())
}

fn load(path: &Path) -> Result<Tournament, Error> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn to_json<T: Serialize>(config: &CliConfig, value: &T) -> Result<String, Error> {
    let json = if config.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn save(config: &CliConfig, tournament: &Tournament) -> Result<(), Error> {
    let json = to_json(config, tournament)?;
    fs::write(&config.snapshot, json + "\n")
        .with_context(|| format!("writing {}", config.snapshot.display()))
}

fn init(config: &CliConfig, mut pargs: Arguments) -> Result<(), Error> {
    let name: String = pargs.value_from_str("--name")?;
    let format: TournamentFormat = pargs.value_from_str("--format")?;
    let participants_path: PathBuf = pargs.value_from_str("--participants")?;

    let mut settings = TournamentSettings::new(format);
    if let Some(best_of) = pargs.opt_value_from_str("--best-of")? {
        settings = settings.with_best_of(best_of);
    }
    let tables = pargs.opt_value_from_str("--tables")?.unwrap_or(0);
    let rest = pargs.opt_value_from_str("--break")?.unwrap_or(0);
    settings = settings.with_tables(tables, rest);
    if let Some(size) = pargs.opt_value_from_str("--group-size")? {
        settings = settings.with_group_size(size);
    }
    if let Some(rounds) = pargs.opt_value_from_str("--swiss-rounds")? {
        settings = settings.with_swiss_rounds(rounds);
    }
    let force = pargs.contains("--force");
    finish(pargs)?;

    settings
        .validate()
        .map_err(|reason| anyhow!("invalid settings: {reason}"))?;
    if config.snapshot.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            config.snapshot.display()
        );
    }

    let raw = fs::read_to_string(&participants_path)
        .with_context(|| format!("reading {}", participants_path.display()))?;
    let participants: Vec<Participant> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", participants_path.display()))?;

    let tournament = Tournament::new(name, settings, participants);
    save(config, &tournament)?;
    info!(
        "created '{}' ({}, {} participants)",
        tournament.name,
        format,
        tournament.participants.len()
    );
    Ok(())
}

fn run(
    config: &CliConfig,
    engine: &TournamentEngine,
    command: Command,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<(), Error> {
    let mut store = MemoryStore::new(load(&config.snapshot)?);
    let mut tournament = store.fetch_tournament()?;
    let name = command.name();

    let started = Instant::now();
    let outcome = match engine.execute(&mut tournament, command, now) {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_rejection() {
                let reason = match &e {
                    EngineError::Rejected(rejection) => rejection.client_message(),
                    other => other.to_string(),
                };
                logging::log_rejection(name, &reason);
            }
            return Err(Error::new(e).context(format!("{name} failed")));
        }
    };
    logging::log_command(name, outcome.deltas.len(), started.elapsed().as_micros());

    store.persist(&outcome)?;
    let persisted = store.into_inner();
    if persisted != tournament {
        bail!("stored snapshot diverged from the engine's after {name}");
    }

    println!("{}", to_json(config, &outcome)?);
    if dry_run {
        info!("dry run, {} left untouched", config.snapshot.display());
    } else if !outcome.is_empty() {
        save(config, &persisted)?;
    }
    Ok(())
}

fn show(config: &CliConfig, engine: &TournamentEngine) -> Result<(), Error> {
    let tournament = load(&config.snapshot)?;
    println!(
        "{} [{}] phase: {}",
        tournament.name, tournament.settings.format, tournament.phase
    );
    for m in &tournament.matches {
        println!("  {m}");
    }
    if let Some(champion) = engine.champion(&tournament) {
        let name = tournament
            .participant(champion)
            .map_or_else(|| champion.to_string(), |p| p.name.clone());
        println!("champion: {name}");
    }
    Ok(())
}

fn standings(
    config: &CliConfig,
    engine: &TournamentEngine,
    group: Option<i32>,
) -> Result<(), Error> {
    let tournament = load(&config.snapshot)?;
    let scope = group.map_or(StandingsScope::Overall, |group| StandingsScope::Group {
        group,
    });
    let table = engine.compute_standings(&tournament, scope);
    println!("{}", to_json(config, &table)?);
    Ok(())
}

fn import(
    config: &CliConfig,
    engine: &TournamentEngine,
    source: &Path,
    dry_run: bool,
) -> Result<(), Error> {
    let mut tournament = load(&config.snapshot)?;
    let remote = load(source)?;
    engine.apply_remote_snapshot(&mut tournament, remote)?;
    info!(
        "imported {} matches from {}",
        tournament.matches.len(),
        source.display()
    );
    if !dry_run {
        save(config, &tournament)?;
    }
    Ok(())
}
