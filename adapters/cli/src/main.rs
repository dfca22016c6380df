#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Gridfuse stage headlessly.

mod autopilot;
mod report;

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gridfuse_core::{
    standard_stage, standard_stages, Catalog, Command, StageConfig, TICKS_PER_SECOND,
};
use gridfuse_world::{self as world, query, Battle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    autopilot::Autopilot,
    report::{Summary, Tally},
};

/// Runs a stage with a scripted player and prints the result.
#[derive(Parser, Debug)]
#[command(name = "gridfuse", version)]
struct Args {
    /// Standard stage identifier.
    #[arg(long, default_value = "CH1-01")]
    stage: String,

    /// TOML stage description; overrides `--stage`.
    #[arg(long)]
    stage_file: Option<PathBuf>,

    /// Shop seed; drawn at random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks simulated per frame.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    speed: u8,

    /// Simulated minutes before the run is abandoned.
    #[arg(long, default_value_t = 30)]
    max_minutes: u32,

    /// Summary format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Prints the standard stages and exits.
    #[arg(long)]
    list_stages: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Entry point for the Gridfuse command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.list_stages {
        for stage in standard_stages() {
            println!("{}\t{}\t{} waves", stage.id, stage.name, stage.waves.len());
        }
        return Ok(());
    }

    let stage = load_stage(&args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(stage = %stage.id, seed, "starting run");

    let summary = run(stage, seed, &args)?;
    match args.format {
        Format::Text => print!("{summary}"),
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("encoding summary")?
        ),
    }
    Ok(())
}

fn load_stage(args: &Args) -> Result<StageConfig> {
    if let Some(path) = &args.stage_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading stage file {}", path.display()))?;
        return toml::from_str(&text)
            .with_context(|| format!("parsing stage file {}", path.display()));
    }
    standard_stage(&args.stage).with_context(|| format!("unknown stage `{}`", args.stage))
}

fn run(stage: StageConfig, seed: u64, args: &Args) -> Result<Summary> {
    let id = stage.id.clone();
    let mut battle = Battle::new(stage, Arc::new(Catalog::standard()), seed)
        .with_context(|| format!("stage {id} is invalid"))?;
    let autopilot = Autopilot::new(query::board(&battle), query::stage(&battle).nodes_enabled);
    let max_ticks = u64::from(args.max_minutes) * 60 * u64::from(TICKS_PER_SECOND);

    let mut tally = Tally::default();
    let mut events = Vec::new();
    while query::outcome(&battle).is_none() && query::tick(&battle) < max_ticks {
        autopilot.act(&mut battle, &mut events);
        for _ in 0..args.speed {
            world::apply(&mut battle, Command::Tick, &mut events);
        }
        tally.record(&events);
        events.clear();
    }

    if query::outcome(&battle).is_none() {
        info!(ticks = query::tick(&battle), "time budget exhausted");
    }
    Ok(Summary::new(&battle, seed, tally))
}
