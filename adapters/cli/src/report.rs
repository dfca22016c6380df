//! Run tallies and the end-of-run summary.

use std::fmt;

use gridfuse_core::{Event, Outcome, Placement, TICKS_PER_SECOND};
use gridfuse_world::{query, Battle};
use serde::Serialize;

/// Counters accumulated from the battle's event stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    purchases: u32,
    fusions: u32,
    leaks: u32,
    rerolls: u32,
    level_ups: u32,
    barrier_activations: u32,
    rejected: u32,
}

impl Tally {
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::UnitPurchased { .. } => self.purchases += 1,
                Event::UnitsFused { .. } => self.fusions += 1,
                Event::EnemyLeaked { .. } => self.leaks += 1,
                Event::ShopRerolled { .. } => self.rerolls += 1,
                Event::ShopLeveledUp { .. } => self.level_ups += 1,
                Event::BarrierActivated { .. } => self.barrier_activations += 1,
                Event::CommandRejected { .. } => self.rejected += 1,
                _ => {}
            }
        }
    }
}

/// Final state of one unit in the roster.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct UnitLine {
    name: String,
    star: u8,
    deployed: bool,
    atk: f64,
}

/// Machine-readable result of a headless run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    stage: String,
    seed: u64,
    outcome: Option<Outcome>,
    ticks: u64,
    seconds: f64,
    waves_cleared: usize,
    total_waves: usize,
    integrity: u32,
    max_integrity: u32,
    gold: u32,
    shop_level: u32,
    kills: u32,
    leaks: u32,
    purchases: u32,
    fusions: u32,
    rerolls: u32,
    level_ups: u32,
    barrier_activations: u32,
    rejected_commands: u32,
    units: Vec<UnitLine>,
}

impl Summary {
    pub(crate) fn new(battle: &Battle, seed: u64, tally: Tally) -> Self {
        let catalog = query::catalog(battle);
        let ticks = query::tick(battle);
        Self {
            stage: query::stage(battle).id.clone(),
            seed,
            outcome: query::outcome(battle),
            ticks,
            seconds: ticks as f64 / f64::from(TICKS_PER_SECOND),
            waves_cleared: query::current_wave(battle),
            total_waves: query::total_waves(battle),
            integrity: query::integrity(battle),
            max_integrity: query::max_integrity(battle),
            gold: query::gold(battle),
            shop_level: query::shop(battle).level(),
            kills: query::kill_count(battle),
            leaks: tally.leaks,
            purchases: tally.purchases,
            fusions: tally.fusions,
            rerolls: tally.rerolls,
            level_ups: tally.level_ups,
            barrier_activations: tally.barrier_activations,
            rejected_commands: tally.rejected,
            units: query::units(battle)
                .iter()
                .map(|unit| UnitLine {
                    name: catalog
                        .unit(unit.template())
                        .map_or_else(|| format!("#{}", unit.template().get()), |def| {
                            def.name.to_owned()
                        }),
                    star: unit.star(),
                    deployed: matches!(unit.placement(), Placement::Board(_)),
                    atk: unit.atk(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Some(Outcome::Victory) => "victory",
            Some(Outcome::Defeat) => "defeat",
            None => "timeout",
        };
        writeln!(f, "stage {} (seed {}): {outcome}", self.stage, self.seed)?;
        writeln!(
            f,
            "  waves {}/{}  integrity {}/{}  time {:.1}s",
            self.waves_cleared, self.total_waves, self.integrity, self.max_integrity, self.seconds
        )?;
        writeln!(
            f,
            "  kills {}  leaks {}  gold {}  shop level {}",
            self.kills, self.leaks, self.gold, self.shop_level
        )?;
        writeln!(
            f,
            "  bought {}  fused {}  barrier {}x",
            self.purchases, self.fusions, self.barrier_activations
        )?;
        for unit in &self.units {
            writeln!(
                f,
                "  {} {}* atk {:.1}{}",
                unit.name,
                unit.star,
                unit.atk,
                if unit.deployed { "" } else { " (bench)" }
            )?;
        }
        Ok(())
    }
}
